//! Local password utility: class-based password generation, a durable
//! history of generated passwords, and a versioned offline cache for the
//! application shell.
//!
//! The three parts are independent. The generator and the history store only
//! meet in the caller (generate, then append); the shell cache operates on an
//! entirely separate axis, intercepting asset requests through the [`Fetch`]
//! seam and serving them cache-first.

pub mod fetch;
pub mod generation;
pub mod history;
pub mod install;
pub mod shell_cache;

pub use fetch::{DirFetcher, Fetch, FetchError, Response, ResponseKind};
pub use generation::{generate_password, ClassSelection, GenerateError};
pub use history::{HistoryError, HistoryHandle, HistoryStore, PasswordRecord};
pub use install::{InstallPrompt, PromptOutcome, PromptSlot};
pub use shell_cache::{AssetManifest, CacheError, GenerationStatus, ShellCache};
