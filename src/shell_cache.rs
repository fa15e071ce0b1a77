//! Versioned offline cache for the application shell.
//!
//! Each cache generation is a directory under the cache root, named by the
//! generation string from the asset manifest. Entries are one file per
//! request key (the key encoded with URL-safe base64, so arbitrary keys stay
//! filename-safe), each holding the stored response. At most one generation
//! is current; activation purges every other one.
//!
//! Per-key entries are independent files, so concurrent serves of distinct
//! keys need no coordination.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine as _;
use serde::{Deserialize, Serialize};

use crate::fetch::{Fetch, FetchError, Response, ResponseKind};

/// The cache priming list: a generation name plus the application-shell asset
/// keys. Changing the asset list must come with a generation bump, or
/// activation will never evict the stale entries.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AssetManifest {
    pub generation: String,
    pub assets: Vec<String>,
}

impl AssetManifest {
    pub fn load(path: &Path) -> Result<AssetManifest, CacheError> {
        let file = fs::File::open(path).map_err(CacheError::ManifestRead)?;
        serde_yaml::from_reader(file).map_err(CacheError::ManifestParse)
    }
}

/// One generation's worth of on-disk state, for status reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationStatus {
    pub name: String,
    pub entries: usize,
    pub current: bool,
}

/// On-disk form of a cached response; the body is base64 so the entry file
/// stays valid JSON for arbitrary asset bytes.
#[derive(Deserialize, Serialize)]
struct StoredResponse {
    status: u16,
    kind: ResponseKind,
    body: String,
}

impl From<&Response> for StoredResponse {
    fn from(response: &Response) -> StoredResponse {
        StoredResponse {
            status: response.status,
            kind: response.kind,
            body: STANDARD.encode(&response.body),
        }
    }
}

pub struct ShellCache {
    root: PathBuf,
    generation: String,
}

impl ShellCache {
    pub fn new(root: PathBuf, generation: String) -> ShellCache {
        ShellCache { root, generation }
    }

    pub fn generation(&self) -> &str {
        &self.generation
    }

    /// Prime the current generation with every manifest asset, all or
    /// nothing: assets are fetched into a staging directory which only
    /// becomes the live generation once every fetch has succeeded. A
    /// partially primed shell is worse than forcing a retry.
    ///
    /// A same-origin response with a non-success status fails the prime just
    /// like a fetch error does. Opaque responses are stored as fetched.
    pub fn prime<F: Fetch>(&self, assets: &[String], fetcher: &mut F) -> Result<(), CacheError> {
        let staging = self.root.join(format!("{}.priming", self.generation));
        if staging.exists() {
            fs::remove_dir_all(&staging).map_err(CacheError::Io)?;
        }
        fs::create_dir_all(&staging).map_err(CacheError::Io)?;

        for key in assets {
            let outcome = self.prime_one(&staging, key, fetcher);
            if let Err(err) = outcome {
                if let Err(cleanup_err) = fs::remove_dir_all(&staging) {
                    log::warn!("failed to remove staging directory after a failed prime: {cleanup_err}");
                }
                return Err(err);
            }
        }

        let live = self.root.join(&self.generation);
        if live.exists() {
            fs::remove_dir_all(&live).map_err(CacheError::Io)?;
        }
        fs::rename(&staging, &live).map_err(CacheError::Io)?;
        log::info!(
            "primed cache generation {:?} with {} assets",
            self.generation,
            assets.len()
        );
        Ok(())
    }

    fn prime_one<F: Fetch>(
        &self,
        staging: &Path,
        key: &str,
        fetcher: &mut F,
    ) -> Result<(), CacheError> {
        let response = fetcher.fetch(key).map_err(|err| CacheError::PrimingFailed {
            asset: key.to_owned(),
            source: err.into(),
        })?;
        if response.kind == ResponseKind::Basic && !response.is_success() {
            return Err(CacheError::PrimingFailed {
                asset: key.to_owned(),
                source: anyhow::anyhow!("response status {}", response.status),
            });
        }
        write_entry(staging, key, &response)
    }

    /// Make this generation the only one: delete every generation directory
    /// under the cache root whose name differs. Returns the purged names.
    pub fn activate(&self) -> Result<Vec<String>, CacheError> {
        let mut purged = Vec::new();
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(purged),
            Err(err) => return Err(CacheError::Io(err)),
        };
        for entry in entries {
            let entry = entry.map_err(CacheError::Io)?;
            if !entry.file_type().map_err(CacheError::Io)?.is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if name != self.generation {
                fs::remove_dir_all(entry.path()).map_err(CacheError::Io)?;
                log::info!("purged stale cache generation {name:?}");
                purged.push(name);
            }
        }
        Ok(purged)
    }

    /// Exact-key lookup in the current generation.
    pub fn lookup(&self, key: &str) -> Result<Option<Response>, CacheError> {
        let path = entry_path(&self.root.join(&self.generation), key);
        let data = match fs::read(&path) {
            Ok(data) => data,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(CacheError::Io(err)),
        };
        let stored: StoredResponse =
            serde_json::from_slice(&data).map_err(CacheError::DecodeEntry)?;
        let body = STANDARD
            .decode(&stored.body)
            .map_err(CacheError::DecodeBody)?;
        Ok(Some(Response {
            status: stored.status,
            kind: stored.kind,
            body,
        }))
    }

    /// Serve one request cache-first.
    ///
    /// A cache hit never touches the network. On a miss the request goes to
    /// the fetcher; a successful same-origin response is copied into the
    /// current generation before being returned, and anything else (including
    /// a fetch error) is passed through untouched. A failed opportunistic
    /// cache write only costs a warning, never the request.
    pub fn handle_request<F: Fetch>(
        &self,
        key: &str,
        fetcher: &mut F,
    ) -> Result<Response, FetchError> {
        match self.lookup(key) {
            Ok(Some(response)) => {
                log::debug!("cache hit for {key:?}");
                return Ok(response);
            }
            Ok(None) => {}
            Err(err) => {
                log::warn!("cache lookup for {key:?} failed, going to the network: {err}");
            }
        }
        let response = fetcher.fetch(key)?;
        if response.is_cacheable() {
            if let Err(err) = self.store(key, &response) {
                log::warn!("failed to cache {key:?}: {err}");
            }
        }
        Ok(response)
    }

    fn store(&self, key: &str, response: &Response) -> Result<(), CacheError> {
        let generation_dir = self.root.join(&self.generation);
        // Opportunistic writes may land before the generation was ever primed.
        fs::create_dir_all(&generation_dir).map_err(CacheError::Io)?;
        write_entry(&generation_dir, key, response)
    }

    /// Every generation directory on disk, current one flagged.
    pub fn status(&self) -> Result<Vec<GenerationStatus>, CacheError> {
        let mut generations = Vec::new();
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(generations),
            Err(err) => return Err(CacheError::Io(err)),
        };
        for entry in entries {
            let entry = entry.map_err(CacheError::Io)?;
            if !entry.file_type().map_err(CacheError::Io)?.is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            let entry_count = fs::read_dir(entry.path()).map_err(CacheError::Io)?.count();
            generations.push(GenerationStatus {
                current: name == self.generation,
                name,
                entries: entry_count,
            });
        }
        generations.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(generations)
    }
}

fn entry_path(generation_dir: &Path, key: &str) -> PathBuf {
    generation_dir.join(URL_SAFE_NO_PAD.encode(key))
}

fn write_entry(generation_dir: &Path, key: &str, response: &Response) -> Result<(), CacheError> {
    let data =
        serde_json::to_vec(&StoredResponse::from(response)).map_err(CacheError::EncodeEntry)?;
    fs::write(entry_path(generation_dir, key), data).map_err(CacheError::Io)
}

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("priming the shell cache failed at {asset:?}: {source}")]
    PrimingFailed {
        asset: String,
        #[source]
        source: anyhow::Error,
    },
    #[error("shell cache I/O error: {0}")]
    Io(io::Error),
    #[error("failed to encode cache entry: {0}")]
    EncodeEntry(serde_json::Error),
    #[error("failed to decode cache entry: {0}")]
    DecodeEntry(serde_json::Error),
    #[error("failed to decode cached body: {0}")]
    DecodeBody(base64::DecodeError),
    #[error("failed to read the asset manifest: {0}")]
    ManifestRead(io::Error),
    #[error("the asset manifest is malformed: {0}")]
    ManifestParse(serde_yaml::Error),
}
