use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use securepass::{generate_password, ClassSelection, GenerateError, HistoryHandle};

use crate::ProgError;

/// How many history entries the UI shows after generating.
const HISTORY_WINDOW: usize = 10;

#[derive(clap::Args)]
pub(crate) struct GenerateArgs {
    /// Password length.
    #[arg(long, default_value_t = 16, value_parser = clap::value_parser!(u16).range(1..=64))]
    length: u16,
    /// Leave uppercase letters out of the alphabet.
    #[arg(long)]
    no_uppercase: bool,
    /// Leave lowercase letters out of the alphabet.
    #[arg(long)]
    no_lowercase: bool,
    /// Leave digits out of the alphabet.
    #[arg(long)]
    no_digits: bool,
    /// Leave symbols out of the alphabet.
    #[arg(long)]
    no_symbols: bool,
    /// Copy the generated password to the clipboard.
    #[arg(long)]
    copy: bool,
    #[arg(long)]
    data_dir: Option<PathBuf>,
}

pub(crate) fn generate(args: GenerateArgs) -> Result<(), ProgError> {
    let selection = ClassSelection {
        uppercase: !args.no_uppercase,
        lowercase: !args.no_lowercase,
        digits: !args.no_digits,
        symbols: !args.no_symbols,
    };

    let mut rng = rand::thread_rng();
    let password = match generate_password(&mut rng, &selection, usize::from(args.length)) {
        Ok(password) => password,
        Err(GenerateError::EmptySelection) => {
            // The placeholder the UI shows instead of a password; nothing is
            // generated and nothing reaches the history.
            println!("{}", console::style("Select options").yellow());
            return Ok(());
        }
    };

    println!("{}", console::style(&password).bold());

    if args.copy {
        send_to_clipboard(password.as_bytes())?;
        eprintln!("Copied to the clipboard.");
    }

    // History failures degrade to "no history"; the password was already
    // generated and shown.
    let mut history = HistoryHandle::open_or_degraded(crate::history_path(args.data_dir)?);
    history.append(&password);
    let recent = history.recent(HISTORY_WINDOW);
    if !recent.is_empty() {
        eprintln!();
        crate::history_ops::render_history(&recent)?;
    }

    Ok(())
}

fn send_to_clipboard(data: &[u8]) -> anyhow::Result<()> {
    pipe_to_command(clipboard_cmd(), data)
}

fn pipe_to_command(mut cmd: Command, data: &[u8]) -> anyhow::Result<()> {
    use anyhow::Context;

    let mut child = cmd.stdin(Stdio::piped()).spawn()?;
    child
        .stdin
        .as_mut()
        .context("clipboard command has no stdin")?
        .write_all(data)?;
    let status = child.wait()?;
    if !status.success() {
        anyhow::bail!("clipboard command exited with {status}");
    }
    Ok(())
}

#[cfg(target_os = "macos")]
fn clipboard_cmd() -> Command {
    Command::new("pbcopy")
}

#[cfg(not(target_os = "macos"))]
fn clipboard_cmd() -> Command {
    let mut cmd = Command::new("xsel");
    cmd.arg("-b");
    cmd
}
