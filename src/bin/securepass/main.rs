use std::env;
use std::path::PathBuf;
use std::process;

use clap::Parser;

mod cache_ops;
mod generate;
mod history_ops;
mod install_ops;
mod table;

#[derive(Parser)]
enum Args {
    /// Generate a new password and record it in the history.
    Generate(generate::GenerateArgs),
    /// Commands for the generated-password history.
    #[command(subcommand)]
    History(HistoryCommand),
    /// Commands for the offline application-shell cache.
    #[command(subcommand)]
    Cache(CacheCommand),
    /// Trigger the install prompt, if one is available.
    Install,
}

#[derive(clap::Subcommand)]
enum HistoryCommand {
    /// List the most recently generated passwords.
    List {
        /// How many records to show, most recent first.
        #[arg(short = 'n', long, default_value_t = 10)]
        count: usize,
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
    /// Delete the entire history.
    Clear {
        #[arg(long)]
        data_dir: Option<PathBuf>,
        /// Skip the confirmation prompt.
        #[arg(long)]
        yes: bool,
    },
}

#[derive(clap::Subcommand)]
enum CacheCommand {
    /// Fetch every manifest asset into a fresh cache generation.
    Prime {
        /// YAML manifest naming the generation and the shell assets.
        #[arg(long)]
        manifest: PathBuf,
        /// Directory standing in for the same-origin network.
        #[arg(long)]
        origin: PathBuf,
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
    /// Purge every cache generation other than the manifest's.
    Activate {
        #[arg(long)]
        manifest: PathBuf,
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
    /// Serve one request through the cache, writing the body to stdout.
    Serve {
        /// The request key, e.g. `./index.html`.
        key: String,
        #[arg(long)]
        manifest: PathBuf,
        #[arg(long)]
        origin: PathBuf,
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
    /// Show the cache generations on disk.
    Status {
        #[arg(long)]
        manifest: PathBuf,
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
}

fn run() -> Result<(), ProgError> {
    let args = Args::parse();

    match args {
        Args::Generate(args) => generate::generate(args)?,
        Args::History(HistoryCommand::List { count, data_dir }) => {
            history_ops::list_history(count, data_dir)?
        }
        Args::History(HistoryCommand::Clear { data_dir, yes }) => {
            history_ops::clear_history(data_dir, yes)?
        }
        Args::Cache(CacheCommand::Prime {
            manifest,
            origin,
            data_dir,
        }) => cache_ops::prime(manifest, origin, data_dir)?,
        Args::Cache(CacheCommand::Activate { manifest, data_dir }) => {
            cache_ops::activate(manifest, data_dir)?
        }
        Args::Cache(CacheCommand::Serve {
            key,
            manifest,
            origin,
            data_dir,
        }) => cache_ops::serve(key, manifest, origin, data_dir)?,
        Args::Cache(CacheCommand::Status { manifest, data_dir }) => {
            cache_ops::status(manifest, data_dir)?
        }
        Args::Install => install_ops::install(),
    }

    Ok(())
}

fn main() {
    env_logger::init();
    match run() {
        Ok(()) => (),
        Err(err) => {
            eprintln!("{err}");
            process::exit(1);
        }
    }
}

fn or_default_data_dir(data_dir: Option<PathBuf>) -> anyhow::Result<PathBuf> {
    match data_dir {
        Some(dir) => Ok(dir),
        None => default_data_dir(),
    }
}

fn default_data_dir() -> anyhow::Result<PathBuf> {
    let home = env::var_os("HOME")
        .ok_or_else(|| anyhow::anyhow!("HOME is not set; cannot find home directory of user"))?;
    let mut dir = PathBuf::from(home);
    dir.push(".securepass");
    Ok(dir)
}

fn history_path(data_dir: Option<PathBuf>) -> anyhow::Result<PathBuf> {
    Ok(or_default_data_dir(data_dir)?.join("history.jsonl"))
}

fn cache_root(data_dir: Option<PathBuf>) -> anyhow::Result<PathBuf> {
    Ok(or_default_data_dir(data_dir)?.join("shell-cache"))
}

#[derive(Debug, thiserror::Error)]
enum ProgError {
    #[error("History clear aborted; exiting.")]
    ClearAborted,
    #[error("The request for {key:?} came back with status {status}.")]
    RequestFailed { key: String, status: u16 },
    #[error("History error: {0}")]
    History(securepass::HistoryError),
    #[error("Cache error: {0}")]
    Cache(securepass::CacheError),
    #[error("Fetch error: {0}")]
    Fetch(securepass::FetchError),
    #[error(transparent)]
    Other(anyhow::Error),
}

impl From<anyhow::Error> for ProgError {
    fn from(err: anyhow::Error) -> ProgError {
        ProgError::Other(err)
    }
}

impl From<securepass::HistoryError> for ProgError {
    fn from(err: securepass::HistoryError) -> ProgError {
        ProgError::History(err)
    }
}

impl From<securepass::CacheError> for ProgError {
    fn from(err: securepass::CacheError) -> ProgError {
        ProgError::Cache(err)
    }
}

impl From<securepass::FetchError> for ProgError {
    fn from(err: securepass::FetchError) -> ProgError {
        ProgError::Fetch(err)
    }
}
