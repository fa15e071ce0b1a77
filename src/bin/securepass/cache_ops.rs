use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::Context;

use securepass::{AssetManifest, DirFetcher, ShellCache};

use crate::ProgError;

fn open_cache(
    manifest_path: &PathBuf,
    data_dir: Option<PathBuf>,
) -> Result<(ShellCache, AssetManifest), ProgError> {
    let manifest = AssetManifest::load(manifest_path)?;
    let cache = ShellCache::new(crate::cache_root(data_dir)?, manifest.generation.clone());
    Ok((cache, manifest))
}

pub(crate) fn prime(
    manifest_path: PathBuf,
    origin: PathBuf,
    data_dir: Option<PathBuf>,
) -> Result<(), ProgError> {
    let (cache, manifest) = open_cache(&manifest_path, data_dir)?;
    let mut fetcher = DirFetcher::new(origin);
    cache.prime(&manifest.assets, &mut fetcher)?;
    eprintln!(
        "Primed cache generation {:?} with {} assets.",
        cache.generation(),
        manifest.assets.len()
    );
    Ok(())
}

pub(crate) fn activate(
    manifest_path: PathBuf,
    data_dir: Option<PathBuf>,
) -> Result<(), ProgError> {
    let (cache, _) = open_cache(&manifest_path, data_dir)?;
    let purged = cache.activate()?;
    if purged.is_empty() {
        eprintln!("Generation {:?} is already the only one.", cache.generation());
    } else {
        eprintln!(
            "Activated generation {:?}; purged {}.",
            cache.generation(),
            purged.join(", ")
        );
    }
    Ok(())
}

pub(crate) fn serve(
    key: String,
    manifest_path: PathBuf,
    origin: PathBuf,
    data_dir: Option<PathBuf>,
) -> Result<(), ProgError> {
    let (cache, _) = open_cache(&manifest_path, data_dir)?;
    let mut fetcher = DirFetcher::new(origin);
    let response = cache.handle_request(&key, &mut fetcher)?;
    io::stdout()
        .write_all(&response.body)
        .context("failed to write response body to stdout")?;
    if !response.is_success() {
        return Err(ProgError::RequestFailed {
            key,
            status: response.status,
        });
    }
    Ok(())
}

pub(crate) fn status(
    manifest_path: PathBuf,
    data_dir: Option<PathBuf>,
) -> Result<(), ProgError> {
    let (cache, _) = open_cache(&manifest_path, data_dir)?;
    let generations = cache.status()?;
    if generations.is_empty() {
        eprintln!("No cache generations on disk.");
        return Ok(());
    }
    let rows: Vec<[String; 3]> = generations
        .iter()
        .map(|generation| {
            [
                generation.name.clone(),
                generation.entries.to_string(),
                if generation.current { "current".to_owned() } else { String::new() },
            ]
        })
        .collect();
    crate::table::render(["Generation", "Entries", ""], &rows, io::stdout())
        .context("failed to output table")?;
    Ok(())
}
