//! The network seam used by the shell cache.
//!
//! The cache never talks to a network directly; it goes through [`Fetch`], so
//! tests can substitute a double that counts calls, and the CLI can serve
//! "the origin" out of a local directory.

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Whether a response came from our own origin or from elsewhere.
///
/// Opaque responses are pass-through only: their status and body cannot be
/// trusted, so the cache never stores them opportunistically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseKind {
    Basic,
    Opaque,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub kind: ResponseKind,
    pub body: Vec<u8>,
}

impl Response {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Only successful same-origin responses may be cached on the fly.
    pub fn is_cacheable(&self) -> bool {
        self.is_success() && self.kind == ResponseKind::Basic
    }
}

pub trait Fetch {
    fn fetch(&mut self, key: &str) -> Result<Response, FetchError>;
}

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("network failure fetching {key:?}: {source}")]
    Network {
        key: String,
        #[source]
        source: io::Error,
    },
    #[error("cross-origin key {0:?} cannot be served by a directory origin")]
    CrossOrigin(String),
}

/// Serves same-origin asset keys out of a local directory.
///
/// Keys use the `./path` shape of an asset manifest; a bare `./` maps to
/// `index.html`. A missing file is a 404 response, not a network failure.
pub struct DirFetcher {
    origin: PathBuf,
}

impl DirFetcher {
    pub fn new(origin: PathBuf) -> DirFetcher {
        DirFetcher { origin }
    }
}

impl Fetch for DirFetcher {
    fn fetch(&mut self, key: &str) -> Result<Response, FetchError> {
        if key.contains("://") {
            return Err(FetchError::CrossOrigin(key.to_owned()));
        }
        let relative = key.trim_start_matches("./");
        let relative = if relative.is_empty() { "index.html" } else { relative };
        let relative = Path::new(relative);
        // Keys must resolve inside the origin directory; anything carrying a
        // `..` or an absolute component reads as absent, like any other key
        // the origin doesn't serve.
        if relative
            .components()
            .any(|component| !matches!(component, Component::Normal(_)))
        {
            return Ok(Response {
                status: 404,
                kind: ResponseKind::Basic,
                body: Vec::new(),
            });
        }
        match fs::read(self.origin.join(relative)) {
            Ok(body) => Ok(Response {
                status: 200,
                kind: ResponseKind::Basic,
                body,
            }),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(Response {
                status: 404,
                kind: ResponseKind::Basic,
                body: Vec::new(),
            }),
            Err(err) => Err(FetchError::Network {
                key: key.to_owned(),
                source: err,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    #[test]
    fn serves_files_relative_to_the_origin() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("style.css"), b"body {}").unwrap();
        let mut fetcher = DirFetcher::new(dir.path().to_path_buf());
        let response = fetcher.fetch("./style.css").unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(response.kind, ResponseKind::Basic);
        assert_eq!(response.body, b"body {}");
    }

    #[test]
    fn bare_root_key_maps_to_index_html() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("index.html"), b"<html>").unwrap();
        let mut fetcher = DirFetcher::new(dir.path().to_path_buf());
        let response = fetcher.fetch("./").unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(response.body, b"<html>");
    }

    #[test]
    fn missing_file_is_a_404_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut fetcher = DirFetcher::new(dir.path().to_path_buf());
        let response = fetcher.fetch("./missing.js").unwrap();
        assert_eq!(response.status, 404);
        assert!(!response.is_success());
    }

    #[test]
    fn keys_cannot_escape_the_origin_directory() {
        let outer = tempfile::tempdir().unwrap();
        fs::write(outer.path().join("secret.txt"), b"outside").unwrap();
        let origin = outer.path().join("origin");
        fs::create_dir(&origin).unwrap();
        let mut fetcher = DirFetcher::new(origin);
        let response = fetcher.fetch("./../secret.txt").unwrap();
        assert_eq!(response.status, 404);
        assert!(response.body.is_empty());
    }

    #[test]
    fn absolute_urls_are_refused() {
        let dir = tempfile::tempdir().unwrap();
        let mut fetcher = DirFetcher::new(dir.path().to_path_buf());
        let result = fetcher.fetch("https://fonts.example/css");
        assert!(matches!(result, Err(FetchError::CrossOrigin(_))));
    }

    #[test]
    fn opaque_responses_are_never_cacheable() {
        let response = Response {
            status: 200,
            kind: ResponseKind::Opaque,
            body: Vec::new(),
        };
        assert!(!response.is_cacheable());
    }
}
