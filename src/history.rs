//! Durable, append-only history of generated passwords.
//!
//! The log is a JSON-lines file: one [`PasswordRecord`] per line, appended in
//! generation order. Records are immutable once written; the only mutations
//! are appending a new record and clearing the whole log.

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct PasswordRecord {
    /// Monotonically assigned by the store; an opaque ordering key.
    pub id: u64,
    pub password: String,
    /// Milliseconds since the Unix epoch.
    pub created: u64,
}

/// The history log at a fixed path.
///
/// Opening scans the log once to recover the id counter, so ids keep
/// increasing across process restarts.
pub struct HistoryStore {
    path: PathBuf,
    next_id: u64,
}

impl HistoryStore {
    pub fn open(path: PathBuf) -> Result<HistoryStore, HistoryError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(HistoryErrorRepr::StorageUnavailable)?;
        }
        let next_id = match File::open(&path) {
            Ok(file) => read_records(file)?
                .last()
                .map(|record| record.id + 1)
                .unwrap_or(1),
            Err(err) if err.kind() == io::ErrorKind::NotFound => 1,
            Err(err) => return Err(HistoryErrorRepr::StorageUnavailable(err).into()),
        };
        Ok(HistoryStore { path, next_id })
    }

    /// Append a freshly generated password, assigning it a new id and the
    /// current timestamp. Returns the record as persisted.
    pub fn append(&mut self, password: &str) -> Result<PasswordRecord, HistoryError> {
        let record = PasswordRecord {
            id: self.next_id,
            password: password.to_owned(),
            created: now_millis(),
        };
        let mut line =
            serde_json::to_string(&record).map_err(HistoryErrorRepr::EncodeRecord)?;
        line.push('\n');
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(HistoryErrorRepr::StorageUnavailable)?;
        file.write_all(line.as_bytes())
            .map_err(HistoryErrorRepr::StorageUnavailable)?;
        self.next_id += 1;
        Ok(record)
    }

    /// Up to the last `n` records, most recent first. An absent or empty log
    /// yields an empty vector, not an error.
    pub fn recent(&self, n: usize) -> Result<Vec<PasswordRecord>, HistoryError> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(HistoryErrorRepr::StorageUnavailable(err).into()),
        };
        let mut records = read_records(file)?;
        if records.len() > n {
            records.drain(..records.len() - n);
        }
        records.reverse();
        Ok(records)
    }

    /// Delete all records. Ids restart from 1 afterwards.
    pub fn clear(&mut self) -> Result<(), HistoryError> {
        File::create(&self.path).map_err(HistoryErrorRepr::StorageUnavailable)?;
        self.next_id = 1;
        Ok(())
    }
}

/// The history store as the UI path sees it.
///
/// The store opens asynchronously relative to the UI: the first generation
/// may land before the log is ready. A `NotReady` handle turns every
/// operation into a silent no-op; only a truly unavailable store (a `Ready`
/// handle whose writes fail) is worth a warning.
pub enum HistoryHandle {
    NotReady,
    Ready(HistoryStore),
}

impl HistoryHandle {
    /// Open the store, degrading to `NotReady` (with a logged warning) if the
    /// underlying storage cannot be opened. History is never worth failing
    /// password generation over.
    pub fn open_or_degraded(path: PathBuf) -> HistoryHandle {
        match HistoryStore::open(path) {
            Ok(store) => HistoryHandle::Ready(store),
            Err(err) => {
                log::warn!("history storage unavailable, continuing without history: {err}");
                HistoryHandle::NotReady
            }
        }
    }

    pub fn append(&mut self, password: &str) -> Option<PasswordRecord> {
        match self {
            HistoryHandle::NotReady => None,
            HistoryHandle::Ready(store) => match store.append(password) {
                Ok(record) => Some(record),
                Err(err) => {
                    log::warn!("failed to record password in history: {err}");
                    None
                }
            },
        }
    }

    pub fn recent(&self, n: usize) -> Vec<PasswordRecord> {
        match self {
            HistoryHandle::NotReady => Vec::new(),
            HistoryHandle::Ready(store) => match store.recent(n) {
                Ok(records) => records,
                Err(err) => {
                    log::warn!("failed to read history: {err}");
                    Vec::new()
                }
            },
        }
    }

    /// Returns whether the log was actually cleared. A not-ready handle has
    /// no log to clear, which reads the same as an empty history.
    pub fn clear(&mut self) -> bool {
        match self {
            HistoryHandle::NotReady => false,
            HistoryHandle::Ready(store) => match store.clear() {
                Ok(()) => true,
                Err(err) => {
                    log::warn!("failed to clear history: {err}");
                    false
                }
            },
        }
    }
}

fn read_records(file: File) -> Result<Vec<PasswordRecord>, HistoryError> {
    let reader = BufReader::new(file);
    let mut records = Vec::new();
    for line in reader.lines() {
        let line = line.map_err(HistoryErrorRepr::StorageUnavailable)?;
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str(&line) {
            Ok(record) => records.push(record),
            Err(err) => {
                // Most likely a torn trailing line from an interrupted
                // append; the preceding records are still good.
                log::warn!("skipping unreadable history line: {err}");
            }
        }
    }
    Ok(records)
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or(0)
}

#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct HistoryError(HistoryErrorRepr);

impl From<HistoryErrorRepr> for HistoryError {
    fn from(err: HistoryErrorRepr) -> HistoryError {
        HistoryError(err)
    }
}

#[derive(Debug, thiserror::Error)]
enum HistoryErrorRepr {
    #[error("history storage unavailable: {0}")]
    StorageUnavailable(io::Error),
    #[error("failed to encode history record: {0}")]
    EncodeRecord(serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_in(dir: &tempfile::TempDir) -> HistoryStore {
        HistoryStore::open(dir.path().join("history.jsonl")).unwrap()
    }

    #[test]
    fn append_then_recent_returns_the_appended_password() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(&dir);
        store.append("hunter2!").unwrap();
        let recent = store.recent(1).unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].password, "hunter2!");
        assert_eq!(recent[0].id, 1);
    }

    #[test]
    fn recent_is_bounded_and_most_recent_first() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(&dir);
        for i in 0..5 {
            store.append(&format!("pw-{i}")).unwrap();
        }
        let recent = store.recent(3).unwrap();
        let passwords: Vec<&str> = recent.iter().map(|r| r.password.as_str()).collect();
        assert_eq!(passwords, ["pw-4", "pw-3", "pw-2"]);
    }

    #[test]
    fn recent_on_a_fresh_store_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        assert!(store.recent(10).unwrap().is_empty());
    }

    #[test]
    fn clear_empties_the_log() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(&dir);
        store.append("soon-gone").unwrap();
        store.clear().unwrap();
        assert!(store.recent(10).unwrap().is_empty());
    }

    #[test]
    fn ids_continue_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.jsonl");
        let mut store = HistoryStore::open(path.clone()).unwrap();
        store.append("first").unwrap();
        store.append("second").unwrap();
        drop(store);

        let mut reopened = HistoryStore::open(path).unwrap();
        let record = reopened.append("third").unwrap();
        assert_eq!(record.id, 3);
    }

    #[test]
    fn torn_trailing_line_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.jsonl");
        let mut store = HistoryStore::open(path.clone()).unwrap();
        store.append("intact").unwrap();
        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        file.write_all(b"{\"id\":2,\"passwo").unwrap();
        drop(file);

        let reopened = HistoryStore::open(path).unwrap();
        let recent = reopened.recent(10).unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].password, "intact");
    }

    #[test]
    fn not_ready_handle_is_a_silent_noop() {
        let mut handle = HistoryHandle::NotReady;
        assert!(handle.append("nowhere").is_none());
        assert!(handle.recent(10).is_empty());
        assert!(!handle.clear());
    }

    #[test]
    fn ready_handle_clear_empties_the_log() {
        let dir = tempfile::tempdir().unwrap();
        let mut handle =
            HistoryHandle::open_or_degraded(dir.path().join("history.jsonl"));
        handle.append("soon-gone");
        assert!(handle.clear());
        assert!(handle.recent(10).is_empty());
    }

    #[test]
    fn ready_handle_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let mut handle =
            HistoryHandle::open_or_degraded(dir.path().join("history.jsonl"));
        assert!(handle.append("via-handle").is_some());
        let recent = handle.recent(10);
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].password, "via-handle");
    }
}
