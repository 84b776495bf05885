//! Vote dedup ledger
//!
//! Device-local record of which advices the current user has already
//! up-voted. Stored under a fixed key as a JSON list of ids, the same shape
//! a browser keeps in localStorage. The guarantee is client-side only: a
//! second device or a wiped storage file can vote again.

use crate::file_storage::{read_json, write_json};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Storage key holding the voted ids
pub const LEDGER_STORAGE_KEY: &str = "likedAdvices";

/// File name of the device-local key/value storage
pub const LOCAL_STORAGE_FILE_NAME: &str = "local_storage.json";

/// Durable string key/value storage local to this device
pub trait LocalStorage: Send {
    fn get_item(&self, key: &str) -> Result<Option<String>, String>;
    fn set_item(&mut self, key: &str, value: &str) -> Result<(), String>;
}

/// Key/value storage kept in a JSON object on disk
pub struct FileLocalStorage {
    path: PathBuf,
}

impl FileLocalStorage {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join(LOCAL_STORAGE_FILE_NAME),
        }
    }

    fn load(&self) -> Result<BTreeMap<String, String>, String> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        read_json(&self.path)
    }
}

impl LocalStorage for FileLocalStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, String> {
        Ok(self.load()?.remove(key))
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), String> {
        let mut items = self.load().unwrap_or_else(|e| {
            log::warn!("Discarding unreadable local storage: {}", e);
            BTreeMap::new()
        });
        items.insert(key.to_string(), value.to_string());
        write_json(&self.path, &items)
    }
}

/// In-memory storage; `fail_writes` simulates a full or read-only disk
#[derive(Default)]
pub struct MemoryLocalStorage {
    items: Mutex<BTreeMap<String, String>>,
    fail_writes: bool,
}

impl MemoryLocalStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_item(self, key: &str, value: &str) -> Self {
        if let Ok(mut items) = self.items.lock() {
            items.insert(key.to_string(), value.to_string());
        }
        self
    }

    pub fn failing_writes(mut self) -> Self {
        self.fail_writes = true;
        self
    }
}

impl LocalStorage for MemoryLocalStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, String> {
        let items = self.items.lock().map_err(|e| e.to_string())?;
        Ok(items.get(key).cloned())
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), String> {
        if self.fail_writes {
            return Err("storage is read-only".to_string());
        }
        let mut items = self.items.lock().map_err(|e| e.to_string())?;
        items.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Set of advice ids this device has voted for
pub struct VoteDedupLedger {
    storage: Box<dyn LocalStorage>,
    voted: HashSet<String>,
}

impl VoteDedupLedger {
    /// Load the ledger from storage. Unreadable storage or a missing or
    /// malformed value starts an empty ledger.
    pub fn load(storage: Box<dyn LocalStorage>) -> Result<Self, String> {
        let voted = match storage.get_item(LEDGER_STORAGE_KEY) {
            Ok(Some(raw)) => serde_json::from_str::<Vec<String>>(&raw)
                .map(|ids| ids.into_iter().collect())
                .unwrap_or_else(|e| {
                    log::warn!("Ignoring malformed {}: {}", LEDGER_STORAGE_KEY, e);
                    HashSet::new()
                }),
            Ok(None) => HashSet::new(),
            Err(e) => {
                log::warn!("Ignoring unreadable local storage: {}", e);
                HashSet::new()
            }
        };

        log::debug!("Loaded vote ledger with {} entries", voted.len());
        Ok(Self { storage, voted })
    }

    pub fn has_voted(&self, id: &str) -> bool {
        self.voted.contains(id)
    }

    /// Record a vote and persist the ledger. Recording an id twice is a no-op.
    ///
    /// The in-memory entry is kept even if persisting fails, so this session
    /// still refuses a second vote.
    pub fn record_vote(&mut self, id: &str) -> Result<(), String> {
        if !self.voted.insert(id.to_string()) {
            return Ok(());
        }
        self.persist()
    }

    pub fn len(&self) -> usize {
        self.voted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.voted.is_empty()
    }

    fn persist(&mut self) -> Result<(), String> {
        let mut ids: Vec<&String> = self.voted.iter().collect();
        ids.sort();
        let raw = serde_json::to_string(&ids)
            .map_err(|e| format!("Failed to serialize vote ledger: {}", e))?;
        self.storage.set_item(LEDGER_STORAGE_KEY, &raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_empty_storage_gives_empty_ledger() {
        let ledger = VoteDedupLedger::load(Box::new(MemoryLocalStorage::new())).unwrap();
        assert!(ledger.is_empty());
        assert!(!ledger.has_voted("a"));
    }

    #[test]
    fn test_loads_existing_ids() {
        let storage = MemoryLocalStorage::new().with_item(LEDGER_STORAGE_KEY, r#"["a","b"]"#);
        let ledger = VoteDedupLedger::load(Box::new(storage)).unwrap();
        assert!(ledger.has_voted("a"));
        assert!(ledger.has_voted("b"));
        assert!(!ledger.has_voted("c"));
    }

    #[test]
    fn test_malformed_value_starts_empty() {
        let storage = MemoryLocalStorage::new().with_item(LEDGER_STORAGE_KEY, "{oops");
        let ledger = VoteDedupLedger::load(Box::new(storage)).unwrap();
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_corrupt_storage_file_starts_empty() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join(LOCAL_STORAGE_FILE_NAME), "{trunc").unwrap();

        let mut ledger =
            VoteDedupLedger::load(Box::new(FileLocalStorage::new(temp_dir.path()))).unwrap();
        assert!(ledger.is_empty());

        ledger.record_vote("a").unwrap();
        let reloaded =
            VoteDedupLedger::load(Box::new(FileLocalStorage::new(temp_dir.path()))).unwrap();
        assert!(reloaded.has_voted("a"));
    }

    #[test]
    fn test_record_vote_is_idempotent() {
        let mut ledger = VoteDedupLedger::load(Box::new(MemoryLocalStorage::new())).unwrap();
        ledger.record_vote("a").unwrap();
        ledger.record_vote("a").unwrap();
        assert_eq!(ledger.len(), 1);
        assert!(ledger.has_voted("a"));
    }

    #[test]
    fn test_failed_persist_still_blocks_in_session() {
        let storage = MemoryLocalStorage::new().failing_writes();
        let mut ledger = VoteDedupLedger::load(Box::new(storage)).unwrap();

        assert!(ledger.record_vote("a").is_err());
        assert!(ledger.has_voted("a"));
    }

    #[test]
    fn test_file_storage_persists_across_loads() {
        let temp_dir = TempDir::new().unwrap();

        let mut ledger =
            VoteDedupLedger::load(Box::new(FileLocalStorage::new(temp_dir.path()))).unwrap();
        ledger.record_vote("b").unwrap();
        ledger.record_vote("a").unwrap();

        let storage = FileLocalStorage::new(temp_dir.path());
        assert_eq!(
            storage.get_item(LEDGER_STORAGE_KEY).unwrap().unwrap(),
            r#"["a","b"]"#
        );

        let reloaded = VoteDedupLedger::load(Box::new(storage)).unwrap();
        assert!(reloaded.has_voted("a"));
        assert!(reloaded.has_voted("b"));
    }

    #[test]
    fn test_file_storage_keeps_other_keys() {
        let temp_dir = TempDir::new().unwrap();
        let mut storage = FileLocalStorage::new(temp_dir.path());
        storage.set_item("theme", "dark").unwrap();
        storage.set_item(LEDGER_STORAGE_KEY, "[]").unwrap();

        assert_eq!(storage.get_item("theme").unwrap().unwrap(), "dark");
    }
}
