//! JSON-file storage implementation
//!
//! All keys live in one JSON object:
//! ```text
//! {
//!   "authentication": "{\"address\":\"...\",\"password\":\"...\"}",
//!   "identity": "{\"id\":\"...\",\"token\":\"...\"}",
//!   "last_active": "2024-05-01T10:00:00.000Z"
//! }
//! ```

use anyhow::{Context, Result, anyhow};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::KeyValueStore;

/// Default session file name in the config directory
const SESSION_FILE: &str = "session.json";

/// File-backed implementation of KeyValueStore
///
/// Every write rewrites the whole file atomically (temp file + rename).
pub struct FileKeyValueStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileKeyValueStore {
    /// Create a store backed by the file at `path` (created on first write)
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            lock: Mutex::new(()),
        }
    }

    /// Open the store at ~/.config/tempmail/session.json
    pub fn open_default() -> Result<Self> {
        let path = config::config_path(SESSION_FILE).context("Could not determine config directory")?;
        Ok(Self::new(path))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        config::load_json_file(&self.path)
    }

    fn update<F>(&self, apply: F) -> Result<()>
    where
        F: FnOnce(&mut BTreeMap<String, String>),
    {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| anyhow!("session file lock poisoned"))?;
        let mut entries = self.load()?;
        apply(&mut entries);
        config::save_json_file(&self.path, &entries)
    }
}

impl KeyValueStore for FileKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| anyhow!("session file lock poisoned"))?;
        Ok(self.load()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.update(|entries| {
            entries.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.update(|entries| {
            entries.remove(key);
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_persists_across_instances() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.json");

        let store = FileKeyValueStore::new(&path);
        store.set("authentication", "{\"address\":\"a@b\"}").unwrap();
        store.set("last_active", "2024-05-01T10:00:00.000Z").unwrap();
        drop(store);

        let reopened = FileKeyValueStore::new(&path);
        assert_eq!(
            reopened.get("authentication").unwrap().as_deref(),
            Some("{\"address\":\"a@b\"}")
        );
        assert!(reopened.get("identity").unwrap().is_none());
    }

    #[test]
    fn test_remove_keeps_other_keys() {
        let dir = TempDir::new().unwrap();
        let store = FileKeyValueStore::new(dir.path().join("session.json"));

        store.set("identity", "tok").unwrap();
        store.set("authentication", "cred").unwrap();
        store.remove("identity").unwrap();

        assert!(store.get("identity").unwrap().is_none());
        assert_eq!(store.get("authentication").unwrap().as_deref(), Some("cred"));
    }

    #[test]
    fn test_missing_file_reads_empty() {
        let dir = TempDir::new().unwrap();
        let store = FileKeyValueStore::new(dir.path().join("absent").join("session.json"));
        assert!(store.get("authentication").unwrap().is_none());
        store.remove("authentication").unwrap();
    }
}
