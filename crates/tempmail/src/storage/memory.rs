//! In-memory storage implementation

use anyhow::{Result, anyhow};
use std::collections::HashMap;
use std::sync::RwLock;

use super::KeyValueStore;

/// In-memory implementation of KeyValueStore
///
/// Uses a HashMap protected by an RwLock for thread-safe access.
#[derive(Default)]
pub struct InMemoryKeyValueStore {
    entries: RwLock<HashMap<String, String>>,
}

impl InMemoryKeyValueStore {
    /// Create a new empty in-memory store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with entries
    pub fn with_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: RwLock::new(
                entries
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        }
    }
}

impl KeyValueStore for InMemoryKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self
            .entries
            .read()
            .map_err(|_| anyhow!("key-value store lock poisoned"))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| anyhow!("key-value store lock poisoned"))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| anyhow!("key-value store lock poisoned"))?;
        entries.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_remove() {
        let store = InMemoryKeyValueStore::new();
        assert_eq!(store.get("identity").unwrap(), None);

        store.set("identity", "{\"id\":\"a\"}").unwrap();
        assert_eq!(store.get("identity").unwrap().as_deref(), Some("{\"id\":\"a\"}"));

        store.set("identity", "{\"id\":\"b\"}").unwrap();
        assert_eq!(store.get("identity").unwrap().as_deref(), Some("{\"id\":\"b\"}"));

        store.remove("identity").unwrap();
        assert_eq!(store.get("identity").unwrap(), None);

        // Removing again is fine
        store.remove("identity").unwrap();
    }

    #[test]
    fn test_with_entries() {
        let store = InMemoryKeyValueStore::with_entries([("last_active", "2024-01-01T00:00:00.000Z")]);
        assert!(store.get("last_active").unwrap().is_some());
    }
}
