//! Storage trait definitions

use anyhow::Result;

/// String key-value store
///
/// Values are opaque strings (usually serialized JSON). `set` replaces the
/// whole value; there is no merging and no schema versioning.
pub trait KeyValueStore: Send + Sync {
    /// Get the value stored under `key`
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove `key`; removing a missing key is not an error
    fn remove(&self, key: &str) -> Result<()>;
}
