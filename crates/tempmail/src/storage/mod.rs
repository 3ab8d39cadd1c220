//! Key-value storage for persisted session state
//!
//! The session store never talks to disk directly; it is handed an
//! implementation of [`KeyValueStore`]. The in-memory store backs tests and
//! ephemeral sessions, the file store keeps the session across restarts.

mod file;
mod memory;
mod traits;

pub use file::FileKeyValueStore;
pub use memory::InMemoryKeyValueStore;
pub use traits::KeyValueStore;
