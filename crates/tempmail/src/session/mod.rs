//! Session lifecycle for the disposable mailbox
//!
//! Owns the credential/token pair, decides when the credential is rotated
//! and keeps the cached token consistent with the credential it came from.

mod expiry;
mod store;

pub use expiry::ExpiryPolicy;
pub use store::{AUTHENTICATION_KEY, IDENTITY_KEY, LAST_ACTIVE_KEY, SessionStore};
