//! Tempmail crate - Disposable inbox client for the mail.tm API
//!
//! This crate provides the non-UI part of a throwaway-address mail client:
//! - Session store that creates, rotates and caches mail.tm credentials
//! - Mail.tm HTTP client and wire types
//! - Key-value storage trait abstractions for persisted session state
//! - Mailbox client with lazy pagination and explicit mark-as-seen
//! - Idempotent download cache for raw messages and attachments
//!
//! Every call is synchronous (ureq), so callers pick their own executor
//! or thread model.

pub mod cancel;
pub mod config;
pub mod download;
pub mod error;
pub mod mailbox;
pub mod mailtm;
pub mod models;
pub mod retry;
pub mod session;
pub mod storage;

pub use cancel::CancelToken;
pub use crate::config::Settings;
pub use download::{Downloader, render_html};
pub use error::{MailboxError, Result};
pub use mailbox::{MailboxClient, MessagePages, PAGE_SIZE};
pub use mailtm::MailTmClient;
pub use models::{
    Address, Attachment, AttachmentRequest, Credential, MailboxData, MessageDetail, MessageId,
    MessageSummary, Token, TransferEncoding,
};
pub use retry::retry_on_token_expired;
pub use session::{ExpiryPolicy, SessionStore};
pub use storage::{FileKeyValueStore, InMemoryKeyValueStore, KeyValueStore};
