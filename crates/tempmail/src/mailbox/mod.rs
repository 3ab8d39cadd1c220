//! Mailbox client for the presentation layer
//!
//! Every operation obtains a token from the [`SessionStore`] first. An
//! authorization failure clears the cached token and fails with
//! `TokenExpired`; retrying is left to the caller (see
//! [`retry_on_token_expired`](crate::retry::retry_on_token_expired)).

mod pages;

pub use pages::MessagePages;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{info, warn};

use crate::cancel::CancelToken;
use crate::config::Settings;
use crate::download::{Downloader, render_html};
use crate::error::{MailboxError, Result};
use crate::mailtm::MailTmClient;
use crate::mailtm::api::HydraCollection;
use crate::models::{
    AttachmentRequest, MailboxData, MessageDetail, MessageId, MessageSummary, Token,
    TransferEncoding,
};
use crate::session::SessionStore;
use crate::storage::KeyValueStore;

/// Number of summaries mail.tm returns per page
pub const PAGE_SIZE: usize = 30;

/// Mailbox operations backed by mail.tm
pub struct MailboxClient {
    session: Arc<SessionStore>,
    api: Arc<MailTmClient>,
    downloads: Downloader,
}

impl MailboxClient {
    /// Build a client from settings and an injected key-value store
    pub fn new(settings: &Settings, store: Arc<dyn KeyValueStore>) -> anyhow::Result<Self> {
        let api = Arc::new(MailTmClient::new(&settings.api_base_url, settings.timeout()));
        let session = Arc::new(SessionStore::new(store, Arc::clone(&api), settings.expiry()));
        Ok(Self::with_parts(session, api, settings.support_dir()?))
    }

    /// Assemble a client from already-built parts
    pub fn with_parts(
        session: Arc<SessionStore>,
        api: Arc<MailTmClient>,
        support_dir: impl AsRef<Path>,
    ) -> Self {
        Self {
            session,
            api,
            downloads: Downloader::new(support_dir),
        }
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    pub fn downloads(&self) -> &Downloader {
        &self.downloads
    }

    /// Run an authenticated call with the current token, clearing the token
    /// cache if the service rejects it.
    fn authorized<T, F>(&self, call: F) -> Result<T>
    where
        F: FnOnce(&Token) -> Result<T>,
    {
        let token = self.session.obtain_token(None)?;
        match call(&token) {
            Err(MailboxError::TokenExpired) => {
                warn!("Token rejected by mail.tm, clearing cached token");
                self.session.invalidate_token()?;
                Err(MailboxError::TokenExpired)
            }
            other => other,
        }
    }

    pub(crate) fn fetch_page(&self, page: u32) -> Result<HydraCollection<MessageSummary>> {
        self.authorized(|token| self.api.list_messages(token, page))
    }

    // === Listing ===

    /// Lazily iterate over message pages, starting at page 1
    pub fn pages(&self) -> MessagePages<'_> {
        MessagePages::new(self)
    }

    /// Current address, its creation time and every message in server order
    pub fn list_messages(&self) -> Result<MailboxData> {
        self.collect_mailbox(self.pages())
    }

    /// Like [`list_messages`](Self::list_messages), abandoning the listing
    /// once `cancel` fires
    pub fn list_messages_cancellable(&self, cancel: &CancelToken) -> Result<MailboxData> {
        self.collect_mailbox(self.pages().with_cancel(cancel.clone()))
    }

    fn collect_mailbox(&self, pages: MessagePages<'_>) -> Result<MailboxData> {
        let mut messages = Vec::new();
        for page in pages {
            messages.extend(page?);
        }

        // Reading the identity after listing: the first page may have
        // created or rotated it.
        let current_address = self.session.current_address()?.unwrap_or_default();
        let last_active = self.session.last_active()?;
        let expires_at = self.session.expires_at()?;

        Ok(MailboxData {
            last_active,
            current_address,
            expires_at,
            messages,
        })
    }

    // === Single messages ===

    /// Fetch a message and, if it was unseen, mark it seen on the server.
    ///
    /// Returns the message as fetched (so `seen` reflects the state before
    /// this call).
    pub fn get_message(&self, id: &MessageId) -> Result<MessageDetail> {
        let message = self.fetch_message(id)?;
        if !message.seen {
            self.mark_seen(id)?;
        }
        Ok(message)
    }

    /// Fetch a message without marking it seen
    pub fn fetch_message(&self, id: &MessageId) -> Result<MessageDetail> {
        self.authorized(|token| self.api.get_message(token, id))
    }

    pub fn mark_seen(&self, id: &MessageId) -> Result<()> {
        self.authorized(|token| self.api.mark_seen(token, id))
    }

    pub fn delete_message(&self, id: &MessageId) -> Result<()> {
        self.authorized(|token| self.api.delete_message(token, id))?;
        info!("Deleted message {}", id);
        Ok(())
    }

    // === Downloads ===

    /// Download the raw RFC 822 message behind `download_url` into the cache
    pub fn download_raw_message(&self, download_url: &str) -> Result<PathBuf> {
        self.download_raw_message_cancellable(download_url, &CancelToken::new())
    }

    pub fn download_raw_message_cancellable(
        &self,
        download_url: &str,
        cancel: &CancelToken,
    ) -> Result<PathBuf> {
        let path = self.downloads.raw_message_path(download_url)?;
        self.downloads
            .fetch(path, &TransferEncoding::Binary, cancel, || {
                self.authorized(|token| self.api.download(token, download_url))
            })
    }

    /// Download an attachment into `temp/attachments/{message id}/`
    pub fn download_attachment(&self, request: &AttachmentRequest) -> Result<PathBuf> {
        self.download_attachment_cancellable(request, &CancelToken::new())
    }

    pub fn download_attachment_cancellable(
        &self,
        request: &AttachmentRequest,
        cancel: &CancelToken,
    ) -> Result<PathBuf> {
        let path = self.downloads.attachment_path(request)?;
        self.downloads
            .fetch(path, &request.transfer_encoding, cancel, || {
                self.authorized(|token| self.api.download(token, &request.download_url))
            })
    }

    /// Render a downloaded raw message as HTML next to it
    pub fn renderable_html_from(&self, raw_path: &Path) -> Result<PathBuf> {
        render_html(raw_path)
    }

    // === Session ===

    /// Discard the current address; the next call creates a new one
    pub fn reset_session(&self) -> Result<()> {
        self.session.reset_session()
    }
}
