//! Lazy page-by-page message listing

use log::debug;

use super::{MailboxClient, PAGE_SIZE};
use crate::cancel::CancelToken;
use crate::error::Result;
use crate::models::MessageSummary;

/// Iterator over pages of message summaries, fetched on demand.
///
/// Starts at page 1 and stops after the page that completes the reported
/// total, after a page reporting a total of at most one page, after an empty
/// page, or after the first error. Create a new iterator to start over.
pub struct MessagePages<'a> {
    client: &'a MailboxClient,
    cancel: Option<CancelToken>,
    next_page: u32,
    fetched: usize,
    total: Option<usize>,
    done: bool,
}

impl<'a> MessagePages<'a> {
    pub(super) fn new(client: &'a MailboxClient) -> Self {
        Self {
            client,
            cancel: None,
            next_page: 1,
            fetched: 0,
            total: None,
            done: false,
        }
    }

    /// Stop with `Cancelled` before fetching any further page once `cancel` fires
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Total item count reported by the most recent page
    pub fn total(&self) -> Option<usize> {
        self.total
    }

    /// Number of summaries yielded so far
    pub fn fetched(&self) -> usize {
        self.fetched
    }

    fn fetch_next(&mut self) -> Result<Vec<MessageSummary>> {
        if let Some(cancel) = &self.cancel {
            cancel.check()?;
        }

        let page = self.next_page;
        let collection = self.client.fetch_page(page)?;
        let count = collection.member.len();

        self.fetched += count;
        self.total = Some(collection.total_items);
        self.next_page += 1;

        if collection.total_items <= PAGE_SIZE
            || self.fetched >= collection.total_items
            || count == 0
        {
            self.done = true;
        }

        debug!(
            "Fetched message page {} ({} items, {}/{} total)",
            page, count, self.fetched, collection.total_items
        );
        Ok(collection.member)
    }
}

impl Iterator for MessagePages<'_> {
    type Item = Result<Vec<MessageSummary>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let page = self.fetch_next();
        if page.is_err() {
            self.done = true;
        }
        Some(page)
    }
}
