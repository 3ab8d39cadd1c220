//! Cooperative cancellation for long-running operations

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::{MailboxError, Result};

/// Shared flag a caller flips to abandon an in-flight listing or download
///
/// Cancellation is checked between pages and between download chunks. A
/// cancelled operation settles with [`MailboxError::Cancelled`] and leaves the
/// persisted session untouched.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// `Err(Cancelled)` once cancelled
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(MailboxError::Cancelled)
        } else {
            Ok(())
        }
    }
}
