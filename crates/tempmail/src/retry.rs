//! Caller-side retry for authorization failures
//!
//! The client never retries on its own. After a `TokenExpired` failure the
//! cached token is already gone, so running the operation again obtains a
//! fresh one.

use log::info;

use crate::error::{MailboxError, Result};

/// Run `op`, and run it exactly once more if the first attempt failed with
/// `TokenExpired`. Any other outcome is returned unchanged.
pub fn retry_on_token_expired<T, F>(mut op: F) -> Result<T>
where
    F: FnMut() -> Result<T>,
{
    match op() {
        Err(MailboxError::TokenExpired) => {
            info!("Token expired, retrying once with a fresh token");
            op()
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retries_once_after_token_expired() {
        let mut calls = 0;
        let result = retry_on_token_expired(|| {
            calls += 1;
            if calls == 1 {
                Err(MailboxError::TokenExpired)
            } else {
                Ok(calls)
            }
        });
        assert_eq!(result.unwrap(), 2);
    }

    #[test]
    fn test_second_token_expired_is_returned() {
        let mut calls = 0;
        let result: Result<()> = retry_on_token_expired(|| {
            calls += 1;
            Err(MailboxError::TokenExpired)
        });
        assert!(matches!(result, Err(MailboxError::TokenExpired)));
        assert_eq!(calls, 2);
    }

    #[test]
    fn test_other_errors_not_retried() {
        let mut calls = 0;
        let result: Result<()> = retry_on_token_expired(|| {
            calls += 1;
            Err(MailboxError::Timeout)
        });
        assert!(matches!(result, Err(MailboxError::Timeout)));
        assert_eq!(calls, 1);
    }
}
