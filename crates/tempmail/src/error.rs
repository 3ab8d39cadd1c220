//! Error kinds surfaced by the mailbox client

use std::path::PathBuf;

/// Errors returned by session, mailbox and download operations
#[derive(Debug, thiserror::Error)]
pub enum MailboxError {
    /// An authenticated call was rejected; the cached token has been cleared
    /// and the caller may retry the operation once.
    #[error("Token Expired")]
    TokenExpired,

    /// Transport failure (DNS, connection, TLS, body read)
    #[error("network error: {0}")]
    Network(#[source] ureq::Error),

    /// The remote service did not answer within the configured timeout
    #[error("request timed out")]
    Timeout,

    /// Non-2xx response other than an authorization failure
    #[error("mail.tm returned HTTP {status}: {body}")]
    RemoteApi { status: u16, body: String },

    /// Directory creation or file write failure
    #[error("file system error at {}: {source}", path.display())]
    FileSystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A downloaded body did not match its declared transfer encoding
    #[error("failed to decode download into {}: {source}", path.display())]
    BodyDecode {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Response or persisted value was not valid JSON for the expected shape
    #[error("failed to decode JSON: {0}")]
    Decode(#[from] serde_json::Error),

    /// Key-value store failure
    #[error("session storage error: {0}")]
    Store(#[from] anyhow::Error),

    /// The service listed no domain to register an address under
    #[error("no mail domain available")]
    NoDomainAvailable,

    /// A download reference did not carry a message identifier
    #[error("invalid download reference: {0}")]
    InvalidReference(String),

    /// A raw message file could not be parsed for HTML rendering
    #[error("failed to parse message {}: {source}", path.display())]
    Render {
        path: PathBuf,
        #[source]
        source: mailparse::MailParseError,
    },

    /// The caller cancelled the operation
    #[error("operation cancelled")]
    Cancelled,
}

impl MailboxError {
    /// Whether the caller should retry the originating operation once
    pub fn is_token_expired(&self) -> bool {
        matches!(self, MailboxError::TokenExpired)
    }

    pub(crate) fn file_system(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        MailboxError::FileSystem {
            path: path.into(),
            source,
        }
    }
}

impl From<ureq::Error> for MailboxError {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::Timeout(_) => MailboxError::Timeout,
            other => MailboxError::Network(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, MailboxError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_expired_message() {
        // Callers historically matched on this exact text
        assert_eq!(MailboxError::TokenExpired.to_string(), "Token Expired");
        assert!(MailboxError::TokenExpired.is_token_expired());
        assert!(!MailboxError::Timeout.is_token_expired());
    }

    #[test]
    fn test_remote_api_message_includes_status() {
        let err = MailboxError::RemoteApi {
            status: 422,
            body: "address already used".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "mail.tm returned HTTP 422: address already used"
        );
    }
}
