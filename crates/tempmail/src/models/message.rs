//! Message models as served by mail.tm

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unique identifier for a message (mail.tm message ID)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub String);

impl MessageId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for MessageId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for MessageId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// An email address with a display name (empty when the sender gave none)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub address: String,
    #[serde(default)]
    pub name: String,
}

impl Address {
    /// Display name if present, otherwise the bare address
    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            &self.address
        } else {
            &self.name
        }
    }
}

/// Message summary as returned by the paginated message list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageSummary {
    pub id: MessageId,
    pub from: Address,
    #[serde(default)]
    pub to: Vec<Address>,
    #[serde(default)]
    pub subject: String,
    /// Short plain-text preview of the body
    #[serde(default)]
    pub intro: String,
    #[serde(default)]
    pub seen: bool,
    #[serde(default)]
    pub has_attachments: bool,
    #[serde(default)]
    pub size: u64,
    /// Path of the raw RFC 822 download, e.g. `/messages/{id}/download`
    pub download_url: String,
    pub created_at: DateTime<Utc>,
}

/// Attachment metadata of a full message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub id: String,
    pub filename: String,
    #[serde(default)]
    pub content_type: String,
    #[serde(default)]
    pub disposition: String,
    #[serde(default)]
    pub transfer_encoding: String,
    #[serde(default)]
    pub related: bool,
    #[serde(default)]
    pub size: u64,
    pub download_url: String,
}

/// Full message including bodies, recipients and attachments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageDetail {
    pub id: MessageId,
    pub from: Address,
    #[serde(default)]
    pub to: Vec<Address>,
    #[serde(default)]
    pub cc: Vec<Address>,
    #[serde(default)]
    pub bcc: Vec<Address>,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub seen: bool,
    #[serde(default)]
    pub flagged: bool,
    #[serde(default)]
    pub has_attachments: bool,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    #[serde(default)]
    pub size: u64,
    pub download_url: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub html: Vec<String>,
    /// When mail.tm will purge the message
    pub retention_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl MessageDetail {
    /// Renderable body: the `<body>` element of the first HTML part,
    /// the whole HTML part when it has no body element, or the text body.
    pub fn body_fragment(&self) -> &str {
        let Some(html) = self.html.first() else {
            return &self.text;
        };

        match (html.find("<body"), html.find("</body>")) {
            (Some(start), Some(end)) if start < end => &html[start..end + "</body>".len()],
            _ => html,
        }
    }
}

/// Content transfer encoding declared for an attachment
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferEncoding {
    Base64,
    QuotedPrintable,
    SevenBit,
    EightBit,
    Binary,
    Other(String),
}

impl TransferEncoding {
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "base64" => TransferEncoding::Base64,
            "quoted-printable" => TransferEncoding::QuotedPrintable,
            "7bit" => TransferEncoding::SevenBit,
            "8bit" => TransferEncoding::EightBit,
            "binary" | "" => TransferEncoding::Binary,
            other => TransferEncoding::Other(other.to_string()),
        }
    }
}

/// Everything needed to fetch one attachment into the download cache
#[derive(Debug, Clone, PartialEq)]
pub struct AttachmentRequest {
    /// Message the attachment belongs to; names the cache subdirectory
    pub message_id: MessageId,
    pub filename: String,
    pub download_url: String,
    pub transfer_encoding: TransferEncoding,
}

impl AttachmentRequest {
    pub fn for_attachment(message_id: &MessageId, attachment: &Attachment) -> Self {
        Self {
            message_id: message_id.clone(),
            filename: attachment.filename.clone(),
            download_url: attachment.download_url.clone(),
            transfer_encoding: TransferEncoding::parse(&attachment.transfer_encoding),
        }
    }
}

/// Snapshot of the inbox for the presentation layer
#[derive(Debug, Clone)]
pub struct MailboxData {
    /// When the current address was created, `None` if that was never recorded
    pub last_active: Option<DateTime<Utc>>,
    pub current_address: String,
    /// When the current address will be rotated, `None` if it never expires
    pub expires_at: Option<DateTime<Utc>>,
    /// Message summaries in server order
    pub messages: Vec<MessageSummary>,
}
