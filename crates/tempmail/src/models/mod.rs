//! Domain models for mailbox entities

mod credential;
mod message;

pub use credential::{Credential, Token};
pub use message::{
    Address, Attachment, AttachmentRequest, MailboxData, MessageDetail, MessageId, MessageSummary,
    TransferEncoding,
};
