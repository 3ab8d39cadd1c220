//! Credential and token models for the mail.tm identity

use serde::{Deserialize, Serialize};

/// Generated mailbox address and password registered with mail.tm
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub address: String,
    pub password: String,
}

impl Credential {
    pub fn new(address: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("address", &self.address)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Bearer token derived from a credential
///
/// `id` is the mail.tm account identifier the token belongs to.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub id: String,
    pub token: String,
}

impl Token {
    /// Value for the `Authorization` header
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.token)
    }
}

impl std::fmt::Debug for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Token")
            .field("id", &self.id)
            .field("token", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_secrets() {
        let credential = Credential::new("calm-teal-otter-123@example.com", "s3cret");
        let token = Token {
            id: "acc-1".to_string(),
            token: "jwt-value".to_string(),
        };

        let rendered = format!("{:?} {:?}", credential, token);
        assert!(rendered.contains("calm-teal-otter-123@example.com"));
        assert!(!rendered.contains("s3cret"));
        assert!(!rendered.contains("jwt-value"));
    }

    #[test]
    fn test_token_deserializes_from_exchange_response() {
        let token: Token =
            serde_json::from_str(r#"{"id":"acc-1","token":"abc","extra":true}"#).unwrap();
        assert_eq!(token.id, "acc-1");
        assert_eq!(token.bearer(), "Bearer abc");
    }
}
