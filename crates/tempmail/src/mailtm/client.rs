//! mail.tm HTTP client
//!
//! Thin wrappers over the REST endpoints. Every call maps its HTTP outcome
//! onto [`MailboxError`]: 2xx returns data, 401 on an authenticated call is
//! `TokenExpired`, any other status is `RemoteApi`. No retries happen here.
//! Uses synchronous HTTP (ureq) to be executor-agnostic.

use std::io::Read;
use std::time::Duration;

use log::debug;
use serde::de::DeserializeOwned;
use ureq::http::Response;
use ureq::{Agent, Body};

use super::api::{Account, Domain, HydraCollection};
use crate::error::{MailboxError, Result};
use crate::models::{Credential, MessageDetail, MessageId, MessageSummary, Token};

/// Streamed response body of a raw message or attachment download
pub struct Download {
    /// `Content-Type` the server declared for the body
    pub content_type: Option<String>,
    pub reader: Box<dyn Read>,
}

/// mail.tm API client
pub struct MailTmClient {
    agent: Agent,
    base_url: String,
}

impl MailTmClient {
    /// Public mail.tm API base URL
    pub const DEFAULT_BASE_URL: &'static str = "https://api.mail.tm";

    /// Hydra collections are requested as JSON-LD
    const JSON_LD: &'static str = "application/ld+json";

    const MERGE_PATCH: &'static str = "application/merge-patch+json";

    /// Create a client for `base_url`, applying `timeout` to every phase of a
    /// call: resolving, connecting, sending, the response head and the body.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        let config = Agent::config_builder()
            .http_status_as_error(false)
            .timeout_resolve(Some(timeout))
            .timeout_connect(Some(timeout))
            .timeout_send_request(Some(timeout))
            .timeout_recv_response(Some(timeout))
            .timeout_recv_body(Some(timeout))
            .build();

        Self {
            agent: Agent::new_with_config(config),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn message_url(&self, id: &MessageId) -> String {
        self.url(&format!("/messages/{}", urlencoding::encode(id.as_str())))
    }

    // === Unauthenticated endpoints ===

    /// List the domains addresses can be registered under
    pub fn list_domains(&self) -> Result<Vec<Domain>> {
        let response = self
            .agent
            .get(&self.url("/domains"))
            .header("Accept", Self::JSON_LD)
            .call()?;

        let domains: HydraCollection<Domain> = read_json(check(response, false)?)?;
        Ok(domains.member)
    }

    /// Pick the first active domain, falling back to the first listed one
    pub fn first_domain(&self) -> Result<Domain> {
        let domains = self.list_domains()?;
        domains
            .iter()
            .find(|d| d.is_active)
            .or_else(|| domains.first())
            .cloned()
            .ok_or(MailboxError::NoDomainAvailable)
    }

    /// Register a new account for `credential`
    pub fn create_account(&self, credential: &Credential) -> Result<Account> {
        let response = self
            .agent
            .post(&self.url("/accounts"))
            .header("Accept", Self::JSON_LD)
            .send_json(credential)?;

        let account: Account = read_json(check(response, false)?)?;
        debug!("Registered mail.tm account {}", account.id);
        Ok(account)
    }

    /// Exchange a credential for a bearer token
    ///
    /// A rejected credential surfaces as `RemoteApi { status: 401 }`, since
    /// no token was involved.
    pub fn exchange_token(&self, credential: &Credential) -> Result<Token> {
        let response = self
            .agent
            .post(&self.url("/token"))
            .header("Accept", Self::JSON_LD)
            .send_json(credential)?;

        read_json(check(response, false)?)
    }

    // === Authenticated endpoints ===

    /// Delete the account the token belongs to
    pub fn delete_account(&self, token: &Token) -> Result<()> {
        let url = self.url(&format!("/accounts/{}", urlencoding::encode(&token.id)));
        let response = self
            .agent
            .delete(&url)
            .header("Authorization", &token.bearer())
            .call()?;

        check(response, true)?;
        Ok(())
    }

    /// Fetch one page (1-based) of message summaries
    pub fn list_messages(&self, token: &Token, page: u32) -> Result<HydraCollection<MessageSummary>> {
        let url = self.url(&format!("/messages?page={}", page));
        let response = self
            .agent
            .get(&url)
            .header("Accept", Self::JSON_LD)
            .header("Authorization", &token.bearer())
            .call()?;

        read_json(check(response, true)?)
    }

    /// Fetch a full message. Reading an unseen message does not mark it seen.
    pub fn get_message(&self, token: &Token, id: &MessageId) -> Result<MessageDetail> {
        let response = self
            .agent
            .get(&self.message_url(id))
            .header("Accept", Self::JSON_LD)
            .header("Authorization", &token.bearer())
            .call()?;

        read_json(check(response, true)?)
    }

    /// Merge-patch `{"seen": true}` onto a message
    pub fn mark_seen(&self, token: &Token, id: &MessageId) -> Result<()> {
        let body = serde_json::to_string(&serde_json::json!({ "seen": true }))?;
        let response = self
            .agent
            .patch(&self.message_url(id))
            .header("Accept", Self::JSON_LD)
            .header("Authorization", &token.bearer())
            .header("Content-Type", Self::MERGE_PATCH)
            .send(body.as_bytes())?;

        check(response, true)?;
        Ok(())
    }

    pub fn delete_message(&self, token: &Token, id: &MessageId) -> Result<()> {
        let response = self
            .agent
            .delete(&self.message_url(id))
            .header("Authorization", &token.bearer())
            .call()?;

        check(response, true)?;
        Ok(())
    }

    /// Open a streamed download of a path relative to the API base,
    /// e.g. `/messages/{id}/download`
    pub fn download(&self, token: &Token, download_url: &str) -> Result<Download> {
        let response = self
            .agent
            .get(&self.url(download_url))
            .header("Authorization", &token.bearer())
            .call()?;

        let response = check(response, true)?;
        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_string());

        Ok(Download {
            content_type,
            reader: Box::new(response.into_body().into_reader()),
        })
    }
}

/// Map a response status onto the client error kinds
fn check(mut response: Response<Body>, authenticated: bool) -> Result<Response<Body>> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    if status.as_u16() == 401 && authenticated {
        return Err(MailboxError::TokenExpired);
    }

    let body = response.body_mut().read_to_string().unwrap_or_default();
    Err(MailboxError::RemoteApi {
        status: status.as_u16(),
        body,
    })
}

fn read_json<T: DeserializeOwned>(mut response: Response<Body>) -> Result<T> {
    let body = response.body_mut().read_to_string()?;
    Ok(serde_json::from_str(&body)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = MailTmClient::new("https://api.mail.tm/", Duration::from_secs(5));
        assert_eq!(client.base_url(), "https://api.mail.tm");
        assert_eq!(client.url("/domains"), "https://api.mail.tm/domains");
    }

    #[test]
    fn test_message_url_encodes_id() {
        let client = MailTmClient::new(MailTmClient::DEFAULT_BASE_URL, Duration::from_secs(5));
        assert_eq!(
            client.message_url(&MessageId::new("a b")),
            "https://api.mail.tm/messages/a%20b"
        );
    }
}
