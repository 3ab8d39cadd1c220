//! Session store: credential creation, rotation and token caching
//!
//! Persisted layout (all values are strings, fully replaced on write):
//! - `authentication`: JSON [`Credential`]
//! - `identity`: JSON [`Token`]
//! - `last_active`: RFC 3339 instant the credential was created
//!
//! Every operation that rotates or deletes the credential also removes the
//! cached token before returning.

use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use log::{debug, info, warn};

use super::ExpiryPolicy;
use crate::error::{MailboxError, Result};
use crate::mailtm::{MailTmClient, generate_credential};
use crate::models::{Credential, Token};
use crate::storage::KeyValueStore;

pub const AUTHENTICATION_KEY: &str = "authentication";
pub const IDENTITY_KEY: &str = "identity";
pub const LAST_ACTIVE_KEY: &str = "last_active";

/// Produces valid bearer tokens, creating or rotating the mailbox as needed
pub struct SessionStore {
    store: Arc<dyn KeyValueStore>,
    api: Arc<MailTmClient>,
    expiry: ExpiryPolicy,
}

impl SessionStore {
    pub fn new(store: Arc<dyn KeyValueStore>, api: Arc<MailTmClient>, expiry: ExpiryPolicy) -> Self {
        Self { store, api, expiry }
    }

    pub fn expiry(&self) -> ExpiryPolicy {
        self.expiry
    }

    /// Return the credential in force, creating one if none is persisted and
    /// rotating it if the expiry policy says it has outlived its lifetime.
    pub fn obtain_credential(&self) -> Result<Credential> {
        let Some(credential) = self.stored_credential()? else {
            return self.create_credential();
        };

        if self.is_expired(Utc::now())? {
            info!("Mailbox {} expired, rotating", credential.address);
            self.delete_identity(&credential)?;
            return self.create_credential();
        }

        Ok(credential)
    }

    /// Return a bearer token.
    ///
    /// Without `specific`, a cached token is returned as-is with no remote
    /// call and no expiry re-check. Otherwise the given (or current)
    /// credential is exchanged and the resulting token is cached.
    pub fn obtain_token(&self, specific: Option<&Credential>) -> Result<Token> {
        if specific.is_none()
            && let Some(token) = self.cached_token()?
        {
            return Ok(token);
        }

        let credential = match specific {
            Some(credential) => credential.clone(),
            None => self.obtain_credential()?,
        };

        debug!("Exchanging credential for {} for a token", credential.address);
        let token = self.api.exchange_token(&credential)?;
        self.store.set(IDENTITY_KEY, &serde_json::to_string(&token)?)?;
        Ok(token)
    }

    /// Delete the current remote account (if any) and forget it locally so
    /// the next call generates a brand-new address.
    pub fn reset_session(&self) -> Result<()> {
        match self.stored_credential()? {
            Some(credential) => {
                info!("Resetting mailbox {}", credential.address);
                self.delete_identity(&credential)
            }
            None => self.invalidate_token(),
        }
    }

    /// Forget only the cached token; the next `obtain_token` re-exchanges.
    pub fn invalidate_token(&self) -> Result<()> {
        self.store.remove(IDENTITY_KEY)?;
        Ok(())
    }

    /// Address of the persisted credential, if any
    pub fn current_address(&self) -> Result<Option<String>> {
        Ok(self.stored_credential()?.map(|c| c.address))
    }

    /// When the persisted credential was created
    pub fn last_active(&self) -> Result<Option<DateTime<Utc>>> {
        let Some(raw) = self.store.get(LAST_ACTIVE_KEY)? else {
            return Ok(None);
        };

        match DateTime::parse_from_rfc3339(&raw) {
            Ok(instant) => Ok(Some(instant.with_timezone(&Utc))),
            Err(e) => {
                warn!("Ignoring unparseable {} value {:?}: {}", LAST_ACTIVE_KEY, raw, e);
                Ok(None)
            }
        }
    }

    /// When the current address will be rotated under the expiry policy
    pub fn expires_at(&self) -> Result<Option<DateTime<Utc>>> {
        Ok(self
            .last_active()?
            .and_then(|last_active| self.expiry.expires_at(last_active)))
    }

    fn is_expired(&self, now: DateTime<Utc>) -> Result<bool> {
        if self.expiry == ExpiryPolicy::Never {
            return Ok(false);
        }

        // A credential without a usable creation time cannot be shown to be
        // within its lifetime.
        Ok(match self.last_active()? {
            Some(last_active) => self.expiry.is_expired(last_active, now),
            None => true,
        })
    }

    fn stored_credential(&self) -> Result<Option<Credential>> {
        match self.store.get(AUTHENTICATION_KEY)? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    fn cached_token(&self) -> Result<Option<Token>> {
        match self.store.get(IDENTITY_KEY)? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// Generate, register and persist a new credential
    fn create_credential(&self) -> Result<Credential> {
        let domain = self.api.first_domain()?;
        let credential = generate_credential(&domain.domain);

        self.api.create_account(&credential)?;

        self.store
            .set(AUTHENTICATION_KEY, &serde_json::to_string(&credential)?)?;
        self.store.set(
            LAST_ACTIVE_KEY,
            &Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        )?;
        self.store.remove(IDENTITY_KEY)?;

        info!("Created mailbox {}", credential.address);
        Ok(credential)
    }

    /// Delete the remote account behind `credential` and clear local state.
    ///
    /// An account the service no longer knows (rejected credential, or 404 on
    /// delete) counts as already deleted.
    fn delete_identity(&self, credential: &Credential) -> Result<()> {
        match self.obtain_token(Some(credential)) {
            Ok(token) => match self.api.delete_account(&token) {
                Ok(()) => debug!("Deleted remote account {}", token.id),
                Err(MailboxError::RemoteApi { status: 404, .. }) => {
                    warn!("Remote account {} already deleted", token.id);
                }
                Err(MailboxError::TokenExpired) => {
                    self.invalidate_token()?;
                    return Err(MailboxError::TokenExpired);
                }
                Err(e) => return Err(e),
            },
            Err(MailboxError::RemoteApi { status: 401, .. }) => {
                warn!("Credential for {} rejected, account already gone", credential.address);
            }
            Err(e) => return Err(e),
        }

        self.store.remove(AUTHENTICATION_KEY)?;
        self.store.remove(IDENTITY_KEY)?;
        self.store.remove(LAST_ACTIVE_KEY)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryKeyValueStore;
    use std::time::Duration;

    /// Session store whose API points at a closed port; only usable for
    /// paths that never reach the network.
    fn offline_session(entries: Vec<(&str, String)>, expiry: ExpiryPolicy) -> SessionStore {
        let store = Arc::new(InMemoryKeyValueStore::with_entries(entries));
        let api = Arc::new(MailTmClient::new("http://127.0.0.1:9", Duration::from_millis(200)));
        SessionStore::new(store, api, expiry)
    }

    fn credential_json() -> String {
        serde_json::to_string(&Credential::new("calm-teal-otter-123@example.com", "pw")).unwrap()
    }

    #[test]
    fn test_cached_token_returned_without_network() {
        let token = r#"{"id":"acc-1","token":"cached"}"#.to_string();
        let session = offline_session(vec![(IDENTITY_KEY, token)], ExpiryPolicy::Never);

        let token = session.obtain_token(None).unwrap();
        assert_eq!(token.token, "cached");
    }

    #[test]
    fn test_unexpired_credential_returned_unchanged() {
        let last_active = (Utc::now() - chrono::Duration::minutes(5))
            .to_rfc3339_opts(SecondsFormat::Millis, true);
        let session = offline_session(
            vec![
                (AUTHENTICATION_KEY, credential_json()),
                (LAST_ACTIVE_KEY, last_active),
            ],
            ExpiryPolicy::AfterMinutes(60),
        );

        let credential = session.obtain_credential().unwrap();
        assert_eq!(credential.address, "calm-teal-otter-123@example.com");
    }

    #[test]
    fn test_never_policy_ignores_age() {
        let last_active = (Utc::now() - chrono::Duration::days(30))
            .to_rfc3339_opts(SecondsFormat::Millis, true);
        let session = offline_session(
            vec![
                (AUTHENTICATION_KEY, credential_json()),
                (LAST_ACTIVE_KEY, last_active),
            ],
            ExpiryPolicy::Never,
        );

        assert!(session.obtain_credential().is_ok());
        assert_eq!(session.expires_at().unwrap(), None);
    }

    #[test]
    fn test_missing_last_active_counts_as_expired() {
        let session = offline_session(
            vec![(AUTHENTICATION_KEY, credential_json())],
            ExpiryPolicy::AfterMinutes(60),
        );
        assert!(session.is_expired(Utc::now()).unwrap());
    }

    #[test]
    fn test_invalidate_token_keeps_credential() {
        let session = offline_session(
            vec![
                (AUTHENTICATION_KEY, credential_json()),
                (IDENTITY_KEY, r#"{"id":"a","token":"t"}"#.to_string()),
            ],
            ExpiryPolicy::Never,
        );

        session.invalidate_token().unwrap();
        assert!(session.cached_token().unwrap().is_none());
        assert_eq!(
            session.current_address().unwrap().as_deref(),
            Some("calm-teal-otter-123@example.com")
        );
    }

    #[test]
    fn test_reset_without_credential_clears_token() {
        let session = offline_session(
            vec![(IDENTITY_KEY, r#"{"id":"a","token":"t"}"#.to_string())],
            ExpiryPolicy::Never,
        );

        session.reset_session().unwrap();
        assert!(session.cached_token().unwrap().is_none());
    }

    #[test]
    fn test_expires_at_from_last_active() {
        let created = Utc::now() - chrono::Duration::minutes(10);
        let session = offline_session(
            vec![(
                LAST_ACTIVE_KEY,
                created.to_rfc3339_opts(SecondsFormat::Millis, true),
            )],
            ExpiryPolicy::AfterMinutes(60),
        );

        let expires_at = session.expires_at().unwrap().unwrap();
        let expected = created + chrono::Duration::minutes(60);
        assert!((expires_at - expected).num_milliseconds().abs() <= 1);
    }
}
