//! mail.tm API integration
//!
//! This module provides:
//! - HTTP client for the mail.tm REST endpoints
//! - Random address and password generation for new accounts
//! - Wire types for the Hydra (JSON-LD) collection envelope

mod client;
mod names;

pub use client::{Download, MailTmClient};
pub use names::{generate_credential, generate_local_part, generate_password};

/// mail.tm API response types
pub mod api {
    use serde::Deserialize;

    /// Hydra collection envelope used by every list endpoint
    #[derive(Debug, Deserialize)]
    pub struct HydraCollection<T> {
        #[serde(rename = "hydra:member", default = "Vec::new")]
        pub member: Vec<T>,
        #[serde(rename = "hydra:totalItems", default)]
        pub total_items: usize,
    }

    /// A domain addresses can be registered under
    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Domain {
        pub id: String,
        pub domain: String,
        #[serde(default = "default_true")]
        pub is_active: bool,
    }

    /// Account record returned after registration
    #[derive(Debug, Clone, Deserialize)]
    pub struct Account {
        pub id: String,
        pub address: String,
    }

    fn default_true() -> bool {
        true
    }
}
