//! Settings loading for the mailbox client
//!
//! Settings are loaded from (in order of priority):
//! 1. Environment variables (`TEMPMAIL_*`)
//! 2. JSON file (~/.config/tempmail/settings.json)
//! 3. Built-in defaults

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::mailtm::MailTmClient;
use crate::session::ExpiryPolicy;

/// Settings filename in the tempmail config directory
const SETTINGS_FILE: &str = "settings.json";

const ENV_EXPIRY_TIME: &str = "TEMPMAIL_EXPIRY_TIME";
const ENV_API_BASE_URL: &str = "TEMPMAIL_API_BASE_URL";
const ENV_SUPPORT_DIR: &str = "TEMPMAIL_SUPPORT_DIR";
const ENV_TIMEOUT_SECS: &str = "TEMPMAIL_TIMEOUT_SECS";

/// User-facing configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Minutes an address stays in force; kept raw and parsed leniently
    pub expiry_time: Option<String>,
    pub api_base_url: String,
    /// Where downloads are cached; defaults to the platform data directory
    pub support_dir: Option<PathBuf>,
    pub timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            expiry_time: None,
            api_base_url: MailTmClient::DEFAULT_BASE_URL.to_string(),
            support_dir: None,
            timeout_secs: 30,
        }
    }
}

impl Settings {
    /// Load settings from the config file (if any), then apply environment
    /// overrides.
    pub fn load() -> Result<Self> {
        let settings = if config::config_exists(SETTINGS_FILE) {
            config::load_json(SETTINGS_FILE)?
        } else {
            Self::default()
        };

        Ok(settings.with_overrides(|key| std::env::var(key).ok()))
    }

    /// Load settings from a specific JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        config::load_json_file(path)
    }

    /// Parse settings from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse settings JSON")
    }

    /// Persist settings to ~/.config/tempmail/settings.json
    pub fn save(&self) -> Result<()> {
        config::save_json(SETTINGS_FILE, self)
    }

    /// Apply overrides from `lookup` (normally the process environment)
    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(expiry) = lookup(ENV_EXPIRY_TIME) {
            self.expiry_time = Some(expiry);
        }
        if let Some(url) = lookup(ENV_API_BASE_URL).filter(|u| !u.trim().is_empty()) {
            self.api_base_url = url;
        }
        if let Some(dir) = lookup(ENV_SUPPORT_DIR).filter(|d| !d.trim().is_empty()) {
            self.support_dir = Some(PathBuf::from(dir));
        }
        if let Some(secs) = lookup(ENV_TIMEOUT_SECS).and_then(|s| s.trim().parse().ok()) {
            self.timeout_secs = secs;
        }
        self
    }

    pub fn expiry(&self) -> ExpiryPolicy {
        ExpiryPolicy::parse(self.expiry_time.as_deref())
    }

    /// Network timeout; zero falls back to the default
    pub fn timeout(&self) -> Duration {
        match self.timeout_secs {
            0 => Duration::from_secs(Self::default().timeout_secs),
            secs => Duration::from_secs(secs),
        }
    }

    /// Directory holding the download cache
    pub fn support_dir(&self) -> Result<PathBuf> {
        match &self.support_dir {
            Some(dir) => Ok(dir.clone()),
            None => config::data_dir().context("Could not determine data directory"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.api_base_url, "https://api.mail.tm");
        assert_eq!(settings.expiry(), ExpiryPolicy::Never);
        assert_eq!(settings.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_parse_partial_json() {
        let settings = Settings::from_json(r#"{ "expiry_time": "60" }"#).unwrap();
        assert_eq!(settings.expiry(), ExpiryPolicy::AfterMinutes(60));
        assert_eq!(settings.api_base_url, "https://api.mail.tm");
        assert!(settings.support_dir.is_none());
    }

    #[test]
    fn test_invalid_json() {
        assert!(Settings::from_json(r#"{ "timeout_secs": "soon" }"#).is_err());
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            (ENV_EXPIRY_TIME, "15"),
            (ENV_API_BASE_URL, "http://localhost:4000"),
            (ENV_SUPPORT_DIR, "/tmp/tempmail-support"),
            (ENV_TIMEOUT_SECS, "not-a-number"),
        ]);

        let settings =
            Settings::default().with_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(settings.expiry(), ExpiryPolicy::AfterMinutes(15));
        assert_eq!(settings.api_base_url, "http://localhost:4000");
        assert_eq!(
            settings.support_dir().unwrap(),
            PathBuf::from("/tmp/tempmail-support")
        );
        // Unparseable values keep the previous setting
        assert_eq!(settings.timeout_secs, 30);
    }

    #[test]
    fn test_zero_timeout_uses_default() {
        let settings = Settings {
            timeout_secs: 0,
            ..Settings::default()
        };
        assert_eq!(settings.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{ "expiry_time": "abc", "timeout_secs": 5 }"#).unwrap();

        let settings = Settings::from_file(&path).unwrap();
        assert_eq!(settings.expiry(), ExpiryPolicy::Never);
        assert_eq!(settings.timeout(), Duration::from_secs(5));
    }
}
