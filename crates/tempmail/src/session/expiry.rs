//! Identity expiry policy
//!
//! Pure functions that can be tested without a remote service.

use chrono::{DateTime, Duration, Utc};

/// How long a generated address stays in force
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExpiryPolicy {
    /// The address is kept until the user asks for a new one
    #[default]
    Never,
    /// The address is rotated once this many minutes have elapsed
    AfterMinutes(u32),
}

impl ExpiryPolicy {
    /// Parse the user-facing expiry option (minutes).
    ///
    /// Leading whitespace is skipped and the leading run of digits is used,
    /// so `"30"`, `" 30 "` and `"30min"` all mean 30 minutes. Absent,
    /// non-numeric, zero and negative values mean `Never`.
    pub fn parse(raw: Option<&str>) -> Self {
        let Some(raw) = raw else {
            return ExpiryPolicy::Never;
        };

        let trimmed = raw.trim_start();
        let unsigned = trimmed.strip_prefix('+').unwrap_or(trimmed);
        let digits: String = unsigned.chars().take_while(|c| c.is_ascii_digit()).collect();

        match digits.parse::<u32>() {
            Ok(minutes) if minutes > 0 => ExpiryPolicy::AfterMinutes(minutes),
            _ => ExpiryPolicy::Never,
        }
    }

    /// Configured lifetime, `None` when the address never expires
    pub fn lifetime(&self) -> Option<Duration> {
        match self {
            ExpiryPolicy::Never => None,
            ExpiryPolicy::AfterMinutes(minutes) => Some(Duration::minutes(i64::from(*minutes))),
        }
    }

    /// Whether an identity created at `last_active` has outlived the policy at `now`.
    ///
    /// The bound itself is still valid; only strictly longer lifetimes expire.
    pub fn is_expired(&self, last_active: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        match self.lifetime() {
            Some(lifetime) => now - last_active > lifetime,
            None => false,
        }
    }

    /// When an identity created at `last_active` will expire
    pub fn expires_at(&self, last_active: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.lifetime().map(|lifetime| last_active + lifetime)
    }
}
