//! Credential data and expiry logic.

use crate::ProviderId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Current wall-clock time as Unix epoch milliseconds.
#[must_use]
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_millis()
        .try_into()
        .unwrap_or(u64::MAX)
}

/// Opaque identifier of whoever owns a set of credentials (user, team, project).
///
/// Only used as a cache and storage key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenSource(String);

impl TokenSource {
    pub fn new(source: impl Into<String>) -> Self {
        Self(source.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TokenSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TokenSource {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for TokenSource {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Composite key for everything cached per credential owner and host.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TokenKey {
    pub source: TokenSource,
    pub provider: ProviderId,
}

impl TokenKey {
    #[must_use]
    pub fn new(source: TokenSource, provider: ProviderId) -> Self {
        Self { source, provider }
    }
}

impl fmt::Display for TokenKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.source, self.provider)
    }
}

/// An access token with optional refresh capability and expiry.
///
/// `expires_at` is Unix epoch milliseconds. An absent expiry never triggers a
/// refresh; an absent (or empty) refresh token makes refresh impossible.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenData {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

impl TokenData {
    /// Create a non-expiring token without refresh capability.
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: None,
            expires_at: None,
            scope: None,
        }
    }

    /// Set the expiry to `expires_in` from now.
    #[must_use]
    pub fn with_expiry(mut self, expires_in: Duration) -> Self {
        let ms: u64 = expires_in.as_millis().try_into().unwrap_or(u64::MAX);
        self.expires_at = Some(now_millis().saturating_add(ms));
        self
    }

    /// Set an absolute expiry in epoch milliseconds.
    #[must_use]
    pub fn with_expires_at(mut self, expires_at: u64) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    /// Attach a refresh token.
    #[must_use]
    pub fn with_refresh(mut self, refresh_token: impl Into<String>) -> Self {
        self.refresh_token = Some(refresh_token.into());
        self
    }

    #[must_use]
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    /// The record written in place of deleting credentials: empty secrets that
    /// expire at `now`, so every later lookup takes the failed-refresh path.
    #[must_use]
    pub fn invalidated(now: u64) -> Self {
        Self {
            access_token: String::new(),
            refresh_token: Some(String::new()),
            expires_at: Some(now),
            scope: None,
        }
    }

    /// The refresh token, if one is present and non-empty.
    #[must_use]
    pub fn usable_refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref().filter(|t| !t.is_empty())
    }

    /// `true` when the token expires within `buffer` of `now` (both inclusive).
    #[must_use]
    pub fn needs_refresh_at(&self, now: u64, buffer: Duration) -> bool {
        let Some(expires_at) = self.expires_at else {
            return false;
        };
        let buffer_ms: u64 = buffer.as_millis().try_into().unwrap_or(u64::MAX);
        now.saturating_add(buffer_ms) >= expires_at
    }

    #[must_use]
    pub fn needs_refresh(&self, buffer: Duration) -> bool {
        self.needs_refresh_at(now_millis(), buffer)
    }

    /// Strict validity without any buffer: both secrets present and not yet expired.
    #[must_use]
    pub fn is_valid_at(&self, now: u64) -> bool {
        !self.access_token.is_empty()
            && self.usable_refresh_token().is_some()
            && self.expires_at.is_none_or(|exp| exp > now)
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.is_valid_at(now_millis())
    }
}
