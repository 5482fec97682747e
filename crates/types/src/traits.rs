//! Async traits injected into the credential manager.
//!
//! The manager never persists or mints credentials itself; the application
//! supplies both seams.

use crate::{ProviderId, TokenData, TokenSource, error::Result};
use async_trait::async_trait;

/// Persistent storage for credentials, keyed by `(source, provider)`.
///
/// Implementations own the record layout (encryption, linkage ids, audit
/// timestamps). `save` replaces only the token material of a record.
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Load the credentials for the pair, if any.
    async fn load(&self, source: &TokenSource, provider: ProviderId)
    -> Result<Option<TokenData>>;

    /// Persist credentials for the pair, overwriting previous token material.
    async fn save(&self, source: &TokenSource, provider: ProviderId, tokens: &TokenData)
    -> Result<()>;
}

/// Exchanges a refresh token for a fresh [`TokenData`].
///
/// Any error (including the implementation's own timeout) is treated by the
/// manager as a failed refresh.
#[async_trait]
pub trait TokenRefresher: Send + Sync {
    async fn refresh(&self, refresh_token: &str, provider: ProviderId) -> Result<TokenData>;
}
