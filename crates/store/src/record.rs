//! Stored credential row.

use serde::{Deserialize, Serialize};
use vcsgate_types::{ProviderId, TokenData, TokenSource, now_millis};

/// One persisted row per `(source, provider)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialRecord {
    pub source: TokenSource,
    pub provider: ProviderId,
    pub tokens: TokenData,
    /// Provider-specific linkage (e.g. a GitHub App installation id).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub installation_id: Option<String>,
    pub created_at: u64,
    pub updated_at: u64,
}

impl CredentialRecord {
    #[must_use]
    pub fn new(source: TokenSource, provider: ProviderId, tokens: TokenData) -> Self {
        let now = now_millis();
        Self {
            source,
            provider,
            tokens,
            installation_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Swap in new token material, keeping linkage and creation time.
    pub fn replace_tokens(&mut self, tokens: TokenData) {
        self.tokens = tokens;
        self.updated_at = now_millis();
    }
}
