//! Unified error type for the vcsgate workspace.

use crate::{ProviderId, TokenSource};
use thiserror::Error;

/// Enumerates all error kinds that can occur across vcsgate crates.
#[derive(Debug, Error)]
pub enum VcsError {
    /// The credential manager was used before it was initialized.
    #[error("token manager not initialized")]
    NotInitialized,

    /// The credential manager was initialized a second time.
    #[error("token manager already initialized")]
    AlreadyInitialized,

    /// No provider implementation is registered for the identifier.
    #[error("provider not registered: {0}")]
    ProviderNotFound(ProviderId),

    /// A provider name that does not map to any [`ProviderId`].
    #[error("unknown provider: {0}")]
    UnknownProvider(String),

    /// One or more required environment variables are unset.
    #[error("missing required environment variables: {}", .0.join(", "))]
    MissingEnvVars(Vec<String>),

    /// No valid credentials exist for the pair; the owner must authorize again.
    #[error("re-authentication required for {token_source} on {provider}")]
    ReauthRequired {
        token_source: TokenSource,
        provider: ProviderId,
    },

    /// OAuth or credential failure (including refresh failures).
    #[error("authentication error: {0}")]
    Auth(String),

    /// HTTP transport error.
    #[error("http error: {0}")]
    Http(String),

    /// The upstream host returned a non-success status.
    #[error("upstream error: status={status}, body={body}")]
    Upstream { status: u16, body: String },

    /// JSON serialization or deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Token storage failure.
    #[error("storage error: {0}")]
    Storage(String),

    /// Configuration loading or validation error.
    #[error("configuration error: {0}")]
    Config(String),

    /// The provider does not implement the operation.
    #[error("{operation} is not supported by provider {provider}")]
    Unsupported {
        provider: ProviderId,
        operation: &'static str,
    },

    /// A client built for one provider was handed to another.
    #[error("client for {actual} cannot be used with provider {expected}")]
    ClientMismatch {
        expected: ProviderId,
        actual: ProviderId,
    },

    /// The requested object does not exist upstream.
    #[error("not found: {0}")]
    NotFound(String),

    /// A webhook payload could not be interpreted.
    #[error("webhook error: {0}")]
    Webhook(String),

    /// An error reported by a provider implementation itself.
    #[error("{provider} provider error: {message}")]
    Provider {
        provider: ProviderId,
        message: String,
    },
}

// ── Feature-gated From impls ──────────────────────────────────────────────────

#[cfg(feature = "rquest")]
impl From<rquest::Error> for VcsError {
    fn from(e: rquest::Error) -> Self {
        Self::Http(e.to_string())
    }
}

impl VcsError {
    /// Returns `true` if the error is likely transient and worth retrying.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Upstream { status, .. } => matches!(status, 408 | 429 | 500 | 502 | 503 | 504),
            Self::Http(_) => true,
            _ => false,
        }
    }

    /// Returns `true` if the caller should send the credential owner back
    /// through authorization.
    #[must_use]
    pub fn requires_reauth(&self) -> bool {
        match self {
            Self::ReauthRequired { .. } => true,
            Self::Upstream { status, .. } => *status == 401,
            _ => false,
        }
    }
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, VcsError>;
