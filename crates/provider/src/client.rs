//! Per-operation authenticated handles.
//!
//! An [`AuthenticatedClient`] is built from resolved credentials right before
//! a provider call and dropped afterwards. Each provider accepts only its own
//! variant and rejects the rest with [`VcsError::ClientMismatch`].

use crate::http_util::ProviderHttp;
use std::fmt;
use vcsgate_types::{ProviderId, Result, VcsError};

/// GitHub REST client bound to one access token.
#[derive(Clone)]
pub struct GitHubClient {
    pub(crate) http: ProviderHttp,
    pub(crate) api_base: String,
    pub(crate) token: String,
}

impl GitHubClient {
    pub fn new(http: ProviderHttp, api_base: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            http,
            api_base: api_base.into(),
            token: token.into(),
        }
    }

    #[must_use]
    pub fn api_base(&self) -> &str {
        &self.api_base
    }
}

impl fmt::Debug for GitHubClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GitHubClient")
            .field("api_base", &self.api_base)
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Bearer-token handle used by hosts without a full client.
#[derive(Clone)]
pub struct BearerClient {
    pub(crate) token: String,
}

impl BearerClient {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl fmt::Debug for BearerClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BearerClient")
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Handle accepted by the mock provider. Records the token it was built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockClient {
    pub token: String,
}

#[derive(Debug, Clone)]
pub enum AuthenticatedClient {
    GitHub(GitHubClient),
    GitLab(BearerClient),
    Bitbucket(BearerClient),
    AzureDevOps(BearerClient),
    Mock {
        provider: ProviderId,
        client: MockClient,
    },
}

impl AuthenticatedClient {
    /// The provider this handle was built for.
    #[must_use]
    pub fn provider_id(&self) -> ProviderId {
        match self {
            Self::GitHub(_) => ProviderId::GitHub,
            Self::GitLab(_) => ProviderId::GitLab,
            Self::Bitbucket(_) => ProviderId::Bitbucket,
            Self::AzureDevOps(_) => ProviderId::AzureDevOps,
            Self::Mock { provider, .. } => *provider,
        }
    }

    /// Borrow the GitHub client.
    ///
    /// # Errors
    ///
    /// Returns [`VcsError::ClientMismatch`] for any other variant.
    pub fn as_github(&self) -> Result<&GitHubClient> {
        match self {
            Self::GitHub(c) => Ok(c),
            other => Err(mismatch(ProviderId::GitHub, other)),
        }
    }

    /// Borrow the bearer handle for one of the stub hosts.
    ///
    /// # Errors
    ///
    /// Returns [`VcsError::ClientMismatch`] if the variant is not `expected`'s.
    pub fn as_bearer(&self, expected: ProviderId) -> Result<&BearerClient> {
        match (expected, self) {
            (ProviderId::GitLab, Self::GitLab(c))
            | (ProviderId::Bitbucket, Self::Bitbucket(c))
            | (ProviderId::AzureDevOps, Self::AzureDevOps(c)) => Ok(c),
            (_, other) => Err(mismatch(expected, other)),
        }
    }

    /// Borrow the mock handle if it was built for `expected`.
    ///
    /// # Errors
    ///
    /// Returns [`VcsError::ClientMismatch`] otherwise.
    pub fn as_mock(&self, expected: ProviderId) -> Result<&MockClient> {
        match self {
            Self::Mock { provider, client } if *provider == expected => Ok(client),
            other => Err(mismatch(expected, other)),
        }
    }
}

fn mismatch(expected: ProviderId, actual: &AuthenticatedClient) -> VcsError {
    VcsError::ClientMismatch {
        expected,
        actual: actual.provider_id(),
    }
}
