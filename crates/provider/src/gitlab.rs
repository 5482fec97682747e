//! GitLab provider stub.
//!
//! Only credential wrapping and webhook verification are implemented; every
//! network operation reports [`vcsgate_types::VcsError::Unsupported`].

use crate::{
    client::{AuthenticatedClient, BearerClient},
    traits::VcsProvider,
};
use async_trait::async_trait;
use subtle::ConstantTimeEq as _;
use vcsgate_types::{ProviderId, TokenData};

/// Public GitLab API base URL.
pub const DEFAULT_API_BASE: &str = "https://gitlab.com/api/v4";

pub struct GitLabProvider {
    api_base: String,
}

impl GitLabProvider {
    #[must_use]
    pub fn new(api_base: Option<&str>) -> Self {
        Self {
            api_base: api_base.unwrap_or(DEFAULT_API_BASE).to_string(),
        }
    }

    #[must_use]
    pub fn api_base(&self) -> &str {
        &self.api_base
    }
}

impl Default for GitLabProvider {
    fn default() -> Self {
        Self::new(None)
    }
}

#[async_trait]
impl VcsProvider for GitLabProvider {
    fn id(&self) -> ProviderId {
        ProviderId::GitLab
    }

    fn name(&self) -> &'static str {
        "GitLab"
    }

    fn client(&self, tokens: &TokenData) -> AuthenticatedClient {
        AuthenticatedClient::GitLab(BearerClient::new(tokens.access_token.clone()))
    }

    /// GitLab sends the shared secret itself in `X-Gitlab-Token`.
    fn verify_webhook_signature(&self, _payload: &[u8], signature: &str, secret: &str) -> bool {
        !secret.is_empty() && bool::from(signature.as_bytes().ct_eq(secret.as_bytes()))
    }
}
