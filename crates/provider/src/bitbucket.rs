//! Bitbucket Cloud provider stub.

use crate::{
    client::{AuthenticatedClient, BearerClient},
    traits::VcsProvider,
};
use async_trait::async_trait;
use vcsgate_types::{ProviderId, TokenData};

pub const DEFAULT_API_BASE: &str = "https://api.bitbucket.org/2.0";

pub struct BitbucketProvider {
    api_base: String,
}

impl BitbucketProvider {
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

impl Default for BitbucketProvider {
    fn default() -> Self {
        Self::new(None)
    }
}

#[async_trait]
impl VcsProvider for BitbucketProvider {
    fn id(&self) -> ProviderId {
        ProviderId::Bitbucket
    }

    fn name(&self) -> &'static str {
        "Bitbucket"
    }

    fn client(&self, tokens: &TokenData) -> AuthenticatedClient {
        AuthenticatedClient::Bitbucket(BearerClient::new(tokens.access_token.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vcsgate_types::{RepoRef, VcsError};

    #[tokio::test]
    async fn test_ci_status_unsupported() {
        let p = BitbucketProvider::default();
        let client = p.client(&TokenData::new("t"));
        let err = p
            .get_ci_status(&client, &RepoRef::new("ws", "repo"), 1)
            .await
            .unwrap_err();
        assert!(matches!(err, VcsError::Unsupported { .. }));
    }

    #[test]
    fn test_custom_api_base() {
        let p = BitbucketProvider::new(Some("https://bitbucket.internal/rest/api/1.0"));
        assert_eq!(p.api_base(), "https://bitbucket.internal/rest/api/1.0");
    }
}
