//! Azure DevOps provider stub.

use crate::{
    client::{AuthenticatedClient, BearerClient},
    traits::VcsProvider,
};
use async_trait::async_trait;
use vcsgate_types::{ProviderId, TokenData};

pub const DEFAULT_API_BASE: &str = "https://dev.azure.com";

pub struct AzureDevOpsProvider {
    api_base: String,
}

impl AzureDevOpsProvider {
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

impl Default for AzureDevOpsProvider {
    fn default() -> Self {
        Self::new(None)
    }
}

#[async_trait]
impl VcsProvider for AzureDevOpsProvider {
    fn id(&self) -> ProviderId {
        ProviderId::AzureDevOps
    }

    fn name(&self) -> &'static str {
        "Azure DevOps"
    }

    fn client(&self, tokens: &TokenData) -> AuthenticatedClient {
        AuthenticatedClient::AzureDevOps(BearerClient::new(tokens.access_token.clone()))
    }
}
