//! Operation facade.
//!
//! Every call resolves credentials through the [`TokenManager`], wraps them in
//! the provider's [`AuthenticatedClient`], and delegates to the provider
//! registered for the requested (or default) [`ProviderId`].
//!
//! When no valid credentials exist the call fails with
//! [`VcsError::ReauthRequired`]; the provider's own `authenticate` entry point
//! is never used as a silent fallback.

mod branches;
mod files;
mod issues;
mod pull_requests;
mod repos;
mod webhooks;

pub use branches::Branches;
pub use files::Files;
pub use issues::Issues;
pub use pull_requests::PullRequests;
pub use repos::Repos;
pub use webhooks::Webhooks;

use std::sync::Arc;
use vcsgate_auth::TokenManager;
use vcsgate_provider::{AuthenticatedClient, ProviderRegistry, VcsProvider};
use vcsgate_types::{ProviderId, Result, TokenSource, VcsError};

/// Entry point for all provider operations.
#[derive(Clone, Debug)]
pub struct VcsOperations {
    manager: Arc<TokenManager>,
    registry: Arc<ProviderRegistry>,
}

impl VcsOperations {
    #[must_use]
    pub fn new(manager: Arc<TokenManager>, registry: Arc<ProviderRegistry>) -> Self {
        Self { manager, registry }
    }

    #[must_use]
    pub fn manager(&self) -> &Arc<TokenManager> {
        &self.manager
    }

    #[must_use]
    pub fn registry(&self) -> &Arc<ProviderRegistry> {
        &self.registry
    }

    #[must_use]
    pub fn issues(&self) -> Issues<'_> {
        Issues::new(self)
    }

    #[must_use]
    pub fn pull_requests(&self) -> PullRequests<'_> {
        PullRequests::new(self)
    }

    #[must_use]
    pub fn repos(&self) -> Repos<'_> {
        Repos::new(self)
    }

    #[must_use]
    pub fn branches(&self) -> Branches<'_> {
        Branches::new(self)
    }

    #[must_use]
    pub fn files(&self) -> Files<'_> {
        Files::new(self)
    }

    #[must_use]
    pub fn webhooks(&self) -> Webhooks<'_> {
        Webhooks::new(self)
    }

    /// Provider used when a call names none: the configured default if it is
    /// registered, otherwise the registry's default.
    #[must_use]
    pub fn default_provider(&self) -> ProviderId {
        let configured = self.manager.default_provider();
        if self.registry.has(configured) {
            return configured;
        }
        match self.registry.default_id() {
            Some(fallback) => {
                tracing::debug!(%configured, %fallback, "configured default is not registered");
                fallback
            }
            None => configured,
        }
    }

    fn provider_id(&self, provider: Option<ProviderId>) -> ProviderId {
        provider.unwrap_or_else(|| self.default_provider())
    }

    /// Look up the provider without touching credentials.
    fn provider(&self, provider: Option<ProviderId>) -> Result<Arc<dyn VcsProvider>> {
        self.registry.require(self.provider_id(provider))
    }

    /// Resolve the provider and a client holding valid credentials.
    async fn resolve(
        &self,
        source: &TokenSource,
        provider: Option<ProviderId>,
        operation: &'static str,
    ) -> Result<(Arc<dyn VcsProvider>, AuthenticatedClient)> {
        let id = self.provider_id(provider);
        let backend = self.registry.require(id)?;
        let Some(tokens) = self.manager.get_valid_token(source, id).await else {
            tracing::info!(%source, provider = %id, operation, "no valid credentials");
            return Err(VcsError::ReauthRequired {
                token_source: source.clone(),
                provider: id,
            });
        };
        tracing::debug!(%source, provider = %id, operation, "dispatching");
        let client = backend.client(&tokens);
        Ok((backend, client))
    }
}
