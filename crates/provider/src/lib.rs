//! VCS provider implementations and the provider registry.
//!
//! Each host implements [`VcsProvider`]. GitHub is complete; GitLab, Bitbucket,
//! and Azure DevOps are stubs that wrap credentials and report unsupported
//! operations. [`MockProvider`] serves canned data for tests.

pub mod azure_devops;
pub mod bitbucket;
pub mod ci;
pub mod client;
pub mod github;
pub mod gitlab;
pub mod http_util;
pub mod mock;
pub mod registry;
pub mod traits;
pub mod webhook;

pub use azure_devops::AzureDevOpsProvider;
pub use bitbucket::BitbucketProvider;
pub use client::{AuthenticatedClient, BearerClient, GitHubClient, MockClient};
pub use github::GitHubProvider;
pub use gitlab::GitLabProvider;
pub use http_util::ProviderHttp;
pub use mock::{MockCall, MockOperation, MockProvider};
pub use registry::ProviderRegistry;
pub use traits::{VcsProvider, WebhookHeaders};

use std::sync::Arc;
use vcsgate_config::Config;
use vcsgate_types::ProviderId;

/// Create the built-in provider for `id` from its configuration.
#[must_use]
pub fn make_provider(id: ProviderId, config: &Config, http: &rquest::Client) -> Arc<dyn VcsProvider> {
    let pc = config.provider(id);
    let api_base = pc.api_base.as_deref();
    match id {
        ProviderId::GitHub => Arc::new(GitHubProvider::from_config(&pc, http.clone())),
        ProviderId::GitLab => Arc::new(GitLabProvider::new(api_base)),
        ProviderId::Bitbucket => Arc::new(BitbucketProvider::new(api_base)),
        ProviderId::AzureDevOps => Arc::new(AzureDevOpsProvider::new(api_base)),
    }
}

/// Registry of every enabled built-in provider.
///
/// The configured default provider becomes the registry default when it is
/// enabled; otherwise the first registered one is.
#[must_use]
pub fn builtin_registry(config: &Config, http: &rquest::Client) -> ProviderRegistry {
    let mut registry = ProviderRegistry::new();
    for id in ProviderId::all() {
        if config.provider(*id).enabled {
            registry.register(make_provider(*id, config, http));
        } else {
            tracing::info!(provider = %id, "provider disabled by configuration");
        }
    }
    if registry.set_default(config.default_provider).is_err() {
        tracing::warn!(
            provider = %config.default_provider,
            "configured default provider is not enabled"
        );
    }
    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_registry_all_enabled() {
        let r = builtin_registry(&Config::default(), &rquest::Client::new());
        assert_eq!(r.len(), ProviderId::all().len());
        assert_eq!(r.default_id(), Some(ProviderId::GitHub));
        assert_eq!(r.get(ProviderId::GitLab).unwrap().name(), "GitLab");
    }

    #[test]
    fn test_builtin_registry_respects_config() {
        let config = Config::from_yaml(
            "default_provider: gitlab\nproviders:\n  bitbucket:\n    enabled: false\n",
        )
        .unwrap();
        let r = builtin_registry(&config, &rquest::Client::new());
        assert!(!r.has(ProviderId::Bitbucket));
        assert_eq!(r.default_id(), Some(ProviderId::GitLab));
    }

    #[test]
    fn test_disabled_default_falls_back_to_first() {
        let config =
            Config::from_yaml("default_provider: github\nproviders:\n  github:\n    enabled: false\n")
                .unwrap();
        let r = builtin_registry(&config, &rquest::Client::new());
        assert!(!r.has(ProviderId::GitHub));
        assert_eq!(r.default_id(), Some(ProviderId::GitLab));
    }

    #[test]
    fn test_github_api_base_from_config() {
        let config = Config::from_yaml(
            "providers:\n  github:\n    api_base: https://ghe.example.com/api/v3\n",
        )
        .unwrap();
        let p = make_provider(ProviderId::GitHub, &config, &rquest::Client::new());
        let client = p.client(&vcsgate_types::TokenData::new("t"));
        assert_eq!(
            client.as_github().unwrap().api_base(),
            "https://ghe.example.com/api/v3"
        );
    }
}
