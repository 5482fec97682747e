//! Per-provider refresher dispatch.

use crate::{env::EnvSource, github::GitHubTokenRefresher};
use async_trait::async_trait;
use std::{collections::HashMap, sync::Arc};
use vcsgate_config::Config;
use vcsgate_types::{ProviderId, Result, TokenData, TokenRefresher, VcsError};

/// Routes each refresh to the refresher registered for its provider.
///
/// Providers without one fail with a re-authentication message, which the
/// token manager turns into `None`.
#[derive(Default, Clone)]
pub struct RefresherSet {
    refreshers: HashMap<ProviderId, Arc<dyn TokenRefresher>>,
}

impl RefresherSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, provider: ProviderId, refresher: Arc<dyn TokenRefresher>) -> Self {
        self.refreshers.insert(provider, refresher);
        self
    }

    #[must_use]
    pub fn supports(&self, provider: ProviderId) -> bool {
        self.refreshers.contains_key(&provider)
    }

    /// Build the set from configuration.
    ///
    /// GitHub gets a refresher when both its client id and secret variables
    /// resolve; everything else stays unmapped.
    #[must_use]
    pub fn from_config(config: &Config, http: &rquest::Client, env: &EnvSource) -> Self {
        let mut set = Self::new();
        let gh = config.provider(ProviderId::GitHub);
        let id = gh.client_id_env.as_deref().and_then(|n| env.get(n));
        let secret = gh.client_secret_env.as_deref().and_then(|n| env.get(n));
        match (id, secret) {
            (Some(id), Some(secret)) => {
                let mut refresher = GitHubTokenRefresher::new(http.clone(), id, secret);
                if let Some(base) = gh.api_base.as_deref().and_then(enterprise_token_url) {
                    refresher = refresher.with_token_url(base);
                }
                set = set.with(ProviderId::GitHub, Arc::new(refresher));
            }
            _ => tracing::debug!("GitHub OAuth client not configured; refresh disabled"),
        }
        set
    }
}

/// `https://ghe.example.com/api/v3` -> `https://ghe.example.com/login/oauth/access_token`.
fn enterprise_token_url(api_base: &str) -> Option<String> {
    let host = api_base.trim_end_matches('/').strip_suffix("/api/v3")?;
    Some(format!("{host}/login/oauth/access_token"))
}

#[async_trait]
impl TokenRefresher for RefresherSet {
    async fn refresh(&self, refresh_token: &str, provider: ProviderId) -> Result<TokenData> {
        match self.refreshers.get(&provider) {
            Some(r) => r.refresh(refresh_token, provider).await,
            None => Err(VcsError::Auth(format!(
                "token refresh not supported for {provider}; please re-authenticate"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(&'static str);

    #[async_trait]
    impl TokenRefresher for Fixed {
        async fn refresh(&self, _refresh_token: &str, _provider: ProviderId) -> Result<TokenData> {
            Ok(TokenData::new(self.0))
        }
    }

    #[tokio::test]
    async fn test_dispatch_by_provider() {
        let set = RefresherSet::new().with(ProviderId::GitLab, Arc::new(Fixed("gl")));
        let tok = set.refresh("r", ProviderId::GitLab).await.unwrap();
        assert_eq!(tok.access_token, "gl");
    }

    #[tokio::test]
    async fn test_unmapped_provider_asks_for_reauth() {
        let set = RefresherSet::new();
        let err = set.refresh("r", ProviderId::Bitbucket).await.unwrap_err();
        assert!(err.to_string().contains("please re-authenticate"));
    }

    #[test]
    fn test_from_config_requires_both_secrets() {
        let config = Config::from_yaml(
            "providers:\n  github:\n    client_id_env: GH_ID\n    client_secret_env: GH_SECRET\n",
        )
        .unwrap();
        let http = rquest::Client::new();

        let only_id: EnvSource = [("GH_ID", "abc")].into_iter().collect();
        assert!(!RefresherSet::from_config(&config, &http, &only_id).supports(ProviderId::GitHub));

        let both: EnvSource = [("GH_ID", "abc"), ("GH_SECRET", "xyz")].into_iter().collect();
        assert!(RefresherSet::from_config(&config, &http, &both).supports(ProviderId::GitHub));
    }

    #[test]
    fn test_enterprise_token_url() {
        assert_eq!(
            enterprise_token_url("https://ghe.example.com/api/v3/").as_deref(),
            Some("https://ghe.example.com/login/oauth/access_token")
        );
        assert!(enterprise_token_url("https://api.github.com").is_none());
    }
}
