//! GitHub OAuth refresh-token exchange.
//!
//! GitHub Apps with expiring user tokens hand out a refresh token; exchanging
//! it at the OAuth endpoint returns a new access/refresh pair.

use async_trait::async_trait;
use vcsgate_types::{ProviderId, Result, TokenData, TokenRefresher, VcsError, now_millis};

/// GitHub OAuth token endpoint.
pub const TOKEN_URL: &str = "https://github.com/login/oauth/access_token";

/// Form parameters for a `refresh_token` grant.
#[must_use]
pub fn build_refresh_params<'a>(
    client_id: &'a str,
    client_secret: &'a str,
    refresh_token: &'a str,
) -> [(&'static str, &'a str); 4] {
    [
        ("client_id", client_id),
        ("client_secret", client_secret),
        ("grant_type", "refresh_token"),
        ("refresh_token", refresh_token),
    ]
}

/// Parse the token endpoint JSON response.
///
/// GitHub answers refresh failures with HTTP 200 and an `error` field, so that
/// is checked before anything else. `expires_in` is seconds relative to `now`
/// (epoch milliseconds).
///
/// # Errors
///
/// Returns [`VcsError::Auth`] for an `error` response or a missing `access_token`.
pub fn parse_token_response(json: &serde_json::Value, now: u64) -> Result<TokenData> {
    if let Some(error) = json.get("error").and_then(serde_json::Value::as_str) {
        let description = json
            .get("error_description")
            .and_then(serde_json::Value::as_str)
            .unwrap_or(error);
        return Err(VcsError::Auth(format!("{error}: {description}")));
    }

    let access_token = json
        .get("access_token")
        .and_then(serde_json::Value::as_str)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| VcsError::Auth("missing access_token in response".into()))?;

    let mut token = TokenData::new(access_token);
    if let Some(refresh) = json
        .get("refresh_token")
        .and_then(serde_json::Value::as_str)
    {
        token = token.with_refresh(refresh);
    }
    if let Some(expires_in) = json.get("expires_in").and_then(serde_json::Value::as_u64) {
        token = token.with_expires_at(now.saturating_add(expires_in.saturating_mul(1000)));
    }
    if let Some(scope) = json
        .get("scope")
        .and_then(serde_json::Value::as_str)
        .filter(|s| !s.is_empty())
    {
        token = token.with_scope(scope);
    }
    Ok(token)
}

/// [`TokenRefresher`] that talks to GitHub's OAuth endpoint.
pub struct GitHubTokenRefresher {
    http: rquest::Client,
    client_id: String,
    client_secret: String,
    token_url: String,
}

impl GitHubTokenRefresher {
    pub fn new(
        http: rquest::Client,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            http,
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            token_url: TOKEN_URL.to_string(),
        }
    }

    /// Point at a different token endpoint (GitHub Enterprise).
    #[must_use]
    pub fn with_token_url(mut self, url: impl Into<String>) -> Self {
        self.token_url = url.into();
        self
    }
}

#[async_trait]
impl TokenRefresher for GitHubTokenRefresher {
    async fn refresh(&self, refresh_token: &str, provider: ProviderId) -> Result<TokenData> {
        if provider != ProviderId::GitHub {
            return Err(VcsError::Auth(format!(
                "GitHub refresher cannot refresh {provider} tokens"
            )));
        }

        let params = build_refresh_params(&self.client_id, &self.client_secret, refresh_token);
        let resp = self
            .http
            .post(&self.token_url)
            .header("Accept", "application/json")
            .form(&params)
            .send()
            .await
            .map_err(|e| VcsError::Http(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(VcsError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let json: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| VcsError::Auth(format!("failed to parse token response: {e}")))?;

        parse_token_response(&json, now_millis())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_build_refresh_params() {
        let params = build_refresh_params("cid", "secret", "r1");
        assert!(params.contains(&("grant_type", "refresh_token")));
        assert!(params.contains(&("refresh_token", "r1")));
        assert!(params.contains(&("client_id", "cid")));
        assert!(params.contains(&("client_secret", "secret")));
    }

    #[test]
    fn test_parse_token_response_full() {
        let resp = json!({
            "access_token": "ghu_new",
            "refresh_token": "ghr_new",
            "expires_in": 28800,
            "refresh_token_expires_in": 15_897_600,
            "scope": "",
            "token_type": "bearer"
        });
        let tok = parse_token_response(&resp, 1_000).unwrap();
        assert_eq!(tok.access_token, "ghu_new");
        assert_eq!(tok.refresh_token.as_deref(), Some("ghr_new"));
        assert_eq!(tok.expires_at, Some(1_000 + 28_800_000));
        assert!(tok.scope.is_none());
    }

    #[test]
    fn test_parse_token_response_without_expiry() {
        let tok = parse_token_response(&json!({"access_token": "gho_x"}), 0).unwrap();
        assert!(tok.expires_at.is_none());
        assert!(tok.refresh_token.is_none());
    }

    #[test]
    fn test_parse_token_response_error_field() {
        let resp = json!({
            "error": "bad_refresh_token",
            "error_description": "The refresh token passed is incorrect or expired."
        });
        let err = parse_token_response(&resp, 0).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("bad_refresh_token"), "{msg}");
        assert!(msg.contains("incorrect or expired"), "{msg}");
    }

    #[test]
    fn test_parse_token_response_missing_access_token() {
        assert!(parse_token_response(&json!({"refresh_token": "r"}), 0).is_err());
        assert!(parse_token_response(&json!({"access_token": ""}), 0).is_err());
    }

    #[tokio::test]
    async fn test_rejects_other_providers() {
        let r = GitHubTokenRefresher::new(rquest::Client::new(), "id", "secret");
        let err = r.refresh("r1", ProviderId::GitLab).await.unwrap_err();
        assert!(matches!(err, VcsError::Auth(_)));
    }
}
