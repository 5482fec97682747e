//! The capability interface every VCS host implements.

use crate::{client::AuthenticatedClient, webhook};
use async_trait::async_trait;
use std::collections::HashMap;
use vcsgate_types::{
    Branch, CiStatusSummary, Comment, ConnectionStatus, DirectoryEntry, FileCommit, FileContent,
    FileUpdate, Issue, NewPullRequest, ProviderId, PullRequest, RepoRef, Repository, Result,
    Review, StateFilter, TokenData, TokenSource, VcsError, WebhookEvent,
};

/// Raw webhook request headers. Lookups are case-insensitive.
pub type WebhookHeaders = HashMap<String, String>;

/// Case-insensitive header lookup.
#[must_use]
pub fn header<'a>(headers: &'a WebhookHeaders, name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

/// One VCS host behind a uniform interface.
///
/// Network operations default to [`VcsError::Unsupported`] so partial
/// implementations only override what they support.
#[async_trait]
#[allow(unused_variables)]
pub trait VcsProvider: Send + Sync {
    fn id(&self) -> ProviderId;

    /// Human-readable host name.
    fn name(&self) -> &'static str;

    /// Wrap resolved credentials in this provider's client.
    fn client(&self, tokens: &TokenData) -> AuthenticatedClient;

    /// The provider's own authentication entry point, used when no managed
    /// credentials are available.
    async fn authenticate(&self, source: &TokenSource) -> Result<AuthenticatedClient> {
        Err(VcsError::ReauthRequired {
            token_source: source.clone(),
            provider: self.id(),
        })
    }

    async fn check_connection(&self, client: &AuthenticatedClient) -> Result<ConnectionStatus> {
        Err(self.unsupported("check_connection"))
    }

    async fn list_repositories(&self, client: &AuthenticatedClient) -> Result<Vec<Repository>> {
        Err(self.unsupported("list_repositories"))
    }

    async fn get_repository(
        &self,
        client: &AuthenticatedClient,
        repo: &RepoRef,
    ) -> Result<Repository> {
        Err(self.unsupported("get_repository"))
    }

    /// File content at `git_ref` (default branch when `None`). A missing file is `Ok(None)`.
    async fn get_file_content(
        &self,
        client: &AuthenticatedClient,
        repo: &RepoRef,
        path: &str,
        git_ref: Option<&str>,
    ) -> Result<Option<FileContent>> {
        Err(self.unsupported("get_file_content"))
    }

    async fn get_directory(
        &self,
        client: &AuthenticatedClient,
        repo: &RepoRef,
        path: &str,
        git_ref: Option<&str>,
    ) -> Result<Vec<DirectoryEntry>> {
        Err(self.unsupported("get_directory"))
    }

    /// Create `name` pointing at the head of `from_ref`.
    async fn create_branch(
        &self,
        client: &AuthenticatedClient,
        repo: &RepoRef,
        name: &str,
        from_ref: &str,
    ) -> Result<Branch> {
        Err(self.unsupported("create_branch"))
    }

    /// Create or update a file, passing the current blob SHA when the file
    /// already exists on the branch.
    async fn update_file(
        &self,
        client: &AuthenticatedClient,
        repo: &RepoRef,
        update: &FileUpdate,
    ) -> Result<FileCommit> {
        Err(self.unsupported("update_file"))
    }

    async fn list_branches(
        &self,
        client: &AuthenticatedClient,
        repo: &RepoRef,
    ) -> Result<Vec<Branch>> {
        Err(self.unsupported("list_branches"))
    }

    async fn list_pull_requests(
        &self,
        client: &AuthenticatedClient,
        repo: &RepoRef,
        state: StateFilter,
    ) -> Result<Vec<PullRequest>> {
        Err(self.unsupported("list_pull_requests"))
    }

    async fn get_pull_request(
        &self,
        client: &AuthenticatedClient,
        repo: &RepoRef,
        number: u64,
    ) -> Result<PullRequest> {
        Err(self.unsupported("get_pull_request"))
    }

    async fn create_pull_request(
        &self,
        client: &AuthenticatedClient,
        repo: &RepoRef,
        pr: &NewPullRequest,
    ) -> Result<PullRequest> {
        Err(self.unsupported("create_pull_request"))
    }

    async fn list_pull_request_reviews(
        &self,
        client: &AuthenticatedClient,
        repo: &RepoRef,
        number: u64,
    ) -> Result<Vec<Review>> {
        Err(self.unsupported("list_pull_request_reviews"))
    }

    async fn list_pull_request_comments(
        &self,
        client: &AuthenticatedClient,
        repo: &RepoRef,
        number: u64,
    ) -> Result<Vec<Comment>> {
        Err(self.unsupported("list_pull_request_comments"))
    }

    async fn create_pull_request_comment(
        &self,
        client: &AuthenticatedClient,
        repo: &RepoRef,
        number: u64,
        body: &str,
    ) -> Result<Comment> {
        Err(self.unsupported("create_pull_request_comment"))
    }

    async fn update_pull_request_comment(
        &self,
        client: &AuthenticatedClient,
        repo: &RepoRef,
        comment_id: &str,
        body: &str,
    ) -> Result<Comment> {
        Err(self.unsupported("update_pull_request_comment"))
    }

    async fn delete_pull_request_comment(
        &self,
        client: &AuthenticatedClient,
        repo: &RepoRef,
        comment_id: &str,
    ) -> Result<()> {
        Err(self.unsupported("delete_pull_request_comment"))
    }

    /// Normalized CI status for the pull request's head commit.
    async fn get_ci_status(
        &self,
        client: &AuthenticatedClient,
        repo: &RepoRef,
        number: u64,
    ) -> Result<CiStatusSummary> {
        Err(self.unsupported("get_ci_status"))
    }

    async fn list_issues(
        &self,
        client: &AuthenticatedClient,
        repo: &RepoRef,
        state: StateFilter,
    ) -> Result<Vec<Issue>> {
        Err(self.unsupported("list_issues"))
    }

    /// Check a `sha256=<hex>` HMAC signature over the raw body.
    fn verify_webhook_signature(&self, payload: &[u8], signature: &str, secret: &str) -> bool {
        webhook::verify_signature(payload, signature, secret)
    }

    fn parse_webhook_event(&self, headers: &WebhookHeaders, payload: &[u8]) -> Result<WebhookEvent> {
        Err(self.unsupported("parse_webhook_event"))
    }

    /// Convenience for the default method bodies.
    fn unsupported(&self, operation: &'static str) -> VcsError {
        VcsError::Unsupported {
            provider: self.id(),
            operation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::BearerClient;

    struct Bare;

    #[async_trait]
    impl VcsProvider for Bare {
        fn id(&self) -> ProviderId {
            ProviderId::Bitbucket
        }

        fn name(&self) -> &'static str {
            "Bare"
        }

        fn client(&self, tokens: &TokenData) -> AuthenticatedClient {
            AuthenticatedClient::Bitbucket(BearerClient::new(tokens.access_token.clone()))
        }
    }

    #[tokio::test]
    async fn test_defaults_are_unsupported() {
        let p = Bare;
        let client = p.client(&TokenData::new("t"));
        let err = p.list_repositories(&client).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "list_repositories is not supported by provider bitbucket"
        );
    }

    #[tokio::test]
    async fn test_default_authenticate_requires_reauth() {
        let err = Bare.authenticate(&TokenSource::from("u")).await.unwrap_err();
        assert!(err.requires_reauth());
    }

    #[test]
    fn test_default_webhook_verification() {
        let sig = webhook::sign(b"{}", "s3cret");
        assert!(Bare.verify_webhook_signature(b"{}", &sig, "s3cret"));
        assert!(!Bare.verify_webhook_signature(b"{}", &sig, "other"));
    }

    #[test]
    fn test_header_lookup_ignores_case() {
        let headers: WebhookHeaders =
            [("X-GitHub-Event".to_string(), "push".to_string())].into();
        assert_eq!(header(&headers, "x-github-event"), Some("push"));
        assert_eq!(header(&headers, "x-gitlab-event"), None);
    }
}
