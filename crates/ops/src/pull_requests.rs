use crate::VcsOperations;
use vcsgate_types::{
    CiStatusSummary, Comment, NewPullRequest, ProviderId, PullRequest, RepoRef, Result, Review,
    StateFilter, TokenSource,
};

/// Pull request, review, comment, and CI operations.
#[derive(Clone, Copy, Debug)]
pub struct PullRequests<'a> {
    ops: &'a VcsOperations,
}

impl<'a> PullRequests<'a> {
    pub(crate) fn new(ops: &'a VcsOperations) -> Self {
        Self { ops }
    }

    /// # Errors
    ///
    /// Fails when the provider is not registered, the caller must
    /// re-authenticate, or the provider call fails.
    pub async fn list(
        &self,
        source: &TokenSource,
        provider: Option<ProviderId>,
        repo: &RepoRef,
        state: StateFilter,
    ) -> Result<Vec<PullRequest>> {
        let (backend, client) = self.ops.resolve(source, provider, "pull_requests.list").await?;
        backend.list_pull_requests(&client, repo, state).await
    }

    /// # Errors
    ///
    /// See [`PullRequests::list`].
    pub async fn get(
        &self,
        source: &TokenSource,
        provider: Option<ProviderId>,
        repo: &RepoRef,
        number: u64,
    ) -> Result<PullRequest> {
        let (backend, client) = self.ops.resolve(source, provider, "pull_requests.get").await?;
        backend.get_pull_request(&client, repo, number).await
    }

    /// # Errors
    ///
    /// See [`PullRequests::list`].
    pub async fn create(
        &self,
        source: &TokenSource,
        provider: Option<ProviderId>,
        repo: &RepoRef,
        pr: &NewPullRequest,
    ) -> Result<PullRequest> {
        let (backend, client) = self
            .ops
            .resolve(source, provider, "pull_requests.create")
            .await?;
        backend.create_pull_request(&client, repo, pr).await
    }

    /// # Errors
    ///
    /// See [`PullRequests::list`].
    pub async fn reviews(
        &self,
        source: &TokenSource,
        provider: Option<ProviderId>,
        repo: &RepoRef,
        number: u64,
    ) -> Result<Vec<Review>> {
        let (backend, client) = self
            .ops
            .resolve(source, provider, "pull_requests.reviews")
            .await?;
        backend.list_pull_request_reviews(&client, repo, number).await
    }

    /// # Errors
    ///
    /// See [`PullRequests::list`].
    pub async fn comments(
        &self,
        source: &TokenSource,
        provider: Option<ProviderId>,
        repo: &RepoRef,
        number: u64,
    ) -> Result<Vec<Comment>> {
        let (backend, client) = self
            .ops
            .resolve(source, provider, "pull_requests.comments")
            .await?;
        backend.list_pull_request_comments(&client, repo, number).await
    }

    /// # Errors
    ///
    /// See [`PullRequests::list`].
    pub async fn create_comment(
        &self,
        source: &TokenSource,
        provider: Option<ProviderId>,
        repo: &RepoRef,
        number: u64,
        body: &str,
    ) -> Result<Comment> {
        let (backend, client) = self
            .ops
            .resolve(source, provider, "pull_requests.create_comment")
            .await?;
        backend
            .create_pull_request_comment(&client, repo, number, body)
            .await
    }

    /// # Errors
    ///
    /// See [`PullRequests::list`].
    pub async fn update_comment(
        &self,
        source: &TokenSource,
        provider: Option<ProviderId>,
        repo: &RepoRef,
        comment_id: &str,
        body: &str,
    ) -> Result<Comment> {
        let (backend, client) = self
            .ops
            .resolve(source, provider, "pull_requests.update_comment")
            .await?;
        backend
            .update_pull_request_comment(&client, repo, comment_id, body)
            .await
    }

    /// # Errors
    ///
    /// See [`PullRequests::list`].
    pub async fn delete_comment(
        &self,
        source: &TokenSource,
        provider: Option<ProviderId>,
        repo: &RepoRef,
        comment_id: &str,
    ) -> Result<()> {
        let (backend, client) = self
            .ops
            .resolve(source, provider, "pull_requests.delete_comment")
            .await?;
        backend
            .delete_pull_request_comment(&client, repo, comment_id)
            .await
    }

    /// Normalized CI status of the pull request's head commit.
    ///
    /// # Errors
    ///
    /// See [`PullRequests::list`].
    pub async fn ci_status(
        &self,
        source: &TokenSource,
        provider: Option<ProviderId>,
        repo: &RepoRef,
        number: u64,
    ) -> Result<CiStatusSummary> {
        let (backend, client) = self
            .ops
            .resolve(source, provider, "pull_requests.ci_status")
            .await?;
        backend.get_ci_status(&client, repo, number).await
    }
}
