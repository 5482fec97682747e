use crate::VcsOperations;
use vcsgate_types::{Issue, ProviderId, RepoRef, Result, StateFilter, TokenSource};

/// Issue operations.
#[derive(Clone, Copy, Debug)]
pub struct Issues<'a> {
    ops: &'a VcsOperations,
}

impl<'a> Issues<'a> {
    pub(crate) fn new(ops: &'a VcsOperations) -> Self {
        Self { ops }
    }

    /// Issues in `repo`, excluding pull requests.
    ///
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
    ) -> Result<Vec<Issue>> {
        let (backend, client) = self.ops.resolve(source, provider, "issues.list").await?;
        backend.list_issues(&client, repo, state).await
    }
}
