use crate::VcsOperations;
use vcsgate_types::{Branch, ProviderId, RepoRef, Result, TokenSource};

#[derive(Clone, Copy, Debug)]
pub struct Branches<'a> {
    ops: &'a VcsOperations,
}

impl<'a> Branches<'a> {
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
    ) -> Result<Vec<Branch>> {
        let (backend, client) = self.ops.resolve(source, provider, "branches.list").await?;
        backend.list_branches(&client, repo).await
    }

    /// Create `name` at the head of `from_ref`.
    ///
    /// # Errors
    ///
    /// See [`Branches::list`].
    pub async fn create(
        &self,
        source: &TokenSource,
        provider: Option<ProviderId>,
        repo: &RepoRef,
        name: &str,
        from_ref: &str,
    ) -> Result<Branch> {
        let (backend, client) = self.ops.resolve(source, provider, "branches.create").await?;
        backend.create_branch(&client, repo, name, from_ref).await
    }
}
