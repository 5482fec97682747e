use crate::VcsOperations;
use vcsgate_types::{ConnectionStatus, ProviderId, RepoRef, Repository, Result, TokenSource};

/// Repository and connection operations.
#[derive(Clone, Copy, Debug)]
pub struct Repos<'a> {
    ops: &'a VcsOperations,
}

impl<'a> Repos<'a> {
    pub(crate) fn new(ops: &'a VcsOperations) -> Self {
        Self { ops }
    }

    /// Repositories visible to the authenticated account.
    ///
    /// # Errors
    ///
    /// Fails when the provider is not registered, the caller must
    /// re-authenticate, or the provider call fails.
    pub async fn list(
        &self,
        source: &TokenSource,
        provider: Option<ProviderId>,
    ) -> Result<Vec<Repository>> {
        let (backend, client) = self.ops.resolve(source, provider, "repos.list").await?;
        backend.list_repositories(&client).await
    }

    /// # Errors
    ///
    /// See [`Repos::list`].
    pub async fn get(
        &self,
        source: &TokenSource,
        provider: Option<ProviderId>,
        repo: &RepoRef,
    ) -> Result<Repository> {
        let (backend, client) = self.ops.resolve(source, provider, "repos.get").await?;
        backend.get_repository(&client, repo).await
    }

    /// Who the stored credentials authenticate as.
    ///
    /// # Errors
    ///
    /// See [`Repos::list`].
    pub async fn check_connection(
        &self,
        source: &TokenSource,
        provider: Option<ProviderId>,
    ) -> Result<ConnectionStatus> {
        let (backend, client) = self
            .ops
            .resolve(source, provider, "repos.check_connection")
            .await?;
        backend.check_connection(&client).await
    }
}
