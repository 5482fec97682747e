use crate::VcsOperations;
use vcsgate_types::{
    DirectoryEntry, FileCommit, FileContent, FileUpdate, ProviderId, RepoRef, Result, TokenSource,
};

/// File content operations.
#[derive(Clone, Copy, Debug)]
pub struct Files<'a> {
    ops: &'a VcsOperations,
}

impl<'a> Files<'a> {
    pub(crate) fn new(ops: &'a VcsOperations) -> Self {
        Self { ops }
    }

    /// Content of `path` at `git_ref`, or the default branch. `Ok(None)` when
    /// the file does not exist.
    ///
    /// # Errors
    ///
    /// Fails when the provider is not registered, the caller must
    /// re-authenticate, or the provider call fails.
    pub async fn get_content(
        &self,
        source: &TokenSource,
        provider: Option<ProviderId>,
        repo: &RepoRef,
        path: &str,
        git_ref: Option<&str>,
    ) -> Result<Option<FileContent>> {
        let (backend, client) = self.ops.resolve(source, provider, "files.get_content").await?;
        backend.get_file_content(&client, repo, path, git_ref).await
    }

    /// # Errors
    ///
    /// See [`Files::get_content`].
    pub async fn get_directory(
        &self,
        source: &TokenSource,
        provider: Option<ProviderId>,
        repo: &RepoRef,
        path: &str,
        git_ref: Option<&str>,
    ) -> Result<Vec<DirectoryEntry>> {
        let (backend, client) = self
            .ops
            .resolve(source, provider, "files.get_directory")
            .await?;
        backend.get_directory(&client, repo, path, git_ref).await
    }

    /// Create or overwrite a file with a single commit.
    ///
    /// # Errors
    ///
    /// See [`Files::get_content`].
    pub async fn update(
        &self,
        source: &TokenSource,
        provider: Option<ProviderId>,
        repo: &RepoRef,
        update: &FileUpdate,
    ) -> Result<FileCommit> {
        let (backend, client) = self.ops.resolve(source, provider, "files.update").await?;
        backend.update_file(&client, repo, update).await
    }
}
