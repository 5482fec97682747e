//! JSON-file token store.
//!
//! The whole file is a JSON array of [`CredentialRecord`]s. Writes go to a
//! sibling temp file and are renamed into place.

use crate::CredentialRecord;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use vcsgate_types::{ProviderId, Result, TokenData, TokenSource, TokenStore, VcsError};

/// A persistent [`TokenStore`] backed by a single JSON file.
pub struct FileTokenStore {
    path: PathBuf,
    /// Serializes read-modify-write cycles within this process.
    write_lock: Mutex<()>,
}

impl FileTokenStore {
    /// Opens (without creating) the store at `path`. A missing file reads as empty.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every record in the file.
    ///
    /// # Errors
    ///
    /// Returns [`VcsError::Storage`] on I/O failure and
    /// [`VcsError::Serialization`] if the file is not valid JSON.
    pub async fn records(&self) -> Result<Vec<CredentialRecord>> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(Vec::new()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(storage_err(&self.path, &e)),
        }
    }

    async fn write_records(&self, records: &[CredentialRecord]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| storage_err(parent, &e))?;
            }
        }
        let json = serde_json::to_vec_pretty(records)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json)
            .await
            .map_err(|e| storage_err(&tmp, &e))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| storage_err(&self.path, &e))
    }
}

fn storage_err(path: &Path, e: &std::io::Error) -> VcsError {
    VcsError::Storage(format!("{}: {e}", path.display()))
}

#[async_trait]
impl TokenStore for FileTokenStore {
    async fn load(&self, source: &TokenSource, provider: ProviderId) -> Result<Option<TokenData>> {
        Ok(self
            .records()
            .await?
            .into_iter()
            .find(|r| &r.source == source && r.provider == provider)
            .map(|r| r.tokens))
    }

    async fn save(
        &self,
        source: &TokenSource,
        provider: ProviderId,
        tokens: &TokenData,
    ) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut records = self.records().await?;
        match records
            .iter_mut()
            .find(|r| &r.source == source && r.provider == provider)
        {
            Some(rec) => rec.replace_tokens(tokens.clone()),
            None => records.push(CredentialRecord::new(
                source.clone(),
                provider,
                tokens.clone(),
            )),
        }
        self.write_records(&records).await?;
        tracing::debug!(source = %source, provider = %provider, path = %self.path.display(), "tokens written");
        Ok(())
    }
}
