//! In-memory token store backed by a `HashMap` behind a `Mutex`.

use crate::CredentialRecord;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use vcsgate_types::{ProviderId, Result, TokenData, TokenKey, TokenSource, TokenStore};

/// An in-memory [`TokenStore`] implementation for testing and ephemeral use.
#[derive(Default)]
pub struct InMemoryTokenStore {
    data: Mutex<HashMap<TokenKey, CredentialRecord>>,
}

impl InMemoryTokenStore {
    /// Creates a new empty in-memory token store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<TokenKey, CredentialRecord>> {
        self.data.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns a copy of the full stored record.
    #[must_use]
    pub fn record(&self, source: &TokenSource, provider: ProviderId) -> Option<CredentialRecord> {
        self.lock()
            .get(&TokenKey::new(source.clone(), provider))
            .cloned()
    }

    /// Attach provider linkage to an existing record.
    ///
    /// Returns `false` if no record exists for the pair.
    pub fn link(
        &self,
        source: &TokenSource,
        provider: ProviderId,
        installation_id: impl Into<String>,
    ) -> bool {
        match self.lock().get_mut(&TokenKey::new(source.clone(), provider)) {
            Some(rec) => {
                rec.installation_id = Some(installation_id.into());
                true
            }
            None => false,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

#[async_trait]
impl TokenStore for InMemoryTokenStore {
    async fn load(&self, source: &TokenSource, provider: ProviderId) -> Result<Option<TokenData>> {
        Ok(self
            .lock()
            .get(&TokenKey::new(source.clone(), provider))
            .map(|rec| rec.tokens.clone()))
    }

    async fn save(
        &self,
        source: &TokenSource,
        provider: ProviderId,
        tokens: &TokenData,
    ) -> Result<()> {
        self.lock()
            .entry(TokenKey::new(source.clone(), provider))
            .and_modify(|rec| rec.replace_tokens(tokens.clone()))
            .or_insert_with(|| CredentialRecord::new(source.clone(), provider, tokens.clone()));
        Ok(())
    }
}
