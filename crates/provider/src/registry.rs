//! Provider lookup by identifier.
//!
//! Populated once at startup, then shared read-only behind an `Arc`.

use crate::traits::VcsProvider;
use std::{collections::HashMap, sync::Arc};
use vcsgate_types::{ProviderId, Result, VcsError};

#[derive(Default)]
pub struct ProviderRegistry {
    providers: HashMap<ProviderId, Arc<dyn VcsProvider>>,
    default: Option<ProviderId>,
}

impl ProviderRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider under its own id, replacing any previous one.
    ///
    /// The first provider registered becomes the default until
    /// [`Self::set_default`] says otherwise.
    pub fn register(&mut self, provider: Arc<dyn VcsProvider>) {
        let id = provider.id();
        if self.providers.insert(id, provider).is_some() {
            tracing::warn!(provider = %id, "replacing registered provider");
        } else {
            tracing::debug!(provider = %id, "provider registered");
        }
        self.default.get_or_insert(id);
    }

    /// Builder-style [`Self::register`].
    #[must_use]
    pub fn with(mut self, provider: Arc<dyn VcsProvider>) -> Self {
        self.register(provider);
        self
    }

    #[must_use]
    pub fn get(&self, id: ProviderId) -> Option<Arc<dyn VcsProvider>> {
        self.providers.get(&id).cloned()
    }

    /// Like [`Self::get`] but fails with an error naming `id`.
    ///
    /// # Errors
    ///
    /// Returns [`VcsError::ProviderNotFound`] if `id` is not registered.
    pub fn require(&self, id: ProviderId) -> Result<Arc<dyn VcsProvider>> {
        self.get(id).ok_or(VcsError::ProviderNotFound(id))
    }

    /// All registered providers, ordered by id.
    #[must_use]
    pub fn all(&self) -> Vec<Arc<dyn VcsProvider>> {
        let mut ids: Vec<_> = self.providers.keys().copied().collect();
        ids.sort();
        ids.into_iter()
            .filter_map(|id| self.providers.get(&id).cloned())
            .collect()
    }

    #[must_use]
    pub fn ids(&self) -> Vec<ProviderId> {
        let mut ids: Vec<_> = self.providers.keys().copied().collect();
        ids.sort();
        ids
    }

    #[must_use]
    pub fn has(&self, id: ProviderId) -> bool {
        self.providers.contains_key(&id)
    }

    #[must_use]
    pub fn default_provider(&self) -> Option<Arc<dyn VcsProvider>> {
        self.default.and_then(|id| self.get(id))
    }

    #[must_use]
    pub fn default_id(&self) -> Option<ProviderId> {
        self.default
    }

    /// Make `id` the default provider.
    ///
    /// # Errors
    ///
    /// Returns [`VcsError::ProviderNotFound`] if `id` is not registered.
    pub fn set_default(&mut self, id: ProviderId) -> Result<()> {
        if !self.has(id) {
            return Err(VcsError::ProviderNotFound(id));
        }
        self.default = Some(id);
        Ok(())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("providers", &self.ids())
            .field("default", &self.default)
            .finish()
    }
}
