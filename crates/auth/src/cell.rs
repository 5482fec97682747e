//! Process-wide token manager slot.
//!
//! Hosts that want a single shared manager initialize the cell once at
//! startup; everything else can hold an `Arc<TokenManager>` directly.

use crate::manager::{TokenManager, TokenManagerConfig};
use std::sync::{Arc, OnceLock};
use vcsgate_types::{Result, VcsError};

#[derive(Debug, Default)]
pub struct TokenManagerCell {
    inner: OnceLock<Arc<TokenManager>>,
}

impl TokenManagerCell {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            inner: OnceLock::new(),
        }
    }

    /// Construct the manager and store it.
    ///
    /// A failed construction leaves the cell empty so it can be retried.
    ///
    /// # Errors
    ///
    /// - [`VcsError::AlreadyInitialized`] if the cell is already set.
    /// - Whatever [`TokenManager::new`] returns.
    pub fn initialize(&self, config: TokenManagerConfig) -> Result<Arc<TokenManager>> {
        if self.inner.get().is_some() {
            return Err(VcsError::AlreadyInitialized);
        }
        let manager = Arc::new(TokenManager::new(config)?);
        self.inner
            .set(Arc::clone(&manager))
            .map_err(|_| VcsError::AlreadyInitialized)?;
        Ok(manager)
    }

    /// The initialized manager.
    ///
    /// # Errors
    ///
    /// Returns [`VcsError::NotInitialized`] before [`Self::initialize`] succeeds.
    pub fn instance(&self) -> Result<Arc<TokenManager>> {
        self.inner.get().cloned().ok_or(VcsError::NotInitialized)
    }

    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.inner.get().is_some()
    }
}
