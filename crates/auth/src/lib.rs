//! Credential lifecycle for VCS providers.
//!
//! The [`TokenManager`] loads credentials from a [`vcsgate_types::TokenStore`],
//! refreshes them shortly before they expire, and collapses concurrent
//! refreshes for the same owner and host into one. [`RefresherSet`] and
//! [`GitHubTokenRefresher`] supply the provider-specific refresh exchange.

pub mod cell;
pub mod env;
pub mod github;
pub mod manager;
pub mod refresher;

pub use cell::TokenManagerCell;
pub use env::{EnvSource, check_required};
pub use github::GitHubTokenRefresher;
pub use manager::{DEFAULT_EXPIRATION_BUFFER, RefreshFailureHook, TokenManager, TokenManagerConfig};
pub use refresher::RefresherSet;
