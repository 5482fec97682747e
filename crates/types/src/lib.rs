//! Core types and traits for the vcsgate workspace.
//!
//! This crate defines the shared abstractions used across all layers:
//! the error type, provider identifiers, credential records, the normalized
//! CI and VCS models, and the storage/refresh traits the credential manager
//! is built on.

pub mod ci;
pub mod error;
pub mod provider;
pub mod token;
pub mod traits;
pub mod vcs;

pub use ci::{CiCheck, CiSource, CiState, CiStatusSummary};
pub use error::{Result, VcsError};
pub use provider::ProviderId;
pub use token::{TokenData, TokenKey, TokenSource, now_millis};
pub use traits::{TokenRefresher, TokenStore};
pub use vcs::{
    Branch, Comment, ConnectionStatus, DirectoryEntry, EntryKind, FileCommit, FileContent,
    FileUpdate, Issue, IssueState, NewPullRequest, PullRequest, PullRequestState, RepoRef,
    Repository, Review, ReviewState, StateFilter, WebhookEvent, WebhookPullRequest,
    WebhookRepository,
};
