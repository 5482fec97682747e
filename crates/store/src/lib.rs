//! Token storage backends for persisting credentials.
//!
//! Provides an in-memory store for testing and a JSON-file store for the CLI.
//! Both keep a [`CredentialRecord`] per `(source, provider)` and only replace
//! its token material on save, so linkage metadata survives refreshes and
//! invalidation.

pub mod file;
pub mod memory;
pub mod record;

pub use file::FileTokenStore;
pub use memory::InMemoryTokenStore;
pub use record::CredentialRecord;
