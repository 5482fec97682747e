//! Configuration loading for vcsgate.
//!
//! Uses figment for YAML-based configuration with sensible defaults and
//! `VCSGATE_`-prefixed environment overrides.

pub mod schema;

pub use schema::{Config, LogConfig, ProviderConfig};
