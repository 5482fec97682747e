use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use vcsgate_types::ProviderId;

fn default_true() -> bool {
    true
}

/// Configuration for a single VCS host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Whether this provider is registered at startup (defaults to `true`).
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// API base URL override (e.g. a GitHub Enterprise host).
    #[serde(default)]
    pub api_base: Option<String>,
    /// Name of the env var holding the OAuth app client id used for refresh.
    #[serde(default)]
    pub client_id_env: Option<String>,
    /// Name of the env var holding the OAuth app client secret used for refresh.
    #[serde(default)]
    pub client_secret_env: Option<String>,
    /// Name of the env var holding a static token for the provider's own
    /// `authenticate` entry point.
    #[serde(default)]
    pub fallback_token_env: Option<String>,
    /// Name of the env var holding the webhook shared secret.
    #[serde(default)]
    pub webhook_secret_env: Option<String>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_base: None,
            client_id_env: None,
            client_secret_env: None,
            fallback_token_env: None,
            webhook_secret_env: None,
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}

/// Logging output settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogConfig {
    /// Default filter directive when `RUST_LOG` is unset.
    #[serde(default = "default_level")]
    pub level: String,
    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            json: false,
        }
    }
}

fn default_provider() -> ProviderId {
    ProviderId::GitHub
}

fn default_buffer_secs() -> u64 {
    300
}

/// Top-level application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Provider used when a caller does not name one.
    #[serde(default = "default_provider")]
    pub default_provider: ProviderId,
    /// Refresh tokens this many seconds before they expire (defaults to 300).
    #[serde(default = "default_buffer_secs")]
    pub expiration_buffer_secs: u64,
    /// Environment variables that must be set before the token manager starts.
    #[serde(default)]
    pub required_env: Vec<String>,
    /// JSON token file used by the CLI (default: `~/.vcsgate/tokens.json`).
    #[serde(default)]
    pub tokens_path: Option<PathBuf>,
    #[serde(default)]
    pub log: LogConfig,
    /// Per-provider settings.
    #[serde(default)]
    pub providers: HashMap<ProviderId, ProviderConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_provider: default_provider(),
            expiration_buffer_secs: default_buffer_secs(),
            required_env: Vec::new(),
            tokens_path: None,
            log: LogConfig::default(),
            providers: HashMap::new(),
        }
    }
}

impl Config {
    /// Parses configuration from a YAML string, merged with defaults.
    ///
    /// # Errors
    ///
    /// Returns a [`figment::Error`] if the YAML is invalid or extraction fails.
    #[allow(clippy::result_large_err)]
    pub fn from_yaml(yaml: &str) -> Result<Self, figment::Error> {
        use figment::{
            Figment,
            providers::{Format as _, Serialized, Yaml},
        };
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Yaml::string(yaml))
            .extract()
    }

    /// Loads defaults, then the optional YAML file, then `VCSGATE_*`
    /// environment variables (nested keys separated by `__`).
    ///
    /// # Errors
    ///
    /// Returns a [`figment::Error`] if the file cannot be read or parsed.
    #[allow(clippy::result_large_err)]
    pub fn load(path: Option<&Path>) -> Result<Self, figment::Error> {
        use figment::{
            Figment,
            providers::{Env, Format as _, Serialized, Yaml},
        };
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(path) = path {
            figment = figment.merge(Yaml::file(path));
        }
        figment
            .merge(Env::prefixed("VCSGATE_").split("__"))
            .extract()
    }

    #[must_use]
    pub fn expiration_buffer(&self) -> Duration {
        Duration::from_secs(self.expiration_buffer_secs)
    }

    /// Settings for `id`, falling back to defaults when unconfigured.
    #[must_use]
    pub fn provider(&self, id: ProviderId) -> ProviderConfig {
        self.providers.get(&id).cloned().unwrap_or_default()
    }
}
