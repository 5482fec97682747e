//! Version-control host identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies a supported version-control host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderId {
    #[serde(rename = "github")]
    GitHub,
    #[serde(rename = "gitlab")]
    GitLab,
    Bitbucket,
    AzureDevOps,
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ProviderId {
    type Err = crate::VcsError;

    /// Parse a provider name or well-known alias into a [`ProviderId`].
    ///
    /// # Errors
    ///
    /// Returns [`VcsError::UnknownProvider`](crate::VcsError::UnknownProvider)
    /// if the string does not match any known provider name or alias.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "github" | "gh" => Ok(Self::GitHub),
            "gitlab" | "gl" => Ok(Self::GitLab),
            "bitbucket" | "bb" => Ok(Self::Bitbucket),
            "azure_devops" | "azure-devops" | "azure" | "ado" => Ok(Self::AzureDevOps),
            _ => Err(crate::VcsError::UnknownProvider(s.to_string())),
        }
    }
}

impl ProviderId {
    /// Returns all known provider variants.
    #[must_use]
    pub fn all() -> &'static [Self] {
        &[Self::GitHub, Self::GitLab, Self::Bitbucket, Self::AzureDevOps]
    }

    /// Canonical lowercase name, identical to the serde representation.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::GitHub => "github",
            Self::GitLab => "gitlab",
            Self::Bitbucket => "bitbucket",
            Self::AzureDevOps => "azure_devops",
        }
    }
}
