//! Required environment variable validation.

use std::collections::HashMap;
use vcsgate_types::{Result, VcsError};

/// Where environment lookups are answered from.
#[derive(Debug, Clone, Default)]
pub enum EnvSource {
    /// The real process environment.
    #[default]
    Process,
    /// A fixed map, for tests and embedding.
    Fixed(HashMap<String, String>),
}

impl EnvSource {
    /// Look up `name`. Empty values count as unset.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<String> {
        let value = match self {
            Self::Process => std::env::var(name).ok(),
            Self::Fixed(map) => map.get(name).cloned(),
        };
        value.filter(|v| !v.is_empty())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for EnvSource {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::Fixed(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Fails with every missing name at once.
///
/// # Errors
///
/// Returns [`VcsError::MissingEnvVars`] listing all unset names in input order.
pub fn check_required(names: &[String], env: &EnvSource) -> Result<()> {
    let missing: Vec<String> = names
        .iter()
        .filter(|name| env.get(name).is_none())
        .cloned()
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(VcsError::MissingEnvVars(missing))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_all_present() {
        let env: EnvSource = [("A", "1"), ("B", "2")].into_iter().collect();
        assert!(check_required(&names(&["A", "B"]), &env).is_ok());
    }

    #[test]
    fn test_reports_every_missing_name() {
        let env: EnvSource = [("B", "2")].into_iter().collect();
        let err = check_required(&names(&["A", "B", "C"]), &env).unwrap_err();
        match err {
            VcsError::MissingEnvVars(missing) => assert_eq!(missing, vec!["A", "C"]),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_empty_value_is_missing() {
        let env: EnvSource = [("A", "")].into_iter().collect();
        assert!(check_required(&names(&["A"]), &env).is_err());
    }

    #[test]
    fn test_no_requirements() {
        assert!(check_required(&[], &EnvSource::Process).is_ok());
    }

    #[test]
    fn test_process_env_path_is_set() {
        assert!(EnvSource::Process.get("PATH").is_some());
    }
}
