//! Normalized CI check model shared by every provider.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Normalized state of a single CI check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CiState {
    Pending,
    Passing,
    Failing,
    Cancelled,
    Skipped,
}

/// CI system a check originates from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CiSource {
    GithubActions,
    Circleci,
    Travis,
    Jenkins,
    Buildkite,
    AzurePipelines,
    GitlabCi,
    Vercel,
    Netlify,
    External,
}

impl fmt::Display for CiSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::GithubActions => "github-actions",
            Self::Circleci => "circleci",
            Self::Travis => "travis",
            Self::Jenkins => "jenkins",
            Self::Buildkite => "buildkite",
            Self::AzurePipelines => "azure-pipelines",
            Self::GitlabCi => "gitlab-ci",
            Self::Vercel => "vercel",
            Self::Netlify => "netlify",
            Self::External => "external",
        };
        f.write_str(s)
    }
}

/// One CI signal for a commit, whatever shape it arrived in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CiCheck {
    pub id: String,
    pub name: String,
    pub state: CiState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    /// Whole seconds between start and completion.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<i64>,
    pub source: CiSource,
}

/// Aggregate CI outcome for a pull request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CiStatusSummary {
    pub overall: CiState,
    pub checks: Vec<CiCheck>,
    pub total_checks: usize,
    pub passing_checks: usize,
    pub failing_checks: usize,
    pub pending_checks: usize,
}

impl CiStatusSummary {
    /// Aggregate checks: failing if any check fails, else pending if any is
    /// pending, else passing.
    #[must_use]
    pub fn from_checks(checks: Vec<CiCheck>) -> Self {
        let count = |state: CiState| checks.iter().filter(|c| c.state == state).count();
        let passing_checks = count(CiState::Passing);
        let failing_checks = count(CiState::Failing);
        let pending_checks = count(CiState::Pending);

        let overall = if failing_checks > 0 {
            CiState::Failing
        } else if pending_checks > 0 {
            CiState::Pending
        } else {
            CiState::Passing
        };

        Self {
            overall,
            total_checks: checks.len(),
            passing_checks,
            failing_checks,
            pending_checks,
            checks,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(id: &str, state: CiState) -> CiCheck {
        CiCheck {
            id: id.to_string(),
            name: id.to_string(),
            state,
            url: None,
            started_at: None,
            completed_at: None,
            duration: None,
            source: CiSource::External,
        }
    }

    #[test]
    fn test_summary_failing_wins() {
        let s = CiStatusSummary::from_checks(vec![
            check("a", CiState::Pending),
            check("b", CiState::Failing),
            check("c", CiState::Passing),
        ]);
        assert_eq!(s.overall, CiState::Failing);
        assert_eq!(s.total_checks, 3);
        assert_eq!(s.passing_checks, 1);
        assert_eq!(s.failing_checks, 1);
        assert_eq!(s.pending_checks, 1);
    }

    #[test]
    fn test_summary_pending_over_passing() {
        let s = CiStatusSummary::from_checks(vec![
            check("a", CiState::Pending),
            check("b", CiState::Passing),
        ]);
        assert_eq!(s.overall, CiState::Pending);
    }

    #[test]
    fn test_summary_cancelled_and_skipped_do_not_fail() {
        let s = CiStatusSummary::from_checks(vec![
            check("a", CiState::Cancelled),
            check("b", CiState::Skipped),
            check("c", CiState::Passing),
        ]);
        assert_eq!(s.overall, CiState::Passing);
        assert_eq!(s.total_checks, 3);
        assert_eq!(s.passing_checks, 1);
    }

    #[test]
    fn test_summary_empty_is_passing() {
        let s = CiStatusSummary::from_checks(Vec::new());
        assert_eq!(s.overall, CiState::Passing);
        assert_eq!(s.total_checks, 0);
    }

    #[test]
    fn test_summary_serializes_camel_case() {
        let s = CiStatusSummary::from_checks(vec![check("a", CiState::Passing)]);
        let json = serde_json::to_value(&s).unwrap();
        assert_eq!(json["overall"], "passing");
        assert_eq!(json["totalChecks"], 1);
        assert_eq!(json["checks"][0]["source"], "external");
    }
}
