//! CI status normalization.
//!
//! Hosts report CI in two incompatible shapes: check runs (a `status` plus a
//! `conclusion` once completed) and legacy commit statuses (a single `state`).
//! Both are folded into [`CiCheck`] records and aggregated into a
//! [`CiStatusSummary`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use vcsgate_types::{CiCheck, CiSource, CiState, CiStatusSummary};

/// App that produced a check run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckRunApp {
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// A check run as reported by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckRun {
    pub id: u64,
    pub name: String,
    pub status: String,
    #[serde(default)]
    pub conclusion: Option<String>,
    #[serde(default)]
    pub html_url: Option<String>,
    #[serde(default)]
    pub details_url: Option<String>,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub app: Option<CheckRunApp>,
}

/// A legacy commit status as reported by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitStatus {
    pub id: u64,
    pub context: String,
    pub state: String,
    #[serde(default)]
    pub target_url: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Map a check run's `status`/`conclusion` pair.
#[must_use]
pub fn check_run_state(status: &str, conclusion: Option<&str>) -> CiState {
    let status = status.to_lowercase();
    match conclusion.map(str::to_lowercase).as_deref() {
        Some("success") => CiState::Passing,
        Some("failure") => CiState::Failing,
        Some("cancelled" | "timed_out") => CiState::Cancelled,
        Some("skipped" | "neutral") => CiState::Skipped,
        // Unknown or missing conclusion on a finished run counts as a failure.
        _ if status == "completed" => CiState::Failing,
        _ => CiState::Pending,
    }
}

/// Map a commit status `state`.
#[must_use]
pub fn commit_status_state(state: &str) -> CiState {
    match state.to_lowercase().as_str() {
        "success" => CiState::Passing,
        "failure" | "error" => CiState::Failing,
        _ => CiState::Pending,
    }
}

const KNOWN_SOURCES: &[(&str, CiSource)] = &[
    ("github-actions", CiSource::GithubActions),
    ("github actions", CiSource::GithubActions),
    ("circleci", CiSource::Circleci),
    ("travis", CiSource::Travis),
    ("jenkins", CiSource::Jenkins),
    ("buildkite", CiSource::Buildkite),
    ("azure-pipelines", CiSource::AzurePipelines),
    ("azure pipelines", CiSource::AzurePipelines),
    ("gitlab", CiSource::GitlabCi),
    ("vercel", CiSource::Vercel),
    ("netlify", CiSource::Netlify),
];

/// Identify the CI system from any of the given names (check name, app slug,
/// status context). Falls back to [`CiSource::External`].
#[must_use]
pub fn classify_source(names: &[&str]) -> CiSource {
    let haystack = names.join(" ").to_lowercase();
    KNOWN_SOURCES
        .iter()
        .find(|(needle, _)| haystack.contains(needle))
        .map_or(CiSource::External, |(_, source)| *source)
}

fn duration_secs(started: Option<DateTime<Utc>>, completed: Option<DateTime<Utc>>) -> Option<i64> {
    Some((completed? - started?).num_seconds())
}

impl From<&CheckRun> for CiCheck {
    fn from(run: &CheckRun) -> Self {
        let app = run.app.clone().unwrap_or_default();
        let source = classify_source(&[
            app.slug.as_deref().unwrap_or_default(),
            app.name.as_deref().unwrap_or_default(),
            run.name.as_str(),
        ]);
        Self {
            id: format!("check-{}", run.id),
            name: run.name.clone(),
            state: check_run_state(&run.status, run.conclusion.as_deref()),
            url: run.html_url.clone().or_else(|| run.details_url.clone()),
            started_at: run.started_at,
            completed_at: run.completed_at,
            duration: duration_secs(run.started_at, run.completed_at),
            source,
        }
    }
}

impl From<&CommitStatus> for CiCheck {
    fn from(status: &CommitStatus) -> Self {
        let state = commit_status_state(&status.state);
        let completed_at = if state == CiState::Pending {
            None
        } else {
            status.updated_at
        };
        Self {
            id: format!("status-{}", status.id),
            name: status.context.clone(),
            state,
            url: status.target_url.clone(),
            started_at: status.created_at,
            completed_at,
            duration: duration_secs(status.created_at, completed_at),
            source: classify_source(&[status.context.as_str()]),
        }
    }
}

/// Merge both signal shapes into one summary. Check runs come first.
#[must_use]
pub fn normalize(check_runs: &[CheckRun], statuses: &[CommitStatus]) -> CiStatusSummary {
    let checks = check_runs
        .iter()
        .map(CiCheck::from)
        .chain(statuses.iter().map(CiCheck::from))
        .collect();
    CiStatusSummary::from_checks(checks)
}
