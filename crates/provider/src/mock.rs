//! Deterministic in-memory provider for tests and local development.
//!
//! Serves canned repositories, branches, pull requests, issues, and CI
//! signals. Writes (branches, files, pull requests, comments) mutate the
//! in-memory state so follow-up reads see them. Latency and per-operation
//! failures are injectable, and every call is recorded.

use crate::{
    ci::{self, CheckRun, CheckRunApp, CommitStatus},
    client::{AuthenticatedClient, MockClient},
    traits::{VcsProvider, WebhookHeaders},
    webhook,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sha2::{Digest as _, Sha256};
use std::{
    collections::{BTreeMap, HashMap},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};
use vcsgate_types::{
    Branch, CiStatusSummary, Comment, ConnectionStatus, DirectoryEntry, EntryKind, FileCommit,
    FileContent, FileUpdate, Issue, IssueState, NewPullRequest, ProviderId, PullRequest,
    PullRequestState, RepoRef, Repository, Result, Review, ReviewState, StateFilter, TokenData,
    TokenSource, VcsError, WebhookEvent,
};

/// Login reported by the mock for every authenticated call.
pub const MOCK_LOGIN: &str = "mock-user";
/// Token handed out by [`VcsProvider::authenticate`].
pub const MOCK_FALLBACK_TOKEN: &str = "mock-fallback-token";

/// Operations that can be individually failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MockOperation {
    Authenticate,
    CheckConnection,
    ListRepositories,
    GetRepository,
    GetFileContent,
    GetDirectory,
    CreateBranch,
    UpdateFile,
    ListBranches,
    ListPullRequests,
    GetPullRequest,
    CreatePullRequest,
    ListReviews,
    ListComments,
    CreateComment,
    UpdateComment,
    DeleteComment,
    GetCiStatus,
    ListIssues,
}

/// Record of a call for test assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockCall {
    pub operation: MockOperation,
    /// Access token of the client the call was made with.
    pub token: Option<String>,
    pub repo: Option<RepoRef>,
}

#[derive(Debug, Default)]
struct MockState {
    repositories: Vec<Repository>,
    branches: Vec<Branch>,
    /// Keyed by `(branch, normalized path)`.
    files: BTreeMap<(String, String), FileContent>,
    pull_requests: Vec<PullRequest>,
    reviews: Vec<(u64, Review)>,
    comments: Vec<(u64, Comment)>,
    issues: Vec<Issue>,
    next_comment_id: u64,
}

pub struct MockProvider {
    id: ProviderId,
    latency: Duration,
    errors: HashMap<MockOperation, String>,
    check_runs: Vec<CheckRun>,
    statuses: Vec<CommitStatus>,
    state: Mutex<MockState>,
    call_log: Arc<Mutex<Vec<MockCall>>>,
}

/// Branch used when a read names no ref.
pub const DEFAULT_BRANCH: &str = "main";

/// Drop empty segments so `/a//b/` and `a/b` name the same file.
fn normalize_path(path: &str) -> String {
    path.split('/')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

impl MockState {
    /// Branch named by `git_ref` (branch name, `refs/heads/` name, or head
    /// sha), defaulting to [`DEFAULT_BRANCH`].
    fn resolve_branch(&self, git_ref: Option<&str>) -> Option<String> {
        let wanted = git_ref.map_or(DEFAULT_BRANCH, |r| r.trim_start_matches("refs/heads/"));
        self.branches
            .iter()
            .find(|b| b.name == wanted || b.sha == wanted)
            .map(|b| b.name.clone())
    }

    fn files_on<'a>(&'a self, branch: &'a str) -> impl Iterator<Item = &'a FileContent> + 'a {
        self.files
            .iter()
            .filter(move |((b, _), _)| b == branch)
            .map(|(_, f)| f)
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

fn fixed_time() -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(1_700_000_000, 0)
}

/// Stable fake object id derived from its content.
fn fake_sha(parts: &[&str]) -> String {
    let mut hasher = Sha256::new();
    for p in parts {
        hasher.update(p.as_bytes());
        hasher.update([0u8]);
    }
    hex::encode(hasher.finalize())[..40].to_string()
}

impl MockProvider {
    /// A mock registered under `id`, preloaded with canned data.
    #[must_use]
    pub fn new(id: ProviderId) -> Self {
        Self {
            id,
            latency: Duration::ZERO,
            errors: HashMap::new(),
            check_runs: vec![CheckRun {
                id: 1,
                name: "build".into(),
                status: "completed".into(),
                conclusion: Some("success".into()),
                html_url: Some("https://ci.example.com/runs/1".into()),
                details_url: None,
                started_at: fixed_time(),
                completed_at: fixed_time().map(|t| t + chrono::Duration::seconds(90)),
                app: Some(CheckRunApp {
                    slug: Some("github-actions".into()),
                    name: Some("GitHub Actions".into()),
                }),
            }],
            statuses: Vec::new(),
            state: Mutex::new(Self::canned_state()),
            call_log: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn canned_state() -> MockState {
        let main_sha = fake_sha(&["main"]);
        let feature_sha = fake_sha(&["feature/mock"]);
        let mut files = BTreeMap::new();
        for branch in [DEFAULT_BRANCH, "feature/mock"] {
            for (path, content) in [
                ("README.md", "# Mock repository\n"),
                ("src/lib.rs", "pub fn answer() -> u32 {\n    42\n}\n"),
                ("src/bin/cli.rs", "fn main() {}\n"),
            ] {
                files.insert(
                    (branch.to_string(), path.to_string()),
                    FileContent {
                        path: path.to_string(),
                        sha: fake_sha(&[path, content]),
                        content: content.to_string(),
                        size: content.len() as u64,
                    },
                );
            }
        }

        MockState {
            repositories: vec![Repository {
                id: "1".into(),
                owner: "mock-org".into(),
                name: "mock-repo".into(),
                full_name: "mock-org/mock-repo".into(),
                private: false,
                default_branch: Some("main".into()),
                description: Some("Canned repository served by the mock provider".into()),
                url: "https://vcs.example.com/mock-org/mock-repo".into(),
            }],
            branches: vec![
                Branch {
                    name: "main".into(),
                    sha: main_sha,
                    protected: true,
                },
                Branch {
                    name: "feature/mock".into(),
                    sha: feature_sha.clone(),
                    protected: false,
                },
            ],
            files,
            pull_requests: vec![PullRequest {
                number: 1,
                title: "Add mock feature".into(),
                body: Some("Canned pull request".into()),
                state: PullRequestState::Open,
                draft: false,
                author: MOCK_LOGIN.into(),
                head_ref: "feature/mock".into(),
                head_sha: feature_sha,
                base_ref: "main".into(),
                url: "https://vcs.example.com/mock-org/mock-repo/pull/1".into(),
                created_at: fixed_time(),
                updated_at: fixed_time(),
            }],
            reviews: vec![(
                1,
                Review {
                    id: "1".into(),
                    author: "reviewer".into(),
                    state: ReviewState::Approved,
                    body: Some("LGTM".into()),
                    submitted_at: fixed_time(),
                },
            )],
            comments: Vec::new(),
            issues: vec![
                Issue {
                    number: 2,
                    title: "Mock bug".into(),
                    body: None,
                    state: IssueState::Open,
                    author: MOCK_LOGIN.into(),
                    labels: vec!["bug".into()],
                    url: "https://vcs.example.com/mock-org/mock-repo/issues/2".into(),
                    created_at: fixed_time(),
                },
                Issue {
                    number: 3,
                    title: "Fixed long ago".into(),
                    body: None,
                    state: IssueState::Closed,
                    author: MOCK_LOGIN.into(),
                    labels: Vec::new(),
                    url: "https://vcs.example.com/mock-org/mock-repo/issues/3".into(),
                    created_at: fixed_time(),
                },
            ],
            next_comment_id: 100,
        }
    }

    /// Delay every operation by `latency`.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Make `operation` fail with a [`VcsError::Provider`] carrying `message`.
    #[must_use]
    pub fn with_error(mut self, operation: MockOperation, message: impl Into<String>) -> Self {
        self.errors.insert(operation, message.into());
        self
    }

    /// Replace the CI inputs served for every pull request.
    #[must_use]
    pub fn with_ci(mut self, check_runs: Vec<CheckRun>, statuses: Vec<CommitStatus>) -> Self {
        self.check_runs = check_runs;
        self.statuses = statuses;
        self
    }

    /// Copy of the call log.
    #[must_use]
    pub fn calls(&self) -> Vec<MockCall> {
        lock(&self.call_log).clone()
    }

    /// Operations called so far, in order.
    #[must_use]
    pub fn operations(&self) -> Vec<MockOperation> {
        lock(&self.call_log).iter().map(|c| c.operation).collect()
    }

    pub fn clear_calls(&self) {
        lock(&self.call_log).clear();
    }

    /// Record the call, check the client, wait, then apply any injected failure.
    async fn enter(
        &self,
        operation: MockOperation,
        client: &AuthenticatedClient,
        repo: Option<&RepoRef>,
    ) -> Result<()> {
        let token = client.as_mock(self.id).map(|c| c.token.clone());
        lock(&self.call_log).push(MockCall {
            operation,
            token: token.as_ref().ok().cloned(),
            repo: repo.cloned(),
        });
        token?;
        self.delay_and_fail(operation).await
    }

    async fn delay_and_fail(&self, operation: MockOperation) -> Result<()> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        match self.errors.get(&operation) {
            Some(message) => Err(VcsError::Provider {
                provider: self.id,
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }

    fn find_pull(state: &MockState, repo: &RepoRef, number: u64) -> Result<PullRequest> {
        state
            .pull_requests
            .iter()
            .find(|p| p.number == number)
            .cloned()
            .ok_or_else(|| VcsError::NotFound(format!("{repo}#{number}")))
    }
}

#[async_trait]
impl VcsProvider for MockProvider {
    fn id(&self) -> ProviderId {
        self.id
    }

    fn name(&self) -> &'static str {
        "Mock"
    }

    fn client(&self, tokens: &TokenData) -> AuthenticatedClient {
        AuthenticatedClient::Mock {
            provider: self.id,
            client: MockClient {
                token: tokens.access_token.clone(),
            },
        }
    }

    async fn authenticate(&self, _source: &TokenSource) -> Result<AuthenticatedClient> {
        lock(&self.call_log).push(MockCall {
            operation: MockOperation::Authenticate,
            token: None,
            repo: None,
        });
        self.delay_and_fail(MockOperation::Authenticate).await?;
        Ok(self.client(&TokenData::new(MOCK_FALLBACK_TOKEN)))
    }

    async fn check_connection(&self, client: &AuthenticatedClient) -> Result<ConnectionStatus> {
        self.enter(MockOperation::CheckConnection, client, None).await?;
        Ok(ConnectionStatus {
            connected: true,
            login: Some(MOCK_LOGIN.into()),
            error: None,
        })
    }

    async fn list_repositories(&self, client: &AuthenticatedClient) -> Result<Vec<Repository>> {
        self.enter(MockOperation::ListRepositories, client, None).await?;
        Ok(lock(&self.state).repositories.clone())
    }

    async fn get_repository(
        &self,
        client: &AuthenticatedClient,
        repo: &RepoRef,
    ) -> Result<Repository> {
        self.enter(MockOperation::GetRepository, client, Some(repo)).await?;
        lock(&self.state)
            .repositories
            .iter()
            .find(|r| r.owner == repo.owner && r.name == repo.name)
            .cloned()
            .ok_or_else(|| VcsError::NotFound(repo.to_string()))
    }

    async fn get_file_content(
        &self,
        client: &AuthenticatedClient,
        repo: &RepoRef,
        path: &str,
        git_ref: Option<&str>,
    ) -> Result<Option<FileContent>> {
        self.enter(MockOperation::GetFileContent, client, Some(repo)).await?;
        let state = lock(&self.state);
        let Some(branch) = state.resolve_branch(git_ref) else {
            return Ok(None);
        };
        Ok(state.files.get(&(branch, normalize_path(path))).cloned())
    }

    async fn get_directory(
        &self,
        client: &AuthenticatedClient,
        repo: &RepoRef,
        path: &str,
        git_ref: Option<&str>,
    ) -> Result<Vec<DirectoryEntry>> {
        self.enter(MockOperation::GetDirectory, client, Some(repo)).await?;
        let dir = normalize_path(path);
        let prefix = if dir.is_empty() {
            String::new()
        } else {
            format!("{dir}/")
        };

        let state = lock(&self.state);
        let branch = state
            .resolve_branch(git_ref)
            .ok_or_else(|| VcsError::NotFound(format!("{repo}@{}", git_ref.unwrap_or_default())))?;
        let mut entries: BTreeMap<String, DirectoryEntry> = BTreeMap::new();
        for file in state.files_on(&branch) {
            let Some(rest) = file.path.strip_prefix(&prefix) else {
                continue;
            };
            let entry = match rest.split_once('/') {
                Some((child, _)) => DirectoryEntry {
                    name: child.to_string(),
                    path: format!("{prefix}{child}"),
                    kind: EntryKind::Dir,
                    sha: fake_sha(&[prefix.as_str(), child]),
                    size: 0,
                },
                None => DirectoryEntry {
                    name: rest.to_string(),
                    path: file.path.clone(),
                    kind: EntryKind::File,
                    sha: file.sha.clone(),
                    size: file.size,
                },
            };
            entries.entry(entry.name.clone()).or_insert(entry);
        }

        if entries.is_empty() && !dir.is_empty() {
            return Err(VcsError::NotFound(format!("{repo}:{dir}")));
        }
        Ok(entries.into_values().collect())
    }

    async fn create_branch(
        &self,
        client: &AuthenticatedClient,
        repo: &RepoRef,
        name: &str,
        from_ref: &str,
    ) -> Result<Branch> {
        self.enter(MockOperation::CreateBranch, client, Some(repo)).await?;
        let mut state = lock(&self.state);
        if state.branches.iter().any(|b| b.name == name) {
            return Err(VcsError::Provider {
                provider: self.id,
                message: format!("reference already exists: {name}"),
            });
        }
        let (source, sha) = state
            .branches
            .iter()
            .find(|b| b.name == from_ref || b.sha == from_ref)
            .map(|b| (b.name.clone(), b.sha.clone()))
            .ok_or_else(|| VcsError::NotFound(format!("{repo}@{from_ref}")))?;
        let copied: Vec<_> = state
            .files_on(&source)
            .map(|f| ((name.to_string(), f.path.clone()), f.clone()))
            .collect();
        state.files.extend(copied);
        let branch = Branch {
            name: name.to_string(),
            sha,
            protected: false,
        };
        state.branches.push(branch.clone());
        Ok(branch)
    }

    async fn update_file(
        &self,
        client: &AuthenticatedClient,
        repo: &RepoRef,
        update: &FileUpdate,
    ) -> Result<FileCommit> {
        self.enter(MockOperation::UpdateFile, client, Some(repo)).await?;
        let mut state = lock(&self.state);
        if !state.branches.iter().any(|b| b.name == update.branch) {
            return Err(VcsError::NotFound(format!("{repo}@{}", update.branch)));
        }
        let path = normalize_path(&update.path);
        if path.is_empty() {
            return Err(VcsError::Provider {
                provider: self.id,
                message: "file path is empty".into(),
            });
        }
        let key = (update.branch.clone(), path.clone());
        let previous = state
            .files
            .get(&key)
            .map(|f| f.sha.clone())
            .unwrap_or_default();
        let sha = fake_sha(&[path.as_str(), update.content.as_str()]);
        let commit_sha = fake_sha(&[
            update.branch.as_str(),
            previous.as_str(),
            sha.as_str(),
            update.message.as_str(),
        ]);

        state.files.insert(
            key,
            FileContent {
                path: path.clone(),
                sha: sha.clone(),
                content: update.content.clone(),
                size: update.content.len() as u64,
            },
        );
        if let Some(branch) = state.branches.iter_mut().find(|b| b.name == update.branch) {
            branch.sha.clone_from(&commit_sha);
        }
        Ok(FileCommit {
            path,
            sha,
            commit_sha,
            commit_url: None,
        })
    }

    async fn list_branches(
        &self,
        client: &AuthenticatedClient,
        repo: &RepoRef,
    ) -> Result<Vec<Branch>> {
        self.enter(MockOperation::ListBranches, client, Some(repo)).await?;
        Ok(lock(&self.state).branches.clone())
    }

    async fn list_pull_requests(
        &self,
        client: &AuthenticatedClient,
        repo: &RepoRef,
        state: StateFilter,
    ) -> Result<Vec<PullRequest>> {
        self.enter(MockOperation::ListPullRequests, client, Some(repo)).await?;
        Ok(lock(&self.state)
            .pull_requests
            .iter()
            .filter(|p| match state {
                StateFilter::Open => p.state == PullRequestState::Open,
                StateFilter::Closed => p.state != PullRequestState::Open,
                StateFilter::All => true,
            })
            .cloned()
            .collect())
    }

    async fn get_pull_request(
        &self,
        client: &AuthenticatedClient,
        repo: &RepoRef,
        number: u64,
    ) -> Result<PullRequest> {
        self.enter(MockOperation::GetPullRequest, client, Some(repo)).await?;
        Self::find_pull(&lock(&self.state), repo, number)
    }

    async fn create_pull_request(
        &self,
        client: &AuthenticatedClient,
        repo: &RepoRef,
        pr: &NewPullRequest,
    ) -> Result<PullRequest> {
        self.enter(MockOperation::CreatePullRequest, client, Some(repo)).await?;
        let mut state = lock(&self.state);
        let head_sha = state
            .branches
            .iter()
            .find(|b| b.name == pr.head)
            .map(|b| b.sha.clone())
            .ok_or_else(|| VcsError::NotFound(format!("{repo}@{}", pr.head)))?;
        let number = state
            .pull_requests
            .iter()
            .map(|p| p.number)
            .chain(state.issues.iter().map(|i| i.number))
            .max()
            .unwrap_or(0)
            + 1;
        let created = PullRequest {
            number,
            title: pr.title.clone(),
            body: pr.body.clone(),
            state: PullRequestState::Open,
            draft: pr.draft,
            author: MOCK_LOGIN.into(),
            head_ref: pr.head.clone(),
            head_sha,
            base_ref: pr.base.clone(),
            url: format!("https://vcs.example.com/{repo}/pull/{number}"),
            created_at: fixed_time(),
            updated_at: fixed_time(),
        };
        state.pull_requests.push(created.clone());
        Ok(created)
    }

    async fn list_pull_request_reviews(
        &self,
        client: &AuthenticatedClient,
        repo: &RepoRef,
        number: u64,
    ) -> Result<Vec<Review>> {
        self.enter(MockOperation::ListReviews, client, Some(repo)).await?;
        Ok(lock(&self.state)
            .reviews
            .iter()
            .filter(|(n, _)| *n == number)
            .map(|(_, r)| r.clone())
            .collect())
    }

    async fn list_pull_request_comments(
        &self,
        client: &AuthenticatedClient,
        repo: &RepoRef,
        number: u64,
    ) -> Result<Vec<Comment>> {
        self.enter(MockOperation::ListComments, client, Some(repo)).await?;
        Ok(lock(&self.state)
            .comments
            .iter()
            .filter(|(n, _)| *n == number)
            .map(|(_, c)| c.clone())
            .collect())
    }

    async fn create_pull_request_comment(
        &self,
        client: &AuthenticatedClient,
        repo: &RepoRef,
        number: u64,
        body: &str,
    ) -> Result<Comment> {
        self.enter(MockOperation::CreateComment, client, Some(repo)).await?;
        let mut state = lock(&self.state);
        Self::find_pull(&state, repo, number)?;
        state.next_comment_id += 1;
        let comment = Comment {
            id: state.next_comment_id.to_string(),
            author: MOCK_LOGIN.into(),
            body: body.to_string(),
            url: None,
            created_at: fixed_time(),
            updated_at: fixed_time(),
        };
        state.comments.push((number, comment.clone()));
        Ok(comment)
    }

    async fn update_pull_request_comment(
        &self,
        client: &AuthenticatedClient,
        repo: &RepoRef,
        comment_id: &str,
        body: &str,
    ) -> Result<Comment> {
        self.enter(MockOperation::UpdateComment, client, Some(repo)).await?;
        let mut state = lock(&self.state);
        let (_, comment) = state
            .comments
            .iter_mut()
            .find(|(_, c)| c.id == comment_id)
            .ok_or_else(|| VcsError::NotFound(format!("comment {comment_id}")))?;
        comment.body = body.to_string();
        comment.updated_at = fixed_time().map(|t| t + chrono::Duration::minutes(1));
        Ok(comment.clone())
    }

    async fn delete_pull_request_comment(
        &self,
        client: &AuthenticatedClient,
        repo: &RepoRef,
        comment_id: &str,
    ) -> Result<()> {
        self.enter(MockOperation::DeleteComment, client, Some(repo)).await?;
        let mut state = lock(&self.state);
        let before = state.comments.len();
        state.comments.retain(|(_, c)| c.id != comment_id);
        if state.comments.len() == before {
            return Err(VcsError::NotFound(format!("comment {comment_id}")));
        }
        Ok(())
    }

    async fn get_ci_status(
        &self,
        client: &AuthenticatedClient,
        repo: &RepoRef,
        number: u64,
    ) -> Result<CiStatusSummary> {
        self.enter(MockOperation::GetCiStatus, client, Some(repo)).await?;
        Self::find_pull(&lock(&self.state), repo, number)?;
        Ok(ci::normalize(&self.check_runs, &self.statuses))
    }

    async fn list_issues(
        &self,
        client: &AuthenticatedClient,
        repo: &RepoRef,
        state: StateFilter,
    ) -> Result<Vec<Issue>> {
        self.enter(MockOperation::ListIssues, client, Some(repo)).await?;
        Ok(lock(&self.state)
            .issues
            .iter()
            .filter(|i| match state {
                StateFilter::Open => i.state == IssueState::Open,
                StateFilter::Closed => i.state == IssueState::Closed,
                StateFilter::All => true,
            })
            .cloned()
            .collect())
    }

    /// Accepts GitHub-shaped deliveries.
    fn parse_webhook_event(&self, headers: &WebhookHeaders, payload: &[u8]) -> Result<WebhookEvent> {
        webhook::parse_github_event(headers, payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vcsgate_types::CiState;

    fn repo() -> RepoRef {
        RepoRef::new("mock-org", "mock-repo")
    }

    fn setup() -> (MockProvider, AuthenticatedClient) {
        let p = MockProvider::new(ProviderId::GitHub);
        let c = p.client(&TokenData::new("tok"));
        (p, c)
    }

    #[tokio::test]
    async fn test_canned_reads() {
        let (p, c) = setup();
        assert_eq!(p.list_repositories(&c).await.unwrap().len(), 1);
        assert_eq!(p.get_repository(&c, &repo()).await.unwrap().full_name, "mock-org/mock-repo");
        assert_eq!(p.list_branches(&c, &repo()).await.unwrap().len(), 2);
        let open = p.list_issues(&c, &repo(), StateFilter::Open).await.unwrap();
        assert_eq!(open.len(), 1);
        let all = p.list_issues(&c, &repo(), StateFilter::All).await.unwrap();
        assert_eq!(all.len(), 2);
        assert!(p.check_connection(&c).await.unwrap().connected);
    }

    #[tokio::test]
    async fn test_call_log_records_token_and_repo() {
        let (p, c) = setup();
        p.list_branches(&c, &repo()).await.unwrap();
        let calls = p.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].operation, MockOperation::ListBranches);
        assert_eq!(calls[0].token.as_deref(), Some("tok"));
        assert_eq!(calls[0].repo, Some(repo()));
        p.clear_calls();
        assert!(p.calls().is_empty());
    }

    #[tokio::test]
    async fn test_injected_error_only_hits_that_operation() {
        let p = MockProvider::new(ProviderId::GitLab).with_error(MockOperation::ListIssues, "boom");
        let c = p.client(&TokenData::new("tok"));
        let err = p.list_issues(&c, &repo(), StateFilter::All).await.unwrap_err();
        assert_eq!(err.to_string(), "gitlab provider error: boom");
        assert!(p.list_branches(&c, &repo()).await.is_ok());
    }

    #[tokio::test]
    async fn test_wrong_client_rejected_and_logged() {
        let p = MockProvider::new(ProviderId::GitHub);
        let other = MockProvider::new(ProviderId::GitLab).client(&TokenData::new("x"));
        let err = p.list_repositories(&other).await.unwrap_err();
        assert!(matches!(err, VcsError::ClientMismatch { .. }));
        assert_eq!(p.calls()[0].token, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_latency_applied() {
        let p = MockProvider::new(ProviderId::GitHub).with_latency(Duration::from_millis(250));
        let c = p.client(&TokenData::new("tok"));
        let start = tokio::time::Instant::now();
        p.list_repositories(&c).await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(250));
    }

    #[tokio::test]
    async fn test_file_roundtrip_and_directory() {
        let (p, c) = setup();
        assert!(p.get_file_content(&c, &repo(), "missing.txt", None).await.unwrap().is_none());

        let readme = p
            .get_file_content(&c, &repo(), "README.md", Some("main"))
            .await
            .unwrap()
            .unwrap();
        let commit = p
            .update_file(
                &c,
                &repo(),
                &FileUpdate {
                    path: "README.md".into(),
                    branch: "main".into(),
                    content: "# Updated\n".into(),
                    message: "docs: update readme".into(),
                },
            )
            .await
            .unwrap();
        assert_ne!(commit.sha, readme.sha);
        let updated = p
            .get_file_content(&c, &repo(), "README.md", None)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.content, "# Updated\n");

        let root = p.get_directory(&c, &repo(), "", None).await.unwrap();
        let names: Vec<_> = root.iter().map(|e| (e.name.as_str(), e.kind)).collect();
        assert_eq!(names, vec![("README.md", EntryKind::File), ("src", EntryKind::Dir)]);
        let src = p.get_directory(&c, &repo(), "src", None).await.unwrap();
        assert_eq!(src.len(), 2);
        assert!(p.get_directory(&c, &repo(), "nope", None).await.is_err());
    }

    #[tokio::test]
    async fn test_file_writes_are_per_branch() {
        let (p, c) = setup();
        p.create_branch(&c, &repo(), "topic", "main").await.unwrap();
        let inherited = p
            .get_file_content(&c, &repo(), "README.md", Some("topic"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(inherited.content, "# Mock repository\n");

        let commit = p
            .update_file(
                &c,
                &repo(),
                &FileUpdate {
                    path: "/docs//notes.md".into(),
                    branch: "topic".into(),
                    content: "notes\n".into(),
                    message: "docs: notes".into(),
                },
            )
            .await
            .unwrap();
        assert_eq!(commit.path, "docs/notes.md");
        p.update_file(
            &c,
            &repo(),
            &FileUpdate {
                path: "README.md".into(),
                branch: "topic".into(),
                content: "# Topic\n".into(),
                message: "docs: topic readme".into(),
            },
        )
        .await
        .unwrap();

        let on_topic = p
            .get_file_content(&c, &repo(), "docs/notes.md", Some("refs/heads/topic"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(on_topic.content, "notes\n");
        assert!(p.get_file_content(&c, &repo(), "docs/notes.md", None).await.unwrap().is_none());
        let main_readme = p
            .get_file_content(&c, &repo(), "README.md", Some("main"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(main_readme.content, "# Mock repository\n");

        let topic_root = p.get_directory(&c, &repo(), "/", Some("topic")).await.unwrap();
        assert!(topic_root.iter().any(|e| e.name == "docs" && e.kind == EntryKind::Dir));
        let main_root = p.get_directory(&c, &repo(), "", None).await.unwrap();
        assert!(main_root.iter().all(|e| e.name != "docs"));

        assert!(p.get_file_content(&c, &repo(), "README.md", Some("gone")).await.unwrap().is_none());
        assert!(p.get_directory(&c, &repo(), "", Some("gone")).await.is_err());
    }

    #[tokio::test]
    async fn test_branch_and_pull_request_creation() {
        let (p, c) = setup();
        let branch = p.create_branch(&c, &repo(), "topic", "main").await.unwrap();
        let main_sha = p.list_branches(&c, &repo()).await.unwrap()[0].sha.clone();
        assert_eq!(branch.sha, main_sha);
        assert!(p.create_branch(&c, &repo(), "topic", "main").await.is_err());

        let pr = p
            .create_pull_request(
                &c,
                &repo(),
                &NewPullRequest {
                    title: "Topic".into(),
                    head: "topic".into(),
                    base: "main".into(),
                    body: None,
                    draft: true,
                },
            )
            .await
            .unwrap();
        assert_eq!(pr.number, 4);
        assert!(pr.draft);
        let open = p.list_pull_requests(&c, &repo(), StateFilter::Open).await.unwrap();
        assert_eq!(open.len(), 2);
    }

    #[tokio::test]
    async fn test_comment_lifecycle() {
        let (p, c) = setup();
        let created = p.create_pull_request_comment(&c, &repo(), 1, "first").await.unwrap();
        let updated = p
            .update_pull_request_comment(&c, &repo(), &created.id, "edited")
            .await
            .unwrap();
        assert_eq!(updated.body, "edited");
        assert_eq!(p.list_pull_request_comments(&c, &repo(), 1).await.unwrap().len(), 1);

        p.delete_pull_request_comment(&c, &repo(), &created.id).await.unwrap();
        assert!(p.list_pull_request_comments(&c, &repo(), 1).await.unwrap().is_empty());
        assert!(p.delete_pull_request_comment(&c, &repo(), &created.id).await.is_err());
        assert!(p.create_pull_request_comment(&c, &repo(), 99, "x").await.is_err());
    }

    #[tokio::test]
    async fn test_ci_status_uses_configured_inputs() {
        let (p, c) = setup();
        assert_eq!(p.get_ci_status(&c, &repo(), 1).await.unwrap().overall, CiState::Passing);

        let p = p.with_ci(
            Vec::new(),
            vec![CommitStatus {
                id: 9,
                context: "ci/circleci".into(),
                state: "pending".into(),
                target_url: None,
                description: None,
                created_at: None,
                updated_at: None,
            }],
        );
        let summary = p.get_ci_status(&c, &repo(), 1).await.unwrap();
        assert_eq!(summary.overall, CiState::Pending);
        assert!(p.get_ci_status(&c, &repo(), 42).await.is_err());
    }

    #[tokio::test]
    async fn test_authenticate_returns_fallback_client() {
        let p = MockProvider::new(ProviderId::Bitbucket);
        let client = p.authenticate(&TokenSource::from("u")).await.unwrap();
        assert_eq!(
            client.as_mock(ProviderId::Bitbucket).unwrap().token,
            MOCK_FALLBACK_TOKEN
        );
        assert_eq!(p.operations(), vec![MockOperation::Authenticate]);
    }
}
