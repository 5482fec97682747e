//! GitHub provider over the REST v3 API.
//!
//! Auth: `Authorization: Bearer <token>` with the versioned JSON media type.
//! The API base is configurable so GitHub Enterprise hosts work unchanged.
use crate::{
    ci::{self, CheckRun, CommitStatus},
    client::{AuthenticatedClient, GitHubClient},
    http_util::ProviderHttp,
    traits::{VcsProvider, WebhookHeaders},
    webhook,
};
use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use chrono::{DateTime, Utc};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use rquest::RequestBuilder;
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::json;
use vcsgate_config::ProviderConfig;
use vcsgate_types::{
    Branch, CiStatusSummary, Comment, ConnectionStatus, DirectoryEntry, EntryKind, FileCommit,
    FileContent, FileUpdate, Issue, IssueState, NewPullRequest, ProviderId, PullRequest, RepoRef,
    Repository, Result, Review, ReviewState, StateFilter, TokenData, TokenSource, VcsError,
    WebhookEvent,
};

/// Public GitHub API base URL.
pub const DEFAULT_API_BASE: &str = "https://api.github.com";

const MEDIA_TYPE: &str = "application/vnd.github+json";
const API_VERSION: &str = "2022-11-28";
const USER_AGENT: &str = concat!("vcsgate/", env!("CARGO_PKG_VERSION"));
const PER_PAGE: &str = "100";
/// Upper bound on pages followed for one listing.
const MAX_PAGES: usize = 10;

/// Everything outside the RFC 3986 unreserved set is escaped in a segment.
const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

pub struct GitHubProvider {
    http: ProviderHttp,
    api_base: String,
    fallback_token: Option<String>,
}

impl GitHubProvider {
    #[must_use]
    pub fn new(http: rquest::Client) -> Self {
        Self {
            http: ProviderHttp::new(http),
            api_base: DEFAULT_API_BASE.to_string(),
            fallback_token: None,
        }
    }

    #[must_use]
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    /// Static token used by [`VcsProvider::authenticate`].
    #[must_use]
    pub fn with_fallback_token(mut self, token: impl Into<String>) -> Self {
        self.fallback_token = Some(token.into());
        self
    }

    /// Build from configuration, resolving `fallback_token_env` from the
    /// process environment.
    #[must_use]
    pub fn from_config(config: &ProviderConfig, http: rquest::Client) -> Self {
        let mut provider = Self::new(http);
        if let Some(base) = &config.api_base {
            provider = provider.with_api_base(base);
        }
        if let Some(token) = config
            .fallback_token_env
            .as_deref()
            .and_then(|name| std::env::var(name).ok())
            .filter(|t| !t.is_empty())
        {
            provider = provider.with_fallback_token(token);
        }
        provider
    }

    #[must_use]
    pub fn api_base(&self) -> &str {
        &self.api_base
    }
}

// ── Request building ──────────────────────────────────────────────────────────

impl GitHubClient {
    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.api_base)
    }

    fn authed(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("authorization", format!("Bearer {}", self.token))
            .header("accept", MEDIA_TYPE)
            .header("x-github-api-version", API_VERSION)
            .header("user-agent", USER_AGENT)
    }

    fn get(&self, path: &str) -> RequestBuilder {
        self.authed(self.http.client().get(self.url(path)))
    }

    fn post(&self, path: &str) -> RequestBuilder {
        self.authed(self.http.client().post(self.url(path)))
    }

    fn put(&self, path: &str) -> RequestBuilder {
        self.authed(self.http.client().put(self.url(path)))
    }

    fn patch(&self, path: &str) -> RequestBuilder {
        self.authed(self.http.client().patch(self.url(path)))
    }

    fn delete(&self, path: &str) -> RequestBuilder {
        self.authed(self.http.client().delete(self.url(path)))
    }

    /// GET `path` and every page after it, flattening each page with `items`.
    ///
    /// Only `next` links under the API base are followed, and at most
    /// [`MAX_PAGES`] pages are read.
    async fn get_all<T, I, F>(&self, path: &str, items: F) -> Result<Vec<I>>
    where
        T: DeserializeOwned + Send,
        I: Send,
        F: Fn(T) -> Vec<I> + Send,
    {
        let mut out = Vec::new();
        let mut request = self.get(path);
        for page in 1..=MAX_PAGES {
            let (body, next) = self.http.send_json_paged::<T>(request).await?;
            out.extend(items(body));
            let Some(next) = next else {
                return Ok(out);
            };
            let under_base = next
                .strip_prefix(self.api_base.as_str())
                .is_some_and(|rest| rest.starts_with('/'));
            if !under_base {
                tracing::warn!(%next, "ignoring pagination link outside the API base");
                return Ok(out);
            }
            if page == MAX_PAGES {
                tracing::warn!(path, pages = MAX_PAGES, "page limit reached, results truncated");
                break;
            }
            request = self.authed(self.http.client().get(next));
        }
        Ok(out)
    }
}

/// Append a URL-encoded query string to `path`.
fn with_query(path: &str, params: &[(&str, &str)]) -> Result<String> {
    if params.is_empty() {
        return Ok(path.to_string());
    }
    let query = serde_urlencoded::to_string(params)
        .map_err(|e| VcsError::Http(format!("failed to encode query: {e}")))?;
    Ok(format!("{path}?{query}"))
}

fn segment(s: &str) -> String {
    utf8_percent_encode(s, SEGMENT).to_string()
}

/// Escape each `/`-separated part of `path`, keeping the separators.
fn segments(path: &str) -> String {
    path.split('/').map(segment).collect::<Vec<_>>().join("/")
}

fn repo_path(repo: &RepoRef) -> String {
    format!("/repos/{}/{}", segment(&repo.owner), segment(&repo.name))
}

fn contents_path(repo: &RepoRef, path: &str, git_ref: Option<&str>) -> Result<String> {
    let base = format!(
        "{}/contents/{}",
        repo_path(repo),
        segments(path.trim_start_matches('/'))
    );
    match git_ref {
        Some(r) => with_query(&base, &[("ref", r)]),
        None => Ok(base),
    }
}

fn comment_path(repo: &RepoRef, comment_id: &str) -> String {
    format!("{}/issues/comments/{}", repo_path(repo), segment(comment_id))
}

fn looks_like_sha(s: &str) -> bool {
    s.len() == 40 && s.bytes().all(|b| b.is_ascii_hexdigit())
}

// ── Wire types ────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct GhUser {
    login: String,
}

fn login(user: Option<GhUser>) -> String {
    user.map(|u| u.login).unwrap_or_else(|| "ghost".to_string())
}

#[derive(Deserialize)]
struct GhRepo {
    id: u64,
    name: String,
    full_name: String,
    owner: GhUser,
    #[serde(default)]
    private: bool,
    #[serde(default)]
    default_branch: Option<String>,
    #[serde(default)]
    description: Option<String>,
    html_url: String,
}

impl From<GhRepo> for Repository {
    fn from(r: GhRepo) -> Self {
        Self {
            id: r.id.to_string(),
            owner: r.owner.login,
            name: r.name,
            full_name: r.full_name,
            private: r.private,
            default_branch: r.default_branch,
            description: r.description,
            url: r.html_url,
        }
    }
}

#[derive(Deserialize)]
struct GhContent {
    #[serde(rename = "type")]
    kind: String,
    name: String,
    path: String,
    sha: String,
    #[serde(default)]
    size: u64,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    encoding: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum GhContents {
    Dir(Vec<GhContent>),
    Entry(GhContent),
}

fn entry_kind(kind: &str) -> EntryKind {
    match kind {
        "dir" => EntryKind::Dir,
        "symlink" => EntryKind::Symlink,
        "submodule" => EntryKind::Submodule,
        _ => EntryKind::File,
    }
}

/// Decode the base64 `content` field of a file response.
fn decode_content(entry: GhContent) -> Result<FileContent> {
    let raw = entry.content.unwrap_or_default();
    let content = match entry.encoding.as_deref() {
        Some("base64") | None => {
            let compact: String = raw.split_whitespace().collect();
            let bytes = STANDARD.decode(compact).map_err(|e| VcsError::Provider {
                provider: ProviderId::GitHub,
                message: format!("invalid base64 content for {}: {e}", entry.path),
            })?;
            String::from_utf8_lossy(&bytes).into_owned()
        }
        Some(_) => raw,
    };
    Ok(FileContent {
        path: entry.path,
        sha: entry.sha,
        content,
        size: entry.size,
    })
}

#[derive(Deserialize)]
struct GhBranchCommit {
    sha: String,
}

#[derive(Deserialize)]
struct GhBranch {
    name: String,
    commit: GhBranchCommit,
    #[serde(default)]
    protected: bool,
}

#[derive(Deserialize)]
struct GhGitObject {
    sha: String,
}

#[derive(Deserialize)]
struct GhGitRef {
    object: GhGitObject,
}

#[derive(Deserialize)]
struct GhPutContent {
    path: String,
    sha: String,
}

#[derive(Deserialize)]
struct GhPutCommit {
    sha: String,
    #[serde(default)]
    html_url: Option<String>,
}

#[derive(Deserialize)]
struct GhPutResponse {
    content: GhPutContent,
    commit: GhPutCommit,
}

#[derive(Deserialize)]
struct GhPullRef {
    #[serde(rename = "ref")]
    name: String,
    sha: String,
}

#[derive(Deserialize)]
struct GhPull {
    number: u64,
    title: String,
    #[serde(default)]
    body: Option<String>,
    state: String,
    #[serde(default)]
    draft: bool,
    #[serde(default)]
    merged_at: Option<DateTime<Utc>>,
    #[serde(default)]
    user: Option<GhUser>,
    head: GhPullRef,
    base: GhPullRef,
    html_url: String,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    updated_at: Option<DateTime<Utc>>,
}

impl From<GhPull> for PullRequest {
    fn from(p: GhPull) -> Self {
        Self {
            number: p.number,
            title: p.title,
            body: p.body,
            state: webhook::pull_state(&p.state, p.merged_at.is_some()),
            draft: p.draft,
            author: login(p.user),
            head_ref: p.head.name,
            head_sha: p.head.sha,
            base_ref: p.base.name,
            url: p.html_url,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

#[derive(Deserialize)]
struct GhReview {
    id: u64,
    #[serde(default)]
    user: Option<GhUser>,
    state: String,
    #[serde(default)]
    body: Option<String>,
    #[serde(default)]
    submitted_at: Option<DateTime<Utc>>,
}

fn review_state(state: &str) -> ReviewState {
    match state.to_uppercase().as_str() {
        "APPROVED" => ReviewState::Approved,
        "CHANGES_REQUESTED" => ReviewState::ChangesRequested,
        "DISMISSED" => ReviewState::Dismissed,
        "PENDING" => ReviewState::Pending,
        _ => ReviewState::Commented,
    }
}

impl From<GhReview> for Review {
    fn from(r: GhReview) -> Self {
        Self {
            id: r.id.to_string(),
            author: login(r.user),
            state: review_state(&r.state),
            body: r.body.filter(|b| !b.is_empty()),
            submitted_at: r.submitted_at,
        }
    }
}

#[derive(Deserialize)]
struct GhComment {
    id: u64,
    #[serde(default)]
    user: Option<GhUser>,
    #[serde(default)]
    body: String,
    #[serde(default)]
    html_url: Option<String>,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    updated_at: Option<DateTime<Utc>>,
}

impl From<GhComment> for Comment {
    fn from(c: GhComment) -> Self {
        Self {
            id: c.id.to_string(),
            author: login(c.user),
            body: c.body,
            url: c.html_url,
            created_at: c.created_at,
            updated_at: c.updated_at,
        }
    }
}

#[derive(Deserialize)]
struct GhLabel {
    name: String,
}

#[derive(Deserialize)]
struct GhIssue {
    number: u64,
    title: String,
    #[serde(default)]
    body: Option<String>,
    state: String,
    #[serde(default)]
    user: Option<GhUser>,
    #[serde(default)]
    labels: Vec<GhLabel>,
    html_url: String,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
    /// Present when the "issue" is really a pull request.
    #[serde(default)]
    pull_request: Option<serde_json::Value>,
}

impl From<GhIssue> for Issue {
    fn from(i: GhIssue) -> Self {
        Self {
            number: i.number,
            title: i.title,
            body: i.body,
            state: if i.state.eq_ignore_ascii_case("open") {
                IssueState::Open
            } else {
                IssueState::Closed
            },
            author: login(i.user),
            labels: i.labels.into_iter().map(|l| l.name).collect(),
            url: i.html_url,
            created_at: i.created_at,
        }
    }
}

fn issues_only(raw: Vec<GhIssue>) -> Vec<Issue> {
    raw.into_iter()
        .filter(|i| i.pull_request.is_none())
        .map(Issue::from)
        .collect()
}

#[derive(Deserialize)]
struct GhCheckRuns {
    #[serde(default)]
    check_runs: Vec<CheckRun>,
}

#[derive(Deserialize)]
struct GhCombinedStatus {
    #[serde(default)]
    statuses: Vec<CommitStatus>,
}

// ── Provider ──────────────────────────────────────────────────────────────────

#[async_trait]
impl VcsProvider for GitHubProvider {
    fn id(&self) -> ProviderId {
        ProviderId::GitHub
    }

    fn name(&self) -> &'static str {
        "GitHub"
    }

    fn client(&self, tokens: &TokenData) -> AuthenticatedClient {
        AuthenticatedClient::GitHub(GitHubClient::new(
            self.http.clone(),
            self.api_base.clone(),
            tokens.access_token.clone(),
        ))
    }

    async fn authenticate(&self, source: &TokenSource) -> Result<AuthenticatedClient> {
        match &self.fallback_token {
            Some(token) => {
                tracing::debug!(%source, "using configured fallback token");
                Ok(self.client(&TokenData::new(token.clone())))
            }
            None => Err(VcsError::ReauthRequired {
                token_source: source.clone(),
                provider: ProviderId::GitHub,
            }),
        }
    }

    async fn check_connection(&self, client: &AuthenticatedClient) -> Result<ConnectionStatus> {
        let c = client.as_github()?;
        match c.http.send_json::<GhUser>(c.get("/user")).await {
            Ok(user) => Ok(ConnectionStatus {
                connected: true,
                login: Some(user.login),
                error: None,
            }),
            Err(e) => {
                tracing::warn!(error = %e, "GitHub connection check failed");
                Ok(ConnectionStatus {
                    connected: false,
                    login: None,
                    error: Some(e.to_string()),
                })
            }
        }
    }

    async fn list_repositories(&self, client: &AuthenticatedClient) -> Result<Vec<Repository>> {
        let c = client.as_github()?;
        let path = with_query("/user/repos", &[("per_page", PER_PAGE), ("sort", "updated")])?;
        let repos: Vec<GhRepo> = c.http.send_json(c.get(&path)).await?;
        Ok(repos.into_iter().map(Repository::from).collect())
    }

    async fn get_repository(
        &self,
        client: &AuthenticatedClient,
        repo: &RepoRef,
    ) -> Result<Repository> {
        let c = client.as_github()?;
        let r: GhRepo = c.http.send_json(c.get(&repo_path(repo))).await?;
        Ok(r.into())
    }

    async fn get_file_content(
        &self,
        client: &AuthenticatedClient,
        repo: &RepoRef,
        path: &str,
        git_ref: Option<&str>,
    ) -> Result<Option<FileContent>> {
        let c = client.as_github()?;
        let url = contents_path(repo, path, git_ref)?;
        match c.http.send_json_optional::<GhContents>(c.get(&url)).await? {
            None => Ok(None),
            Some(GhContents::Entry(entry)) if entry.kind == "file" => decode_content(entry).map(Some),
            Some(_) => Err(VcsError::Provider {
                provider: ProviderId::GitHub,
                message: format!("{path} in {repo} is not a file"),
            }),
        }
    }

    async fn get_directory(
        &self,
        client: &AuthenticatedClient,
        repo: &RepoRef,
        path: &str,
        git_ref: Option<&str>,
    ) -> Result<Vec<DirectoryEntry>> {
        let c = client.as_github()?;
        let url = contents_path(repo, path, git_ref)?;
        match c.http.send_json_optional::<GhContents>(c.get(&url)).await? {
            Some(GhContents::Dir(entries)) => Ok(entries
                .into_iter()
                .map(|e| DirectoryEntry {
                    kind: entry_kind(&e.kind),
                    name: e.name,
                    path: e.path,
                    sha: e.sha,
                    size: e.size,
                })
                .collect()),
            Some(GhContents::Entry(_)) => Err(VcsError::Provider {
                provider: ProviderId::GitHub,
                message: format!("{path} in {repo} is not a directory"),
            }),
            None => Err(VcsError::NotFound(format!("{repo}:{path}"))),
        }
    }

    async fn create_branch(
        &self,
        client: &AuthenticatedClient,
        repo: &RepoRef,
        name: &str,
        from_ref: &str,
    ) -> Result<Branch> {
        let c = client.as_github()?;
        let base_sha = if looks_like_sha(from_ref) {
            from_ref.to_string()
        } else {
            let branch = from_ref.trim_start_matches("refs/heads/");
            let path = format!("{}/git/ref/heads/{}", repo_path(repo), segments(branch));
            let r: GhGitRef = c.http.send_json(c.get(&path)).await?;
            r.object.sha
        };

        let path = format!("{}/git/refs", repo_path(repo));
        let body = json!({ "ref": format!("refs/heads/{name}"), "sha": base_sha });
        let created: GhGitRef = c.http.send_json(c.post(&path).json(&body)).await?;
        tracing::info!(%repo, branch = name, "branch created");
        Ok(Branch {
            name: name.to_string(),
            sha: created.object.sha,
            protected: false,
        })
    }

    async fn update_file(
        &self,
        client: &AuthenticatedClient,
        repo: &RepoRef,
        update: &FileUpdate,
    ) -> Result<FileCommit> {
        let c = client.as_github()?;
        let existing = self
            .get_file_content(client, repo, &update.path, Some(&update.branch))
            .await?;

        let mut body = json!({
            "message": update.message,
            "content": STANDARD.encode(update.content.as_bytes()),
            "branch": update.branch,
        });
        if let Some(current) = existing {
            body["sha"] = json!(current.sha);
        }

        let path = contents_path(repo, &update.path, None)?;
        let resp: GhPutResponse = c.http.send_json(c.put(&path).json(&body)).await?;
        Ok(FileCommit {
            path: resp.content.path,
            sha: resp.content.sha,
            commit_sha: resp.commit.sha,
            commit_url: resp.commit.html_url,
        })
    }

    async fn list_branches(
        &self,
        client: &AuthenticatedClient,
        repo: &RepoRef,
    ) -> Result<Vec<Branch>> {
        let c = client.as_github()?;
        let path = with_query(&format!("{}/branches", repo_path(repo)), &[("per_page", PER_PAGE)])?;
        let branches: Vec<GhBranch> = c.http.send_json(c.get(&path)).await?;
        Ok(branches
            .into_iter()
            .map(|b| Branch {
                name: b.name,
                sha: b.commit.sha,
                protected: b.protected,
            })
            .collect())
    }

    async fn list_pull_requests(
        &self,
        client: &AuthenticatedClient,
        repo: &RepoRef,
        state: StateFilter,
    ) -> Result<Vec<PullRequest>> {
        let c = client.as_github()?;
        let path = with_query(
            &format!("{}/pulls", repo_path(repo)),
            &[("state", state.as_str()), ("per_page", PER_PAGE)],
        )?;
        let pulls: Vec<GhPull> = c.http.send_json(c.get(&path)).await?;
        Ok(pulls.into_iter().map(PullRequest::from).collect())
    }

    async fn get_pull_request(
        &self,
        client: &AuthenticatedClient,
        repo: &RepoRef,
        number: u64,
    ) -> Result<PullRequest> {
        let c = client.as_github()?;
        let path = format!("{}/pulls/{number}", repo_path(repo));
        let pull: GhPull = c.http.send_json(c.get(&path)).await?;
        Ok(pull.into())
    }

    async fn create_pull_request(
        &self,
        client: &AuthenticatedClient,
        repo: &RepoRef,
        pr: &NewPullRequest,
    ) -> Result<PullRequest> {
        let c = client.as_github()?;
        let path = format!("{}/pulls", repo_path(repo));
        let body = json!({
            "title": pr.title,
            "head": pr.head,
            "base": pr.base,
            "body": pr.body,
            "draft": pr.draft,
        });
        let pull: GhPull = c.http.send_json(c.post(&path).json(&body)).await?;
        tracing::info!(%repo, number = pull.number, "pull request created");
        Ok(pull.into())
    }

    async fn list_pull_request_reviews(
        &self,
        client: &AuthenticatedClient,
        repo: &RepoRef,
        number: u64,
    ) -> Result<Vec<Review>> {
        let c = client.as_github()?;
        let path = with_query(
            &format!("{}/pulls/{number}/reviews", repo_path(repo)),
            &[("per_page", PER_PAGE)],
        )?;
        let reviews: Vec<GhReview> = c.http.send_json(c.get(&path)).await?;
        Ok(reviews.into_iter().map(Review::from).collect())
    }

    async fn list_pull_request_comments(
        &self,
        client: &AuthenticatedClient,
        repo: &RepoRef,
        number: u64,
    ) -> Result<Vec<Comment>> {
        let c = client.as_github()?;
        let path = with_query(
            &format!("{}/issues/{number}/comments", repo_path(repo)),
            &[("per_page", PER_PAGE)],
        )?;
        let comments: Vec<GhComment> = c.http.send_json(c.get(&path)).await?;
        Ok(comments.into_iter().map(Comment::from).collect())
    }

    async fn create_pull_request_comment(
        &self,
        client: &AuthenticatedClient,
        repo: &RepoRef,
        number: u64,
        body: &str,
    ) -> Result<Comment> {
        let c = client.as_github()?;
        let path = format!("{}/issues/{number}/comments", repo_path(repo));
        let comment: GhComment = c
            .http
            .send_json(c.post(&path).json(&json!({ "body": body })))
            .await?;
        Ok(comment.into())
    }

    async fn update_pull_request_comment(
        &self,
        client: &AuthenticatedClient,
        repo: &RepoRef,
        comment_id: &str,
        body: &str,
    ) -> Result<Comment> {
        let c = client.as_github()?;
        let path = comment_path(repo, comment_id);
        let comment: GhComment = c
            .http
            .send_json(c.patch(&path).json(&json!({ "body": body })))
            .await?;
        Ok(comment.into())
    }

    async fn delete_pull_request_comment(
        &self,
        client: &AuthenticatedClient,
        repo: &RepoRef,
        comment_id: &str,
    ) -> Result<()> {
        let c = client.as_github()?;
        let path = comment_path(repo, comment_id);
        c.http.send(c.delete(&path)).await?;
        Ok(())
    }

    async fn get_ci_status(
        &self,
        client: &AuthenticatedClient,
        repo: &RepoRef,
        number: u64,
    ) -> Result<CiStatusSummary> {
        let c = client.as_github()?;
        let head_sha = self.get_pull_request(client, repo, number).await?.head_sha;
        let commit = format!("{}/commits/{}", repo_path(repo), segment(&head_sha));

        let paging = [("per_page", PER_PAGE), ("page", "1")];
        let runs_path = with_query(&format!("{commit}/check-runs"), &paging)?;
        let status_path = with_query(&format!("{commit}/status"), &paging)?;
        let (runs, statuses) = tokio::try_join!(
            c.get_all(&runs_path, |page: GhCheckRuns| page.check_runs),
            c.get_all(&status_path, |page: GhCombinedStatus| page.statuses),
        )?;

        Ok(ci::normalize(&runs, &statuses))
    }

    async fn list_issues(
        &self,
        client: &AuthenticatedClient,
        repo: &RepoRef,
        state: StateFilter,
    ) -> Result<Vec<Issue>> {
        let c = client.as_github()?;
        let path = with_query(
            &format!("{}/issues", repo_path(repo)),
            &[("state", state.as_str()), ("per_page", PER_PAGE)],
        )?;
        let raw: Vec<GhIssue> = c.http.send_json(c.get(&path)).await?;
        Ok(issues_only(raw))
    }

    fn parse_webhook_event(&self, headers: &WebhookHeaders, payload: &[u8]) -> Result<WebhookEvent> {
        webhook::parse_github_event(headers, payload)
    }
}
