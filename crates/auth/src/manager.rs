//! Provider-agnostic credential lifecycle manager.
//!
//! Responsibilities:
//! - Load credentials from the injected [`TokenStore`].
//! - Refresh them through the injected [`TokenRefresher`] when they are within
//!   the expiration buffer.
//! - Run at most one refresh per `(source, provider)` at a time; concurrent
//!   callers for the same pair await the same outcome.
//!
//! Credential problems never surface as errors from [`TokenManager::get_valid_token`];
//! they resolve to `None` so "needs re-authentication" is ordinary control flow.
use crate::env::{self, EnvSource};
use futures::future::{BoxFuture, FutureExt as _, Shared};
use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};
use vcsgate_types::{
    ProviderId, Result, TokenData, TokenKey, TokenRefresher, TokenSource, TokenStore, VcsError,
    now_millis,
};

/// Refresh tokens this long before they expire unless configured otherwise.
pub const DEFAULT_EXPIRATION_BUFFER: Duration = Duration::from_secs(5 * 60);

/// Informational callback invoked after a failed refresh.
pub type RefreshFailureHook = Arc<dyn Fn(&TokenSource, ProviderId, &VcsError) + Send + Sync>;

type PendingRefresh = Shared<BoxFuture<'static, Option<TokenData>>>;
type InFlight = Arc<Mutex<HashMap<TokenKey, PendingRefresh>>>;

fn lock(map: &Mutex<HashMap<TokenKey, PendingRefresh>>) -> MutexGuard<'_, HashMap<TokenKey, PendingRefresh>> {
    map.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Everything the manager is constructed from.
#[derive(bon::Builder)]
pub struct TokenManagerConfig {
    store: Arc<dyn TokenStore>,
    refresher: Arc<dyn TokenRefresher>,
    #[builder(default = DEFAULT_EXPIRATION_BUFFER)]
    expiration_buffer: Duration,
    #[builder(default = ProviderId::GitHub)]
    default_provider: ProviderId,
    /// Checked once, at construction.
    #[builder(default)]
    required_env_vars: Vec<String>,
    on_refresh_failure: Option<RefreshFailureHook>,
    #[builder(default)]
    env: EnvSource,
}

pub struct TokenManager {
    store: Arc<dyn TokenStore>,
    refresher: Arc<dyn TokenRefresher>,
    expiration_buffer: Duration,
    default_provider: ProviderId,
    on_refresh_failure: Option<RefreshFailureHook>,
    in_flight: InFlight,
}

impl TokenManager {
    /// Construct the manager, validating required environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`VcsError::MissingEnvVars`] naming every unset variable.
    pub fn new(config: TokenManagerConfig) -> Result<Self> {
        env::check_required(&config.required_env_vars, &config.env)?;
        Ok(Self {
            store: config.store,
            refresher: config.refresher,
            expiration_buffer: config.expiration_buffer,
            default_provider: config.default_provider,
            on_refresh_failure: config.on_refresh_failure,
            in_flight: Arc::new(Mutex::new(HashMap::new())),
        })
    }

    #[must_use]
    pub fn default_provider(&self) -> ProviderId {
        self.default_provider
    }

    #[must_use]
    pub fn expiration_buffer(&self) -> Duration {
        self.expiration_buffer
    }

    /// Return usable credentials for the pair, refreshing them first if they
    /// are within the expiration buffer.
    ///
    /// Returns `None` when nothing is stored, the refresh fails, or no refresh
    /// token is available.
    pub async fn get_valid_token(
        &self,
        source: &TokenSource,
        provider: ProviderId,
    ) -> Option<TokenData> {
        let key = TokenKey::new(source.clone(), provider);

        let pending = lock(&self.in_flight).get(&key).cloned();
        if let Some(pending) = pending {
            tracing::debug!(%key, "joining in-flight token refresh");
            return pending.await;
        }

        let current = match self.store.load(source, provider).await {
            Ok(Some(tokens)) => tokens,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(%source, %provider, error = %e, "failed to load tokens");
                return None;
            }
        };

        if !current.needs_refresh(self.expiration_buffer) {
            return Some(current);
        }

        self.refresh_once(key, current).await
    }

    /// Join the refresh already running for `key`, or start one.
    ///
    /// The check and the insert happen under one lock so two callers that
    /// both loaded an expiring token still share a single refresh.
    fn refresh_once(&self, key: TokenKey, current: TokenData) -> PendingRefresh {
        let mut in_flight = lock(&self.in_flight);
        if let Some(pending) = in_flight.get(&key) {
            return pending.clone();
        }

        let job = RefreshJob {
            key: key.clone(),
            current,
            store: Arc::clone(&self.store),
            refresher: Arc::clone(&self.refresher),
            on_failure: self.on_refresh_failure.clone(),
            in_flight: Arc::clone(&self.in_flight),
        };
        // Spawned so the refresh completes even if every caller goes away.
        let handle = tokio::spawn(job.run());
        let pending = async move {
            handle.await.unwrap_or_else(|e| {
                tracing::error!(error = %e, "token refresh task did not complete");
                None
            })
        }
        .boxed()
        .shared();

        tracing::debug!(%key, "starting token refresh");
        in_flight.insert(key, pending.clone());
        pending
    }

    /// Overwrite stored credentials with an empty, already-expired record.
    ///
    /// The record is replaced rather than deleted so linkage metadata kept by
    /// the store survives.
    ///
    /// # Errors
    ///
    /// Returns the store's error if the write fails.
    pub async fn invalidate_tokens(&self, source: &TokenSource, provider: ProviderId) -> Result<()> {
        self.store
            .save(source, provider, &TokenData::invalidated(now_millis()))
            .await?;
        tracing::info!(%source, %provider, "tokens invalidated");
        Ok(())
    }

    /// Read-only validity check: no buffer, no refresh.
    pub async fn are_tokens_valid(&self, source: &TokenSource, provider: ProviderId) -> bool {
        match self.store.load(source, provider).await {
            Ok(Some(tokens)) => tokens.is_valid(),
            Ok(None) => false,
            Err(e) => {
                tracing::warn!(%source, %provider, error = %e, "failed to load tokens");
                false
            }
        }
    }

    /// Persist freshly obtained credentials (e.g. after an authorization exchange).
    ///
    /// # Errors
    ///
    /// Returns the store's error if the write fails.
    pub async fn store_tokens(
        &self,
        source: &TokenSource,
        provider: ProviderId,
        tokens: &TokenData,
    ) -> Result<()> {
        self.store.save(source, provider, tokens).await
    }
}

impl std::fmt::Debug for TokenManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenManager")
            .field("expiration_buffer", &self.expiration_buffer)
            .field("default_provider", &self.default_provider)
            .field("in_flight", &lock(&self.in_flight).len())
            .finish_non_exhaustive()
    }
}

/// Removes the in-flight entry when the refresh ends, including by panic.
struct InFlightGuard {
    key: TokenKey,
    in_flight: InFlight,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        lock(&self.in_flight).remove(&self.key);
    }
}

struct RefreshJob {
    key: TokenKey,
    current: TokenData,
    store: Arc<dyn TokenStore>,
    refresher: Arc<dyn TokenRefresher>,
    on_failure: Option<RefreshFailureHook>,
    in_flight: InFlight,
}

impl RefreshJob {
    async fn run(self) -> Option<TokenData> {
        let _guard = InFlightGuard {
            key: self.key.clone(),
            in_flight: Arc::clone(&self.in_flight),
        };
        let TokenKey { source, provider } = &self.key;

        match self.attempt().await {
            Ok(tokens) => {
                tracing::info!(%source, %provider, "token refreshed");
                Some(tokens)
            }
            Err(e) => {
                tracing::warn!(%source, %provider, error = %e, "token refresh failed");
                if let Some(hook) = &self.on_failure {
                    hook(source, *provider, &e);
                }
                None
            }
        }
    }

    async fn attempt(&self) -> Result<TokenData> {
        let TokenKey { source, provider } = &self.key;
        let refresh_token = self
            .current
            .usable_refresh_token()
            .ok_or_else(|| VcsError::Auth(format!("no refresh token available for {}", self.key)))?;
        let fresh = self.refresher.refresh(refresh_token, *provider).await?;
        self.store.save(source, *provider, &fresh).await?;
        Ok(fresh)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use vcsgate_store::InMemoryTokenStore;

    /// Counts calls and optionally waits before answering.
    struct FakeRefresher {
        calls: AtomicUsize,
        delay: Duration,
        outcome: Option<TokenData>,
        seen: Mutex<Vec<(String, ProviderId)>>,
    }

    impl FakeRefresher {
        fn ok(tokens: TokenData, delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                delay,
                outcome: Some(tokens),
                seen: Mutex::new(Vec::new()),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                delay: Duration::ZERO,
                outcome: None,
                seen: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl TokenRefresher for FakeRefresher {
        async fn refresh(&self, refresh_token: &str, provider: ProviderId) -> Result<TokenData> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen
                .lock()
                .unwrap()
                .push((refresh_token.to_string(), provider));
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.outcome
                .clone()
                .ok_or_else(|| VcsError::Auth("bad_refresh_token".into()))
        }
    }

    struct PanickingRefresher {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl TokenRefresher for PanickingRefresher {
        async fn refresh(&self, _refresh_token: &str, _provider: ProviderId) -> Result<TokenData> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            panic!("refresh exploded");
        }
    }

    /// Wraps the in-memory store and counts saves.
    #[derive(Default)]
    struct CountingStore {
        inner: InMemoryTokenStore,
        saves: AtomicUsize,
        fail_loads: bool,
    }

    #[async_trait]
    impl TokenStore for CountingStore {
        async fn load(&self, source: &TokenSource, provider: ProviderId) -> Result<Option<TokenData>> {
            if self.fail_loads {
                return Err(VcsError::Storage("disk on fire".into()));
            }
            self.inner.load(source, provider).await
        }

        async fn save(
            &self,
            source: &TokenSource,
            provider: ProviderId,
            tokens: &TokenData,
        ) -> Result<()> {
            self.saves.fetch_add(1, Ordering::SeqCst);
            self.inner.save(source, provider, tokens).await
        }
    }

    fn src(s: &str) -> TokenSource {
        TokenSource::from(s)
    }

    fn expired(refresh: Option<&str>) -> TokenData {
        TokenData {
            access_token: "expired".into(),
            refresh_token: refresh.map(String::from),
            expires_at: Some(now_millis() - 1000),
            scope: None,
        }
    }

    fn fresh_from_refresh() -> TokenData {
        TokenData::new("new")
            .with_refresh("r2")
            .with_expiry(Duration::from_secs(3600))
    }

    fn manager(store: Arc<dyn TokenStore>, refresher: Arc<dyn TokenRefresher>) -> TokenManager {
        TokenManager::new(
            TokenManagerConfig::builder()
                .store(store)
                .refresher(refresher)
                .build(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_missing_tokens_yield_none() {
        let refresher = FakeRefresher::failing();
        let m = manager(Arc::new(InMemoryTokenStore::new()), refresher.clone());
        assert!(m.get_valid_token(&src("u"), ProviderId::GitHub).await.is_none());
        assert_eq!(refresher.calls(), 0);
    }

    #[tokio::test]
    async fn test_fresh_token_returned_unchanged() {
        let store = Arc::new(InMemoryTokenStore::new());
        let tok = TokenData::new("at")
            .with_refresh("rt")
            .with_expiry(Duration::from_secs(3600));
        store.save(&src("u"), ProviderId::GitHub, &tok).await.unwrap();
        let refresher = FakeRefresher::failing();
        let m = manager(store, refresher.clone());

        let got = m.get_valid_token(&src("u"), ProviderId::GitHub).await.unwrap();
        assert_eq!(got, tok);
        assert_eq!(refresher.calls(), 0);
    }

    #[tokio::test]
    async fn test_token_without_expiry_never_refreshes() {
        let store = Arc::new(InMemoryTokenStore::new());
        let tok = TokenData::new("forever").with_refresh("rt");
        store.save(&src("u"), ProviderId::GitLab, &tok).await.unwrap();
        let refresher = FakeRefresher::failing();
        let m = manager(store, refresher.clone());

        let got = m.get_valid_token(&src("u"), ProviderId::GitLab).await.unwrap();
        assert_eq!(got.access_token, "forever");
        assert_eq!(refresher.calls(), 0);
    }

    #[tokio::test]
    async fn test_token_inside_buffer_is_refreshed() {
        let store = Arc::new(InMemoryTokenStore::new());
        let tok = TokenData::new("soon")
            .with_refresh("r1")
            .with_expiry(Duration::from_secs(60));
        store.save(&src("u"), ProviderId::GitHub, &tok).await.unwrap();
        let refresher = FakeRefresher::ok(fresh_from_refresh(), Duration::ZERO);
        let m = manager(store.clone(), refresher.clone());

        let got = m.get_valid_token(&src("u"), ProviderId::GitHub).await.unwrap();
        assert_eq!(got.access_token, "new");
        assert_eq!(refresher.calls(), 1);
        assert_eq!(
            refresher.seen.lock().unwrap()[0],
            ("r1".to_string(), ProviderId::GitHub)
        );
        let stored = store.load(&src("u"), ProviderId::GitHub).await.unwrap().unwrap();
        assert_eq!(stored.access_token, "new");
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_callers_share_one_refresh() {
        let store = Arc::new(CountingStore::default());
        store
            .inner
            .save(&src("team-123"), ProviderId::GitHub, &expired(Some("r1")))
            .await
            .unwrap();
        let refresher = FakeRefresher::ok(fresh_from_refresh(), Duration::from_millis(100));
        let m = manager(store.clone(), refresher.clone());

        let source = src("team-123");
        let (a, b, c) = tokio::join!(
            m.get_valid_token(&source, ProviderId::GitHub),
            m.get_valid_token(&source, ProviderId::GitHub),
            m.get_valid_token(&source, ProviderId::GitHub),
        );

        assert_eq!(refresher.calls(), 1);
        assert_eq!(store.saves.load(Ordering::SeqCst), 1);
        let a = a.unwrap();
        assert_eq!(a.access_token, "new");
        assert_eq!(Some(&a), b.as_ref());
        assert_eq!(Some(&a), c.as_ref());
    }

    #[tokio::test(start_paused = true)]
    async fn test_distinct_keys_refresh_independently() {
        let store = Arc::new(InMemoryTokenStore::new());
        store
            .save(&src("a"), ProviderId::GitHub, &expired(Some("ra")))
            .await
            .unwrap();
        store
            .save(&src("b"), ProviderId::GitHub, &expired(Some("rb")))
            .await
            .unwrap();
        store
            .save(&src("a"), ProviderId::GitLab, &expired(Some("rc")))
            .await
            .unwrap();
        let refresher = FakeRefresher::ok(fresh_from_refresh(), Duration::from_millis(50));
        let m = manager(store, refresher.clone());

        let (a, b, c) = tokio::join!(
            m.get_valid_token(&src("a"), ProviderId::GitHub),
            m.get_valid_token(&src("b"), ProviderId::GitHub),
            m.get_valid_token(&src("a"), ProviderId::GitLab),
        );
        assert!(a.is_some() && b.is_some() && c.is_some());
        assert_eq!(refresher.calls(), 3);
    }

    #[tokio::test]
    async fn test_completed_refresh_is_not_reused() {
        let store = Arc::new(InMemoryTokenStore::new());
        store
            .save(&src("u"), ProviderId::GitHub, &expired(Some("r1")))
            .await
            .unwrap();
        let refresher = FakeRefresher::ok(fresh_from_refresh(), Duration::ZERO);
        let m = manager(store, refresher.clone());

        m.get_valid_token(&src("u"), ProviderId::GitHub).await.unwrap();
        let again = m.get_valid_token(&src("u"), ProviderId::GitHub).await.unwrap();
        assert_eq!(again.access_token, "new");
        assert_eq!(refresher.calls(), 1);
        assert_eq!(lock(&m.in_flight).len(), 0);
    }

    #[tokio::test]
    async fn test_missing_refresh_token_skips_callback() {
        let store = Arc::new(InMemoryTokenStore::new());
        store
            .save(&src("u"), ProviderId::GitHub, &expired(None))
            .await
            .unwrap();
        let refresher = FakeRefresher::ok(fresh_from_refresh(), Duration::ZERO);
        let failures = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&failures);
        let m = TokenManager::new(
            TokenManagerConfig::builder()
                .store(store)
                .refresher(refresher.clone())
                .on_refresh_failure(Arc::new(
                    move |_: &TokenSource, _: ProviderId, _: &VcsError| {
                        counter.fetch_add(1, Ordering::SeqCst);
                    },
                ))
                .build(),
        )
        .unwrap();

        assert!(m.get_valid_token(&src("u"), ProviderId::GitHub).await.is_none());
        assert_eq!(refresher.calls(), 0);
        assert_eq!(failures.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_refresh_failure_yields_none_and_keeps_store() {
        let store = Arc::new(CountingStore::default());
        store
            .inner
            .save(&src("u"), ProviderId::GitHub, &expired(Some("r1")))
            .await
            .unwrap();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let m = TokenManager::new(
            TokenManagerConfig::builder()
                .store(store.clone())
                .refresher(FakeRefresher::failing())
                .on_refresh_failure(Arc::new(
                    move |s: &TokenSource, p: ProviderId, e: &VcsError| {
                        sink.lock().unwrap().push((s.to_string(), p, e.to_string()));
                    },
                ))
                .build(),
        )
        .unwrap();

        assert!(m.get_valid_token(&src("u"), ProviderId::GitHub).await.is_none());
        assert_eq!(store.saves.load(Ordering::SeqCst), 0);
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].0, "u");
        assert_eq!(seen[0].1, ProviderId::GitHub);
        assert!(seen[0].2.contains("bad_refresh_token"));
    }

    #[tokio::test]
    async fn test_panicking_refresher_is_contained() {
        let store = Arc::new(InMemoryTokenStore::new());
        store
            .save(&src("u"), ProviderId::GitHub, &expired(Some("r1")))
            .await
            .unwrap();
        let refresher = Arc::new(PanickingRefresher {
            calls: AtomicUsize::new(0),
        });
        let m = manager(store, refresher.clone());

        assert!(m.get_valid_token(&src("u"), ProviderId::GitHub).await.is_none());
        // The in-flight entry was cleared, so the next call tries again.
        assert!(m.get_valid_token(&src("u"), ProviderId::GitHub).await.is_none());
        assert_eq!(refresher.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_store_load_error_yields_none() {
        let store = Arc::new(CountingStore {
            fail_loads: true,
            ..CountingStore::default()
        });
        let m = manager(store.clone(), FakeRefresher::failing());
        assert!(m.get_valid_token(&src("u"), ProviderId::GitHub).await.is_none());
        assert!(!m.are_tokens_valid(&src("u"), ProviderId::GitHub).await);
    }

    #[tokio::test]
    async fn test_invalidate_forces_failed_refresh_path() {
        let store = Arc::new(InMemoryTokenStore::new());
        let tok = TokenData::new("at")
            .with_refresh("rt")
            .with_expiry(Duration::from_secs(3600));
        store.save(&src("u"), ProviderId::GitHub, &tok).await.unwrap();
        store.link(&src("u"), ProviderId::GitHub, "inst-1");
        let refresher = FakeRefresher::ok(fresh_from_refresh(), Duration::ZERO);
        let m = manager(store.clone(), refresher.clone());

        assert!(m.are_tokens_valid(&src("u"), ProviderId::GitHub).await);
        m.invalidate_tokens(&src("u"), ProviderId::GitHub).await.unwrap();

        assert!(!m.are_tokens_valid(&src("u"), ProviderId::GitHub).await);
        assert!(m.get_valid_token(&src("u"), ProviderId::GitHub).await.is_none());
        assert_eq!(refresher.calls(), 0);
        let rec = store.record(&src("u"), ProviderId::GitHub).unwrap();
        assert_eq!(rec.installation_id.as_deref(), Some("inst-1"));
    }

    #[tokio::test]
    async fn test_are_tokens_valid_applies_no_buffer() {
        let store = Arc::new(InMemoryTokenStore::new());
        let tok = TokenData::new("at")
            .with_refresh("rt")
            .with_expiry(Duration::from_secs(30));
        store.save(&src("u"), ProviderId::GitHub, &tok).await.unwrap();
        let refresher = FakeRefresher::failing();
        let m = manager(store, refresher.clone());

        assert!(m.are_tokens_valid(&src("u"), ProviderId::GitHub).await);
        assert_eq!(refresher.calls(), 0);
    }

    #[tokio::test]
    async fn test_store_tokens_roundtrip() {
        let m = manager(Arc::new(InMemoryTokenStore::new()), FakeRefresher::failing());
        let tok = TokenData::new("at").with_refresh("rt");
        m.store_tokens(&src("u"), ProviderId::Bitbucket, &tok).await.unwrap();
        assert_eq!(
            m.get_valid_token(&src("u"), ProviderId::Bitbucket).await,
            Some(tok)
        );
    }

    #[test]
    fn test_missing_env_vars_reported_together() {
        let err = TokenManager::new(
            TokenManagerConfig::builder()
                .store(Arc::new(InMemoryTokenStore::new()))
                .refresher(FakeRefresher::failing())
                .required_env_vars(vec!["X".into(), "Y".into()])
                .env(EnvSource::Fixed(HashMap::new()))
                .build(),
        )
        .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains('X'), "{msg}");
        assert!(msg.contains('Y'), "{msg}");
    }

    #[test]
    fn test_config_defaults() {
        let m = manager(Arc::new(InMemoryTokenStore::new()), FakeRefresher::failing());
        assert_eq!(m.expiration_buffer(), Duration::from_secs(300));
        assert_eq!(m.default_provider(), ProviderId::GitHub);
    }
}
