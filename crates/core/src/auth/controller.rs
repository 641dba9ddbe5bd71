//! Single owner of the per-provider auth sessions
//!
//! The controller wires the token store, pending-login store, callback
//! handler and refresh monitor together. Outer layers (HTTP routes, player)
//! only talk to this type. Per provider it keeps:
//!
//! - the committed [`AuthRecord`], observable via [`AuthController::subscribe_auth`]
//! - a [`ProviderSession`] (refresh state, last error, generation), observable
//!   via [`AuthController::subscribe_session`]
//! - one periodic refresh task while started
//!
//! Record commits (login, refresh) and logout are serialised per provider by
//! the session's commit lock.

use std::sync::Arc;
use std::time::Duration;

use moodmix_common::storage::KeyValueStore;
use moodmix_common::time::Clock;
use moodmix_domain::constants::{
    DEFAULT_APP_URL, PKCE_SESSION_TTL_SECS, REFRESH_CHECK_INTERVAL_SECS, REFRESH_THRESHOLD_SECS,
};
use moodmix_domain::{AuthRecord, Config, Provider};
use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::callback::{self, CallbackHandler, CallbackParams, RelayTicket};
use super::error::AuthError;
use super::login::{AuthorizationInitiator, LoginRedirect};
use super::pending::PendingLoginStore;
use super::per_provider::PerProvider;
use super::ports::ProviderBinding;
use super::refresh::{ProviderSession, RefreshMonitor, RefreshOutcome, SessionSnapshot};
use super::token_store::TokenStore;

/// Timing and redirect settings of the auth lifecycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthControllerConfig {
    /// Entry page that callbacks redirect back to
    pub app_url: String,
    pub refresh_interval: Duration,
    /// Refresh when the token expires within this window
    pub refresh_threshold: Duration,
    /// Lifetime of a pending PKCE verifier
    pub pkce_ttl: Duration,
}

impl Default for AuthControllerConfig {
    fn default() -> Self {
        Self {
            app_url: DEFAULT_APP_URL.to_string(),
            refresh_interval: Duration::from_secs(REFRESH_CHECK_INTERVAL_SECS),
            refresh_threshold: Duration::from_secs(REFRESH_THRESHOLD_SECS),
            pkce_ttl: Duration::from_secs(PKCE_SESSION_TTL_SECS),
        }
    }
}

impl From<&Config> for AuthControllerConfig {
    fn from(config: &Config) -> Self {
        Self {
            app_url: config.server.app_url.clone(),
            refresh_interval: Duration::from_secs(config.auth.refresh_interval_seconds.max(1)),
            refresh_threshold: Duration::from_secs(config.auth.refresh_threshold_seconds),
            pkce_ttl: Duration::from_secs(config.auth.pkce_ttl_seconds),
        }
    }
}

fn duration_ms(duration: Duration) -> i64 {
    i64::try_from(duration.as_millis()).unwrap_or(i64::MAX)
}

struct RefreshTasks {
    cancel: CancellationToken,
    handles: Vec<JoinHandle<()>>,
}

/// Entry point of the auth lifecycle: login, callbacks, refresh tasks and logout
pub struct AuthController {
    config: AuthControllerConfig,
    bindings: PerProvider<ProviderBinding>,
    sessions: PerProvider<Arc<ProviderSession>>,
    token_store: Arc<TokenStore>,
    pending: Arc<PendingLoginStore>,
    initiator: AuthorizationInitiator,
    callbacks: CallbackHandler,
    monitor: Arc<RefreshMonitor>,
    tasks: Mutex<Option<RefreshTasks>>,
}

impl AuthController {
    /// Build a controller over `storage` with one binding per provider.
    ///
    /// # Errors
    /// Returns [`AuthError::Config`] when a binding is passed in the wrong
    /// slot.
    pub fn new(
        config: AuthControllerConfig,
        storage: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
        spotify: ProviderBinding,
        youtube: ProviderBinding,
    ) -> Result<Self, AuthError> {
        for (expected, binding) in [(Provider::Spotify, &spotify), (Provider::YouTube, &youtube)] {
            if binding.provider != expected {
                return Err(AuthError::Config {
                    provider: expected,
                    message: format!("binding for {} passed instead", binding.provider),
                });
            }
        }

        let token_store = Arc::new(TokenStore::new(storage.clone()));
        let pending = Arc::new(PendingLoginStore::new(
            storage,
            clock.clone(),
            duration_ms(config.pkce_ttl),
        ));
        let monitor = Arc::new(RefreshMonitor::new(
            token_store.clone(),
            clock.clone(),
            duration_ms(config.refresh_threshold),
        ));

        let bindings = PerProvider::new(|provider| match provider {
            Provider::Spotify => spotify.clone(),
            Provider::YouTube => youtube.clone(),
        });

        Ok(Self {
            config,
            bindings,
            sessions: PerProvider::new(|provider| Arc::new(ProviderSession::new(provider))),
            token_store,
            initiator: AuthorizationInitiator::new(pending.clone()),
            callbacks: CallbackHandler::new(pending.clone(), clock),
            pending,
            monitor,
            tasks: Mutex::new(None),
        })
    }

    fn binding(&self, provider: Provider) -> &ProviderBinding {
        self.bindings.get(provider)
    }

    fn provider_session(&self, provider: Provider) -> &Arc<ProviderSession> {
        self.sessions.get(provider)
    }

    /// Load stored records and spawn one refresh task per provider.
    ///
    /// The first check runs immediately. Calling `start` twice is a no-op.
    pub async fn start(&self) {
        if self.tasks.lock().is_some() {
            debug!("refresh tasks already running");
            return;
        }

        self.token_store.load_all().await;

        let cancel = CancellationToken::new();
        let handles = Provider::ALL
            .into_iter()
            .map(|provider| {
                spawn_refresh_loop(
                    self.monitor.clone(),
                    self.binding(provider).clone(),
                    self.provider_session(provider).clone(),
                    self.config.refresh_interval,
                    cancel.child_token(),
                )
            })
            .collect();

        let mut tasks = self.tasks.lock();
        if tasks.is_some() {
            cancel.cancel();
            return;
        }
        *tasks = Some(RefreshTasks { cancel, handles });
        info!(interval_secs = self.config.refresh_interval.as_secs(), "refresh monitor started");
    }

    /// Cancel the refresh tasks and wait for them to stop.
    pub async fn shutdown(&self) {
        let Some(tasks) = self.tasks.lock().take() else {
            return;
        };

        tasks.cancel.cancel();
        for handle in tasks.handles {
            if let Err(err) = handle.await {
                warn!(error = %err, "refresh task ended abnormally");
            }
        }
        info!("refresh monitor stopped");
    }

    /// Whether the refresh tasks are running
    pub fn is_running(&self) -> bool {
        self.tasks.lock().is_some()
    }

    /// Start a login for `provider`.
    ///
    /// # Errors
    /// See [`AuthorizationInitiator::begin_login`].
    pub async fn begin_login(&self, provider: Provider) -> Result<LoginRedirect, AuthError> {
        self.initiator.begin_login(self.binding(provider)).await
    }

    /// Complete a direct-flow callback and commit the new record.
    ///
    /// # Errors
    /// Any [`AuthError`] of the callback; nothing is stored on error.
    pub async fn handle_direct_callback(
        &self,
        provider: Provider,
        params: &CallbackParams,
        code_verifier: Option<&str>,
    ) -> Result<(), AuthError> {
        let record = self.callbacks.direct(self.binding(provider), params, code_verifier).await?;
        self.commit_login(record).await
    }

    /// Validate a state-relayed callback.
    ///
    /// # Errors
    /// `AuthDenied`, `MissingCode` or `MissingState`.
    pub fn relay_callback(
        &self,
        provider: Provider,
        params: &CallbackParams,
    ) -> Result<RelayTicket, AuthError> {
        CallbackHandler::relay(provider, params)
    }

    /// Bridge step: recover the verifier by `state`, exchange and commit.
    ///
    /// # Errors
    /// `MissingState`, `MissingCode`, `MissingVerifier` (no exchange
    /// attempted) or the exchange/profile errors.
    pub async fn complete_relayed(
        &self,
        provider: Provider,
        state: Option<&str>,
        code: Option<&str>,
    ) -> Result<(), AuthError> {
        let record = self.callbacks.bridge(self.binding(provider), state, code).await?;
        self.commit_login(record).await
    }

    /// Exchange a code for a record without committing it.
    ///
    /// # Errors
    /// `TokenExchange` or `ProfileFetch`.
    pub async fn exchange_for_bridge(
        &self,
        provider: Provider,
        code: &str,
        code_verifier: &str,
    ) -> Result<AuthRecord, AuthError> {
        self.callbacks.exchange(self.binding(provider), code, code_verifier).await
    }

    async fn commit_login(&self, record: AuthRecord) -> Result<(), AuthError> {
        let provider = record.provider();
        let session = self.provider_session(provider);
        let _commit = session.lock_commits().await;

        self.token_store.commit(record).await?;
        session.reset_after_login();
        info!(%provider, "provider connected");
        Ok(())
    }

    /// Disconnect `provider`; an in-flight refresh result is discarded.
    ///
    /// # Errors
    /// Returns [`AuthError::Storage`] when the record cannot be deleted. The
    /// in-memory record is cleared regardless.
    pub async fn logout(&self, provider: Provider) -> Result<(), AuthError> {
        let session = self.provider_session(provider);
        let _commit = session.lock_commits().await;

        session.invalidate();
        if let Err(err) = self.pending.clear(provider).await {
            warn!(%provider, error = %err, "failed to drop pending logins");
        }
        self.token_store.clear(provider).await?;
        info!(%provider, "provider disconnected");
        Ok(())
    }

    /// Run a refresh check now instead of waiting for the next tick.
    pub async fn refresh_now(&self, provider: Provider) -> RefreshOutcome {
        self.monitor.tick(self.binding(provider), self.provider_session(provider)).await
    }

    /// Current refresh state of `provider`
    pub fn session(&self, provider: Provider) -> SessionSnapshot {
        self.provider_session(provider).snapshot()
    }

    /// Receiver notified on every refresh state change
    pub fn subscribe_session(&self, provider: Provider) -> watch::Receiver<SessionSnapshot> {
        self.provider_session(provider).subscribe()
    }

    /// Receiver notified on every login, refresh, logout and external change
    pub fn subscribe_auth(&self, provider: Provider) -> watch::Receiver<Option<AuthRecord>> {
        self.token_store.subscribe(provider)
    }

    /// Committed record of `provider`, if connected
    pub fn auth_record(&self, provider: Provider) -> Option<AuthRecord> {
        self.token_store.get(provider)
    }

    /// Whether `provider` has a committed record
    pub fn is_authenticated(&self, provider: Provider) -> bool {
        self.token_store.is_authenticated(provider)
    }

    /// Current access token of a connected provider.
    ///
    /// # Errors
    /// Returns [`AuthError::NotAuthenticated`] when no record is stored.
    pub fn access_token(&self, provider: Provider) -> Result<String, AuthError> {
        self.token_store
            .get(provider)
            .map(|record| record.access_token)
            .ok_or(AuthError::NotAuthenticated { provider })
    }

    /// Public origin the entry page is served from
    pub fn app_url(&self) -> &str {
        &self.config.app_url
    }

    /// The controller's timing and redirect settings
    pub const fn config(&self) -> &AuthControllerConfig {
        &self.config
    }

    /// Entry page URL reporting a callback outcome
    pub fn entry_redirect(&self, provider: Provider, outcome: &Result<(), AuthError>) -> String {
        callback::entry_redirect(&self.config.app_url, provider, outcome)
    }
}

impl Drop for AuthController {
    fn drop(&mut self) {
        if let Some(tasks) = self.tasks.get_mut().take() {
            tasks.cancel.cancel();
        }
    }
}

fn spawn_refresh_loop(
    monitor: Arc<RefreshMonitor>,
    binding: ProviderBinding,
    session: Arc<ProviderSession>,
    interval: Duration,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let provider = binding.provider;
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                outcome = monitor.tick(&binding, &session) => {
                    debug!(%provider, %outcome, "refresh tick");
                }
            }
        }
        debug!(%provider, "refresh loop exited");
    })
}
