//! Background token refresh
//!
//! Each provider has a [`ProviderSession`] whose state moves
//! `Idle -> Refreshing -> Idle | Failed`. A tick refreshes only when the
//! stored record carries a refresh token and expires within the threshold.
//!
//! The session's generation counter is bumped by logout and by every fresh
//! login. A refresh remembers the generation it started under and commits only
//! if that generation is still current, checked while holding the session's
//! commit lock. Logout and login take the same lock, so a refresh that loses
//! the race is discarded instead of resurrecting or overwriting a record.

use std::sync::Arc;

use moodmix_common::time::Clock;
use moodmix_domain::{impl_domain_enum_conversions, AuthRecord, Provider};
use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::{watch, MutexGuard};
use tracing::{debug, error, info, warn};

use super::error::AuthError;
use super::ports::ProviderBinding;
use super::token_store::TokenStore;

/// Where a provider session is in its refresh cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RefreshState {
    /// Nothing in flight
    Idle,
    /// A refresh request is in flight
    Refreshing,
    /// The last refresh was rejected and the record cleared
    Failed,
}

impl_domain_enum_conversions!(RefreshState {
    Idle => "idle",
    Refreshing => "refreshing",
    Failed => "failed",
});

/// Read-only view of a provider session
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub provider: Provider,
    pub state: RefreshState,
    /// User-facing message of the last failure
    pub error: Option<String>,
    /// Bumped by every login and logout
    pub generation: u64,
    /// Epoch millis of the last successful refresh
    pub last_refreshed_at: Option<i64>,
}

/// What a single refresh tick did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// Provider is not connected
    NoRecord,
    /// Not expiring yet, or no refresh token to use
    NotDue,
    /// Another refresh of the same provider is in flight
    Skipped,
    /// New tokens were committed
    Refreshed,
    /// Grant rejected (record cleared) or the new record could not be stored
    Failed,
    /// Logout, a new login or another process's refresh happened while the
    /// request was in flight
    Discarded,
}

impl_domain_enum_conversions!(RefreshOutcome {
    NoRecord => "no_record",
    NotDue => "not_due",
    Skipped => "skipped",
    Refreshed => "refreshed",
    Failed => "failed",
    Discarded => "discarded",
});

#[derive(Debug)]
struct SessionInner {
    state: RefreshState,
    error: Option<String>,
    generation: u64,
    last_refreshed_at: Option<i64>,
}

/// Refresh state, last error and generation of one provider
#[derive(Debug)]
pub struct ProviderSession {
    provider: Provider,
    inner: Mutex<SessionInner>,
    snapshots: watch::Sender<SessionSnapshot>,
    commit_lock: tokio::sync::Mutex<()>,
}

impl ProviderSession {
    /// Idle session at generation 0
    pub fn new(provider: Provider) -> Self {
        let inner =
            SessionInner { state: RefreshState::Idle, error: None, generation: 0, last_refreshed_at: None };
        let snapshots = watch::Sender::new(Self::view(provider, &inner));
        Self { provider, inner: Mutex::new(inner), snapshots, commit_lock: tokio::sync::Mutex::new(()) }
    }

    fn view(provider: Provider, inner: &SessionInner) -> SessionSnapshot {
        SessionSnapshot {
            provider,
            state: inner.state,
            error: inner.error.clone(),
            generation: inner.generation,
            last_refreshed_at: inner.last_refreshed_at,
        }
    }

    fn update<R>(&self, apply: impl FnOnce(&mut SessionInner) -> R) -> R {
        let mut inner = self.inner.lock();
        let result = apply(&mut *inner);
        self.snapshots.send_replace(Self::view(self.provider, &*inner));
        result
    }

    /// Provider this session belongs to
    pub const fn provider(&self) -> Provider {
        self.provider
    }

    /// Current state, error and generation
    pub fn snapshot(&self) -> SessionSnapshot {
        Self::view(self.provider, &*self.inner.lock())
    }

    /// Receiver notified on every state transition
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshots.subscribe()
    }

    /// Serialises record commits against logout and login
    pub async fn lock_commits(&self) -> MutexGuard<'_, ()> {
        self.commit_lock.lock().await
    }

    /// Whether no login or logout happened since `generation` was handed out
    pub fn is_current(&self, generation: u64) -> bool {
        self.inner.lock().generation == generation
    }

    /// Enter `Refreshing`, returning the generation the refresh runs under.
    ///
    /// Returns `None` while another refresh is in flight.
    pub fn try_begin_refresh(&self) -> Option<u64> {
        self.update(|inner| {
            if inner.state == RefreshState::Refreshing {
                return None;
            }
            inner.state = RefreshState::Refreshing;
            Some(inner.generation)
        })
    }

    /// Leave `Refreshing` without touching the error (nothing was decided)
    pub fn settle(&self, generation: u64) {
        self.update(|inner| {
            if inner.generation == generation && inner.state == RefreshState::Refreshing {
                inner.state = RefreshState::Idle;
            }
        });
    }

    /// Refresh committed: back to `Idle` with the error cleared
    pub fn finish_success(&self, generation: u64, now_ms: i64) {
        self.update(|inner| {
            if inner.generation == generation {
                inner.state = RefreshState::Idle;
                inner.error = None;
                inner.last_refreshed_at = Some(now_ms);
            }
        });
    }

    /// Refresh rejected: `Failed` with a user-facing message
    pub fn fail(&self, generation: u64, message: String) {
        self.update(|inner| {
            if inner.generation == generation {
                inner.state = RefreshState::Failed;
                inner.error = Some(message);
            }
        });
    }

    /// A fresh login succeeded: back to `Idle`, in-flight refreshes are stale.
    pub fn reset_after_login(&self) {
        self.update(|inner| {
            inner.generation += 1;
            inner.state = RefreshState::Idle;
            inner.error = None;
        });
    }

    /// Logout: in-flight refreshes are stale and the last error is dropped.
    pub fn invalidate(&self) {
        self.update(|inner| {
            inner.generation += 1;
            inner.state = RefreshState::Idle;
            inner.error = None;
            inner.last_refreshed_at = None;
        });
    }
}

/// Decides when a provider's tokens are refreshed and applies the result
pub struct RefreshMonitor {
    token_store: Arc<TokenStore>,
    clock: Arc<dyn Clock>,
    threshold_ms: i64,
}

impl RefreshMonitor {
    /// Monitor refreshing records that expire within `threshold_ms`
    pub fn new(token_store: Arc<TokenStore>, clock: Arc<dyn Clock>, threshold_ms: i64) -> Self {
        Self { token_store, clock, threshold_ms }
    }

    /// Run one refresh check for the session's provider.
    ///
    /// The record is re-read from storage first, so logins, logouts and
    /// refresh-token rotations by other processes are honoured. Dropping the
    /// returned future mid-request leaves the session `Idle`.
    pub async fn tick(&self, binding: &ProviderBinding, session: &ProviderSession) -> RefreshOutcome {
        let provider = binding.provider;
        let record = {
            let _commit = session.lock_commits().await;
            self.token_store.reload(provider).await
        };
        let Some(record) = record else {
            return RefreshOutcome::NoRecord;
        };

        let now_ms = self.clock.millis_since_epoch();
        let refresh_token = match record.refresh_token.as_deref() {
            Some(token) if !token.is_empty() => token.to_string(),
            _ => {
                debug!(%provider, "no refresh token stored, waiting for a new login");
                return RefreshOutcome::NotDue;
            }
        };
        if !record.expires_within(now_ms, self.threshold_ms) {
            return RefreshOutcome::NotDue;
        }

        let Some(generation) = session.try_begin_refresh() else {
            debug!(%provider, "refresh already in flight");
            return RefreshOutcome::Skipped;
        };
        let _settle = SettleOnDrop { session, generation };

        info!(%provider, expires_at = record.expires_at, "refreshing access token");
        let result = binding.oauth.refresh_access_token(&refresh_token).await;

        let _commit = session.lock_commits().await;
        if !session.is_current(generation) {
            info!(%provider, "session changed during refresh, discarding result");
            return RefreshOutcome::Discarded;
        }
        let Some(current) = self.token_store.reload(provider).await else {
            info!(%provider, "record cleared during refresh, discarding result");
            return RefreshOutcome::Discarded;
        };

        match result {
            Ok(tokens) => {
                let now_ms = self.clock.millis_since_epoch();
                let refreshed = AuthRecord {
                    expires_at: tokens.expires_at(now_ms),
                    access_token: tokens.access_token,
                    refresh_token: tokens.refresh_token.or(current.refresh_token),
                    profile: current.profile,
                };

                match self.token_store.commit(refreshed).await {
                    Ok(()) => {
                        session.finish_success(generation, now_ms);
                        info!(%provider, outcome = %RefreshOutcome::Refreshed, "token refreshed");
                        RefreshOutcome::Refreshed
                    }
                    Err(err) => {
                        // the old record stays; the next tick tries again
                        error!(%provider, error = %err, "refreshed token could not be stored");
                        RefreshOutcome::Failed
                    }
                }
            }
            Err(_) if current.refresh_token.as_deref() != Some(refresh_token.as_str()) => {
                info!(%provider, "refresh token rotated elsewhere, keeping the stored record");
                RefreshOutcome::Discarded
            }
            Err(err) => {
                let failure = AuthError::refresh_failure(provider, &err);
                warn!(%provider, error = %failure, "refresh rejected, signing out");
                if let Err(clear_err) = self.token_store.clear(provider).await {
                    error!(%provider, error = %clear_err, "failed to remove expired auth record");
                }
                session.fail(generation, failure.user_message());
                RefreshOutcome::Failed
            }
        }
    }
}

/// Returns a session to `Idle` unless the refresh reached a verdict first
struct SettleOnDrop<'a> {
    session: &'a ProviderSession,
    generation: u64,
}

impl Drop for SettleOnDrop<'_> {
    fn drop(&mut self) {
        self.session.settle(self.generation);
    }
}
