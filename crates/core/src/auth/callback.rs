//! Handling the provider's redirect back
//!
//! Two shapes exist. Direct providers (Spotify) deliver the code to a request
//! that can read the verifier from a cookie, so the exchange happens at once.
//! State-relayed providers (YouTube) only hand over `state` and `code`; the
//! bridge step then recovers the verifier from durable storage by `state`.
//!
//! Nothing here commits: the controller persists the assembled record so that
//! commits can be ordered against logout.

use std::sync::Arc;
use std::time::Instant;

use moodmix_common::time::Clock;
use moodmix_domain::{AuthRecord, Provider};
use serde::Deserialize;
use tracing::{debug, info, warn};
use url::form_urlencoded;

use super::error::AuthError;
use super::pending::PendingLoginStore;
use super::ports::ProviderBinding;

/// Query parameters of the redirect back
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CallbackParams {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl CallbackParams {
    fn code(&self) -> Option<&str> {
        self.code.as_deref().filter(|code| !code.is_empty())
    }

    fn state(&self) -> Option<&str> {
        self.state.as_deref().filter(|state| !state.is_empty())
    }
}

/// Values the relay step hands to the bridge through short-lived cookies
#[derive(Clone, PartialEq, Eq)]
pub struct RelayTicket {
    pub state: String,
    pub code: String,
}

impl std::fmt::Debug for RelayTicket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelayTicket")
            .field("state", &self.state)
            .field("code", &"[redacted]")
            .finish()
    }
}

/// Validates provider callbacks and exchanges codes for auth records
pub struct CallbackHandler {
    pending: Arc<PendingLoginStore>,
    clock: Arc<dyn Clock>,
}

impl CallbackHandler {
    /// Handler consuming verifiers from `pending`
    pub fn new(pending: Arc<PendingLoginStore>, clock: Arc<dyn Clock>) -> Self {
        Self { pending, clock }
    }

    /// Exchange `code` and fetch the profile; the record is only built when
    /// both calls succeed.
    ///
    /// # Errors
    /// [`AuthError::TokenExchange`] or [`AuthError::ProfileFetch`].
    pub async fn exchange(
        &self,
        binding: &ProviderBinding,
        code: &str,
        code_verifier: &str,
    ) -> Result<AuthRecord, AuthError> {
        let provider = binding.provider;
        let started = Instant::now();

        let tokens = binding.oauth.exchange_code(code, code_verifier).await.map_err(|err| {
            warn!(%provider, error = %err, "token exchange failed");
            AuthError::token_exchange(provider, &err)
        })?;
        let expires_at = tokens.expires_at(self.clock.millis_since_epoch());

        let profile = binding.profiles.fetch_profile(&tokens.access_token).await.map_err(|err| {
            warn!(%provider, error = %err, "profile fetch failed");
            AuthError::ProfileFetch { provider, message: err.to_string() }
        })?;
        if profile.provider() != provider {
            return Err(AuthError::ProfileFetch {
                provider,
                message: format!("profile belongs to {}", profile.provider().display_name()),
            });
        }

        info!(
            %provider,
            account = profile.id(),
            duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            "authorization code exchanged"
        );
        Ok(AuthRecord {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            expires_at,
            profile,
        })
    }

    /// Direct-flow callback; `code_verifier` comes from the request cookie.
    ///
    /// # Errors
    /// `AuthDenied`, `MissingCode` or `MissingVerifier` before any network
    /// call, otherwise the errors of [`Self::exchange`].
    pub async fn direct(
        &self,
        binding: &ProviderBinding,
        params: &CallbackParams,
        code_verifier: Option<&str>,
    ) -> Result<AuthRecord, AuthError> {
        let provider = binding.provider;
        if let Some(state) = params.state() {
            // the cookie carries the verifier; the durable copy is just spent
            let _ = self.pending.take(provider, state).await;
        }

        check_denied(provider, params)?;
        let code = params.code().ok_or(AuthError::MissingCode { provider })?;
        let verifier = code_verifier
            .filter(|verifier| !verifier.is_empty())
            .ok_or(AuthError::MissingVerifier { provider })?;

        self.exchange(binding, code, verifier).await
    }

    /// State-relayed callback: validate and hand `state`/`code` to the bridge.
    ///
    /// # Errors
    /// `AuthDenied`, `MissingCode` or `MissingState`.
    pub fn relay(provider: Provider, params: &CallbackParams) -> Result<RelayTicket, AuthError> {
        check_denied(provider, params)?;
        let code = params.code().ok_or(AuthError::MissingCode { provider })?;
        let state = params.state().ok_or(AuthError::MissingState { provider })?;

        debug!(%provider, state, "relaying callback to bridge");
        Ok(RelayTicket { state: state.to_string(), code: code.to_string() })
    }

    /// Bridge step of the relayed flow.
    ///
    /// # Errors
    /// `MissingState`/`MissingCode` when the relay cookies are gone and
    /// `MissingVerifier` when no live verifier matches `state`; no exchange is
    /// attempted in those cases.
    pub async fn bridge(
        &self,
        binding: &ProviderBinding,
        state: Option<&str>,
        code: Option<&str>,
    ) -> Result<AuthRecord, AuthError> {
        let provider = binding.provider;
        let state = state.filter(|s| !s.is_empty()).ok_or(AuthError::MissingState { provider })?;
        let code = code.filter(|c| !c.is_empty()).ok_or(AuthError::MissingCode { provider })?;

        let verifier = self
            .pending
            .take(provider, state)
            .await
            .ok_or(AuthError::MissingVerifier { provider })?;

        self.exchange(binding, code, &verifier).await
    }
}

fn check_denied(provider: Provider, params: &CallbackParams) -> Result<(), AuthError> {
    match params.error.as_deref() {
        Some(reason) => {
            info!(%provider, reason, "authorization denied by provider");
            Err(AuthError::AuthDenied { provider, reason: reason.to_string() })
        }
        None => Ok(()),
    }
}

/// Entry page URL after a callback: the success flag or `?error=<message>`.
pub fn entry_redirect(app_url: &str, provider: Provider, outcome: &Result<(), AuthError>) -> String {
    let base = app_url.trim_end_matches('/');
    let mut query = form_urlencoded::Serializer::new(String::new());
    match outcome {
        Ok(()) => query.append_pair(&provider.success_flag(), "true"),
        Err(err) => query.append_pair("error", &err.user_message()),
    };
    format!("{base}/?{}", query.finish())
}
