//! Mock implementations of common traits
//!
//! [`MockOAuthClient`] records how often the token endpoint would have been
//! hit and lets tests script responses or hold a refresh in flight.

#[cfg(feature = "platform")]
pub use oauth::{MockOAuthClient, RefreshGate};

#[cfg(feature = "platform")]
mod oauth {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use async_trait::async_trait;
    use parking_lot::Mutex;
    use tokio::sync::Notify;

    use crate::auth::{OAuthClientError, OAuthClientTrait, OAuthError, PkceSession, TokenResponse};

    const MOCK_REDIRECT_URI: &str = "http://localhost:3000/api/auth/mock/callback";

    /// Handle for a refresh held in flight by [`MockOAuthClient::hold_refresh`]
    #[derive(Debug, Clone)]
    pub struct RefreshGate {
        started: Arc<Notify>,
        release: Arc<Notify>,
    }

    impl RefreshGate {
        /// Wait until a refresh call reached the gate
        pub async fn wait_started(&self) {
            self.started.notified().await;
        }

        /// Let the held refresh call complete
        pub fn release(&self) {
            self.release.notify_one();
        }
    }

    /// Scriptable OAuth client.
    #[derive(Debug, Clone)]
    pub struct MockOAuthClient {
        exchange_calls: Arc<AtomicUsize>,
        refresh_calls: Arc<AtomicUsize>,
        exchange_response: Arc<Mutex<Result<TokenResponse, OAuthError>>>,
        refresh_response: Arc<Mutex<Result<TokenResponse, OAuthError>>>,
        last_verifier: Arc<Mutex<Option<String>>>,
        gate: Arc<Mutex<Option<RefreshGate>>>,
    }

    impl MockOAuthClient {
        /// Create a mock whose exchange and refresh both succeed.
        pub fn new() -> Self {
            Self {
                exchange_calls: Arc::new(AtomicUsize::new(0)),
                refresh_calls: Arc::new(AtomicUsize::new(0)),
                exchange_response: Arc::new(Mutex::new(Ok(Self::token(
                    "mock_access_token",
                    Some("mock_refresh_token"),
                    3600,
                )))),
                refresh_response: Arc::new(Mutex::new(Ok(Self::token(
                    "refreshed_access_token",
                    Some("refreshed_refresh_token"),
                    3600,
                )))),
                last_verifier: Arc::new(Mutex::new(None)),
                gate: Arc::new(Mutex::new(None)),
            }
        }

        /// Build a token response for scripting
        pub fn token(access: &str, refresh: Option<&str>, expires_in: i64) -> TokenResponse {
            TokenResponse {
                access_token: access.to_string(),
                token_type: "Bearer".to_string(),
                expires_in,
                refresh_token: refresh.map(str::to_string),
                scope: None,
            }
        }

        /// Configure the response returned by `exchange_code`.
        pub fn set_exchange_response(&self, response: TokenResponse) {
            *self.exchange_response.lock() = Ok(response);
        }

        /// Make `exchange_code` fail with an OAuth error body.
        pub fn fail_exchange(&self, error: &str, description: Option<&str>) {
            *self.exchange_response.lock() = Err(OAuthError {
                error: error.to_string(),
                error_description: description.map(str::to_string),
            });
        }

        /// Configure the response returned by `refresh_access_token`.
        pub fn set_refresh_response(&self, response: TokenResponse) {
            *self.refresh_response.lock() = Ok(response);
        }

        /// Make `refresh_access_token` fail with `invalid_grant`.
        pub fn fail_refresh(&self) {
            *self.refresh_response.lock() = Err(OAuthError {
                error: "invalid_grant".to_string(),
                error_description: Some("Refresh token revoked".to_string()),
            });
        }

        /// Hold the next refresh calls until [`RefreshGate::release`].
        pub fn hold_refresh(&self) -> RefreshGate {
            let gate =
                RefreshGate { started: Arc::new(Notify::new()), release: Arc::new(Notify::new()) };
            *self.gate.lock() = Some(gate.clone());
            gate
        }

        /// Let refresh calls through again; a call already held stays held.
        pub fn stop_holding(&self) {
            self.gate.lock().take();
        }

        #[must_use]
        pub fn exchange_calls(&self) -> usize {
            self.exchange_calls.load(Ordering::SeqCst)
        }

        #[must_use]
        pub fn refresh_calls(&self) -> usize {
            self.refresh_calls.load(Ordering::SeqCst)
        }

        /// Verifier passed to the latest exchange
        #[must_use]
        pub fn last_verifier(&self) -> Option<String> {
            self.last_verifier.lock().clone()
        }
    }

    impl Default for MockOAuthClient {
        fn default() -> Self {
            Self::new()
        }
    }

    #[async_trait]
    impl OAuthClientTrait for MockOAuthClient {
        fn authorization_url(&self, session: &PkceSession) -> Result<String, OAuthClientError> {
            Ok(format!(
                "https://auth.mock/authorize?state={}&code_challenge={}&code_challenge_method={}",
                session.state,
                session.code_challenge,
                session.challenge_method()
            ))
        }

        async fn exchange_code(
            &self,
            _code: &str,
            code_verifier: &str,
        ) -> Result<TokenResponse, OAuthClientError> {
            self.exchange_calls.fetch_add(1, Ordering::SeqCst);
            *self.last_verifier.lock() = Some(code_verifier.to_string());
            self.exchange_response.lock().clone().map_err(OAuthClientError::OAuthError)
        }

        async fn refresh_access_token(
            &self,
            refresh_token: &str,
        ) -> Result<TokenResponse, OAuthClientError> {
            self.refresh_calls.fetch_add(1, Ordering::SeqCst);
            if refresh_token.is_empty() {
                return Err(OAuthClientError::NoRefreshToken);
            }

            let gate = self.gate.lock().clone();
            if let Some(gate) = gate {
                gate.started.notify_one();
                gate.release.notified().await;
            }

            self.refresh_response.lock().clone().map_err(OAuthClientError::OAuthError)
        }

        fn redirect_uri(&self) -> &str {
            MOCK_REDIRECT_URI
        }
    }

}
