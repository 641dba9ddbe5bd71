//! Starting an authorization-code login

use std::fmt;
use std::sync::Arc;

use moodmix_common::auth::PkceSession;
use moodmix_domain::Provider;
use tracing::info;

use super::error::AuthError;
use super::pending::PendingLoginStore;
use super::ports::ProviderBinding;

/// Where to send the browser, plus what the HTTP layer must remember.
///
/// For direct-flow providers the caller stores `code_verifier` in a
/// request-scoped cookie; relayed providers only need the durable copy.
#[derive(Clone)]
pub struct LoginRedirect {
    pub provider: Provider,
    pub authorization_url: String,
    pub state: String,
    pub code_verifier: String,
}

impl fmt::Debug for LoginRedirect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRedirect")
            .field("provider", &self.provider)
            .field("authorization_url", &self.authorization_url)
            .field("state", &self.state)
            .field("code_verifier", &"[redacted]")
            .finish()
    }
}

/// Starts logins: PKCE pair, pending verifier, authorization URL
pub struct AuthorizationInitiator {
    pending: Arc<PendingLoginStore>,
}

impl AuthorizationInitiator {
    /// Initiator storing verifiers in `pending`
    pub fn new(pending: Arc<PendingLoginStore>) -> Self {
        Self { pending }
    }

    /// Generate a PKCE session, persist its verifier and build the consent
    /// URL.
    ///
    /// # Errors
    /// - [`AuthError::Pkce`] when secure randomness is unavailable
    /// - [`AuthError::Storage`] when the verifier cannot be persisted
    /// - [`AuthError::Config`] when the authorization URL cannot be built
    pub async fn begin_login(&self, binding: &ProviderBinding) -> Result<LoginRedirect, AuthError> {
        let provider = binding.provider;
        let session = PkceSession::generate()?;

        let authorization_url = binding
            .oauth
            .authorization_url(&session)
            .map_err(|err| AuthError::Config { provider, message: err.to_string() })?;

        self.pending.save(provider, &session).await?;

        info!(%provider, "login started");
        Ok(LoginRedirect {
            provider,
            authorization_url,
            state: session.state,
            code_verifier: session.code_verifier,
        })
    }
}
