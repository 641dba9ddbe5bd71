//! Trait seams for OAuth HTTP clients
//!
//! Core services depend on [`OAuthClientTrait`] so tests can substitute
//! [`MockOAuthClient`](crate::testing::MockOAuthClient).

use async_trait::async_trait;

use super::client::OAuthClientError;
use super::pkce::PkceSession;
use super::types::TokenResponse;

/// OAuth operations needed by the login, callback and refresh flows.
#[async_trait]
pub trait OAuthClientTrait: Send + Sync {
    /// Build the provider authorization URL for `session`
    fn authorization_url(&self, session: &PkceSession) -> Result<String, OAuthClientError>;

    /// Exchange an authorization code and verifier for tokens
    async fn exchange_code(
        &self,
        code: &str,
        code_verifier: &str,
    ) -> Result<TokenResponse, OAuthClientError>;

    /// Obtain a new access token with `grant_type=refresh_token`
    async fn refresh_access_token(
        &self,
        refresh_token: &str,
    ) -> Result<TokenResponse, OAuthClientError>;

    /// Redirect URI registered with the provider
    fn redirect_uri(&self) -> &str;
}
