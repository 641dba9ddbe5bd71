//! OAuth 2.0 client implementation with PKCE support
//!
//! Handles the HTTP side of the authorization-code flow:
//! - Authorization URL building
//! - Authorization code exchange
//! - Token refresh
//!
//! Every token endpoint body is validated against [`TokenResponse`] before it
//! leaves this module.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use tracing::debug;

use super::pkce::PkceSession;
use super::traits::OAuthClientTrait;
use super::types::{ClientAuthMethod, OAuthConfig, OAuthError, TokenResponse};
use crate::error::{ErrorClassification, ErrorSeverity};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Error type for OAuth client operations
#[derive(Debug)]
pub enum OAuthClientError {
    /// HTTP request failed
    RequestFailed(reqwest::Error),

    /// OAuth server returned a structured error
    OAuthError(OAuthError),

    /// Non-2xx status without a structured OAuth error body
    HttpStatus { status: u16, body: String },

    /// Response did not match the expected schema
    ParseError(String),

    /// No refresh token available
    NoRefreshToken,

    /// Invalid configuration
    ConfigError(String),
}

impl OAuthClientError {
    /// Most specific provider message: `error_description`, then `error`,
    /// then the raw body
    pub fn provider_message(&self) -> String {
        match self {
            Self::OAuthError(err) => {
                err.error_description.clone().unwrap_or_else(|| err.error.clone())
            }
            Self::HttpStatus { status, body } if body.trim().is_empty() => {
                format!("HTTP {status}")
            }
            Self::HttpStatus { body, .. } => body.clone(),
            other => other.to_string(),
        }
    }
}

impl std::fmt::Display for OAuthClientError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RequestFailed(e) => write!(f, "HTTP request failed: {e}"),
            Self::OAuthError(e) => write!(f, "OAuth error: {e}"),
            Self::HttpStatus { status, body } => write!(f, "HTTP {status}: {body}"),
            Self::ParseError(msg) => write!(f, "Parse error: {msg}"),
            Self::NoRefreshToken => write!(f, "No refresh token available"),
            Self::ConfigError(msg) => write!(f, "Configuration error: {msg}"),
        }
    }
}

impl std::error::Error for OAuthClientError {}

impl From<reqwest::Error> for OAuthClientError {
    fn from(err: reqwest::Error) -> Self {
        Self::RequestFailed(err)
    }
}

impl ErrorClassification for OAuthClientError {
    fn is_retryable(&self) -> bool {
        match self {
            Self::RequestFailed(err) => err.is_timeout() || err.is_connect(),
            Self::HttpStatus { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }

    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::ConfigError(_) => ErrorSeverity::Critical,
            Self::RequestFailed(_) | Self::HttpStatus { .. } => ErrorSeverity::Warning,
            _ => ErrorSeverity::Error,
        }
    }
}

/// OAuth 2.0 client for one provider
#[derive(Debug, Clone)]
pub struct OAuthClient {
    config: OAuthConfig,
    client: Client,
}

impl OAuthClient {
    /// Create a new OAuth client with the given configuration
    ///
    /// # Examples
    /// ```
    /// use moodmix_common::auth::{OAuthClient, OAuthConfig};
    ///
    /// let config = OAuthConfig::new(
    ///     "https://accounts.example.com/authorize",
    ///     "https://accounts.example.com/token",
    ///     "client_id",
    ///     "http://localhost:3000/api/auth/example/callback",
    ///     vec!["read".to_string()],
    /// );
    /// let client = OAuthClient::new(config);
    /// ```
    #[must_use]
    pub fn new(config: OAuthConfig) -> Self {
        let client =
            Client::builder().timeout(REQUEST_TIMEOUT).build().unwrap_or_else(|_| Client::new());
        Self { config, client }
    }

    /// Use an existing HTTP client (shared connection pool)
    #[must_use]
    pub const fn with_http_client(config: OAuthConfig, client: Client) -> Self {
        Self { config, client }
    }

    /// Build the authorization URL for a PKCE session
    ///
    /// # Errors
    /// Returns `ConfigError` if the authorization endpoint is not a valid URL.
    pub fn authorization_url(&self, session: &PkceSession) -> Result<String, OAuthClientError> {
        let mut url = url::Url::parse(&self.config.authorization_endpoint).map_err(|err| {
            OAuthClientError::ConfigError(format!("invalid authorization endpoint: {err}"))
        })?;

        let mut params = vec![
            ("client_id".to_string(), self.config.client_id.clone()),
            ("response_type".to_string(), "code".to_string()),
            ("redirect_uri".to_string(), self.config.redirect_uri.clone()),
            ("scope".to_string(), self.config.scope_string()),
            ("state".to_string(), session.state.clone()),
            ("code_challenge_method".to_string(), session.challenge_method().to_string()),
            ("code_challenge".to_string(), session.code_challenge.clone()),
        ];
        params.extend(self.config.extra_authorize_params.iter().cloned());

        let query_string = params
            .iter()
            .map(|(k, v)| format!("{k}={}", urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");
        url.set_query(Some(&query_string));

        Ok(url.into())
    }

    /// Exchange an authorization code for tokens
    ///
    /// # Errors
    /// Returns `OAuthError`/`HttpStatus` for non-2xx responses, `ParseError`
    /// when the body fails schema validation, `RequestFailed` on transport
    /// errors.
    pub async fn exchange_code(
        &self,
        code: &str,
        code_verifier: &str,
    ) -> Result<TokenResponse, OAuthClientError> {
        let params = vec![
            ("client_id".to_string(), self.config.client_id.clone()),
            ("grant_type".to_string(), "authorization_code".to_string()),
            ("code".to_string(), code.to_string()),
            ("redirect_uri".to_string(), self.config.redirect_uri.clone()),
            ("code_verifier".to_string(), code_verifier.to_string()),
        ];

        debug!(endpoint = %self.config.token_endpoint, "Exchanging authorization code");
        self.post_token_request(params).await
    }

    /// Refresh an access token
    ///
    /// # Errors
    /// Returns `NoRefreshToken` for an empty token, otherwise the same errors
    /// as [`Self::exchange_code`].
    pub async fn refresh_access_token(
        &self,
        refresh_token: &str,
    ) -> Result<TokenResponse, OAuthClientError> {
        if refresh_token.is_empty() {
            return Err(OAuthClientError::NoRefreshToken);
        }

        let params = vec![
            ("client_id".to_string(), self.config.client_id.clone()),
            ("grant_type".to_string(), "refresh_token".to_string()),
            ("refresh_token".to_string(), refresh_token.to_string()),
        ];

        debug!(endpoint = %self.config.token_endpoint, "Refreshing access token");
        self.post_token_request(params).await
    }

    /// Get the configured redirect URI
    #[must_use]
    pub fn redirect_uri(&self) -> &str {
        &self.config.redirect_uri
    }

    /// Get a reference to the OAuth configuration
    #[must_use]
    pub const fn config(&self) -> &OAuthConfig {
        &self.config
    }

    async fn post_token_request(
        &self,
        mut params: Vec<(String, String)>,
    ) -> Result<TokenResponse, OAuthClientError> {
        let mut request = self.client.post(self.config.token_endpoint.as_str());

        match (&self.config.client_auth, &self.config.client_secret) {
            (ClientAuthMethod::BasicHeader, Some(secret)) => {
                request = request.basic_auth(&self.config.client_id, Some(secret));
            }
            (ClientAuthMethod::RequestBody, Some(secret)) => {
                params.push(("client_secret".to_string(), secret.clone()));
            }
            _ => {}
        }

        let response = request.form(&params).send().await?;
        parse_token_response(response).await
    }
}

async fn parse_token_response(response: Response) -> Result<TokenResponse, OAuthClientError> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        return Err(serde_json::from_str::<OAuthError>(&body).map_or_else(
            |_| OAuthClientError::HttpStatus { status: status.as_u16(), body: body.clone() },
            OAuthClientError::OAuthError,
        ));
    }

    let token: TokenResponse = serde_json::from_str(&body)
        .map_err(|e| OAuthClientError::ParseError(format!("invalid token response: {e}")))?;

    if token.access_token.is_empty() {
        return Err(OAuthClientError::ParseError("token response has empty access_token".into()));
    }

    Ok(token)
}

#[async_trait]
impl OAuthClientTrait for OAuthClient {
    fn authorization_url(&self, session: &PkceSession) -> Result<String, OAuthClientError> {
        Self::authorization_url(self, session)
    }

    async fn exchange_code(
        &self,
        code: &str,
        code_verifier: &str,
    ) -> Result<TokenResponse, OAuthClientError> {
        Self::exchange_code(self, code, code_verifier).await
    }

    async fn refresh_access_token(
        &self,
        refresh_token: &str,
    ) -> Result<TokenResponse, OAuthClientError> {
        Self::refresh_access_token(self, refresh_token).await
    }

    fn redirect_uri(&self) -> &str {
        Self::redirect_uri(self)
    }
}
