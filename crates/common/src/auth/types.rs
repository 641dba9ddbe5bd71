//! OAuth 2.0 wire types and provider configuration

use std::fmt;

use serde::Deserialize;

/// How the client authenticates itself at the token endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClientAuthMethod {
    /// Public client: only `client_id` is sent
    #[default]
    None,
    /// `client_secret` travels in the form body
    RequestBody,
    /// `Authorization: Basic base64(client_id:client_secret)`
    BasicHeader,
}

/// OAuth configuration for one authorization server
#[derive(Debug, Clone)]
pub struct OAuthConfig {
    pub authorization_endpoint: String,
    pub token_endpoint: String,
    pub client_id: String,
    pub client_secret: Option<String>,
    pub client_auth: ClientAuthMethod,
    pub redirect_uri: String,
    pub scopes: Vec<String>,
    /// Provider flags appended to the authorization URL
    pub extra_authorize_params: Vec<(String, String)>,
}

impl OAuthConfig {
    /// Public-client configuration with no extra parameters
    pub fn new(
        authorization_endpoint: impl Into<String>,
        token_endpoint: impl Into<String>,
        client_id: impl Into<String>,
        redirect_uri: impl Into<String>,
        scopes: Vec<String>,
    ) -> Self {
        Self {
            authorization_endpoint: authorization_endpoint.into(),
            token_endpoint: token_endpoint.into(),
            client_id: client_id.into(),
            client_secret: None,
            client_auth: ClientAuthMethod::None,
            redirect_uri: redirect_uri.into(),
            scopes,
            extra_authorize_params: Vec::new(),
        }
    }

    /// Attach a client secret and the way it is presented
    #[must_use]
    pub fn with_client_secret(mut self, secret: Option<String>, method: ClientAuthMethod) -> Self {
        self.client_auth = if secret.is_some() { method } else { ClientAuthMethod::None };
        self.client_secret = secret;
        self
    }

    #[must_use]
    pub fn with_authorize_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_authorize_params.push((key.into(), value.into()));
        self
    }

    /// Scopes joined by single spaces
    pub fn scope_string(&self) -> String {
        self.scopes.join(" ")
    }
}

/// Token endpoint success body (RFC 6749 §5.1).
///
/// `expires_in` is required; a grant without a lifetime is rejected at the
/// boundary.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
}

impl TokenResponse {
    /// Absolute expiry in epoch milliseconds for a grant issued at `now_ms`
    pub fn expires_at(&self, now_ms: i64) -> i64 {
        now_ms.saturating_add(self.expires_in.saturating_mul(1000))
    }
}

/// Standard OAuth 2.0 error response format (RFC 6749 §5.2).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OAuthError {
    pub error: String,
    #[serde(default)]
    pub error_description: Option<String>,
}

impl fmt::Display for OAuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.error_description {
            Some(desc) => write!(f, "{}: {}", self.error, desc),
            None => write!(f, "{}", self.error),
        }
    }
}

impl std::error::Error for OAuthError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secret_is_ignored_without_value() {
        let config = OAuthConfig::new("a", "t", "id", "r", vec![])
            .with_client_secret(None, ClientAuthMethod::BasicHeader);
        assert_eq!(config.client_auth, ClientAuthMethod::None);
    }

    #[test]
    fn token_response_requires_expiry() {
        let missing = r#"{"access_token":"a","token_type":"Bearer"}"#;
        assert!(serde_json::from_str::<TokenResponse>(missing).is_err());

        let full = r#"{"access_token":"a","token_type":"Bearer","expires_in":3600}"#;
        let parsed: TokenResponse = serde_json::from_str(full).unwrap();
        assert_eq!(parsed.expires_at(1_000), 3_601_000);
        assert!(parsed.refresh_token.is_none());
    }
}
