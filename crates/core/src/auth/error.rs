//! Failure taxonomy of the login and refresh flows
//!
//! Every network or parse failure is converted into one of these variants at
//! the boundary (callback handling, refresh ticks). None of them is fatal: the
//! worst outcome is a disconnected provider plus a visible message.

use moodmix_common::auth::{OAuthClientError, PkceError};
use moodmix_common::error::{ErrorClassification, ErrorSeverity};
use moodmix_common::storage::StorageError;
use moodmix_domain::{MoodmixError, Provider};
use thiserror::Error;

/// Failures of the login, callback and refresh steps
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// The provider redirected back with an `error` parameter
    #[error("{} auth error: {reason}", .provider.display_name())]
    AuthDenied { provider: Provider, reason: String },

    #[error("No authorization code received from {}", .provider.display_name())]
    MissingCode { provider: Provider },

    #[error("Missing state parameter from {}", .provider.display_name())]
    MissingState { provider: Provider },

    /// No live verifier for the callback; the login must be restarted
    #[error("Missing code verifier for {} authentication", .provider.display_name())]
    MissingVerifier { provider: Provider },

    #[error("{} token exchange failed: {message}", .provider.display_name())]
    TokenExchange { provider: Provider, message: String },

    /// Tokens were issued but the identity call failed; nothing is persisted
    #[error("{} profile fetch failed: {message}", .provider.display_name())]
    ProfileFetch { provider: Provider, message: String },

    #[error("{} token refresh failed: {message}", .provider.display_name())]
    RefreshFailure { provider: Provider, message: String },

    #[error("{} is not connected", .provider.display_name())]
    NotAuthenticated { provider: Provider },

    #[error("{} authorization request could not be built: {message}", .provider.display_name())]
    Config { provider: Provider, message: String },

    #[error("auth storage failure: {0}")]
    Storage(String),

    #[error("PKCE generation failed: {0}")]
    Pkce(String),
}

impl AuthError {
    /// Exchange failure carrying the provider's own message
    pub fn token_exchange(provider: Provider, err: &OAuthClientError) -> Self {
        Self::TokenExchange { provider, message: err.provider_message() }
    }

    /// Refresh failure carrying the provider's own message
    pub fn refresh_failure(provider: Provider, err: &OAuthClientError) -> Self {
        Self::RefreshFailure { provider, message: err.provider_message() }
    }

    /// Provider the error belongs to, if any
    pub const fn provider(&self) -> Option<Provider> {
        match self {
            Self::AuthDenied { provider, .. }
            | Self::MissingCode { provider }
            | Self::MissingState { provider }
            | Self::MissingVerifier { provider }
            | Self::TokenExchange { provider, .. }
            | Self::ProfileFetch { provider, .. }
            | Self::RefreshFailure { provider, .. }
            | Self::NotAuthenticated { provider }
            | Self::Config { provider, .. } => Some(*provider),
            Self::Storage(_) | Self::Pkce(_) => None,
        }
    }

    /// Message shown to the user (entry-page `error` parameter, session
    /// error).
    ///
    /// Provider internals from exchange/profile failures stay in the logs.
    pub fn user_message(&self) -> String {
        match self {
            Self::TokenExchange { provider, .. }
            | Self::ProfileFetch { provider, .. }
            | Self::Config { provider, .. } => {
                format!("Failed to authenticate with {}", provider.display_name())
            }
            Self::RefreshFailure { provider, .. } => format!(
                "Your {} session expired. Please log in again.",
                provider.display_name()
            ),
            Self::Storage(_) | Self::Pkce(_) => "Failed to authenticate".to_string(),
            other => other.to_string(),
        }
    }
}

impl ErrorClassification for AuthError {
    fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::MissingCode { .. }
                | Self::MissingState { .. }
                | Self::MissingVerifier { .. }
                | Self::TokenExchange { .. }
                | Self::ProfileFetch { .. }
        )
    }

    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::AuthDenied { .. } | Self::NotAuthenticated { .. } => ErrorSeverity::Info,
            Self::MissingCode { .. }
            | Self::MissingState { .. }
            | Self::MissingVerifier { .. }
            | Self::RefreshFailure { .. } => ErrorSeverity::Warning,
            Self::TokenExchange { .. } | Self::ProfileFetch { .. } | Self::Storage(_) => {
                ErrorSeverity::Error
            }
            Self::Config { .. } | Self::Pkce(_) => ErrorSeverity::Critical,
        }
    }
}

impl From<StorageError> for AuthError {
    fn from(err: StorageError) -> Self {
        Self::Storage(err.to_string())
    }
}

impl From<PkceError> for AuthError {
    fn from(err: PkceError) -> Self {
        Self::Pkce(err.to_string())
    }
}

impl From<AuthError> for MoodmixError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Storage(msg) => Self::Storage(msg),
            AuthError::Pkce(msg) => Self::Internal(msg),
            AuthError::Config { .. } => Self::Config(err.to_string()),
            other => Self::Auth(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn denial_message_names_provider_and_reason() {
        let err = AuthError::AuthDenied {
            provider: Provider::Spotify,
            reason: "access_denied".to_string(),
        };

        assert_eq!(err.user_message(), "Spotify auth error: access_denied");
        assert!(!err.is_retryable());
        assert_eq!(err.severity(), ErrorSeverity::Info);
    }

    #[test]
    fn exchange_details_stay_out_of_user_message() {
        let err = AuthError::TokenExchange {
            provider: Provider::YouTube,
            message: "invalid_grant: Bad Request".to_string(),
        };

        assert_eq!(err.user_message(), "Failed to authenticate with YouTube");
        assert!(err.to_string().contains("invalid_grant"));
        assert!(err.is_retryable());
    }

    #[test]
    fn refresh_failure_asks_for_new_login() {
        let err = AuthError::RefreshFailure {
            provider: Provider::Spotify,
            message: "revoked".to_string(),
        };

        assert!(err.user_message().contains("Please log in again"));
        assert_eq!(err.provider(), Some(Provider::Spotify));
        assert!(matches!(MoodmixError::from(err), MoodmixError::Auth(_)));
    }
}
