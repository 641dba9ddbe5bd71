//! Configuration structures
//!
//! Loaded by `moodmix-infra::config::loader` from the environment or from a
//! TOML/JSON file. Every section except the provider credentials has defaults.

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_APP_URL, DEFAULT_BIND_ADDRESS, DEFAULT_STORAGE_PATH, PKCE_SESSION_TTL_SECS,
    REFRESH_CHECK_INTERVAL_SECS, REFRESH_THRESHOLD_SECS,
};

/// Top-level application configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub auth: AuthSettings,
    pub spotify: ProviderCredentials,
    pub youtube: ProviderCredentials,
}

/// HTTP server settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Socket address the callback server binds to
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    /// Public origin of the app; redirect URIs and entry-page redirects
    /// are built from it
    #[serde(default = "default_app_url")]
    pub app_url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { bind_address: default_bind_address(), app_url: default_app_url() }
    }
}

impl ServerConfig {
    /// `<app_url>/api/auth/<provider>/callback`
    pub fn redirect_uri(&self, provider: &str) -> String {
        format!("{}/api/auth/{}/callback", self.app_url.trim_end_matches('/'), provider)
    }
}

/// Durable key-value store location
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_storage_path")]
    pub path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self { path: default_storage_path() }
    }
}

/// Token lifecycle tuning
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSettings {
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_seconds: u64,
    #[serde(default = "default_refresh_threshold")]
    pub refresh_threshold_seconds: u64,
    #[serde(default = "default_pkce_ttl")]
    pub pkce_ttl_seconds: u64,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            refresh_interval_seconds: default_refresh_interval(),
            refresh_threshold_seconds: default_refresh_threshold(),
            pkce_ttl_seconds: default_pkce_ttl(),
        }
    }
}

/// OAuth client registration for one provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderCredentials {
    pub client_id: String,
    #[serde(default)]
    pub client_secret: Option<String>,
}

fn default_bind_address() -> String {
    DEFAULT_BIND_ADDRESS.to_string()
}

fn default_app_url() -> String {
    DEFAULT_APP_URL.to_string()
}

fn default_storage_path() -> String {
    DEFAULT_STORAGE_PATH.to_string()
}

const fn default_refresh_interval() -> u64 {
    REFRESH_CHECK_INTERVAL_SECS
}

const fn default_refresh_threshold() -> u64 {
    REFRESH_THRESHOLD_SECS
}

const fn default_pkce_ttl() -> u64 {
    PKCE_SESSION_TTL_SECS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_toml_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [spotify]
            client_id = "spotify-id"
            client_secret = "spotify-secret"

            [youtube]
            client_id = "youtube-id"
            "#,
        )
        .unwrap();

        assert_eq!(config.server.app_url, DEFAULT_APP_URL);
        assert_eq!(config.auth.refresh_interval_seconds, 60);
        assert_eq!(config.auth.refresh_threshold_seconds, 300);
        assert_eq!(config.spotify.client_secret.as_deref(), Some("spotify-secret"));
        assert!(config.youtube.client_secret.is_none());
    }

    #[test]
    fn redirect_uri_ignores_trailing_slash() {
        let server = ServerConfig {
            bind_address: DEFAULT_BIND_ADDRESS.to_string(),
            app_url: "https://moodmix.example/".to_string(),
        };

        assert_eq!(
            server.redirect_uri("youtube"),
            "https://moodmix.example/api/auth/youtube/callback"
        );
    }
}
