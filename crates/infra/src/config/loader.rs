//! Configuration loader
//!
//! Loads application configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If a required variable is missing, falls back to loading from file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//!
//! ## Environment Variables
//! Required:
//! - `MOODMIX_SPOTIFY_CLIENT_ID`: Spotify application client id
//! - `MOODMIX_YOUTUBE_CLIENT_ID`: Google OAuth client id
//!
//! Optional:
//! - `MOODMIX_SPOTIFY_CLIENT_SECRET`, `MOODMIX_YOUTUBE_CLIENT_SECRET`
//! - `APP_URL`: Public origin used for redirect URIs (default `http://localhost:3000`)
//! - `MOODMIX_BIND_ADDRESS`: Server socket address (default `127.0.0.1:3000`)
//! - `MOODMIX_STORAGE_PATH`: Path of the JSON store file
//! - `MOODMIX_REFRESH_INTERVAL_SECS`: Refresh check interval in seconds
//! - `MOODMIX_REFRESH_THRESHOLD_SECS`: Refresh tokens expiring within this window
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./config.json` or `./config.toml` (current working directory)
//! 2. `./moodmix.json` or `./moodmix.toml` (current working directory)
//! 3. `../config.json` or `../config.toml` (parent directory)
//! 4. `../../config.json` or `../../config.toml` (grandparent directory)
//! 5. Relative to executable location

use std::path::{Path, PathBuf};

use moodmix_domain::{
    AuthSettings, Config, MoodmixError, ProviderCredentials, Result, ServerConfig, StorageConfig,
};

/// Load configuration with automatic fallback strategy
///
/// First attempts to load from environment variables. If any required
/// variables are missing, falls back to loading from a config file.
///
/// # Errors
/// Returns `MoodmixError::Config` if:
/// - Configuration cannot be loaded from either source
/// - File format is invalid
/// - Required fields are missing
pub fn load() -> Result<Config> {
    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = ?e, "Failed to load from environment, trying file");
            load_from_file(None)
        }
    }
}

/// Load configuration from environment variables
///
/// The two client ids must be present; everything else falls back to the
/// defaults of [`Config`].
///
/// # Errors
/// Returns `MoodmixError::Config` if required variables are missing
/// or have invalid values.
pub fn load_from_env() -> Result<Config> {
    let spotify_client_id = env_var("MOODMIX_SPOTIFY_CLIENT_ID")?;
    let youtube_client_id = env_var("MOODMIX_YOUTUBE_CLIENT_ID")?;

    let server_defaults = ServerConfig::default();
    let auth_defaults = AuthSettings::default();

    Ok(Config {
        server: ServerConfig {
            bind_address: env_optional("MOODMIX_BIND_ADDRESS")
                .unwrap_or(server_defaults.bind_address),
            app_url: env_optional("APP_URL").unwrap_or(server_defaults.app_url),
        },
        storage: StorageConfig {
            path: env_optional("MOODMIX_STORAGE_PATH").unwrap_or_else(|| StorageConfig::default().path),
        },
        auth: AuthSettings {
            refresh_interval_seconds: env_u64(
                "MOODMIX_REFRESH_INTERVAL_SECS",
                auth_defaults.refresh_interval_seconds,
            )?,
            refresh_threshold_seconds: env_u64(
                "MOODMIX_REFRESH_THRESHOLD_SECS",
                auth_defaults.refresh_threshold_seconds,
            )?,
            pkce_ttl_seconds: auth_defaults.pkce_ttl_seconds,
        },
        spotify: ProviderCredentials {
            client_id: spotify_client_id,
            client_secret: env_optional("MOODMIX_SPOTIFY_CLIENT_SECRET"),
        },
        youtube: ProviderCredentials {
            client_id: youtube_client_id,
            client_secret: env_optional("MOODMIX_YOUTUBE_CLIENT_SECRET"),
        },
    })
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Errors
/// Returns `MoodmixError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
/// - Required fields are missing
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(MoodmixError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            MoodmixError::Config(
                "No config file found in any of the standard locations".to_string(),
            )
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| MoodmixError::Config(format!("Failed to read config file: {e}")))?;

    parse_config(&contents, &config_path)
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`).
fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    let config: Config = match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| MoodmixError::Config(format!("Invalid TOML format: {e}")))?,
        "json" => serde_json::from_str(contents)
            .map_err(|e| MoodmixError::Config(format!("Invalid JSON format: {e}")))?,
        _ => return Err(MoodmixError::Config(format!("Unsupported config format: {extension}"))),
    };

    validate(config)
}

fn validate(config: Config) -> Result<Config> {
    for (name, credentials) in [("spotify", &config.spotify), ("youtube", &config.youtube)] {
        if credentials.client_id.trim().is_empty() {
            return Err(MoodmixError::Config(format!("{name}.client_id must not be empty")));
        }
    }
    url::Url::parse(&config.server.app_url)
        .map_err(|e| MoodmixError::Config(format!("Invalid app_url: {e}")))?;
    Ok(config)
}

/// Probe multiple paths for configuration files
///
/// Searches for config files in the following locations (in order):
/// 1. Current working directory (`./config.{json,toml}`,
///    `./moodmix.{json,toml}`)
/// 2. Parent directories (up to 2 levels)
/// 3. Relative to executable location
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut candidates = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        candidates.extend(candidates_in(&cwd));
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            candidates.extend(candidates_in(exe_dir));
        }
    }

    candidates.into_iter().find(|path| path.exists())
}

fn candidates_in(dir: &Path) -> Vec<PathBuf> {
    vec![
        dir.join("config.json"),
        dir.join("config.toml"),
        dir.join("moodmix.json"),
        dir.join("moodmix.toml"),
        dir.join("../config.json"),
        dir.join("../config.toml"),
        dir.join("../../config.json"),
        dir.join("../../config.toml"),
    ]
}

/// Get required environment variable
///
/// # Errors
/// Returns `MoodmixError::Config` if the variable is not set or empty.
fn env_var(key: &str) -> Result<String> {
    env_optional(key).ok_or_else(|| {
        MoodmixError::Config(format!("Missing required environment variable: {key}"))
    })
}

/// Non-empty environment variable, if set
fn env_optional(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}

/// Parse an optional integer variable
fn env_u64(key: &str, default: u64) -> Result<u64> {
    env_optional(key).map_or(Ok(default), |raw| {
        raw.trim()
            .parse::<u64>()
            .map_err(|e| MoodmixError::Config(format!("Invalid value for {key}: {e}")))
    })
}
