//! Application constants
//!
//! Centralized location for all domain-level constants used throughout the
//! application.

// Token lifecycle
/// Seconds between refresh checks
pub const REFRESH_CHECK_INTERVAL_SECS: u64 = 60;
/// Refresh once a token expires within this many seconds
pub const REFRESH_THRESHOLD_SECS: u64 = 5 * 60;

// PKCE sessions
/// Lifetime of a pending verifier and of the login cookies
pub const PKCE_SESSION_TTL_SECS: u64 = 5 * 60;

// Cookies set by the HTTP layer
/// `<provider>_code_verifier`
pub const VERIFIER_COOKIE_SUFFIX: &str = "_code_verifier";
/// `<provider>_auth_state`
pub const RELAY_STATE_COOKIE_SUFFIX: &str = "_auth_state";
/// `<provider>_auth_code`
pub const RELAY_CODE_COOKIE_SUFFIX: &str = "_auth_code";

// Entry page
/// Public origin used when none is configured
pub const DEFAULT_APP_URL: &str = "http://localhost:3000";
/// Listen address used when none is configured
pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:3000";
/// Store file used when none is configured
pub const DEFAULT_STORAGE_PATH: &str = "moodmix-store.json";

// Library storage keys
/// Ids of liked songs
pub const LIKED_SONGS_KEY: &str = "liked_songs";
/// The saved playlist
pub const PLAYLIST_ORDER_KEY: &str = "playlist_order";
/// Recently played videos, newest first
pub const VIDEO_HISTORY_KEY: &str = "youtube_video_history";
/// Whether the player wraps around
pub const REPEAT_MODE_KEY: &str = "player_repeat_mode";
/// Entries kept in the video history
pub const VIDEO_HISTORY_LIMIT: usize = 10;

// HTTP clients
/// Timeout of every provider API call
pub const HTTP_TIMEOUT_SECS: u64 = 30;
