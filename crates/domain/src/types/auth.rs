//! Provider identities and the persisted per-provider auth record

use serde::{Deserialize, Serialize};

use crate::impl_domain_enum_conversions;

/// Music/video provider a user can connect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Spotify,
    YouTube,
}

impl_domain_enum_conversions!(Provider {
    Spotify => "spotify",
    YouTube => "youtube",
});

/// How a provider's redirect reaches us
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackFlow {
    /// The callback can read the verifier from a request-scoped cookie.
    Direct,
    /// The callback only relays `state`/`code`; a bridge step recovers the
    /// verifier from durable storage.
    StateRelayed,
}

impl Provider {
    /// Every supported provider, in refresh-task order
    pub const ALL: [Self; 2] = [Self::Spotify, Self::YouTube];

    /// Human readable name used in user-facing messages
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Spotify => "Spotify",
            Self::YouTube => "YouTube",
        }
    }

    /// How this provider's callback reaches the verifier
    pub const fn callback_flow(self) -> CallbackFlow {
        match self {
            Self::Spotify => CallbackFlow::Direct,
            Self::YouTube => CallbackFlow::StateRelayed,
        }
    }

    /// Durable storage key of the provider's `AuthRecord` (`spotify_auth`)
    pub fn auth_storage_key(self) -> String {
        format!("{self}_auth")
    }

    /// Prefix shared by every pending PKCE verifier of this provider
    pub fn verifier_key_prefix(self) -> String {
        format!("{self}_cv_")
    }

    /// Storage key of the verifier created for `state` (`youtube_cv_<state>`)
    pub fn verifier_key(self, state: &str) -> String {
        format!("{}{state}", self.verifier_key_prefix())
    }

    /// Query flag appended to the entry page after a successful login
    pub fn success_flag(self) -> String {
        format!("{self}_auth_success")
    }
}

/// Tokens and identity for one connected provider.
///
/// `expires_at` is mandatory: an access token without an expiry cannot be
/// represented, and records that fail to decode are treated as absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthRecord {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Epoch milliseconds of the latest grant's expiry
    pub expires_at: i64,
    pub profile: Profile,
}

impl AuthRecord {
    pub fn provider(&self) -> Provider {
        self.profile.provider()
    }

    /// True when a non-empty refresh token is available
    pub fn can_refresh(&self) -> bool {
        self.refresh_token.as_deref().is_some_and(|token| !token.is_empty())
    }

    /// True when the token expires at or before `now_ms + threshold_ms`
    pub fn expires_within(&self, now_ms: i64, threshold_ms: i64) -> bool {
        self.expires_at <= now_ms.saturating_add(threshold_ms)
    }

    /// Whether the access token expired at `now_ms`
    pub fn is_expired(&self, now_ms: i64) -> bool {
        self.expires_within(now_ms, 0)
    }
}

/// Minimal identity fetched right after the code exchange
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "provider", rename_all = "lowercase")]
pub enum Profile {
    Spotify(SpotifyProfile),
    YouTube(YouTubeChannel),
}

impl Profile {
    pub const fn provider(&self) -> Provider {
        match self {
            Self::Spotify(_) => Provider::Spotify,
            Self::YouTube(_) => Provider::YouTube,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Self::Spotify(profile) => &profile.id,
            Self::YouTube(channel) => &channel.id,
        }
    }

    /// Display name for the connected account, falling back to the id
    pub fn display_name(&self) -> &str {
        match self {
            Self::Spotify(profile) => profile.display_name.as_deref().unwrap_or(&profile.id),
            Self::YouTube(channel) => &channel.title,
        }
    }
}

/// Spotify `/me` identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpotifyProfile {
    pub id: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// The channel of the connected Google account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YouTubeChannel {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
}
