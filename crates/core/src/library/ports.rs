//! Ports implemented by the provider adapters in `moodmix-infra`

use async_trait::async_trait;
use moodmix_domain::{NewPlaylist, RemotePlaylist, Result, TrackInfo, VideoInfo};

/// Finds a playable video for a free-text query
#[async_trait]
pub trait VideoSearch: Send + Sync {
    /// First matching video, or `None` when the search has no results.
    ///
    /// # Errors
    /// Returns an error when the request fails or the payload is malformed.
    async fn search_video(&self, access_token: &str, query: &str) -> Result<Option<VideoInfo>>;
}

/// Playlists on the connected account of one provider
#[async_trait]
pub trait PlaylistApi: Send + Sync {
    /// The account's playlists, first page only.
    ///
    /// # Errors
    /// Returns an error when the request fails or the payload is malformed.
    async fn list_playlists(&self, access_token: &str) -> Result<Vec<RemotePlaylist>>;

    /// Create a playlist owned by `owner_id` (the profile id of the account).
    ///
    /// # Errors
    /// Returns an error when the request fails or the payload is malformed.
    async fn create_playlist(
        &self,
        access_token: &str,
        owner_id: &str,
        playlist: &NewPlaylist,
    ) -> Result<RemotePlaylist>;

    /// Append items: track URIs on Spotify, video ids on YouTube.
    ///
    /// # Errors
    /// Returns an error when a request fails; items added before it stay.
    async fn add_items(&self, access_token: &str, playlist_id: &str, items: &[String]) -> Result<()>;
}

/// Spotify catalogue search
#[async_trait]
pub trait TrackSearch: Send + Sync {
    /// Up to ten tracks matching `query`, best match first.
    ///
    /// # Errors
    /// Returns an error when the request fails or the payload is malformed.
    async fn search_tracks(&self, access_token: &str, query: &str) -> Result<Vec<TrackInfo>>;
}
