//! Spotify accounts service and Web API

use async_trait::async_trait;
use moodmix_common::auth::{ClientAuthMethod, OAuthConfig};
use moodmix_core::{PlaylistApi, ProfileFetcher, TrackSearch};
use moodmix_domain::{
    NewPlaylist, Profile, Provider, ProviderCredentials, RemotePlaylist, Result, SpotifyProfile,
    TrackInfo,
};
use serde::de::IgnoredAny;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::http::HttpClient;

/// Accounts service authorization page
pub const AUTHORIZE_URL: &str = "https://accounts.spotify.com/authorize";
/// Accounts service token endpoint
pub const TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
/// Web API root
pub const API_BASE: &str = "https://api.spotify.com/v1";

const PLAYLIST_PAGE_SIZE: &str = "50";
const SEARCH_LIMIT: &str = "10";
/// Most URIs one add-tracks request accepts
const MAX_URIS_PER_REQUEST: usize = 100;

/// Scopes requested at login
pub const SCOPES: &[&str] = &[
    "user-read-private",
    "user-read-email",
    "playlist-read-private",
    "playlist-modify-public",
    "playlist-modify-private",
    "user-library-read",
    "user-library-modify",
    "user-top-read",
];

/// OAuth settings; the secret, when configured, is sent as HTTP Basic auth.
pub fn oauth_config(credentials: &ProviderCredentials, redirect_uri: impl Into<String>) -> OAuthConfig {
    OAuthConfig::new(
        AUTHORIZE_URL,
        TOKEN_URL,
        credentials.client_id.clone(),
        redirect_uri,
        SCOPES.iter().map(|scope| (*scope).to_string()).collect(),
    )
    .with_client_secret(credentials.client_secret.clone(), ClientAuthMethod::BasicHeader)
}

/// Web API client
#[derive(Clone)]
pub struct SpotifyClient {
    http: HttpClient,
    api_base: String,
}

impl SpotifyClient {
    /// Client for the public Web API
    pub fn new(http: HttpClient) -> Self {
        Self::with_api_base(http, API_BASE)
    }

    /// Point the client at another base URL (tests use a mock server)
    pub fn with_api_base(http: HttpClient, api_base: impl Into<String>) -> Self {
        Self { http, api_base: api_base.into().trim_end_matches('/').to_string() }
    }
}

#[derive(Debug, Deserialize)]
struct MeResponse {
    id: String,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    images: Vec<ImageObject>,
}

#[derive(Debug, Deserialize)]
struct ImageObject {
    url: String,
}

#[derive(Debug, Deserialize)]
struct Page<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct PlaylistObject {
    id: String,
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    images: Option<Vec<ImageObject>>,
    tracks: PlaylistTracks,
}

#[derive(Debug, Deserialize)]
struct PlaylistTracks {
    total: u64,
}

impl From<PlaylistObject> for RemotePlaylist {
    fn from(playlist: PlaylistObject) -> Self {
        Self {
            provider: Provider::Spotify,
            id: playlist.id,
            name: playlist.name,
            description: playlist.description.unwrap_or_default(),
            image_url: playlist.images.unwrap_or_default().into_iter().next().map(|image| image.url),
            item_count: playlist.tracks.total,
        }
    }
}

#[derive(Debug, Serialize)]
struct CreatePlaylistBody<'a> {
    name: &'a str,
    description: &'a str,
    public: bool,
}

#[derive(Debug, Serialize)]
struct AddTracksBody<'a> {
    uris: &'a [String],
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    tracks: Page<TrackObject>,
}

#[derive(Debug, Deserialize)]
struct TrackObject {
    id: String,
    uri: String,
    name: String,
    duration_ms: u64,
    #[serde(default)]
    artists: Vec<ArtistObject>,
    album: AlbumObject,
}

#[derive(Debug, Deserialize)]
struct ArtistObject {
    name: String,
}

#[derive(Debug, Deserialize)]
struct AlbumObject {
    name: String,
    #[serde(default)]
    images: Vec<ImageObject>,
}

impl From<TrackObject> for TrackInfo {
    fn from(track: TrackObject) -> Self {
        Self {
            id: track.id,
            uri: track.uri,
            name: track.name,
            artists: track.artists.into_iter().map(|artist| artist.name).collect(),
            album: track.album.name,
            duration_ms: track.duration_ms,
            image_url: track.album.images.into_iter().next().map(|image| image.url),
        }
    }
}

#[async_trait]
impl ProfileFetcher for SpotifyClient {
    async fn fetch_profile(&self, access_token: &str) -> Result<Profile> {
        let url = format!("{}/me", self.api_base);
        let me: MeResponse = self.http.get_json(&url, access_token, &[]).await?;
        debug!(user_id = %me.id, "fetched spotify profile");

        Ok(Profile::Spotify(SpotifyProfile {
            id: me.id,
            display_name: me.display_name,
            email: me.email,
            image_url: me.images.into_iter().next().map(|image| image.url),
        }))
    }
}

#[async_trait]
impl PlaylistApi for SpotifyClient {
    async fn list_playlists(&self, access_token: &str) -> Result<Vec<RemotePlaylist>> {
        let url = format!("{}/me/playlists", self.api_base);
        let page: Page<PlaylistObject> =
            self.http.get_json(&url, access_token, &[("limit", PLAYLIST_PAGE_SIZE)]).await?;
        Ok(page.items.into_iter().map(RemotePlaylist::from).collect())
    }

    async fn create_playlist(
        &self,
        access_token: &str,
        owner_id: &str,
        playlist: &NewPlaylist,
    ) -> Result<RemotePlaylist> {
        let url = format!("{}/users/{}/playlists", self.api_base, urlencoding::encode(owner_id));
        let body = CreatePlaylistBody {
            name: &playlist.name,
            description: &playlist.description,
            public: playlist.public,
        };
        let created: PlaylistObject = self.http.post_json(&url, access_token, &[], &body).await?;
        Ok(created.into())
    }

    async fn add_items(&self, access_token: &str, playlist_id: &str, items: &[String]) -> Result<()> {
        let url = format!("{}/playlists/{}/tracks", self.api_base, urlencoding::encode(playlist_id));
        for uris in items.chunks(MAX_URIS_PER_REQUEST) {
            let _: IgnoredAny =
                self.http.post_json(&url, access_token, &[], &AddTracksBody { uris }).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl TrackSearch for SpotifyClient {
    async fn search_tracks(&self, access_token: &str, query: &str) -> Result<Vec<TrackInfo>> {
        let url = format!("{}/search", self.api_base);
        let results: SearchResponse = self
            .http
            .get_json(&url, access_token, &[("q", query), ("type", "track"), ("limit", SEARCH_LIMIT)])
            .await?;
        Ok(results.tracks.items.into_iter().map(TrackInfo::from).collect())
    }
}
