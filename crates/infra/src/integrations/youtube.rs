//! Google OAuth and the YouTube Data API

use async_trait::async_trait;
use moodmix_common::auth::{ClientAuthMethod, OAuthConfig};
use moodmix_core::{PlaylistApi, ProfileFetcher, VideoSearch};
use moodmix_domain::{
    MoodmixError, NewPlaylist, Profile, Provider, ProviderCredentials, RemotePlaylist, Result,
    VideoInfo, YouTubeChannel,
};
use serde::de::IgnoredAny;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::http::HttpClient;

/// Google authorization page
pub const AUTHORIZE_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
/// Google token endpoint
pub const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
/// Data API root
pub const API_BASE: &str = "https://www.googleapis.com/youtube/v3";

/// Scopes requested at login
pub const SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/youtube.readonly",
    "https://www.googleapis.com/auth/youtube",
];

const SEARCH_RESULTS: &str = "10";
const PLAYLIST_PAGE_SIZE: &str = "50";

/// OAuth settings; offline access with forced consent so Google always
/// returns a refresh token. The secret travels in the form body.
pub fn oauth_config(credentials: &ProviderCredentials, redirect_uri: impl Into<String>) -> OAuthConfig {
    OAuthConfig::new(
        AUTHORIZE_URL,
        TOKEN_URL,
        credentials.client_id.clone(),
        redirect_uri,
        SCOPES.iter().map(|scope| (*scope).to_string()).collect(),
    )
    .with_client_secret(credentials.client_secret.clone(), ClientAuthMethod::RequestBody)
    .with_authorize_param("access_type", "offline")
    .with_authorize_param("prompt", "consent")
}

/// Data API client
#[derive(Clone)]
pub struct YouTubeClient {
    http: HttpClient,
    api_base: String,
}

impl YouTubeClient {
    /// Client for the public Data API
    pub fn new(http: HttpClient) -> Self {
        Self::with_api_base(http, API_BASE)
    }

    /// Point the client at another base URL (tests use a mock server)
    pub fn with_api_base(http: HttpClient, api_base: impl Into<String>) -> Self {
        Self { http, api_base: api_base.into().trim_end_matches('/').to_string() }
    }
}

#[derive(Debug, Deserialize)]
struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
}

#[derive(Debug, Default, Deserialize)]
struct Thumbnails {
    #[serde(default)]
    default: Option<Thumbnail>,
    #[serde(default)]
    medium: Option<Thumbnail>,
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
    url: String,
}

impl Thumbnails {
    fn smallest(self) -> Option<String> {
        self.default.or(self.medium).map(|t| t.url)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaylistItem {
    id: String,
    snippet: PlaylistSnippet,
    #[serde(default)]
    content_details: Option<PlaylistContentDetails>,
}

#[derive(Debug, Deserialize)]
struct PlaylistSnippet {
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    thumbnails: Thumbnails,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaylistContentDetails {
    item_count: u64,
}

impl From<PlaylistItem> for RemotePlaylist {
    fn from(item: PlaylistItem) -> Self {
        Self {
            provider: Provider::YouTube,
            id: item.id,
            name: item.snippet.title,
            description: item.snippet.description,
            image_url: item.snippet.thumbnails.smallest(),
            item_count: item.content_details.map_or(0, |details| details.item_count),
        }
    }
}

const fn privacy_status(public: bool) -> &'static str {
    if public {
        "public"
    } else {
        "private"
    }
}

#[derive(Debug, Deserialize)]
struct ChannelItem {
    id: String,
    snippet: ChannelSnippet,
}

#[derive(Debug, Deserialize)]
struct ChannelSnippet {
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    thumbnails: Thumbnails,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    id: SearchId,
    snippet: SearchSnippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchId {
    #[serde(default)]
    video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchSnippet {
    title: String,
    #[serde(default)]
    channel_title: String,
    #[serde(default)]
    thumbnails: Thumbnails,
}

#[async_trait]
impl ProfileFetcher for YouTubeClient {
    async fn fetch_profile(&self, access_token: &str) -> Result<Profile> {
        let url = format!("{}/channels", self.api_base);
        let channels: ListResponse<ChannelItem> = self
            .http
            .get_json(&url, access_token, &[("part", "snippet"), ("mine", "true")])
            .await?;

        let channel = channels
            .items
            .into_iter()
            .next()
            .ok_or_else(|| MoodmixError::NotFound("No YouTube channel found".to_string()))?;
        debug!(channel_id = %channel.id, "fetched youtube channel");

        let ChannelSnippet { title, description, thumbnails } = channel.snippet;
        Ok(Profile::YouTube(YouTubeChannel {
            id: channel.id,
            title,
            description,
            thumbnail_url: thumbnails.smallest(),
        }))
    }
}

#[async_trait]
impl VideoSearch for YouTubeClient {
    async fn search_video(&self, access_token: &str, query: &str) -> Result<Option<VideoInfo>> {
        let url = format!("{}/search", self.api_base);
        let results: ListResponse<SearchItem> = self
            .http
            .get_json(
                &url,
                access_token,
                &[("part", "snippet"), ("type", "video"), ("maxResults", SEARCH_RESULTS), ("q", query)],
            )
            .await?;

        Ok(results.items.into_iter().find_map(|item| {
            let id = item.id.video_id?;
            let SearchSnippet { title, channel_title, thumbnails } = item.snippet;
            Some(VideoInfo {
                id,
                title,
                thumbnail: thumbnails.medium.or(thumbnails.default).map(|t| t.url).unwrap_or_default(),
                channel_title,
            })
        }))
    }
}

#[async_trait]
impl PlaylistApi for YouTubeClient {
    async fn list_playlists(&self, access_token: &str) -> Result<Vec<RemotePlaylist>> {
        let url = format!("{}/playlists", self.api_base);
        let playlists: ListResponse<PlaylistItem> = self
            .http
            .get_json(
                &url,
                access_token,
                &[("part", "snippet,contentDetails"), ("mine", "true"), ("maxResults", PLAYLIST_PAGE_SIZE)],
            )
            .await?;
        Ok(playlists.items.into_iter().map(RemotePlaylist::from).collect())
    }

    /// The owner is implied by the token; `owner_id` is not sent.
    async fn create_playlist(
        &self,
        access_token: &str,
        _owner_id: &str,
        playlist: &NewPlaylist,
    ) -> Result<RemotePlaylist> {
        let url = format!("{}/playlists", self.api_base);
        let body = json!({
            "snippet": { "title": playlist.name, "description": playlist.description },
            "status": { "privacyStatus": privacy_status(playlist.public) },
        });
        let created: PlaylistItem =
            self.http.post_json(&url, access_token, &[("part", "snippet,status")], &body).await?;
        Ok(created.into())
    }

    /// One request per video; the Data API has no batch insert.
    async fn add_items(&self, access_token: &str, playlist_id: &str, items: &[String]) -> Result<()> {
        let url = format!("{}/playlistItems", self.api_base);
        for video_id in items {
            let body = json!({
                "snippet": {
                    "playlistId": playlist_id,
                    "resourceId": { "kind": "youtube#video", "videoId": video_id },
                },
            });
            let _: IgnoredAny =
                self.http.post_json(&url, access_token, &[("part", "snippet")], &body).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn oauth_config_requests_offline_access() {
        let credentials = ProviderCredentials {
            client_id: "google-client".to_string(),
            client_secret: Some("secret".to_string()),
        };
        let config = oauth_config(&credentials, "http://localhost:3000/api/auth/youtube/callback");

        assert_eq!(config.client_auth, ClientAuthMethod::RequestBody);
        assert!(config
            .extra_authorize_params
            .contains(&("access_type".to_string(), "offline".to_string())));
        assert!(config.extra_authorize_params.contains(&("prompt".to_string(), "consent".to_string())));
        assert_eq!(config.scope_string(), SCOPES.join(" "));
    }
}
