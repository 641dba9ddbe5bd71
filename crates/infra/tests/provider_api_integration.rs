//! Provider Web API clients against a mock server
//!
//! Covers the playlist and catalogue calls of `SpotifyClient` and
//! `YouTubeClient`: request shape (path, query, bearer, JSON body) and the
//! mapping of provider payloads into `RemotePlaylist` / `TrackInfo`.

use std::time::Duration;

use moodmix_core::{PlaylistApi, TrackSearch};
use moodmix_domain::{MoodmixError, NewPlaylist, Provider};
use moodmix_infra::{HttpClient, SpotifyClient, YouTubeClient};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn http() -> HttpClient {
    HttpClient::builder()
        .max_attempts(1)
        .base_backoff(Duration::from_millis(1))
        .build()
        .expect("http client")
}

fn new_playlist(public: bool) -> NewPlaylist {
    NewPlaylist {
        name: "Evening".to_string(),
        description: "calm mood".to_string(),
        public,
    }
}

/// Validates `SpotifyClient::list_playlists` against `/me/playlists`.
///
/// Assertions:
/// - Requests the first 50 playlists with the bearer token.
/// - Null descriptions and image lists map to empty values.
#[tokio::test]
async fn spotify_lists_playlists() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/me/playlists"))
        .and(query_param("limit", "50"))
        .and(header("authorization", "Bearer sp-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                {
                    "id": "pl1",
                    "name": "Focus",
                    "description": "deep work",
                    "images": [{ "url": "https://img/1.jpg" }],
                    "tracks": { "total": 12 }
                },
                { "id": "pl2", "name": "Empty", "description": null, "images": null, "tracks": { "total": 0 } }
            ]
        })))
        .mount(&server)
        .await;

    let client = SpotifyClient::with_api_base(http(), server.uri());
    let playlists = client.list_playlists("sp-token").await.unwrap();

    assert_eq!(playlists.len(), 2);
    assert_eq!(playlists[0].provider, Provider::Spotify);
    assert_eq!(playlists[0].image_url.as_deref(), Some("https://img/1.jpg"));
    assert_eq!(playlists[0].item_count, 12);
    assert_eq!(playlists[1].description, "");
    assert_eq!(playlists[1].image_url, None);
}

/// Validates `SpotifyClient::create_playlist` and `add_items`.
///
/// Assertions:
/// - The playlist is created under the owner's user id with the public flag.
/// - Track URIs are posted to the playlist's tracks endpoint.
#[tokio::test]
async fn spotify_creates_playlist_and_adds_tracks() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/users/spotify-user/playlists"))
        .and(body_json(json!({ "name": "Evening", "description": "calm mood", "public": false })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": "new-pl",
            "name": "Evening",
            "description": "calm mood",
            "images": [],
            "tracks": { "total": 0 }
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/playlists/new-pl/tracks"))
        .and(body_json(json!({ "uris": ["spotify:track:a", "spotify:track:b"] })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "snapshot_id": "s1" })))
        .expect(1)
        .mount(&server)
        .await;

    let client = SpotifyClient::with_api_base(http(), server.uri());
    let created = client.create_playlist("sp-token", "spotify-user", &new_playlist(false)).await.unwrap();
    client
        .add_items(
            "sp-token",
            &created.id,
            &["spotify:track:a".to_string(), "spotify:track:b".to_string()],
        )
        .await
        .unwrap();

    assert_eq!(created.id, "new-pl");
    assert_eq!(created.item_count, 0);
}

/// Validates `SpotifyClient::search_tracks` against `/search`.
///
/// Assertions:
/// - Searches tracks only, ten at most.
/// - Artists, album and cover are flattened into `TrackInfo`.
#[tokio::test]
async fn spotify_search_flattens_tracks() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", "Drift Nova"))
        .and(query_param("type", "track"))
        .and(query_param("limit", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "tracks": {
                "items": [{
                    "id": "t1",
                    "uri": "spotify:track:t1",
                    "name": "Drift",
                    "duration_ms": 240000,
                    "artists": [{ "name": "Nova" }, { "name": "Echo" }],
                    "album": { "name": "Tides", "images": [{ "url": "https://img/t.jpg" }] }
                }]
            }
        })))
        .mount(&server)
        .await;

    let client = SpotifyClient::with_api_base(http(), server.uri());
    let tracks = client.search_tracks("sp-token", "Drift Nova").await.unwrap();

    assert_eq!(tracks.len(), 1);
    assert_eq!(tracks[0].uri, "spotify:track:t1");
    assert_eq!(tracks[0].artists, ["Nova", "Echo"]);
    assert_eq!(tracks[0].album, "Tides");
    assert_eq!(tracks[0].image_url.as_deref(), Some("https://img/t.jpg"));
}

#[tokio::test]
async fn spotify_rejected_token_is_auth_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/me/playlists"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": { "status": 401, "message": "The access token expired" }
        })))
        .mount(&server)
        .await;

    let client = SpotifyClient::with_api_base(http(), server.uri());
    let result = client.list_playlists("expired").await;

    assert!(matches!(result, Err(MoodmixError::Auth(_))));
}

/// Validates `YouTubeClient::list_playlists` against `/playlists`.
///
/// Assertions:
/// - Asks for snippet and content details of the caller's playlists.
/// - `itemCount` becomes the item count; a missing `items` list is empty.
#[tokio::test]
async fn youtube_lists_playlists() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/playlists"))
        .and(query_param("part", "snippet,contentDetails"))
        .and(query_param("mine", "true"))
        .and(query_param("maxResults", "50"))
        .and(header("authorization", "Bearer yt-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{
                "id": "PL1",
                "snippet": {
                    "title": "Watch later-ish",
                    "description": "",
                    "thumbnails": { "default": { "url": "https://i.ytimg/1.jpg" } }
                },
                "contentDetails": { "itemCount": 4 }
            }]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/playlists"))
        .and(header("authorization", "Bearer empty"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "kind": "youtube#playlistListResponse" })))
        .mount(&server)
        .await;

    let client = YouTubeClient::with_api_base(http(), server.uri());
    let playlists = client.list_playlists("yt-token").await.unwrap();
    let none = client.list_playlists("empty").await.unwrap();

    assert_eq!(playlists.len(), 1);
    assert_eq!(playlists[0].provider, Provider::YouTube);
    assert_eq!(playlists[0].name, "Watch later-ish");
    assert_eq!(playlists[0].item_count, 4);
    assert_eq!(playlists[0].image_url.as_deref(), Some("https://i.ytimg/1.jpg"));
    assert!(none.is_empty());
}

/// Validates `YouTubeClient::create_playlist` and `add_items`.
///
/// Assertions:
/// - A private playlist is requested unless `public` is set.
/// - Each video is inserted with its own `playlistItems` request.
#[tokio::test]
async fn youtube_creates_private_playlist_and_inserts_each_video() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/playlists"))
        .and(query_param("part", "snippet,status"))
        .and(body_json(json!({
            "snippet": { "title": "Evening", "description": "calm mood" },
            "status": { "privacyStatus": "private" }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "PLnew",
            "snippet": { "title": "Evening", "description": "calm mood", "thumbnails": {} }
        })))
        .expect(1)
        .mount(&server)
        .await;
    for video_id in ["v1", "v2"] {
        Mock::given(method("POST"))
            .and(path("/playlistItems"))
            .and(query_param("part", "snippet"))
            .and(body_json(json!({
                "snippet": {
                    "playlistId": "PLnew",
                    "resourceId": { "kind": "youtube#video", "videoId": video_id }
                }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": format!("item-{video_id}") })))
            .expect(1)
            .mount(&server)
            .await;
    }

    let client = YouTubeClient::with_api_base(http(), server.uri());
    let created = client.create_playlist("yt-token", "UC123", &new_playlist(false)).await.unwrap();
    client
        .add_items("yt-token", &created.id, &["v1".to_string(), "v2".to_string()])
        .await
        .unwrap();

    assert_eq!(created.id, "PLnew");
    assert_eq!(created.item_count, 0);
}

#[tokio::test]
async fn youtube_insert_failure_stops_adding() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/playlistItems"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": { "code": 404, "message": "Playlist not found" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = YouTubeClient::with_api_base(http(), server.uri());
    let result = client.add_items("yt-token", "missing", &["v1".to_string(), "v2".to_string()]).await;

    assert!(matches!(result, Err(MoodmixError::NotFound(_))));
}
