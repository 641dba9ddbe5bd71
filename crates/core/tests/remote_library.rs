//! Provider-side playlists through `RemoteLibrary` with recording fakes

use std::sync::Arc;

use async_trait::async_trait;
use moodmix_common::storage::MemoryStore;
use moodmix_common::testing::{MockClock, MockOAuthClient};
use moodmix_core::auth::callback::CallbackParams;
use moodmix_core::{
    AuthController, AuthControllerConfig, PlaylistApi, ProfileFetcher, ProviderBinding,
    RemoteLibrary, TrackSearch,
};
use moodmix_domain::{
    MoodmixError, NewPlaylist, Playlist, Profile, Provider, RemotePlaylist, Song, SpotifyProfile,
    TrackInfo, YouTubeChannel,
};
use parking_lot::Mutex;

struct AccountProfile(Provider);

#[async_trait]
impl ProfileFetcher for AccountProfile {
    async fn fetch_profile(&self, _access_token: &str) -> moodmix_domain::Result<Profile> {
        Ok(match self.0 {
            Provider::Spotify => Profile::Spotify(SpotifyProfile {
                id: "spotify-user".to_string(),
                display_name: None,
                email: None,
                image_url: None,
            }),
            Provider::YouTube => Profile::YouTube(YouTubeChannel {
                id: "UC1".to_string(),
                title: "Channel".to_string(),
                description: String::new(),
                thumbnail_url: None,
            }),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Call {
    List(String),
    Create { token: String, owner: String, name: String, public: bool },
    Add { playlist: String, items: Vec<String> },
}

struct RecordingPlaylists {
    provider: Provider,
    calls: Mutex<Vec<Call>>,
}

impl RecordingPlaylists {
    fn new(provider: Provider) -> Arc<Self> {
        Arc::new(Self { provider, calls: Mutex::new(Vec::new()) })
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl PlaylistApi for RecordingPlaylists {
    async fn list_playlists(&self, access_token: &str) -> moodmix_domain::Result<Vec<RemotePlaylist>> {
        self.calls.lock().push(Call::List(access_token.to_string()));
        Ok(Vec::new())
    }

    async fn create_playlist(
        &self,
        access_token: &str,
        owner_id: &str,
        playlist: &NewPlaylist,
    ) -> moodmix_domain::Result<RemotePlaylist> {
        self.calls.lock().push(Call::Create {
            token: access_token.to_string(),
            owner: owner_id.to_string(),
            name: playlist.name.clone(),
            public: playlist.public,
        });
        Ok(RemotePlaylist {
            provider: self.provider,
            id: "remote-1".to_string(),
            name: playlist.name.clone(),
            description: playlist.description.clone(),
            image_url: None,
            item_count: 0,
        })
    }

    async fn add_items(
        &self,
        _access_token: &str,
        playlist_id: &str,
        items: &[String],
    ) -> moodmix_domain::Result<()> {
        self.calls.lock().push(Call::Add { playlist: playlist_id.to_string(), items: items.to_vec() });
        Ok(())
    }
}

/// Finds every song except ones titled "Unknown"
struct Catalogue;

#[async_trait]
impl TrackSearch for Catalogue {
    async fn search_tracks(&self, _access_token: &str, query: &str) -> moodmix_domain::Result<Vec<TrackInfo>> {
        if query.starts_with("Unknown") {
            return Ok(Vec::new());
        }
        let id = query.replace(' ', "-").to_lowercase();
        Ok(vec![TrackInfo {
            uri: format!("spotify:track:{id}"),
            id,
            name: query.to_string(),
            artists: vec!["Nova".to_string()],
            album: "Tides".to_string(),
            duration_ms: 200_000,
            image_url: None,
        }])
    }
}

struct Harness {
    auth: Arc<AuthController>,
    remote: RemoteLibrary,
    spotify: Arc<RecordingPlaylists>,
    youtube: Arc<RecordingPlaylists>,
}

fn harness() -> Harness {
    let binding = |provider| {
        ProviderBinding::new(provider, Arc::new(MockOAuthClient::new()), Arc::new(AccountProfile(provider)))
    };
    let auth = Arc::new(
        AuthController::new(
            AuthControllerConfig::default(),
            Arc::new(MemoryStore::new()),
            Arc::new(MockClock::new()),
            binding(Provider::Spotify),
            binding(Provider::YouTube),
        )
        .unwrap(),
    );
    let spotify = RecordingPlaylists::new(Provider::Spotify);
    let youtube = RecordingPlaylists::new(Provider::YouTube);
    let remote = RemoteLibrary::new(auth.clone(), spotify.clone(), youtube.clone(), Arc::new(Catalogue));

    Harness { auth, remote, spotify, youtube }
}

async fn connect(auth: &AuthController, provider: Provider) {
    let redirect = auth.begin_login(provider).await.unwrap();
    let params = CallbackParams {
        code: Some("code".to_string()),
        state: Some(redirect.state.clone()),
        error: None,
    };
    match provider {
        Provider::Spotify => auth
            .handle_direct_callback(provider, &params, Some(&redirect.code_verifier))
            .await
            .unwrap(),
        Provider::YouTube => {
            let ticket = auth.relay_callback(provider, &params).unwrap();
            auth.complete_relayed(provider, Some(&ticket.state), Some(&ticket.code)).await.unwrap();
        }
    }
}

fn song(id: u64, title: &str, video_id: Option<&str>) -> Song {
    Song {
        id,
        title: title.to_string(),
        artist: "Nova".to_string(),
        duration: "3:20".to_string(),
        duration_seconds: 200,
        bpm: 100,
        energy: 50,
        genres: Vec::new(),
        video_id: video_id.map(str::to_string),
    }
}

fn evening(songs: Vec<Song>) -> Playlist {
    let mut playlist = Playlist {
        title: "Evening".to_string(),
        cover_image: String::new(),
        songs,
        total_duration: String::new(),
        total_duration_seconds: 0,
        mood: "calm".to_string(),
    };
    playlist.recompute_totals();
    playlist
}

#[tokio::test]
async fn disconnected_provider_is_auth_error() {
    let h = harness();

    let listed = h.remote.playlists(Provider::Spotify).await;
    let searched = h.remote.search_tracks("Drift").await;

    assert!(matches!(listed, Err(MoodmixError::Auth(_))));
    assert!(matches!(searched, Err(MoodmixError::Auth(_))));
    assert!(h.spotify.calls().is_empty());
}

#[tokio::test]
async fn create_uses_profile_id_as_owner() {
    let h = harness();
    connect(&h.auth, Provider::Spotify).await;

    let created = h
        .remote
        .create_playlist(
            Provider::Spotify,
            &NewPlaylist { name: "Focus".to_string(), description: String::new(), public: true },
        )
        .await
        .unwrap();

    assert_eq!(created.provider, Provider::Spotify);
    assert_eq!(
        h.spotify.calls(),
        [Call::Create {
            token: "mock_access_token".to_string(),
            owner: "spotify-user".to_string(),
            name: "Focus".to_string(),
            public: true,
        }]
    );
}

#[tokio::test]
async fn blank_name_and_empty_items_make_no_requests() {
    let h = harness();
    connect(&h.auth, Provider::YouTube).await;

    let blank = h
        .remote
        .create_playlist(
            Provider::YouTube,
            &NewPlaylist { name: "  ".to_string(), description: String::new(), public: false },
        )
        .await;
    h.remote.add_items(Provider::YouTube, "remote-1", &[]).await.unwrap();

    assert!(matches!(blank, Err(MoodmixError::InvalidInput(_))));
    assert!(h.youtube.calls().is_empty());
}

#[tokio::test]
async fn youtube_export_uses_resolved_videos() {
    let h = harness();
    connect(&h.auth, Provider::YouTube).await;
    let playlist = evening(vec![song(1, "Drift", Some("v1")), song(2, "Tide", None), song(3, "Glow", Some("v3"))]);

    let summary = h.remote.export_playlist(Provider::YouTube, &playlist, false).await.unwrap();

    assert_eq!(summary.added, 2);
    assert_eq!(summary.skipped, [2]);
    assert_eq!(
        h.youtube.calls().last(),
        Some(&Call::Add {
            playlist: "remote-1".to_string(),
            items: vec!["v1".to_string(), "v3".to_string()],
        })
    );
    assert!(h.spotify.calls().is_empty());
}

#[tokio::test]
async fn spotify_export_matches_songs_in_catalogue() {
    let h = harness();
    connect(&h.auth, Provider::Spotify).await;
    let playlist = evening(vec![song(1, "Drift", None), song(2, "Unknown", None)]);

    let summary = h.remote.export_playlist(Provider::Spotify, &playlist, true).await.unwrap();

    assert_eq!(summary.playlist.name, "Evening");
    assert_eq!(summary.added, 1);
    assert_eq!(summary.skipped, [2]);
    assert_eq!(
        h.spotify.calls().last(),
        Some(&Call::Add {
            playlist: "remote-1".to_string(),
            items: vec!["spotify:track:drift-nova".to_string()],
        })
    );
}
