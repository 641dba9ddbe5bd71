//! Library and player behaviour over an in-memory store

use std::sync::Arc;

use async_trait::async_trait;
use moodmix_common::storage::MemoryStore;
use moodmix_common::testing::{MockClock, MockOAuthClient};
use moodmix_core::auth::callback::CallbackParams;
use moodmix_core::{
    AuthController, AuthControllerConfig, LibraryService, PlayerService, ProfileFetcher,
    ProviderBinding, VideoSearch,
};
use moodmix_domain::{
    MoodmixError, Playlist, Profile, Provider, Song, VideoInfo, YouTubeChannel,
};
use parking_lot::Mutex;

fn song(id: u64, title: &str, seconds: u64) -> Song {
    Song {
        id,
        title: title.to_string(),
        artist: "Nova".to_string(),
        duration: moodmix_domain::format_duration(seconds),
        duration_seconds: seconds,
        bpm: 100,
        energy: 50,
        genres: vec!["electronic".to_string()],
        video_id: None,
    }
}

fn playlist(songs: Vec<Song>) -> Playlist {
    let mut playlist = Playlist {
        title: "Evening".to_string(),
        cover_image: "/covers/evening.png".to_string(),
        songs,
        total_duration: String::new(),
        total_duration_seconds: 0,
        mood: "calm".to_string(),
    };
    playlist.recompute_totals();
    playlist
}

fn video(id: usize) -> VideoInfo {
    VideoInfo {
        id: format!("vid-{id}"),
        title: format!("Video {id}"),
        thumbnail: String::new(),
        channel_title: "Channel".to_string(),
    }
}

#[tokio::test]
async fn history_keeps_ten_most_recent_unique_videos() {
    let library = LibraryService::new(Arc::new(MemoryStore::new()));

    for id in 0..12 {
        library.record_video(video(id)).await.unwrap();
    }
    library.record_video(video(5)).await.unwrap();

    let history = library.video_history().await.unwrap();
    assert_eq!(history.len(), 10);
    assert_eq!(history[0].id, "vid-5");
    assert_eq!(history[1].id, "vid-11");
    assert_eq!(history.iter().filter(|v| v.id == "vid-5").count(), 1);
    assert!(history.iter().all(|v| v.id != "vid-0" && v.id != "vid-1"));

    library.clear_history().await.unwrap();
    assert!(library.video_history().await.unwrap().is_empty());
}

#[tokio::test]
async fn reorder_moves_song_and_rejects_bad_indices() {
    let library = LibraryService::new(Arc::new(MemoryStore::new()));
    library
        .save_playlist(&playlist(vec![song(1, "One", 100), song(2, "Two", 100), song(3, "Three", 100)]))
        .await
        .unwrap();

    let reordered = library.reorder_songs(0, 2).await.unwrap();
    let ids: Vec<_> = reordered.songs.iter().map(|s| s.id).collect();
    assert_eq!(ids, [2, 3, 1]);
    assert_eq!(library.playlist().await.unwrap().unwrap(), reordered);

    let err = library.reorder_songs(3, 0).await.unwrap_err();
    assert!(matches!(err, MoodmixError::InvalidInput(_)));
}

#[tokio::test]
async fn reorder_without_playlist_is_not_found() {
    let library = LibraryService::new(Arc::new(MemoryStore::new()));

    let err = library.reorder_songs(0, 0).await.unwrap_err();

    assert!(matches!(err, MoodmixError::NotFound(_)));
}

#[tokio::test]
async fn adding_and_removing_songs_recomputes_totals() {
    let library = LibraryService::new(Arc::new(MemoryStore::new()));
    library.save_playlist(&playlist(vec![song(1, "One", 1800)])).await.unwrap();

    let updated = library.add_song(song(2, "Two", 1925)).await.unwrap();
    assert_eq!(updated.total_duration_seconds, 3725);
    assert_eq!(updated.total_duration, "1:02:05");

    let unchanged = library.add_song(song(2, "Two", 1925)).await.unwrap();
    assert_eq!(unchanged.songs.len(), 2);

    assert!(library.remove_song(1).await.unwrap());
    assert!(!library.remove_song(1).await.unwrap());
    let saved = library.playlist().await.unwrap().unwrap();
    assert_eq!(saved.total_duration, "32:05");
}

struct RecordingSearch {
    queries: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl VideoSearch for RecordingSearch {
    async fn search_video(
        &self,
        access_token: &str,
        query: &str,
    ) -> moodmix_domain::Result<Option<VideoInfo>> {
        self.queries.lock().push((access_token.to_string(), query.to_string()));
        Ok(Some(VideoInfo {
            id: "yt-1".to_string(),
            title: query.to_string(),
            thumbnail: String::new(),
            channel_title: "Nova".to_string(),
        }))
    }
}

struct ChannelProfile;

#[async_trait]
impl ProfileFetcher for ChannelProfile {
    async fn fetch_profile(&self, _access_token: &str) -> moodmix_domain::Result<Profile> {
        Ok(Profile::YouTube(YouTubeChannel {
            id: "UC1".to_string(),
            title: "Channel".to_string(),
            description: String::new(),
            thumbnail_url: None,
        }))
    }
}

fn controller(memory: &MemoryStore) -> Arc<AuthController> {
    let binding = |provider| {
        ProviderBinding::new(provider, Arc::new(MockOAuthClient::new()), Arc::new(ChannelProfile))
    };
    Arc::new(
        AuthController::new(
            AuthControllerConfig::default(),
            Arc::new(memory.clone()),
            Arc::new(MockClock::new()),
            binding(Provider::Spotify),
            binding(Provider::YouTube),
        )
        .unwrap(),
    )
}

#[tokio::test]
async fn play_song_requires_youtube_login() {
    let memory = MemoryStore::new();
    let library = Arc::new(LibraryService::new(Arc::new(memory.clone())));
    let search = Arc::new(RecordingSearch { queries: Mutex::new(Vec::new()) });
    let player = PlayerService::new(library, search.clone(), controller(&memory));

    let err = player.play_song(&song(1, "Drift", 200)).await.unwrap_err();

    assert!(matches!(err, MoodmixError::Auth(_)));
    assert!(search.queries.lock().is_empty());
}

#[tokio::test]
async fn play_song_searches_title_and_artist_and_records_history() {
    let memory = MemoryStore::new();
    let auth = controller(&memory);
    let redirect = auth.begin_login(Provider::YouTube).await.unwrap();
    let ticket = auth
        .relay_callback(
            Provider::YouTube,
            &CallbackParams {
                code: Some("code".to_string()),
                state: Some(redirect.state.clone()),
                error: None,
            },
        )
        .unwrap();
    auth.complete_relayed(Provider::YouTube, Some(&ticket.state), Some(&ticket.code))
        .await
        .unwrap();

    let library = Arc::new(LibraryService::new(Arc::new(memory.clone())));
    let search = Arc::new(RecordingSearch { queries: Mutex::new(Vec::new()) });
    let player = PlayerService::new(library.clone(), search.clone(), auth);

    let video = player.play_song(&song(1, "Drift", 200)).await.unwrap().unwrap();

    assert_eq!(video.id, "yt-1");
    assert_eq!(
        search.queries.lock().as_slice(),
        [("mock_access_token".to_string(), "Drift Nova".to_string())]
    );
    assert_eq!(library.video_history().await.unwrap(), vec![video]);
}
