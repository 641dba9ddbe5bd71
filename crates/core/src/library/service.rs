//! Library state over the durable key-value store
//!
//! Every operation reads the current value, applies the change and writes it
//! back. Concurrent writers are last-writer-wins, like the auth records.

use std::sync::Arc;

use moodmix_common::storage::{self, KeyValueStore, StorageError};
use moodmix_domain::constants::{
    LIKED_SONGS_KEY, PLAYLIST_ORDER_KEY, REPEAT_MODE_KEY, VIDEO_HISTORY_KEY, VIDEO_HISTORY_LIMIT,
};
use moodmix_domain::{MoodmixError, Playlist, Result, Song, VideoInfo};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

fn storage_error(err: StorageError) -> MoodmixError {
    MoodmixError::Storage(err.to_string())
}

/// Liked songs, playlist, watch history and repeat mode of the user
pub struct LibraryService {
    storage: Arc<dyn KeyValueStore>,
}

impl LibraryService {
    /// Service persisting into `storage`
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        Self { storage }
    }

    /// Undecodable values are logged and read as absent.
    async fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match storage::load_json(self.storage.as_ref(), key).await {
            Ok(value) => Ok(value),
            Err(err @ StorageError::Decode { .. }) => {
                warn!(key, error = %err, "discarding unreadable library value");
                Ok(None)
            }
            Err(err) => Err(storage_error(err)),
        }
    }

    async fn save<T: Serialize + Sync>(&self, key: &str, value: &T) -> Result<()> {
        storage::save_json(self.storage.as_ref(), key, value).await.map_err(storage_error)
    }

    // Liked songs ---------------------------------------------------------

    /// Flip the liked flag of `song_id` and return the new value.
    ///
    /// # Errors
    /// Propagates storage failures.
    pub async fn toggle_like(&self, song_id: u64) -> Result<bool> {
        let mut liked = self.liked_songs().await?;
        let now_liked = if let Some(position) = liked.iter().position(|id| *id == song_id) {
            liked.remove(position);
            false
        } else {
            liked.push(song_id);
            true
        };

        self.save(LIKED_SONGS_KEY, &liked).await?;
        Ok(now_liked)
    }

    /// # Errors
    /// Propagates storage failures.
    pub async fn is_liked(&self, song_id: u64) -> Result<bool> {
        Ok(self.liked_songs().await?.contains(&song_id))
    }

    /// # Errors
    /// Propagates storage failures.
    pub async fn liked_songs(&self) -> Result<Vec<u64>> {
        Ok(self.load(LIKED_SONGS_KEY).await?.unwrap_or_default())
    }

    // Playlist ------------------------------------------------------------

    /// # Errors
    /// Propagates storage failures.
    pub async fn save_playlist(&self, playlist: &Playlist) -> Result<()> {
        self.save(PLAYLIST_ORDER_KEY, playlist).await
    }

    /// # Errors
    /// Propagates storage failures.
    pub async fn playlist(&self) -> Result<Option<Playlist>> {
        self.load(PLAYLIST_ORDER_KEY).await
    }

    async fn require_playlist(&self) -> Result<Playlist> {
        self.playlist()
            .await?
            .ok_or_else(|| MoodmixError::NotFound("no playlist saved".to_string()))
    }

    /// Move the song at `start` to position `end`.
    ///
    /// # Errors
    /// - [`MoodmixError::NotFound`] without a saved playlist
    /// - [`MoodmixError::InvalidInput`] when either index is out of range
    pub async fn reorder_songs(&self, start: usize, end: usize) -> Result<Playlist> {
        let mut playlist = self.require_playlist().await?;
        let len = playlist.songs.len();
        if start >= len || end >= len {
            return Err(MoodmixError::InvalidInput(format!(
                "cannot move song {start} to {end} in a playlist of {len}"
            )));
        }

        let song = playlist.songs.remove(start);
        playlist.songs.insert(end, song);
        self.save_playlist(&playlist).await?;
        Ok(playlist)
    }

    /// Append `song` and recompute the totals; a song already present is
    /// left where it is.
    ///
    /// # Errors
    /// [`MoodmixError::NotFound`] without a saved playlist, or storage
    /// failures.
    pub async fn add_song(&self, song: Song) -> Result<Playlist> {
        let mut playlist = self.require_playlist().await?;
        if playlist.songs.iter().any(|existing| existing.id == song.id) {
            debug!(song_id = song.id, "song already in playlist");
            return Ok(playlist);
        }

        playlist.songs.push(song);
        playlist.recompute_totals();
        self.save_playlist(&playlist).await?;
        Ok(playlist)
    }

    /// Remove the song with `song_id`, returning whether it was present.
    ///
    /// # Errors
    /// [`MoodmixError::NotFound`] without a saved playlist, or storage
    /// failures.
    pub async fn remove_song(&self, song_id: u64) -> Result<bool> {
        let mut playlist = self.require_playlist().await?;
        let before = playlist.songs.len();
        playlist.songs.retain(|song| song.id != song_id);
        if playlist.songs.len() == before {
            return Ok(false);
        }

        playlist.recompute_totals();
        self.save_playlist(&playlist).await?;
        Ok(true)
    }

    // Watch history -------------------------------------------------------

    /// Put `video` at the front of the history, dropping older duplicates.
    ///
    /// # Errors
    /// Propagates storage failures.
    pub async fn record_video(&self, video: VideoInfo) -> Result<Vec<VideoInfo>> {
        let mut history = self.video_history().await?;
        history.retain(|entry| entry.id != video.id);
        history.insert(0, video);
        history.truncate(VIDEO_HISTORY_LIMIT);

        self.save(VIDEO_HISTORY_KEY, &history).await?;
        Ok(history)
    }

    /// Newest first
    ///
    /// # Errors
    /// Propagates storage failures.
    pub async fn video_history(&self) -> Result<Vec<VideoInfo>> {
        Ok(self.load(VIDEO_HISTORY_KEY).await?.unwrap_or_default())
    }

    /// # Errors
    /// Propagates storage failures.
    pub async fn clear_history(&self) -> Result<()> {
        self.storage.remove(VIDEO_HISTORY_KEY).await.map_err(storage_error)
    }

    // Repeat mode ---------------------------------------------------------

    /// # Errors
    /// Propagates storage failures.
    pub async fn set_repeat_mode(&self, enabled: bool) -> Result<()> {
        self.save(REPEAT_MODE_KEY, &enabled).await
    }

    /// # Errors
    /// Propagates storage failures.
    pub async fn repeat_mode(&self) -> Result<bool> {
        Ok(self.load(REPEAT_MODE_KEY).await?.unwrap_or(false))
    }
}
