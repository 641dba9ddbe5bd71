//! Playback: resolving songs to videos and moving through the playlist

use std::sync::Arc;

use moodmix_domain::{Provider, Result, Song, VideoInfo};
use tracing::{debug, info};

use super::ports::VideoSearch;
use super::service::LibraryService;
use crate::auth::controller::AuthController;

/// Resolves songs to YouTube videos for playback
pub struct PlayerService {
    library: Arc<LibraryService>,
    search: Arc<dyn VideoSearch>,
    auth: Arc<AuthController>,
}

impl PlayerService {
    /// Player searching with `search` under the YouTube account held by `auth`
    pub fn new(
        library: Arc<LibraryService>,
        search: Arc<dyn VideoSearch>,
        auth: Arc<AuthController>,
    ) -> Self {
        Self { library, search, auth }
    }

    /// Find a YouTube video for `song` and add it to the watch history.
    ///
    /// Returns `None` when the search has no hit.
    ///
    /// # Errors
    /// - [`moodmix_domain::MoodmixError::Auth`] when YouTube is not connected
    /// - search and storage failures
    pub async fn play_song(&self, song: &Song) -> Result<Option<VideoInfo>> {
        let access_token = self.auth.access_token(Provider::YouTube)?;
        let query = format!("{} {}", song.title, song.artist);

        let Some(video) = self.search.search_video(&access_token, &query).await? else {
            debug!(song_id = song.id, "no video found");
            return Ok(None);
        };

        info!(song_id = song.id, video_id = %video.id, "playing video");
        self.library.record_video(video.clone()).await?;
        Ok(Some(video))
    }

    /// Library the watch history is recorded in
    pub fn library(&self) -> &LibraryService {
        &self.library
    }
}

/// Index after `current`; wraps to the start only with `repeat`
pub const fn next_index(current: usize, len: usize, repeat: bool) -> Option<usize> {
    if len == 0 {
        return None;
    }
    if current < len - 1 {
        Some(current + 1)
    } else if repeat {
        Some(0)
    } else {
        None
    }
}

/// Index before `current`; wraps to the last song only with `repeat`
pub const fn previous_index(current: usize, len: usize, repeat: bool) -> Option<usize> {
    if len == 0 {
        return None;
    }
    if current > 0 && current <= len {
        Some(current - 1)
    } else if repeat {
        Some(len - 1)
    } else {
        None
    }
}
