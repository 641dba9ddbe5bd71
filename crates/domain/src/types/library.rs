//! Library state persisted next to the auth records

use serde::{Deserialize, Serialize};

use super::auth::Provider;

/// A song of the generated playlist
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Song {
    pub id: u64,
    pub title: String,
    pub artist: String,
    /// Preformatted `m:ss`
    pub duration: String,
    pub duration_seconds: u64,
    pub bpm: u32,
    pub energy: u32,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_id: Option<String>,
}

/// The generated playlist in its saved order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Playlist {
    pub title: String,
    pub cover_image: String,
    pub songs: Vec<Song>,
    pub total_duration: String,
    pub total_duration_seconds: u64,
    pub mood: String,
}

impl Playlist {
    /// Recompute both total duration fields from the song list
    pub fn recompute_totals(&mut self) {
        self.total_duration_seconds = self.songs.iter().map(|song| song.duration_seconds).sum();
        self.total_duration = format_duration(self.total_duration_seconds);
    }
}

/// A watched YouTube video
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoInfo {
    pub id: String,
    pub title: String,
    pub thumbnail: String,
    pub channel_title: String,
}

/// A playlist owned by the user's account on a provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemotePlaylist {
    pub provider: Provider,
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Tracks (Spotify) or videos (YouTube) in the playlist
    pub item_count: u64,
}

/// Settings of a playlist to create on a provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPlaylist {
    pub name: String,
    pub description: String,
    /// Public on Spotify, `public` privacy status on YouTube
    pub public: bool,
}

/// A Spotify track search hit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackInfo {
    pub id: String,
    /// `spotify:track:<id>`, the form playlists accept
    pub uri: String,
    pub name: String,
    pub artists: Vec<String>,
    pub album: String,
    pub duration_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// `h:mm:ss` once the total reaches an hour, `m:ss` below that
pub fn format_duration(total_seconds: u64) -> String {
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    if hours > 0 {
        format!("{hours}:{minutes:02}:{seconds:02}")
    } else {
        format!("{minutes}:{seconds:02}")
    }
}
