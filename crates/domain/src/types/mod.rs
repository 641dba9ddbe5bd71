//! Domain types and models

pub mod auth;
pub mod library;

pub use auth::{AuthRecord, CallbackFlow, Profile, Provider, SpotifyProfile, YouTubeChannel};
pub use library::{
    format_duration, NewPlaylist, Playlist, RemotePlaylist, Song, TrackInfo, VideoInfo,
};
