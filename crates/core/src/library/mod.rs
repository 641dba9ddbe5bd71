//! Liked songs, playlist order, watch history, playback helpers and
//! provider-side playlists

pub mod player;
pub mod ports;
pub mod remote;
pub mod service;

pub use player::{next_index, previous_index, PlayerService};
pub use remote::{ExportSummary, RemoteLibrary};
pub use service::LibraryService;
