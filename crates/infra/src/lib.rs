//! # MoodMix Infrastructure
//!
//! Infrastructure implementations of core ports.
//!
//! This crate contains:
//! - Configuration loading (environment, TOML/JSON files)
//! - The file-backed key-value store
//! - Spotify and YouTube API clients
//! - The axum auth routes and server
//!
//! ## Architecture
//! - Implements traits defined in `moodmix-core` and `moodmix-common`
//! - Contains all "impure" code (I/O, sockets, provider APIs)

pub mod config;
pub mod errors;
pub mod http;
pub mod integrations;
pub mod storage;

// Re-export commonly used items
pub use errors::InfraError;
pub use http::{build_router, AppState, AuthServer, HttpClient};
pub use integrations::{SpotifyClient, YouTubeClient};
pub use storage::FileStore;
