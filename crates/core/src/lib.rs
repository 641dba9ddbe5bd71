//! # MoodMix Core
//!
//! Pure business logic layer - no HTTP server, filesystem or provider code.
//!
//! This crate contains:
//! - The OAuth/PKCE token lifecycle (login, callbacks, refresh, logout)
//! - Port interfaces implemented by the infra crate
//! - Library and player services over the durable key-value store
//!
//! ## Architecture Principles
//! - Depends only on `moodmix-common` and `moodmix-domain`
//! - All external dependencies via traits
//! - One `AuthController` owns every per-provider session

pub mod auth;
pub mod library;

// Re-export specific items to avoid ambiguity
pub use auth::controller::{AuthController, AuthControllerConfig};
pub use auth::error::AuthError;
pub use auth::ports::{ProfileFetcher, ProviderBinding};
pub use auth::refresh::{RefreshOutcome, RefreshState, SessionSnapshot};
pub use library::ports::{PlaylistApi, TrackSearch, VideoSearch};
pub use library::{ExportSummary, LibraryService, PlayerService, RemoteLibrary};
