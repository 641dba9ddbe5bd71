//! # MoodMix Domain
//!
//! Business domain types and models for MoodMix.
//!
//! This crate contains:
//! - Provider identities and the persisted `AuthRecord`
//! - Library types (songs, playlists, watched videos)
//! - Domain error types and Result definitions
//! - Configuration structures
//! - Domain constants
//!
//! ## Architecture
//! - No dependencies on other MoodMix crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod config;
pub mod constants;
pub mod errors;
pub mod macros;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
