//! # MoodMix App
//!
//! Application layer - wiring and the `moodmix` binary.
//!
//! This crate contains:
//! - Application context (dependency injection)
//! - Logging setup
//! - Main entry point
//!
//! ## Architecture
//! - Depends on `common`, `domain`, `core`, and `infra`
//! - Wires the provider adapters into the auth controller and serves the routes

pub mod context;
pub mod utils;

pub use context::{AppContext, ProviderApis};
