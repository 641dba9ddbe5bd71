//! Configuration loading
//!
//! Environment variables first, then a TOML/JSON file probed in the usual
//! locations.

pub mod loader;

pub use loader::{load, load_from_env, load_from_file, probe_config_paths};
