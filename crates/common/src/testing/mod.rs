//! Testing utilities and helpers
//!
//! - **[`mocks`]**: scriptable OAuth client (platform tier)
//! - **[`time`]**: controllable clock
//!
//! ## Usage
//!
//! ```rust
//! use std::time::Duration;
//!
//! use moodmix_common::testing::MockClock;
//!
//! let clock = MockClock::new();
//! clock.advance(Duration::from_secs(5));
//! ```

pub mod mocks;
pub mod time;

// Re-export commonly used items
#[cfg(feature = "platform")]
pub use mocks::{MockOAuthClient, RefreshGate};
pub use time::MockClock;

pub use crate::storage::MemoryStore;
