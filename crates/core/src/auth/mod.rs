//! OAuth/PKCE token lifecycle
//!
//! ```text
//! begin_login ──► provider consent ──► callback
//!                                        │
//!                 Direct (Spotify) ◄─────┴─────► StateRelayed (YouTube)
//!                 verifier cookie                 relay cookies → bridge
//!                        │                        verifier from store
//!                        └──────────► exchange + profile ──► TokenStore
//!                                                              │
//!                                  RefreshMonitor (60s tick) ◄─┘
//! ```
//!
//! [`controller::AuthController`] is the only entry point the outer layers
//! use; the remaining modules are its building blocks.

pub mod callback;
pub mod controller;
pub mod error;
pub mod login;
pub mod pending;
pub mod per_provider;
pub mod ports;
pub mod refresh;
pub mod token_store;
