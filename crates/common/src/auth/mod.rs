//! OAuth 2.0 + PKCE building blocks
//!
//! Provider-agnostic pieces of the authorization-code flow. Provider
//! settings (endpoints, scopes, client authentication) are supplied by the
//! infra crate; orchestration (pending sessions, callbacks, refresh) lives in
//! `moodmix-core`.
//!
//! # Architecture
//!
//! ```text
//! PkceSession::generate()
//!        │  verifier, S256 challenge, state
//!        ▼
//! OAuthClient ──► authorization_url()      (browser redirect out)
//!             ──► exchange_code()          (callback / bridge)
//!             ──► refresh_access_token()   (refresh monitor)
//!        │
//!        ▼
//! TokenResponse   (validated with serde, never passed on as raw JSON)
//! ```
//!
//! # Module Organization
//!
//! - **[`pkce`]**: verifier/state generation and challenge derivation
//! - **[`types`]**: `OAuthConfig`, `TokenResponse`, `OAuthError`
//! - **[`client`]**: HTTP client for the token endpoint
//! - **[`traits`]**: `OAuthClientTrait` seam used by core services

pub mod client;
pub mod pkce;
pub mod traits;
pub mod types;

// Re-export commonly used types and functions
pub use client::{OAuthClient, OAuthClientError};
pub use pkce::{derive_challenge, generate_state, generate_verifier, PkceError, PkceSession};
pub use traits::OAuthClientTrait;
pub use types::{ClientAuthMethod, OAuthConfig, OAuthError, TokenResponse};
