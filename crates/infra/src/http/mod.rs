//! HTTP plumbing: the outbound provider client and the inbound auth server

pub mod client;
pub mod cookies;
pub mod routes;
pub mod server;

pub use client::{HttpClient, HttpClientBuilder};
pub use routes::{build_router, AppState};
pub use server::AuthServer;
