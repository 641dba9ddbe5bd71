//! Provider integrations: OAuth settings and API clients
//!
//! Each provider module exposes `oauth_config` for the token client in
//! `moodmix-common` and a client implementing the core ports.

pub mod spotify;
pub mod youtube;

pub use spotify::SpotifyClient;
pub use youtube::YouTubeClient;
