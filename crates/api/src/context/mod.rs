//! Application context - dependency injection container

use std::sync::Arc;

use axum::Router;
use moodmix_common::auth::{OAuthClient, OAuthClientTrait};
use moodmix_common::storage::KeyValueStore;
use moodmix_common::time::{Clock, SystemClock};
use moodmix_core::{
    AuthController, AuthControllerConfig, LibraryService, PlayerService, PlaylistApi,
    ProviderBinding, RemoteLibrary, TrackSearch, VideoSearch,
};
use moodmix_domain::{Config, Provider, Result};
use moodmix_infra::integrations::{spotify, youtube};
use moodmix_infra::{
    build_router, AppState, AuthServer, FileStore, HttpClient, SpotifyClient, YouTubeClient,
};
use tracing::info;

/// Application context - holds all services and dependencies
pub struct AppContext {
    pub config: Config,
    pub storage: Arc<dyn KeyValueStore>,
    pub auth: Arc<AuthController>,
    pub library: Arc<LibraryService>,
    pub player: Arc<PlayerService>,
    pub remote: Arc<RemoteLibrary>,
}

/// Provider API clients beyond the auth bindings
pub struct ProviderApis {
    pub search: Arc<dyn VideoSearch>,
    pub tracks: Arc<dyn TrackSearch>,
    pub spotify_playlists: Arc<dyn PlaylistApi>,
    pub youtube_playlists: Arc<dyn PlaylistApi>,
}

impl AppContext {
    /// Wire the production adapters: file store, provider clients and the
    /// system clock.
    ///
    /// # Errors
    /// Returns `MoodmixError::Network` when the HTTP client cannot be built.
    pub fn new(config: Config) -> Result<Self> {
        let storage: Arc<dyn KeyValueStore> = Arc::new(FileStore::new(&config.storage.path));
        let http = HttpClient::new()?;

        let spotify_api = Arc::new(SpotifyClient::new(http.clone()));
        let youtube_api = Arc::new(YouTubeClient::new(http));

        let spotify_oauth: Arc<dyn OAuthClientTrait> = Arc::new(OAuthClient::new(
            spotify::oauth_config(&config.spotify, config.server.redirect_uri("spotify")),
        ));
        let youtube_oauth: Arc<dyn OAuthClientTrait> = Arc::new(OAuthClient::new(
            youtube::oauth_config(&config.youtube, config.server.redirect_uri("youtube")),
        ));

        Self::with_adapters(
            config,
            storage,
            Arc::new(SystemClock),
            ProviderBinding::new(Provider::Spotify, spotify_oauth, spotify_api.clone()),
            ProviderBinding::new(Provider::YouTube, youtube_oauth, youtube_api.clone()),
            ProviderApis {
                search: youtube_api.clone(),
                tracks: spotify_api.clone(),
                spotify_playlists: spotify_api,
                youtube_playlists: youtube_api,
            },
        )
    }

    /// Wire the context over caller-provided adapters.
    ///
    /// # Errors
    /// Returns `MoodmixError::Config` when a binding sits in the wrong slot.
    pub fn with_adapters(
        config: Config,
        storage: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
        spotify: ProviderBinding,
        youtube: ProviderBinding,
        apis: ProviderApis,
    ) -> Result<Self> {
        let auth = Arc::new(AuthController::new(
            AuthControllerConfig::from(&config),
            storage.clone(),
            clock,
            spotify,
            youtube,
        )?);
        let library = Arc::new(LibraryService::new(storage.clone()));
        let player = Arc::new(PlayerService::new(library.clone(), apis.search, auth.clone()));
        let remote = Arc::new(RemoteLibrary::new(
            auth.clone(),
            apis.spotify_playlists,
            apis.youtube_playlists,
            apis.tracks,
        ));

        Ok(Self { config, storage, auth, library, player, remote })
    }

    /// Load persisted records and start the refresh tasks.
    pub async fn start(&self) {
        self.auth.start().await;
        info!(
            spotify = self.auth.is_authenticated(Provider::Spotify),
            youtube = self.auth.is_authenticated(Provider::YouTube),
            "auth controller started"
        );
    }

    /// Auth routes over this context's controller
    pub fn router(&self) -> Router {
        build_router(AppState::new(self.auth.clone()))
    }

    /// Bind the configured address and serve the auth routes.
    ///
    /// # Errors
    /// Returns `MoodmixError::Network` when the address cannot be bound.
    pub async fn serve(&self) -> Result<AuthServer> {
        AuthServer::start(&self.config.server.bind_address, self.router()).await
    }

    /// Stop the refresh tasks.
    pub async fn shutdown(&self) {
        self.auth.shutdown().await;
        info!("application context shut down");
    }
}

impl std::fmt::Debug for AppContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppContext")
            .field("bind_address", &self.config.server.bind_address)
            .field("storage", &self.config.storage.path)
            .field("running", &self.auth.is_running())
            .finish_non_exhaustive()
    }
}
