//! Playlists on the providers' side
//!
//! Every call uses the access token currently committed for the provider, so
//! it fails with an auth error once the account is disconnected.

use std::sync::Arc;

use moodmix_domain::{
    MoodmixError, NewPlaylist, Playlist, Provider, RemotePlaylist, Result, TrackInfo,
};
use tracing::{debug, info};

use super::ports::{PlaylistApi, TrackSearch};
use crate::auth::controller::AuthController;
use crate::auth::error::AuthError;
use crate::auth::per_provider::PerProvider;

/// Result of copying a local playlist to a provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    pub playlist: RemotePlaylist,
    pub added: usize,
    /// Song ids with no match on the provider
    pub skipped: Vec<u64>,
}

/// Lists, creates and fills playlists on the connected provider accounts
pub struct RemoteLibrary {
    auth: Arc<AuthController>,
    playlists: PerProvider<Arc<dyn PlaylistApi>>,
    tracks: Arc<dyn TrackSearch>,
}

impl RemoteLibrary {
    /// Library over one playlist API per provider and the Spotify catalogue.
    pub fn new(
        auth: Arc<AuthController>,
        spotify: Arc<dyn PlaylistApi>,
        youtube: Arc<dyn PlaylistApi>,
        tracks: Arc<dyn TrackSearch>,
    ) -> Self {
        let playlists = PerProvider::new(|provider| match provider {
            Provider::Spotify => spotify.clone(),
            Provider::YouTube => youtube.clone(),
        });
        Self { auth, playlists, tracks }
    }

    /// Playlists of the connected `provider` account.
    ///
    /// # Errors
    /// [`MoodmixError::Auth`] when `provider` is not connected, otherwise the
    /// request error.
    pub async fn playlists(&self, provider: Provider) -> Result<Vec<RemotePlaylist>> {
        let access_token = self.auth.access_token(provider)?;
        self.playlists.get(provider).list_playlists(&access_token).await
    }

    /// Create a playlist on the connected `provider` account.
    ///
    /// # Errors
    /// [`MoodmixError::InvalidInput`] for a blank name,
    /// [`MoodmixError::Auth`] when `provider` is not connected, otherwise the
    /// request error.
    pub async fn create_playlist(
        &self,
        provider: Provider,
        playlist: &NewPlaylist,
    ) -> Result<RemotePlaylist> {
        if playlist.name.trim().is_empty() {
            return Err(MoodmixError::InvalidInput("playlist name must not be empty".to_string()));
        }
        let record = self
            .auth
            .auth_record(provider)
            .ok_or(AuthError::NotAuthenticated { provider })?;

        let created = self
            .playlists
            .get(provider)
            .create_playlist(&record.access_token, record.profile.id(), playlist)
            .await?;
        info!(%provider, playlist_id = %created.id, "remote playlist created");
        Ok(created)
    }

    /// Append track URIs (Spotify) or video ids (YouTube) to a playlist.
    ///
    /// # Errors
    /// [`MoodmixError::Auth`] when `provider` is not connected, otherwise the
    /// request error.
    pub async fn add_items(&self, provider: Provider, playlist_id: &str, items: &[String]) -> Result<()> {
        if items.is_empty() {
            return Ok(());
        }
        let access_token = self.auth.access_token(provider)?;
        self.playlists.get(provider).add_items(&access_token, playlist_id, items).await?;
        debug!(%provider, playlist_id, count = items.len(), "items added to remote playlist");
        Ok(())
    }

    /// Search the Spotify catalogue.
    ///
    /// # Errors
    /// [`MoodmixError::Auth`] when Spotify is not connected, otherwise the
    /// request error.
    pub async fn search_tracks(&self, query: &str) -> Result<Vec<TrackInfo>> {
        let access_token = self.auth.access_token(Provider::Spotify)?;
        self.tracks.search_tracks(&access_token, query).await
    }

    /// Copy `playlist` to a new playlist on `provider`.
    ///
    /// YouTube takes the songs' resolved video ids; Spotify takes the first
    /// catalogue hit for `"<title> <artist>"`. Songs without a match are
    /// reported in [`ExportSummary::skipped`].
    ///
    /// # Errors
    /// As [`RemoteLibrary::create_playlist`] and [`RemoteLibrary::add_items`].
    pub async fn export_playlist(
        &self,
        provider: Provider,
        playlist: &Playlist,
        public: bool,
    ) -> Result<ExportSummary> {
        let mut items = Vec::with_capacity(playlist.songs.len());
        let mut skipped = Vec::new();

        for song in &playlist.songs {
            let item = match provider {
                Provider::YouTube => song.video_id.clone(),
                Provider::Spotify => self
                    .search_tracks(&format!("{} {}", song.title, song.artist))
                    .await?
                    .into_iter()
                    .next()
                    .map(|track| track.uri),
            };
            match item {
                Some(item) => items.push(item),
                None => skipped.push(song.id),
            }
        }

        let created = self
            .create_playlist(
                provider,
                &NewPlaylist {
                    name: playlist.title.clone(),
                    description: format!("{} mood, exported from MoodMix", playlist.mood),
                    public,
                },
            )
            .await?;
        self.add_items(provider, &created.id, &items).await?;

        info!(%provider, added = items.len(), skipped = skipped.len(), "playlist exported");
        Ok(ExportSummary { playlist: created, added: items.len(), skipped })
    }
}
