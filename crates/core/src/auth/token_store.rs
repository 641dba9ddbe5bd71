//! Durable per-provider auth records with change notification
//!
//! Every commit writes storage first and then publishes to the provider's
//! watch channel, so subscribers never observe a record that a restart would
//! lose. Records that fail to decode are logged and treated as absent.

use std::sync::Arc;

use moodmix_common::storage::{self, KeyValueStore, StorageError};
use moodmix_domain::{AuthRecord, Provider};
use tokio::sync::watch;
use tracing::{debug, warn};

use super::error::AuthError;
use super::per_provider::PerProvider;

/// In-memory view of the stored auth records, one watch channel per provider
pub struct TokenStore {
    storage: Arc<dyn KeyValueStore>,
    channels: PerProvider<watch::Sender<Option<AuthRecord>>>,
}

impl TokenStore {
    /// Empty store over `storage`; call [`TokenStore::load_all`] to populate.
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        Self { storage, channels: PerProvider::new(|_| watch::Sender::new(None)) }
    }

    /// Load every provider's record from storage into memory.
    pub async fn load_all(&self) {
        for provider in Provider::ALL {
            self.reload(provider).await;
        }
    }

    /// Re-read one provider's record so writes by other processes become
    /// visible.
    ///
    /// Undecodable records yield `None`. When the store itself cannot be read
    /// the in-memory record is kept. Subscribers are notified only when the
    /// record actually changed.
    pub async fn reload(&self, provider: Provider) -> Option<AuthRecord> {
        let key = provider.auth_storage_key();
        let record = match storage::load_json::<AuthRecord>(self.storage.as_ref(), &key).await {
            Ok(Some(record)) if record.provider() == provider => Some(record),
            Ok(Some(record)) => {
                warn!(
                    %provider,
                    stored = %record.provider(),
                    "auth record belongs to another provider, ignoring"
                );
                None
            }
            Ok(None) => None,
            Err(err @ StorageError::Decode { .. }) => {
                warn!(%provider, error = %err, "stored auth record unreadable, treating as signed out");
                None
            }
            Err(err) => {
                warn!(%provider, error = %err, "auth storage unavailable, keeping in-memory record");
                return self.get(provider);
            }
        };

        let changed = self.channels.get(provider).send_if_modified(|current| {
            if *current == record {
                return false;
            }
            current.clone_from(&record);
            true
        });
        if changed {
            debug!(%provider, authenticated = record.is_some(), "auth record changed in storage");
        }
        record
    }

    /// Current in-memory record
    pub fn get(&self, provider: Provider) -> Option<AuthRecord> {
        self.channels.get(provider).borrow().clone()
    }

    /// Whether a record is held in memory for `provider`
    pub fn is_authenticated(&self, provider: Provider) -> bool {
        self.channels.get(provider).borrow().is_some()
    }

    /// Persist `record` and publish it.
    ///
    /// # Errors
    /// Returns [`AuthError::Storage`] when the write fails; memory is left
    /// untouched in that case.
    pub async fn commit(&self, record: AuthRecord) -> Result<(), AuthError> {
        let provider = record.provider();
        storage::save_json(self.storage.as_ref(), &provider.auth_storage_key(), &record).await?;
        debug!(%provider, expires_at = record.expires_at, "auth record committed");
        self.channels.get(provider).send_replace(Some(record));
        Ok(())
    }

    /// Remove the provider's record from storage and memory.
    ///
    /// Memory is cleared even when the storage delete fails.
    ///
    /// # Errors
    /// Returns [`AuthError::Storage`] when the delete fails.
    pub async fn clear(&self, provider: Provider) -> Result<(), AuthError> {
        self.channels.get(provider).send_replace(None);
        self.storage.remove(&provider.auth_storage_key()).await?;
        debug!(%provider, "auth record cleared");
        Ok(())
    }

    /// Receiver that observes every commit, clear and external change
    pub fn subscribe(&self, provider: Provider) -> watch::Receiver<Option<AuthRecord>> {
        self.channels.get(provider).subscribe()
    }
}

#[cfg(test)]
mod tests {
    use moodmix_common::storage::MemoryStore;
    use moodmix_domain::{Profile, SpotifyProfile};

    use super::*;

    fn spotify_record(access: &str) -> AuthRecord {
        AuthRecord {
            access_token: access.to_string(),
            refresh_token: Some("refresh".to_string()),
            expires_at: 1_000,
            profile: Profile::Spotify(SpotifyProfile {
                id: "user-1".to_string(),
                display_name: Some("Ada".to_string()),
                email: None,
                image_url: None,
            }),
        }
    }

    #[tokio::test]
    async fn commit_persists_and_notifies() {
        let memory = MemoryStore::new();
        let store = TokenStore::new(Arc::new(memory.clone()));
        let mut rx = store.subscribe(Provider::Spotify);

        store.commit(spotify_record("a1")).await.unwrap();

        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().as_ref().unwrap().access_token, "a1");
        assert!(memory.snapshot().contains_key("spotify_auth"));
        assert!(!store.is_authenticated(Provider::YouTube));
    }

    #[tokio::test]
    async fn undecodable_record_loads_as_absent() {
        let memory = MemoryStore::new();
        memory.set("spotify_auth", r#"{"accessToken":"a"}"#).await.unwrap();
        let store = TokenStore::new(Arc::new(memory));

        store.load_all().await;

        assert!(store.get(Provider::Spotify).is_none());
    }

    #[tokio::test]
    async fn clear_removes_from_storage_and_memory() {
        let memory = MemoryStore::new();
        let store = TokenStore::new(Arc::new(memory.clone()));
        store.commit(spotify_record("a1")).await.unwrap();

        store.clear(Provider::Spotify).await.unwrap();

        assert!(store.get(Provider::Spotify).is_none());
        assert!(memory.is_empty());
    }

    #[tokio::test]
    async fn reload_picks_up_external_writes() {
        let memory = MemoryStore::new();
        let store = TokenStore::new(Arc::new(memory.clone()));
        let raw = serde_json::to_string(&spotify_record("external")).unwrap();
        memory.set("spotify_auth", &raw).await.unwrap();

        let record = store.reload(Provider::Spotify).await;

        assert_eq!(record.unwrap().access_token, "external");
        assert!(store.is_authenticated(Provider::Spotify));
    }

    #[tokio::test]
    async fn reload_sees_external_removal_and_skips_unchanged() {
        let memory = MemoryStore::new();
        let store = TokenStore::new(Arc::new(memory.clone()));
        store.commit(spotify_record("a1")).await.unwrap();
        let mut rx = store.subscribe(Provider::Spotify);
        rx.borrow_and_update();

        store.reload(Provider::Spotify).await;
        assert!(!rx.has_changed().unwrap());

        memory.remove("spotify_auth").await.unwrap();
        assert!(store.reload(Provider::Spotify).await.is_none());
        assert!(rx.has_changed().unwrap());
        assert!(!store.is_authenticated(Provider::Spotify));
    }
}
