//! Pending PKCE verifiers keyed by login state
//!
//! A verifier is written under `<provider>_cv_<state>` when a login starts and
//! consumed exactly once by the callback that carries the same state. Starting
//! a new login drops every older verifier of that provider, and entries older
//! than the TTL are never returned.

use std::sync::Arc;

use moodmix_common::auth::PkceSession;
use moodmix_common::storage::{self, KeyValueStore, StorageError};
use moodmix_common::time::Clock;
use moodmix_domain::Provider;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PendingVerifier {
    code_verifier: String,
    created_at: i64,
}

/// Durable store of verifiers for logins that have not returned yet
pub struct PendingLoginStore {
    storage: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    ttl_ms: i64,
}

impl PendingLoginStore {
    /// Entries older than `ttl_ms` are never returned
    pub fn new(storage: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>, ttl_ms: i64) -> Self {
        Self { storage, clock, ttl_ms }
    }

    /// Store the session's verifier, replacing any older pending login.
    ///
    /// # Errors
    /// Propagates storage failures.
    pub async fn save(&self, provider: Provider, session: &PkceSession) -> Result<(), StorageError> {
        self.clear(provider).await?;

        let entry = PendingVerifier {
            code_verifier: session.code_verifier.clone(),
            created_at: self.clock.millis_since_epoch(),
        };
        storage::save_json(self.storage.as_ref(), &provider.verifier_key(&session.state), &entry)
            .await
    }

    /// Consume the verifier stored for `state`.
    ///
    /// Returns `None` when nothing matches, the entry expired or it cannot be
    /// decoded. The entry is removed in every case.
    pub async fn take(&self, provider: Provider, state: &str) -> Option<String> {
        let key = provider.verifier_key(state);
        let loaded = storage::load_json::<PendingVerifier>(self.storage.as_ref(), &key).await;

        if let Err(err) = self.storage.remove(&key).await {
            warn!(%provider, error = %err, "failed to remove pending verifier");
        }

        let entry = match loaded {
            Ok(Some(entry)) => entry,
            Ok(None) => {
                debug!(%provider, "no pending verifier for state");
                return None;
            }
            Err(err) => {
                warn!(%provider, error = %err, "pending verifier unreadable");
                return None;
            }
        };

        let age = self.clock.millis_since_epoch().saturating_sub(entry.created_at);
        if age > self.ttl_ms {
            debug!(%provider, age_ms = age, "pending verifier expired");
            return None;
        }

        Some(entry.code_verifier)
    }

    /// Drop every pending verifier of `provider`.
    ///
    /// # Errors
    /// Propagates storage failures.
    pub async fn clear(&self, provider: Provider) -> Result<(), StorageError> {
        for key in self.storage.keys_with_prefix(&provider.verifier_key_prefix()).await? {
            self.storage.remove(&key).await?;
        }
        Ok(())
    }
}
