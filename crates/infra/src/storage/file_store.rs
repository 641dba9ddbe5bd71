//! JSON-file backed key-value store
//!
//! The whole store is one JSON object of string values. Writers in this
//! process are serialised by an async mutex and replace the file atomically
//! (write a sibling temp file, then rename). Readers always re-read the file,
//! so another process writing the same file is observed on the next read.
//!
//! A file that no longer decodes is reported by reads. The next write moves
//! it aside to `<path>.corrupt` and starts over from an empty store.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use moodmix_common::storage::{KeyValueStore, StorageError};
use tokio::sync::Mutex;
use tracing::{debug, warn};

type Entries = BTreeMap<String, String>;

/// Key-value store persisted as one JSON file
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStore {
    /// Store backed by `path`; the file is created on the first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), write_lock: Mutex::new(()) }
    }

    /// Location of the store file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_entries(&self) -> Result<Entries, StorageError> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Entries::new()),
            Err(err) => {
                return Err(StorageError::Io(format!("read {}: {err}", self.path.display())))
            }
        };

        if raw.trim().is_empty() {
            return Ok(Entries::new());
        }

        serde_json::from_str(&raw).map_err(|err| StorageError::Decode {
            key: self.path.display().to_string(),
            message: err.to_string(),
        })
    }

    async fn write_entries(&self, entries: &Entries) -> Result<(), StorageError> {
        let encoded = serde_json::to_string_pretty(entries).map_err(|err| StorageError::Encode {
            key: self.path.display().to_string(),
            message: err.to_string(),
        })?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|err| StorageError::Io(format!("create {}: {err}", parent.display())))?;
        }

        let mut temp = self.path.clone().into_os_string();
        temp.push(".tmp");
        let temp = PathBuf::from(temp);

        tokio::fs::write(&temp, encoded)
            .await
            .map_err(|err| StorageError::Io(format!("write {}: {err}", temp.display())))?;
        tokio::fs::rename(&temp, &self.path)
            .await
            .map_err(|err| StorageError::Io(format!("replace {}: {err}", self.path.display())))
    }

    fn quarantine_path(&self) -> PathBuf {
        let mut quarantine = self.path.clone().into_os_string();
        quarantine.push(".corrupt");
        PathBuf::from(quarantine)
    }

    /// Move an undecodable file aside so writes can start over.
    async fn quarantine(&self, reason: &StorageError) -> Result<(), StorageError> {
        let target = self.quarantine_path();
        warn!(
            path = %self.path.display(),
            moved_to = %target.display(),
            error = %reason,
            "store file is corrupt, starting with an empty store"
        );
        tokio::fs::rename(&self.path, &target)
            .await
            .map_err(|err| StorageError::Io(format!("quarantine {}: {err}", self.path.display())))
    }

    async fn modify(&self, apply: impl FnOnce(&mut Entries) -> bool + Send) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().await;
        let mut entries = match self.read_entries().await {
            Ok(entries) => entries,
            Err(err @ StorageError::Decode { .. }) => {
                self.quarantine(&err).await?;
                Entries::new()
            }
            Err(err) => return Err(err),
        };
        if apply(&mut entries) {
            self.write_entries(&entries).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.read_entries().await?.remove(key))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        debug!(key, "storing value");
        self.modify(|entries| {
            entries.insert(key.to_string(), value.to_string());
            true
        })
        .await
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.modify(|entries| entries.remove(key).is_some()).await
    }

    async fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        Ok(self
            .read_entries()
            .await?
            .into_keys()
            .filter(|key| key.starts_with(prefix))
            .collect())
    }
}
