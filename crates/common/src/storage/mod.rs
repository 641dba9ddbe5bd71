//! Durable key-value storage
//!
//! MoodMix keeps auth records, pending PKCE verifiers and library state as
//! opaque JSON strings under well-known keys. Writes are last-writer-wins;
//! nothing here locks across processes.

mod memory;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

pub use memory::MemoryStore;

/// Errors raised by key-value store implementations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StorageError {
    #[error("storage I/O failed: {0}")]
    Io(String),

    #[error("value under '{key}' could not be decoded: {message}")]
    Decode { key: String, message: String },

    #[error("value for '{key}' could not be encoded: {message}")]
    Encode { key: String, message: String },
}

/// String key-value store shared by every MoodMix component.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read the raw value stored under `key`
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Insert or replace the value under `key`
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove `key`; removing a missing key is not an error
    async fn remove(&self, key: &str) -> Result<(), StorageError>;

    /// All keys starting with `prefix`, in lexical order
    async fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, StorageError>;
}

/// Read and decode a JSON value.
///
/// # Errors
/// Returns [`StorageError::Decode`] when the stored text is not valid JSON
/// for `T`, and propagates store failures.
pub async fn load_json<T>(store: &dyn KeyValueStore, key: &str) -> Result<Option<T>, StorageError>
where
    T: DeserializeOwned,
{
    let Some(raw) = store.get(key).await? else {
        return Ok(None);
    };

    serde_json::from_str(&raw)
        .map(Some)
        .map_err(|err| StorageError::Decode { key: key.to_string(), message: err.to_string() })
}

/// Encode `value` as JSON and store it under `key`.
///
/// # Errors
/// Returns [`StorageError::Encode`] if serialization fails, and propagates
/// store failures.
pub async fn save_json<T>(store: &dyn KeyValueStore, key: &str, value: &T) -> Result<(), StorageError>
where
    T: Serialize + Sync,
{
    let raw = serde_json::to_string(value)
        .map_err(|err| StorageError::Encode { key: key.to_string(), message: err.to_string() })?;
    store.set(key, &raw).await
}
