//! Durable key-value storage shared between execution contexts.
//!
//! Models the browser's local-storage contract: a string-keyed area
//! shared by every context, where each write emits a key-change
//! notification that carries no payload. Readers filter out changes
//! originating from their own context, reproducing the rule that the
//! native storage event fires only in *other* tabs.

pub mod file;
pub mod memory;

pub use file::FileStorage;
pub use memory::MemoryStorage;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::broadcast;
use uuid::Uuid;

/// Identity of one execution context ("tab").
pub type ContextId = Uuid;

/// Notification that a key was written. The new value is not carried;
/// readers re-fetch the full entry.
#[derive(Debug, Clone)]
pub struct KeyChange {
    pub key: String,
    /// Context that performed the write.
    pub origin: ContextId,
}

/// Storage error.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Storage error: {0}")]
    Internal(String),
}

/// Trait for shared storage backends.
#[async_trait]
pub trait StorageArea: Send + Sync {
    /// Read the value stored under `key`.
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write `value` under `key` on behalf of `origin` and notify.
    async fn set(&self, key: &str, value: &str, origin: ContextId) -> Result<(), StorageError>;

    /// Remove `key` if present and notify.
    async fn remove(&self, key: &str, origin: ContextId) -> Result<(), StorageError>;

    /// Receiver for key-change notifications from every context,
    /// including the caller's own (filtering is the reader's job).
    fn changes(&self) -> broadcast::Receiver<KeyChange>;
}
