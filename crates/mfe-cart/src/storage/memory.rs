//! In-memory shared storage.

use std::{collections::HashMap, sync::RwLock};

use async_trait::async_trait;
use tokio::sync::broadcast;

use super::{ContextId, KeyChange, StorageArea, StorageError};

/// In-memory storage implementation.
///
/// Share one instance behind an `Arc` between several stores to model
/// several tabs in one process. Data is lost on drop.
pub struct MemoryStorage {
    entries: RwLock<HashMap<String, String>>,
    changes: broadcast::Sender<KeyChange>,
}

impl MemoryStorage {
    /// Create an empty storage area.
    #[must_use]
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(64);
        Self {
            entries: RwLock::new(HashMap::new()),
            changes,
        }
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StorageArea for MemoryStorage {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self
            .entries
            .read()
            .map_err(|e| StorageError::Internal(e.to_string()))?
            .get(key)
            .cloned())
    }

    async fn set(&self, key: &str, value: &str, origin: ContextId) -> Result<(), StorageError> {
        self.entries
            .write()
            .map_err(|e| StorageError::Internal(e.to_string()))?
            .insert(key.to_owned(), value.to_owned());

        let _ = self.changes.send(KeyChange {
            key: key.to_owned(),
            origin,
        });
        Ok(())
    }

    async fn remove(&self, key: &str, origin: ContextId) -> Result<(), StorageError> {
        let removed = self
            .entries
            .write()
            .map_err(|e| StorageError::Internal(e.to_string()))?
            .remove(key)
            .is_some();

        if removed {
            let _ = self.changes.send(KeyChange {
                key: key.to_owned(),
                origin,
            });
        }
        Ok(())
    }

    fn changes(&self) -> broadcast::Receiver<KeyChange> {
        self.changes.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_get_remove() {
        let storage = MemoryStorage::new();
        let ctx = ContextId::new_v4();

        storage.set("k", "v", ctx).await.unwrap();
        assert_eq!(storage.get("k").await.unwrap().as_deref(), Some("v"));

        storage.remove("k", ctx).await.unwrap();
        assert_eq!(storage.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_change_notification_carries_key_and_origin() {
        let storage = MemoryStorage::new();
        let writer = ContextId::new_v4();
        let mut rx = storage.changes();

        storage.set("mfe-cart-items", "[]", writer).await.unwrap();

        let change = rx.recv().await.unwrap();
        assert_eq!(change.key, "mfe-cart-items");
        assert_eq!(change.origin, writer);
    }

    #[tokio::test]
    async fn test_remove_of_absent_key_does_not_notify() {
        let storage = MemoryStorage::new();
        let mut rx = storage.changes();

        storage.remove("missing", ContextId::new_v4()).await.unwrap();
        assert!(rx.try_recv().is_err());
    }
}
