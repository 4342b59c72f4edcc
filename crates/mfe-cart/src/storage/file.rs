//! File-backed shared storage.

use std::{collections::HashMap, path::PathBuf};

use async_trait::async_trait;
use tokio::sync::{Mutex, broadcast};

use super::{ContextId, KeyChange, StorageArea, StorageError};

/// Durable storage backed by a single JSON file (one object, key →
/// value). Each write re-reads, mutates and rewrites the whole file;
/// acceptable for rare, human-paced writes.
pub struct FileStorage {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process.
    write_lock: Mutex<()>,
    changes: broadcast::Sender<KeyChange>,
}

impl FileStorage {
    /// Use the file at `path`, which need not exist yet.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let (changes, _) = broadcast::channel(64);
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
            changes,
        }
    }

    /// Backing file path.
    #[must_use]
    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    async fn read_entries(&self) -> Result<HashMap<String, String>, StorageError> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(HashMap::new()),
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_str(&raw) {
            Ok(entries) => Ok(entries),
            Err(e) => {
                // Corrupt file: start over rather than wedging every writer.
                tracing::warn!(path = %self.path.display(), "Discarding unreadable storage file: {e}");
                Ok(HashMap::new())
            }
        }
    }

    async fn write_entries(&self, entries: &HashMap<String, String>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let raw = serde_json::to_string(entries)?;
        tokio::fs::write(&self.path, raw).await?;
        Ok(())
    }
}

#[async_trait]
impl StorageArea for FileStorage {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.read_entries().await?.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str, origin: ContextId) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().await;
        let mut entries = self.read_entries().await?;
        entries.insert(key.to_owned(), value.to_owned());
        self.write_entries(&entries).await?;

        let _ = self.changes.send(KeyChange {
            key: key.to_owned(),
            origin,
        });
        Ok(())
    }

    async fn remove(&self, key: &str, origin: ContextId) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().await;
        let mut entries = self.read_entries().await?;
        if entries.remove(key).is_none() {
            return Ok(());
        }
        self.write_entries(&entries).await?;

        let _ = self.changes.send(KeyChange {
            key: key.to_owned(),
            origin,
        });
        Ok(())
    }

    fn changes(&self) -> broadcast::Receiver<KeyChange> {
        self.changes.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("mfe-storage-{name}-{}", uuid::Uuid::new_v4()))
    }

    #[tokio::test]
    async fn test_roundtrip_through_file() {
        let path = temp_path("roundtrip");
        let storage = FileStorage::new(&path);
        let ctx = ContextId::new_v4();

        storage.set("mfe-cart-items", "[{\"x\":1}]", ctx).await.unwrap();

        // A fresh handle on the same path sees the value.
        let reopened = FileStorage::new(&path);
        assert_eq!(
            reopened.get("mfe-cart-items").await.unwrap().as_deref(),
            Some("[{\"x\":1}]")
        );

        let _ = tokio::fs::remove_file(&path).await;
    }

    #[tokio::test]
    async fn test_missing_file_reads_as_empty() {
        let storage = FileStorage::new(temp_path("missing"));
        assert_eq!(storage.get("anything").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_corrupt_file_is_discarded() {
        let path = temp_path("corrupt");
        tokio::fs::write(&path, "not json at all").await.unwrap();

        let storage = FileStorage::new(&path);
        assert_eq!(storage.get("k").await.unwrap(), None);

        storage.set("k", "v", ContextId::new_v4()).await.unwrap();
        assert_eq!(storage.get("k").await.unwrap().as_deref(), Some("v"));

        let _ = tokio::fs::remove_file(&path).await;
    }
}
