//! Invalidate-and-reload replication of cart state.
//!
//! Two delivery paths, both rooted in a mutation by the owning store:
//! the in-process notifier (same context, synchronous after the
//! mutating call returns) and the storage key-change signal (other
//! contexts only). A watcher merges both so a reader registered once
//! sees every update regardless of origin; the reaction is always a
//! full re-read of the persisted snapshot, never a diff.

use std::sync::Arc;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::storage::{ContextId, KeyChange};
use crate::store::{CART_STORAGE_KEY, CartStore};

/// Which delivery path produced an update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOrigin {
    /// The mutation happened in this watcher's own context.
    SameContext,
    /// Another context wrote the shared cart key.
    OtherContext,
}

/// A cart-changed notification. Deliberately payload-free: re-read the
/// snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CartUpdate {
    pub origin: UpdateOrigin,
}

/// Merged subscription over both replication paths.
pub struct CartWatcher {
    local: broadcast::Receiver<()>,
    remote: broadcast::Receiver<KeyChange>,
    context: ContextId,
    local_open: bool,
    remote_open: bool,
}

impl CartWatcher {
    pub(crate) fn new(
        local: broadcast::Receiver<()>,
        remote: broadcast::Receiver<KeyChange>,
        context: ContextId,
    ) -> Self {
        Self {
            local,
            remote,
            context,
            local_open: true,
            remote_open: true,
        }
    }

    /// Wait for the next cart update on either path.
    ///
    /// A lagged receiver collapses the missed notifications into one,
    /// which is sound because every notification means the same thing.
    /// Returns `None` when both paths have shut down.
    pub async fn changed(&mut self) -> Option<CartUpdate> {
        use broadcast::error::RecvError;

        loop {
            tokio::select! {
                res = self.local.recv(), if self.local_open => match res {
                    Ok(()) | Err(RecvError::Lagged(_)) => {
                        return Some(CartUpdate { origin: UpdateOrigin::SameContext });
                    }
                    Err(RecvError::Closed) => self.local_open = false,
                },
                res = self.remote.recv(), if self.remote_open => match res {
                    Ok(change) => {
                        if change.key == CART_STORAGE_KEY && change.origin != self.context {
                            return Some(CartUpdate { origin: UpdateOrigin::OtherContext });
                        }
                    }
                    Err(RecvError::Lagged(_)) => {
                        return Some(CartUpdate { origin: UpdateOrigin::OtherContext });
                    }
                    Err(RecvError::Closed) => self.remote_open = false,
                },
                else => return None,
            }
        }
    }
}

/// Keep `store` converged with writes from other contexts: on every
/// cross-context update, re-read the persisted snapshot.
pub fn spawn_follower(store: Arc<CartStore>) -> JoinHandle<()> {
    let mut watcher = store.watch();
    tokio::spawn(async move {
        while let Some(update) = watcher.changed().await {
            if update.origin == UpdateOrigin::OtherContext {
                store.rehydrate().await;
                tracing::debug!("Rehydrated cart after cross-context update");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryStorage, StorageArea};
    use mfe_core::demo_catalog;

    async fn two_tabs() -> (Arc<CartStore>, Arc<CartStore>) {
        let storage: Arc<dyn StorageArea> = Arc::new(MemoryStorage::new());
        let a = Arc::new(CartStore::open(Arc::clone(&storage)).await);
        let b = Arc::new(CartStore::open(storage).await);
        (a, b)
    }

    #[tokio::test]
    async fn test_same_context_update_is_delivered() {
        let (a, _b) = two_tabs().await;
        let mut watcher = a.watch();

        a.add_item(demo_catalog()[0].clone(), 1).await;

        let update = watcher.changed().await.unwrap();
        assert_eq!(update.origin, UpdateOrigin::SameContext);
    }

    #[tokio::test]
    async fn test_writer_does_not_see_its_own_cross_context_signal() {
        let (a, b) = two_tabs().await;
        let mut watcher_a = a.watch();
        let mut watcher_b = b.watch();

        a.add_item(demo_catalog()[0].clone(), 1).await;

        // A observes its own write on the same-context path only.
        assert_eq!(
            watcher_a.changed().await.unwrap().origin,
            UpdateOrigin::SameContext
        );
        // B observes it on the cross-context path.
        assert_eq!(
            watcher_b.changed().await.unwrap().origin,
            UpdateOrigin::OtherContext
        );
    }

    #[tokio::test]
    async fn test_cross_context_convergence() {
        let (a, b) = two_tabs().await;
        let follower = spawn_follower(Arc::clone(&b));

        a.add_item(demo_catalog()[0].clone(), 2).await;

        // Let the follower task observe the signal and rehydrate.
        for _ in 0..10 {
            if b.count() == a.count() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }

        assert_eq!(b.count(), a.count());
        assert_eq!(b.count(), 2);
        follower.abort();
    }

    #[tokio::test]
    async fn test_unrelated_key_is_ignored() {
        let (a, _b) = two_tabs().await;
        let mut watcher = a.watch();

        a.storage()
            .set("other-key", "x", ContextId::new_v4())
            .await
            .unwrap();
        a.add_item(demo_catalog()[1].clone(), 1).await;

        // The unrelated write is skipped; the first delivery is the
        // cart mutation itself.
        let update = watcher.changed().await.unwrap();
        assert_eq!(update.origin, UpdateOrigin::SameContext);
    }
}
