//! Authoritative cart state.
//!
//! The store owns the only mutable copy of the cart snapshot. Every
//! mutation persists the full snapshot to shared storage and then
//! raises the in-process "re-read the cart" notification; other
//! contexts learn about the write through the storage key-change
//! signal. Persistence is best-effort: a failed write is logged and the
//! in-memory snapshot stays authoritative for this context.

use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use mfe_core::Product;

use crate::replication::CartWatcher;
use crate::storage::{ContextId, StorageArea};

/// Storage key of the persisted cart blob.
pub const CART_STORAGE_KEY: &str = "mfe-cart-items";

/// One cart line. Invariant: `quantity >= 1`; a zero quantity means the
/// line does not exist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLineItem {
    pub product: Product,
    pub quantity: u32,
}

/// Owner of the cart snapshot for one execution context.
pub struct CartStore {
    context: ContextId,
    storage: Arc<dyn StorageArea>,
    items: RwLock<Vec<CartLineItem>>,
    // Payload-free "re-read the cart" signal for same-context readers.
    notifier: broadcast::Sender<()>,
}

impl CartStore {
    /// Open a store over `storage`, rehydrating any persisted snapshot.
    ///
    /// Absent or unreadable state initializes an empty cart; this
    /// constructor never fails.
    pub async fn open(storage: Arc<dyn StorageArea>) -> Self {
        let context = ContextId::new_v4();
        let items = Self::load_snapshot(storage.as_ref()).await;
        let (notifier, _) = broadcast::channel(64);
        Self {
            context,
            storage,
            items: RwLock::new(items),
            notifier,
        }
    }

    async fn load_snapshot(storage: &dyn StorageArea) -> Vec<CartLineItem> {
        let blob = match storage.get(CART_STORAGE_KEY).await {
            Ok(Some(blob)) => blob,
            Ok(None) => return Vec::new(),
            Err(e) => {
                tracing::warn!("Failed to read persisted cart, starting empty: {e}");
                return Vec::new();
            }
        };

        match serde_json::from_str(&blob) {
            Ok(items) => items,
            Err(e) => {
                tracing::warn!("Persisted cart is unreadable, starting empty: {e}");
                Vec::new()
            }
        }
    }

    /// Identity of this store's execution context.
    #[must_use]
    pub fn context_id(&self) -> ContextId {
        self.context
    }

    /// The shared storage this store persists into.
    #[must_use]
    pub fn storage(&self) -> &Arc<dyn StorageArea> {
        &self.storage
    }

    /// Merged view: replication signal covering both the same-context
    /// and the cross-context delivery path.
    #[must_use]
    pub fn watch(&self) -> CartWatcher {
        CartWatcher::new(
            self.notifier.subscribe(),
            self.storage.changes(),
            self.context,
        )
    }

    /// Add `quantity` of `product`, merging into an existing line for
    /// the same product id.
    pub async fn add_item(&self, product: Product, quantity: u32) {
        if quantity == 0 {
            tracing::warn!(product_id = %product.id, "Ignoring add of zero quantity");
            return;
        }

        {
            let mut items = self.items.write().unwrap();
            if let Some(line) = items.iter_mut().find(|l| l.product.id == product.id) {
                line.quantity += quantity;
            } else {
                items.push(CartLineItem { product, quantity });
            }
        }
        self.persist().await;
    }

    /// Remove the line for `product_id`; no-op if absent.
    pub async fn remove_item(&self, product_id: &str) {
        self.items
            .write()
            .unwrap()
            .retain(|l| l.product.id != product_id);
        self.persist().await;
    }

    /// Overwrite the quantity of an existing line. Zero removes the
    /// line; an absent line is a logged no-op.
    pub async fn set_quantity(&self, product_id: &str, quantity: u32) {
        if quantity == 0 {
            self.remove_item(product_id).await;
            return;
        }

        {
            let mut items = self.items.write().unwrap();
            let Some(line) = items.iter_mut().find(|l| l.product.id == product_id) else {
                tracing::warn!(product_id, "set_quantity on absent item ignored");
                return;
            };
            line.quantity = quantity;
        }
        self.persist().await;
    }

    /// Empty the cart. Idempotent.
    pub async fn clear(&self) {
        self.items.write().unwrap().clear();
        self.persist().await;
    }

    /// Re-read the persisted snapshot, replacing the in-memory view.
    /// This is the cross-context "invalidate and reload" path.
    pub async fn rehydrate(&self) {
        let items = Self::load_snapshot(self.storage.as_ref()).await;
        *self.items.write().unwrap() = items;
    }

    /// Snapshot of the current lines.
    #[must_use]
    pub fn items(&self) -> Vec<CartLineItem> {
        self.items.read().unwrap().clone()
    }

    /// Sum of all quantities.
    #[must_use]
    pub fn count(&self) -> u32 {
        self.items.read().unwrap().iter().map(|l| l.quantity).sum()
    }

    /// Sum of price times quantity over all lines.
    #[must_use]
    pub fn total(&self) -> f64 {
        self.items
            .read()
            .unwrap()
            .iter()
            .map(|l| l.product.price * f64::from(l.quantity))
            .sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.read().unwrap().is_empty()
    }

    /// Serialize the snapshot, write it to shared storage, then notify
    /// same-context readers. A failed write degrades cross-context
    /// replication only; the in-memory snapshot is not rolled back.
    async fn persist(&self) {
        let snapshot = self.items();
        match serde_json::to_string(&snapshot) {
            Ok(blob) => {
                if let Err(e) = self
                    .storage
                    .set(CART_STORAGE_KEY, &blob, self.context)
                    .await
                {
                    tracing::warn!("Failed to persist cart: {e}");
                }
            }
            Err(e) => tracing::warn!("Failed to serialize cart: {e}"),
        }
        let _ = self.notifier.send(());
    }
}
