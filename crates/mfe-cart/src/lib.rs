//! Cart state store and cross-context replication.
//!
//! Provides:
//! - `CartStore` - Authoritative cart snapshot with best-effort persistence
//! - Storage backends (memory, file)
//! - `CartWatcher` / `spawn_follower` - Invalidate-and-reload replication
//! - `CartCoordinator` - The host's message loop

pub mod coordinator;
pub mod replication;
pub mod storage;
pub mod store;

pub use coordinator::CartCoordinator;
pub use replication::{CartUpdate, CartWatcher, UpdateOrigin, spawn_follower};
pub use storage::{ContextId, KeyChange, StorageArea, StorageError};
pub use store::{CART_STORAGE_KEY, CartLineItem, CartStore};
