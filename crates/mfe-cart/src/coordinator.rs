//! Host-side cart message loop.
//!
//! The shell owns the cart; fragments only send messages. This
//! coordinator consumes `add-to-cart` from the products fragment and
//! `cart-operation` from the cart fragment, applies them to the store,
//! and answers each applied operation with a forced
//! `cart-count-updated` publish so the header badge refreshes even when
//! the count did not change.

use std::sync::Arc;

use mfe_core::{
    ActivityEntry, ActivityJournal, ActivityKind, AddToCart, CartOperation, Message, MessageBus,
    Participant, message::Payload,
};

use crate::store::CartStore;

/// Applies fragment messages to the cart store.
pub struct CartCoordinator {
    bus: MessageBus,
    store: Arc<CartStore>,
    journal: Option<Arc<ActivityJournal>>,
}

impl CartCoordinator {
    #[must_use]
    pub fn new(bus: MessageBus, store: Arc<CartStore>) -> Self {
        Self {
            bus,
            store,
            journal: None,
        }
    }

    /// Record applied operations into a diagnostics journal.
    #[must_use]
    pub fn with_journal(mut self, journal: Arc<ActivityJournal>) -> Self {
        self.journal = Some(journal);
        self
    }

    /// Consume fragment messages until every bus handle is gone.
    pub async fn run(&self) {
        let mut adds = self.bus.subscribe(Participant::Products, AddToCart::KIND);
        let mut ops = self.bus.subscribe(Participant::Cart, CartOperation::KIND);

        // A message may already occupy the slot from before this loop
        // started observing; apply it like a fresh publish.
        if let Some(msg) = adds.current() {
            self.handle_add(&msg).await;
        }
        if let Some(msg) = ops.current() {
            self.handle_operation(&msg).await;
        }

        loop {
            tokio::select! {
                msg = adds.recv() => match msg {
                    Some(msg) if self.is_current(&msg) => self.handle_add(&msg).await,
                    Some(_) => {}
                    None => break,
                },
                msg = ops.recv() => match msg {
                    Some(msg) if self.is_current(&msg) => self.handle_operation(&msg).await,
                    Some(_) => {}
                    None => break,
                },
            }
        }
    }

    // The slot is state, not a queue: a delivered message that has
    // already been superseded or consumed must not be applied again.
    fn is_current(&self, message: &Message) -> bool {
        self.bus.current().as_ref() == Some(message)
    }

    async fn handle_add(&self, message: &Message) {
        let payload = match AddToCart::from_message(message) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!("Malformed add-to-cart payload: {e}");
                self.bus.clear();
                return;
            }
        };

        self.record(
            ActivityEntry::new(ActivityKind::Cart, message.from, "add-to-cart")
                .details(serde_json::json!({
                    "productId": payload.product.id,
                    "quantity": payload.quantity,
                })),
        );

        self.store
            .add_item(payload.product, payload.quantity)
            .await;
        self.bus.clear();
        self.publish_count().await;
    }

    async fn handle_operation(&self, message: &Message) {
        let operation = match CartOperation::from_message(message) {
            Ok(operation) => operation,
            Err(e) => {
                tracing::warn!("Malformed cart-operation payload: {e}");
                self.bus.clear();
                return;
            }
        };

        self.record(
            ActivityEntry::new(ActivityKind::Cart, message.from, "cart-operation")
                .details(serde_json::json!({"operation": format!("{operation:?}")})),
        );

        match operation {
            CartOperation::Remove { product_id } => self.store.remove_item(&product_id).await,
            CartOperation::Update {
                product_id,
                quantity,
            } => self.store.set_quantity(&product_id, quantity).await,
            CartOperation::Clear => self.store.clear().await,
        }

        self.bus.clear();
        self.publish_count().await;
    }

    /// Force-publish the current count to the header. Called eagerly
    /// after mount and after every applied operation.
    pub async fn publish_count(&self) {
        let update = mfe_core::CartCountUpdated::now(self.store.count());
        match update.to_message(Participant::Shell, Participant::Header) {
            Ok(msg) => self.bus.publish_forced(msg).await,
            Err(e) => tracing::error!("Failed to encode cart-count-updated: {e}"),
        }
    }

    fn record(&self, entry: ActivityEntry) {
        if let Some(journal) = &self.journal {
            journal.record(entry);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryStorage, StorageArea};
    use mfe_core::{CartCountUpdated, demo_catalog};

    async fn setup() -> (MessageBus, Arc<CartStore>, Arc<CartCoordinator>) {
        let storage: Arc<dyn StorageArea> = Arc::new(MemoryStorage::new());
        let bus = MessageBus::new();
        let store = Arc::new(CartStore::open(storage).await);
        let coordinator = Arc::new(CartCoordinator::new(bus.clone(), Arc::clone(&store)));

        let runner = Arc::clone(&coordinator);
        tokio::spawn(async move { runner.run().await });

        (bus, store, coordinator)
    }

    async fn wait_for<F: Fn() -> bool>(cond: F) {
        for _ in 0..100 {
            if cond() {
                return;
            }
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }
        panic!("condition not reached");
    }

    #[tokio::test]
    async fn test_add_to_cart_flows_into_store() {
        let (bus, store, _coordinator) = setup().await;
        let mut header = bus.subscribe(Participant::Shell, CartCountUpdated::KIND);

        let payload = AddToCart {
            product: demo_catalog()[0].clone(),
            quantity: 2,
        };
        bus.publish(
            payload
                .to_message(Participant::Products, Participant::Cart)
                .unwrap(),
        );

        let count_msg = header.recv().await.unwrap();
        let update = CartCountUpdated::from_message(&count_msg).unwrap();
        assert_eq!(update.count, 2);
        assert_eq!(store.count(), 2);
    }

    #[tokio::test]
    async fn test_cart_operations_apply() {
        let (bus, store, _coordinator) = setup().await;
        store.add_item(demo_catalog()[0].clone(), 2).await;
        store.add_item(demo_catalog()[1].clone(), 1).await;

        bus.publish(
            CartOperation::Remove {
                product_id: "1".into(),
            }
            .to_message(Participant::Cart, Participant::Shell)
            .unwrap(),
        );
        wait_for(|| store.count() == 1).await;

        bus.publish(
            CartOperation::Update {
                product_id: "2".into(),
                quantity: 4,
            }
            .to_message(Participant::Cart, Participant::Shell)
            .unwrap(),
        );
        wait_for(|| store.count() == 4).await;

        bus.publish(
            CartOperation::Clear
                .to_message(Participant::Cart, Participant::Shell)
                .unwrap(),
        );
        wait_for(|| store.is_empty()).await;
    }

    #[tokio::test]
    async fn test_applied_message_is_cleared_from_slot() {
        let (bus, store, _coordinator) = setup().await;

        bus.publish(
            AddToCart {
                product: demo_catalog()[2].clone(),
                quantity: 1,
            }
            .to_message(Participant::Products, Participant::Cart)
            .unwrap(),
        );
        wait_for(|| store.count() == 1).await;

        // Whatever occupies the slot now is the count update, not the
        // consumed add-to-cart message.
        wait_for(|| {
            bus.current()
                .is_some_and(|m| m.kind == CartCountUpdated::KIND)
        })
        .await;
    }

    #[tokio::test]
    async fn test_journal_records_applied_operations() {
        let storage: Arc<dyn StorageArea> = Arc::new(MemoryStorage::new());
        let bus = MessageBus::new();
        let store = Arc::new(CartStore::open(storage).await);
        let journal = Arc::new(ActivityJournal::new());
        let coordinator = Arc::new(
            CartCoordinator::new(bus.clone(), Arc::clone(&store))
                .with_journal(Arc::clone(&journal)),
        );
        let runner = Arc::clone(&coordinator);
        tokio::spawn(async move { runner.run().await });

        bus.publish(
            AddToCart {
                product: demo_catalog()[0].clone(),
                quantity: 1,
            }
            .to_message(Participant::Products, Participant::Cart)
            .unwrap(),
        );
        wait_for(|| store.count() == 1).await;

        wait_for(|| !journal.entries().is_empty()).await;
        assert_eq!(journal.entries()[0].action, "add-to-cart");
    }
}
