//! Single-slot broadcast register for inter-participant signaling.
//!
//! The bus holds at most one in-flight [`Message`]. Publishing replaces
//! the slot and notifies every live subscription; subscriptions filter
//! on sender and kind. There is no queue and no history: a slow reader
//! observes only the latest state.

use std::sync::{Arc, RwLock};

use tokio::sync::broadcast;

use crate::{Message, Participant};

/// Broadcast notification emitted on every slot transition.
#[derive(Debug, Clone)]
pub enum BusEvent {
    /// The slot now holds this message.
    Published(Message),
    /// The slot was emptied.
    Cleared,
}

struct Shared {
    slot: RwLock<Option<Message>>,
    sender: broadcast::Sender<BusEvent>,
}

/// Process-wide single-slot message bus.
///
/// Cheap to clone; all clones share the same slot. Inject one bus per
/// composition root rather than reaching for ambient global state.
#[derive(Clone)]
pub struct MessageBus {
    shared: Arc<Shared>,
}

impl Default for MessageBus {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageBus {
    /// Create an empty bus.
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(256);
        Self {
            shared: Arc::new(Shared {
                slot: RwLock::new(None),
                sender,
            }),
        }
    }

    /// Store `message` as current and notify subscribers.
    pub fn publish(&self, message: Message) {
        *self.shared.slot.write().unwrap() = Some(message.clone());
        let _ = self.shared.sender.send(BusEvent::Published(message));
    }

    /// Publish with a guaranteed observable transition, even when the
    /// new message equals the current one.
    ///
    /// A plain replace-with-equal-value reads as a no-op to reactive
    /// consumers, so this first empties the slot, yields to the
    /// scheduler once so dependents observe the intermediate state, and
    /// only then stores the new message. Used for repeated
    /// `cart-count-updated` publishes where the count has not changed.
    pub async fn publish_forced(&self, message: Message) {
        self.clear();
        tokio::task::yield_now().await;
        self.publish(message);
    }

    /// Empty the slot. Idempotent: clearing an already-empty bus does
    /// not notify.
    pub fn clear(&self) {
        let was_occupied = self.shared.slot.write().unwrap().take().is_some();
        if was_occupied {
            let _ = self.shared.sender.send(BusEvent::Cleared);
        }
    }

    /// Current slot content, unfiltered.
    #[must_use]
    pub fn current(&self) -> Option<Message> {
        self.shared.slot.read().unwrap().clone()
    }

    /// Read view filtered to messages from `from` with kind `kind`.
    #[must_use]
    pub fn subscribe(&self, from: Participant, kind: impl Into<String>) -> Subscription {
        Subscription {
            shared: Arc::clone(&self.shared),
            rx: self.shared.sender.subscribe(),
            from,
            kind: kind.into(),
        }
    }
}

/// A filtered, reactive view over the bus slot.
pub struct Subscription {
    shared: Arc<Shared>,
    rx: broadcast::Receiver<BusEvent>,
    from: Participant,
    kind: String,
}

impl Subscription {
    /// The current message, if it matches this subscription's filter.
    #[must_use]
    pub fn current(&self) -> Option<Message> {
        self.shared
            .slot
            .read()
            .unwrap()
            .clone()
            .filter(|m| m.matches(self.from, &self.kind))
    }

    /// Wait for the next matching publish.
    ///
    /// Clears and non-matching messages are skipped, so a transient
    /// empty slot (the first phase of a forced publish) is never
    /// surfaced as an event. Returns `None` once every bus handle has
    /// been dropped.
    pub async fn recv(&mut self) -> Option<Message> {
        loop {
            match self.rx.recv().await {
                Ok(BusEvent::Published(m)) if m.matches(self.from, &self.kind) => return Some(m),
                Ok(_) => {}
                // Single-slot semantics: a lagged reader just catches up
                // with whatever comes next.
                Err(broadcast::error::RecvError::Lagged(_)) => {}
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}
