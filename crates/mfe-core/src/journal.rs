//! Bounded diagnostics journal.
//!
//! Keeps the last [`MAX_ENTRIES`] coordination events (navigation,
//! messages, cart mutations, fragment lifecycle) for the debug panel,
//! and broadcasts each entry to live watchers.

use std::{
    collections::VecDeque,
    sync::RwLock,
    time::{SystemTime, UNIX_EPOCH},
};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::broadcast;

use crate::Participant;

/// Journal retention limit.
pub const MAX_ENTRIES: usize = 50;

/// Category of a journal entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    Navigation,
    Message,
    Cart,
    Mfe,
}

/// One recorded coordination event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityEntry {
    /// Unix epoch seconds.
    pub timestamp: i64,
    pub kind: ActivityKind,
    pub from: Participant,
    pub to: Option<Participant>,
    pub action: String,
    pub details: Option<Value>,
}

impl ActivityEntry {
    /// Create an entry stamped with the current time.
    #[must_use]
    pub fn new(kind: ActivityKind, from: Participant, action: impl Into<String>) -> Self {
        Self {
            timestamp: now(),
            kind,
            from,
            to: None,
            action: action.into(),
            details: None,
        }
    }

    /// Set the addressee.
    #[must_use]
    pub fn to(mut self, to: Participant) -> Self {
        self.to = Some(to);
        self
    }

    /// Attach free-form details.
    #[must_use]
    pub fn details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }
}

fn now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

/// Ring buffer of recent coordination events with live fan-out.
pub struct ActivityJournal {
    inner: RwLock<VecDeque<ActivityEntry>>,
    sender: broadcast::Sender<ActivityEntry>,
}

impl Default for ActivityJournal {
    fn default() -> Self {
        Self::new()
    }
}

impl ActivityJournal {
    /// Create an empty journal.
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(MAX_ENTRIES);
        Self {
            inner: RwLock::new(VecDeque::with_capacity(MAX_ENTRIES)),
            sender,
        }
    }

    /// Append an entry, evicting the oldest past the retention limit.
    pub fn record(&self, entry: ActivityEntry) {
        let _ = self.sender.send(entry.clone());

        let mut inner = self.inner.write().unwrap();
        if inner.len() == MAX_ENTRIES {
            inner.pop_front();
        }
        inner.push_back(entry);
    }

    /// Snapshot of the retained entries, oldest first.
    #[must_use]
    pub fn entries(&self) -> Vec<ActivityEntry> {
        self.inner.read().unwrap().iter().cloned().collect()
    }

    /// Receiver for entries recorded after this call.
    #[must_use]
    pub fn watch(&self) -> broadcast::Receiver<ActivityEntry> {
        self.sender.subscribe()
    }

    /// Drop all retained entries.
    pub fn clear(&self) {
        self.inner.write().unwrap().clear();
    }

    /// Stream that yields the retained entries first, then live ones.
    ///
    /// This is what a debug panel attaches to: it renders the backlog
    /// and then follows along.
    #[must_use]
    pub fn entries_plus_watch(&self) -> futures::stream::BoxStream<'static, ActivityEntry> {
        use futures::StreamExt;
        use tokio_stream::wrappers::BroadcastStream;

        let (history, rx) = (self.entries(), self.watch());

        let backlog = futures::stream::iter(history);
        let live = BroadcastStream::new(rx).filter_map(|res| async move { res.ok() });

        Box::pin(backlog.chain(live))
    }
}
