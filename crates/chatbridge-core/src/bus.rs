//! Publish/subscribe seam for text events.
//!
//! The application's text bus is owned elsewhere; chatbridge is one
//! subscriber and one publisher among many. [`TextBus`] is the boundary, and
//! [`InMemoryTextBus`] is a small broadcast-backed implementation used by the
//! standalone binary and by tests.

use std::collections::HashMap;

use parking_lot::Mutex;
use tokio::sync::broadcast;

use crate::events::{TextEvent, TextEventSource};

/// Default per-source channel capacity.
const DEFAULT_CAPACITY: usize = 256;

/// Subscribe-by-source and publish operations over text events.
pub trait TextBus: Send + Sync {
    /// Publish an event under `source`. Events with no subscribers are dropped.
    fn publish(&self, source: TextEventSource, event: TextEvent);

    /// Subscribe to every event published under `source` from now on.
    fn subscribe(&self, source: TextEventSource) -> broadcast::Receiver<TextEvent>;
}

/// Broadcast-channel bus with one channel per source.
pub struct InMemoryTextBus {
    channels: Mutex<HashMap<TextEventSource, broadcast::Sender<TextEvent>>>,
    capacity: usize,
}

impl InMemoryTextBus {
    /// Create a bus with the default per-source capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create a bus whose per-source channels buffer `capacity` events.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            channels: Mutex::new(HashMap::new()),
            capacity: capacity.max(1),
        }
    }

    fn sender(&self, source: TextEventSource) -> broadcast::Sender<TextEvent> {
        self.channels
            .lock()
            .entry(source)
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .clone()
    }
}

impl Default for InMemoryTextBus {
    fn default() -> Self {
        Self::new()
    }
}

impl TextBus for InMemoryTextBus {
    fn publish(&self, source: TextEventSource, event: TextEvent) {
        let receivers = self.sender(source).send(event).unwrap_or(0);
        tracing::trace!(%source, receivers, "text event published");
    }

    fn subscribe(&self, source: TextEventSource) -> broadcast::Receiver<TextEvent> {
        self.sender(source).subscribe()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
