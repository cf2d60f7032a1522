//! Catalog event bus
//!
//! Views subscribe to learn about changes to the local listing collection
//! instead of polling it. Events are only emitted after a local mutation has
//! actually been applied.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::trace;

/// Change notifications for the local listing collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum CatalogEvent {
    /// The whole collection was replaced
    Loaded {
        count: usize,
        /// True when the built-in placeholder list was used
        placeholder: bool,
    },
    /// A listing was created and prepended
    Created { id: String },
    /// A listing was updated in place
    Updated { id: String },
    /// A listing was removed
    Removed { id: String },
}

/// Broadcast channel for [`CatalogEvent`]s
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<CatalogEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus buffering up to `capacity` events per subscriber
    ///
    /// ```
    /// use rdc_common::events::EventBus;
    ///
    /// let event_bus = EventBus::new(100);
    /// let _rx = event_bus.subscribe();
    /// ```
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    pub fn subscribe(&self) -> broadcast::Receiver<CatalogEvent> {
        self.tx.subscribe()
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: CatalogEvent) {
        if self.tx.send(event).is_err() {
            trace!("No subscribers for catalog event");
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(100)
    }
}
