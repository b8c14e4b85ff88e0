//! Domain event system — decoupled communication between components.
//!
//! Events are published when something interesting happens (a mode switch,
//! a layer edit, a parsed response). The set of events is closed: each kind
//! has a typed payload and a matching [`EventKind`] used for filtering.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::debug;

use crate::mode::CompositionMode;

/// What happened to a layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerChange {
    Created,
    Updated,
    Removed,
    Cleared,
}

/// All domain events in the system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DomainEvent {
    /// The prompt assembly mode was switched.
    ModeChanged {
        from: CompositionMode,
        to: CompositionMode,
        timestamp: DateTime<Utc>,
    },

    /// A layer was created, edited, or removed.
    LayerChanged {
        layer_id: String,
        change: LayerChange,
        timestamp: DateTime<Utc>,
    },

    /// A prompt was composed from layers.
    PromptComposed {
        layers: usize,
        token_estimate: usize,
        excluded: usize,
        timestamp: DateTime<Utc>,
    },

    /// A provider reply was structured.
    ResponseParsed {
        provider: String,
        model: String,
        code_blocks: usize,
        is_error: bool,
        timestamp: DateTime<Utc>,
    },

    /// A session was created.
    SessionCreated {
        session_id: String,
        name: String,
        timestamp: DateTime<Utc>,
    },

    /// An iteration was appended to a session.
    IterationAdded {
        session_id: String,
        index: usize,
        timestamp: DateTime<Utc>,
    },

    /// The active iteration of a session moved.
    HistoryNavigated {
        session_id: String,
        index: usize,
        timestamp: DateTime<Utc>,
    },

    /// A session was deleted.
    SessionDeleted {
        session_id: String,
        timestamp: DateTime<Utc>,
    },
}

/// Discriminant of [`DomainEvent`], used to subscribe to a subset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    ModeChanged,
    LayerChanged,
    PromptComposed,
    ResponseParsed,
    SessionCreated,
    IterationAdded,
    HistoryNavigated,
    SessionDeleted,
}

impl DomainEvent {
    /// The kind of this event.
    pub fn kind(&self) -> EventKind {
        match self {
            Self::ModeChanged { .. } => EventKind::ModeChanged,
            Self::LayerChanged { .. } => EventKind::LayerChanged,
            Self::PromptComposed { .. } => EventKind::PromptComposed,
            Self::ResponseParsed { .. } => EventKind::ResponseParsed,
            Self::SessionCreated { .. } => EventKind::SessionCreated,
            Self::IterationAdded { .. } => EventKind::IterationAdded,
            Self::HistoryNavigated { .. } => EventKind::HistoryNavigated,
            Self::SessionDeleted { .. } => EventKind::SessionDeleted,
        }
    }
}

/// A broadcast-based event bus for domain events.
///
/// Uses `tokio::sync::broadcast` for multi-consumer pub/sub.
pub struct EventBus {
    sender: broadcast::Sender<Arc<DomainEvent>>,
}

impl EventBus {
    /// Create a new event bus with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all subscribers.
    pub fn publish(&self, event: DomainEvent) {
        let kind = event.kind();
        // No subscribers is fine
        if self.sender.send(Arc::new(event)).is_err() {
            debug!(?kind, "Event published with no subscribers");
        }
    }

    /// Subscribe to every event.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<DomainEvent>> {
        self.sender.subscribe()
    }

    /// Subscribe to the listed kinds only.
    pub fn subscribe_to(&self, kinds: &[EventKind]) -> EventSubscription {
        EventSubscription {
            receiver: self.sender.subscribe(),
            kinds: kinds.to_vec(),
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

/// A receiver that only yields events of selected kinds.
pub struct EventSubscription {
    receiver: broadcast::Receiver<Arc<DomainEvent>>,
    kinds: Vec<EventKind>,
}

impl EventSubscription {
    /// Wait for the next matching event. `None` once the bus is dropped.
    ///
    /// Events missed because the subscriber lagged are skipped.
    pub async fn recv(&mut self) -> Option<Arc<DomainEvent>> {
        loop {
            match self.receiver.recv().await {
                Ok(event) if self.kinds.contains(&event.kind()) => return Some(event),
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    debug!(skipped, "Event subscriber lagged");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Return the next matching event that is already queued, if any.
    pub fn try_recv(&mut self) -> Option<Arc<DomainEvent>> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) if self.kinds.contains(&event.kind()) => return Some(event),
                Ok(_) => continue,
                Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
                Err(_) => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn event_bus_publish_subscribe() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();

        bus.publish(DomainEvent::IterationAdded {
            session_id: "s1".into(),
            index: 2,
            timestamp: Utc::now(),
        });

        let event = rx.recv().await.unwrap();
        match event.as_ref() {
            DomainEvent::IterationAdded { session_id, index, .. } => {
                assert_eq!(session_id, "s1");
                assert_eq!(*index, 2);
            }
            _ => panic!("Expected IterationAdded event"),
        }
    }

    #[tokio::test]
    async fn filtered_subscription_skips_other_kinds() {
        let bus = EventBus::new(16);
        let mut modes = bus.subscribe_to(&[EventKind::ModeChanged]);

        bus.publish(DomainEvent::SessionDeleted {
            session_id: "gone".into(),
            timestamp: Utc::now(),
        });
        bus.publish(DomainEvent::ModeChanged {
            from: CompositionMode::Layered,
            to: CompositionMode::Direct,
            timestamp: Utc::now(),
        });

        let event = modes.recv().await.unwrap();
        assert_eq!(event.kind(), EventKind::ModeChanged);
        assert!(modes.try_recv().is_none());
    }

    #[test]
    fn event_bus_no_subscribers_doesnt_panic() {
        let bus = EventBus::new(16);
        bus.publish(DomainEvent::LayerChanged {
            layer_id: "system-1".into(),
            change: LayerChange::Created,
            timestamp: Utc::now(),
        });
    }
}
