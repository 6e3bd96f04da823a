//! Local event stream.
//!
//! Every notification the sync layer raises (connection changes, inbound
//! records and messages, sampled metrics) goes out on one [`EventBus`].
//! Subscribers get a tokio broadcast receiver; a slow subscriber lags and
//! loses the oldest events rather than blocking the publisher.

use tokio::sync::broadcast;
use wearlink_core::{ConnectionChanged, SemanticRecord};
use wearlink_types::{MetricKind, NodeId};

/// A notification from the sync layer.
#[derive(Debug, Clone, PartialEq)]
pub enum LinkEvent {
    /// Reachable peer membership changed.
    ConnectionChanged(ConnectionChanged),
    /// A peer wrote a data item.
    DataReceived(SemanticRecord),
    /// A peer deleted a path.
    DataDeleted {
        /// Deleted path.
        path: String,
    },
    /// A peer sent a command.
    CommandReceived {
        /// Command text.
        command: String,
        /// Sending node.
        from: NodeId,
    },
    /// A peer asked for our latest data.
    SyncRequested {
        /// Requesting node.
        from: NodeId,
    },
    /// A peer sent a message on a path without special handling.
    MessageReceived {
        /// Message path.
        path: String,
        /// Payload as UTF-8.
        data: String,
        /// Sending node.
        from: NodeId,
    },
    /// A metric was sampled locally.
    DataUpdate {
        /// Metric.
        metric: MetricKind,
        /// Sampled value.
        value: f64,
        /// Sample time in milliseconds.
        timestamp: u64,
    },
}

impl LinkEvent {
    /// Stable event name for logs and bindings.
    pub fn name(&self) -> &'static str {
        match self {
            LinkEvent::ConnectionChanged(_) => "onConnectionChanged",
            LinkEvent::DataReceived(_) => "onDataReceived",
            LinkEvent::DataDeleted { .. } => "onDataDeleted",
            LinkEvent::CommandReceived { .. } => "onCommandReceived",
            LinkEvent::SyncRequested { .. } => "onSyncRequested",
            LinkEvent::MessageReceived { .. } => "onMessageReceived",
            LinkEvent::DataUpdate { .. } => "onDataUpdate",
        }
    }
}

/// Broadcast bus for [`LinkEvent`]s.
///
/// Cheap to clone; clones publish to the same subscribers.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<LinkEvent>,
}

impl EventBus {
    /// Create a bus buffering up to `capacity` events per subscriber.
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Publish an event to all subscribers.
    ///
    /// Returns the number of subscribers that received it.
    pub fn publish(&self, event: LinkEvent) -> usize {
        tracing::trace!(event = event.name(), "publishing");
        // No subscribers is not an error.
        self.tx.send(event).unwrap_or(0)
    }

    /// Subscribe to events published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<LinkEvent> {
        self.tx.subscribe()
    }

    /// Number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
