//! Message channel.
//!
//! Fire-and-forget messages to individual peers, sync broadcasts to all of
//! them, and routing of inbound messages onto the event bus.

use futures_util::future::join_all;
use std::sync::Arc;
use tracing::{debug, info, warn};
use wearlink_core::{route_message, InboundRoute};
use wearlink_types::{Message, NodeId, SYNC_PATH, SYNC_PAYLOAD};

use crate::error::LinkError;
use crate::events::{EventBus, LinkEvent};
use crate::registry::NodeRegistry;
use crate::transport::{Transport, TransportError};

/// Outcome of a sync broadcast, one entry per peer attempted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Peers the request reached.
    pub delivered: Vec<NodeId>,
    /// Peers it did not, with the reason.
    pub failed: Vec<(NodeId, TransportError)>,
}

impl BroadcastReport {
    /// Number of peers attempted.
    pub fn attempted(&self) -> usize {
        self.delivered.len() + self.failed.len()
    }

    /// Whether every attempted peer was reached.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Addressed messaging between devices.
pub struct MessageChannel<T: Transport> {
    transport: Arc<T>,
    registry: Arc<NodeRegistry<T>>,
    bus: EventBus,
}

impl<T: Transport> MessageChannel<T> {
    /// Create a channel.
    pub fn new(transport: Arc<T>, registry: Arc<NodeRegistry<T>>, bus: EventBus) -> Self {
        Self {
            transport,
            registry,
            bus,
        }
    }

    /// Send one message to one reachable node. Not retried.
    ///
    /// A node outside the reachable set fails without touching the
    /// transport.
    pub async fn send(&self, target: &NodeId, path: &str, payload: &[u8]) -> Result<(), LinkError> {
        if !self.registry.contains(target) {
            return Err(LinkError::Delivery {
                node: target.clone(),
                source: TransportError::UnknownNode(target.clone()),
            });
        }

        self.transport
            .send_message(target, path, payload)
            .await
            .map_err(|source| LinkError::Delivery {
                node: target.clone(),
                source,
            })?;
        debug!(node = %target, path, bytes = payload.len(), "Message sent");
        Ok(())
    }

    /// Ask every reachable peer for its latest data.
    ///
    /// Sends run concurrently; one peer failing does not stop the others.
    pub async fn broadcast_sync(&self) -> BroadcastReport {
        let peers = self.registry.reachable_ids();
        let sends = peers.into_iter().map(|peer| async move {
            let result = self
                .transport
                .send_message(&peer, SYNC_PATH, SYNC_PAYLOAD)
                .await;
            (peer, result)
        });

        let mut report = BroadcastReport::default();
        for (peer, result) in join_all(sends).await {
            match result {
                Ok(()) => report.delivered.push(peer),
                Err(e) => {
                    warn!(peer = %peer, "Sync request failed: {}", e);
                    report.failed.push((peer, e));
                }
            }
        }
        info!(
            delivered = report.delivered.len(),
            failed = report.failed.len(),
            "Sync requested"
        );
        report
    }

    /// Route an inbound message and publish the matching event.
    pub fn on_message_received(&self, message: &Message) -> InboundRoute {
        let route = route_message(message);
        debug!(path = %message.path, from = %message.source, "Message received");
        let event = match route.clone() {
            InboundRoute::Command { command, from } => LinkEvent::CommandReceived { command, from },
            InboundRoute::SyncRequested { from } => LinkEvent::SyncRequested { from },
            InboundRoute::Generic { path, data, from } => {
                LinkEvent::MessageReceived { path, data, from }
            }
        };
        self.bus.publish(event);
        route
    }
}
