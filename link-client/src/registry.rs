//! Node registry.
//!
//! Holds the current [`ReachableSet`] behind a lock that is only ever held
//! to swap or clone an `Arc`. Readers get a consistent snapshot; writers
//! (discovery refreshes and capability callbacks) replace the whole set and
//! publish a [`LinkEvent::ConnectionChanged`] when membership moved.

use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, info, warn};
use wearlink_core::{ConnectionChanged, ReachableSet};
use wearlink_types::{Node, NodeId};

use crate::events::{EventBus, LinkEvent};
use crate::transport::{Transport, TransportError};

/// Tracks which peers are reachable.
pub struct NodeRegistry<T: Transport> {
    transport: Arc<T>,
    current: RwLock<Arc<ReachableSet>>,
    bus: EventBus,
}

impl<T: Transport> NodeRegistry<T> {
    /// Create a registry with an empty reachable set.
    pub fn new(transport: Arc<T>, bus: EventBus) -> Self {
        Self {
            transport,
            current: RwLock::new(Arc::new(ReachableSet::new())),
            bus,
        }
    }

    /// Query the transport and replace the reachable set.
    ///
    /// Every connected node is kept, nearby or not. On failure the previous
    /// set stays in place and the error is returned.
    pub async fn try_refresh(&self) -> Result<Arc<ReachableSet>, TransportError> {
        let nodes = self.transport.connected_nodes().await?;
        debug!(count = nodes.len(), "Discovered connected nodes");
        self.replace(ReachableSet::from_connected(nodes));
        Ok(self.snapshot())
    }

    /// Like [`NodeRegistry::try_refresh`] but fail-soft: a failed query is
    /// logged and the previous nodes are returned.
    pub async fn refresh(&self) -> Vec<Node> {
        if let Err(e) = self.try_refresh().await {
            warn!("Node discovery failed, keeping previous set: {}", e);
        }
        self.nodes()
    }

    /// Apply a capability change: only nearby nodes are kept.
    pub fn on_capability_changed(&self, nodes: Vec<Node>) -> Option<ConnectionChanged> {
        self.replace(ReachableSet::from_capability(nodes))
    }

    /// Current reachable set.
    pub fn snapshot(&self) -> Arc<ReachableSet> {
        Arc::clone(&self.current.read())
    }

    /// Current reachable nodes.
    pub fn nodes(&self) -> Vec<Node> {
        self.snapshot().nodes().cloned().collect()
    }

    /// Ids of the current reachable nodes.
    pub fn reachable_ids(&self) -> Vec<NodeId> {
        self.snapshot().ids()
    }

    /// Whether a node is currently reachable.
    pub fn contains(&self, id: &NodeId) -> bool {
        self.snapshot().contains(id)
    }

    /// Whether at least one peer is reachable.
    pub fn is_connected(&self) -> bool {
        self.snapshot().is_connected()
    }

    fn replace(&self, next: ReachableSet) -> Option<ConnectionChanged> {
        let mut current = self.current.write();
        let change = next.transition_from(&current);
        *current = Arc::new(next);

        // Published under the write lock so events follow swap order.
        if let Some(ref status) = change {
            info!(
                connected = status.connected,
                count = status.count,
                "Reachable peers changed"
            );
            self.bus.publish(LinkEvent::ConnectionChanged(status.clone()));
        }
        change
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MockTransport;

    fn registry() -> (NodeRegistry<MockTransport>, MockTransport, EventBus) {
        let transport = MockTransport::new();
        let bus = EventBus::new(16);
        let registry = NodeRegistry::new(Arc::new(transport.clone()), bus.clone());
        (registry, transport, bus)
    }

    #[tokio::test]
    async fn starts_empty() {
        let (registry, _, _) = registry();
        assert!(!registry.is_connected());
        assert!(registry.nodes().is_empty());
    }

    #[tokio::test]
    async fn refresh_keeps_every_connected_node() {
        let (registry, transport, _) = registry();
        transport.set_nodes(vec![
            Node::new("w1", "Watch", true),
            Node::new("w2", "Ring", false),
        ]);

        let nodes = registry.refresh().await;
        assert_eq!(nodes.len(), 2);
        assert!(registry.contains(&NodeId::from("w2")));
    }

    #[tokio::test]
    async fn failed_refresh_keeps_previous_set() {
        let (registry, transport, _) = registry();
        transport.set_nodes(vec![Node::new("w1", "Watch", true)]);
        registry.refresh().await;

        transport.fail_next_query("bluetooth off");
        let nodes = registry.refresh().await;
        assert_eq!(nodes.len(), 1);
        assert!(registry.is_connected());
    }

    #[tokio::test]
    async fn try_refresh_surfaces_failure() {
        let (registry, transport, _) = registry();
        transport.fail_next_query("bluetooth off");
        assert!(matches!(
            registry.try_refresh().await,
            Err(TransportError::QueryFailed(_))
        ));
    }

    #[tokio::test]
    async fn capability_change_keeps_only_nearby() {
        let (registry, _, _) = registry();
        registry.on_capability_changed(vec![
            Node::new("w1", "Watch", true),
            Node::new("w2", "Ring", false),
        ]);

        assert_eq!(registry.reachable_ids(), vec![NodeId::from("w1")]);
    }

    #[tokio::test]
    async fn membership_change_publishes_once() {
        let (registry, transport, bus) = registry();
        let mut rx = bus.subscribe();
        transport.set_nodes(vec![Node::new("w1", "Watch", true)]);

        registry.refresh().await;
        registry.refresh().await;
        registry.on_capability_changed(vec![]);

        match rx.recv().await.unwrap() {
            LinkEvent::ConnectionChanged(status) => {
                assert!(status.connected);
                assert_eq!(status.count, 1);
            }
            other => panic!("Expected connection change, got {:?}", other),
        }
        match rx.recv().await.unwrap() {
            LinkEvent::ConnectionChanged(status) => assert!(!status.connected),
            other => panic!("Expected connection change, got {:?}", other),
        }
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn snapshot_is_unaffected_by_later_swaps() {
        let (registry, _, _) = registry();
        registry.on_capability_changed(vec![Node::new("w1", "Watch", true)]);
        let before = registry.snapshot();

        registry.on_capability_changed(vec![]);
        assert_eq!(before.len(), 1);
        assert!(registry.snapshot().is_empty());
    }
}
