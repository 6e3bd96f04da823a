//! Reachable node set for wearlink.
//!
//! A [`ReachableSet`] is an immutable view of the peers currently considered
//! live. The registry in wearlink-client builds a fresh set from every
//! discovery result and swaps it in whole; this module only decides what the
//! new set is and whether the swap changed membership.

use std::collections::BTreeMap;
use wearlink_types::{Node, NodeId};

/// Connection status pushed to subscribers when membership changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionChanged {
    /// Whether at least one peer is reachable.
    pub connected: bool,
    /// Number of reachable peers.
    pub count: usize,
    /// Ids of the reachable peers, sorted.
    pub ids: Vec<NodeId>,
}

/// Immutable set of reachable peers, keyed by id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReachableSet {
    nodes: BTreeMap<NodeId, Node>,
}

impl ReachableSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from a connected-nodes query.
    ///
    /// Every node the transport reports as connected is reachable. Later
    /// duplicates of the same id replace earlier ones.
    pub fn from_connected(nodes: impl IntoIterator<Item = Node>) -> Self {
        Self {
            nodes: nodes.into_iter().map(|n| (n.id.clone(), n)).collect(),
        }
    }

    /// Build a set from a capability-change event.
    ///
    /// Only nodes that are nearby are reachable; capable but distant nodes
    /// are paired, not live.
    pub fn from_capability(nodes: impl IntoIterator<Item = Node>) -> Self {
        Self::from_connected(nodes.into_iter().filter(|n| n.is_nearby))
    }

    /// Number of reachable peers.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if no peer is reachable.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Derived connection flag: at least one reachable peer.
    pub fn is_connected(&self) -> bool {
        !self.nodes.is_empty()
    }

    /// Check if a peer is reachable.
    pub fn contains(&self, id: &NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Look up a reachable peer.
    pub fn get(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Ids of all reachable peers, sorted.
    pub fn ids(&self) -> Vec<NodeId> {
        self.nodes.keys().cloned().collect()
    }

    /// All reachable peers, sorted by id.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Current status as a [`ConnectionChanged`] payload.
    pub fn status(&self) -> ConnectionChanged {
        ConnectionChanged {
            connected: self.is_connected(),
            count: self.len(),
            ids: self.ids(),
        }
    }

    /// Compare against the set this one replaces.
    ///
    /// Returns the event to publish if the id membership differs, `None`
    /// otherwise. Attribute-only changes (display name, capabilities) do not
    /// count as membership changes.
    pub fn transition_from(&self, previous: &ReachableSet) -> Option<ConnectionChanged> {
        if self.nodes.keys().eq(previous.nodes.keys()) {
            None
        } else {
            Some(self.status())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: &str, nearby: bool) -> Node {
        Node::new(id, &format!("Device {}", id), nearby)
    }

    #[test]
    fn starts_disconnected() {
        let set = ReachableSet::new();
        assert!(!set.is_connected());
        assert_eq!(set.len(), 0);
    }

    #[test]
    fn connected_query_keeps_every_node() {
        let set = ReachableSet::from_connected(vec![node("w1", true), node("w2", false)]);
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn capability_event_drops_distant_nodes() {
        let set = ReachableSet::from_capability(vec![node("w1", true), node("w2", false)]);
        assert_eq!(set.ids(), vec![NodeId::from("w1")]);
        assert!(!set.contains(&NodeId::from("w2")));
    }

    #[test]
    fn first_node_fires_connected_event() {
        let before = ReachableSet::new();
        let after = ReachableSet::from_connected(vec![node("w1", true)]);

        let event = after.transition_from(&before).unwrap();
        assert_eq!(
            event,
            ConnectionChanged {
                connected: true,
                count: 1,
                ids: vec![NodeId::from("w1")],
            }
        );
    }

    #[test]
    fn identical_membership_fires_nothing() {
        let a = ReachableSet::from_connected(vec![node("w1", true), node("w2", true)]);
        let b = ReachableSet::from_connected(vec![node("w2", true), node("w1", true)]);
        assert!(b.transition_from(&a).is_none());
    }

    #[test]
    fn renamed_node_is_not_a_membership_change() {
        let a = ReachableSet::from_connected(vec![node("w1", true)]);
        let b = ReachableSet::from_connected(vec![Node::new("w1", "Renamed", true)]);
        assert!(b.transition_from(&a).is_none());
    }

    #[test]
    fn swapped_node_with_same_count_is_a_change() {
        let a = ReachableSet::from_connected(vec![node("w1", true)]);
        let b = ReachableSet::from_connected(vec![node("w2", true)]);
        let event = b.transition_from(&a).unwrap();
        assert_eq!(event.count, 1);
        assert_eq!(event.ids, vec![NodeId::from("w2")]);
    }

    #[test]
    fn losing_last_node_fires_disconnected() {
        let a = ReachableSet::from_connected(vec![node("w1", true)]);
        let event = ReachableSet::new().transition_from(&a).unwrap();
        assert!(!event.connected);
        assert_eq!(event.count, 0);
        assert!(event.ids.is_empty());
    }
}
