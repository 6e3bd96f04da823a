//! Node identity for wearlink.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Opaque identifier of a paired device, as assigned by the transport.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(String);

impl NodeId {
    /// Create a NodeId from a transport-assigned string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for NodeId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

/// A paired device as reported by the transport.
///
/// `is_nearby` separates "paired" from "currently reachable": a capable node
/// that is not nearby is known but not part of the reachable set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    /// Transport-assigned identifier.
    pub id: NodeId,
    /// Human-readable device name.
    pub display_name: String,
    /// Whether the node is directly reachable right now.
    pub is_nearby: bool,
    /// Capability tags advertised by the node.
    pub capabilities: BTreeSet<String>,
}

impl Node {
    /// Create a node with no capability tags.
    pub fn new(id: impl Into<NodeId>, display_name: &str, is_nearby: bool) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.to_string(),
            is_nearby,
            capabilities: BTreeSet::new(),
        }
    }

    /// Add a capability tag.
    pub fn with_capability(mut self, capability: &str) -> Self {
        self.capabilities.insert(capability.to_string());
        self
    }

    /// Check whether the node advertises a capability tag.
    pub fn has_capability(&self, capability: &str) -> bool {
        self.capabilities.contains(capability)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_id_display_is_raw_string() {
        let id = NodeId::from("w1");
        assert_eq!(id.to_string(), "w1");
        assert_eq!(format!("{:?}", id), "NodeId(w1)");
    }

    #[test]
    fn node_ids_order_lexically() {
        let mut ids = vec![NodeId::from("b"), NodeId::from("a")];
        ids.sort();
        assert_eq!(ids[0].as_str(), "a");
    }

    #[test]
    fn node_capabilities() {
        let node = Node::new("w1", "Watch", true).with_capability("body_battery_app");
        assert!(node.has_capability("body_battery_app"));
        assert!(!node.has_capability("other"));
    }
}
