//! Data items, messages, and the frames that carry them between devices.

use serde::{Deserialize, Serialize};

use crate::{Fields, Node, NodeId, WireError};

/// The latest structured record published at a path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataItem {
    /// Logical path, e.g. `/body_battery/health`.
    pub path: String,
    /// Record fields.
    pub fields: Fields,
    /// Publish time assigned by the writer, milliseconds since the Unix epoch.
    pub timestamp: u64,
}

impl DataItem {
    /// Create a data item.
    pub fn new(path: &str, fields: Fields, timestamp: u64) -> Self {
        Self {
            path: path.to_string(),
            fields,
            timestamp,
        }
    }
}

/// An addressed, fire-and-forget message received from a peer.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Path the message was sent on.
    pub path: String,
    /// Raw payload.
    pub payload: Vec<u8>,
    /// Node that sent the message.
    pub source: NodeId,
}

impl Message {
    /// Create a message.
    pub fn new(path: &str, payload: &[u8], source: impl Into<NodeId>) -> Self {
        Self {
            path: path.to_string(),
            payload: payload.to_vec(),
            source: source.into(),
        }
    }

    /// Payload decoded as UTF-8, replacing invalid sequences.
    pub fn payload_text(&self) -> String {
        String::from_utf8_lossy(&self.payload).into_owned()
    }
}

impl std::fmt::Debug for Message {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Message")
            .field("path", &self.path)
            .field("payload", &format!("[{} bytes]", self.payload.len()))
            .field("source", &self.source)
            .finish()
    }
}

/// Unit of transfer on a device-to-device link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Frame {
    /// A data item was written on the sending side.
    DataChanged(DataItem),
    /// A path was deleted on the sending side.
    DataDeleted {
        /// Deleted path.
        path: String,
    },
    /// An addressed message.
    Message {
        /// Path the message is sent on.
        path: String,
        /// Raw payload.
        payload: Vec<u8>,
    },
    /// The sender's view of nodes advertising the app capability changed.
    CapabilityChanged {
        /// Nodes advertising the capability.
        nodes: Vec<Node>,
    },
}

impl Frame {
    /// Serialize to MessagePack bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>, WireError> {
        rmp_serde::to_vec_named(self).map_err(WireError::Serialization)
    }

    /// Deserialize from MessagePack bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, WireError> {
        rmp_serde::from_slice(bytes).map_err(WireError::Deserialization)
    }
}
