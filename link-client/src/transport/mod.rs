//! Transport abstraction for wearlink.
//!
//! This module provides a pluggable transport layer that abstracts the
//! device-to-device link (a platform data layer, an in-memory loopback,
//! a mock for testing).
//!
//! # Design
//!
//! The sync layer needs four things from a transport:
//! - `connected_nodes()` lists the peers the transport can currently see
//! - `put_data_item()` replicates a record to one peer
//! - `send_message()` delivers an addressed payload to one peer
//! - `recv()` yields inbound events (data changes, messages, capability changes)
//!
//! No timeouts are imposed here; callers that need bounded latency wrap
//! calls in `tokio::time::timeout`.
//!
//! # Example
//!
//! ```ignore
//! let (phone, watch) = LoopbackTransport::pair(phone_node, watch_node);
//! phone.send_message(&watch_node.id, "/body_battery/command", b"pause").await?;
//! let event = watch.recv().await?;
//! ```

mod loopback;
mod mock;

pub use loopback::LoopbackTransport;
pub use mock::{MockTransport, SentMessage};

use async_trait::async_trait;
use thiserror::Error;
use wearlink_types::{DataItem, Message, Node, NodeId};

/// Transport errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The node is not known to the transport.
    #[error("unknown node: {0}")]
    UnknownNode(NodeId),

    /// The node is known but cannot be reached right now.
    #[error("node unreachable: {0}")]
    Unreachable(NodeId),

    /// Listing connected nodes failed.
    #[error("node query failed: {0}")]
    QueryFailed(String),

    /// Send failed.
    #[error("send failed: {0}")]
    SendFailed(String),

    /// Receive failed.
    #[error("receive failed: {0}")]
    ReceiveFailed(String),

    /// Inbound event stream closed.
    #[error("connection closed")]
    ConnectionClosed,
}

/// An event delivered by the transport.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundEvent {
    /// A peer wrote a data item.
    DataChanged(DataItem),
    /// A peer deleted a path.
    DataDeleted {
        /// Deleted path.
        path: String,
    },
    /// A peer sent a message.
    Message(Message),
    /// The set of nodes advertising the app capability changed.
    CapabilityChanged(Vec<Node>),
}

/// Transport trait for discovering peers and exchanging data with them.
///
/// Implementations handle the underlying link mechanism.
#[async_trait]
pub trait Transport: Send + Sync {
    /// List the peers the transport currently considers connected.
    async fn connected_nodes(&self) -> Result<Vec<Node>, TransportError>;

    /// Replicate a data item to one peer.
    ///
    /// `urgent` asks the transport to deliver ahead of normal traffic.
    async fn put_data_item(
        &self,
        target: &NodeId,
        item: &DataItem,
        urgent: bool,
    ) -> Result<(), TransportError>;

    /// Send an addressed payload to one peer. Not retried.
    async fn send_message(
        &self,
        target: &NodeId,
        path: &str,
        payload: &[u8],
    ) -> Result<(), TransportError>;

    /// Receive the next inbound event.
    ///
    /// Blocks until an event is available or the stream closes.
    async fn recv(&self) -> Result<InboundEvent, TransportError>;
}
