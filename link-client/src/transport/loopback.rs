//! In-memory transport joining two devices.
//!
//! Each endpoint carries encoded [`Frame`]s to its peer over a tokio
//! channel, so everything crossing the link goes through the same
//! MessagePack encoding a radio link would use. The link can be taken down
//! and brought back up to exercise connection handling.

use super::{InboundEvent, Transport, TransportError};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use wearlink_types::{DataItem, Frame, Message, Node, NodeId};

/// One end of an in-memory device pair.
pub struct LoopbackTransport {
    local: Node,
    remote: Node,
    link_up: Arc<AtomicBool>,
    to_self: mpsc::UnboundedSender<Vec<u8>>,
    to_peer: mpsc::UnboundedSender<Vec<u8>>,
    inbound: Mutex<mpsc::UnboundedReceiver<Vec<u8>>>,
}

impl LoopbackTransport {
    /// Create two connected endpoints.
    ///
    /// The first endpoint belongs to `a` and sees `b` as its only peer;
    /// the second is the mirror image. The link starts up.
    pub fn pair(a: Node, b: Node) -> (Self, Self) {
        let (a_tx, a_rx) = mpsc::unbounded_channel();
        let (b_tx, b_rx) = mpsc::unbounded_channel();
        let link_up = Arc::new(AtomicBool::new(true));

        let first = Self {
            local: a.clone(),
            remote: b.clone(),
            link_up: Arc::clone(&link_up),
            to_self: a_tx.clone(),
            to_peer: b_tx.clone(),
            inbound: Mutex::new(a_rx),
        };
        let second = Self {
            local: b,
            remote: a,
            link_up,
            to_self: b_tx,
            to_peer: a_tx,
            inbound: Mutex::new(b_rx),
        };
        (first, second)
    }

    /// This endpoint's node.
    pub fn local(&self) -> &Node {
        &self.local
    }

    /// The node on the other end.
    pub fn remote(&self) -> &Node {
        &self.remote
    }

    /// Whether the link is currently up.
    pub fn is_link_up(&self) -> bool {
        self.link_up.load(Ordering::SeqCst)
    }

    /// Take the link down or bring it back up.
    ///
    /// Both ends get a capability change describing the other side.
    pub fn set_link_up(&self, up: bool) {
        self.link_up.store(up, Ordering::SeqCst);

        let mut remote = self.remote.clone();
        remote.is_nearby = up;
        let mut local = self.local.clone();
        local.is_nearby = up;

        let nodes_for_self = if up { vec![remote] } else { Vec::new() };
        let nodes_for_peer = if up { vec![local] } else { Vec::new() };
        self.notify(&self.to_self, Frame::CapabilityChanged { nodes: nodes_for_self });
        self.notify(&self.to_peer, Frame::CapabilityChanged { nodes: nodes_for_peer });
    }

    /// Tell the peer that a path was deleted here.
    pub fn announce_deleted(&self, path: &str) -> Result<(), TransportError> {
        self.ensure_up(&self.remote.id)?;
        self.forward(Frame::DataDeleted {
            path: path.to_string(),
        })
    }

    fn notify(&self, channel: &mpsc::UnboundedSender<Vec<u8>>, frame: Frame) {
        match frame.to_bytes() {
            Ok(bytes) => {
                let _ = channel.send(bytes);
            }
            Err(e) => tracing::warn!("Failed to encode capability frame: {}", e),
        }
    }

    fn ensure_up(&self, target: &NodeId) -> Result<(), TransportError> {
        if *target != self.remote.id {
            return Err(TransportError::UnknownNode(target.clone()));
        }
        if !self.is_link_up() {
            return Err(TransportError::Unreachable(target.clone()));
        }
        Ok(())
    }

    fn forward(&self, frame: Frame) -> Result<(), TransportError> {
        let bytes = frame
            .to_bytes()
            .map_err(|e| TransportError::SendFailed(e.to_string()))?;
        self.to_peer
            .send(bytes)
            .map_err(|_| TransportError::ConnectionClosed)
    }

    fn event_from(&self, frame: Frame) -> InboundEvent {
        match frame {
            Frame::DataChanged(item) => InboundEvent::DataChanged(item),
            Frame::DataDeleted { path } => InboundEvent::DataDeleted { path },
            Frame::Message { path, payload } => InboundEvent::Message(Message {
                path,
                payload,
                source: self.remote.id.clone(),
            }),
            Frame::CapabilityChanged { nodes } => InboundEvent::CapabilityChanged(nodes),
        }
    }
}

#[async_trait]
impl Transport for LoopbackTransport {
    async fn connected_nodes(&self) -> Result<Vec<Node>, TransportError> {
        if self.is_link_up() {
            Ok(vec![self.remote.clone()])
        } else {
            Ok(Vec::new())
        }
    }

    async fn put_data_item(
        &self,
        target: &NodeId,
        item: &DataItem,
        _urgent: bool,
    ) -> Result<(), TransportError> {
        self.ensure_up(target)?;
        self.forward(Frame::DataChanged(item.clone()))
    }

    async fn send_message(
        &self,
        target: &NodeId,
        path: &str,
        payload: &[u8],
    ) -> Result<(), TransportError> {
        self.ensure_up(target)?;
        self.forward(Frame::Message {
            path: path.to_string(),
            payload: payload.to_vec(),
        })
    }

    async fn recv(&self) -> Result<InboundEvent, TransportError> {
        let bytes = {
            let mut rx = self.inbound.lock().await;
            rx.recv().await.ok_or(TransportError::ConnectionClosed)?
        };
        let frame =
            Frame::from_bytes(&bytes).map_err(|e| TransportError::ReceiveFailed(e.to_string()))?;
        Ok(self.event_from(frame))
    }
}

impl std::fmt::Debug for LoopbackTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoopbackTransport")
            .field("local", &self.local.id)
            .field("remote", &self.remote.id)
            .field("link_up", &self.is_link_up())
            .finish()
    }
}
