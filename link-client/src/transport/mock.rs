//! Mock transport for testing.
//!
//! Allows scripting the connected-node list, injecting inbound events and
//! failures, and capturing everything sent for verification.

use super::{InboundEvent, Transport, TransportError};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use wearlink_types::{DataItem, Message, Node, NodeId};

/// A message captured by [`MockTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    /// Addressed peer.
    pub target: NodeId,
    /// Path.
    pub path: String,
    /// Payload.
    pub payload: Vec<u8>,
}

/// Mock transport for testing.
///
/// Clones share state, so a test can keep one handle while the sync layer
/// owns another.
#[derive(Debug, Clone)]
pub struct MockTransport {
    inner: Arc<Mutex<MockTransportInner>>,
    inbound_tx: mpsc::UnboundedSender<InboundEvent>,
    inbound_rx: Arc<tokio::sync::Mutex<mpsc::UnboundedReceiver<InboundEvent>>>,
    hold: Arc<watch::Sender<bool>>,
}

#[derive(Debug, Default)]
struct MockTransportInner {
    nodes: Vec<Node>,
    unreachable: HashSet<NodeId>,
    sent_messages: Vec<SentMessage>,
    replicated: Vec<(NodeId, DataItem, bool)>,
    query_count: usize,
    held_deliveries: usize,
    fail_next_query: Option<String>,
    fail_next_send: Option<String>,
    fail_next_recv: Option<String>,
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTransport {
    /// Create a new mock transport with no connected nodes.
    pub fn new() -> Self {
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        let (hold, _) = watch::channel(false);
        Self {
            inner: Arc::new(Mutex::new(MockTransportInner::default())),
            inbound_tx,
            inbound_rx: Arc::new(tokio::sync::Mutex::new(inbound_rx)),
            hold: Arc::new(hold),
        }
    }

    /// Set the node list returned by `connected_nodes()`.
    pub fn set_nodes(&self, nodes: Vec<Node>) {
        self.inner.lock().nodes = nodes;
    }

    /// Make sends and replications to a node fail with `Unreachable`.
    pub fn set_unreachable(&self, id: &str) {
        self.inner.lock().unreachable.insert(NodeId::from(id));
    }

    /// Undo [`MockTransport::set_unreachable`].
    pub fn set_reachable(&self, id: &str) {
        self.inner.lock().unreachable.remove(&NodeId::from(id));
    }

    /// Queue an event to be returned by `recv()`.
    pub fn push_inbound(&self, event: InboundEvent) {
        // The receiver lives as long as self, so this cannot fail.
        let _ = self.inbound_tx.send(event);
    }

    /// Queue an inbound message from a peer.
    pub fn deliver_message(&self, path: &str, payload: &[u8], from: &str) {
        self.push_inbound(InboundEvent::Message(Message::new(path, payload, from)));
    }

    /// Cause the next `connected_nodes()` to fail with the given error.
    pub fn fail_next_query(&self, error: &str) {
        self.inner.lock().fail_next_query = Some(error.to_string());
    }

    /// Cause the next `send_message()` to fail with the given error.
    pub fn fail_next_send(&self, error: &str) {
        self.inner.lock().fail_next_send = Some(error.to_string());
    }

    /// Cause the next `recv()` to fail with the given error.
    pub fn fail_next_recv(&self, error: &str) {
        self.inner.lock().fail_next_recv = Some(error.to_string());
    }

    /// Block data item deliveries until [`MockTransport::release_deliveries`].
    pub fn hold_deliveries(&self) {
        self.hold.send_replace(true);
    }

    /// Let held data item deliveries proceed.
    pub fn release_deliveries(&self) {
        self.hold.send_replace(false);
    }

    /// Number of data item deliveries currently waiting on a hold.
    pub fn held_deliveries(&self) -> usize {
        self.inner.lock().held_deliveries
    }

    /// All messages that were sent.
    pub fn sent_messages(&self) -> Vec<SentMessage> {
        self.inner.lock().sent_messages.clone()
    }

    /// All data items that were replicated, with target and urgency.
    pub fn replicated(&self) -> Vec<(NodeId, DataItem, bool)> {
        self.inner.lock().replicated.clone()
    }

    /// Data items replicated to one peer, in delivery order.
    pub fn replicated_to(&self, id: &str) -> Vec<DataItem> {
        let target = NodeId::from(id);
        self.inner
            .lock()
            .replicated
            .iter()
            .filter(|(t, _, _)| *t == target)
            .map(|(_, item, _)| item.clone())
            .collect()
    }

    /// Number of `connected_nodes()` calls made.
    pub fn query_count(&self) -> usize {
        self.inner.lock().query_count
    }

    /// Clear captured sends and replications.
    pub fn clear_log(&self) {
        let mut inner = self.inner.lock();
        inner.sent_messages.clear();
        inner.replicated.clear();
    }

    fn check_reachable(&self, target: &NodeId) -> Result<(), TransportError> {
        if self.inner.lock().unreachable.contains(target) {
            return Err(TransportError::Unreachable(target.clone()));
        }
        Ok(())
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn connected_nodes(&self) -> Result<Vec<Node>, TransportError> {
        let mut inner = self.inner.lock();
        inner.query_count += 1;

        // Check for forced failure
        if let Some(error) = inner.fail_next_query.take() {
            return Err(TransportError::QueryFailed(error));
        }

        Ok(inner.nodes.clone())
    }

    async fn put_data_item(
        &self,
        target: &NodeId,
        item: &DataItem,
        urgent: bool,
    ) -> Result<(), TransportError> {
        let mut held = self.hold.subscribe();
        let is_held = *held.borrow();
        if is_held {
            self.inner.lock().held_deliveries += 1;
            let _ = held.wait_for(|hold| !*hold).await;
            self.inner.lock().held_deliveries -= 1;
        }

        self.check_reachable(target)?;
        self.inner
            .lock()
            .replicated
            .push((target.clone(), item.clone(), urgent));
        Ok(())
    }

    async fn send_message(
        &self,
        target: &NodeId,
        path: &str,
        payload: &[u8],
    ) -> Result<(), TransportError> {
        self.check_reachable(target)?;
        let mut inner = self.inner.lock();

        // Check for forced failure
        if let Some(error) = inner.fail_next_send.take() {
            return Err(TransportError::SendFailed(error));
        }

        inner.sent_messages.push(SentMessage {
            target: target.clone(),
            path: path.to_string(),
            payload: payload.to_vec(),
        });
        Ok(())
    }

    async fn recv(&self) -> Result<InboundEvent, TransportError> {
        if let Some(error) = self.inner.lock().fail_next_recv.take() {
            return Err(TransportError::ReceiveFailed(error));
        }

        let mut rx = self.inbound_rx.lock().await;
        rx.recv().await.ok_or(TransportError::ConnectionClosed)
    }
}
