//! Replication outbox for wearlink.
//!
//! This module queues outbound data item replications per peer with:
//! - Latest-wins per path (a newer put supersedes a queued older one)
//! - Urgent items delivered ahead of normal traffic
//! - A per-peer flushing flag so only one delivery loop runs per peer
//! - Max size limits to prevent unbounded memory growth
//!
//! The outbox is used by the data item store in wearlink-client. Items are
//! enqueued on every `put`, and a flush loop pops them with `next()` until
//! the peer's queue is drained.

use std::collections::{HashMap, VecDeque};
use wearlink_types::{DataItem, NodeId};

/// Error type for outbox operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BufferError {
    /// The peer's queue is at capacity.
    Full {
        /// Per-peer capacity.
        capacity: usize,
    },
}

impl std::fmt::Display for BufferError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BufferError::Full { capacity } => {
                write!(f, "outbox full (capacity: {})", capacity)
            }
        }
    }
}

impl std::error::Error for BufferError {}

/// A replication waiting to be delivered.
#[derive(Debug, Clone, PartialEq)]
pub struct Replication {
    /// The item to deliver.
    pub item: DataItem,
    /// Whether the item was marked for expedited delivery.
    pub urgent: bool,
}

/// Outcome of a successful enqueue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Enqueued {
    /// A queued item for the same path was dropped in favour of this one.
    pub superseded: bool,
    /// No flush loop is running for this peer; the caller must start one.
    pub start_flush: bool,
}

#[derive(Debug, Default)]
struct PeerQueue {
    urgent: VecDeque<DataItem>,
    normal: VecDeque<DataItem>,
    flushing: bool,
}

impl PeerQueue {
    fn len(&self) -> usize {
        self.urgent.len() + self.normal.len()
    }

    fn remove_path(&mut self, path: &str) -> bool {
        let before = self.len();
        self.urgent.retain(|i| i.path != path);
        self.normal.retain(|i| i.path != path);
        self.len() != before
    }
}

/// Per-peer replication queues.
///
/// Items flow through the outbox in this order:
/// 1. `enqueue()` - add for a peer; tells the caller whether to start flushing
/// 2. `next()` - pop the next item for that peer (urgent first)
/// 3. `next()` returning `None` ends the flush and clears the flag
#[derive(Debug)]
pub struct ReplicationOutbox {
    /// Maximum queued items per peer.
    max_per_peer: usize,
    peers: HashMap<NodeId, PeerQueue>,
}

impl ReplicationOutbox {
    /// Create a new outbox with the given per-peer capacity.
    pub fn new(max_per_peer: usize) -> Self {
        Self {
            max_per_peer,
            peers: HashMap::new(),
        }
    }

    /// Queue an item for a peer.
    ///
    /// Any item already queued for the same path is dropped first, so a
    /// replacement never fails on capacity. Returns an error if the peer's
    /// queue is full of other paths.
    pub fn enqueue(
        &mut self,
        peer: &NodeId,
        item: DataItem,
        urgent: bool,
    ) -> Result<Enqueued, BufferError> {
        let queue = self.peers.entry(peer.clone()).or_default();
        let superseded = queue.remove_path(&item.path);

        if queue.len() >= self.max_per_peer {
            return Err(BufferError::Full {
                capacity: self.max_per_peer,
            });
        }

        if urgent {
            queue.urgent.push_back(item);
        } else {
            queue.normal.push_back(item);
        }

        let start_flush = !queue.flushing;
        queue.flushing = true;
        Ok(Enqueued {
            superseded,
            start_flush,
        })
    }

    /// Pop the next item for a peer, urgent items first.
    ///
    /// Returns `None` once the queue is drained, which also marks the peer
    /// as no longer flushing.
    pub fn next(&mut self, peer: &NodeId) -> Option<Replication> {
        let queue = self.peers.get_mut(peer)?;

        if let Some(item) = queue.urgent.pop_front() {
            return Some(Replication { item, urgent: true });
        }
        if let Some(item) = queue.normal.pop_front() {
            return Some(Replication {
                item,
                urgent: false,
            });
        }

        self.peers.remove(peer);
        None
    }

    /// Drop everything queued for a peer. Returns the number of items dropped.
    ///
    /// A running flush loop sees an empty queue on its next `next()` call.
    pub fn drop_peer(&mut self, peer: &NodeId) -> usize {
        match self.peers.get_mut(peer) {
            Some(queue) => {
                let dropped = queue.len();
                queue.urgent.clear();
                queue.normal.clear();
                dropped
            }
            None => 0,
        }
    }

    /// Number of items queued for a peer.
    pub fn queued(&self, peer: &NodeId) -> usize {
        self.peers.get(peer).map_or(0, PeerQueue::len)
    }

    /// Check whether a flush loop is running for a peer.
    pub fn is_flushing(&self, peer: &NodeId) -> bool {
        self.peers.get(peer).is_some_and(|q| q.flushing)
    }

    /// Total number of queued items across all peers.
    pub fn total_count(&self) -> usize {
        self.peers.values().map(PeerQueue::len).sum()
    }
}
