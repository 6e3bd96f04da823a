//! Data item store.
//!
//! Keeps the latest [`DataItem`] per path and replicates local writes to
//! every reachable peer. Writes return as soon as local state is updated;
//! delivery happens in one background flush task per peer, fed from a
//! [`ReplicationOutbox`] so that a newer put for a path supersedes an older
//! one still waiting to go out.

use dashmap::DashMap;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};
use wearlink_core::{ReplicationOutbox, SemanticRecord};
use wearlink_types::{DataItem, Fields, NodeId, Value};

use crate::clock::PublishClock;
use crate::events::{EventBus, LinkEvent};
use crate::registry::NodeRegistry;
use crate::transport::Transport;

/// Field the store stamps on every local put.
pub const TIMESTAMP_FIELD: &str = "timestamp";

/// Latest-value store keyed by path.
pub struct DataItemStore<T: Transport> {
    transport: Arc<T>,
    registry: Arc<NodeRegistry<T>>,
    bus: EventBus,
    items: DashMap<String, Arc<DataItem>>,
    outbox: Mutex<ReplicationOutbox>,
    clock: PublishClock,
    urgent_paths: HashSet<String>,
}

impl<T: Transport + 'static> DataItemStore<T> {
    /// Create an empty store.
    ///
    /// Puts on `urgent_paths` are replicated ahead of normal traffic.
    pub fn new(
        transport: Arc<T>,
        registry: Arc<NodeRegistry<T>>,
        bus: EventBus,
        outbox_capacity: usize,
        urgent_paths: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            transport,
            registry,
            bus,
            items: DashMap::new(),
            outbox: Mutex::new(ReplicationOutbox::new(outbox_capacity)),
            clock: PublishClock::new(),
            urgent_paths: urgent_paths.into_iter().collect(),
        }
    }

    /// Write the latest record for a path and schedule replication.
    ///
    /// The item is stamped with a fresh publish time (also written to the
    /// `timestamp` field) and replaces whatever was stored for the path.
    /// Returns once local state is updated; delivery is not awaited.
    pub async fn put(self: &Arc<Self>, path: &str, mut fields: Fields) -> DataItem {
        let timestamp = self.clock.next();
        fields.insert(TIMESTAMP_FIELD.to_string(), Value::Long(timestamp as i64));
        let item = DataItem::new(path, fields, timestamp);
        self.items.insert(path.to_string(), Arc::new(item.clone()));

        let urgent = self.is_urgent(path);
        let peers = self.registry.reachable_ids();
        debug!(path, peers = peers.len(), urgent, "Stored data item");
        for peer in peers {
            self.schedule(peer, item.clone(), urgent);
        }
        item
    }

    /// Latest item for a path.
    pub fn get(&self, path: &str) -> Option<DataItem> {
        self.items.get(path).map(|entry| DataItem::clone(entry.value()))
    }

    /// Remove a path locally.
    pub fn remove(&self, path: &str) -> Option<DataItem> {
        self.items
            .remove(path)
            .map(|(_, item)| DataItem::clone(&item))
    }

    /// Every stored path.
    pub fn paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.items.iter().map(|e| e.key().clone()).collect();
        paths.sort();
        paths
    }

    /// Number of stored paths.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Replications still queued for a peer.
    pub fn pending_for(&self, peer: &NodeId) -> usize {
        self.outbox.lock().queued(peer)
    }

    /// Apply an item written by a peer and publish it as a semantic record.
    ///
    /// Inbound items replace the stored one unconditionally; the peer's
    /// publish time is kept but not compared.
    pub fn on_remote_item_changed(&self, item: DataItem) -> SemanticRecord {
        let record = SemanticRecord::decode(&item);
        debug!(path = %item.path, kind = record.type_name(), "Applied remote data item");
        self.items.insert(item.path.clone(), Arc::new(item));
        self.bus.publish(LinkEvent::DataReceived(record.clone()));
        record
    }

    /// Apply a deletion made by a peer.
    pub fn on_remote_item_deleted(&self, path: &str) {
        if self.items.remove(path).is_some() {
            debug!(path, "Removed data item deleted by peer");
        }
        self.bus.publish(LinkEvent::DataDeleted {
            path: path.to_string(),
        });
    }

    /// Queue every stored item for one peer.
    ///
    /// Used to answer a sync request. Returns the number of items queued.
    pub fn republish_to(self: &Arc<Self>, peer: &NodeId) -> usize {
        let items: Vec<Arc<DataItem>> = self.items.iter().map(|e| Arc::clone(e.value())).collect();
        let count = items.len();
        for item in items {
            let urgent = self.is_urgent(&item.path);
            self.schedule(peer.clone(), DataItem::clone(&item), urgent);
        }
        debug!(peer = %peer, count, "Republished data items");
        count
    }

    fn is_urgent(&self, path: &str) -> bool {
        self.urgent_paths.contains(path)
    }

    fn schedule(self: &Arc<Self>, peer: NodeId, item: DataItem, urgent: bool) {
        let path = item.path.clone();
        let enqueued = self.outbox.lock().enqueue(&peer, item, urgent);
        match enqueued {
            Ok(outcome) => {
                if outcome.superseded {
                    debug!(peer = %peer, path = %path, "Superseded queued replication");
                }
                if outcome.start_flush {
                    let store = Arc::clone(self);
                    tokio::spawn(async move { store.flush(peer).await });
                }
            }
            Err(e) => warn!(peer = %peer, path = %path, "Replication dropped: {}", e),
        }
    }

    async fn flush(self: Arc<Self>, peer: NodeId) {
        loop {
            let next = self.outbox.lock().next(&peer);
            let Some(replication) = next else {
                break;
            };

            let path = &replication.item.path;
            match self
                .transport
                .put_data_item(&peer, &replication.item, replication.urgent)
                .await
            {
                Ok(()) => debug!(peer = %peer, path = %path, "Replicated data item"),
                Err(e) => {
                    let dropped = self.outbox.lock().drop_peer(&peer);
                    warn!(
                        peer = %peer,
                        path = %path,
                        dropped,
                        "Replication failed, dropping queued items: {}",
                        e
                    );
                }
            }
        }
    }
}
