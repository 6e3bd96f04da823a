//! Caller-facing API.
//!
//! [`WearLink`] wires the registry, store, channel and coordinator around a
//! single transport and event bus, and runs the task that pumps inbound
//! transport events into them.

use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use wearlink_core::{InboundRoute, TelemetrySnapshot};
use wearlink_types::{
    fields_from_json, ActivitySession, DataItem, MetricKind, Node, NodeId, Reading, SleepSummary,
    HEALTH_PATH,
};

use crate::channel::{BroadcastReport, MessageChannel};
use crate::config::{ConfigError, LinkConfig};
use crate::coordinator::SyncCoordinator;
use crate::error::LinkError;
use crate::events::{EventBus, LinkEvent};
use crate::registry::NodeRegistry;
use crate::source::TelemetrySource;
use crate::store::DataItemStore;
use crate::transport::{InboundEvent, Transport, TransportError};

/// The sync layer for one device.
pub struct WearLink<T: Transport + 'static> {
    config: LinkConfig,
    bus: EventBus,
    inbound: Arc<Inbound<T>>,
    coordinator: Arc<SyncCoordinator<T>>,
    pump: Mutex<Option<JoinHandle<()>>>,
}

impl<T: Transport + 'static> WearLink<T> {
    /// Assemble the sync layer. Nothing runs until [`WearLink::initialize`].
    ///
    /// Fails if the configuration has zero intervals or capacities.
    pub fn new(
        config: LinkConfig,
        transport: T,
        source: Arc<dyn TelemetrySource>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let transport = Arc::new(transport);
        let bus = EventBus::new(config.event_capacity);
        let registry = Arc::new(NodeRegistry::new(Arc::clone(&transport), bus.clone()));
        let store = Arc::new(DataItemStore::new(
            Arc::clone(&transport),
            Arc::clone(&registry),
            bus.clone(),
            config.outbox_capacity,
            config.urgent_paths.iter().cloned(),
        ));
        let channel = Arc::new(MessageChannel::new(
            Arc::clone(&transport),
            Arc::clone(&registry),
            bus.clone(),
        ));
        let coordinator = Arc::new(SyncCoordinator::new(
            source,
            Arc::clone(&store),
            Arc::clone(&channel),
            bus.clone(),
            config.metrics.clone(),
            config.sample_interval(),
        ));
        let inbound = Arc::new(Inbound {
            transport,
            registry,
            store,
            channel,
            respond_to_sync: config.respond_to_sync,
        });

        Ok(Self {
            config,
            bus,
            inbound,
            coordinator,
            pump: Mutex::new(None),
        })
    }

    /// Discover peers and start handling inbound events.
    ///
    /// Calling it again re-runs discovery; the inbound pump is only started
    /// once.
    pub async fn initialize(&self) -> Result<(), LinkError> {
        let reachable = self
            .inbound
            .registry
            .try_refresh()
            .await
            .map_err(LinkError::Initialization)?;

        let mut pump = self.pump.lock();
        if pump.is_none() {
            let inbound = Arc::clone(&self.inbound);
            *pump = Some(tokio::spawn(async move { inbound.run().await }));
        }
        info!(peers = reachable.len(), "Sync layer initialized");
        Ok(())
    }

    /// Subscribe to events published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<LinkEvent> {
        self.bus.subscribe()
    }

    /// The underlying transport.
    pub fn transport(&self) -> &T {
        &self.inbound.transport
    }

    /// The configuration in effect.
    pub fn config(&self) -> &LinkConfig {
        &self.config
    }

    /// Refresh and return the reachable peers.
    ///
    /// A failed discovery returns the previously known peers.
    pub async fn connected_devices(&self) -> Vec<Node> {
        self.inbound.registry.refresh().await
    }

    /// Whether at least one peer is reachable.
    pub fn is_connected(&self) -> bool {
        self.inbound.registry.is_connected()
    }

    /// Send a message to one device.
    ///
    /// All three arguments are required; a missing one fails before the
    /// transport is touched.
    pub async fn send_message(
        &self,
        device_id: Option<&str>,
        path: Option<&str>,
        data: Option<&str>,
    ) -> Result<(), LinkError> {
        let device_id = device_id.ok_or_else(|| LinkError::missing("deviceId"))?;
        let path = path.ok_or_else(|| LinkError::missing("path"))?;
        let data = data.ok_or_else(|| LinkError::missing("data"))?;

        self.inbound
            .channel
            .send(&NodeId::from(device_id), path, data.as_bytes())
            .await
    }

    /// Publish a JSON object as a data item.
    ///
    /// `path` defaults to the health path. `null` members are skipped.
    pub async fn send_data(
        &self,
        path: Option<&str>,
        data: Option<&str>,
    ) -> Result<DataItem, LinkError> {
        let data = data.ok_or_else(|| LinkError::missing("data"))?;
        let parsed = fields_from_json(data)?;
        let path = path.unwrap_or(HEALTH_PATH);
        for key in &parsed.skipped {
            warn!(path, field = %key, "Skipping null field");
        }

        Ok(self.inbound.store.put(path, parsed.fields).await)
    }

    /// Latest stored item for a path, local or replicated from a peer.
    pub fn get_data(&self, path: &str) -> Option<DataItem> {
        self.inbound.store.get(path)
    }

    /// Ask every reachable peer for its latest data.
    pub async fn request_sync(&self) -> BroadcastReport {
        self.coordinator.request_sync().await
    }

    /// Start periodic sampling. Returns false if already running.
    pub async fn start_monitoring(&self) -> bool {
        self.coordinator.start().await
    }

    /// Stop periodic sampling. Returns false if not running.
    pub async fn stop_monitoring(&self) -> bool {
        self.coordinator.stop().await
    }

    /// Run one sampling pass immediately.
    pub async fn sample_now(&self) {
        self.coordinator.sample_once().await;
    }

    /// Sample one metric on demand.
    pub fn sample(&self, kind: MetricKind) -> Result<Reading, LinkError> {
        Ok(self.coordinator.sample_metric(kind)?)
    }

    /// Latest telemetry snapshot.
    pub fn current_snapshot(&self) -> Arc<TelemetrySnapshot> {
        self.coordinator.current_snapshot()
    }

    /// Heart rate in bpm (default 70).
    pub fn heart_rate(&self) -> i32 {
        self.current_snapshot().heart_rate()
    }

    /// Step count (default 0).
    pub fn steps(&self) -> i32 {
        self.current_snapshot().steps()
    }

    /// Kilocalories (default 0).
    pub fn calories(&self) -> f64 {
        self.current_snapshot().calories()
    }

    /// Distance in meters (default 0).
    pub fn distance(&self) -> f64 {
        self.current_snapshot().distance()
    }

    /// Speed in m/s (default 0).
    pub fn speed(&self) -> f64 {
        self.current_snapshot().speed()
    }

    /// Heart rate variability in ms (default 60).
    pub fn heart_rate_variability(&self) -> f64 {
        self.current_snapshot().heart_rate_variability()
    }

    /// Stress score derived from HRV.
    pub fn stress_level(&self) -> f64 {
        self.current_snapshot().stress_level()
    }

    /// Latest sleep summary.
    pub fn sleep_data(&self) -> SleepSummary {
        self.current_snapshot().sleep()
    }

    /// Latest activity sessions.
    pub fn activity_data(&self) -> Vec<ActivitySession> {
        self.current_snapshot().activities()
    }

    /// Stop sampling and the inbound pump.
    pub async fn shutdown(&self) {
        self.coordinator.stop().await;
        let pump = self.pump.lock().take();
        if let Some(handle) = pump {
            handle.abort();
            let _ = handle.await;
        }
        info!("Sync layer shut down");
    }
}

impl<T: Transport + 'static> Drop for WearLink<T> {
    // The sampling loop ends on its own once the coordinator is gone.
    fn drop(&mut self) {
        if let Some(handle) = self.pump.get_mut().take() {
            handle.abort();
        }
    }
}

/// Components that react to inbound transport events.
struct Inbound<T: Transport> {
    transport: Arc<T>,
    registry: Arc<NodeRegistry<T>>,
    store: Arc<DataItemStore<T>>,
    channel: Arc<MessageChannel<T>>,
    respond_to_sync: bool,
}

impl<T: Transport + 'static> Inbound<T> {
    async fn run(self: Arc<Self>) {
        loop {
            match self.transport.recv().await {
                Ok(event) => self.dispatch(event),
                Err(TransportError::ConnectionClosed) => {
                    info!("Inbound stream closed");
                    break;
                }
                Err(e) => warn!("Inbound receive failed: {}", e),
            }
        }
    }

    fn dispatch(self: &Arc<Self>, event: InboundEvent) {
        match event {
            InboundEvent::DataChanged(item) => {
                self.store.on_remote_item_changed(item);
            }
            InboundEvent::DataDeleted { path } => self.store.on_remote_item_deleted(&path),
            InboundEvent::Message(message) => {
                if let InboundRoute::SyncRequested { from } = self.channel.on_message_received(&message)
                {
                    if self.respond_to_sync {
                        let count = self.store.republish_to(&from);
                        debug!(peer = %from, count, "Answered sync request");
                    }
                }
            }
            InboundEvent::CapabilityChanged(nodes) => {
                self.registry.on_capability_changed(nodes);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MockTransport;
    use std::time::Duration;
    use wearlink_core::SemanticRecord;
    use wearlink_types::{Fields, Value, BATTERY_PATH, COMMAND_PATH, SYNC_PATH, SYNC_PAYLOAD};

    struct NoSource;

    impl TelemetrySource for NoSource {
        fn sample(&self, kind: MetricKind) -> Result<Reading, crate::source::Unavailable> {
            Err(crate::source::Unavailable(kind))
        }
    }

    fn link(peers: &[&str]) -> (WearLink<MockTransport>, MockTransport) {
        let transport = MockTransport::new();
        transport.set_nodes(
            peers
                .iter()
                .map(|id| Node::new(*id, "Watch", true))
                .collect(),
        );
        let link =
            WearLink::new(LinkConfig::default(), transport.clone(), Arc::new(NoSource)).unwrap();
        (link, transport)
    }

    async fn next_event(rx: &mut broadcast::Receiver<LinkEvent>) -> LinkEvent {
        tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("no event in time")
            .expect("event stream closed")
    }

    // ===========================================
    // Initialization Tests
    // ===========================================

    #[tokio::test]
    async fn initialize_discovers_peers() {
        let (link, _) = link(&["w1"]);
        assert!(!link.is_connected());
        link.initialize().await.unwrap();
        assert!(link.is_connected());
    }

    #[tokio::test]
    async fn unusable_config_is_rejected() {
        for config in [
            LinkConfig {
                sample_interval_ms: 0,
                ..LinkConfig::default()
            },
            LinkConfig {
                outbox_capacity: 0,
                ..LinkConfig::default()
            },
            LinkConfig {
                event_capacity: 0,
                ..LinkConfig::default()
            },
        ] {
            let result = WearLink::new(config, MockTransport::new(), Arc::new(NoSource));
            assert!(matches!(result, Err(ConfigError::Invalid(_))));
        }
    }

    #[tokio::test]
    async fn initialize_surfaces_transport_failure() {
        let (link, transport) = link(&["w1"]);
        transport.fail_next_query("no radio");
        let result = link.initialize().await;
        assert!(matches!(result, Err(LinkError::Initialization(_))));
    }

    #[tokio::test]
    async fn connected_devices_survive_failed_refresh() {
        let (link, transport) = link(&["w1"]);
        link.initialize().await.unwrap();
        transport.fail_next_query("no radio");

        let devices = link.connected_devices().await;
        assert_eq!(devices.len(), 1);
    }

    // ===========================================
    // Argument Validation Tests
    // ===========================================

    #[tokio::test]
    async fn send_message_requires_device_id() {
        let (link, transport) = link(&["w1"]);
        link.initialize().await.unwrap();

        let result = link.send_message(None, Some("/x"), Some("y")).await;
        assert!(matches!(result, Err(LinkError::InvalidArgument(ref m)) if m.contains("deviceId")));
        assert!(transport.sent_messages().is_empty());
    }

    #[tokio::test]
    async fn send_message_requires_path_and_data() {
        let (link, transport) = link(&["w1"]);
        link.initialize().await.unwrap();

        assert!(link.send_message(Some("w1"), None, Some("y")).await.is_err());
        assert!(link.send_message(Some("w1"), Some("/x"), None).await.is_err());
        assert!(transport.sent_messages().is_empty());
    }

    #[tokio::test]
    async fn send_message_delivers() {
        let (link, transport) = link(&["w1"]);
        link.initialize().await.unwrap();

        link.send_message(Some("w1"), Some(COMMAND_PATH), Some("pause"))
            .await
            .unwrap();
        assert_eq!(transport.sent_messages()[0].payload, b"pause");
    }

    #[tokio::test]
    async fn send_data_requires_object() {
        let (link, _) = link(&[]);
        assert!(matches!(
            link.send_data(None, None).await,
            Err(LinkError::InvalidArgument(_))
        ));
        assert!(matches!(
            link.send_data(None, Some("[1, 2]")).await,
            Err(LinkError::InvalidArgument(_))
        ));
        assert!(matches!(
            link.send_data(None, Some("{not json")).await,
            Err(LinkError::InvalidArgument(_))
        ));
    }

    #[tokio::test]
    async fn send_data_defaults_to_health_path() {
        let (link, _) = link(&[]);
        let item = link
            .send_data(None, Some(r#"{"heartRate": 88, "note": null}"#))
            .await
            .unwrap();

        assert_eq!(item.path, HEALTH_PATH);
        assert_eq!(item.fields["heartRate"], Value::Int(88));
        assert!(!item.fields.contains_key("note"));
        assert_eq!(link.get_data(HEALTH_PATH), Some(item));
    }

    // ===========================================
    // Inbound Pump Tests
    // ===========================================

    #[tokio::test]
    async fn inbound_command_reaches_subscribers() {
        let (link, transport) = link(&["w1"]);
        let mut rx = link.subscribe();
        link.initialize().await.unwrap();
        // Connection change from initialize
        next_event(&mut rx).await;

        transport.deliver_message(COMMAND_PATH, b"pause", "w1");
        assert_eq!(
            next_event(&mut rx).await,
            LinkEvent::CommandReceived {
                command: "pause".into(),
                from: NodeId::from("w1"),
            }
        );
    }

    #[tokio::test]
    async fn inbound_data_item_is_decoded() {
        let (link, transport) = link(&[]);
        let mut rx = link.subscribe();
        link.initialize().await.unwrap();

        let mut fields = Fields::new();
        fields.insert("level".into(), Value::Int(80));
        transport.push_inbound(InboundEvent::DataChanged(DataItem::new(BATTERY_PATH, fields, 3)));

        match next_event(&mut rx).await {
            LinkEvent::DataReceived(SemanticRecord::Battery(record)) => {
                assert_eq!(record.level, 80);
                assert_eq!(record.status, "unknown");
            }
            other => panic!("Expected battery record, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn sync_request_republishes_items() {
        let (link, transport) = link(&["phone"]);
        link.initialize().await.unwrap();
        link.send_data(Some("/custom"), Some(r#"{"v": 1}"#)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        transport.clear_log();

        transport.deliver_message(SYNC_PATH, SYNC_PAYLOAD, "phone");
        tokio::time::timeout(Duration::from_secs(2), async {
            while transport.replicated_to("phone").is_empty() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();
        assert_eq!(transport.replicated_to("phone")[0].path, "/custom");
    }

    #[tokio::test]
    async fn sync_response_can_be_disabled() {
        let transport = MockTransport::new();
        transport.set_nodes(vec![Node::new("phone", "Phone", true)]);
        let config = LinkConfig {
            respond_to_sync: false,
            ..LinkConfig::default()
        };
        let link = WearLink::new(config, transport.clone(), Arc::new(NoSource)).unwrap();
        let mut rx = link.subscribe();
        link.initialize().await.unwrap();
        link.send_data(Some("/custom"), Some("{}")).await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        transport.clear_log();

        transport.deliver_message(SYNC_PATH, SYNC_PAYLOAD, "phone");
        loop {
            if let LinkEvent::SyncRequested { .. } = next_event(&mut rx).await {
                break;
            }
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(transport.replicated().is_empty());
    }

    #[tokio::test]
    async fn receive_error_does_not_stop_pump() {
        let (link, transport) = link(&[]);
        let mut rx = link.subscribe();
        transport.fail_next_recv("glitch");
        link.initialize().await.unwrap();

        transport.deliver_message("/x", b"y", "w1");
        assert!(matches!(
            next_event(&mut rx).await,
            LinkEvent::MessageReceived { .. }
        ));
    }

    #[tokio::test]
    async fn capability_change_updates_connection() {
        let (link, transport) = link(&[]);
        let mut rx = link.subscribe();
        link.initialize().await.unwrap();

        transport.push_inbound(InboundEvent::CapabilityChanged(vec![Node::new(
            "w1", "Watch", true,
        )]));
        match next_event(&mut rx).await {
            LinkEvent::ConnectionChanged(status) => assert!(status.connected),
            other => panic!("Expected connection change, got {:?}", other),
        }
        assert!(link.is_connected());
    }

    // ===========================================
    // Getter Tests
    // ===========================================

    #[tokio::test]
    async fn getters_return_defaults_before_sampling() {
        let (link, _) = link(&[]);
        assert_eq!(link.heart_rate(), 70);
        assert_eq!(link.steps(), 0);
        assert_eq!(link.calories(), 0.0);
        assert_eq!(link.distance(), 0.0);
        assert_eq!(link.speed(), 0.0);
        assert_eq!(link.heart_rate_variability(), 60.0);
        assert_eq!(link.stress_level(), 20.0);
        assert_eq!(link.sleep_data(), SleepSummary::default());
        assert!(link.activity_data().is_empty());
    }

    #[tokio::test]
    async fn on_demand_sample_surfaces_unavailable() {
        let (link, _) = link(&[]);
        assert!(matches!(
            link.sample(MetricKind::HeartRate),
            Err(LinkError::Unavailable(MetricKind::HeartRate))
        ));
    }

    #[tokio::test]
    async fn shutdown_is_repeatable() {
        let (link, _) = link(&[]);
        link.initialize().await.unwrap();
        link.start_monitoring().await;
        link.shutdown().await;
        link.shutdown().await;
        assert!(!link.stop_monitoring().await);
    }

    #[tokio::test]
    async fn dropping_link_stops_sampling() {
        let transport = MockTransport::new();
        transport.set_nodes(vec![Node::new("phone", "Phone", true)]);
        let config = LinkConfig {
            sample_interval_ms: 10,
            ..LinkConfig::default()
        };
        let source = Arc::new(crate::source::SyntheticSource::with_seed(7));
        let link = WearLink::new(config, transport.clone(), source).unwrap();
        let mut rx = link.subscribe();
        link.initialize().await.unwrap();
        assert!(link.start_monitoring().await);
        tokio::time::sleep(Duration::from_millis(35)).await;
        assert!(!transport.replicated().is_empty());

        drop(link);
        tokio::time::sleep(Duration::from_millis(30)).await;
        transport.clear_log();
        while rx.try_recv().is_ok() {}

        tokio::time::sleep(Duration::from_millis(100)).await;
        while let Ok(event) = rx.try_recv() {
            assert!(!matches!(event, LinkEvent::DataUpdate { .. }));
        }
        assert!(transport.replicated().is_empty());
    }
}
