//! Sync coordinator.
//!
//! Runs the periodic sampling loop: each pass reads every configured metric
//! from the [`TelemetrySource`], swaps in a new [`TelemetrySnapshot`],
//! publishes a `DataUpdate` per reading, and writes the health and battery
//! records to the store for replication.
//!
//! # Lifecycle
//!
//! ```text
//! Idle --start()--> Sampling --stop()--> Idle
//! ```
//!
//! `start()` while sampling and `stop()` while idle are no-ops. A stop
//! lets an in-flight pass finish and takes effect at the next tick. The
//! loop only holds a weak reference, so dropping the coordinator ends it.

use parking_lot::RwLock;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};
use wearlink_core::{BatteryRecord, TelemetrySnapshot};
use wearlink_types::{
    ActivitySession, MetricKind, Reading, SleepSummary, BATTERY_PATH, HEALTH_PATH,
};

use crate::channel::{BroadcastReport, MessageChannel};
use crate::clock::now_millis;
use crate::events::{EventBus, LinkEvent};
use crate::source::{TelemetrySource, Unavailable};
use crate::store::DataItemStore;
use crate::transport::Transport;

/// Whether the sampling loop is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplingState {
    /// No loop running.
    Idle,
    /// Loop running.
    Sampling,
}

/// What one sampling pass produced.
#[derive(Debug, Clone, PartialEq)]
pub struct SamplePass {
    /// Metrics that produced a reading.
    pub sampled: Vec<MetricKind>,
    /// Metrics the source could not provide.
    pub unavailable: Vec<MetricKind>,
}

/// Raw output of the source for one pass, before it touches the snapshot.
struct Collected {
    readings: Vec<(MetricKind, Reading)>,
    unavailable: Vec<MetricKind>,
    sleep: Option<SleepSummary>,
    activities: Option<Vec<ActivitySession>>,
}

impl Collected {
    fn from_source(source: &dyn TelemetrySource, metrics: &[MetricKind]) -> Self {
        let mut readings = Vec::with_capacity(metrics.len());
        let mut unavailable = Vec::new();
        for &kind in metrics {
            match source.sample(kind) {
                Ok(reading) => readings.push((kind, reading)),
                Err(e) => {
                    debug!("{}", e);
                    unavailable.push(kind);
                }
            }
        }
        Self {
            readings,
            unavailable,
            sleep: source.sleep(),
            activities: source.activities(),
        }
    }

    fn nothing(metrics: &[MetricKind]) -> Self {
        Self {
            readings: Vec::new(),
            unavailable: metrics.to_vec(),
            sleep: None,
            activities: None,
        }
    }
}

struct SamplingTask {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

/// Drives periodic sampling and sync requests.
pub struct SyncCoordinator<T: Transport> {
    source: Arc<dyn TelemetrySource>,
    store: Arc<DataItemStore<T>>,
    channel: Arc<MessageChannel<T>>,
    bus: EventBus,
    snapshot: RwLock<Arc<TelemetrySnapshot>>,
    metrics: Vec<MetricKind>,
    interval: Duration,
    task: Mutex<Option<SamplingTask>>,
}

impl<T: Transport + 'static> SyncCoordinator<T> {
    /// Create an idle coordinator.
    pub fn new(
        source: Arc<dyn TelemetrySource>,
        store: Arc<DataItemStore<T>>,
        channel: Arc<MessageChannel<T>>,
        bus: EventBus,
        metrics: Vec<MetricKind>,
        interval: Duration,
    ) -> Self {
        Self {
            source,
            store,
            channel,
            bus,
            snapshot: RwLock::new(Arc::new(TelemetrySnapshot::new())),
            metrics,
            interval,
            task: Mutex::new(None),
        }
    }

    /// Start the sampling loop. Returns false if it was already running or
    /// the interval is zero.
    ///
    /// The first pass runs one interval after the call.
    pub async fn start(self: &Arc<Self>) -> bool {
        if self.interval.is_zero() {
            warn!("Sampling interval is zero, not starting");
            return false;
        }

        let mut task = self.task.lock().await;
        if task.is_some() {
            debug!("Sampling already running");
            return false;
        }

        let (shutdown, signal) = watch::channel(false);
        let handle = tokio::spawn(Self::run(Arc::downgrade(self), self.interval, signal));
        *task = Some(SamplingTask { shutdown, handle });
        info!(interval_ms = self.interval.as_millis() as u64, "Sampling started");
        true
    }

    /// Stop the sampling loop. Returns false if it was not running.
    ///
    /// Waits for an in-flight pass to finish; no pass starts after this
    /// returns.
    pub async fn stop(&self) -> bool {
        let Some(task) = self.task.lock().await.take() else {
            debug!("Sampling not running");
            return false;
        };

        let _ = task.shutdown.send(true);
        if let Err(e) = task.handle.await {
            warn!("Sampling task ended abnormally: {}", e);
        }
        info!("Sampling stopped");
        true
    }

    /// Current lifecycle state.
    pub async fn state(&self) -> SamplingState {
        if self.task.lock().await.is_some() {
            SamplingState::Sampling
        } else {
            SamplingState::Idle
        }
    }

    async fn run(
        coordinator: Weak<Self>,
        interval: Duration,
        mut shutdown: watch::Receiver<bool>,
    ) {
        let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                // Sender dropped (coordinator gone) counts as a stop.
                _ = shutdown.changed() => break,
                _ = ticker.tick() => {}
            }
            if *shutdown.borrow() {
                break;
            }
            let Some(coordinator) = coordinator.upgrade() else {
                break;
            };
            coordinator.sample_once().await;
        }
        debug!("Sampling loop exited");
    }

    /// Run one sampling pass now.
    ///
    /// The source is read on the blocking pool. Its readings are then folded
    /// into whatever snapshot is current at that point, so an on-demand
    /// sample taken meanwhile is kept. Metrics the source cannot provide
    /// keep their previous value.
    pub async fn sample_once(&self) -> SamplePass {
        let source = Arc::clone(&self.source);
        let metrics = self.metrics.clone();
        let collected = match tokio::task::spawn_blocking(move || {
            Collected::from_source(source.as_ref(), &metrics)
        })
        .await
        {
            Ok(collected) => collected,
            Err(e) => {
                warn!("Telemetry source failed during pass: {}", e);
                Collected::nothing(&self.metrics)
            }
        };
        let Collected {
            readings,
            unavailable,
            sleep,
            activities,
        } = collected;

        let (next, previous_level) = {
            let mut current = self.snapshot.write();
            let previous_level = current
                .reading(MetricKind::BatteryLevel)
                .map(|_| current.battery_level());
            let mut next = TelemetrySnapshot::clone(&current);
            for (kind, reading) in &readings {
                next.record(*kind, reading.clone());
            }
            if let Some(sleep) = sleep {
                next.record_sleep(sleep);
            }
            if let Some(activities) = activities {
                next.record_activities(activities);
            }
            let next = Arc::new(next);
            *current = Arc::clone(&next);
            (next, previous_level)
        };

        for (kind, reading) in &readings {
            self.bus.publish(LinkEvent::DataUpdate {
                metric: *kind,
                value: reading.value,
                timestamp: reading.timestamp,
            });
        }

        let now = now_millis() as i64;
        self.store
            .put(HEALTH_PATH, next.health_record(now).to_fields())
            .await;

        if readings.iter().any(|(kind, _)| *kind == MetricKind::BatteryLevel) {
            let record = BatteryRecord::assess(next.battery_level(), previous_level, now);
            self.store.put(BATTERY_PATH, record.to_fields()).await;
        }

        let sampled: Vec<MetricKind> = readings.into_iter().map(|(kind, _)| kind).collect();
        debug!(
            sampled = sampled.len(),
            unavailable = unavailable.len(),
            "Sampling pass complete"
        );
        SamplePass {
            sampled,
            unavailable,
        }
    }

    /// Sample a single metric on demand and fold it into the snapshot.
    ///
    /// Calls the source on the caller's thread.
    pub fn sample_metric(&self, kind: MetricKind) -> Result<Reading, Unavailable> {
        let reading = self.source.sample(kind)?;
        {
            let mut current = self.snapshot.write();
            let mut next = TelemetrySnapshot::clone(&current);
            next.record(kind, reading.clone());
            *current = Arc::new(next);
        }
        self.bus.publish(LinkEvent::DataUpdate {
            metric: kind,
            value: reading.value,
            timestamp: reading.timestamp,
        });
        Ok(reading)
    }

    /// Latest telemetry snapshot.
    pub fn current_snapshot(&self) -> Arc<TelemetrySnapshot> {
        Arc::clone(&self.snapshot.read())
    }

    /// Ask every reachable peer for its latest data.
    pub async fn request_sync(&self) -> BroadcastReport {
        self.channel.broadcast_sync().await
    }
}
