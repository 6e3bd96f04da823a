//! Simulated phone and watch.

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use wearlink_client::{LinkConfig, LinkEvent, LoopbackTransport, SyntheticSource, WearLink};
use wearlink_core::SemanticRecord;
use wearlink_types::{Node, Value};

/// A paired phone and watch, both initialized.
pub struct Pair {
    pub phone: WearLink<LoopbackTransport>,
    pub watch: WearLink<LoopbackTransport>,
}

impl Pair {
    /// Build both sides over one loopback link and bring them up.
    pub async fn start(config: LinkConfig) -> Result<Self> {
        let (phone_link, watch_link) = LoopbackTransport::pair(
            Node::new("phone", "Phone", true),
            Node::new("watch", "Watch", true),
        );
        let phone = WearLink::new(config.clone(), phone_link, Arc::new(SyntheticSource::new()))
            .context("Invalid link configuration")?;
        let watch = WearLink::new(config, watch_link, Arc::new(SyntheticSource::new()))
            .context("Invalid link configuration")?;

        phone.initialize().await.context("Phone failed to initialize")?;
        watch.initialize().await.context("Watch failed to initialize")?;
        Ok(Self { phone, watch })
    }

    /// Stop both sides.
    pub async fn shutdown(&self) {
        self.watch.shutdown().await;
        self.phone.shutdown().await;
    }
}

/// Wait for the first event matching `pred`, up to `timeout`.
pub async fn wait_for<F>(
    rx: &mut broadcast::Receiver<LinkEvent>,
    timeout: Duration,
    mut pred: F,
) -> Result<LinkEvent>
where
    F: FnMut(&LinkEvent) -> bool,
{
    tokio::time::timeout(timeout, async {
        loop {
            match rx.recv().await {
                Ok(event) if pred(&event) => return Ok(event),
                Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => {
                    anyhow::bail!("event stream closed")
                }
            }
        }
    })
    .await
    .context("Timed out waiting for event")?
}

/// One-line rendering of an event.
pub fn describe(event: &LinkEvent) -> String {
    match event {
        LinkEvent::ConnectionChanged(status) => format!(
            "connection: connected={} peers={}",
            status.connected, status.count
        ),
        LinkEvent::DataReceived(record) => describe_record(record),
        LinkEvent::DataDeleted { path } => format!("deleted: {}", path),
        LinkEvent::CommandReceived { command, from } => {
            format!("command from {}: {}", from, command)
        }
        LinkEvent::SyncRequested { from } => format!("sync requested by {}", from),
        LinkEvent::MessageReceived { path, data, from } => {
            format!("message from {} on {}: {}", from, path, data)
        }
        LinkEvent::DataUpdate {
            metric,
            value,
            timestamp,
        } => format!("update: {}={} at {}", metric, value, timestamp),
    }
}

fn describe_record(record: &SemanticRecord) -> String {
    match record {
        SemanticRecord::Battery(b) => format!(
            "battery: level={} status={} change={} recommendation={:?}",
            b.level, b.status, b.change_rate, b.recommendation
        ),
        SemanticRecord::Health(h) => format!(
            "health: heartRate={} hrv={:.1} steps={} stress={}",
            h.heart_rate, h.hrv, h.steps, h.stress_level
        ),
        SemanticRecord::Generic(g) => {
            let fields: Vec<String> = g
                .fields
                .iter()
                .map(|(k, v)| format!("{}={}", k, render(v)))
                .collect();
            format!("{}: {}", g.path, fields.join(" "))
        }
    }
}

fn render(value: &Value) -> String {
    match value {
        Value::String(s) => format!("{:?}", s),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wearlink_core::BatteryRecord;
    use wearlink_types::NodeId;

    #[test]
    fn describes_commands() {
        let event = LinkEvent::CommandReceived {
            command: "pause".into(),
            from: NodeId::from("phone"),
        };
        assert_eq!(describe(&event), "command from phone: pause");
    }

    #[test]
    fn describes_battery_records() {
        let record = SemanticRecord::Battery(BatteryRecord::assess(20, Some(22), 0));
        let line = describe(&LinkEvent::DataReceived(record));
        assert!(line.starts_with("battery: level=20 status=low"));
        assert!(line.contains("\"rest\""));
    }
}
