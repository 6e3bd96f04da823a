//! Run the watch's sampling loop.

use anyhow::Result;
use wearlink_client::{LinkConfig, LinkEvent};
use wearlink_core::SemanticRecord;

use crate::demo::{self, Pair};

/// Run the simulate command.
///
/// Starts sampling on the watch and prints every record the phone receives
/// until `ticks` health records have arrived.
pub async fn run(config: LinkConfig, ticks: u32) -> Result<()> {
    let per_tick = config.sample_interval() * 4;
    let pair = Pair::start(config).await?;
    let mut events = pair.phone.subscribe();

    println!("=== wearlink simulate ===");
    println!();
    pair.watch.start_monitoring().await;

    let mut seen = 0;
    while seen < ticks {
        let event = demo::wait_for(&mut events, per_tick, |e| {
            matches!(e, LinkEvent::DataReceived(_))
        })
        .await?;
        println!("phone <- {}", demo::describe(&event));
        if matches!(event, LinkEvent::DataReceived(SemanticRecord::Health(_))) {
            seen += 1;
        }
    }

    let snapshot = pair.watch.current_snapshot();
    println!();
    println!("Watch snapshot:");
    for (metric, value) in snapshot.values() {
        println!("  {:<22} {}", metric.field_name(), value);
    }
    println!("  {:<22} {}", "stressLevel", snapshot.stress_level());

    pair.shutdown().await;
    Ok(())
}
