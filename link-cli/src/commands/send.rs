//! Publish one data item from the watch.

use anyhow::{Context, Result};
use std::time::Duration;
use wearlink_client::{LinkConfig, LinkEvent};

use crate::demo::{self, Pair};

/// Run the send command.
pub async fn run(config: LinkConfig, path: Option<&str>, data: &str) -> Result<()> {
    let pair = Pair::start(config).await?;
    let mut events = pair.phone.subscribe();

    let item = pair
        .watch
        .send_data(path, Some(data))
        .await
        .context("Failed to publish data item")?;
    println!("watch -> {} ({} fields)", item.path, item.fields.len());

    let event = demo::wait_for(&mut events, Duration::from_secs(5), |e| {
        matches!(e, LinkEvent::DataReceived(_))
    })
    .await?;
    println!("phone <- {}", demo::describe(&event));

    pair.shutdown().await;
    Ok(())
}
