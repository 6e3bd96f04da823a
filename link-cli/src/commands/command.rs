//! Send a command message from the phone to the watch.

use anyhow::{Context, Result};
use std::time::Duration;
use wearlink_client::{LinkConfig, LinkEvent};
use wearlink_types::COMMAND_PATH;

use crate::demo::{self, Pair};

/// Run the command command.
pub async fn run(config: LinkConfig, text: &str) -> Result<()> {
    let pair = Pair::start(config).await?;
    let mut events = pair.watch.subscribe();

    pair.phone
        .send_message(Some("watch"), Some(COMMAND_PATH), Some(text))
        .await
        .context("Failed to send command")?;
    println!("phone -> {}: {}", COMMAND_PATH, text);

    let event = demo::wait_for(&mut events, Duration::from_secs(5), |e| {
        matches!(e, LinkEvent::CommandReceived { .. })
    })
    .await?;
    println!("watch <- {}", demo::describe(&event));

    pair.shutdown().await;
    Ok(())
}
