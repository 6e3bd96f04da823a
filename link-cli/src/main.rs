//! # wearlink
//!
//! CLI tool for exercising the wearlink sync layer.
//!
//! Every command runs a simulated phone and watch paired over an in-memory
//! link, so the full sync path (discovery, replication, messaging, event
//! delivery) can be watched without hardware.
//!
//! ## Commands
//!
//! - `simulate`: run the watch's sampling loop and print what the phone receives
//! - `send`: publish one data item from the watch
//! - `command`: send a command message from the phone to the watch
//! - `config`: print the effective configuration
//!
//! ## Example
//!
//! ```bash
//! # Five sampling passes, one per 500 ms
//! wearlink simulate --ticks 5 --interval-ms 500
//!
//! # Publish a custom record
//! wearlink send --path /body_battery/mood --data '{"mood": "calm"}'
//!
//! # Debug logging
//! wearlink --verbose simulate
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use wearlink_client::LinkConfig;

mod commands;
mod demo;
mod logging;

use commands::{command, config, send, simulate};

/// CLI tool for exercising the wearlink sync layer.
#[derive(Parser, Debug)]
#[command(name = "wearlink")]
#[command(version, about, long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Debug logging (overridden by RUST_LOG)
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the watch's sampling loop and print what the phone receives
    Simulate {
        /// Number of sampling passes to wait for
        #[arg(long, default_value = "3")]
        ticks: u32,

        /// Override the sampling interval in milliseconds
        #[arg(long)]
        interval_ms: Option<u64>,
    },

    /// Publish one data item from the watch
    Send {
        /// Data item path (defaults to the health path)
        #[arg(long)]
        path: Option<String>,

        /// JSON object to publish
        #[arg(long)]
        data: String,
    },

    /// Send a command message from the phone to the watch
    Command {
        /// Command text
        text: String,
    },

    /// Print the effective configuration as TOML
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose)?;

    let link_config = match &cli.config {
        Some(path) => LinkConfig::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => LinkConfig::default(),
    };

    match cli.command {
        Commands::Simulate { ticks, interval_ms } => {
            let mut link_config = link_config;
            if let Some(ms) = interval_ms {
                anyhow::ensure!(ms > 0, "--interval-ms must be positive");
                link_config.sample_interval_ms = ms;
            }
            simulate::run(link_config, ticks).await?;
        }
        Commands::Send { path, data } => {
            send::run(link_config, path.as_deref(), &data).await?;
        }
        Commands::Command { text } => {
            command::run(link_config, &text).await?;
        }
        Commands::Config => {
            config::run(&link_config)?;
        }
    }

    Ok(())
}
