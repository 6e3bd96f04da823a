//! # wearlink-client
//!
//! Device sync layer for a paired handheld and wearable.
//!
//! This is the library the app on each device links against.
//!
//! ## Features
//!
//! - **Node Registry**: tracks reachable peers, publishes connection changes
//! - **Data Item Store**: latest-value records per path, replicated to every peer
//! - **Message Channel**: addressed fire-and-forget messages and sync requests
//! - **Sync Coordinator**: periodic telemetry sampling with clean start/stop
//! - **Transport Abstraction**: pluggable link (loopback, mock)
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use wearlink_client::{LinkConfig, SyntheticSource, WearLink};
//!
//! let link = WearLink::new(LinkConfig::default(), transport, Arc::new(SyntheticSource::new()))?;
//! let mut events = link.subscribe();
//! link.initialize().await?;
//! link.start_monitoring().await;
//!
//! while let Ok(event) = events.recv().await {
//!     println!("{}: {:?}", event.name(), event);
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod channel;
pub mod clock;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod events;
pub mod link;
pub mod registry;
pub mod source;
pub mod store;
pub mod transport;

pub use channel::{BroadcastReport, MessageChannel};
pub use config::{ConfigError, LinkConfig};
pub use coordinator::{SamplePass, SamplingState, SyncCoordinator};
pub use error::LinkError;
pub use events::{EventBus, LinkEvent};
pub use link::WearLink;
pub use registry::NodeRegistry;
pub use source::{SyntheticSource, TelemetrySource, Unavailable};
pub use store::{DataItemStore, TIMESTAMP_FIELD};
pub use transport::{
    InboundEvent, LoopbackTransport, MockTransport, SentMessage, Transport, TransportError,
};
