//! # wearlink-types
//!
//! Data model for the wearlink device synchronization layer.
//!
//! This crate provides the types shared by every wearlink crate:
//! - [`NodeId`], [`Node`] - Paired device identity and reachability
//! - [`Value`], [`Fields`] - Closed set of typed record fields
//! - [`DataItem`], [`Message`] - Replicated records and addressed messages
//! - [`Frame`] - Unit of transfer on a device-to-device link
//! - [`MetricKind`], [`Reading`] - Telemetry samples
//! - Reserved paths ([`BATTERY_PATH`], [`HEALTH_PATH`], ...)
//! - [`WireError`] - Error types

#![warn(missing_docs)]
#![warn(clippy::all)]

mod error;
mod ids;
mod messages;
mod paths;
mod telemetry;
mod value;

pub use error::WireError;
pub use ids::{Node, NodeId};
pub use messages::{DataItem, Frame, Message};
pub use paths::{
    PathKind, APP_CAPABILITY, BATTERY_PATH, COMMAND_PATH, HEALTH_PATH, PATH_PREFIX, SYNC_PATH,
    SYNC_PAYLOAD,
};
pub use telemetry::{ActivitySession, MetricKind, Reading, SleepSummary};
pub use value::{fields_from_json, Fields, ParsedFields, Value};
