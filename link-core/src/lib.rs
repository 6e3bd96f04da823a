//! # wearlink-core
//!
//! Pure logic for wearlink (no I/O, instant tests).
//!
//! This crate decides *what* the sync layer does without doing any of it:
//! which peers are reachable and whether that changed, which replications
//! are still worth delivering, how a data item reads as a typed record,
//! where an inbound message goes, and what the last known telemetry is.
//!
//! ## Design Philosophy
//!
//! All modules in this crate are **pure** - they take input and produce output
//! without side effects. This enables:
//! - Instant unit tests (no mocks, no async)
//! - Deterministic behavior (same input → same output)
//! - Easy reasoning about state transitions
//!
//! The actual I/O (transport, timers, tasks) is performed by
//! `wearlink-client`, which applies the decisions made here.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod outbox;
pub mod reachable;
pub mod routing;
pub mod schema;
pub mod snapshot;

pub use outbox::{BufferError, Enqueued, Replication, ReplicationOutbox};
pub use reachable::{ConnectionChanged, ReachableSet};
pub use routing::{route_message, InboundRoute};
pub use schema::{BatteryRecord, GenericRecord, HealthRecord, SemanticRecord};
pub use snapshot::{default_value, stress_from_hrv, TelemetrySnapshot};
