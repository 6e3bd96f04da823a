//! Error types for the caller-facing API.

use thiserror::Error;
use wearlink_types::{MetricKind, NodeId, WireError};

use crate::source::Unavailable;
use crate::transport::TransportError;

/// Errors surfaced to callers of [`crate::WearLink`].
#[derive(Debug, Error)]
pub enum LinkError {
    /// The transport could not be brought up.
    #[error("initialization failed: {0}")]
    Initialization(#[source] TransportError),

    /// A required argument was missing or malformed.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A message could not be delivered to a node.
    #[error("delivery to {node} failed: {source}")]
    Delivery {
        /// Target node.
        node: NodeId,
        /// Underlying transport error.
        #[source]
        source: TransportError,
    },

    /// The telemetry source has no sample for a metric.
    #[error("no {0} sample available")]
    Unavailable(MetricKind),
}

impl LinkError {
    /// Missing-argument error naming the argument.
    pub(crate) fn missing(name: &str) -> Self {
        LinkError::InvalidArgument(format!("{} is required", name))
    }
}

impl From<Unavailable> for LinkError {
    fn from(e: Unavailable) -> Self {
        LinkError::Unavailable(e.0)
    }
}

impl From<WireError> for LinkError {
    fn from(e: WireError) -> Self {
        LinkError::InvalidArgument(e.to_string())
    }
}
