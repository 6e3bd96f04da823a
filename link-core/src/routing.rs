//! Inbound message routing.
//!
//! Messages are routed by exact path: the command path, the sync path, or
//! the generic fallback. Nothing is dropped; anything unmatched surfaces
//! through [`InboundRoute::Generic`].

use wearlink_types::{Message, NodeId, PathKind};

/// Where an inbound message goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundRoute {
    /// A command for the local app.
    Command {
        /// Command text (payload as UTF-8).
        command: String,
        /// Sending node.
        from: NodeId,
    },
    /// A peer asks for our latest data items.
    SyncRequested {
        /// Sending node.
        from: NodeId,
    },
    /// Any other path.
    Generic {
        /// Path the message arrived on.
        path: String,
        /// Payload as UTF-8.
        data: String,
        /// Sending node.
        from: NodeId,
    },
}

/// Route a received message.
pub fn route_message(message: &Message) -> InboundRoute {
    let from = message.source.clone();
    match PathKind::of(&message.path) {
        PathKind::Command => InboundRoute::Command {
            command: message.payload_text(),
            from,
        },
        PathKind::Sync => InboundRoute::SyncRequested { from },
        _ => InboundRoute::Generic {
            path: message.path.clone(),
            data: message.payload_text(),
            from,
        },
    }
}
