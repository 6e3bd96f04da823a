//! Reserved path namespace.
//!
//! Paths under [`PATH_PREFIX`] with one of the reserved suffixes carry
//! defined record shapes or routing semantics. Every other path is generic.

/// Prefix shared by all reserved paths.
pub const PATH_PREFIX: &str = "/body_battery";

/// Battery record path.
pub const BATTERY_PATH: &str = "/body_battery/battery";

/// Health record path.
pub const HEALTH_PATH: &str = "/body_battery/health";

/// Command message path.
pub const COMMAND_PATH: &str = "/body_battery/command";

/// Sync request message path.
pub const SYNC_PATH: &str = "/body_battery/sync";

/// Payload sent on [`SYNC_PATH`] by a sync request.
pub const SYNC_PAYLOAD: &[u8] = b"sync";

/// Capability tag advertised by nodes running the companion app.
pub const APP_CAPABILITY: &str = "body_battery_app";

/// Classification of a path by exact match against the reserved set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PathKind {
    /// [`BATTERY_PATH`].
    Battery,
    /// [`HEALTH_PATH`].
    Health,
    /// [`COMMAND_PATH`].
    Command,
    /// [`SYNC_PATH`].
    Sync,
    /// Anything else.
    Other,
}

impl PathKind {
    /// Classify a path. Matching is exact; no prefix or trailing-slash folding.
    pub fn of(path: &str) -> Self {
        match path {
            BATTERY_PATH => PathKind::Battery,
            HEALTH_PATH => PathKind::Health,
            COMMAND_PATH => PathKind::Command,
            SYNC_PATH => PathKind::Sync,
            _ => PathKind::Other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserved_paths_classify() {
        assert_eq!(PathKind::of("/body_battery/battery"), PathKind::Battery);
        assert_eq!(PathKind::of("/body_battery/health"), PathKind::Health);
        assert_eq!(PathKind::of("/body_battery/command"), PathKind::Command);
        assert_eq!(PathKind::of("/body_battery/sync"), PathKind::Sync);
    }

    #[test]
    fn near_misses_are_generic() {
        assert_eq!(PathKind::of("/body_battery/sync/"), PathKind::Other);
        assert_eq!(PathKind::of("/sync"), PathKind::Other);
        assert_eq!(PathKind::of("/body_battery"), PathKind::Other);
    }
}
