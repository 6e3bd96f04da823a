//! Publish timestamps.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Milliseconds since the Unix epoch, or 0 if the system clock is before it.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Hands out strictly increasing millisecond timestamps.
///
/// Follows wall-clock time but never repeats or goes backwards, so two puts
/// in the same millisecond still order correctly.
#[derive(Debug, Default)]
pub struct PublishClock {
    last: AtomicU64,
}

impl PublishClock {
    /// Create a clock.
    pub fn new() -> Self {
        Self::default()
    }

    /// Next timestamp.
    pub fn next(&self) -> u64 {
        let now = now_millis();
        let previous = self
            .last
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                Some(now.max(last + 1))
            })
            .unwrap_or_else(|last| last);
        now.max(previous + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamps_strictly_increase() {
        let clock = PublishClock::new();
        let mut previous = clock.next();
        for _ in 0..1_000 {
            let next = clock.next();
            assert!(next > previous);
            previous = next;
        }
    }

    #[test]
    fn timestamps_track_wall_clock() {
        let clock = PublishClock::new();
        let before = now_millis();
        assert!(clock.next() >= before);
    }
}
