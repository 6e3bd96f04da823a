//! Telemetry sources.
//!
//! The sampling loop asks a [`TelemetrySource`] for one reading per metric.
//! A source may not support every metric; it says so with [`Unavailable`]
//! and the loop moves on.

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;
use wearlink_types::{ActivitySession, MetricKind, Reading, SleepSummary};

use crate::clock::now_millis;

/// The source has no sample for a metric right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("no {0} sample available")]
pub struct Unavailable(pub MetricKind);

/// Somewhere readings come from: a sensor stack, a health platform, a fake.
///
/// Methods may block. The sampling loop calls them on tokio's blocking
/// pool, but [`SyncCoordinator::sample_metric`](crate::SyncCoordinator::sample_metric)
/// calls `sample` inline, so slow sources should not be queried that way
/// from inside the runtime.
pub trait TelemetrySource: Send + Sync {
    /// Take one reading for a metric.
    fn sample(&self, kind: MetricKind) -> Result<Reading, Unavailable>;

    /// Most recent sleep session, if the source tracks sleep.
    fn sleep(&self) -> Option<SleepSummary> {
        None
    }

    /// Recent activity sessions, if the source tracks them.
    fn activities(&self) -> Option<Vec<ActivitySession>> {
        None
    }
}

const EIGHT_HOURS_MS: u64 = 8 * 60 * 60 * 1000;

struct SyntheticState {
    rng: StdRng,
    steps: Option<u32>,
    battery: i32,
}

/// Plausible random telemetry for development and demos.
///
/// Heart rate and HRV are drawn fresh each time, the step count only ever
/// climbs, and the battery drains from 100%. Calories, distance and speed
/// are not simulated.
pub struct SyntheticSource {
    state: Mutex<SyntheticState>,
}

impl SyntheticSource {
    /// Create a source seeded from the OS.
    pub fn new() -> Self {
        Self::from_rng(StdRng::from_entropy())
    }

    /// Create a reproducible source.
    pub fn with_seed(seed: u64) -> Self {
        Self::from_rng(StdRng::seed_from_u64(seed))
    }

    fn from_rng(rng: StdRng) -> Self {
        Self {
            state: Mutex::new(SyntheticState {
                rng,
                steps: None,
                battery: 100,
            }),
        }
    }
}

impl Default for SyntheticSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TelemetrySource for SyntheticSource {
    fn sample(&self, kind: MetricKind) -> Result<Reading, Unavailable> {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        let value = match kind {
            MetricKind::HeartRate => f64::from(state.rng.gen_range(70_u32..=100)),
            MetricKind::Steps => {
                let steps = match state.steps {
                    None => state.rng.gen_range(5_000..=10_000),
                    Some(previous) => previous + state.rng.gen_range(0..=10),
                };
                state.steps = Some(steps);
                f64::from(steps)
            }
            MetricKind::HeartRateVariability => state.rng.gen_range(40.0..80.0),
            MetricKind::BatteryLevel => {
                let drain = state.rng.gen_range(0..=2);
                state.battery = (state.battery - drain).max(0);
                f64::from(state.battery)
            }
            MetricKind::Calories | MetricKind::Distance | MetricKind::Speed => {
                return Err(Unavailable(kind))
            }
        };
        Ok(Reading::new(kind, value, now_millis()))
    }

    fn sleep(&self) -> Option<SleepSummary> {
        let end_time = now_millis();
        Some(SleepSummary {
            start_time: end_time.saturating_sub(EIGHT_HOURS_MS),
            end_time,
            deep_sleep_minutes: 90,
            rem_sleep_minutes: 120,
            light_sleep_minutes: 210,
            awake_minutes: 60,
            quality: 75.0,
        })
    }

    fn activities(&self) -> Option<Vec<ActivitySession>> {
        Some(vec![ActivitySession {
            kind: "walking".to_string(),
            duration_minutes: 30,
            intensity: 40.0,
            calories_burned: 120,
        }])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heart_rate_in_resting_range() {
        let source = SyntheticSource::with_seed(7);
        for _ in 0..100 {
            let hr = source.sample(MetricKind::HeartRate).unwrap().value;
            assert!((70.0..=100.0).contains(&hr), "heart rate {}", hr);
        }
    }

    #[test]
    fn steps_never_decrease() {
        let source = SyntheticSource::with_seed(7);
        let first = source.sample(MetricKind::Steps).unwrap().value;
        assert!((5_000.0..=10_000.0).contains(&first));

        let mut previous = first;
        for _ in 0..50 {
            let next = source.sample(MetricKind::Steps).unwrap().value;
            assert!(next >= previous && next - previous <= 10.0);
            previous = next;
        }
    }

    #[test]
    fn battery_drains_and_floors_at_zero() {
        let source = SyntheticSource::with_seed(7);
        let mut previous = 100.0;
        for _ in 0..200 {
            let level = source.sample(MetricKind::BatteryLevel).unwrap().value;
            assert!(level <= previous && level >= 0.0);
            previous = level;
        }
        assert_eq!(previous, 0.0);
    }

    #[test]
    fn unsimulated_metrics_are_unavailable() {
        let source = SyntheticSource::with_seed(7);
        assert_eq!(
            source.sample(MetricKind::Calories),
            Err(Unavailable(MetricKind::Calories))
        );
        assert!(source.sample(MetricKind::Speed).is_err());
    }

    #[test]
    fn readings_carry_units() {
        let source = SyntheticSource::with_seed(7);
        assert_eq!(source.sample(MetricKind::HeartRate).unwrap().unit, "bpm");
    }

    #[test]
    fn fixtures_for_sleep_and_activity() {
        let source = SyntheticSource::with_seed(7);
        let sleep = source.sleep().unwrap();
        assert_eq!(sleep.end_time - sleep.start_time, EIGHT_HOURS_MS);
        assert_eq!(sleep.deep_sleep_minutes, 90);
        assert_eq!(sleep.quality, 75.0);

        let activities = source.activities().unwrap();
        assert_eq!(activities[0].kind, "walking");
        assert_eq!(activities[0].calories_burned, 120);
    }
}
