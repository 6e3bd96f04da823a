//! Last-known telemetry values.
//!
//! A [`TelemetrySnapshot`] is an immutable record of the latest reading per
//! metric. The sampling loop builds the next snapshot from a copy of the
//! current one and swaps it in whole, so readers see either the previous
//! pass or the next one, never a mix.

use std::collections::BTreeMap;
use wearlink_types::{ActivitySession, MetricKind, Reading, SleepSummary};

use crate::schema::HealthRecord;

/// Documented fallback for a metric that has never been sampled.
pub fn default_value(kind: MetricKind) -> f64 {
    match kind {
        MetricKind::HeartRate => 70.0,
        MetricKind::Steps => 0.0,
        MetricKind::Calories => 0.0,
        MetricKind::Distance => 0.0,
        MetricKind::Speed => 0.0,
        MetricKind::HeartRateVariability => 60.0,
        MetricKind::BatteryLevel => 0.0,
    }
}

/// Stress score derived from heart rate variability.
///
/// Lower variability means higher stress.
pub fn stress_from_hrv(hrv: f64) -> f64 {
    if hrv < 20.0 {
        80.0
    } else if hrv < 40.0 {
        60.0
    } else if hrv < 60.0 {
        40.0
    } else {
        20.0
    }
}

/// Immutable view of the latest reading per metric.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TelemetrySnapshot {
    readings: BTreeMap<MetricKind, Reading>,
    sleep: Option<SleepSummary>,
    activities: Option<Vec<ActivitySession>>,
}

impl TelemetrySnapshot {
    /// Create an empty snapshot (every getter returns its default).
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a reading, replacing the previous one for that metric.
    pub fn record(&mut self, kind: MetricKind, reading: Reading) {
        self.readings.insert(kind, reading);
    }

    /// Record the latest sleep summary.
    pub fn record_sleep(&mut self, sleep: SleepSummary) {
        self.sleep = Some(sleep);
    }

    /// Record the latest activity sessions.
    pub fn record_activities(&mut self, activities: Vec<ActivitySession>) {
        self.activities = Some(activities);
    }

    /// Latest reading for a metric, if one was ever taken.
    pub fn reading(&self, kind: MetricKind) -> Option<&Reading> {
        self.readings.get(&kind)
    }

    /// Latest value for a metric, or its default.
    pub fn value(&self, kind: MetricKind) -> f64 {
        self.readings
            .get(&kind)
            .map_or_else(|| default_value(kind), |r| r.value)
    }

    /// Every metric mapped to its latest value or default.
    pub fn values(&self) -> BTreeMap<MetricKind, f64> {
        MetricKind::ALL
            .iter()
            .map(|&kind| (kind, self.value(kind)))
            .collect()
    }

    /// Heart rate in bpm.
    pub fn heart_rate(&self) -> i32 {
        self.value(MetricKind::HeartRate).round() as i32
    }

    /// Step count.
    pub fn steps(&self) -> i32 {
        self.value(MetricKind::Steps).round() as i32
    }

    /// Kilocalories.
    pub fn calories(&self) -> f64 {
        self.value(MetricKind::Calories)
    }

    /// Distance in meters.
    pub fn distance(&self) -> f64 {
        self.value(MetricKind::Distance)
    }

    /// Speed in m/s.
    pub fn speed(&self) -> f64 {
        self.value(MetricKind::Speed)
    }

    /// Heart rate variability in ms.
    pub fn heart_rate_variability(&self) -> f64 {
        self.value(MetricKind::HeartRateVariability)
    }

    /// Battery level percentage.
    pub fn battery_level(&self) -> i32 {
        self.value(MetricKind::BatteryLevel).round() as i32
    }

    /// Stress score derived from the current HRV value.
    pub fn stress_level(&self) -> f64 {
        stress_from_hrv(self.heart_rate_variability())
    }

    /// Latest sleep summary, or an all-zero summary.
    pub fn sleep(&self) -> SleepSummary {
        self.sleep.clone().unwrap_or_default()
    }

    /// Latest activity sessions, or none.
    pub fn activities(&self) -> Vec<ActivitySession> {
        self.activities.clone().unwrap_or_default()
    }

    /// Health record built from the current values.
    pub fn health_record(&self, timestamp: i64) -> HealthRecord {
        HealthRecord {
            heart_rate: self.heart_rate(),
            hrv: self.heart_rate_variability(),
            steps: self.steps(),
            stress_level: self.stress_level(),
            timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_snapshot_returns_defaults() {
        let snap = TelemetrySnapshot::new();
        assert_eq!(snap.heart_rate(), 70);
        assert_eq!(snap.steps(), 0);
        assert_eq!(snap.calories(), 0.0);
        assert_eq!(snap.distance(), 0.0);
        assert_eq!(snap.speed(), 0.0);
        assert_eq!(snap.heart_rate_variability(), 60.0);
        assert_eq!(snap.stress_level(), 20.0);
        assert_eq!(snap.sleep(), SleepSummary::default());
        assert!(snap.activities().is_empty());
    }

    #[test]
    fn recorded_reading_wins_over_default() {
        let mut snap = TelemetrySnapshot::new();
        snap.record(
            MetricKind::HeartRate,
            Reading::new(MetricKind::HeartRate, 91.0, 5),
        );
        assert_eq!(snap.heart_rate(), 91);
        assert_eq!(snap.reading(MetricKind::HeartRate).unwrap().timestamp, 5);
    }

    #[test]
    fn values_cover_every_metric() {
        let snap = TelemetrySnapshot::new();
        let values = snap.values();
        assert_eq!(values.len(), MetricKind::ALL.len());
        assert_eq!(values[&MetricKind::HeartRate], 70.0);
    }

    #[test]
    fn stress_bands() {
        assert_eq!(stress_from_hrv(10.0), 80.0);
        assert_eq!(stress_from_hrv(20.0), 60.0);
        assert_eq!(stress_from_hrv(45.0), 40.0);
        assert_eq!(stress_from_hrv(60.0), 20.0);
    }

    #[test]
    fn health_record_uses_current_values() {
        let mut snap = TelemetrySnapshot::new();
        snap.record(MetricKind::Steps, Reading::new(MetricKind::Steps, 5200.0, 1));
        snap.record(
            MetricKind::HeartRateVariability,
            Reading::new(MetricKind::HeartRateVariability, 35.0, 1),
        );
        let record = snap.health_record(9);
        assert_eq!(record.heart_rate, 70);
        assert_eq!(record.steps, 5200);
        assert_eq!(record.stress_level, 60.0);
        assert_eq!(record.timestamp, 9);
    }
}
