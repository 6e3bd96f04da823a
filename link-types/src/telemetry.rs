//! Telemetry sample types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A kind of telemetry metric the source can be asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    /// Beats per minute.
    HeartRate,
    /// Step count for the day.
    Steps,
    /// Kilocalories for the day.
    Calories,
    /// Meters for the day.
    Distance,
    /// Meters per second.
    Speed,
    /// Heart rate variability in milliseconds.
    HeartRateVariability,
    /// Battery level percentage.
    BatteryLevel,
}

impl MetricKind {
    /// Every metric kind, in a stable order.
    pub const ALL: [MetricKind; 7] = [
        MetricKind::HeartRate,
        MetricKind::Steps,
        MetricKind::Calories,
        MetricKind::Distance,
        MetricKind::Speed,
        MetricKind::HeartRateVariability,
        MetricKind::BatteryLevel,
    ];

    /// Field name used for this metric in records and update events.
    pub fn field_name(&self) -> &'static str {
        match self {
            MetricKind::HeartRate => "heartRate",
            MetricKind::Steps => "steps",
            MetricKind::Calories => "calories",
            MetricKind::Distance => "distance",
            MetricKind::Speed => "speed",
            MetricKind::HeartRateVariability => "heartRateVariability",
            MetricKind::BatteryLevel => "batteryLevel",
        }
    }

    /// Unit of readings for this metric.
    pub fn unit(&self) -> &'static str {
        match self {
            MetricKind::HeartRate => "bpm",
            MetricKind::Steps => "steps",
            MetricKind::Calories => "kcal",
            MetricKind::Distance => "m",
            MetricKind::Speed => "m/s",
            MetricKind::HeartRateVariability => "ms",
            MetricKind::BatteryLevel => "%",
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.field_name())
    }
}

/// One timestamped sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    /// Sampled value.
    pub value: f64,
    /// Unit of `value`.
    pub unit: String,
    /// Sample time in milliseconds since the Unix epoch.
    pub timestamp: u64,
}

impl Reading {
    /// Create a reading for a metric, using the metric's unit.
    pub fn new(kind: MetricKind, value: f64, timestamp: u64) -> Self {
        Self {
            value,
            unit: kind.unit().to_string(),
            timestamp,
        }
    }
}

/// Summary of the most recent sleep session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SleepSummary {
    /// Start of the session, milliseconds since the Unix epoch.
    pub start_time: u64,
    /// End of the session, milliseconds since the Unix epoch.
    pub end_time: u64,
    /// Minutes in deep sleep.
    pub deep_sleep_minutes: u32,
    /// Minutes in REM sleep.
    pub rem_sleep_minutes: u32,
    /// Minutes in light sleep.
    pub light_sleep_minutes: u32,
    /// Minutes awake.
    pub awake_minutes: u32,
    /// Quality score, 0..100.
    pub quality: f64,
}

/// One recorded activity session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivitySession {
    /// Activity type, e.g. "walking".
    #[serde(rename = "type")]
    pub kind: String,
    /// Session length in minutes.
    pub duration_minutes: u32,
    /// Intensity score, 0..100.
    pub intensity: f64,
    /// Energy burned in kilocalories.
    pub calories_burned: u32,
}
