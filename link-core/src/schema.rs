//! Per-path record schemas.
//!
//! Battery and health paths have fixed shapes with documented defaults for
//! missing fields. Every other path decodes to a [`GenericRecord`] that
//! keeps all fields with their original tags.

use wearlink_types::{DataItem, Fields, PathKind, Value};

/// Battery record published on the battery path.
#[derive(Debug, Clone, PartialEq)]
pub struct BatteryRecord {
    /// Battery level percentage (default 0).
    pub level: i32,
    /// Status label (default "unknown").
    pub status: String,
    /// Level change since the previous record (default 0.0).
    pub change_rate: f64,
    /// Advice for the wearer (default "").
    pub recommendation: String,
    /// Publish time in milliseconds (defaults to the item timestamp).
    pub timestamp: i64,
}

impl BatteryRecord {
    /// Level at or above which status is "high".
    pub const HIGH_THRESHOLD: i32 = 70;
    /// Level at or above which status is "medium".
    pub const MEDIUM_THRESHOLD: i32 = 30;

    /// Decode from a data item, substituting defaults for absent fields.
    pub fn from_item(item: &DataItem) -> Self {
        let r = FieldReader::new(item);
        Self {
            level: r.int("level", 0),
            status: r.string("status", "unknown"),
            change_rate: r.double("changeRate", 0.0),
            recommendation: r.string("recommendation", ""),
            timestamp: r.long("timestamp", item.timestamp as i64),
        }
    }

    /// Assess a freshly sampled level against the previous one.
    pub fn assess(level: i32, previous: Option<i32>, timestamp: i64) -> Self {
        let status = if level >= Self::HIGH_THRESHOLD {
            "high"
        } else if level >= Self::MEDIUM_THRESHOLD {
            "medium"
        } else {
            "low"
        };
        let recommendation = if status == "low" { "rest" } else { "" };
        Self {
            level,
            status: status.to_string(),
            change_rate: previous.map_or(0.0, |p| f64::from(level - p)),
            recommendation: recommendation.to_string(),
            timestamp,
        }
    }

    /// Fields to publish. The store stamps `timestamp` itself.
    pub fn to_fields(&self) -> Fields {
        let mut fields = Fields::new();
        fields.insert("level".into(), Value::Int(self.level));
        fields.insert("status".into(), Value::String(self.status.clone()));
        fields.insert("changeRate".into(), Value::Double(self.change_rate));
        fields.insert(
            "recommendation".into(),
            Value::String(self.recommendation.clone()),
        );
        fields
    }
}

/// Health record published on the health path.
#[derive(Debug, Clone, PartialEq)]
pub struct HealthRecord {
    /// Beats per minute (default 0).
    pub heart_rate: i32,
    /// Heart rate variability in ms (default 0.0).
    pub hrv: f64,
    /// Step count (default 0).
    pub steps: i32,
    /// Stress score (default 0.0).
    pub stress_level: f64,
    /// Publish time in milliseconds (defaults to the item timestamp).
    pub timestamp: i64,
}

impl HealthRecord {
    /// Decode from a data item, substituting defaults for absent fields.
    pub fn from_item(item: &DataItem) -> Self {
        let r = FieldReader::new(item);
        Self {
            heart_rate: r.int("heartRate", 0),
            hrv: r.double("hrv", 0.0),
            steps: r.int("steps", 0),
            stress_level: r.double("stressLevel", 0.0),
            timestamp: r.long("timestamp", item.timestamp as i64),
        }
    }

    /// Fields to publish. The store stamps `timestamp` itself.
    pub fn to_fields(&self) -> Fields {
        let mut fields = Fields::new();
        fields.insert("heartRate".into(), Value::Int(self.heart_rate));
        fields.insert("hrv".into(), Value::Double(self.hrv));
        fields.insert("steps".into(), Value::Int(self.steps));
        fields.insert("stressLevel".into(), Value::Double(self.stress_level));
        fields
    }
}

/// Record on a path without a fixed schema. All fields are kept.
#[derive(Debug, Clone, PartialEq)]
pub struct GenericRecord {
    /// Source path.
    pub path: String,
    /// Every field, with its original tag.
    pub fields: Fields,
    /// Item publish time.
    pub timestamp: u64,
}

/// A data item translated according to its path.
#[derive(Debug, Clone, PartialEq)]
pub enum SemanticRecord {
    /// Battery path.
    Battery(BatteryRecord),
    /// Health path.
    Health(HealthRecord),
    /// Any other path.
    Generic(GenericRecord),
}

impl SemanticRecord {
    /// Translate a data item by exact path match.
    pub fn decode(item: &DataItem) -> Self {
        match PathKind::of(&item.path) {
            PathKind::Battery => SemanticRecord::Battery(BatteryRecord::from_item(item)),
            PathKind::Health => SemanticRecord::Health(HealthRecord::from_item(item)),
            _ => SemanticRecord::Generic(GenericRecord {
                path: item.path.clone(),
                fields: item.fields.clone(),
                timestamp: item.timestamp,
            }),
        }
    }

    /// Type tag surfaced to listeners: "battery", "health" or "generic".
    pub fn type_name(&self) -> &'static str {
        match self {
            SemanticRecord::Battery(_) => "battery",
            SemanticRecord::Health(_) => "health",
            SemanticRecord::Generic(_) => "generic",
        }
    }
}

/// Lenient typed reads with defaults.
///
/// A present field of an incompatible type reads as the default and is
/// logged at debug level.
struct FieldReader<'a> {
    item: &'a DataItem,
}

impl<'a> FieldReader<'a> {
    fn new(item: &'a DataItem) -> Self {
        Self { item }
    }

    fn read<T>(&self, key: &str, default: T, convert: impl Fn(&Value) -> Option<T>) -> T {
        match self.item.fields.get(key) {
            None => default,
            Some(value) => convert(value).unwrap_or_else(|| {
                tracing::debug!(
                    path = %self.item.path,
                    field = key,
                    found = value.type_name(),
                    "field type mismatch, using default"
                );
                default
            }),
        }
    }

    fn int(&self, key: &str, default: i32) -> i32 {
        self.read(key, default, Value::as_i32)
    }

    fn long(&self, key: &str, default: i64) -> i64 {
        self.read(key, default, Value::as_i64)
    }

    fn double(&self, key: &str, default: f64) -> f64 {
        self.read(key, default, Value::as_f64)
    }

    fn string(&self, key: &str, default: &str) -> String {
        self.read(key, default.to_string(), |v| v.as_str().map(str::to_string))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wearlink_types::{BATTERY_PATH, HEALTH_PATH};

    fn item(path: &str, pairs: &[(&str, Value)]) -> DataItem {
        let fields = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();
        DataItem::new(path, fields, 1_000)
    }

    #[test]
    fn empty_battery_item_yields_defaults() {
        let record = SemanticRecord::decode(&item(BATTERY_PATH, &[]));
        assert_eq!(
            record,
            SemanticRecord::Battery(BatteryRecord {
                level: 0,
                status: "unknown".into(),
                change_rate: 0.0,
                recommendation: "".into(),
                timestamp: 1_000,
            })
        );
        assert_eq!(record.type_name(), "battery");
    }

    #[test]
    fn battery_item_reads_present_fields() {
        let record = BatteryRecord::from_item(&item(
            BATTERY_PATH,
            &[
                ("level", Value::Int(64)),
                ("status", Value::String("medium".into())),
                ("changeRate", Value::Float(-2.0)),
                ("timestamp", Value::Long(42)),
            ],
        ));
        assert_eq!(record.level, 64);
        assert_eq!(record.status, "medium");
        assert_eq!(record.change_rate, -2.0);
        assert_eq!(record.recommendation, "");
        assert_eq!(record.timestamp, 42);
    }

    #[test]
    fn mistyped_field_falls_back_to_default() {
        let record = BatteryRecord::from_item(&item(
            BATTERY_PATH,
            &[("level", Value::String("eighty".into()))],
        ));
        assert_eq!(record.level, 0);
    }

    #[test]
    fn health_item_yields_defaults_and_values() {
        let record = HealthRecord::from_item(&item(
            HEALTH_PATH,
            &[("heartRate", Value::Int(88)), ("steps", Value::Long(12_000))],
        ));
        assert_eq!(record.heart_rate, 88);
        assert_eq!(record.steps, 12_000);
        assert_eq!(record.hrv, 0.0);
        assert_eq!(record.stress_level, 0.0);
        assert_eq!(record.timestamp, 1_000);
    }

    #[test]
    fn unknown_path_keeps_every_field() {
        let source = item(
            "/custom",
            &[
                ("name", Value::String("x".into())),
                ("count", Value::Int(3)),
                ("ratio", Value::Double(0.5)),
                ("flag", Value::Bool(true)),
            ],
        );
        match SemanticRecord::decode(&source) {
            SemanticRecord::Generic(generic) => {
                assert_eq!(generic.path, "/custom");
                assert_eq!(generic.fields, source.fields);
            }
            other => panic!("Expected generic record, got {:?}", other),
        }
    }

    #[test]
    fn assess_labels_levels() {
        assert_eq!(BatteryRecord::assess(85, None, 0).status, "high");
        assert_eq!(BatteryRecord::assess(70, None, 0).status, "high");
        assert_eq!(BatteryRecord::assess(30, None, 0).status, "medium");
        let low = BatteryRecord::assess(12, Some(15), 0);
        assert_eq!(low.status, "low");
        assert_eq!(low.recommendation, "rest");
        assert_eq!(low.change_rate, -3.0);
    }

    #[test]
    fn battery_fields_decode_back_to_record() {
        let record = BatteryRecord::assess(50, Some(52), 7);
        let decoded = BatteryRecord::from_item(&DataItem::new(BATTERY_PATH, record.to_fields(), 7));
        assert_eq!(decoded, record);
    }
}
