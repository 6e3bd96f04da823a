//! Field values carried by data items.
//!
//! Records replicated between devices are flat maps of field name to a
//! closed set of scalar types. [`Value`] is that closed set; [`Fields`] is
//! the map.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::WireError;

/// Field name to value mapping of a data item.
pub type Fields = BTreeMap<String, Value>;

/// A single typed field value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum Value {
    /// 32-bit integer.
    Int(i32),
    /// 64-bit integer.
    Long(i64),
    /// 64-bit float.
    Double(f64),
    /// 32-bit float.
    Float(f32),
    /// UTF-8 string.
    String(String),
    /// Boolean.
    Bool(bool),
}

impl Value {
    /// Name of the variant, for log lines.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "int",
            Value::Long(_) => "long",
            Value::Double(_) => "double",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Bool(_) => "bool",
        }
    }

    /// Read as a 32-bit integer. Accepts a `Long` that fits.
    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Value::Int(v) => Some(*v),
            Value::Long(v) => i32::try_from(*v).ok(),
            _ => None,
        }
    }

    /// Read as a 64-bit integer. Accepts an `Int`.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(i64::from(*v)),
            Value::Long(v) => Some(*v),
            _ => None,
        }
    }

    /// Read as a 64-bit float. Accepts any numeric variant.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Double(v) => Some(*v),
            Value::Float(v) => Some(f64::from(*v)),
            Value::Int(v) => Some(f64::from(*v)),
            Value::Long(v) => Some(*v as f64),
            _ => None,
        }
    }

    /// Read as a string slice.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(v) => Some(v),
            _ => None,
        }
    }

    /// Read as a boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Convert a JSON scalar into a field value.
    ///
    /// Integers that fit 32 bits become `Int`, wider ones `Long`, other
    /// numbers `Double`. Arrays and objects are kept as their JSON text.
    /// Returns `None` for `null`.
    pub fn from_json(json: &serde_json::Value) -> Option<Self> {
        match json {
            serde_json::Value::Null => None,
            serde_json::Value::Bool(b) => Some(Value::Bool(*b)),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Some(match i32::try_from(i) {
                        Ok(small) => Value::Int(small),
                        Err(_) => Value::Long(i),
                    })
                } else {
                    n.as_f64().map(Value::Double)
                }
            }
            serde_json::Value::String(s) => Some(Value::String(s.clone())),
            nested @ (serde_json::Value::Array(_) | serde_json::Value::Object(_)) => {
                Some(Value::String(nested.to_string()))
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{}", v),
            Value::Long(v) => write!(f, "{}", v),
            Value::Double(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
            Value::String(v) => f.write_str(v),
            Value::Bool(v) => write!(f, "{}", v),
        }
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Long(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Double(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

/// Result of parsing a JSON object into [`Fields`].
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedFields {
    /// Converted fields.
    pub fields: Fields,
    /// Keys whose value was `null` and therefore not stored.
    pub skipped: Vec<String>,
}

/// Parse JSON object text into fields.
///
/// Fails if the text is not valid JSON or is not an object.
pub fn fields_from_json(text: &str) -> Result<ParsedFields, WireError> {
    let json: serde_json::Value =
        serde_json::from_str(text).map_err(|e| WireError::InvalidData(e.to_string()))?;
    let object = match json {
        serde_json::Value::Object(map) => map,
        other => {
            return Err(WireError::InvalidData(format!(
                "expected a JSON object, got {}",
                json_kind(&other)
            )))
        }
    };

    let mut fields = Fields::new();
    let mut skipped = Vec::new();
    for (key, value) in &object {
        match Value::from_json(value) {
            Some(v) => {
                fields.insert(key.clone(), v);
            }
            None => skipped.push(key.clone()),
        }
    }
    Ok(ParsedFields { fields, skipped })
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
