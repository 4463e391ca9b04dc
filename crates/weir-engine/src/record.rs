use crate::error::TrackError;
use serde_json::Value;

/// A unit of data submitted for one stream
///
/// Covers the two accepted input shapes: raw text passes through to the wire
/// unchanged, structured values are rendered to JSON text at track time.
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    /// Already-serialized text, forwarded as-is
    Text(String),

    /// Structured value, serialized to JSON before accumulation
    Json(Value),
}

impl Record {
    /// Create a text record
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }

    /// Create a structured record
    pub fn json(value: Value) -> Self {
        Self::Json(value)
    }

    /// Whether the record carries no data
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Text(s) => s.is_empty(),
            Self::Json(value) => match value {
                Value::Null => true,
                Value::String(s) => s.is_empty(),
                Value::Array(items) => items.is_empty(),
                Value::Object(fields) => fields.is_empty(),
                _ => false,
            },
        }
    }

    /// Render the record to its wire text form
    pub fn into_wire(self) -> Result<String, TrackError> {
        match self {
            Self::Text(s) => Ok(s),
            Self::Json(value) => Ok(serde_json::to_string(&value)?),
        }
    }
}

impl From<String> for Record {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<&str> for Record {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<Value> for Record {
    fn from(value: Value) -> Self {
        Self::Json(value)
    }
}
