//! Backend-agnostic row and value types.
//!
//! This module contains:
//! - `Value` - A unified value type that can represent any relational value
//! - `Row` - An ordered row of values, as returned by a result-set statement

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

/// A unified value type covering what the relational drivers decode.
///
/// Serialized untagged so result envelopes carry plain JSON scalars.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    /// NULL value
    Null,
    /// Boolean value (true/false)
    Bool(bool),
    /// 16-bit signed integer
    Int16(i16),
    /// 32-bit signed integer
    Int32(i32),
    /// 64-bit signed integer
    Int64(i64),
    /// 64-bit unsigned integer (MySQL BIGINT UNSIGNED)
    UInt64(u64),
    /// 32-bit floating point
    Float32(f32),
    /// 64-bit floating point
    Float64(f64),
    /// Text/string value
    Text(String),
    /// Binary data
    Bytes(Vec<u8>),
    /// Date without time
    Date(NaiveDate),
    /// Time without date
    Time(NaiveTime),
    /// Date and time without timezone
    DateTime(NaiveDateTime),
    /// Date and time with timezone (stored as UTC)
    DateTimeTz(DateTime<Utc>),
    /// Decimal/numeric with arbitrary precision
    Decimal(Decimal),
    /// UUID
    Uuid(Uuid),
    /// JSON value
    Json(serde_json::Value),
    /// Backend-specific type that doesn't map to a standard type.
    Other {
        /// The backend-specific type name
        type_name: String,
        /// String representation for display
        display: String,
    },
}

impl Value {
    /// Convert this value to a display string
    pub fn to_display_string(&self) -> String {
        match self {
            Value::Null => "NULL".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Int16(v) => v.to_string(),
            Value::Int32(v) => v.to_string(),
            Value::Int64(v) => v.to_string(),
            Value::UInt64(v) => v.to_string(),
            Value::Float32(v) => v.to_string(),
            Value::Float64(v) => v.to_string(),
            Value::Text(s) => s.clone(),
            Value::Bytes(b) => format!("\\x{}", hex::encode(b)),
            Value::Date(d) => d.format("%Y-%m-%d").to_string(),
            Value::Time(t) => t.format("%H:%M:%S%.f").to_string(),
            Value::DateTime(dt) => dt.format("%Y-%m-%d %H:%M:%S%.f").to_string(),
            Value::DateTimeTz(dt) => dt.format("%Y-%m-%d %H:%M:%S%.f %Z").to_string(),
            Value::Decimal(d) => d.to_string(),
            Value::Uuid(u) => u.to_string(),
            Value::Json(j) => j.to_string(),
            Value::Other { display, .. } => display.clone(),
        }
    }
}

/// A row from a result set: values in column order, like a driver tuple.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Row {
    values: Vec<Value>,
}

impl Row {
    pub fn from_values(values: Vec<Value>) -> Self {
        Self { values }
    }

    /// Values joined for terminal output.
    pub fn to_display_string(&self) -> String {
        let items: Vec<String> = self.values.iter().map(Value::to_display_string).collect();
        format!("({})", items.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_display_string() {
        assert_eq!(Value::Null.to_display_string(), "NULL");
        assert_eq!(Value::Bool(false).to_display_string(), "false");
        assert_eq!(Value::Int64(-123).to_display_string(), "-123");
        assert_eq!(Value::Text("hello".into()).to_display_string(), "hello");
        assert_eq!(
            Value::Bytes(vec![0xDE, 0xAD, 0xBE, 0xEF]).to_display_string(),
            "\\xdeadbeef"
        );
    }

    #[test]
    fn test_row_serializes_as_plain_array() {
        let row = Row::from_values(vec![Value::Int64(1), Value::Text("ada".into()), Value::Null]);
        assert_eq!(serde_json::to_string(&row).unwrap(), r#"[1,"ada",null]"#);
        assert_eq!(row.to_display_string(), "(1, ada, NULL)");
    }
}
