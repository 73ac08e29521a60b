//! SQLite type conversion utilities.
//!
//! SQLite uses dynamic typing with type affinity, so values are decoded from
//! the declared column type when there is one and from the stored value's
//! runtime type otherwise (expressions such as `SELECT 1` have no declared type).

use sqlx::sqlite::SqliteRow;
use sqlx::{Column, Row, TypeInfo, ValueRef};

use crate::services::database::traits::{Row as DriverRow, Value};

/// Converter for SQLite values to the unified `Value` type.
pub struct SqliteValueConverter;

impl SqliteValueConverter {
    /// Convert a SQLite row to a driver row.
    pub fn convert_row(sqlite_row: &SqliteRow) -> DriverRow {
        let values = (0..sqlite_row.columns().len())
            .map(|idx| Self::extract_value(sqlite_row, idx))
            .collect();
        DriverRow::from_values(values)
    }

    /// Extract a value from a SQLite row at the given column index.
    fn extract_value(row: &SqliteRow, index: usize) -> Value {
        let runtime_type = match row.try_get_raw(index) {
            Ok(raw) if raw.is_null() => return Value::Null,
            Ok(raw) => raw.type_info().name().to_uppercase(),
            Err(_) => return Value::Null,
        };

        let declared = row.columns()[index].type_info().name().to_uppercase();
        let type_name = if declared.is_empty() || declared == "NULL" {
            runtime_type
        } else {
            declared
        };
        Self::decode_by_type(row, index, &type_name)
    }

    /// Decode a value based on its SQLite type name.
    fn decode_by_type(row: &SqliteRow, index: usize, type_name: &str) -> Value {
        match type_name {
            "INTEGER" | "INT" | "TINYINT" | "SMALLINT" | "MEDIUMINT" | "BIGINT" | "INT2"
            | "INT8" => row
                .try_get::<i64, _>(index)
                .map(Value::Int64)
                .unwrap_or_else(|_| Self::decode_unknown(row, index, type_name)),

            // SQLite stores booleans as 0/1
            "BOOLEAN" | "BOOL" => row
                .try_get::<bool, _>(index)
                .map(Value::Bool)
                .or_else(|_| row.try_get::<i64, _>(index).map(|v| Value::Bool(v != 0)))
                .unwrap_or(Value::Null),

            "REAL" | "DOUBLE" | "DOUBLE PRECISION" | "FLOAT" => row
                .try_get::<f64, _>(index)
                .map(Value::Float64)
                .unwrap_or_else(|_| Self::decode_unknown(row, index, type_name)),

            "TEXT" | "VARCHAR" | "NVARCHAR" | "CLOB" | "CHAR" | "CHARACTER" => row
                .try_get::<String, _>(index)
                .map(Value::Text)
                .unwrap_or_else(|_| Self::decode_unknown(row, index, type_name)),

            "BLOB" => row
                .try_get::<Vec<u8>, _>(index)
                .map(Value::Bytes)
                .unwrap_or(Value::Null),

            "DATETIME" | "TIMESTAMP" => Self::decode_datetime(row, index),

            "NUMERIC" | "DECIMAL" => Self::decode_numeric(row, index),

            _ => Self::decode_unknown(row, index, type_name),
        }
    }

    /// Decode a DATETIME value stored as ISO-8601 text, falling back to the text itself.
    fn decode_datetime(row: &SqliteRow, index: usize) -> Value {
        if let Ok(s) = row.try_get::<String, _>(index) {
            for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
                if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(&s, format) {
                    return Value::DateTime(dt);
                }
            }
            return Value::Text(s);
        }

        if let Ok(timestamp) = row.try_get::<i64, _>(index) {
            if let Some(dt) = chrono::DateTime::from_timestamp(timestamp, 0) {
                return Value::DateTimeTz(dt);
            }
        }

        Value::Null
    }

    /// Decode a NUMERIC/DECIMAL value.
    fn decode_numeric(row: &SqliteRow, index: usize) -> Value {
        if let Ok(i) = row.try_get::<i64, _>(index) {
            return Value::Int64(i);
        }

        if let Ok(s) = row.try_get::<String, _>(index) {
            return s
                .parse::<rust_decimal::Decimal>()
                .map(Value::Decimal)
                .unwrap_or(Value::Text(s));
        }

        row.try_get::<f64, _>(index)
            .map(Value::Float64)
            .unwrap_or(Value::Null)
    }

    /// Decode an unknown type by trying common paths.
    fn decode_unknown(row: &SqliteRow, index: usize, type_name: &str) -> Value {
        if let Ok(v) = row.try_get::<i64, _>(index) {
            return Value::Int64(v);
        }

        if let Ok(v) = row.try_get::<f64, _>(index) {
            return Value::Float64(v);
        }

        if let Ok(v) = row.try_get::<String, _>(index) {
            return Value::Text(v);
        }

        if let Ok(v) = row.try_get::<Vec<u8>, _>(index) {
            return Value::Bytes(v);
        }

        Value::Other {
            type_name: type_name.to_string(),
            display: "<unknown>".to_string(),
        }
    }
}
