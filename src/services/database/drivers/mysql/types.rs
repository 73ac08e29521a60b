//! MySQL type conversion utilities.
//!
//! This module handles conversion between MySQL-specific types (from SQLx)
//! and the generic `Value` type used across all drivers.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use sqlx::mysql::{MySqlRow, MySqlSslMode};
use sqlx::{Column, Row, TypeInfo, ValueRef};

use crate::services::database::traits::{Row as DriverRow, SslMode, Value};

/// Converter for MySQL values to the unified `Value` type.
pub struct MySqlValueConverter;

impl MySqlValueConverter {
    /// Convert a MySQL row to a driver row.
    pub fn convert_row(mysql_row: &MySqlRow) -> DriverRow {
        let values = mysql_row
            .columns()
            .iter()
            .enumerate()
            .map(|(idx, col)| {
                if matches!(mysql_row.try_get_raw(idx), Ok(raw) if !raw.is_null()) {
                    Self::decode_by_type(mysql_row, idx, col.type_info().name())
                } else {
                    Value::Null
                }
            })
            .collect();
        DriverRow::from_values(values)
    }

    /// Decode a value based on its MySQL type name.
    fn decode_by_type(row: &MySqlRow, index: usize, type_name: &str) -> Value {
        match type_name {
            // TINYINT(1) is reported as BOOLEAN
            "BOOLEAN" | "BOOL" => row
                .try_get::<bool, _>(index)
                .map(Value::Bool)
                .unwrap_or(Value::Null),

            "TINYINT" => row
                .try_get::<i8, _>(index)
                .map(|v| Value::Int16(v as i16))
                .unwrap_or(Value::Null),

            "TINYINT UNSIGNED" => row
                .try_get::<u8, _>(index)
                .map(|v| Value::Int16(v as i16))
                .unwrap_or(Value::Null),

            "SMALLINT" | "YEAR" => row
                .try_get::<i16, _>(index)
                .map(Value::Int16)
                .or_else(|_| row.try_get::<u16, _>(index).map(|v| Value::Int32(v as i32)))
                .unwrap_or(Value::Null),

            "SMALLINT UNSIGNED" => row
                .try_get::<u16, _>(index)
                .map(|v| Value::Int32(v as i32))
                .unwrap_or(Value::Null),

            "MEDIUMINT" | "INT" | "INTEGER" => row
                .try_get::<i32, _>(index)
                .map(Value::Int32)
                .unwrap_or(Value::Null),

            "MEDIUMINT UNSIGNED" | "INT UNSIGNED" | "INTEGER UNSIGNED" => row
                .try_get::<u32, _>(index)
                .map(|v| Value::Int64(v as i64))
                .unwrap_or(Value::Null),

            "BIGINT" => row
                .try_get::<i64, _>(index)
                .map(Value::Int64)
                .unwrap_or(Value::Null),

            "BIGINT UNSIGNED" => row
                .try_get::<u64, _>(index)
                .map(Value::UInt64)
                .unwrap_or(Value::Null),

            "FLOAT" => row
                .try_get::<f32, _>(index)
                .map(Value::Float32)
                .unwrap_or(Value::Null),

            "DOUBLE" | "DOUBLE PRECISION" | "REAL" => row
                .try_get::<f64, _>(index)
                .map(Value::Float64)
                .unwrap_or(Value::Null),

            "DECIMAL" | "NUMERIC" | "DEC" | "FIXED" => row
                .try_get::<Decimal, _>(index)
                .map(Value::Decimal)
                .unwrap_or(Value::Null),

            "CHAR" | "VARCHAR" | "TINYTEXT" | "TEXT" | "MEDIUMTEXT" | "LONGTEXT" | "ENUM"
            | "SET" => row
                .try_get::<String, _>(index)
                .map(Value::Text)
                .unwrap_or(Value::Null),

            "BINARY" | "VARBINARY" | "TINYBLOB" | "BLOB" | "MEDIUMBLOB" | "LONGBLOB" | "BIT" => row
                .try_get::<Vec<u8>, _>(index)
                .map(Value::Bytes)
                .unwrap_or(Value::Null),

            "DATE" => row
                .try_get::<NaiveDate, _>(index)
                .map(Value::Date)
                .unwrap_or(Value::Null),

            "TIME" => row
                .try_get::<NaiveTime, _>(index)
                .map(Value::Time)
                .unwrap_or(Value::Null),

            "DATETIME" => row
                .try_get::<NaiveDateTime, _>(index)
                .map(Value::DateTime)
                .unwrap_or(Value::Null),

            "TIMESTAMP" => row
                .try_get::<DateTime<Utc>, _>(index)
                .map(Value::DateTimeTz)
                .or_else(|_| row.try_get::<NaiveDateTime, _>(index).map(Value::DateTime))
                .unwrap_or(Value::Null),

            "JSON" => row
                .try_get::<serde_json::Value, _>(index)
                .map(Value::Json)
                .unwrap_or(Value::Null),

            _ => Self::decode_as_string_fallback(row, index, type_name),
        }
    }

    /// Fallback for unknown types: keep a printable representation.
    fn decode_as_string_fallback(row: &MySqlRow, index: usize, type_name: &str) -> Value {
        let display = row
            .try_get::<String, _>(index)
            .or_else(|_| row.try_get::<i64, _>(index).map(|v| v.to_string()))
            .or_else(|_| row.try_get::<f64, _>(index).map(|v| v.to_string()))
            .unwrap_or_else(|_| "<unknown>".to_string());

        Value::Other {
            type_name: type_name.to_string(),
            display,
        }
    }

    /// Map the configured SSL mode to MySQL's.
    pub fn map_ssl_mode(mode: SslMode) -> MySqlSslMode {
        match mode {
            SslMode::Disable => MySqlSslMode::Disabled,
            SslMode::Prefer => MySqlSslMode::Preferred,
            SslMode::Require => MySqlSslMode::Required,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ssl_mode_mapping() {
        assert!(matches!(
            MySqlValueConverter::map_ssl_mode(SslMode::Disable),
            MySqlSslMode::Disabled
        ));
        assert!(matches!(
            MySqlValueConverter::map_ssl_mode(SslMode::Prefer),
            MySqlSslMode::Preferred
        ));
        assert!(matches!(
            MySqlValueConverter::map_ssl_mode(SslMode::Require),
            MySqlSslMode::Required
        ));
    }
}
