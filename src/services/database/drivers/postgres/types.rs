//! PostgreSQL type conversion utilities.
//!
//! This module handles conversion between PostgreSQL-specific types (from SQLx)
//! and the generic `Value` type used across all drivers.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::postgres::{PgRow, PgSslMode};
use sqlx::{Column, Decode, Postgres, Row, Type, TypeInfo, ValueRef};
use uuid::Uuid;

use crate::services::database::traits::{Row as DriverRow, SslMode, Value};

/// Converter for PostgreSQL values to the unified `Value` type.
pub struct PgValueConverter;

impl PgValueConverter {
    /// Convert a PostgreSQL row to a driver row.
    pub fn convert_row(pg_row: &PgRow) -> DriverRow {
        let values = pg_row
            .columns()
            .iter()
            .enumerate()
            .map(|(idx, col)| match pg_row.try_get_raw(idx) {
                Ok(raw) if !raw.is_null() => {
                    Self::decode_by_type(pg_row, idx, col.type_info().name())
                }
                _ => Value::Null,
            })
            .collect();
        DriverRow::from_values(values)
    }

    /// Decode a value based on its PostgreSQL type name.
    fn decode_by_type(row: &PgRow, index: usize, type_name: &str) -> Value {
        match type_name {
            "BOOL" => row
                .try_get::<bool, _>(index)
                .map(Value::Bool)
                .unwrap_or(Value::Null),

            "INT2" | "SMALLINT" | "SMALLSERIAL" => row
                .try_get::<i16, _>(index)
                .map(Value::Int16)
                .unwrap_or(Value::Null),

            "INT4" | "INT" | "INTEGER" | "SERIAL" => row
                .try_get::<i32, _>(index)
                .map(Value::Int32)
                .unwrap_or(Value::Null),

            "INT8" | "BIGINT" | "BIGSERIAL" => row
                .try_get::<i64, _>(index)
                .map(Value::Int64)
                .unwrap_or(Value::Null),

            "FLOAT4" | "REAL" => row
                .try_get::<f32, _>(index)
                .map(Value::Float32)
                .unwrap_or(Value::Null),

            "FLOAT8" | "DOUBLE PRECISION" => row
                .try_get::<f64, _>(index)
                .map(Value::Float64)
                .unwrap_or(Value::Null),

            "NUMERIC" | "DECIMAL" => row
                .try_get::<Decimal, _>(index)
                .map(Value::Decimal)
                .unwrap_or(Value::Null),

            "TEXT" | "VARCHAR" | "CHAR" | "BPCHAR" | "NAME" => row
                .try_get::<String, _>(index)
                .map(Value::Text)
                .unwrap_or(Value::Null),

            "BYTEA" => row
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

            "TIMESTAMP" => row
                .try_get::<NaiveDateTime, _>(index)
                .map(Value::DateTime)
                .unwrap_or(Value::Null),

            "TIMESTAMPTZ" => row
                .try_get::<DateTime<Utc>, _>(index)
                .map(Value::DateTimeTz)
                .unwrap_or(Value::Null),

            "UUID" => row
                .try_get::<Uuid, _>(index)
                .map(Value::Uuid)
                .unwrap_or(Value::Null),

            "JSON" | "JSONB" => row
                .try_get::<serde_json::Value, _>(index)
                .map(Value::Json)
                .unwrap_or(Value::Null),

            // Arrays surface as JSON arrays
            "INT4[]" => Self::decode_array::<i32>(row, index),
            "INT8[]" => Self::decode_array::<i64>(row, index),
            "TEXT[]" | "VARCHAR[]" | "NAME[]" => Self::decode_array::<String>(row, index),
            "BOOL[]" => Self::decode_array::<bool>(row, index),
            "FLOAT8[]" => Self::decode_array::<f64>(row, index),

            _ => Self::decode_as_string_fallback(row, index, type_name),
        }
    }

    fn decode_array<T>(row: &PgRow, index: usize) -> Value
    where
        T: Serialize + for<'r> Decode<'r, Postgres> + Type<Postgres>,
        Vec<T>: for<'r> Decode<'r, Postgres> + Type<Postgres>,
    {
        row.try_get::<Vec<T>, _>(index)
            .ok()
            .and_then(|items| serde_json::to_value(items).ok())
            .map(Value::Json)
            .unwrap_or(Value::Null)
    }

    /// Fallback for unknown types: keep a printable representation.
    fn decode_as_string_fallback(row: &PgRow, index: usize, type_name: &str) -> Value {
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

    /// Map the configured SSL mode to PostgreSQL's.
    pub fn map_ssl_mode(mode: SslMode) -> PgSslMode {
        match mode {
            SslMode::Disable => PgSslMode::Disable,
            SslMode::Prefer => PgSslMode::Prefer,
            SslMode::Require => PgSslMode::Require,
        }
    }
}
