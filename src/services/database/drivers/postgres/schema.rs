//! PostgreSQL schema introspection.
//!
//! Covers the `public` schema. Identifier columns in `information_schema`
//! are domain types, so they are cast to `text` before decoding.

use sqlx::PgPool;
use sqlx::Row;

use super::connection::PgDriver;
use crate::error::{CogniError, Result};
use crate::services::database::traits::Schema;

const TABLES_QUERY: &str = r#"
    SELECT table_name::text AS table_name
    FROM information_schema.tables
    WHERE table_schema = 'public'
        AND table_type IN ('BASE TABLE', 'VIEW')
    ORDER BY table_name
"#;

const COLUMNS_QUERY: &str = r#"
    SELECT
        table_name::text AS table_name,
        column_name::text AS column_name
    FROM information_schema.columns
    WHERE table_schema = 'public'
    ORDER BY table_name, ordinal_position
"#;

impl PgDriver {
    pub(crate) async fn introspect_schema(&self, pool: &PgPool) -> Result<Schema> {
        let table_rows = sqlx::query(TABLES_QUERY)
            .fetch_all(pool)
            .await
            .map_err(|e| CogniError::query_execution(TABLES_QUERY.trim(), e))?;

        let mut schema: Schema = table_rows
            .iter()
            .map(|row| (row.get::<String, _>("table_name"), Vec::new()))
            .collect();

        let column_rows = sqlx::query(COLUMNS_QUERY)
            .fetch_all(pool)
            .await
            .map_err(|e| CogniError::query_execution(COLUMNS_QUERY.trim(), e))?;

        for row in column_rows {
            let table: String = row.get("table_name");
            if schema.contains_table(&table) {
                schema.push_column(table, row.get::<String, _>("column_name"));
            }
        }

        Ok(schema)
    }
}
