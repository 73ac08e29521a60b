//! MySQL schema introspection.
//!
//! Reads tables and their columns for the current database from
//! `information_schema`.

use sqlx::MySqlPool;
use sqlx::Row;

use super::connection::MySqlDriver;
use crate::error::{CogniError, Result};
use crate::services::database::traits::Schema;

// information_schema columns are cast so they decode as text on MySQL 8
const TABLES_QUERY: &str = r#"
    SELECT CAST(TABLE_NAME AS CHAR) AS table_name
    FROM information_schema.TABLES
    WHERE TABLE_SCHEMA = DATABASE()
    ORDER BY TABLE_NAME
"#;

const COLUMNS_QUERY: &str = r#"
    SELECT
        CAST(TABLE_NAME AS CHAR) AS table_name,
        CAST(COLUMN_NAME AS CHAR) AS column_name
    FROM information_schema.COLUMNS
    WHERE TABLE_SCHEMA = DATABASE()
    ORDER BY TABLE_NAME, ORDINAL_POSITION
"#;

impl MySqlDriver {
    pub(crate) async fn introspect_schema(&self, pool: &MySqlPool) -> Result<Schema> {
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
            let column: String = row.get("column_name");
            schema.push_column(table, column);
        }

        Ok(schema)
    }
}
