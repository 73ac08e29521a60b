//! SQLite schema introspection.
//!
//! Tables come from `sqlite_master`, columns from `PRAGMA table_info`.

use sqlx::Row;
use sqlx::SqlitePool;

use super::connection::SqliteDriver;
use crate::error::{CogniError, Result};
use crate::services::database::traits::Schema;

const TABLES_QUERY: &str = r#"
    SELECT name AS table_name
    FROM sqlite_master
    WHERE type = 'table'
        AND name NOT LIKE 'sqlite_%'
    ORDER BY name
"#;

impl SqliteDriver {
    pub(crate) async fn introspect_schema(&self, pool: &SqlitePool) -> Result<Schema> {
        let table_rows = sqlx::query(TABLES_QUERY)
            .fetch_all(pool)
            .await
            .map_err(|e| CogniError::query_execution(TABLES_QUERY.trim(), e))?;

        let mut schema = Schema::new();
        for table_row in table_rows {
            let table_name: String = table_row.get("table_name");
            let columns = Self::table_columns(pool, &table_name).await?;
            schema.insert_table(table_name, columns);
        }

        Ok(schema)
    }

    async fn table_columns(pool: &SqlitePool, table: &str) -> Result<Vec<String>> {
        let pragma = format!("PRAGMA table_info(\"{}\")", table.replace('"', "\"\""));
        let rows = sqlx::query(&pragma)
            .fetch_all(pool)
            .await
            .map_err(|e| CogniError::query_execution(pragma.clone(), e))?;

        // table_info rows come back ordered by cid
        Ok(rows.iter().map(|row| row.get::<String, _>("name")).collect())
    }
}
