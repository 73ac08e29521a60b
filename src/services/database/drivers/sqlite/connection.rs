//! SQLite driver implementation.
//!
//! This module implements the `DatabaseDriver` trait for SQLite
//! using SQLx's SqlitePool.

use async_lock::RwLock;
use async_trait::async_trait;
use sqlx::pool::PoolConnection;
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection, SqlitePoolOptions};
use sqlx::{ConnectOptions, Connection, Executor, Sqlite, SqlitePool, Statement};
use std::str::FromStr;

use super::types::SqliteValueConverter;
use crate::error::{CogniError, Result};
use crate::services::database::traits::{
    ACQUIRE_TIMEOUT, BackendType, BoxedDriver, ConnectionConfig, ConnectionParams,
    DatabaseDriver, POOL_SIZE, Query, QueryResult, Row, Schema, expect_sql,
    split_statements,
};

/// SQLite driver.
///
/// Wraps a SQLx SqlitePool. SQLite supports both file-based and in-memory
/// databases; an in-memory database lives as long as the pool does.
pub struct SqliteDriver {
    config: ConnectionConfig,
    pool: RwLock<Option<SqlitePool>>,
}

impl std::fmt::Debug for SqliteDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteDriver")
            .field("config", &self.config)
            .field("pool", &"<SqlitePool>")
            .finish()
    }
}

impl SqliteDriver {
    /// Create a new SQLite driver from configuration.
    ///
    /// This does not connect immediately - call `connect()` to open the pool.
    pub fn new(config: ConnectionConfig) -> Self {
        Self {
            config,
            pool: RwLock::new(None),
        }
    }

    /// Create a boxed driver (for factory use).
    pub fn boxed(config: ConnectionConfig) -> BoxedDriver {
        Box::new(Self::new(config))
    }

    /// Build SqliteConnectOptions from the configuration.
    fn build_connect_options(&self) -> Result<SqliteConnectOptions> {
        match &self.config.params {
            ConnectionParams::File { path, read_only } => {
                let options = SqliteConnectOptions::new()
                    .filename(path)
                    .create_if_missing(!read_only)
                    .read_only(*read_only)
                    .foreign_keys(true);
                Ok(options)
            }
            ConnectionParams::InMemory => {
                // Shared cache so every pooled connection sees the same database
                let options = SqliteConnectOptions::from_str(":memory:")
                    .map_err(|e| CogniError::connection("Invalid in-memory SQLite options", e))?
                    .foreign_keys(true)
                    .shared_cache(true);
                Ok(options)
            }
            ConnectionParams::Server { .. } => Err(CogniError::Configuration(
                "SQLite does not support server-based connections. Use File or InMemory params."
                    .to_string(),
            )),
        }
    }

    /// Get the connection pool, or an error if not connected.
    async fn get_pool(&self) -> Result<SqlitePool> {
        let guard = self.pool.read().await;
        guard.as_ref().cloned().ok_or_else(CogniError::not_connected)
    }

    /// Check a connection out of the pool.
    ///
    /// Waits while all `POOL_SIZE` connections are in use.
    pub async fn checkout(&self) -> Result<PoolConnection<Sqlite>> {
        let pool = self.get_pool().await?;
        pool.acquire()
            .await
            .map_err(|e| CogniError::connection("Failed to check out a SQLite connection", e))
    }

    /// Run one statement, capturing rows when the prepared statement
    /// reports result columns.
    async fn run_statement(
        conn: &mut SqliteConnection,
        statement: &str,
    ) -> sqlx::Result<Option<Vec<Row>>> {
        let prepared = (&mut *conn).prepare(statement).await?;
        if prepared.columns().is_empty() {
            prepared.query().execute(&mut *conn).await?;
            Ok(None)
        } else {
            let rows = prepared.query().fetch_all(&mut *conn).await?;
            Ok(Some(rows.iter().map(SqliteValueConverter::convert_row).collect()))
        }
    }

    /// Run `;`-separated statements in one transaction.
    ///
    /// Statements without a result set commit the open transaction; a failure
    /// rolls it back and reports the offending statement.
    async fn execute_statements(&self, sql: &str, pool: &SqlitePool) -> Result<QueryResult> {
        let mut tx = pool
            .begin()
            .await
            .map_err(|e| CogniError::connection("Failed to begin SQLite transaction", e))?;
        let mut result_sets = Vec::new();

        for statement in split_statements(sql) {
            let outcome = Self::run_statement(&mut tx, &statement).await;

            match outcome {
                Ok(Some(rows)) => result_sets.push(rows),
                Ok(None) => {
                    tx.commit()
                        .await
                        .map_err(|e| CogniError::query_execution(statement.clone(), e))?;
                    tx = pool
                        .begin()
                        .await
                        .map_err(|e| CogniError::connection("Failed to begin SQLite transaction", e))?;
                }
                Err(e) => {
                    if let Err(rollback_err) = tx.rollback().await {
                        tracing::warn!("SQLite rollback failed: {}", rollback_err);
                    }
                    tracing::debug!("SQLite statement failed, rolled back: {}", statement);
                    return Err(CogniError::query_execution(statement, e));
                }
            }
        }

        tx.commit()
            .await
            .map_err(|e| CogniError::query_execution(sql, e))?;

        Ok(QueryResult::from_result_sets(result_sets))
    }
}

#[async_trait]
impl DatabaseDriver for SqliteDriver {
    fn backend_type(&self) -> BackendType {
        BackendType::Sqlite
    }

    fn connection_config(&self) -> &ConnectionConfig {
        &self.config
    }

    async fn connect(&mut self) -> Result<()> {
        let options = self.build_connect_options()?;

        // One direct connection surfaces errors immediately; the pool itself
        // waits for free connections instead of timing out.
        let probe = options.connect().await.map_err(|e| {
            CogniError::connection(format!("Failed to open SQLite database {}", self.display_name()), e)
        })?;

        let pool = SqlitePoolOptions::new()
            .max_connections(POOL_SIZE)
            .acquire_timeout(ACQUIRE_TIMEOUT)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_lazy_with(options);

        // Keep one connection alive before the probe closes, so an in-memory
        // database is not dropped in between.
        let keepalive = pool
            .acquire()
            .await
            .map_err(|e| CogniError::connection("Failed to open SQLite pool", e))?;
        if let Err(e) = probe.close().await {
            tracing::debug!("SQLite probe connection close failed: {}", e);
        }
        drop(keepalive);

        let mut guard = self.pool.write().await;
        *guard = Some(pool);

        tracing::info!("Connected to SQLite database {}", self.display_name());
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<()> {
        let mut guard = self.pool.write().await;
        if let Some(pool) = guard.take() {
            pool.close().await;
            Ok(())
        } else {
            Err(CogniError::not_connected())
        }
    }

    async fn is_connected(&self) -> bool {
        let guard = self.pool.read().await;
        if let Some(pool) = guard.as_ref() {
            sqlx::query("SELECT 1").fetch_one(pool).await.is_ok()
        } else {
            false
        }
    }

    async fn fetch_schema(&self) -> Result<Schema> {
        let pool = self.get_pool().await?;
        let schema = self.introspect_schema(&pool).await?;
        tracing::info!("SQLite schema fetched: {} tables", schema.len());
        Ok(schema)
    }

    async fn execute_query(&self, query: &Query) -> Result<QueryResult> {
        let sql = expect_sql(query, self.backend_type())?;
        let pool = self.get_pool().await?;
        self.execute_statements(sql, &pool).await
    }
}
