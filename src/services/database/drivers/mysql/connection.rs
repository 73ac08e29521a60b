//! MySQL driver implementation.
//!
//! This module implements the `DatabaseDriver` trait for MySQL
//! using SQLx's MySqlPool.

use async_lock::RwLock;
use async_trait::async_trait;
use sqlx::mysql::{MySqlConnectOptions, MySqlConnection, MySqlPoolOptions};
use sqlx::pool::PoolConnection;
use sqlx::{ConnectOptions, Connection, Executor, MySql, MySqlPool, Statement};

use super::types::MySqlValueConverter;
use crate::error::{CogniError, Result};
use crate::services::database::traits::{
    ACQUIRE_TIMEOUT, BackendType, BoxedDriver, ConnectionConfig, ConnectionParams,
    DatabaseDriver, POOL_SIZE, Query, QueryResult, Row, Schema, expect_sql,
    split_statements,
};

/// MySQL driver.
///
/// Wraps a SQLx MySqlPool of `POOL_SIZE` connections.
pub struct MySqlDriver {
    config: ConnectionConfig,
    pool: RwLock<Option<MySqlPool>>,
}

impl std::fmt::Debug for MySqlDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MySqlDriver")
            .field("config", &self.config)
            .field("pool", &"<MySqlPool>")
            .finish()
    }
}

impl MySqlDriver {
    /// Create a new MySQL driver from configuration.
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

    /// Build MySqlConnectOptions from the configuration.
    fn build_connect_options(&self) -> Result<MySqlConnectOptions> {
        match &self.config.params {
            ConnectionParams::Server {
                hostname,
                port,
                username,
                password,
                database,
                ssl_mode,
                ..
            } => Ok(MySqlConnectOptions::new()
                .host(hostname)
                .port(*port)
                .username(username)
                .password(password)
                .database(database)
                .ssl_mode(MySqlValueConverter::map_ssl_mode(*ssl_mode))),
            ConnectionParams::File { .. } | ConnectionParams::InMemory => {
                Err(CogniError::Configuration(
                    "MySQL does not support file-based or in-memory connections".to_string(),
                ))
            }
        }
    }

    /// Get the connection pool, or an error if not connected.
    async fn get_pool(&self) -> Result<MySqlPool> {
        let guard = self.pool.read().await;
        guard.as_ref().cloned().ok_or_else(CogniError::not_connected)
    }

    /// Check a connection out of the pool, waiting while all are in use.
    pub async fn checkout(&self) -> Result<PoolConnection<MySql>> {
        let pool = self.get_pool().await?;
        pool.acquire()
            .await
            .map_err(|e| CogniError::connection("Failed to check out a MySQL connection", e))
    }

    /// Run one statement, capturing rows when the prepared statement
    /// reports result columns.
    async fn run_statement(
        conn: &mut MySqlConnection,
        statement: &str,
    ) -> sqlx::Result<Option<Vec<Row>>> {
        let prepared = (&mut *conn).prepare(statement).await?;
        if prepared.columns().is_empty() {
            prepared.query().execute(&mut *conn).await?;
            Ok(None)
        } else {
            let rows = prepared.query().fetch_all(&mut *conn).await?;
            Ok(Some(rows.iter().map(MySqlValueConverter::convert_row).collect()))
        }
    }

    /// Run `;`-separated statements in one transaction.
    async fn execute_statements(&self, sql: &str, pool: &MySqlPool) -> Result<QueryResult> {
        let mut tx = pool
            .begin()
            .await
            .map_err(|e| CogniError::connection("Failed to begin MySQL transaction", e))?;
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
                        .map_err(|e| CogniError::connection("Failed to begin MySQL transaction", e))?;
                }
                Err(e) => {
                    if let Err(rollback_err) = tx.rollback().await {
                        tracing::warn!("MySQL rollback failed: {}", rollback_err);
                    }
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
impl DatabaseDriver for MySqlDriver {
    fn backend_type(&self) -> BackendType {
        BackendType::MySql
    }

    fn connection_config(&self) -> &ConnectionConfig {
        &self.config
    }

    async fn connect(&mut self) -> Result<()> {
        let options = self.build_connect_options()?;

        // A single direct connection reports unreachable servers and bad
        // credentials right away; the pool connects lazily afterwards.
        let probe = options.connect().await.map_err(|e| {
            CogniError::connection(format!("Failed to connect to MySQL at {}", self.display_name()), e)
        })?;
        if let Err(e) = probe.close().await {
            tracing::debug!("MySQL probe connection close failed: {}", e);
        }

        let pool = MySqlPoolOptions::new()
            .max_connections(POOL_SIZE)
            .acquire_timeout(ACQUIRE_TIMEOUT)
            .connect_lazy_with(options);

        let mut guard = self.pool.write().await;
        *guard = Some(pool);

        tracing::info!("Connected to MySQL at {}", self.display_name());
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
        tracing::info!("MySQL schema fetched: {} tables", schema.len());
        Ok(schema)
    }

    async fn execute_query(&self, query: &Query) -> Result<QueryResult> {
        let sql = expect_sql(query, self.backend_type())?;
        let pool = self.get_pool().await?;
        self.execute_statements(sql, &pool).await
    }
}
