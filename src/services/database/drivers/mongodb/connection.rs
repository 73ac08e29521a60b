//! MongoDB driver implementation.
//!
//! The driver uses the synchronous `mongodb` client and runs every call
//! inside `smol::unblock`, so it fits the same async trait as the SQLx drivers.

use async_lock::RwLock;
use async_trait::async_trait;
use mongodb::bson::{Document, doc};
use mongodb::options::FindOptions;
use mongodb::sync::{Client, Database};
use serde_json::Value as JsonValue;
use url::Url;

use super::types::{document_to_json, filter_document, id_to_string, json_to_document};
use crate::error::{CogniError, Result};
use crate::services::database::traits::{
    BackendType, BoxedDriver, ConnectionConfig, ConnectionParams, DatabaseDriver, Operation,
    OperationKind, Query, QueryResult, Schema, SslMode, WriteSummary, expect_operation,
};

/// MongoDB driver.
///
/// Holds one database handle; the underlying client keeps its own pool.
pub struct MongoDriver {
    config: ConnectionConfig,
    database: RwLock<Option<Database>>,
}

impl std::fmt::Debug for MongoDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MongoDriver")
            .field("config", &self.config)
            .field("database", &"<Database>")
            .finish()
    }
}

impl MongoDriver {
    /// Create a new MongoDB driver from configuration.
    pub fn new(config: ConnectionConfig) -> Self {
        Self {
            config,
            database: RwLock::new(None),
        }
    }

    /// Create a boxed driver (for factory use).
    pub fn boxed(config: ConnectionConfig) -> BoxedDriver {
        Box::new(Self::new(config))
    }

    /// Build the connection URI and database name from the configuration.
    ///
    /// Credentials are percent-encoded; `extra_options` become URI options.
    fn build_uri(&self) -> Result<(String, String)> {
        let ConnectionParams::Server {
            hostname,
            port,
            username,
            password,
            database,
            ssl_mode,
            extra_options,
        } = &self.config.params
        else {
            return Err(CogniError::Configuration(
                "MongoDB does not support file-based or in-memory connections".to_string(),
            ));
        };

        let mut url = Url::parse(&format!("mongodb://{}:{}/", hostname, port))
            .map_err(|e| CogniError::Configuration(format!("Invalid MongoDB host {}: {}", hostname, e)))?;

        if !username.is_empty() {
            url.set_username(username)
                .and_then(|_| url.set_password(Some(password)))
                .map_err(|_| {
                    CogniError::Configuration("MongoDB URI cannot carry credentials".to_string())
                })?;
        }

        let mut pairs: Vec<(&str, &str)> = extra_options
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        pairs.sort();
        match ssl_mode {
            SslMode::Disable => pairs.push(("tls", "false")),
            SslMode::Require => pairs.push(("tls", "true")),
            SslMode::Prefer => {}
        }
        if !pairs.is_empty() {
            url.query_pairs_mut().extend_pairs(pairs);
        }

        Ok((url.to_string(), database.clone()))
    }

    /// Get the database handle, or an error if not connected.
    async fn get_database(&self) -> Result<Database> {
        let guard = self.database.read().await;
        guard.as_ref().cloned().ok_or_else(CogniError::not_connected)
    }

    /// Dispatch one operation against the database. Blocking.
    fn run_operation(db: &Database, op: &Operation) -> Result<QueryResult> {
        let kind = op.kind()?;
        let collection = db.collection::<Document>(&op.collection);
        let fail = |e: String| CogniError::query_execution(op.to_json(), e);
        let filter = filter_document(op.filter.as_ref()).map_err(fail)?;

        match kind {
            OperationKind::ReadOne => {
                let found = collection
                    .find_one(filter, None)
                    .map_err(|e| fail(e.to_string()))?;
                Ok(QueryResult::Document(found.map(document_to_json)))
            }
            OperationKind::ReadMany => {
                let mut options = FindOptions::default();
                options.limit = find_limit(op.limit);
                let cursor = collection
                    .find(filter, options)
                    .map_err(|e| fail(e.to_string()))?;
                let documents = cursor
                    .map(|doc| doc.map(document_to_json))
                    .collect::<std::result::Result<Vec<JsonValue>, _>>()
                    .map_err(|e| fail(e.to_string()))?;
                Ok(QueryResult::Documents(documents))
            }
            OperationKind::Insert => {
                let document = json_to_document(op.require_document()?).map_err(fail)?;
                let inserted = collection
                    .insert_one(document, None)
                    .map_err(|e| fail(e.to_string()))?;
                Ok(QueryResult::Written(WriteSummary::inserted(id_to_string(
                    &inserted.inserted_id,
                ))))
            }
            OperationKind::Update => {
                let update = json_to_document(op.require_update()?).map_err(fail)?;
                let updated = collection
                    .update_one(filter, update, None)
                    .map_err(|e| fail(e.to_string()))?;
                Ok(QueryResult::Written(WriteSummary::updated(
                    updated.matched_count,
                    updated.modified_count,
                )))
            }
            OperationKind::Delete => {
                let deleted = collection
                    .delete_one(filter, None)
                    .map_err(|e| fail(e.to_string()))?;
                Ok(QueryResult::Written(WriteSummary::deleted(deleted.deleted_count)))
            }
        }
    }

    /// Sample one document per collection. Blocking.
    fn sample_schema(db: &Database) -> Result<Schema> {
        let names = db
            .list_collection_names(None)
            .map_err(|e| CogniError::query_execution("listCollections", e))?;

        let mut schema = Schema::new();
        for name in names {
            let sample = db
                .collection::<Document>(&name)
                .find_one(None, None)
                .map_err(|e| CogniError::query_execution(format!("{}.findOne()", name), e))?;
            let fields = sample
                .map(|doc| doc.keys().cloned().collect())
                .unwrap_or_default();
            schema.insert_table(name, fields);
        }
        Ok(schema)
    }
}

#[async_trait]
impl DatabaseDriver for MongoDriver {
    fn backend_type(&self) -> BackendType {
        BackendType::MongoDb
    }

    fn connection_config(&self) -> &ConnectionConfig {
        &self.config
    }

    async fn connect(&mut self) -> Result<()> {
        let (uri, name) = self.build_uri()?;
        let target = self.display_name();

        let database = smol::unblock(move || -> Result<Database> {
            let client = Client::with_uri_str(&uri).map_err(|e| {
                CogniError::connection(format!("Failed to connect to MongoDB at {}", target), e)
            })?;
            let database = client.database(&name);
            database.run_command(doc! { "ping": 1 }, None).map_err(|e| {
                CogniError::connection(format!("MongoDB at {} did not answer ping", target), e)
            })?;
            Ok(database)
        })
        .await?;

        let mut guard = self.database.write().await;
        *guard = Some(database);

        tracing::info!("Connected to MongoDB at {}", self.display_name());
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<()> {
        let mut guard = self.database.write().await;
        guard.take().map(|_| ()).ok_or_else(CogniError::not_connected)
    }

    async fn is_connected(&self) -> bool {
        let Ok(db) = self.get_database().await else {
            return false;
        };
        smol::unblock(move || db.run_command(doc! { "ping": 1 }, None).is_ok()).await
    }

    async fn fetch_schema(&self) -> Result<Schema> {
        let db = self.get_database().await?;
        let schema = smol::unblock(move || Self::sample_schema(&db)).await?;
        tracing::info!("MongoDB schema fetched: {} collections", schema.len());
        Ok(schema)
    }

    async fn execute_query(&self, query: &Query) -> Result<QueryResult> {
        let op = expect_operation(query, self.backend_type())?.clone();
        // Unknown operation names fail before any round trip
        let kind = op.kind()?;
        let db = self.get_database().await?;

        tracing::debug!("MongoDB {} on {}", kind.as_str(), op.collection);
        smol::unblock(move || Self::run_operation(&db, &op)).await
    }
}

/// Read-many limit as the driver expects it. Out-of-range values mean no
/// limit, since a negative one would switch the server to single-batch mode.
fn find_limit(limit: Option<usize>) -> Option<i64> {
    limit.and_then(|l| i64::try_from(l).ok())
}
