//! RocksDB driver implementation.
//!
//! Tables are column families and items are JSON objects stored under a
//! string key. RocksDB is synchronous, so every call runs in `smol::unblock`.

use async_lock::RwLock;
use async_trait::async_trait;
use rocksdb::{BoundColumnFamily, DB, Direction, IteratorMode, Options};
use serde_json::{Map, Value as JsonValue};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{CogniError, Result};
use crate::services::database::traits::{
    BackendType, BoxedDriver, ConnectionConfig, ConnectionParams, DatabaseDriver, Operation,
    OperationKind, Query, QueryResult, Schema, WriteSummary, expect_operation,
};

const DEFAULT_CF: &str = "default";

/// RocksDB key-value driver.
pub struct RocksDriver {
    config: ConnectionConfig,
    db: RwLock<Option<Arc<DB>>>,
}

impl std::fmt::Debug for RocksDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RocksDriver")
            .field("config", &self.config)
            .field("db", &"<DB>")
            .finish()
    }
}

impl RocksDriver {
    /// Create a new RocksDB driver from configuration.
    pub fn new(config: ConnectionConfig) -> Self {
        Self {
            config,
            db: RwLock::new(None),
        }
    }

    /// Create a boxed driver (for factory use).
    pub fn boxed(config: ConnectionConfig) -> BoxedDriver {
        Box::new(Self::new(config))
    }

    fn db_path(&self) -> Result<(PathBuf, bool)> {
        match &self.config.params {
            ConnectionParams::File { path, read_only } => Ok((path.clone(), *read_only)),
            _ => Err(CogniError::Configuration(
                "RocksDB requires a database directory".to_string(),
            )),
        }
    }

    /// Open the database with every column family already on disk.
    fn open(path: &Path, read_only: bool) -> Result<DB> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cfs = DB::list_cf(&opts, path).unwrap_or_else(|_| vec![DEFAULT_CF.to_string()]);

        let opened = if read_only {
            DB::open_cf_for_read_only(&opts, path, &cfs, false)
        } else {
            DB::open_cf(&opts, path, &cfs)
        };
        opened.map_err(|e| {
            CogniError::connection(format!("Failed to open RocksDB at {}", path.display()), e)
        })
    }

    async fn get_db(&self) -> Result<Arc<DB>> {
        let guard = self.db.read().await;
        guard.as_ref().cloned().ok_or_else(CogniError::not_connected)
    }

    /// Table names, excluding the built-in default column family. Blocking.
    fn list_tables(db: &DB) -> Result<Vec<String>> {
        let names = DB::list_cf(&Options::default(), db.path())
            .map_err(|e| CogniError::query_execution("list column families", e))?;
        Ok(names.into_iter().filter(|n| n != DEFAULT_CF).collect())
    }

    /// Dispatch one operation against the store. Blocking.
    fn run_operation(db: &DB, op: &Operation) -> Result<QueryResult> {
        let kind = op.kind()?;
        let fail = |e: String| CogniError::query_execution(op.to_json(), e);

        let existing = || {
            db.cf_handle(&op.collection)
                .ok_or_else(|| fail(format!("table `{}` does not exist", op.collection)))
        };

        match kind {
            OperationKind::Insert => {
                let document = op.require_document()?;
                if !document.is_object() {
                    return Err(fail("item must be a JSON object".to_string()));
                }
                let key = match &op.key {
                    Some(key) => key.clone(),
                    None => item_id(document).ok_or_else(|| {
                        fail("`put_item` requires a `key` or an `id` field".to_string())
                    })?,
                };
                let cf = Self::table_or_create(db, &op.collection).map_err(fail)?;
                let bytes = serde_json::to_vec(document).map_err(|e| fail(e.to_string()))?;
                db.put_cf(&cf, key.as_bytes(), bytes)
                    .map_err(|e| fail(e.to_string()))?;
                Ok(QueryResult::Written(WriteSummary::inserted(key)))
            }
            OperationKind::ReadOne => {
                let cf = existing()?;
                let key = op.require_key()?;
                let item = Self::read_item(db, &cf, key).map_err(fail)?;
                Ok(QueryResult::Document(item))
            }
            OperationKind::ReadMany => {
                let cf = existing()?;
                let items = Self::scan(db, &cf, op).map_err(fail)?;
                Ok(QueryResult::Documents(items))
            }
            OperationKind::Update => {
                let cf = existing()?;
                let key = op.require_key()?;
                let update = op.require_update()?;
                let changes = update
                    .get("$set")
                    .unwrap_or(update)
                    .as_object()
                    .ok_or_else(|| fail("update must be a JSON object".to_string()))?;

                let Some(mut item) = Self::read_item(db, &cf, key).map_err(fail)? else {
                    return Ok(QueryResult::Written(WriteSummary::updated(0, 0)));
                };
                let before = item.clone();
                if let Some(fields) = item.as_object_mut() {
                    for (field, value) in changes {
                        fields.insert(field.clone(), value.clone());
                    }
                }
                let modified = u64::from(item != before);
                if modified > 0 {
                    let bytes = serde_json::to_vec(&item).map_err(|e| fail(e.to_string()))?;
                    db.put_cf(&cf, key.as_bytes(), bytes)
                        .map_err(|e| fail(e.to_string()))?;
                }
                Ok(QueryResult::Written(WriteSummary::updated(1, modified)))
            }
            OperationKind::Delete => {
                let cf = existing()?;
                let key = op.require_key()?;
                let existed = db
                    .get_pinned_cf(&cf, key.as_bytes())
                    .map_err(|e| fail(e.to_string()))?
                    .is_some();
                if existed {
                    db.delete_cf(&cf, key.as_bytes())
                        .map_err(|e| fail(e.to_string()))?;
                }
                Ok(QueryResult::Written(WriteSummary::deleted(u64::from(existed))))
            }
        }
    }

    fn table_or_create<'a>(db: &'a DB, table: &str) -> std::result::Result<Arc<BoundColumnFamily<'a>>, String> {
        if let Some(cf) = db.cf_handle(table) {
            return Ok(cf);
        }
        tracing::info!("Creating RocksDB table {}", table);
        db.create_cf(table, &Options::default())
            .map_err(|e| e.to_string())?;
        db.cf_handle(table)
            .ok_or_else(|| format!("table `{}` could not be created", table))
    }

    fn read_item(
        db: &DB,
        cf: &Arc<BoundColumnFamily<'_>>,
        key: &str,
    ) -> std::result::Result<Option<JsonValue>, String> {
        let Some(bytes) = db.get_pinned_cf(cf, key.as_bytes()).map_err(|e| e.to_string())? else {
            return Ok(None);
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| format!("item `{}` is not valid JSON: {}", key, e))
    }

    /// Read many items: key prefix, top-level equality filter, limit.
    fn scan(
        db: &DB,
        cf: &Arc<BoundColumnFamily<'_>>,
        op: &Operation,
    ) -> std::result::Result<Vec<JsonValue>, String> {
        let prefix = op.prefix.as_deref().unwrap_or("");
        let filter = match &op.filter {
            Some(JsonValue::Object(map)) => Some(map),
            Some(_) => return Err("filter must be a JSON object".to_string()),
            None => None,
        };
        let limit = op.limit.unwrap_or(usize::MAX);

        let mut items = Vec::new();
        let iter = db.iterator_cf(cf, IteratorMode::From(prefix.as_bytes(), Direction::Forward));
        for entry in iter {
            if items.len() >= limit {
                break;
            }
            let (key, value) = entry.map_err(|e| e.to_string())?;
            if !key.starts_with(prefix.as_bytes()) {
                break;
            }
            let item: JsonValue = serde_json::from_slice(&value).map_err(|e| {
                format!("item `{}` is not valid JSON: {}", String::from_utf8_lossy(&key), e)
            })?;
            if filter.is_none_or(|f| matches_filter(&item, f)) {
                items.push(item);
            }
        }
        Ok(items)
    }
}

/// Every filter field must be present with an equal value.
fn matches_filter(item: &JsonValue, filter: &Map<String, JsonValue>) -> bool {
    filter
        .iter()
        .all(|(field, expected)| item.get(field) == Some(expected))
}

/// Fallback key for inserts: the item's `id` field.
fn item_id(item: &JsonValue) -> Option<String> {
    match item.get("id")? {
        JsonValue::String(s) => Some(s.clone()),
        JsonValue::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[async_trait]
impl DatabaseDriver for RocksDriver {
    fn backend_type(&self) -> BackendType {
        BackendType::RocksDb
    }

    fn connection_config(&self) -> &ConnectionConfig {
        &self.config
    }

    async fn connect(&mut self) -> Result<()> {
        let (path, read_only) = self.db_path()?;
        let db = smol::unblock(move || Self::open(&path, read_only)).await?;

        let mut guard = self.db.write().await;
        *guard = Some(Arc::new(db));

        tracing::info!("Opened RocksDB at {}", self.display_name());
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<()> {
        let mut guard = self.db.write().await;
        guard.take().map(|_| ()).ok_or_else(CogniError::not_connected)
    }

    async fn is_connected(&self) -> bool {
        self.db.read().await.is_some()
    }

    async fn fetch_schema(&self) -> Result<Schema> {
        let db = self.get_db().await?;
        let tables = smol::unblock(move || Self::list_tables(&db)).await?;
        tracing::info!("RocksDB schema fetched: {} tables", tables.len());
        Ok(tables.into_iter().map(|t| (t, Vec::new())).collect())
    }

    async fn execute_query(&self, query: &Query) -> Result<QueryResult> {
        let op = expect_operation(query, self.backend_type())?.clone();
        let kind = op.kind()?;
        let db = self.get_db().await?;

        tracing::debug!("RocksDB {} on {}", kind.as_str(), op.collection);
        smol::unblock(move || Self::run_operation(&db, &op)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use serde_json::json;
    use tempfile::TempDir;

    fn config_for(dir: &TempDir) -> ConnectionConfig {
        ConnectionConfig::new(
            "kv".to_string(),
            BackendType::RocksDb,
            ConnectionParams::file(dir.path().to_path_buf(), false),
        )
    }

    async fn open_driver(dir: &TempDir) -> RocksDriver {
        let mut driver = RocksDriver::new(config_for(dir));
        driver.connect().await.unwrap();
        driver
    }

    async fn run(driver: &RocksDriver, op: Operation) -> Result<QueryResult> {
        driver.execute_query(&Query::Operation(op)).await
    }

    async fn seed_users(driver: &RocksDriver) {
        for (key, name, role) in [
            ("user#1", "ada", "admin"),
            ("user#2", "grace", "dev"),
            ("user#3", "linus", "dev"),
            ("team#1", "core", "team"),
        ] {
            run(
                driver,
                Operation::new("users", "put_item")
                    .with_key(key)
                    .with_document(json!({"name": name, "role": role})),
            )
            .await
            .unwrap();
        }
    }

    #[test]
    fn test_put_then_get() {
        smol::block_on(async {
            let dir = TempDir::new().unwrap();
            let driver = open_driver(&dir).await;

            let written = run(
                &driver,
                Operation::new("users", "put_item")
                    .with_key("u1")
                    .with_document(json!({"name": "ada"})),
            )
            .await
            .unwrap();
            assert_eq!(written, QueryResult::Written(WriteSummary::inserted("u1")));

            let item = run(&driver, Operation::new("users", "get_item").with_key("u1"))
                .await
                .unwrap();
            assert_eq!(item, QueryResult::Document(Some(json!({"name": "ada"}))));

            let missing = run(&driver, Operation::new("users", "get_item").with_key("nope"))
                .await
                .unwrap();
            assert_eq!(missing, QueryResult::Document(None));
        });
    }

    #[test]
    fn test_insert_uses_id_field_when_key_missing() {
        smol::block_on(async {
            let dir = TempDir::new().unwrap();
            let driver = open_driver(&dir).await;

            let written = run(
                &driver,
                Operation::new("orders", "insert").with_document(json!({"id": 42, "total": 9.5})),
            )
            .await
            .unwrap();
            assert_eq!(written, QueryResult::Written(WriteSummary::inserted("42")));

            let err = run(
                &driver,
                Operation::new("orders", "insert").with_document(json!({"total": 1})),
            )
            .await
            .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::QueryExecution);
        });
    }

    #[test]
    fn test_scan_with_prefix_filter_and_limit() {
        smol::block_on(async {
            let dir = TempDir::new().unwrap();
            let driver = open_driver(&dir).await;
            seed_users(&driver).await;

            let all = run(&driver, Operation::new("users", "scan")).await.unwrap();
            assert!(matches!(all, QueryResult::Documents(ref items) if items.len() == 4));

            let users = run(&driver, Operation::new("users", "query").with_prefix("user#"))
                .await
                .unwrap();
            assert!(matches!(users, QueryResult::Documents(ref items) if items.len() == 3));

            let devs = run(
                &driver,
                Operation::new("users", "scan").with_filter(json!({"role": "dev"})),
            )
            .await
            .unwrap();
            assert_eq!(
                devs,
                QueryResult::Documents(vec![
                    json!({"name": "grace", "role": "dev"}),
                    json!({"name": "linus", "role": "dev"}),
                ])
            );

            let limited = run(
                &driver,
                Operation::new("users", "scan").with_prefix("user#").with_limit(2),
            )
            .await
            .unwrap();
            assert!(matches!(limited, QueryResult::Documents(ref items) if items.len() == 2));
        });
    }

    #[test]
    fn test_update_merges_fields() {
        smol::block_on(async {
            let dir = TempDir::new().unwrap();
            let driver = open_driver(&dir).await;
            seed_users(&driver).await;

            let updated = run(
                &driver,
                Operation::new("users", "update_item")
                    .with_key("user#2")
                    .with_update(json!({"$set": {"role": "lead"}})),
            )
            .await
            .unwrap();
            assert_eq!(updated, QueryResult::Written(WriteSummary::updated(1, 1)));

            let item = run(&driver, Operation::new("users", "get_item").with_key("user#2"))
                .await
                .unwrap();
            assert_eq!(
                item,
                QueryResult::Document(Some(json!({"name": "grace", "role": "lead"})))
            );

            let missing = run(
                &driver,
                Operation::new("users", "update_item")
                    .with_key("user#9")
                    .with_update(json!({"role": "x"})),
            )
            .await
            .unwrap();
            assert_eq!(missing, QueryResult::Written(WriteSummary::updated(0, 0)));
        });
    }

    #[test]
    fn test_delete() {
        smol::block_on(async {
            let dir = TempDir::new().unwrap();
            let driver = open_driver(&dir).await;
            seed_users(&driver).await;

            let deleted = run(&driver, Operation::new("users", "delete_item").with_key("user#1"))
                .await
                .unwrap();
            assert_eq!(deleted, QueryResult::Written(WriteSummary::deleted(1)));

            let again = run(&driver, Operation::new("users", "delete_item").with_key("user#1"))
                .await
                .unwrap();
            assert_eq!(again, QueryResult::Written(WriteSummary::deleted(0)));
        });
    }

    #[test]
    fn test_unknown_table_and_operation() {
        smol::block_on(async {
            let dir = TempDir::new().unwrap();
            let driver = open_driver(&dir).await;

            let err = run(&driver, Operation::new("ghosts", "get_item").with_key("k"))
                .await
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::QueryExecution);

            let err = run(&driver, Operation::new("users", "batch_write"))
                .await
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::UnsupportedOperation);

            let err = driver
                .execute_query(&Query::Sql("SELECT 1;".to_string()))
                .await
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::UnsupportedOperation);
        });
    }

    #[test]
    fn test_schema_lists_tables_and_survives_reopen() {
        smol::block_on(async {
            let dir = TempDir::new().unwrap();
            {
                let mut driver = open_driver(&dir).await;
                seed_users(&driver).await;
                run(
                    &driver,
                    Operation::new("orders", "put_item")
                        .with_key("o1")
                        .with_document(json!({"total": 3})),
                )
                .await
                .unwrap();
                driver.disconnect().await.unwrap();
            }

            let driver = open_driver(&dir).await;
            let schema = driver.fetch_schema().await.unwrap();
            assert_eq!(schema.table_names().collect::<Vec<_>>(), vec!["orders", "users"]);
            assert_eq!(schema.columns("users"), Some(&[][..]));

            let item = run(&driver, Operation::new("orders", "get_item").with_key("o1"))
                .await
                .unwrap();
            assert_eq!(item, QueryResult::Document(Some(json!({"total": 3}))));
        });
    }

    #[test]
    fn test_in_memory_params_rejected() {
        smol::block_on(async {
            let mut driver = RocksDriver::new(ConnectionConfig::new(
                "kv".to_string(),
                BackendType::RocksDb,
                ConnectionParams::in_memory(),
            ));
            let err = driver.connect().await.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Configuration);
        });
    }
}
