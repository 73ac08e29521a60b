//! Core database driver trait.
//!
//! This module defines the `DatabaseDriver` trait that every backend implements,
//! the `Query` a driver accepts and the `QueryResult` it hands back, plus the
//! statement-splitting helpers shared by the relational drivers.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value as JsonValue;
use std::time::Duration;

use super::operation::Operation;
use super::row::Row;
use super::schema::Schema;
use super::types::{BackendType, ConnectionConfig, ConnectionParams};
use crate::error::{CogniError, Result};

/// Fixed size of the relational connection pools.
pub const POOL_SIZE: u32 = 5;

/// How long a checkout waits for a free pooled connection.
pub const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(24 * 60 * 60);

/// A query ready for execution.
#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    /// SQL text, possibly several `;`-separated statements
    Sql(String),
    /// Structured operation for document/key-value backends
    Operation(Operation),
}

impl Query {
    /// Text form of the query, as reported back to callers.
    pub fn text(&self) -> String {
        match self {
            Query::Sql(sql) => sql.clone(),
            Query::Operation(op) => op.to_json(),
        }
    }
}

/// Summary of a write against a document or key-value backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WriteSummary {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inserted_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified_count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_count: Option<u64>,
}

impl WriteSummary {
    pub fn inserted(id: impl Into<String>) -> Self {
        Self {
            inserted_id: Some(id.into()),
            ..Self::default()
        }
    }

    pub fn updated(matched: u64, modified: u64) -> Self {
        Self {
            matched_count: Some(matched),
            modified_count: Some(modified),
            ..Self::default()
        }
    }

    pub fn deleted(count: u64) -> Self {
        Self {
            deleted_count: Some(count),
            ..Self::default()
        }
    }
}

/// Result of executing a query, passed through to callers unmodified.
///
/// Relational drivers return `Rows` when exactly one statement produced a
/// result set and `RowSets` otherwise (none, or two and more). Callers must
/// handle both shapes.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum QueryResult {
    /// The rows of the single result-set statement
    Rows(Vec<Row>),
    /// One row list per result-set statement
    RowSets(Vec<Vec<Row>>),
    /// Read-one result (document or key-value item)
    Document(Option<JsonValue>),
    /// Read-many result
    Documents(Vec<JsonValue>),
    /// Write acknowledgement
    Written(WriteSummary),
}

impl QueryResult {
    /// Collapse per-statement result sets into the flat/nested shape.
    pub fn from_result_sets(mut sets: Vec<Vec<Row>>) -> Self {
        if sets.len() == 1 {
            QueryResult::Rows(sets.remove(0))
        } else {
            QueryResult::RowSets(sets)
        }
    }
}

/// Core trait for all backend drivers.
///
/// The orchestrator only ever sees `dyn DatabaseDriver`; each backend
/// implements it independently.
#[async_trait]
pub trait DatabaseDriver: Send + Sync {
    /// Get the backend type for this driver
    fn backend_type(&self) -> BackendType;

    /// Get the connection configuration
    fn connection_config(&self) -> &ConnectionConfig;

    /// Establish the connection (or pool).
    ///
    /// # Errors
    ///
    /// Returns `CogniError::Connection` wrapping the backend's native error.
    async fn connect(&mut self) -> Result<()>;

    /// Release the connection and any pooled resources.
    async fn disconnect(&mut self) -> Result<()>;

    /// Check if the connection is currently usable.
    async fn is_connected(&self) -> bool;

    /// Report the backend's schema.
    async fn fetch_schema(&self) -> Result<Schema>;

    /// Execute a query and return the backend's result.
    async fn execute_query(&self, query: &Query) -> Result<QueryResult>;

    /// Human-readable description of the connection target.
    fn display_name(&self) -> String {
        let config = self.connection_config();
        match &config.params {
            ConnectionParams::Server {
                hostname,
                port,
                username,
                database,
                ..
            } => format!("{}@{}:{}/{}", username, hostname, port, database),
            ConnectionParams::File { path, .. } => path.display().to_string(),
            ConnectionParams::InMemory => ":memory:".to_string(),
        }
    }
}

/// A boxed driver trait object.
pub type BoxedDriver = Box<dyn DatabaseDriver>;

/// Extract SQL text from a query, rejecting operation descriptors.
pub fn expect_sql(query: &Query, backend: BackendType) -> Result<&str> {
    match query {
        Query::Sql(sql) => Ok(sql),
        Query::Operation(op) => Err(CogniError::UnsupportedOperation(format!(
            "{} executes SQL, not `{}` operation descriptors",
            backend.display_name(),
            op.operation
        ))),
    }
}

/// Extract an operation descriptor from a query, rejecting SQL text.
pub fn expect_operation(query: &Query, backend: BackendType) -> Result<&Operation> {
    match query {
        Query::Operation(op) => Ok(op),
        Query::Sql(_) => Err(CogniError::UnsupportedOperation(format!(
            "{} executes operation descriptors, not SQL",
            backend.display_name()
        ))),
    }
}

/// Split SQL text into statements on `;`.
///
/// Terminators inside single quotes, double quotes, backticks, `--` line
/// comments and `/* */` block comments are ignored. Comments stay attached to
/// the statement that follows them. Fragments holding nothing but whitespace
/// and comments are dropped.
pub fn split_statements(sql: &str) -> Vec<String> {
    #[derive(Clone, Copy, PartialEq)]
    enum State {
        Code,
        Quoted(char),
        LineComment,
        BlockComment,
    }

    let mut statements = Vec::new();
    let mut current = String::new();
    let mut has_code = false;
    let mut state = State::Code;
    let mut chars = sql.chars().peekable();

    while let Some(ch) = chars.next() {
        match state {
            State::Quoted(q) => {
                current.push(ch);
                if ch == q {
                    state = State::Code;
                }
            }
            State::LineComment => {
                current.push(ch);
                if ch == '\n' {
                    state = State::Code;
                }
            }
            State::BlockComment => {
                current.push(ch);
                if ch == '*' && chars.peek() == Some(&'/') {
                    current.push('/');
                    chars.next();
                    state = State::Code;
                }
            }
            State::Code => match ch {
                '\'' | '"' | '`' => {
                    state = State::Quoted(ch);
                    has_code = true;
                    current.push(ch);
                }
                '-' if chars.peek() == Some(&'-') => {
                    state = State::LineComment;
                    current.push(ch);
                }
                '/' if chars.peek() == Some(&'*') => {
                    state = State::BlockComment;
                    current.push(ch);
                }
                ';' => {
                    if has_code {
                        statements.push(current.trim().to_string());
                    }
                    current.clear();
                    has_code = false;
                }
                _ => {
                    has_code |= !ch.is_whitespace();
                    current.push(ch);
                }
            },
        }
    }

    if has_code {
        statements.push(current.trim().to_string());
    }
    statements
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::row::Value;

    #[test]
    fn test_split_statements_basic() {
        assert_eq!(split_statements("SELECT 1;"), vec!["SELECT 1"]);
        assert_eq!(
            split_statements("SELECT 1; SELECT 2;"),
            vec!["SELECT 1", "SELECT 2"]
        );
        assert_eq!(split_statements("SELECT 1"), vec!["SELECT 1"]);
        assert!(split_statements(" ; ;; ").is_empty());
    }

    #[test]
    fn test_split_statements_respects_quotes() {
        let sql = "INSERT INTO t VALUES ('a;b'); SELECT \"x;y\" FROM `we;ird`";
        assert_eq!(
            split_statements(sql),
            vec!["INSERT INTO t VALUES ('a;b')", "SELECT \"x;y\" FROM `we;ird`"]
        );
    }

    #[test]
    fn test_split_statements_skips_comments() {
        assert_eq!(
            split_statements("INSERT INTO t VALUES (1); -- note; not a statement\nSELECT * FROM t;"),
            vec!["INSERT INTO t VALUES (1)", "-- note; not a statement\nSELECT * FROM t"]
        );
        assert_eq!(
            split_statements("/* a;b */ SELECT 1; -- trailing"),
            vec!["/* a;b */ SELECT 1"]
        );
        assert_eq!(split_statements("SELECT 5-3; SELECT 4/2"), vec!["SELECT 5-3", "SELECT 4/2"]);
        assert!(split_statements("-- only a comment;\n/* and; this */").is_empty());
    }

    #[test]
    fn test_result_shape_flat_vs_nested() {
        let one = vec![vec![Row::from_values(vec![Value::Int64(1)])]];
        assert_eq!(
            QueryResult::from_result_sets(one),
            QueryResult::Rows(vec![Row::from_values(vec![Value::Int64(1)])])
        );

        let two = vec![
            vec![Row::from_values(vec![Value::Int64(1)])],
            vec![Row::from_values(vec![Value::Int64(2)])],
        ];
        assert!(matches!(
            QueryResult::from_result_sets(two),
            QueryResult::RowSets(sets) if sets.len() == 2
        ));

        assert_eq!(
            QueryResult::from_result_sets(vec![]),
            QueryResult::RowSets(vec![])
        );
    }

    #[test]
    fn test_result_serialization_shapes() {
        let flat = QueryResult::Rows(vec![Row::from_values(vec![Value::Int64(1)])]);
        assert_eq!(serde_json::to_string(&flat).unwrap(), "[[1]]");

        let nested = QueryResult::RowSets(vec![
            vec![Row::from_values(vec![Value::Int64(1)])],
            vec![Row::from_values(vec![Value::Int64(2)])],
        ]);
        assert_eq!(serde_json::to_string(&nested).unwrap(), "[[[1]],[[2]]]");

        let written = QueryResult::Written(WriteSummary::deleted(1));
        assert_eq!(serde_json::to_string(&written).unwrap(), r#"{"deleted_count":1}"#);
    }

    #[test]
    fn test_expect_helpers() {
        let sql = Query::Sql("SELECT 1".into());
        let op = Query::Operation(Operation::new("users", "find"));

        assert_eq!(expect_sql(&sql, BackendType::Sqlite).unwrap(), "SELECT 1");
        assert!(expect_sql(&op, BackendType::Sqlite).is_err());
        assert!(expect_operation(&op, BackendType::MongoDb).is_ok());
        assert!(expect_operation(&sql, BackendType::MongoDb).is_err());
    }
}
