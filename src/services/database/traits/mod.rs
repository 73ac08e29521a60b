//! Database abstraction traits and types.
//!
//! This module provides a unified interface over the supported backends.
//! It defines:
//!
//! - **Types** (`types`): Backend enum, connection configuration, SSL modes
//! - **Row/Value** (`row`): Backend-agnostic value representation
//! - **Schema** (`schema`): Table/collection to column/field mapping
//! - **Operation** (`operation`): Descriptors for document and key-value backends
//! - **Connection** (`connection`): Core driver trait and query results
//!
//! # Example
//!
//! ```ignore
//! use cognidb::services::database::traits::{
//!     BackendType, ConnectionConfig, ConnectionParams,
//! };
//!
//! let config = ConnectionConfig::new(
//!     "analytics".to_string(),
//!     BackendType::Postgres,
//!     ConnectionParams::server(
//!         "localhost".to_string(),
//!         5432,
//!         "user".to_string(),
//!         "password".to_string(),
//!         "mydb".to_string(),
//!     ),
//! );
//! ```

pub mod connection;
pub mod operation;
pub mod row;
pub mod schema;
pub mod types;

pub use connection::{
    ACQUIRE_TIMEOUT, BoxedDriver, DatabaseDriver, POOL_SIZE, Query, QueryResult, WriteSummary, expect_operation,
    expect_sql, split_statements,
};

pub use operation::{Operation, OperationKind};

pub use row::{Row, Value};

pub use schema::Schema;

pub use types::{BackendType, ConnectionConfig, ConnectionParams, QueryLanguage, SqlDialect, SslMode};
