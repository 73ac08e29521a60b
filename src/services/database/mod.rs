//! Multi-backend data-access layer.
//!
//! `traits` holds the backend-agnostic types and the `DatabaseDriver` trait;
//! `drivers` holds one implementation per backend plus the factory.

pub mod drivers;
pub mod traits;

pub use drivers::DriverFactory;
pub use traits::{
    BackendType, BoxedDriver, ConnectionConfig, ConnectionParams, DatabaseDriver, Operation,
    OperationKind, Query, QueryLanguage, QueryResult, Row, Schema, SqlDialect, SslMode, Value,
    WriteSummary,
};
