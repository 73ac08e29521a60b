//! Error types for the query pipeline.
//!
//! Every stage reports failures through [`CogniError`]. The orchestrator keeps the
//! kind intact through [`crate::CogniDb::run`] and only flattens it to a message
//! when building a [`crate::QueryEnvelope`].

use serde::Serialize;
use thiserror::Error;

/// Boxed source error carried by connection failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, CogniError>;

/// All failures the pipeline can produce.
#[derive(Error, Debug)]
pub enum CogniError {
    /// Missing or malformed configuration, raised before any I/O
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Backend unreachable or refused the session
    #[error("Connection failed: {message}")]
    Connection {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// The text-generation call itself failed (network, auth, quota, bad payload)
    #[error("Query generation failed: {0}")]
    Generation(String),

    /// Candidate query is syntactically invalid and could not be corrected
    #[error("Query validation failed: {0}")]
    Validation(String),

    /// Backend rejected or failed a statement
    #[error("Query execution failed for `{statement}`: {message}")]
    QueryExecution { statement: String, message: String },

    /// Backend asked to run an operation it does not know
    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),
}

/// Discriminant of [`CogniError`], cheap to copy and compare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Configuration,
    Connection,
    Generation,
    Validation,
    QueryExecution,
    UnsupportedOperation,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Configuration => "configuration",
            Self::Connection => "connection",
            Self::Generation => "generation",
            Self::Validation => "validation",
            Self::QueryExecution => "query_execution",
            Self::UnsupportedOperation => "unsupported_operation",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl CogniError {
    /// Connection error wrapping the backend's native error.
    pub fn connection<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Connection {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Connection error without an underlying cause (e.g. "not connected").
    pub fn not_connected() -> Self {
        Self::Connection {
            message: "Database not connected".to_string(),
            source: None,
        }
    }

    /// Execution error for a specific statement.
    pub fn query_execution(statement: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::QueryExecution {
            statement: statement.into(),
            message: message.to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Configuration(_) => ErrorKind::Configuration,
            Self::Connection { .. } => ErrorKind::Connection,
            Self::Generation(_) => ErrorKind::Generation,
            Self::Validation(_) => ErrorKind::Validation,
            Self::QueryExecution { .. } => ErrorKind::QueryExecution,
            Self::UnsupportedOperation(_) => ErrorKind::UnsupportedOperation,
        }
    }
}
