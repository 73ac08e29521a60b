//! Backend type definitions and connection configuration.
//!
//! This module contains:
//! - `BackendType` - Enum of supported storage backends
//! - `QueryLanguage` / `SqlDialect` - What kind of query a backend accepts
//! - `ConnectionConfig` - Unified connection configuration
//! - `ConnectionParams` - Backend-specific connection parameters

use std::collections::HashMap;
use std::path::PathBuf;

/// Supported backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BackendType {
    #[default]
    MySql,
    Postgres,
    Sqlite,
    MongoDb,
    RocksDb,
}

/// SQL dialect spoken by a relational backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SqlDialect {
    MySql,
    Postgres,
    Sqlite,
}

impl SqlDialect {
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::MySql => "MySQL",
            Self::Postgres => "PostgreSQL",
            Self::Sqlite => "SQLite",
        }
    }

    /// The list-tables statement substituted when generation yields no usable SQL.
    pub fn fallback_statement(&self) -> &'static str {
        match self {
            Self::MySql => "SHOW TABLES;",
            Self::Postgres => {
                "SELECT table_name FROM information_schema.tables WHERE table_schema = 'public';"
            }
            Self::Sqlite => "SELECT name FROM sqlite_master WHERE type = 'table';",
        }
    }
}

/// Kind of query a backend executes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryLanguage {
    /// Free-text SQL in the given dialect
    Sql(SqlDialect),
    /// Structured operation descriptors (document and key-value stores)
    Operation,
}

impl BackendType {
    /// Get the display name for this backend
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::MySql => "MySQL",
            Self::Postgres => "PostgreSQL",
            Self::Sqlite => "SQLite",
            Self::MongoDb => "MongoDB",
            Self::RocksDb => "RocksDB",
        }
    }

    /// Get the default port for server-based backends
    pub fn default_port(&self) -> Option<u16> {
        match self {
            Self::MySql => Some(3306),
            Self::Postgres => Some(5432),
            Self::MongoDb => Some(27017),
            Self::Sqlite | Self::RocksDb => None,
        }
    }

    /// Check if this backend is file-based (SQLite, RocksDB)
    pub fn is_file_based(&self) -> bool {
        matches!(self, Self::Sqlite | Self::RocksDb)
    }

    /// Check if this backend is server-based
    pub fn is_server_based(&self) -> bool {
        !self.is_file_based()
    }

    /// The query language this backend's driver accepts
    pub fn query_language(&self) -> QueryLanguage {
        match self {
            Self::MySql => QueryLanguage::Sql(SqlDialect::MySql),
            Self::Postgres => QueryLanguage::Sql(SqlDialect::Postgres),
            Self::Sqlite => QueryLanguage::Sql(SqlDialect::Sqlite),
            Self::MongoDb | Self::RocksDb => QueryLanguage::Operation,
        }
    }

    /// Get all backend types
    pub fn all() -> Vec<BackendType> {
        vec![
            Self::MySql,
            Self::Postgres,
            Self::Sqlite,
            Self::MongoDb,
            Self::RocksDb,
        ]
    }

    /// Parse from a string representation
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "mysql" | "mariadb" => Some(Self::MySql),
            "postgresql" | "postgres" | "pg" => Some(Self::Postgres),
            "sqlite" | "sqlite3" => Some(Self::Sqlite),
            "mongodb" | "mongo" => Some(Self::MongoDb),
            "rocksdb" | "rocks" => Some(Self::RocksDb),
            _ => None,
        }
    }
}

impl std::fmt::Display for BackendType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// SSL mode options (generic across server backends)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SslMode {
    /// No SSL connection
    Disable,
    /// Try SSL first, fall back to non-SSL
    #[default]
    Prefer,
    /// Require SSL
    Require,
}

impl SslMode {
    /// Parse from a configuration string (case-insensitive, libpq or MySQL spelling)
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "disable" | "disabled" => Some(Self::Disable),
            "prefer" | "preferred" => Some(Self::Prefer),
            "require" | "required" => Some(Self::Require),
            _ => None,
        }
    }
}

/// Unified connection configuration for all backends
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// User-friendly name for this connection
    pub name: String,
    /// The backend to talk to
    pub backend: BackendType,
    /// Connection parameters (varies by backend)
    pub params: ConnectionParams,
}

impl ConnectionConfig {
    /// Create a new connection configuration
    pub fn new(name: String, backend: BackendType, params: ConnectionParams) -> Self {
        Self {
            name,
            backend,
            params,
        }
    }

    /// Validate that the params match the backend
    pub fn validate(&self) -> Result<(), String> {
        match (&self.backend, &self.params) {
            (BackendType::Sqlite | BackendType::RocksDb, ConnectionParams::Server { .. }) => {
                Err(format!(
                    "{} requires file or in-memory connection parameters",
                    self.backend.display_name()
                ))
            }
            (
                BackendType::MySql | BackendType::Postgres | BackendType::MongoDb,
                ConnectionParams::File { .. } | ConnectionParams::InMemory { .. },
            ) => Err(format!(
                "{} requires server connection parameters",
                self.backend.display_name()
            )),
            (BackendType::RocksDb, ConnectionParams::InMemory { .. }) => {
                Err("RocksDB requires a database directory".to_string())
            }
            _ => Ok(()),
        }
    }
}

/// Connection parameters for different backends
#[derive(Debug, Clone)]
pub enum ConnectionParams {
    /// Server-based backends (MySQL, PostgreSQL, MongoDB)
    Server {
        /// Server hostname or IP address
        hostname: String,
        /// Server port
        port: u16,
        /// Username for authentication
        username: String,
        /// Password for authentication
        password: String,
        /// Database to connect to
        database: String,
        /// SSL mode for the connection
        ssl_mode: SslMode,
        /// Additional driver-specific options
        extra_options: HashMap<String, String>,
    },

    /// File-based backends (SQLite file, RocksDB directory)
    File {
        /// Path to the database file or directory
        path: PathBuf,
        /// Open in read-only mode
        read_only: bool,
    },

    /// In-memory databases (SQLite only)
    InMemory,
}

impl ConnectionParams {
    /// Create new server connection parameters
    pub fn server(
        hostname: String,
        port: u16,
        username: String,
        password: String,
        database: String,
    ) -> Self {
        Self::Server {
            hostname,
            port,
            username,
            password,
            database,
            ssl_mode: SslMode::default(),
            extra_options: HashMap::new(),
        }
    }

    /// Create new file connection parameters
    pub fn file(path: PathBuf, read_only: bool) -> Self {
        Self::File { path, read_only }
    }

    /// Create new in-memory connection parameters
    pub fn in_memory() -> Self {
        Self::InMemory
    }

    /// Set the SSL mode (server params only)
    pub fn with_ssl_mode(mut self, mode: SslMode) -> Self {
        if let Self::Server { ssl_mode, .. } = &mut self {
            *ssl_mode = mode;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn server_params() -> ConnectionParams {
        ConnectionParams::server(
            "localhost".to_string(),
            5432,
            "user".to_string(),
            "pass".to_string(),
            "db".to_string(),
        )
    }

    #[test]
    fn test_backend_default_ports() {
        assert_eq!(BackendType::MySql.default_port(), Some(3306));
        assert_eq!(BackendType::Postgres.default_port(), Some(5432));
        assert_eq!(BackendType::MongoDb.default_port(), Some(27017));
        assert_eq!(BackendType::Sqlite.default_port(), None);
        assert_eq!(BackendType::RocksDb.default_port(), None);
    }

    #[test]
    fn test_backend_parse_aliases() {
        assert_eq!(BackendType::parse("pg"), Some(BackendType::Postgres));
        assert_eq!(BackendType::parse("MariaDB"), Some(BackendType::MySql));
        assert_eq!(BackendType::parse("mongo"), Some(BackendType::MongoDb));
        assert_eq!(BackendType::parse(" rocks "), Some(BackendType::RocksDb));
        assert_eq!(BackendType::parse("oracle"), None);

        for backend in BackendType::all() {
            assert_eq!(BackendType::parse(&backend.display_name().to_lowercase()), Some(backend));
        }
    }

    #[test]
    fn test_query_language() {
        assert_eq!(
            BackendType::Sqlite.query_language(),
            QueryLanguage::Sql(SqlDialect::Sqlite)
        );
        assert_eq!(BackendType::MongoDb.query_language(), QueryLanguage::Operation);
        assert_eq!(BackendType::RocksDb.query_language(), QueryLanguage::Operation);
    }

    #[test]
    fn test_fallback_statements_are_terminated() {
        for dialect in [SqlDialect::MySql, SqlDialect::Postgres, SqlDialect::Sqlite] {
            assert!(dialect.fallback_statement().ends_with(';'));
        }
        assert_eq!(SqlDialect::MySql.fallback_statement(), "SHOW TABLES;");
    }

    #[test]
    fn test_connection_config_validation() {
        let config = ConnectionConfig::new("t".into(), BackendType::Postgres, server_params());
        assert!(config.validate().is_ok());

        let config = ConnectionConfig::new(
            "t".into(),
            BackendType::Postgres,
            ConnectionParams::file(PathBuf::from("/tmp/test.db"), false),
        );
        assert!(config.validate().is_err());

        let config = ConnectionConfig::new("t".into(), BackendType::Sqlite, server_params());
        assert!(config.validate().is_err());

        let config =
            ConnectionConfig::new("t".into(), BackendType::Sqlite, ConnectionParams::in_memory());
        assert!(config.validate().is_ok());

        let config =
            ConnectionConfig::new("t".into(), BackendType::RocksDb, ConnectionParams::in_memory());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_ssl_mode_spellings() {
        assert_eq!(SslMode::from_db_str("disable"), Some(SslMode::Disable));
        assert_eq!(SslMode::from_db_str("Preferred"), Some(SslMode::Prefer));
        assert_eq!(SslMode::from_db_str(" REQUIRED "), Some(SslMode::Require));
        assert_eq!(SslMode::from_db_str("sometimes"), None);
    }
}
