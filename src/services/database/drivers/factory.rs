//! Driver factory.
//!
//! Picks the driver implementation for a configuration's backend. The
//! document and key-value drivers are cargo features; asking for one that
//! was compiled out is a configuration error.

use super::mysql::MySqlDriver;
use super::postgres::PgDriver;
use super::sqlite::SqliteDriver;
use crate::error::{CogniError, Result};
use crate::services::database::traits::{BackendType, BoxedDriver, ConnectionConfig};

/// Factory for creating drivers based on configuration.
///
/// # Example
///
/// ```ignore
/// use cognidb::services::database::drivers::DriverFactory;
/// use cognidb::services::database::traits::{BackendType, ConnectionConfig, ConnectionParams};
///
/// let config = ConnectionConfig::new(
///     "local".to_string(),
///     BackendType::Sqlite,
///     ConnectionParams::in_memory(),
/// );
///
/// let driver = DriverFactory::create(config)?;
/// ```
pub struct DriverFactory;

impl DriverFactory {
    /// Create an unconnected driver for the configuration.
    ///
    /// # Errors
    ///
    /// Returns `CogniError::Configuration` if the parameters do not fit the
    /// backend, or the backend was not compiled in.
    pub fn create(config: ConnectionConfig) -> Result<BoxedDriver> {
        config.validate().map_err(CogniError::Configuration)?;

        match config.backend {
            BackendType::MySql => Ok(MySqlDriver::boxed(config)),
            BackendType::Postgres => Ok(PgDriver::boxed(config)),
            BackendType::Sqlite => Ok(SqliteDriver::boxed(config)),
            BackendType::MongoDb => Self::create_mongodb(config),
            BackendType::RocksDb => Self::create_rocksdb(config),
        }
    }

    #[cfg(feature = "mongodb")]
    fn create_mongodb(config: ConnectionConfig) -> Result<BoxedDriver> {
        Ok(super::mongodb::MongoDriver::boxed(config))
    }

    #[cfg(not(feature = "mongodb"))]
    fn create_mongodb(_config: ConnectionConfig) -> Result<BoxedDriver> {
        Err(Self::not_compiled(BackendType::MongoDb, "mongodb"))
    }

    #[cfg(feature = "rocksdb")]
    fn create_rocksdb(config: ConnectionConfig) -> Result<BoxedDriver> {
        Ok(super::rocksdb::RocksDriver::boxed(config))
    }

    #[cfg(not(feature = "rocksdb"))]
    fn create_rocksdb(_config: ConnectionConfig) -> Result<BoxedDriver> {
        Err(Self::not_compiled(BackendType::RocksDb, "rocksdb"))
    }

    #[allow(dead_code)]
    fn not_compiled(backend: BackendType, feature: &str) -> CogniError {
        CogniError::Configuration(format!(
            "{} support is not compiled in (enable the `{}` feature)",
            backend.display_name(),
            feature
        ))
    }

    /// Check if a backend has a driver in this build.
    pub fn is_supported(backend: BackendType) -> bool {
        match backend {
            BackendType::MySql | BackendType::Postgres | BackendType::Sqlite => true,
            BackendType::MongoDb => cfg!(feature = "mongodb"),
            BackendType::RocksDb => cfg!(feature = "rocksdb"),
        }
    }

    /// Backends that have a driver in this build.
    pub fn supported_types() -> Vec<BackendType> {
        BackendType::all()
            .into_iter()
            .filter(|t| Self::is_supported(*t))
            .collect()
    }
}
