//! SQLite database driver implementation.
//!
//! SQLite is a file-based embedded database. The driver supports:
//! - File-based databases (`.db`, `.sqlite`, `.sqlite3`)
//! - In-memory databases (`:memory:`), shared by every pooled connection
//! - Read-only mode
//!
//! # Example
//!
//! ```ignore
//! use cognidb::services::database::drivers::sqlite::SqliteDriver;
//! use cognidb::services::database::traits::{BackendType, ConnectionConfig, ConnectionParams};
//! use std::path::PathBuf;
//!
//! let config = ConnectionConfig::new(
//!     "local".to_string(),
//!     BackendType::Sqlite,
//!     ConnectionParams::file(PathBuf::from("/path/to/database.db"), false),
//! );
//!
//! let mut driver = SqliteDriver::new(config);
//! driver.connect().await?;
//! ```

mod connection;
mod schema;
mod types;

pub use connection::SqliteDriver;
