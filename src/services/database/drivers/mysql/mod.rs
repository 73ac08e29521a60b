//! MySQL database driver implementation.
//!
//! # Example
//!
//! ```ignore
//! use cognidb::services::database::drivers::mysql::MySqlDriver;
//! use cognidb::services::database::traits::{BackendType, ConnectionConfig, ConnectionParams};
//!
//! let config = ConnectionConfig::new(
//!     "shop".to_string(),
//!     BackendType::MySql,
//!     ConnectionParams::server(
//!         "localhost".to_string(),
//!         3306,
//!         "user".to_string(),
//!         "password".to_string(),
//!         "shop".to_string(),
//!     ),
//! );
//!
//! let mut driver = MySqlDriver::new(config);
//! driver.connect().await?;
//! ```

mod connection;
mod schema;
mod types;

pub use connection::MySqlDriver;
