//! Database driver implementations.
//!
//! - **MySQL**, **PostgreSQL**, **SQLite**: relational drivers over SQLx pools
//! - **MongoDB** (feature `mongodb`): document store, operation descriptors
//! - **RocksDB** (feature `rocksdb`): key-value store, operation descriptors
//!
//! Each driver implements the `DatabaseDriver` trait.

mod factory;

pub mod mysql;
pub mod postgres;
pub mod sqlite;

#[cfg(feature = "mongodb")]
pub mod mongodb;
#[cfg(feature = "rocksdb")]
pub mod rocksdb;

pub use factory::DriverFactory;
