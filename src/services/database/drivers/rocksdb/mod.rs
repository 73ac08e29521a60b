//! RocksDB key-value driver.
//!
//! Each table is a column family; items are JSON objects keyed by string.
//! The schema lists table names only.

mod connection;

pub use connection::RocksDriver;
