//! PostgreSQL database driver implementation.
//!
//! Schema introspection covers the `public` schema.

mod connection;
mod schema;
mod types;

pub use connection::PgDriver;
