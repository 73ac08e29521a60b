//! MongoDB document-store driver.
//!
//! Executes operation descriptors (`find_one`, `find`, `insert_one`,
//! `update_one`, `delete_one`). The schema is inferred from one sampled
//! document per collection, so it only lists the fields that document has.

mod connection;
mod types;

pub use connection::MongoDriver;
