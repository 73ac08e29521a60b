//! CogniDB: natural-language questions in, validated queries out.
//!
//! A question is turned into SQL (or a JSON operation descriptor for the
//! document and key-value backends) by a text-generation model, checked
//! syntactically, and executed against one connected backend.
//!
//! ```ignore
//! use cognidb::{CogniDb, CogniDbConfig, ConfigOverrides};
//!
//! let config = CogniDbConfig::from_env(ConfigOverrides::default())?;
//! let db = CogniDb::connect(&config).await?;
//! let envelope = db.query("how many users signed up this week?").await;
//! println!("{}", serde_json::to_string_pretty(&envelope)?);
//! ```

pub mod cognidb;
pub mod config;
pub mod error;
pub mod services;
pub mod utils;

pub use cognidb::{CogniDb, QueryEnvelope, QueryOutcome};
pub use config::{CogniDbConfig, ConfigOverrides};
pub use error::{CogniError, ErrorKind, Result};
