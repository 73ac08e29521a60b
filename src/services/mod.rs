//! The generate -> validate -> execute pipeline and its data-access layer.

pub mod clarification;
pub mod database;
pub mod executor;
pub mod generator;
pub mod schema_fetcher;
pub mod validator;

pub use clarification::{ClarificationHandler, Prompter, StdinPrompter};
pub use executor::QueryExecutor;
pub use generator::{Candidate, OpenAiClient, QueryGenerator, TextGenerator};
pub use schema_fetcher::SchemaFetcher;
pub use validator::{QueryValidator, Validation};
