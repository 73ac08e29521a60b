//! The natural-language query pipeline.
//!
//! `CogniDb` owns one connected driver, a generator and a validator, and the
//! schema fetched once at construction. Each question runs
//! generate → validate → execute exactly once.

use std::sync::Arc;

use serde::Serialize;

use crate::config::CogniDbConfig;
use crate::error::{ErrorKind, Result};
use crate::services::clarification::{ClarificationHandler, Prompter};
use crate::services::database::DriverFactory;
use crate::services::database::traits::{
    BackendType, BoxedDriver, Query, QueryLanguage, QueryResult, Schema,
};
use crate::services::executor::QueryExecutor;
use crate::services::generator::{Candidate, OpenAiClient, QueryGenerator, TextGenerator};
use crate::services::schema_fetcher::SchemaFetcher;
use crate::services::validator::{QueryValidator, Validation};

/// Everything a successful run produced.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryOutcome {
    /// The request that was sent to the generator
    pub request: String,
    /// The query that was executed (SQL text or operation JSON)
    pub query_text: String,
    /// Candidate before correction, when the validator changed it
    pub corrected_from: Option<String>,
    /// The model's completion as received
    pub raw_completion: String,
    /// Whether the completion was replaced by the fallback statement
    pub fell_back: bool,
    pub results: QueryResult,
}

/// Uniform reply of [`CogniDb::query`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryEnvelope {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sql_query: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results: Option<QueryResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Kept for callers; not part of the serialized envelope
    #[serde(skip)]
    pub error_kind: Option<ErrorKind>,
}

impl From<Result<QueryOutcome>> for QueryEnvelope {
    fn from(result: Result<QueryOutcome>) -> Self {
        match result {
            Ok(outcome) => Self {
                success: true,
                sql_query: Some(outcome.query_text),
                results: Some(outcome.results),
                error: None,
                error_kind: None,
            },
            Err(err) => Self {
                success: false,
                sql_query: None,
                results: None,
                error: Some(err.to_string()),
                error_kind: Some(err.kind()),
            },
        }
    }
}

pub struct CogniDb {
    executor: QueryExecutor,
    generator: QueryGenerator,
    validator: QueryValidator,
    schema: Schema,
}

impl CogniDb {
    /// Connect to the configured backend and fetch its schema.
    ///
    /// # Errors
    ///
    /// `Configuration` for an unusable configuration, `Connection` when the
    /// backend is unreachable, `QueryExecution` when schema introspection
    /// fails.
    pub async fn connect(config: &CogniDbConfig) -> Result<Self> {
        let mut driver = DriverFactory::create(config.connection_config())?;
        tracing::info!(
            "Connecting to {} ({})",
            config.backend.display_name(),
            driver.display_name()
        );
        driver.connect().await?;

        let client = OpenAiClient::with_base_url(&config.api_key, &config.model, &config.base_url)?;
        Self::with_driver(driver, Arc::new(client)).await
    }

    /// Build around an already connected driver.
    pub async fn with_driver(driver: BoxedDriver, client: Arc<dyn TextGenerator>) -> Result<Self> {
        let backend = driver.backend_type();
        let schema = SchemaFetcher::fetch_schema(driver.as_ref()).await?;
        tracing::info!(
            "Loaded schema with {} table(s) from {}",
            schema.len(),
            backend.display_name()
        );

        Ok(Self {
            executor: QueryExecutor::new(driver),
            generator: QueryGenerator::new(client, backend),
            validator: QueryValidator::new(backend.query_language()),
            schema,
        })
    }

    pub fn backend(&self) -> BackendType {
        self.generator.backend()
    }

    /// Schema cached at construction.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Answer a question, keeping the error kind on failure.
    pub async fn run(&self, text: &str) -> Result<QueryOutcome> {
        let candidate = self.generator.generate_candidate(text, &self.schema).await?;
        self.finish(text, candidate).await
    }

    /// Answer a question and collapse the result into an envelope.
    pub async fn query(&self, text: &str) -> QueryEnvelope {
        let result = self.run(text).await;
        if let Err(err) = &result {
            tracing::warn!("Query failed ({}): {}", err.kind(), err);
        }
        result.into()
    }

    /// Like [`CogniDb::run`], but asks once for more detail when the model
    /// signals ambiguity, then answers the extended request instead.
    ///
    /// A failed prompt leaves the first candidate in place.
    pub async fn run_with_clarification<P: Prompter>(
        &self,
        text: &str,
        handler: &mut ClarificationHandler<P>,
    ) -> Result<QueryOutcome> {
        let candidate = self.generator.generate_candidate(text, &self.schema).await?;
        if !ClarificationHandler::<P>::needs_clarification(&candidate.raw_completion) {
            return self.finish(text, candidate).await;
        }

        match handler.request_clarification() {
            Ok(detail) => {
                let clarified = format!("{} {}", text, detail);
                tracing::info!("Re-running with clarified request: {:?}", clarified);
                self.run(&clarified).await
            }
            Err(err) => {
                tracing::warn!("Clarification prompt failed: {}", err);
                self.finish(text, candidate).await
            }
        }
    }

    pub async fn query_with_clarification<P: Prompter>(
        &self,
        text: &str,
        handler: &mut ClarificationHandler<P>,
    ) -> QueryEnvelope {
        self.run_with_clarification(text, handler).await.into()
    }

    /// Disconnect from the backend.
    pub async fn close(mut self) -> Result<()> {
        self.executor.driver_mut().disconnect().await
    }

    async fn finish(&self, request: &str, candidate: Candidate) -> Result<QueryOutcome> {
        let Candidate {
            text,
            raw_completion,
            fell_back,
        } = candidate;

        let (query, corrected_from) = match self.generator.backend().query_language() {
            QueryLanguage::Sql(_) => match self.validator.validate_sql(&text)? {
                Validation::Accepted(sql) => (Query::Sql(sql), None),
                Validation::Corrected {
                    original,
                    corrected,
                } => (Query::Sql(corrected), Some(original)),
            },
            QueryLanguage::Operation => {
                (Query::Operation(self.validator.validate_operation(&text)?), None)
            }
        };

        let query_text = query.text();
        tracing::debug!("Executing: {}", query_text);
        let results = self.executor.execute(&query).await?;

        Ok(QueryOutcome {
            request: request.to_string(),
            query_text,
            corrected_from,
            raw_completion,
            fell_back,
            results,
        })
    }
}

impl std::fmt::Debug for CogniDb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CogniDb")
            .field("backend", &self.backend())
            .field("target", &self.executor.driver().display_name())
            .field("schema", &self.schema)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CogniError;
    use crate::services::database::drivers::sqlite::SqliteDriver;
    use crate::services::database::traits::{
        ConnectionConfig, ConnectionParams, DatabaseDriver, Row, Value,
    };
    use crate::services::generator::CompletionRequest;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::io;
    use std::sync::Mutex;

    /// Replies from a queue and records every prompt.
    struct Scripted {
        replies: Mutex<VecDeque<String>>,
        prompts: Mutex<Vec<String>>,
    }

    impl Scripted {
        fn new(replies: &[&str]) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.iter().map(|r| r.to_string()).collect()),
                prompts: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl TextGenerator for Scripted {
        async fn complete(&self, request: &CompletionRequest) -> Result<String> {
            self.prompts.lock().unwrap().push(request.prompt.clone());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| CogniError::Generation("no reply scripted".to_string()))
        }
    }

    struct Answers(VecDeque<io::Result<String>>);

    impl Prompter for Answers {
        fn prompt(&mut self, _message: &str) -> io::Result<String> {
            self.0
                .pop_front()
                .unwrap_or_else(|| Err(io::Error::other("no answer")))
        }
    }

    async fn users_db(client: Arc<dyn TextGenerator>) -> CogniDb {
        let mut driver = SqliteDriver::new(ConnectionConfig::new(
            "users".to_string(),
            BackendType::Sqlite,
            ConnectionParams::in_memory(),
        ));
        driver.connect().await.unwrap();
        driver
            .execute_query(&Query::Sql(
                "CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT); \
                 INSERT INTO users (id, name) VALUES (1, 'ada'), (2, 'grace');"
                    .to_string(),
            ))
            .await
            .unwrap();
        CogniDb::with_driver(Box::new(driver), client).await.unwrap()
    }

    fn user_rows() -> QueryResult {
        QueryResult::Rows(vec![
            Row::from_values(vec![Value::Int64(1), Value::Text("ada".to_string())]),
            Row::from_values(vec![Value::Int64(2), Value::Text("grace".to_string())]),
        ])
    }

    #[test]
    fn test_schema_is_cached_at_construction() {
        smol::block_on(async {
            let db = users_db(Scripted::new(&[])).await;
            assert_eq!(
                db.schema(),
                &Schema::new().with_table("users", vec!["id", "name"])
            );
            assert_eq!(db.backend(), BackendType::Sqlite);
        });
    }

    #[test]
    fn test_run_corrects_and_executes() {
        smol::block_on(async {
            let client = Scripted::new(&["SELECT * FROM users"]);
            let db = users_db(client.clone()).await;

            let outcome = db.run("show me all users").await.unwrap();
            assert_eq!(outcome.query_text, "SELECT * FROM users;");
            assert_eq!(outcome.corrected_from.as_deref(), Some("SELECT * FROM users"));
            assert!(!outcome.fell_back);
            assert_eq!(outcome.results, user_rows());

            let prompts = client.prompts.lock().unwrap();
            assert!(prompts[0].contains(r#"{"users":["id","name"]}"#));
        });
    }

    #[test]
    fn test_envelope_reports_failures_with_kind() {
        smol::block_on(async {
            let db = users_db(Scripted::new(&["SELECT * FROM orders;"])).await;
            let envelope = db.query("orders please").await;
            assert!(!envelope.success);
            assert_eq!(envelope.error_kind, Some(ErrorKind::QueryExecution));
            assert!(envelope.sql_query.is_none());

            let json = serde_json::to_value(&envelope).unwrap();
            assert_eq!(json["success"], false);
            assert!(json.get("results").is_none());
            assert!(json.get("error_kind").is_none());
        });
    }

    #[test]
    fn test_envelope_serializes_success() {
        smol::block_on(async {
            let db = users_db(Scripted::new(&["SELECT id FROM users WHERE id = 1;"])).await;
            let envelope = db.query("first user").await;
            let json = serde_json::to_value(&envelope).unwrap();
            assert_eq!(
                json,
                serde_json::json!({
                    "success": true,
                    "sql_query": "SELECT id FROM users WHERE id = 1;",
                    "results": [[1]],
                })
            );
        });
    }

    #[test]
    fn test_clarification_reruns_with_extra_detail() {
        smol::block_on(async {
            let client = Scripted::new(&[
                "I am unsure which users you mean",
                "SELECT name FROM users WHERE id = 2;",
            ]);
            let db = users_db(client.clone()).await;
            let mut handler =
                ClarificationHandler::new(Answers(VecDeque::from([Ok("the second one".to_string())])));

            let outcome = db
                .run_with_clarification("show the user", &mut handler)
                .await
                .unwrap();
            assert_eq!(outcome.request, "show the user the second one");
            assert_eq!(
                outcome.results,
                QueryResult::Rows(vec![Row::from_values(vec![Value::Text(
                    "grace".to_string()
                )])])
            );
            assert_eq!(client.prompts.lock().unwrap().len(), 2);
        });
    }

    #[test]
    fn test_clarification_not_requested_for_clear_completion() {
        smol::block_on(async {
            let client = Scripted::new(&["SELECT * FROM users;"]);
            let db = users_db(client.clone()).await;
            let mut handler = ClarificationHandler::new(Answers(VecDeque::new()));

            let envelope = db.query_with_clarification("all users", &mut handler).await;
            assert!(envelope.success);
            assert_eq!(client.prompts.lock().unwrap().len(), 1);
        });
    }

    #[test]
    fn test_failed_prompt_keeps_first_candidate() {
        smol::block_on(async {
            let db = users_db(Scripted::new(&["ambiguous request"])).await;
            let mut handler = ClarificationHandler::new(Answers(VecDeque::new()));

            let outcome = db
                .run_with_clarification("something", &mut handler)
                .await
                .unwrap();
            assert!(outcome.fell_back);
            assert_eq!(outcome.query_text, "SELECT name FROM sqlite_master WHERE type = 'table';");
        });
    }

    #[test]
    fn test_close_disconnects() {
        smol::block_on(async {
            let db = users_db(Scripted::new(&[])).await;
            db.close().await.unwrap();
        });
    }
}
