//! Query generation.
//!
//! Turns a natural-language request plus the cached schema into a candidate
//! query: SQL for relational backends, a JSON operation descriptor for the
//! document and key-value backends.

pub mod client;
mod prompt;

use std::sync::Arc;

pub use client::{
    CompletionRequest, DEFAULT_BASE_URL, DEFAULT_MAX_TOKENS, DEFAULT_MODEL, DEFAULT_TEMPERATURE,
    OpenAiClient, TextGenerator,
};

use crate::error::Result;
use crate::services::database::traits::{BackendType, QueryLanguage, Schema};

/// Statement keywords a SQL candidate must start with (case-insensitive).
pub const ALLOWED_KEYWORDS: [&str; 9] = [
    "select", "show", "describe", "insert", "update", "delete", "create", "alter", "drop",
];

/// Output of one generation step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Text handed on to validation
    pub text: String,
    /// The model's completion as received
    pub raw_completion: String,
    /// Whether the completion was replaced by the fallback statement
    pub fell_back: bool,
}

/// Generates candidate queries through a [`TextGenerator`].
#[derive(Clone)]
pub struct QueryGenerator {
    client: Arc<dyn TextGenerator>,
    backend: BackendType,
}

impl QueryGenerator {
    pub fn new(client: Arc<dyn TextGenerator>, backend: BackendType) -> Self {
        Self { client, backend }
    }

    pub fn backend(&self) -> BackendType {
        self.backend
    }

    /// Candidate query text for `user_text`.
    ///
    /// # Errors
    ///
    /// Only fails when the completion call itself fails.
    pub async fn generate_sql(&self, user_text: &str, schema: &Schema) -> Result<String> {
        self.generate_candidate(user_text, schema)
            .await
            .map(|candidate| candidate.text)
    }

    /// Candidate plus the raw completion it came from.
    pub async fn generate_candidate(&self, user_text: &str, schema: &Schema) -> Result<Candidate> {
        match self.backend.query_language() {
            QueryLanguage::Sql(dialect) => {
                let request = prompt::sql_request(dialect, user_text, schema);
                let raw_completion = self.client.complete(&request).await?;
                let trimmed = raw_completion.trim();

                if is_allowed(trimmed) {
                    Ok(Candidate {
                        text: trimmed.to_string(),
                        raw_completion,
                        fell_back: false,
                    })
                } else {
                    tracing::warn!(
                        "Completion does not start with an allowed keyword, using fallback: {:?}",
                        trimmed
                    );
                    Ok(Candidate {
                        text: dialect.fallback_statement().to_string(),
                        raw_completion,
                        fell_back: true,
                    })
                }
            }
            QueryLanguage::Operation => {
                let request =
                    prompt::operation_request(self.backend.display_name(), user_text, schema);
                let raw_completion = self.client.complete(&request).await?;
                Ok(Candidate {
                    text: strip_code_fence(&raw_completion).to_string(),
                    raw_completion,
                    fell_back: false,
                })
            }
        }
    }
}

/// Whether a candidate starts with an allow-listed keyword.
pub fn is_allowed(candidate: &str) -> bool {
    let lower = candidate.trim_start().to_lowercase();
    ALLOWED_KEYWORDS.iter().any(|kw| lower.starts_with(kw))
}

/// Strip a surrounding markdown code fence (```json ... ```).
pub fn strip_code_fence(text: &str) -> &str {
    let text = text.trim();
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // Drop the info string (e.g. `json`) on the opening line
    let body = rest.split_once('\n').map_or("", |(_, body)| body);
    body.strip_suffix("```").unwrap_or(body).trim()
}
