//! Prompt construction for the generator.

use super::client::CompletionRequest;
use crate::services::database::traits::{Schema, SqlDialect};

/// Request asking for a single SQL statement in the given dialect.
pub fn sql_request(dialect: SqlDialect, user_text: &str, schema: &Schema) -> CompletionRequest {
    let system = format!(
        "You are a {} query generator. Respond with ONLY the SQL query, \
         no explanations or additional text.",
        dialect.display_name()
    );
    let prompt = format!(
        "Given the database schema: {}\n\
         Generate ONLY the SQL query (no explanations) for: {}\n\
         The response should contain nothing but the SQL query itself.\n\
         For example, if asked to list the tables, respond with exactly: '{}'\n\
         If the request cannot be answered from the schema, say that you are unsure.",
        schema.to_prompt_string(),
        user_text,
        dialect.fallback_statement()
    );
    CompletionRequest::new(system, prompt)
}

/// Request asking for a JSON operation descriptor.
pub fn operation_request(backend_name: &str, user_text: &str, schema: &Schema) -> CompletionRequest {
    let system = format!(
        "You translate requests into {} operations. Respond with ONLY one JSON object, \
         no explanations or additional text.",
        backend_name
    );
    let prompt = format!(
        "Given the collections and their fields: {}\n\
         Produce the operation for: {}\n\
         The JSON object has the keys \"collection\", \"operation\" (one of find_one, find, \
         insert_one, update_one, delete_one) and, as needed, \"filter\", \"key\", \"prefix\", \
         \"document\", \"update\" and \"limit\".\n\
         If the request cannot be answered from the schema, say that you are unsure.",
        schema.to_prompt_string(),
        user_text
    );
    CompletionRequest::new(system, prompt)
}
