//! Schema fetching.

use crate::error::Result;
use crate::services::database::traits::{DatabaseDriver, Schema};

/// Asks the driver for its schema.
pub struct SchemaFetcher;

impl SchemaFetcher {
    pub async fn fetch_schema(driver: &dyn DatabaseDriver) -> Result<Schema> {
        let schema = driver.fetch_schema().await?;
        tracing::debug!(
            "Schema for {}: {}",
            driver.display_name(),
            schema.to_prompt_string()
        );
        Ok(schema)
    }
}
