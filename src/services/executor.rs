//! Query execution.
//!
//! A pass-through to the driver: results and errors come back unchanged.

use crate::error::Result;
use crate::services::database::traits::{
    BoxedDriver, DatabaseDriver, Operation, Query, QueryResult,
};

/// Owns the driver and forwards queries to it.
pub struct QueryExecutor {
    driver: BoxedDriver,
}

impl QueryExecutor {
    pub fn new(driver: BoxedDriver) -> Self {
        Self { driver }
    }

    pub fn driver(&self) -> &dyn DatabaseDriver {
        self.driver.as_ref()
    }

    pub fn driver_mut(&mut self) -> &mut BoxedDriver {
        &mut self.driver
    }

    pub async fn execute(&self, query: &Query) -> Result<QueryResult> {
        self.driver.execute_query(query).await
    }

    pub async fn execute_sql(&self, sql: &str) -> Result<QueryResult> {
        self.execute(&Query::Sql(sql.to_string())).await
    }

    pub async fn execute_operation(&self, operation: &Operation) -> Result<QueryResult> {
        self.execute(&Query::Operation(operation.clone())).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{CogniError, ErrorKind};
    use crate::services::database::drivers::sqlite::SqliteDriver;
    use crate::services::database::traits::{
        BackendType, ConnectionConfig, ConnectionParams, Row, Value,
    };

    async fn executor() -> QueryExecutor {
        let mut driver = SqliteDriver::new(ConnectionConfig::new(
            "exec".to_string(),
            BackendType::Sqlite,
            ConnectionParams::in_memory(),
        ));
        driver.connect().await.unwrap();
        QueryExecutor::new(Box::new(driver))
    }

    #[test]
    fn test_execute_sql_passes_results_through() {
        smol::block_on(async {
            let executor = executor().await;
            let result = executor.execute_sql("SELECT 1;").await.unwrap();
            assert_eq!(
                result,
                QueryResult::Rows(vec![Row::from_values(vec![Value::Int64(1)])])
            );
        });
    }

    #[test]
    fn test_execute_sql_passes_errors_through() {
        smol::block_on(async {
            let executor = executor().await;
            let err = executor
                .execute_sql("SELECT * FROM no_such_table;")
                .await
                .unwrap_err();
            assert!(matches!(
                err,
                CogniError::QueryExecution { ref statement, .. } if statement == "SELECT * FROM no_such_table"
            ));

            let err = executor
                .execute_operation(&Operation::new("users", "find"))
                .await
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::UnsupportedOperation);
        });
    }
}
