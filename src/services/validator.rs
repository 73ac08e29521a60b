//! Syntactic validation of generated queries.
//!
//! SQL is parsed with `sqlparser` in the backend's dialect and must end with
//! a terminating `;`. One correction is attempted on failure: trim and append
//! the missing `;`. Semantics (tables, columns, types) are never checked.

use sqlparser::dialect::{
    Dialect, GenericDialect, MySqlDialect, PostgreSqlDialect, SQLiteDialect,
};
use sqlparser::parser::Parser;

use crate::error::{CogniError, Result};
use crate::services::database::traits::{Operation, QueryLanguage, SqlDialect};

/// Outcome of a successful validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validation {
    /// The candidate was valid as written
    Accepted(String),
    /// The candidate was fixed up; `corrected` must be executed instead
    Corrected { original: String, corrected: String },
}

impl Validation {
    /// The text to execute.
    pub fn sql(&self) -> &str {
        match self {
            Self::Accepted(sql) => sql,
            Self::Corrected { corrected, .. } => corrected,
        }
    }

    pub fn into_sql(self) -> String {
        match self {
            Self::Accepted(sql) => sql,
            Self::Corrected { corrected, .. } => corrected,
        }
    }

    pub fn is_corrected(&self) -> bool {
        matches!(self, Self::Corrected { .. })
    }
}

/// Validates candidates for one query language.
#[derive(Debug, Clone, Copy)]
pub struct QueryValidator {
    language: QueryLanguage,
}

impl QueryValidator {
    pub fn new(language: QueryLanguage) -> Self {
        Self { language }
    }

    fn dialect(&self) -> Box<dyn Dialect> {
        match self.language {
            QueryLanguage::Sql(SqlDialect::MySql) => Box::new(MySqlDialect {}),
            QueryLanguage::Sql(SqlDialect::Postgres) => Box::new(PostgreSqlDialect {}),
            QueryLanguage::Sql(SqlDialect::Sqlite) => Box::new(SQLiteDialect {}),
            QueryLanguage::Operation => Box::new(GenericDialect {}),
        }
    }

    /// Validate candidate SQL, correcting a missing terminator once.
    ///
    /// # Errors
    ///
    /// `CogniError::Validation` when the candidate is empty, or invalid and
    /// unchanged by the correction.
    pub fn validate_sql(&self, candidate: &str) -> Result<Validation> {
        if candidate.trim().is_empty() {
            return Err(CogniError::Validation("Empty SQL query".to_string()));
        }

        let reason = match self.check(candidate) {
            Ok(()) => return Ok(Validation::Accepted(candidate.to_string())),
            Err(reason) => reason,
        };

        let corrected = auto_correct(candidate);
        if corrected == candidate {
            return Err(CogniError::Validation(format!("Invalid SQL: {}", reason)));
        }

        tracing::info!("Corrected SQL ({}): {:?} -> {:?}", reason, candidate, corrected);
        Ok(Validation::Corrected {
            original: candidate.to_string(),
            corrected,
        })
    }

    /// Parse a candidate operation descriptor.
    pub fn validate_operation(&self, candidate: &str) -> Result<Operation> {
        Operation::from_json(candidate.trim())
    }

    fn check(&self, sql: &str) -> std::result::Result<(), String> {
        let statements =
            Parser::parse_sql(self.dialect().as_ref(), sql).map_err(|e| e.to_string())?;
        if statements.is_empty() {
            return Err("no statement found".to_string());
        }
        if !sql.trim_end().ends_with(';') {
            return Err("missing terminating ';'".to_string());
        }
        Ok(())
    }
}

/// Trim and append a terminating `;` if there is none.
pub fn auto_correct(sql: &str) -> String {
    let trimmed = sql.trim();
    if trimmed.ends_with(';') {
        trimmed.to_string()
    } else {
        format!("{};", trimmed)
    }
}
