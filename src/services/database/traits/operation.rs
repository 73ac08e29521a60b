//! Structured operation descriptors for document and key-value backends.
//!
//! These backends do not speak SQL; callers hand them a descriptor naming the
//! collection/table, the operation and its parameters. The operation name is
//! kept as written and only resolved when the driver dispatches it, so an
//! unknown name surfaces as [`CogniError::UnsupportedOperation`].

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::error::{CogniError, Result};

/// The fixed set of operations non-SQL drivers dispatch to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    ReadOne,
    ReadMany,
    Insert,
    Update,
    Delete,
}

impl OperationKind {
    /// Resolve an operation name, accepting MongoDB- and DynamoDB-style spellings.
    pub fn parse(name: &str) -> Result<Self> {
        match name.trim().to_lowercase().as_str() {
            "read_one" | "find_one" | "get_item" | "get" => Ok(Self::ReadOne),
            "read_many" | "find" | "query" | "scan" => Ok(Self::ReadMany),
            "insert" | "insert_one" | "put_item" | "put" => Ok(Self::Insert),
            "update" | "update_one" | "update_item" => Ok(Self::Update),
            "delete" | "delete_one" | "delete_item" => Ok(Self::Delete),
            _ => Err(CogniError::UnsupportedOperation(name.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ReadOne => "read_one",
            Self::ReadMany => "read_many",
            Self::Insert => "insert",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

/// An operation against a collection (document store) or table (key-value store).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    /// Collection or table name
    #[serde(alias = "table")]
    pub collection: String,
    /// Operation name, resolved with [`OperationKind::parse`]
    pub operation: String,
    /// Equality filter (document store query, key-value field match)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<JsonValue>,
    /// Item key (key-value store)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    /// Key prefix for key-value scans
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
    /// Document or item to insert
    #[serde(default, alias = "item", skip_serializing_if = "Option::is_none")]
    pub document: Option<JsonValue>,
    /// Update specification
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update: Option<JsonValue>,
    /// Maximum number of documents returned by a read-many
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}

impl Operation {
    pub fn new(collection: impl Into<String>, operation: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            operation: operation.into(),
            filter: None,
            key: None,
            prefix: None,
            document: None,
            update: None,
            limit: None,
        }
    }

    pub fn with_filter(mut self, filter: JsonValue) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    pub fn with_document(mut self, document: JsonValue) -> Self {
        self.document = Some(document);
        self
    }

    pub fn with_update(mut self, update: JsonValue) -> Self {
        self.update = Some(update);
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Resolve the operation name.
    pub fn kind(&self) -> Result<OperationKind> {
        OperationKind::parse(&self.operation)
    }

    /// Parse a descriptor from JSON text.
    pub fn from_json(text: &str) -> Result<Self> {
        let op: Self = serde_json::from_str(text)
            .map_err(|e| CogniError::Validation(format!("Invalid operation descriptor: {}", e)))?;
        if op.collection.trim().is_empty() {
            return Err(CogniError::Validation(
                "Operation descriptor has an empty collection name".to_string(),
            ));
        }
        Ok(op)
    }

    /// Compact JSON form, used as the query text in result envelopes.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| format!("{{\"operation\":\"{}\"}}", self.operation))
    }

    /// Required key, or a descriptive execution error.
    pub fn require_key(&self) -> Result<&str> {
        self.key.as_deref().ok_or_else(|| {
            CogniError::query_execution(self.to_json(), format!("`{}` requires a `key`", self.operation))
        })
    }

    /// Required document, or a descriptive execution error.
    pub fn require_document(&self) -> Result<&JsonValue> {
        self.document.as_ref().ok_or_else(|| {
            CogniError::query_execution(
                self.to_json(),
                format!("`{}` requires a `document`", self.operation),
            )
        })
    }

    /// Required update, or a descriptive execution error.
    pub fn require_update(&self) -> Result<&JsonValue> {
        self.update.as_ref().ok_or_else(|| {
            CogniError::query_execution(
                self.to_json(),
                format!("`{}` requires an `update`", self.operation),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use serde_json::json;

    #[test]
    fn test_operation_kind_aliases() {
        assert_eq!(OperationKind::parse("find").unwrap(), OperationKind::ReadMany);
        assert_eq!(OperationKind::parse("get_item").unwrap(), OperationKind::ReadOne);
        assert_eq!(OperationKind::parse("PUT_ITEM").unwrap(), OperationKind::Insert);
        assert_eq!(OperationKind::parse("update_one").unwrap(), OperationKind::Update);
        assert_eq!(OperationKind::parse("delete_item").unwrap(), OperationKind::Delete);
    }

    #[test]
    fn test_unknown_operation_is_unsupported() {
        let err = OperationKind::parse("aggregate").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedOperation);
        assert!(err.to_string().contains("aggregate"));
    }

    #[test]
    fn test_descriptor_from_json_with_aliases() {
        let op = Operation::from_json(
            r#"{"table": "users", "operation": "put_item", "key": "u1", "item": {"name": "ada"}}"#,
        )
        .unwrap();
        assert_eq!(op.collection, "users");
        assert_eq!(op.key.as_deref(), Some("u1"));
        assert_eq!(op.document, Some(json!({"name": "ada"})));
        assert_eq!(op.kind().unwrap(), OperationKind::Insert);
    }

    #[test]
    fn test_descriptor_keeps_unknown_operation_name() {
        let op = Operation::from_json(r#"{"collection": "c", "operation": "mapreduce"}"#).unwrap();
        assert_eq!(op.operation, "mapreduce");
        assert!(op.kind().is_err());
    }

    #[test]
    fn test_invalid_descriptor_is_validation_error() {
        let err = Operation::from_json("SELECT * FROM users").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let err = Operation::from_json(r#"{"collection": " ", "operation": "find"}"#).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_missing_parameters_are_execution_errors() {
        let op = Operation::new("users", "get_item");
        assert_eq!(op.require_key().unwrap_err().kind(), ErrorKind::QueryExecution);
        assert!(op.require_document().is_err());
        assert!(op.require_update().is_err());
    }

    #[test]
    fn test_to_json_omits_absent_fields() {
        let op = Operation::new("users", "find").with_limit(5);
        assert_eq!(
            op.to_json(),
            r#"{"collection":"users","operation":"find","limit":5}"#
        );
    }
}
