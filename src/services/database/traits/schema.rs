//! Schema types shared by all drivers.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Mapping from table/collection name to its ordered column/field names.
///
/// Document stores report only the fields of one sampled document, and
/// key-value stores report table names with no columns at all.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Schema {
    tables: BTreeMap<String, Vec<String>>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) a table with its columns.
    pub fn insert_table(&mut self, table: impl Into<String>, columns: Vec<String>) {
        self.tables.insert(table.into(), columns);
    }

    /// Append a column to a table, creating the table if needed.
    pub fn push_column(&mut self, table: impl Into<String>, column: impl Into<String>) {
        self.tables.entry(table.into()).or_default().push(column.into());
    }

    /// Builder-style variant of [`Schema::insert_table`].
    pub fn with_table<S: Into<String>>(mut self, table: impl Into<String>, columns: Vec<S>) -> Self {
        self.insert_table(table, columns.into_iter().map(Into::into).collect());
        self
    }

    pub fn columns(&self, table: &str) -> Option<&[String]> {
        self.tables.get(table).map(Vec::as_slice)
    }

    pub fn contains_table(&self, table: &str) -> bool {
        self.tables.contains_key(table)
    }

    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    pub fn tables(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.tables.iter().map(|(t, c)| (t.as_str(), c.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Render the schema for embedding in a generation prompt.
    pub fn to_prompt_string(&self) -> String {
        serde_json::to_string(&self.tables).unwrap_or_else(|_| "{}".to_string())
    }
}

impl FromIterator<(String, Vec<String>)> for Schema {
    fn from_iter<I: IntoIterator<Item = (String, Vec<String>)>>(iter: I) -> Self {
        Self {
            tables: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_builder_and_lookup() {
        let schema = Schema::new()
            .with_table("users", vec!["id", "name"])
            .with_table("orders", vec!["id", "user_id", "total"]);

        assert_eq!(schema.len(), 2);
        assert!(schema.contains_table("users"));
        assert_eq!(
            schema.columns("users"),
            Some(&["id".to_string(), "name".to_string()][..])
        );
        assert_eq!(schema.columns("missing"), None);
        assert_eq!(schema.table_names().collect::<Vec<_>>(), vec!["orders", "users"]);
    }

    #[test]
    fn test_column_order_is_preserved() {
        let schema = Schema::new().with_table("t", vec!["z", "a", "m"]);
        assert_eq!(
            schema.columns("t").unwrap(),
            &["z".to_string(), "a".to_string(), "m".to_string()]
        );
    }

    #[test]
    fn test_push_column() {
        let mut schema: Schema = vec![("empty".to_string(), vec![])].into_iter().collect();
        schema.push_column("users", "id");
        schema.push_column("users", "name");

        assert_eq!(schema.columns("empty"), Some(&[][..]));
        assert_eq!(
            schema.columns("users").unwrap(),
            &["id".to_string(), "name".to_string()]
        );
    }

    #[test]
    fn test_prompt_rendering() {
        let schema = Schema::new().with_table("users", vec!["id", "name"]);
        assert_eq!(schema.to_prompt_string(), r#"{"users":["id","name"]}"#);
        assert_eq!(Schema::new().to_prompt_string(), "{}");
    }
}
