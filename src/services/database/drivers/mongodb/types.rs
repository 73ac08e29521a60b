//! BSON <-> JSON conversion for the document driver.
//!
//! Descriptors arrive as JSON; documents leave as relaxed extended JSON so
//! ObjectIds and dates stay readable (`{"$oid": "..."}`).

use mongodb::bson::{Bson, Document};
use serde_json::Value as JsonValue;

/// Convert a JSON object (possibly extended JSON) into a BSON document.
pub fn json_to_document(value: &JsonValue) -> Result<Document, String> {
    match Bson::try_from(value.clone()) {
        Ok(Bson::Document(doc)) => Ok(doc),
        Ok(other) => Err(format!("expected a JSON object, got {:?}", other.element_type())),
        Err(e) => Err(e.to_string()),
    }
}

/// Optional JSON filter to a BSON document, `{}` when absent.
pub fn filter_document(filter: Option<&JsonValue>) -> Result<Document, String> {
    filter.map_or_else(|| Ok(Document::new()), json_to_document)
}

/// Convert a BSON document to relaxed extended JSON.
pub fn document_to_json(doc: Document) -> JsonValue {
    Bson::Document(doc).into_relaxed_extjson()
}

/// Render an inserted id as plain text.
pub fn id_to_string(id: &Bson) -> String {
    match id {
        Bson::ObjectId(oid) => oid.to_hex(),
        Bson::String(s) => s.clone(),
        other => other.to_string(),
    }
}
