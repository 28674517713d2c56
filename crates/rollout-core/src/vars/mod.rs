//! Variable mappings and the deep-merge used to layer them

mod merge;

pub use merge::{deep_merge, merge_layers};

use serde_json::Value;

/// A nested key→value tree of variables.
///
/// Backed by an insertion-ordered JSON object so that resolved inventories
/// serialize deterministically.
pub type VarMap = serde_json::Map<String, Value>;

/// Interpret a loaded document as a variable mapping.
///
/// `null` counts as an empty mapping; any other non-object value is
/// rejected and handed back to the caller for error reporting.
pub fn into_mapping(value: Value) -> std::result::Result<VarMap, Value> {
    match value {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(VarMap::new()),
        other => Err(other),
    }
}

/// Short description of a JSON value's type, for error messages.
pub fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "sequence",
        Value::Object(_) => "mapping",
    }
}
