//! Filter compilation errors.

use thiserror::Error;

/// Why a hook's filter document could not be compiled.
///
/// Compilation failures are scoped to the offending hook: the dispatch loop
/// logs them and moves on to the next hook.
#[derive(Debug, Error)]
pub enum FilterError {
    /// The filter document (or a `related` entry) was not a JSON object.
    #[error("filter document is not an object: found {found}")]
    Malformed {
        /// JSON type name of the offending value.
        found: &'static str,
    },
}

/// JSON type name for error messages.
pub(crate) fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
