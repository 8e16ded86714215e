//! Wire mapping seam between JSON payloads and models.
//!
//! Routers never deserialize request bodies straight into a model: a
//! `RecordSerializer` turns the raw JSON into a record field by field, so
//! that every bad field is reported at once instead of failing on the first.

use repustore_core::{FieldErrors, ServiceError};
use serde::Serialize;
use serde_json::{Map, Value};

/// Maps a model to and from its wire representation.
pub trait RecordSerializer<T: Serialize>: Send + Sync + 'static {
    /// Render a stored record for a response body.
    fn to_json(&self, record: &T) -> Result<Value, ServiceError> {
        serde_json::to_value(record)
            .map_err(|e| ServiceError::Internal(format!("serialize: {}", e)))
    }

    /// Build a new (unsaved) record from a create payload.
    fn create(&self, payload: &Value) -> Result<T, FieldErrors>;

    /// Apply an update payload onto a stored record.
    ///
    /// With `partial` (PATCH) only the fields present are touched; otherwise
    /// required fields must be present.
    fn update(&self, current: &T, payload: &Value, partial: bool) -> Result<T, FieldErrors>;
}

/// Field name used for errors that are not tied to one field.
pub const NON_FIELD_ERRORS: &str = "non_field_errors";

/// Require the payload to be a JSON object.
pub fn expect_object(payload: &Value) -> Result<&Map<String, Value>, FieldErrors> {
    payload.as_object().ok_or_else(|| {
        FieldErrors::single(
            NON_FIELD_ERRORS,
            format!(
                "Invalid data. Expected a dictionary, but got {}.",
                json_type_name(payload)
            ),
        )
    })
}

fn json_type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "str",
        Value::Array(_) => "list",
        Value::Object(_) => "dict",
    }
}
