//! Lenient field access for inbound payloads.
//!
//! Only a null payload or a missing correlation id drops an envelope. Any
//! other field with an unexpected type falls back to its default.

use serde_json::{Map, Value};

pub(super) type Fields = Map<String, Value>;

/// Top-level object of a payload. `None` for null and non-object payloads.
pub(super) fn fields(value: Value) -> Option<Fields> {
    match value {
        Value::Object(map) => Some(map),
        _ => None,
    }
}

/// Correlation id under `key`, absent only when missing or null.
///
/// Non-string ids are kept in their JSON text form, so `7` becomes `"7"`.
pub(super) fn correlation_id(fields: &Fields, key: &str) -> Option<String> {
    match fields.get(key)? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Strings as-is, numbers stringified, anything else absent.
pub(super) fn text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

pub(super) fn name(fields: &Fields) -> String {
    fields.get("name").and_then(text).unwrap_or_default()
}

pub(super) fn flag(fields: &Fields, key: &str) -> bool {
    fields.get(key).and_then(Value::as_bool).unwrap_or(false)
}

/// Moves the value under `key` out, `Null` when absent.
pub(super) fn take(fields: &mut Fields, key: &str) -> Value {
    fields.remove(key).unwrap_or(Value::Null)
}
