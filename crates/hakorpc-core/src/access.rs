//! # Tolerant Field Access
//!
//! Typed reads from an untrusted `serde_json::Value`. Every helper returns
//! `None` when the container is not an object, when the key is absent or
//! `null`, or when the value has the wrong type, so a single malformed
//! field never prevents the rest of a document from being checked.
//!
//! Integers are JSON integers only: `24` is an integer, `24.0` and `true`
//! are not.

use serde_json::Value;

/// Raw value of `key` in an object, treating `null` as absent.
pub fn field<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    value.as_object()?.get(key).filter(|v| !v.is_null())
}

/// String value of `key`, which may be empty.
pub fn str_field<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    field(value, key)?.as_str()
}

/// String value of `key`, only if it is non-empty.
pub fn non_empty_str<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    str_field(value, key).filter(|s| !s.is_empty())
}

/// Integer value of `key`. Covers the full `i64` and `u64` ranges.
pub fn int_field(value: &Value, key: &str) -> Option<i128> {
    as_int(field(value, key)?)
}

/// Array value of `key`.
pub fn array_field<'a>(value: &'a Value, key: &str) -> Option<&'a Vec<Value>> {
    field(value, key)?.as_array()
}

/// Interpret a value as a JSON integer.
pub fn as_int(value: &Value) -> Option<i128> {
    let Value::Number(number) = value else {
        return None;
    };
    if let Some(i) = number.as_i64() {
        Some(i128::from(i))
    } else {
        number.as_u64().map(i128::from)
    }
}
