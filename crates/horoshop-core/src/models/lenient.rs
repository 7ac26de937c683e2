//! Tolerant conversions for payload fields that arrive as numbers or as
//! numeric strings depending on store settings.

use serde_json::{Map, Value};

pub(crate) fn as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

pub(crate) fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

pub(crate) fn as_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Remove `key` and convert it. A value that does not convert stays in `map`.
pub(crate) fn take<T>(
    map: &mut Map<String, Value>,
    key: &str,
    convert: impl Fn(&Value) -> Option<T>,
) -> Option<T> {
    let value = map.remove(key)?;
    match convert(&value) {
        Some(converted) => Some(converted),
        None => {
            if !value.is_null() {
                map.insert(key.to_string(), value);
            }
            None
        }
    }
}
