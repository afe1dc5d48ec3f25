//! Tolerant field deserializers for upstream JSON.
//!
//! The mall API is inconsistent about scalar types: prices arrive as
//! `"12900.00"`, `12900`, or `null` depending on the endpoint. These helpers
//! collapse all of those into `String`/`Option<String>` so a missing or
//! oddly-typed field never fails a whole payload.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

fn scalar_to_string(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Deserializes any JSON scalar into `Some(String)`; `null`, arrays, objects
/// and empty strings become `None`.
///
/// # Errors
///
/// Only fails when the input is not valid JSON at all.
pub fn opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .and_then(scalar_to_string)
        .map(|s| s.trim().to_owned())
        .filter(|s| !s.is_empty()))
}

/// Like [`opt_string`] but yields an empty string instead of `None`.
///
/// # Errors
///
/// Only fails when the input is not valid JSON at all.
pub fn string_or_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(opt_string(deserializer)?.unwrap_or_default())
}

/// Accepts `true`/`false`, `1`/`0`, and the strings `"true"`/`"1"`/`"yes"`.
/// Anything else (including `null`) is `false`.
///
/// # Errors
///
/// Only fails when the input is not valid JSON at all.
pub fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Bool(b)) => b,
        Some(Value::Number(n)) => n.as_i64().is_some_and(|v| v != 0),
        Some(Value::String(s)) => matches!(s.trim().to_ascii_lowercase().as_str(), "true" | "1" | "yes"),
        _ => false,
    })
}

/// Accepts a number or a numeric string. `null`, non-numeric strings and
/// non-finite values become `0.0`.
///
/// # Errors
///
/// Only fails when the input is not valid JSON at all.
pub fn fraction<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    let parsed = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    Ok(parsed.filter(|v| v.is_finite()).unwrap_or_default())
}
