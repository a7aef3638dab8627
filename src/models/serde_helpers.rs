//! Lenient deserializers for upstream telemetry payloads.
//!
//! The query service is inconsistent about how it encodes numbers: 64-bit
//! values arrive as strings, absent readings arrive as `null` or are omitted,
//! and timestamps may be plain seconds, RFC 3339 text or `{seconds, nanos}`
//! objects. None of that is an error at this layer; anything that cannot be
//! read as a finite number decodes as `0`.

use chrono::DateTime;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Reads a JSON value as a finite `f64`, if it holds one.
pub fn finite_f64(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    number.filter(|v| v.is_finite())
}

/// Reads a JSON value as unix seconds. Unreadable values become `0`.
pub fn unix_seconds(value: &Value) -> i64 {
    match value {
        Value::Object(map) => map.get("seconds").map(unix_seconds).unwrap_or(0),
        Value::String(s) => match DateTime::parse_from_rfc3339(s.trim()) {
            Ok(parsed) => parsed.timestamp(),
            Err(_) => finite_f64(value).map(|v| v.trunc() as i64).unwrap_or(0),
        },
        other => finite_f64(other).map(|v| v.trunc() as i64).unwrap_or(0),
    }
}

pub fn lenient_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(finite_f64).unwrap_or(0.0))
}

pub fn lenient_opt_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(finite_f64))
}

pub fn lenient_u64<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = lenient_f64(deserializer)?;
    Ok(value.max(0.0).trunc() as u64)
}

pub fn lenient_timestamp<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().map(unix_seconds).unwrap_or(0))
}

/// Strings that arrive as numbers (or `null`) are kept as their text form.
pub fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => s,
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_finite_f64_accepts_numbers_and_numeric_strings() {
        assert_eq!(finite_f64(&json!(12.5)), Some(12.5));
        assert_eq!(finite_f64(&json!(" 42 ")), Some(42.0));
        assert_eq!(finite_f64(&json!("NaN")), None);
        assert_eq!(finite_f64(&json!("inf")), None);
        assert_eq!(finite_f64(&json!("abc")), None);
        assert_eq!(finite_f64(&json!(true)), None);
        assert_eq!(finite_f64(&json!(null)), None);
    }

    #[test]
    fn test_unix_seconds_encodings() {
        assert_eq!(unix_seconds(&json!(1_700_000_000)), 1_700_000_000);
        assert_eq!(unix_seconds(&json!("1700000000")), 1_700_000_000);
        assert_eq!(unix_seconds(&json!({ "seconds": "1700000000", "nanos": 0 })), 1_700_000_000);
        assert_eq!(unix_seconds(&json!("2023-11-14T22:13:20Z")), 1_700_000_000);
        assert_eq!(unix_seconds(&json!("not a time")), 0);
        assert_eq!(unix_seconds(&json!({ "nanos": 5 })), 0);
    }
}
