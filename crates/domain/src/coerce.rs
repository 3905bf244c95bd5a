//! Lenient numeric coercion for untrusted input.
//!
//! Both the storefront client and the wholesaler API deliver numbers in
//! whatever shape they feel like: JSON numbers, strings with a comma decimal
//! separator, empty strings, or nothing at all. Coercion never fails; any
//! value that cannot be read as a number becomes zero, so a malformed price
//! in one line item cannot abort a whole order.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Reads a JSON value as `f64`, defaulting to `0.0`.
///
/// String input may use a comma decimal separator (`"12,50"` parses as
/// `12.5`). Empty strings, nulls, and non-numeric values all yield `0.0`.
pub fn to_f64(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => {
            let normalized = s.trim().replace(',', ".");
            if normalized.is_empty() {
                0.0
            } else {
                normalized.parse().unwrap_or(0.0)
            }
        }
        _ => 0.0,
    }
}

/// Reads a JSON value as `i64`, defaulting to `0`.
///
/// A fractional number is truncated; strings are parsed as integers first
/// and fall back to float parsing so `"3.0"` still counts as 3.
pub fn to_i64(value: &Value) -> i64 {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .unwrap_or(0),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                0
            } else {
                trimmed
                    .parse::<i64>()
                    .unwrap_or_else(|_| to_f64(value) as i64)
            }
        }
        _ => 0,
    }
}

/// Serde adapter: deserializes any JSON value into an `f64` via [`to_f64`].
pub fn lenient_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(to_f64(&value))
}

/// Serde adapter: deserializes any JSON value into an `i32` via [`to_i64`].
pub fn lenient_i32<'de, D>(deserializer: D) -> Result<i32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(to_i64(&value).clamp(i32::MIN as i64, i32::MAX as i64) as i32)
}
