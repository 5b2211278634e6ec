//! Lenient readers for provider payloads.
//!
//! The provider encodes most numbers as strings. Fields may also arrive as
//! JSON numbers or be missing; anything unreadable becomes zero.

use chrono::NaiveDate;
use serde_json::Value;

pub(crate) fn number(obj: &Value, field: &str) -> f64 {
    match obj.get(field) {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().replace(',', "").parse().unwrap_or(0.0),
        _ => 0.0,
    }
}

/// Non-negative integer field; negative or fractional input is clamped/truncated.
pub(crate) fn integer(obj: &Value, field: &str) -> u64 {
    match obj.get(field) {
        Some(Value::Number(n)) => n.as_u64().unwrap_or_else(|| n.as_f64().unwrap_or(0.0) as u64),
        Some(Value::String(s)) => {
            let s = s.trim().replace(',', "");
            s.parse::<u64>()
                .unwrap_or_else(|_| s.parse::<f64>().unwrap_or(0.0) as u64)
        }
        _ => 0,
    }
}

pub(crate) fn text(obj: &Value, field: &str) -> String {
    match obj.get(field) {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

/// `YYYYMMDD` to market open in KST. Unparseable dates pass through.
pub(crate) fn trading_day_timestamp(date: &str) -> String {
    match NaiveDate::parse_from_str(date.trim(), "%Y%m%d") {
        Ok(day) => day.format("%Y-%m-%dT09:00:00+09:00").to_string(),
        Err(_) => date.to_string(),
    }
}

/// The `output` object, or an empty object.
pub(crate) fn output(body: &Value) -> &Value {
    static EMPTY: Value = Value::Null;
    body.get("output").unwrap_or(&EMPTY)
}

/// Rows of an array field, or none.
pub(crate) fn rows<'a>(body: &'a Value, field: &str) -> &'a [Value] {
    body.get(field)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}
