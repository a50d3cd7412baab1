//! Date normalization and lenient number decoding shared by the API models.

use chrono::NaiveDate;
use crate::GiziCareError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Normalize a date string to a calendar date.
///
/// Accepts:
/// - YYYY-MM-DD
/// - RFC3339 datetime (date part in its own offset)
/// - Naive datetime YYYY-MM-DDTHH:MM:SS or YYYY-MM-DD HH:MM:SS
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(d);
    }
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(ndt) = chrono::NaiveDateTime::parse_from_str(s, fmt) {
            return Some(ndt.date());
        }
    }
    None
}

/// Format a date the way the API expects it in paths and payloads.
pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Interpret a loosely typed JSON scalar as a number.
///
/// Numbers pass through, numeric strings are parsed, booleans, null and
/// anything else yield `None`.
pub fn number_from_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        _ => None,
    }
}

/// Unwrap a `{"data": ...}` envelope if present.
pub fn unwrap_data(value: Value) -> Value {
    match value {
        Value::Object(mut map) if map.contains_key("data") => {
            map.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    }
}

/// Decode an array payload row by row, dropping rows that fail to decode.
/// A non-array payload is a decode error.
pub fn decode_rows<T: DeserializeOwned>(value: Value, what: &str) -> Result<Vec<T>, GiziCareError> {
    let Value::Array(rows) = unwrap_data(value) else {
        return Err(GiziCareError::Decode {
            what: what.to_string(),
            message: "expected an array".into(),
        });
    };
    Ok(rows
        .into_iter()
        .filter_map(|row| match serde_json::from_value::<T>(row) {
            Ok(item) => Some(item),
            Err(e) => {
                tracing::warn!("skipping malformed {} row: {}", what, e);
                None
            }
        })
        .collect())
}

/// Strict: a number or a numeric string, anything else is a decode error.
pub(crate) fn de_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;
    let value = Value::deserialize(deserializer)?;
    number_from_value(&value)
        .ok_or_else(|| D::Error::custom(format!("expected a number, got {value}")))
}

pub(crate) fn de_u32<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;
    let v = de_f64(deserializer)?;
    if v < 0.0 || v > f64::from(u32::MAX) {
        return Err(D::Error::custom(format!("out of range: {v}")));
    }
    Ok(v.round() as u32)
}

/// Optional number: null, missing or unparsable become `None`.
pub(crate) fn de_opt_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<Value> = Option::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(number_from_value))
}

/// Lenient number: anything non-numeric coerces to 0.
pub(crate) fn de_lenient_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(de_opt_f64(deserializer)?.unwrap_or(0.0))
}

pub(crate) fn de_lenient_u64<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(de_lenient_f64(deserializer)?.max(0.0).round() as u64)
}

/// Ids sometimes arrive as strings; accept either.
pub(crate) fn de_id<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;
    let value = Value::deserialize(deserializer)?;
    match &value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    }
    .ok_or_else(|| D::Error::custom(format!("expected an id, got {value}")))
}

pub(crate) fn de_opt_id<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<Value> = Option::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_u64(),
        Some(Value::String(s)) => s.trim().parse::<u64>().ok(),
        _ => None,
    })
}

/// Notification ids are strings for locally generated reminders and numbers
/// for server rows.
pub(crate) fn de_string_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;
    let value = Value::deserialize(deserializer)?;
    match value {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(D::Error::custom(format!(
            "expected string or number, got {other}"
        ))),
    }
}

pub(crate) fn de_date<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;
    let s = String::deserialize(deserializer)?;
    parse_date(&s).ok_or_else(|| D::Error::custom(format!("invalid date: {s}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_date_accepts_date_only() {
        let d = parse_date("2025-12-15").unwrap();
        assert_eq!(format_date(d), "2025-12-15");
    }

    #[test]
    fn parse_date_accepts_datetimes() {
        assert_eq!(
            parse_date("2025-12-15T10:30:00").unwrap().to_string(),
            "2025-12-15"
        );
        assert_eq!(
            parse_date("2025-12-15T10:30:00.000000Z").unwrap().to_string(),
            "2025-12-15"
        );
        assert_eq!(
            parse_date("2025-12-15 23:59:59").unwrap().to_string(),
            "2025-12-15"
        );
    }

    #[test]
    fn parse_date_rejects_invalid() {
        assert!(parse_date("not-a-date").is_none());
        assert!(parse_date("2025-13-01").is_none());
    }

    #[test]
    fn decode_rows_unwraps_envelope_and_skips_bad_rows() {
        let rows: Vec<u64> = decode_rows(json!({"data": [1, "x", 3]}), "ids").unwrap();
        assert_eq!(rows, vec![1, 3]);
        let bare: Vec<u64> = decode_rows(json!([4]), "ids").unwrap();
        assert_eq!(bare, vec![4]);
        assert!(decode_rows::<u64>(json!({"message": "nope"}), "ids").is_err());
    }

    #[test]
    fn number_from_value_coerces_strings() {
        assert_eq!(number_from_value(&json!("72.5")), Some(72.5));
        assert_eq!(number_from_value(&json!(3)), Some(3.0));
        assert_eq!(number_from_value(&json!("abc")), None);
        assert_eq!(number_from_value(&json!(null)), None);
        assert_eq!(number_from_value(&json!(true)), None);
    }
}
