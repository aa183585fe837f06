//! Raw customer records and the lenient coercions every stage shares.

use serde_json::{Map, Number, Value};

/// A loosely-typed customer record as submitted by the caller.
pub type RawRecord = Map<String, Value>;

/// Placeholder for categorical values that are absent or null.
pub const UNKNOWN_CATEGORY: &str = "Unknown";

/// Coerce a JSON value to a number the way a lenient "to numeric" does.
///
/// Numbers pass through, booleans become 1/0, strings are trimmed and
/// parsed. Null, empty strings, `NaN` and containers are missing.
pub fn to_numeric(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    };
    parsed.filter(|v| !v.is_nan())
}

/// Numeric value of `field`, or `None` when absent or not coercible.
pub fn numeric_field(record: &RawRecord, field: &str) -> Option<f64> {
    record.get(field).and_then(to_numeric)
}

/// Numeric value of `field`, falling back to `default`.
pub fn numeric_or(record: &RawRecord, field: &str, default: f64) -> f64 {
    numeric_field(record, field).unwrap_or(default)
}

/// A field is missing when absent, null, or not coercible to a number.
pub fn is_missing_numeric(record: &RawRecord, field: &str) -> bool {
    numeric_field(record, field).is_none()
}

/// JSON representation of a computed number. Non-finite results are stored
/// as null so they resolve like any other missing value downstream.
pub fn number_value(v: f64) -> Value {
    if v.fract() == 0.0 && v.abs() < i64::MAX as f64 {
        return Value::Number(Number::from(v as i64));
    }
    Number::from_f64(v).map(Value::Number).unwrap_or(Value::Null)
}

/// Textual form of a categorical value, `None` when it should fall back
/// to [`UNKNOWN_CATEGORY`].
pub fn to_category(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Array(_) | Value::Object(_) => Some(value.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn numeric_coercion_is_lenient() {
        assert_eq!(to_numeric(&json!(3)), Some(3.0));
        assert_eq!(to_numeric(&json!(" 58138.5 ")), Some(58138.5));
        assert_eq!(to_numeric(&json!(true)), Some(1.0));
        assert_eq!(to_numeric(&json!("")), None);
        assert_eq!(to_numeric(&json!("n/a")), None);
        assert_eq!(to_numeric(&json!("NaN")), None);
        assert_eq!(to_numeric(&Value::Null), None);
        assert_eq!(to_numeric(&json!([1])), None);
    }

    #[test]
    fn missing_covers_absent_null_and_garbage() {
        let record: RawRecord = json!({"a": null, "b": "x", "c": "2"})
            .as_object()
            .cloned()
            .unwrap();
        assert!(is_missing_numeric(&record, "a"));
        assert!(is_missing_numeric(&record, "b"));
        assert!(is_missing_numeric(&record, "zzz"));
        assert!(!is_missing_numeric(&record, "c"));
    }

    #[test]
    fn whole_numbers_stay_integral() {
        assert_eq!(number_value(2.0), json!(2));
        assert_eq!(number_value(2.5), json!(2.5));
        assert_eq!(number_value(f64::INFINITY), Value::Null);
    }

    #[test]
    fn categories_render_as_text() {
        assert_eq!(to_category(&json!("Single")).as_deref(), Some("Single"));
        assert_eq!(to_category(&json!(2)).as_deref(), Some("2"));
        assert_eq!(to_category(&Value::Null), None);
    }
}
