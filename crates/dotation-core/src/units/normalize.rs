//! Numeric input normalization.
//!
//! Quantities typed by staff or read back from storage are never rejected:
//! negative, non-finite and non-numeric values become zero, fractions are
//! floored.

use serde_json::Value;

/// Clamp a number to a non-negative integer.
pub fn clamp_int(value: f64) -> u64 {
    if !value.is_finite() || value < 0.0 {
        return 0;
    }
    // Float-to-int casts saturate at u64::MAX.
    value.floor() as u64
}

/// Normalize free-text quantity input.
///
/// Returns `None` for empty input (the field was cleared), otherwise the
/// clamped value; unparsable text counts as zero.
pub fn parse_quantity(input: &str) -> Option<u64> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.parse::<f64>().map_or(0, clamp_int))
}

/// Normalize a loosely typed JSON value (number, numeric string, anything else).
pub fn clamp_value(value: &Value) -> u64 {
    match value {
        Value::Number(n) => n.as_u64().unwrap_or_else(|| n.as_f64().map_or(0, clamp_int)),
        Value::String(s) => parse_quantity(s).unwrap_or(0),
        Value::Bool(true) => 1,
        _ => 0,
    }
}

/// Stringify a loosely typed JSON value the way identifiers are read:
/// strings as-is, null as empty, anything else via its JSON text.
pub fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_clamp_int() {
        assert_eq!(clamp_int(12.9), 12);
        assert_eq!(clamp_int(-3.0), 0);
        assert_eq!(clamp_int(f64::NAN), 0);
        assert_eq!(clamp_int(f64::INFINITY), 0);
        assert_eq!(clamp_int(0.0), 0);
    }

    #[test]
    fn test_parse_quantity() {
        assert_eq!(parse_quantity(""), None);
        assert_eq!(parse_quantity("   "), None);
        assert_eq!(parse_quantity(" 7 "), Some(7));
        assert_eq!(parse_quantity("2.5"), Some(2));
        assert_eq!(parse_quantity("-4"), Some(0));
        assert_eq!(parse_quantity("abc"), Some(0));
        assert_eq!(parse_quantity("1e2"), Some(100));
    }

    #[test]
    fn test_clamp_value() {
        assert_eq!(clamp_value(&json!(40)), 40);
        assert_eq!(clamp_value(&json!(-1)), 0);
        assert_eq!(clamp_value(&json!(3.7)), 3);
        assert_eq!(clamp_value(&json!("12")), 12);
        assert_eq!(clamp_value(&json!(null)), 0);
        assert_eq!(clamp_value(&json!([1])), 0);
    }

    #[test]
    fn test_value_to_string() {
        assert_eq!(value_to_string(&json!("A1")), "A1");
        assert_eq!(value_to_string(&json!(42)), "42");
        assert_eq!(value_to_string(&json!(null)), "");
    }
}
