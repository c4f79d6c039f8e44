//! Lenient numeric coercion for values that arrive from untrusted producers.
//!
//! Generators and web forms hand us numbers as JSON numbers, as strings with
//! thousands separators (`"1,200"`), with magnitude suffixes (`"5k"`, `"1.2m"`),
//! or not at all. Nothing in here fails: anything unusable becomes `None`.

use serde_json::Value;

/// Read a finite `f64` out of a JSON value.
pub(crate) fn coerce_f64(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => parse_text(text),
        Value::Bool(_) | Value::Null | Value::Array(_) | Value::Object(_) => None,
    }?;
    parsed.is_finite().then_some(parsed)
}

pub(crate) fn clamp(value: &Value, lo: f64, hi: f64) -> f64 {
    coerce_f64(value).map(|v| v.clamp(lo, hi)).unwrap_or(lo)
}

/// Clamp an already-typed number; NaN and infinities collapse to zero.
pub(crate) fn finite_non_negative(value: f64) -> f64 {
    if value.is_finite() {
        value.max(0.0)
    } else {
        0.0
    }
}

pub(crate) fn coerce_string(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => {
            let trimmed = text.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

fn parse_text(text: &str) -> Option<f64> {
    let cleaned: String = text
        .trim()
        .chars()
        .filter(|ch| *ch != ',' && *ch != '_' && !ch.is_whitespace())
        .collect();
    if cleaned.is_empty() {
        return None;
    }

    let lower = cleaned.to_ascii_lowercase();
    let (digits, multiplier) = if let Some(stripped) = lower.strip_suffix('k') {
        (stripped, 1_000.0)
    } else if let Some(stripped) = lower.strip_suffix('m') {
        (stripped, 1_000_000.0)
    } else {
        (lower.as_str(), 1.0)
    };

    digits.parse::<f64>().ok().map(|value| value * multiplier)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reads_numbers_and_numeric_strings() {
        assert_eq!(coerce_f64(&json!(12.5)), Some(12.5));
        assert_eq!(coerce_f64(&json!("1,200")), Some(1200.0));
        assert_eq!(coerce_f64(&json!(" 5k ")), Some(5000.0));
        assert_eq!(coerce_f64(&json!("1.5M")), Some(1_500_000.0));
    }

    #[test]
    fn rejects_unusable_values() {
        assert_eq!(coerce_f64(&json!(null)), None);
        assert_eq!(coerce_f64(&json!("about ten")), None);
        assert_eq!(coerce_f64(&json!(true)), None);
        assert_eq!(coerce_f64(&json!("")), None);
        assert_eq!(coerce_f64(&json!("inf")), None);
    }

    #[test]
    fn clamps_into_range_with_lower_bound_fallback() {
        assert_eq!(clamp(&json!(30), 0.0, 24.0), 24.0);
        assert_eq!(clamp(&json!(-3), 0.0, 24.0), 0.0);
        assert_eq!(clamp(&json!("n/a"), 1.0, 5.0), 1.0);
        assert_eq!(finite_non_negative(f64::NAN), 0.0);
    }
}
