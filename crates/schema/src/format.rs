//! Built-in field formatters.
//!
//! Each formatter passes through values it does not understand, so a
//! formatter can never turn a valid row into an invalid one.

use crate::value::Value;

const PRIORITY_LABELS: [&str; 5] = ["None", "Urgent", "High", "Medium", "Low"];

/// `0..=4` → `None`/`Urgent`/`High`/`Medium`/`Low`.
#[must_use]
pub fn priority_label(value: &Value) -> Value {
    value
        .as_i64()
        .and_then(|n| usize::try_from(n).ok())
        .and_then(|idx| PRIORITY_LABELS.get(idx))
        .map_or_else(|| value.clone(), |label| Value::from(*label))
}

/// Cycle number `5` → `c5`.
#[must_use]
pub fn cycle_tag(value: &Value) -> Value {
    value
        .as_i64()
        .map_or_else(|| value.clone(), |n| Value::Str(format!("c{n}")))
}

/// ISO-8601 timestamp → `YYYY-MM-DD`.
#[must_use]
pub fn date_only(value: &Value) -> Value {
    match value.as_str() {
        Some(s) if s.len() > 10 && s.as_bytes()[10] == b'T' && s.is_char_boundary(10) => {
            Value::from(&s[..10])
        }
        _ => value.clone(),
    }
}

/// Fraction `0.0..=1.0` → whole percent string, e.g. `0.42` → `42%`.
#[must_use]
pub fn percent(value: &Value) -> Value {
    match value.as_f64() {
        Some(f) if f.is_finite() && (0.0..=1.0).contains(&f) => {
            // `abs` folds `-0.0` into `0`.
            Value::Str(format!("{}%", (f * 100.0).round().abs()))
        }
        _ => value.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_maps_known_levels_only() {
        assert_eq!(priority_label(&Value::Int(1)), Value::from("Urgent"));
        assert_eq!(priority_label(&Value::Int(4)), Value::from("Low"));
        assert_eq!(priority_label(&Value::Int(9)), Value::Int(9));
        assert_eq!(priority_label(&Value::from("High")), Value::from("High"));
    }

    #[test]
    fn cycle_accepts_integral_floats() {
        assert_eq!(cycle_tag(&Value::Float(12.0)), Value::from("c12"));
        assert_eq!(cycle_tag(&Value::Float(1.5)), Value::Float(1.5));
    }

    #[test]
    fn date_only_truncates_timestamps() {
        assert_eq!(
            date_only(&Value::from("2024-05-01T10:22:00.000Z")),
            Value::from("2024-05-01")
        );
        assert_eq!(date_only(&Value::from("2024-05-01")), Value::from("2024-05-01"));
    }

    #[test]
    fn percent_rounds_fractions() {
        assert_eq!(percent(&Value::Float(0.424)), Value::from("42%"));
        assert_eq!(percent(&Value::Int(1)), Value::from("100%"));
        assert_eq!(percent(&Value::Float(-0.0)), Value::from("0%"));
        assert_eq!(percent(&Value::Float(3.5)), Value::Float(3.5));
    }
}
