use serde::{Deserialize, Serialize};
use std::fmt;

/// 2^63: every `f64` in `-I64_LIMIT..I64_LIMIT` truncates to a valid `i64`.
const I64_LIMIT: f64 = 9_223_372_036_854_775_808.0;

/// A single cell value as stored.
///
/// Variants mirror SQLite storage classes, so a value read back is reported
/// the way it was written (no re-coercion on read).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    #[default]
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

impl FieldValue {
    /// Integer parse with fallback to `0`.
    ///
    /// Decimal input such as `"12.9"` is truncated toward zero. Input outside
    /// the `i64` range is malformed, it never saturates.
    #[allow(clippy::cast_possible_truncation)]
    pub fn parse_integer(raw: &str) -> i64 {
        let raw = raw.trim();
        if let Ok(v) = raw.parse::<i64>() {
            return v;
        }
        match raw.parse::<f64>() {
            // Range checked, so the cast only drops the fraction.
            Ok(v) if (-I64_LIMIT..I64_LIMIT).contains(&v) => v.trunc() as i64,
            _ => 0,
        }
    }

    /// Real parse with fallback to `0.0`. Non-finite input counts as malformed.
    pub fn parse_real(raw: &str) -> f64 {
        match raw.trim().parse::<f64>() {
            Ok(v) if v.is_finite() => v,
            _ => 0.0,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// Numeric view, used for the `power_draw_amps` core field.
    ///
    /// Integers beyond 2^53 lose precision.
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> f64 {
        match self {
            FieldValue::Null => 0.0,
            FieldValue::Integer(v) => *v as f64,
            FieldValue::Real(v) => *v,
            FieldValue::Text(s) => Self::parse_real(s),
        }
    }

    /// Text form used by exports. NULL renders empty; reals keep one
    /// fractional digit at minimum (`1.0`, `12.5`).
    pub fn render(&self) -> String {
        match self {
            FieldValue::Null => String::new(),
            FieldValue::Integer(v) => v.to_string(),
            FieldValue::Real(v) => render_real(*v),
            FieldValue::Text(s) => s.clone(),
        }
    }

    pub fn into_text(self) -> String {
        match self {
            FieldValue::Text(s) => s,
            other => other.render(),
        }
    }
}

fn render_real(v: f64) -> String {
    if v.is_finite() && v.fract() == 0.0 {
        format!("{v:.1}")
    } else {
        v.to_string()
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Integer(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Real(value)
    }
}
