//! Runtime value model
//!
//! All numerics are arbitrary-precision decimals so currency computations
//! never pick up binary-float drift. JSON values from the caller are
//! converted eagerly on the way in and back on the way out.

use rust_decimal::Decimal;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// A runtime value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Boolean(bool),
    Number(Decimal),
    String(String),
    List(Vec<Value>),
    Object(BTreeMap<String, Value>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Truthiness coercion: `null` is false; booleans pass through; numbers
    /// are true when non-zero; strings are true when trimmed/lowercased in
    /// {"true", "yes", "1"}; everything else is false.
    pub fn to_boolean(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Boolean(b) => *b,
            Value::Number(n) => !n.is_zero(),
            Value::String(s) => {
                matches!(s.trim().to_ascii_lowercase().as_str(), "true" | "yes" | "1")
            }
            Value::List(_) | Value::Object(_) => false,
        }
    }

    /// Numeric coercion: numbers pass through, numeric strings parse.
    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            Value::Number(n) => Some(*n),
            Value::String(s) => Decimal::from_str(s.trim())
                .or_else(|_| Decimal::from_scientific(s.trim()))
                .ok(),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Render the value the way the DSL would spell it (used by `length`,
    /// string functions, and log messages).
    pub fn to_display_string(&self) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::Boolean(b) => b.to_string(),
            Value::Number(n) => n.normalize().to_string(),
            Value::String(s) => s.clone(),
            Value::List(_) | Value::Object(_) => self.to_json().to_string(),
        }
    }

    /// Value equality: decimals compare numerically, strings case-sensitively,
    /// null equals only null, lists element-wise.
    pub fn value_equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            // Mixed numeric/string equality goes through numeric promotion
            (Value::Number(_), Value::String(_)) | (Value::String(_), Value::Number(_)) => {
                match (self.as_decimal(), other.as_decimal()) {
                    (Some(a), Some(b)) => a == b,
                    _ => false,
                }
            }
            (Value::List(a), Value::List(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.value_equals(y))
            }
            (Value::Object(a), Value::Object(b)) => a == b,
            _ => false,
        }
    }

    /// Ordering for relational comparisons. Numbers (and numeric strings)
    /// compare numerically; other strings compare lexicographically, which
    /// keeps ISO-8601 dates chronological.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        if let (Some(a), Some(b)) = (self.as_decimal(), other.as_decimal()) {
            return Some(a.cmp(&b));
        }
        match (self, other) {
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            (Value::Boolean(a), Value::Boolean(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    /// Convert from caller-supplied JSON.
    pub fn from_json(value: &serde_json::Value) -> Value {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Boolean(*b),
            serde_json::Value::Number(n) => {
                // Parse the printed form so 0.1 stays 0.1 instead of the
                // nearest binary double
                Decimal::from_str(&n.to_string())
                    .or_else(|_| Decimal::from_scientific(&n.to_string()))
                    .map(Value::Number)
                    .unwrap_or(Value::Null)
            }
            serde_json::Value::String(s) => Value::String(s.clone()),
            serde_json::Value::Array(items) => {
                Value::List(items.iter().map(Value::from_json).collect())
            }
            serde_json::Value::Object(entries) => Value::Object(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), Value::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// Convert to JSON for the output map.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Boolean(b) => serde_json::Value::Bool(*b),
            Value::Number(n) => {
                let normalized = n.normalize();
                if normalized.scale() == 0 {
                    if let Ok(int) = i64::try_from(normalized.mantissa()) {
                        return serde_json::Value::Number(int.into());
                    }
                }
                use rust_decimal::prelude::ToPrimitive;
                normalized
                    .to_f64()
                    .and_then(serde_json::Number::from_f64)
                    .map(serde_json::Value::Number)
                    .unwrap_or_else(|| serde_json::Value::String(normalized.to_string()))
            }
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::List(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
            Value::Object(entries) => serde_json::Value::Object(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_display_string())
    }
}

impl From<Decimal> for Value {
    fn from(n: Decimal) -> Self {
        Value::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truthiness() {
        assert!(!Value::Null.to_boolean());
        assert!(Value::Boolean(true).to_boolean());
        assert!(!Value::Boolean(false).to_boolean());
        assert!(Value::Number(Decimal::from(5)).to_boolean());
        assert!(!Value::Number(Decimal::ZERO).to_boolean());
        assert!(Value::String("true".into()).to_boolean());
        assert!(Value::String(" YES ".into()).to_boolean());
        assert!(Value::String("1".into()).to_boolean());
        assert!(!Value::String("no".into()).to_boolean());
        assert!(!Value::String("2".into()).to_boolean());
        assert!(!Value::List(vec![]).to_boolean());
    }

    #[test]
    fn test_numeric_equality_across_representations() {
        let a = Value::Number(Decimal::from_str("1.50").unwrap());
        let b = Value::Number(Decimal::from_str("1.5").unwrap());
        assert!(a.value_equals(&b));

        let s = Value::String("1.5".into());
        assert!(a.value_equals(&s));
        assert!(!a.value_equals(&Value::String("x".into())));
    }

    #[test]
    fn test_null_equals_only_null() {
        assert!(Value::Null.value_equals(&Value::Null));
        assert!(!Value::Null.value_equals(&Value::Boolean(false)));
        assert!(!Value::Null.value_equals(&Value::Number(Decimal::ZERO)));
    }

    #[test]
    fn test_string_equality_is_case_sensitive() {
        assert!(!Value::String("Approved".into()).value_equals(&Value::String("approved".into())));
    }

    #[test]
    fn test_compare_numeric_promotion() {
        let a = Value::String("10".into());
        let b = Value::Number(Decimal::from(9));
        assert_eq!(a.compare(&b), Some(Ordering::Greater));
        assert_eq!(
            Value::String("abc".into()).compare(&Value::Number(Decimal::ONE)),
            None
        );
    }

    #[test]
    fn test_iso_dates_compare_chronologically() {
        let a = Value::String("2024-01-31".into());
        let b = Value::String("2024-02-01".into());
        assert_eq!(a.compare(&b), Some(Ordering::Less));
    }

    #[test]
    fn test_json_roundtrip_preserves_decimal_text() {
        let value = Value::from_json(&serde_json::json!(0.1));
        let Value::Number(n) = &value else {
            panic!("expected number");
        };
        assert_eq!(n.to_string(), "0.1");
    }

    #[test]
    fn test_json_integers_stay_integers() {
        let value = Value::Number(Decimal::from(42));
        assert_eq!(value.to_json(), serde_json::json!(42));
    }

    #[test]
    fn test_list_equality_elementwise() {
        let a = Value::from_json(&serde_json::json!([1, "x"]));
        let b = Value::from_json(&serde_json::json!([1.0, "x"]));
        assert!(a.value_equals(&b));
    }
}
