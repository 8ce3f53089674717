//! JSON-path collaborator boundary
//!
//! `json_get`/`json_exists`/`json_size` delegate here. The bundled resolver
//! handles the dotted-path-with-indexes subset (`$.a.b[0].c`); a richer
//! implementation can be swapped in through the trait.

use crate::value::Value;
use rust_decimal::Decimal;

/// External JSON-path collaborator. Must never fail: unresolvable paths
/// yield `Value::Null`.
pub trait JsonPathResolver: Send + Sync {
    fn get(&self, value: &Value, path: &str) -> Value;

    fn exists(&self, value: &Value, path: &str) -> bool {
        !self.get(value, path).is_null()
    }

    fn size(&self, value: &Value, path: &str) -> Value {
        match self.get(value, path) {
            Value::List(items) => Value::Number(Decimal::from(items.len())),
            Value::Object(entries) => Value::Number(Decimal::from(entries.len())),
            Value::String(s) => Value::Number(Decimal::from(s.chars().count())),
            Value::Null => Value::Number(Decimal::ZERO),
            _ => Value::Number(Decimal::ONE),
        }
    }
}

/// Dotted-path resolver: `$.a.b[0].c`, `a.b`, `items[2]`.
#[derive(Debug, Default)]
pub struct SimpleJsonPath;

impl JsonPathResolver for SimpleJsonPath {
    fn get(&self, value: &Value, path: &str) -> Value {
        let mut current = value.clone();
        for segment in parse_path(path) {
            current = match segment {
                Segment::Key(key) => match &current {
                    Value::Object(entries) => {
                        entries.get(&key).cloned().unwrap_or(Value::Null)
                    }
                    _ => Value::Null,
                },
                Segment::Index(index) => match &current {
                    Value::List(items) => items.get(index).cloned().unwrap_or(Value::Null),
                    _ => Value::Null,
                },
            };
            if current.is_null() {
                break;
            }
        }
        current
    }
}

enum Segment {
    Key(String),
    Index(usize),
}

fn parse_path(path: &str) -> Vec<Segment> {
    let trimmed = path.trim();
    let trimmed = trimmed.strip_prefix("$.").or_else(|| trimmed.strip_prefix('$')).unwrap_or(trimmed);

    let mut segments = Vec::new();
    for part in trimmed.split('.').filter(|p| !p.is_empty()) {
        let mut rest = part;
        // Leading key before any brackets
        if let Some(bracket) = rest.find('[') {
            if bracket > 0 {
                segments.push(Segment::Key(rest[..bracket].to_string()));
            }
            rest = &rest[bracket..];
            while let Some(close) = rest.find(']') {
                if let Ok(index) = rest[1..close].parse::<usize>() {
                    segments.push(Segment::Index(index));
                }
                rest = &rest[close + 1..];
                if !rest.starts_with('[') {
                    break;
                }
            }
        } else {
            segments.push(Segment::Key(rest.to_string()));
        }
    }
    segments
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Value {
        Value::from_json(&serde_json::json!({
            "applicant": {
                "name": "Jane",
                "accounts": [
                    { "balance": 1200 },
                    { "balance": 3400 }
                ]
            },
            "scores": [700, 720]
        }))
    }

    #[test]
    fn test_get_nested() {
        let resolver = SimpleJsonPath;
        assert_eq!(
            resolver.get(&sample(), "$.applicant.name"),
            Value::from("Jane")
        );
        assert_eq!(
            resolver.get(&sample(), "applicant.accounts[1].balance"),
            Value::Number(Decimal::from(3400))
        );
        assert_eq!(
            resolver.get(&sample(), "$.scores[0]"),
            Value::Number(Decimal::from(700))
        );
    }

    #[test]
    fn test_missing_path_is_null() {
        let resolver = SimpleJsonPath;
        assert!(resolver.get(&sample(), "$.applicant.missing").is_null());
        assert!(resolver.get(&sample(), "$.scores[9]").is_null());
        assert!(!resolver.exists(&sample(), "$.applicant.missing"));
        assert!(resolver.exists(&sample(), "$.applicant.name"));
    }

    #[test]
    fn test_size() {
        let resolver = SimpleJsonPath;
        assert_eq!(
            resolver.size(&sample(), "$.scores"),
            Value::Number(Decimal::from(2))
        );
        assert_eq!(
            resolver.size(&sample(), "$.applicant"),
            Value::Number(Decimal::from(2))
        );
        assert_eq!(
            resolver.size(&sample(), "$.missing"),
            Value::Number(Decimal::ZERO)
        );
    }
}
