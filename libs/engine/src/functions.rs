//! Built-in function catalogue
//!
//! Names are fixed; unknown names fail with `EVAL_UNKNOWN_FUNCTION`. The
//! registry is a compile-time perfect hash map used for existence and arity
//! checks by both the evaluator and the static validator. JSON and REST
//! functions are listed here for arity metadata but dispatched through their
//! collaborators by the evaluator.

use crate::checks;
use crate::error::{Error, Result};
use crate::numeric;
use crate::value::Value;
use arbiter_dsl::SourceLocation;
use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use tracing::{debug, error, info, warn};

/// Function metadata
#[derive(Debug, Clone, Copy)]
pub struct FunctionSpec {
    pub name: &'static str,
    pub min_args: usize,
    pub max_args: Option<usize>, // None = unbounded
}

/// Static function registry
pub static FUNCTIONS: phf::Map<&'static str, FunctionSpec> = phf::phf_map! {
    // Math
    "abs" => FunctionSpec { name: "abs", min_args: 1, max_args: Some(1) },
    "min" => FunctionSpec { name: "min", min_args: 1, max_args: None },
    "max" => FunctionSpec { name: "max", min_args: 1, max_args: None },
    "round" => FunctionSpec { name: "round", min_args: 1, max_args: Some(2) },
    "floor" => FunctionSpec { name: "floor", min_args: 1, max_args: Some(1) },
    "ceil" => FunctionSpec { name: "ceil", min_args: 1, max_args: Some(1) },
    "sqrt" => FunctionSpec { name: "sqrt", min_args: 1, max_args: Some(1) },
    "sum" => FunctionSpec { name: "sum", min_args: 1, max_args: None },
    "average" => FunctionSpec { name: "average", min_args: 1, max_args: None },

    // String
    "upper" => FunctionSpec { name: "upper", min_args: 1, max_args: Some(1) },
    "lower" => FunctionSpec { name: "lower", min_args: 1, max_args: Some(1) },
    "trim" => FunctionSpec { name: "trim", min_args: 1, max_args: Some(1) },
    "length" => FunctionSpec { name: "length", min_args: 1, max_args: Some(1) },
    "substring" => FunctionSpec { name: "substring", min_args: 2, max_args: Some(3) },
    "replace" => FunctionSpec { name: "replace", min_args: 3, max_args: Some(3) },
    "format_currency" => FunctionSpec { name: "format_currency", min_args: 1, max_args: Some(1) },
    "format_percentage" => FunctionSpec { name: "format_percentage", min_args: 1, max_args: Some(2) },

    // Collection
    "size" => FunctionSpec { name: "size", min_args: 1, max_args: Some(1) },
    "first" => FunctionSpec { name: "first", min_args: 1, max_args: Some(1) },
    "last" => FunctionSpec { name: "last", min_args: 1, max_args: Some(1) },

    // Date
    "now" => FunctionSpec { name: "now", min_args: 0, max_args: Some(0) },
    "today" => FunctionSpec { name: "today", min_args: 0, max_args: Some(0) },
    "add_days" => FunctionSpec { name: "add_days", min_args: 2, max_args: Some(2) },
    "diff_days" => FunctionSpec { name: "diff_days", min_args: 2, max_args: Some(2) },

    // Validation wrappers
    "is_valid" => FunctionSpec { name: "is_valid", min_args: 2, max_args: Some(2) },
    "in_range" => FunctionSpec { name: "in_range", min_args: 3, max_args: Some(3) },

    // JSON (dispatched through the JSON collaborator)
    "json_get" => FunctionSpec { name: "json_get", min_args: 2, max_args: Some(2) },
    "json_exists" => FunctionSpec { name: "json_exists", min_args: 2, max_args: Some(2) },
    "json_size" => FunctionSpec { name: "json_size", min_args: 2, max_args: Some(2) },

    // REST (dispatched through the REST collaborator)
    "rest_get" => FunctionSpec { name: "rest_get", min_args: 1, max_args: Some(4) },
    "rest_post" => FunctionSpec { name: "rest_post", min_args: 1, max_args: Some(4) },
    "rest_put" => FunctionSpec { name: "rest_put", min_args: 1, max_args: Some(4) },
    "rest_delete" => FunctionSpec { name: "rest_delete", min_args: 1, max_args: Some(4) },
    "rest_patch" => FunctionSpec { name: "rest_patch", min_args: 1, max_args: Some(4) },

    // Logging
    "log" => FunctionSpec { name: "log", min_args: 1, max_args: Some(2) },
};

/// Whether `name` is in the catalogue.
pub fn is_known_function(name: &str) -> bool {
    FUNCTIONS.contains_key(name)
}

/// Check arity against the registry.
pub fn check_arity(name: &str, actual: usize, location: SourceLocation) -> Result<()> {
    let Some(spec) = FUNCTIONS.get(name) else {
        return Err(Error::UnknownFunction {
            name: name.to_string(),
            location,
        });
    };
    let max_ok = spec.max_args.map_or(true, |max| actual <= max);
    if actual < spec.min_args || !max_ok {
        let expected = match spec.max_args {
            Some(max) if max == spec.min_args => format!("{max}"),
            Some(max) => format!("{}..{}", spec.min_args, max),
            None => format!("at least {}", spec.min_args),
        };
        return Err(Error::BadArity {
            name: name.to_string(),
            expected,
            actual,
        });
    }
    Ok(())
}

fn want_number(name: &str, value: &Value, location: SourceLocation) -> Result<Decimal> {
    value.as_decimal().ok_or_else(|| Error::TypeMismatch {
        message: format!("'{name}' expects a numeric argument, got {value}"),
        location,
    })
}

fn want_string<'v>(name: &str, value: &'v Value, location: SourceLocation) -> Result<&'v str> {
    value.as_str().ok_or_else(|| Error::TypeMismatch {
        message: format!("'{name}' expects a string argument"),
        location,
    })
}

/// Evaluate a catalogue function over already-evaluated arguments.
///
/// JSON and REST functions are not handled here; the evaluator routes them
/// to their collaborators before falling through to the catalogue.
pub fn call(name: &str, args: &[Value], scale: u32, location: SourceLocation) -> Result<Value> {
    check_arity(name, args.len(), location)?;

    match name {
        // ---------------- math ----------------
        "abs" => Ok(Value::Number(want_number(name, &args[0], location)?.abs())),
        "min" | "max" | "sum" | "average" => aggregate(name, args, scale, location),
        "round" => {
            let value = want_number(name, &args[0], location)?;
            let places = match args.get(1) {
                Some(arg) => want_number(name, arg, location)?
                    .trunc()
                    .mantissa()
                    .clamp(0, 28) as u32,
                None => 0,
            };
            Ok(Value::Number(numeric::round_to_scale(value, places)))
        }
        "floor" => Ok(Value::Number(want_number(name, &args[0], location)?.floor())),
        "ceil" => Ok(Value::Number(want_number(name, &args[0], location)?.ceil())),
        "sqrt" => {
            let value = want_number(name, &args[0], location)?;
            numeric::sqrt(value, scale)
                .map(Value::Number)
                .ok_or_else(|| Error::TypeMismatch {
                    message: "'sqrt' of a negative number".to_string(),
                    location,
                })
        }

        // ---------------- string ----------------
        "upper" => Ok(Value::String(
            args[0].to_display_string().to_uppercase(),
        )),
        "lower" => Ok(Value::String(
            args[0].to_display_string().to_lowercase(),
        )),
        "trim" => Ok(Value::String(args[0].to_display_string().trim().to_string())),
        "length" => {
            let length = match &args[0] {
                Value::List(items) => items.len(),
                other => other.to_display_string().chars().count(),
            };
            Ok(Value::Number(Decimal::from(length)))
        }
        "substring" => {
            let text = args[0].to_display_string();
            let start = want_number(name, &args[1], location)?
                .trunc()
                .mantissa()
                .max(0) as usize;
            let chars: Vec<char> = text.chars().collect();
            let end = match args.get(2) {
                Some(arg) => (want_number(name, arg, location)?.trunc().mantissa().max(0)
                    as usize)
                    .min(chars.len()),
                None => chars.len(),
            };
            let start = start.min(end);
            Ok(Value::String(chars[start..end].iter().collect()))
        }
        "replace" => {
            let text = args[0].to_display_string();
            let from = want_string(name, &args[1], location)?;
            let to = want_string(name, &args[2], location)?;
            Ok(Value::String(text.replace(from, to)))
        }
        "format_currency" => {
            let value = want_number(name, &args[0], location)?;
            Ok(Value::String(format_currency(value)))
        }
        "format_percentage" => {
            let value = want_number(name, &args[0], location)?;
            let places = match args.get(1) {
                Some(arg) => want_number(name, arg, location)?
                    .trunc()
                    .mantissa()
                    .clamp(0, 10) as u32,
                None => 2,
            };
            Ok(Value::String(format!(
                "{}%",
                numeric::round_to_scale(value, places)
            )))
        }

        // ---------------- collection ----------------
        "size" => {
            let size = match &args[0] {
                Value::List(items) => items.len(),
                Value::Object(entries) => entries.len(),
                Value::String(s) => s.chars().count(),
                Value::Null => 0,
                _ => 1,
            };
            Ok(Value::Number(Decimal::from(size)))
        }
        "first" => Ok(match &args[0] {
            Value::List(items) => items.first().cloned().unwrap_or(Value::Null),
            other => other.clone(),
        }),
        "last" => Ok(match &args[0] {
            Value::List(items) => items.last().cloned().unwrap_or(Value::Null),
            other => other.clone(),
        }),

        // ---------------- date ----------------
        "now" => Ok(Value::String(Utc::now().to_rfc3339())),
        "today" => Ok(Value::String(
            Utc::now().date_naive().format("%Y-%m-%d").to_string(),
        )),
        "add_days" => {
            let date = checks::parse_date(&args[0]).ok_or_else(|| Error::TypeMismatch {
                message: "'add_days' expects an ISO-8601 date".to_string(),
                location,
            })?;
            let days = want_number(name, &args[1], location)?.trunc().mantissa() as i64;
            let result = date + Duration::days(days);
            Ok(Value::String(result.format("%Y-%m-%d").to_string()))
        }
        "diff_days" => {
            let from = checks::parse_date(&args[0]);
            let to = checks::parse_date(&args[1]);
            match (from, to) {
                (Some(from), Some(to)) => {
                    Ok(Value::Number(Decimal::from((to - from).num_days())))
                }
                _ => Err(Error::TypeMismatch {
                    message: "'diff_days' expects two ISO-8601 dates".to_string(),
                    location,
                }),
            }
        }

        // ---------------- validation ----------------
        "is_valid" => {
            let format = want_string(name, &args[1], location)?;
            Ok(Value::Boolean(checks::is_valid(&args[0], format)))
        }
        "in_range" => {
            let value = want_number(name, &args[0], location)?;
            let lo = want_number(name, &args[1], location)?;
            let hi = want_number(name, &args[2], location)?;
            let (lo, hi) = if lo <= hi { (lo, hi) } else { (hi, lo) };
            Ok(Value::Boolean(value >= lo && value <= hi))
        }

        // ---------------- logging ----------------
        "log" => {
            let message = args[0].to_display_string();
            let level = args
                .get(1)
                .map(|v| v.to_display_string().to_ascii_lowercase())
                .unwrap_or_else(|| "info".to_string());
            match level.as_str() {
                "debug" => debug!(target: "rule", "{message}"),
                "warn" | "warning" => warn!(target: "rule", "{message}"),
                "error" => error!(target: "rule", "{message}"),
                _ => info!(target: "rule", "{message}"),
            }
            Ok(Value::Null)
        }

        // JSON/REST names reach here only when no collaborator intercepted
        // them; report them as unknown rather than guessing
        other => Err(Error::UnknownFunction {
            name: other.to_string(),
            location,
        }),
    }
}

/// Shared implementation for `min`/`max`/`sum`/`average`, flattening a single
/// list argument so both `sum(items)` and `sum(a, b, c)` work.
pub fn aggregate(
    name: &str,
    args: &[Value],
    scale: u32,
    location: SourceLocation,
) -> Result<Value> {
    let flattened: Vec<&Value> = if args.len() == 1 {
        match &args[0] {
            Value::List(items) => items.iter().collect(),
            other => vec![other],
        }
    } else {
        args.iter().collect()
    };

    if flattened.is_empty() {
        return Ok(Value::Null);
    }

    let mut numbers = Vec::with_capacity(flattened.len());
    for value in &flattened {
        numbers.push(want_number(name, value, location)?);
    }

    let result = match name {
        "min" => numbers.iter().copied().min().unwrap_or(Decimal::ZERO),
        "max" => numbers.iter().copied().max().unwrap_or(Decimal::ZERO),
        "sum" => numbers.iter().copied().sum(),
        "average" => {
            let total: Decimal = numbers.iter().copied().sum();
            numeric::div(total, Decimal::from(numbers.len()), scale)
                .unwrap_or(Decimal::ZERO)
        }
        _ => unreachable!("aggregate called with '{name}'"),
    };
    Ok(Value::Number(result))
}

fn format_currency(value: Decimal) -> String {
    let rounded = numeric::round_to_scale(value, 2);
    let negative = rounded < Decimal::ZERO;
    let text = rounded.abs().to_string();
    let (integer, fraction) = match text.split_once('.') {
        Some((i, f)) => (i.to_string(), format!("{f:0<2}")),
        None => (text, "00".to_string()),
    };

    // Thousands separators
    let mut grouped = String::new();
    for (idx, c) in integer.chars().rev().enumerate() {
        if idx > 0 && idx % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    let grouped: String = grouped.chars().rev().collect();

    let sign = if negative { "-" } else { "" };
    format!("{sign}${grouped}.{fraction}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn loc() -> SourceLocation {
        SourceLocation::synthetic()
    }

    fn n(text: &str) -> Value {
        Value::Number(Decimal::from_str(text).unwrap())
    }

    fn call_fn(name: &str, args: &[Value]) -> Value {
        call(name, args, numeric::DEFAULT_SCALE, loc()).unwrap()
    }

    #[test]
    fn test_unknown_function() {
        let err = call("nope", &[], 10, loc()).unwrap_err();
        assert_eq!(err.code(), "EVAL_UNKNOWN_FUNCTION");
    }

    #[test]
    fn test_arity_errors() {
        let err = call("abs", &[], 10, loc()).unwrap_err();
        assert_eq!(err.code(), "EVAL_BAD_ARITY");
        let err = call("round", &[n("1"), n("2"), n("3")], 10, loc()).unwrap_err();
        assert_eq!(err.code(), "EVAL_BAD_ARITY");
    }

    #[test]
    fn test_math_functions() {
        assert_eq!(call_fn("abs", &[n("-5")]), n("5"));
        assert_eq!(call_fn("min", &[n("3"), n("1"), n("2")]), n("1"));
        assert_eq!(call_fn("max", &[n("3"), n("1"), n("2")]), n("3"));
        assert_eq!(call_fn("round", &[n("1.25"), n("1")]), n("1.3"));
        assert_eq!(call_fn("round", &[n("0.5")]), n("1"));
        assert_eq!(call_fn("floor", &[n("1.9")]), n("1"));
        assert_eq!(call_fn("ceil", &[n("1.1")]), n("2"));
        assert_eq!(call_fn("sqrt", &[n("144")]), n("12"));
    }

    #[test]
    fn test_aggregates_flatten_single_list() {
        let items = Value::List(vec![n("10"), n("20"), n("30")]);
        assert_eq!(call_fn("sum", &[items.clone()]), n("60"));
        assert_eq!(call_fn("average", &[items]), n("20"));
        assert_eq!(call_fn("sum", &[n("1"), n("2")]), n("3"));
    }

    #[test]
    fn test_string_functions() {
        assert_eq!(
            call_fn("upper", &[Value::from("ok")]),
            Value::from("OK")
        );
        assert_eq!(
            call_fn("trim", &[Value::from("  x  ")]),
            Value::from("x")
        );
        assert_eq!(call_fn("length", &[Value::from("hello")]), n("5"));
        assert_eq!(
            call_fn("substring", &[Value::from("approved"), n("0"), n("3")]),
            Value::from("app")
        );
        assert_eq!(
            call_fn(
                "replace",
                &[Value::from("a-b-c"), Value::from("-"), Value::from(".")]
            ),
            Value::from("a.b.c")
        );
    }

    #[test]
    fn test_format_currency() {
        assert_eq!(
            call_fn("format_currency", &[n("1234567.891")]),
            Value::from("$1,234,567.89")
        );
        assert_eq!(call_fn("format_currency", &[n("5")]), Value::from("$5.00"));
        assert_eq!(
            call_fn("format_currency", &[n("-99.5")]),
            Value::from("-$99.50")
        );
    }

    #[test]
    fn test_format_percentage() {
        assert_eq!(
            call_fn("format_percentage", &[n("12.345")]),
            Value::from("12.35%")
        );
        assert_eq!(
            call_fn("format_percentage", &[n("50"), n("0")]),
            Value::from("50%")
        );
    }

    #[test]
    fn test_collection_functions() {
        let items = Value::List(vec![n("1"), n("2"), n("3")]);
        assert_eq!(call_fn("size", &[items.clone()]), n("3"));
        assert_eq!(call_fn("first", &[items.clone()]), n("1"));
        assert_eq!(call_fn("last", &[items]), n("3"));
        assert_eq!(call_fn("first", &[Value::List(vec![])]), Value::Null);
        assert_eq!(call_fn("size", &[Value::Null]), n("0"));
    }

    #[test]
    fn test_date_functions() {
        assert_eq!(
            call_fn("add_days", &[Value::from("2024-06-01"), n("30")]),
            Value::from("2024-07-01")
        );
        assert_eq!(
            call_fn(
                "diff_days",
                &[Value::from("2024-06-01"), Value::from("2024-07-01")]
            ),
            n("30")
        );
        let today = call_fn("today", &[]);
        assert!(checks::is_date(&today));
    }

    #[test]
    fn test_validation_wrappers() {
        assert_eq!(
            call_fn("is_valid", &[Value::from("a@b.co"), Value::from("email")]),
            Value::Boolean(true)
        );
        assert_eq!(
            call_fn("in_range", &[n("5"), n("1"), n("10")]),
            Value::Boolean(true)
        );
        assert_eq!(
            call_fn("in_range", &[n("11"), n("1"), n("10")]),
            Value::Boolean(false)
        );
    }

    #[test]
    fn test_log_returns_null() {
        assert_eq!(
            call_fn("log", &[Value::from("checked"), Value::from("debug")]),
            Value::Null
        );
    }
}
