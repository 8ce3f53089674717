//! Domain validation predicates
//!
//! Shared by the unary validators (`is_email`, `is_ssn`, ...) and the
//! `is_valid(value, format)` catalogue function.

use crate::value::Value;
use chrono::{Datelike, NaiveDate, Utc, Weekday};
use regex::Regex;
use rust_decimal::Decimal;
use std::sync::OnceLock;

fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // RFC-5322 subset: local part, '@', dotted domain with a TLD
    RE.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").expect("static regex")
    })
}

pub fn is_email(value: &Value) -> bool {
    value
        .as_str()
        .is_some_and(|s| email_regex().is_match(s.trim()))
}

/// E.164-ish: optional '+', 7 to 15 digits, spaces and dashes ignored.
pub fn is_phone(value: &Value) -> bool {
    let Some(s) = value.as_str() else {
        return false;
    };
    let cleaned: String = s.chars().filter(|c| !matches!(c, ' ' | '-')).collect();
    let digits = cleaned.strip_prefix('+').unwrap_or(&cleaned);
    (7..=15).contains(&digits.len()) && digits.chars().all(|c| c.is_ascii_digit())
}

pub fn parse_date(value: &Value) -> Option<NaiveDate> {
    let s = value.as_str()?.trim();
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            chrono::DateTime::parse_from_rfc3339(s)
                .map(|dt| dt.date_naive())
                .ok()
        })
}

pub fn is_date(value: &Value) -> bool {
    parse_date(value).is_some()
}

pub fn is_numeric(value: &Value) -> bool {
    value.as_decimal().is_some()
}

pub fn is_positive(value: &Value) -> bool {
    value.as_decimal().is_some_and(|n| n > Decimal::ZERO)
}

pub fn is_negative(value: &Value) -> bool {
    value.as_decimal().is_some_and(|n| n < Decimal::ZERO)
}

pub fn is_zero(value: &Value) -> bool {
    value.as_decimal().is_some_and(|n| n.is_zero())
}

pub fn is_percentage(value: &Value) -> bool {
    value
        .as_decimal()
        .is_some_and(|n| n >= Decimal::ZERO && n <= Decimal::from(100))
}

/// Non-negative decimal with at most two fractional digits.
pub fn is_currency(value: &Value) -> bool {
    value
        .as_decimal()
        .is_some_and(|n| n >= Decimal::ZERO && n.normalize().scale() <= 2)
}

/// Integer in the FICO range [300, 850].
pub fn is_credit_score(value: &Value) -> bool {
    value.as_decimal().is_some_and(|n| {
        n.fract().is_zero() && n >= Decimal::from(300) && n <= Decimal::from(850)
    })
}

/// `###-##-####` or 9 bare digits.
pub fn is_ssn(value: &Value) -> bool {
    let Some(s) = value.as_str() else {
        return false;
    };
    let s = s.trim();
    let dashed = s.len() == 11
        && s.chars().enumerate().all(|(i, c)| match i {
            3 | 6 => c == '-',
            _ => c.is_ascii_digit(),
        });
    let bare = s.len() == 9 && s.chars().all(|c| c.is_ascii_digit());
    dashed || bare
}

fn digit_count(value: &Value) -> Option<usize> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.normalize().to_string(),
        _ => return None,
    };
    text.chars()
        .all(|c| c.is_ascii_digit())
        .then_some(text.len())
}

pub fn is_account_number(value: &Value) -> bool {
    digit_count(value).is_some_and(|len| (8..=17).contains(&len))
}

pub fn is_routing_number(value: &Value) -> bool {
    digit_count(value).is_some_and(|len| len == 9)
}

pub fn is_business_day(value: &Value) -> bool {
    parse_date(value).is_some_and(|date| {
        !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
    })
}

pub fn is_weekend(value: &Value) -> bool {
    parse_date(value).is_some_and(|date| matches!(date.weekday(), Weekday::Sat | Weekday::Sun))
}

pub fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::List(items) => items.is_empty(),
        Value::Object(entries) => entries.is_empty(),
        _ => false,
    }
}

/// Whole years between a birthdate and today.
pub fn age_in_years(birthdate: &Value) -> Option<i64> {
    let birth = parse_date(birthdate)?;
    let today = Utc::now().date_naive();
    let mut age = i64::from(today.year() - birth.year());
    if (today.month(), today.day()) < (birth.month(), birth.day()) {
        age -= 1;
    }
    Some(age)
}

/// Dispatch for the `is_valid(value, format)` function.
pub fn is_valid(value: &Value, format: &str) -> bool {
    match format.to_ascii_lowercase().as_str() {
        "email" => is_email(value),
        "phone" => is_phone(value),
        "date" => is_date(value),
        "numeric" | "number" => is_numeric(value),
        "percentage" => is_percentage(value),
        "currency" => is_currency(value),
        "credit_score" => is_credit_score(value),
        "ssn" => is_ssn(value),
        "account_number" => is_account_number(value),
        "routing_number" => is_routing_number(value),
        _ => false,
    }
}
