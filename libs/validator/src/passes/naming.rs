//! Naming pass
//!
//! Inputs are camelCase, computed variables snake_case, constants
//! UPPER_SNAKE. Reserved DSL keywords are rejected as variable names.

use crate::issue::{Issue, Severity};
use arbiter_dsl::ast::{walk, Action, RulesDSL};
use arbiter_dsl::token::keyword_kind;
use std::collections::BTreeMap;

fn is_camel_case(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    first.is_ascii_lowercase() && chars.all(|c| c.is_ascii_alphanumeric())
}

fn is_snake_case(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    first.is_ascii_lowercase()
        && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

fn is_upper_snake(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    first.is_ascii_uppercase()
        && chars.all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
}

/// Every variable name written by an action, with its first write site.
fn assigned_names(rule: &RulesDSL) -> BTreeMap<String, arbiter_dsl::SourceLocation> {
    let mut names = BTreeMap::new();
    walk::visit_actions(&rule.shape, &mut |action| match action {
        Action::Assignment {
            variable, location, ..
        }
        | Action::Calculate {
            variable, location, ..
        }
        | Action::Run {
            variable, location, ..
        }
        | Action::Arithmetic {
            variable, location, ..
        } => {
            names.entry(variable.clone()).or_insert(*location);
        }
        Action::List { list, location, .. } => {
            names.entry(list.clone()).or_insert(*location);
        }
        Action::ForEach { .. }
        | Action::While { .. }
        | Action::DoWhile { .. }
        | Action::Conditional { .. }
        | Action::FunctionCall { .. }
        | Action::CircuitBreaker { .. } => {}
    });
    names
}

pub fn run(rule: &RulesDSL) -> Vec<Issue> {
    let mut issues = Vec::new();

    for input in &rule.inputs {
        if keyword_kind(input).is_some() {
            issues.push(
                Issue::new(
                    "NAMING_004",
                    Severity::Error,
                    format!("input '{input}' is a reserved DSL keyword"),
                )
                .suggest("pick a descriptive domain name instead"),
            );
        } else if !is_camel_case(input) {
            issues.push(
                Issue::new(
                    "NAMING_001",
                    Severity::Error,
                    format!("input '{input}' must be camelCase"),
                )
                .example("creditScore")
                .example("annualIncome"),
            );
        }
    }

    for declared in &rule.constants {
        if !is_upper_snake(&declared.code) {
            issues.push(
                Issue::new(
                    "NAMING_003",
                    Severity::Error,
                    format!("constant '{}' must be UPPER_SNAKE_CASE", declared.code),
                )
                .example("MIN_AGE"),
            );
        }
    }

    for (name, location) in assigned_names(rule) {
        if keyword_kind(&name).is_some() {
            issues.push(
                Issue::new(
                    "NAMING_004",
                    Severity::Error,
                    format!("computed variable '{name}' is a reserved DSL keyword"),
                )
                .at(location),
            );
        } else if is_upper_snake(&name) {
            // Writing an UPPER_SNAKE name would shadow a system constant
            issues.push(
                Issue::new(
                    "NAMING_005",
                    Severity::Error,
                    format!("'{name}' looks like a system constant; constants cannot be assigned"),
                )
                .at(location),
            );
        } else if !is_snake_case(&name) && !is_camel_case(&name) {
            issues.push(
                Issue::new(
                    "NAMING_002",
                    Severity::Warning,
                    format!("computed variable '{name}' should be snake_case"),
                )
                .at(location)
                .example("debt_ratio"),
            );
        }
    }

    issues
}
