//! Best-practices pass
//!
//! Advisory findings: missing description or version, overly long names,
//! and magic numbers that belong in system constants.

use crate::issue::{Issue, Severity};
use arbiter_dsl::ast::{walk, Condition, Expression, LiteralValue, RulesDSL};
use rust_decimal::Decimal;

const LONG_NAME: usize = 100;

pub fn run(rule: &RulesDSL) -> Vec<Issue> {
    let mut issues = Vec::new();

    if rule.description.as_deref().map_or(true, |d| d.trim().is_empty()) {
        issues.push(
            Issue::new("BP_001", Severity::Info, "rule has no description")
                .suggest("add a 'description' explaining the business intent"),
        );
    }

    if rule.version.as_deref().map_or(true, |v| v.trim().is_empty()) {
        issues.push(
            Issue::new("BP_002", Severity::Info, "rule has no version")
                .suggest("add a 'version' so changes can be tracked"),
        );
    }

    if rule.name.len() > LONG_NAME {
        issues.push(Issue::new(
            "BP_003",
            Severity::Warning,
            format!(
                "rule name is {} characters long (keep it under {LONG_NAME})",
                rule.name.len()
            ),
        ));
    }

    check_magic_numbers(rule, &mut issues);

    issues
}

/// Large bare numbers in comparisons usually belong in the constant store.
fn check_magic_numbers(rule: &RulesDSL, issues: &mut Vec<Issue>) {
    let threshold = Decimal::from(100);
    let mut flagged = Vec::new();

    walk::visit_conditions(&rule.shape, &mut |condition| {
        let Condition::Comparison {
            right, range_end, ..
        } = condition
        else {
            return;
        };
        for operand in right.iter().chain(range_end.iter()) {
            if let Expression::Literal {
                value: LiteralValue::Number(n),
                location,
            } = operand
            {
                if n.abs() >= threshold && !flagged.contains(n) {
                    flagged.push(*n);
                    issues.push(
                        Issue::new(
                            "BP_004",
                            Severity::Info,
                            format!("magic number {n} in a condition"),
                        )
                        .at(*location)
                        .suggest("move it to a named system constant with a defaultValue"),
                    );
                }
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issues(source: &str) -> Vec<Issue> {
        run(&arbiter_dsl::assemble(source).unwrap().rule)
    }

    #[test]
    fn test_missing_description_and_version() {
        let found = issues("name: X\nthen: [\"set a to 1\"]\n");
        assert!(found.iter().any(|i| i.code == "BP_001"));
        assert!(found.iter().any(|i| i.code == "BP_002"));
    }

    #[test]
    fn test_description_and_version_satisfy() {
        let found = issues(
            "name: X\ndescription: scoring rule\nversion: \"1.2\"\nthen: [\"set a to 1\"]\n",
        );
        assert!(found.iter().all(|i| i.code != "BP_001" && i.code != "BP_002"));
    }

    #[test]
    fn test_magic_number() {
        let found = issues(
            "name: X\ninputs: [income]\nwhen: [\"income greater_than 40000\"]\nthen: [\"set ok to true\"]\n",
        );
        assert!(found.iter().any(|i| i.code == "BP_004"));
    }

    #[test]
    fn test_small_numbers_are_not_magic() {
        let found = issues(
            "name: X\ninputs: [count]\nwhen: [\"count greater_than 3\"]\nthen: [\"set ok to true\"]\n",
        );
        assert!(found.iter().all(|i| i.code != "BP_004"));
    }
}
