//! Performance pass
//!
//! Heuristics only: large condition/action counts, expensive operations
//! placed before cheap ones in AND groups (defeating short-circuit), and
//! repeated identical sub-expressions.

use crate::issue::{Issue, Severity};
use arbiter_dsl::ast::{walk, Condition, Expression, LogicalOp, RuleShape, RulesDSL};
use std::collections::BTreeMap;

const MAX_CONDITIONS: usize = 20;
const MAX_ACTIONS: usize = 50;
const REPEAT_THRESHOLD: usize = 3;

pub fn run(rule: &RulesDSL) -> Vec<Issue> {
    let mut issues = Vec::new();

    let mut condition_count = 0usize;
    walk::visit_conditions(&rule.shape, &mut |condition| {
        if matches!(condition, Condition::Comparison { .. } | Condition::Expression { .. }) {
            condition_count += 1;
        }
    });
    if condition_count > MAX_CONDITIONS {
        issues.push(
            Issue::new(
                "PERF_001",
                Severity::Warning,
                format!("rule has {condition_count} conditions (threshold {MAX_CONDITIONS})"),
            )
            .suggest("split the rule into a sequence of smaller sub-rules"),
        );
    }

    let mut action_count = 0usize;
    walk::visit_actions(&rule.shape, &mut |_| action_count += 1);
    if action_count > MAX_ACTIONS {
        issues.push(
            Issue::new(
                "PERF_002",
                Severity::Warning,
                format!("rule has {action_count} actions (threshold {MAX_ACTIONS})"),
            )
            .suggest("split the rule into a sequence of smaller sub-rules"),
        );
    }

    check_expensive_first(rule, &mut issues);
    check_repeated_subexpressions(rule, &mut issues);

    issues
}

/// REST and JSON calls in a condition make it expensive to evaluate.
fn is_expensive_condition(condition: &Condition) -> bool {
    let mut expensive = false;
    walk::visit_condition_expressions(condition, &mut |expr| {
        match expr {
            Expression::RestCall { .. } | Expression::JsonPath { .. } => expensive = true,
            Expression::FunctionCall { name, .. }
                if name.starts_with("rest_") || name.starts_with("json_") =>
            {
                expensive = true
            }
            _ => {}
        }
    });
    expensive
}

fn check_and_group(operands: &[Condition], issues: &mut Vec<Issue>) {
    let Some(first_expensive) = operands.iter().position(is_expensive_condition) else {
        return;
    };
    let cheap_after = operands
        .iter()
        .skip(first_expensive + 1)
        .any(|c| !is_expensive_condition(c));
    if cheap_after {
        issues.push(
            Issue::new(
                "PERF_003",
                Severity::Warning,
                "an expensive REST/JSON condition runs before cheaper checks in an AND group",
            )
            .at(operands[first_expensive].location())
            .suggest("order cheap comparisons first so short-circuiting can skip the call"),
        );
    }
}

fn check_expensive_first(rule: &RulesDSL, issues: &mut Vec<Issue>) {
    if let RuleShape::Simple { when, .. } = &rule.shape {
        check_and_group(when, issues);
    }
    if let RuleShape::Sequence { rules } = &rule.shape {
        for sub_rule in rules {
            if let RuleShape::Simple { when, .. } = &sub_rule.shape {
                check_and_group(when, issues);
            }
        }
    }
    walk::visit_conditions(&rule.shape, &mut |condition| {
        if let Condition::Logical {
            op: LogicalOp::And,
            operands,
            ..
        } = condition
        {
            check_and_group(operands, issues);
        }
    });
}

fn check_repeated_subexpressions(rule: &RulesDSL, issues: &mut Vec<Issue>) {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    walk::visit_expressions(rule, &mut |expr| {
        // Only composite expressions are worth caching in a variable
        if matches!(
            expr,
            Expression::Binary { .. }
                | Expression::FunctionCall { .. }
                | Expression::Arithmetic { .. }
        ) {
            *counts.entry(expr.to_dsl_string()).or_insert(0) += 1;
        }
    });

    for (rendered, count) in counts {
        if count >= REPEAT_THRESHOLD {
            issues.push(
                Issue::new(
                    "PERF_004",
                    Severity::Info,
                    format!("sub-expression '{rendered}' appears {count} times"),
                )
                .suggest("compute it once into a variable with 'calculate'"),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issues(source: &str) -> Vec<Issue> {
        run(&arbiter_dsl::assemble(source).unwrap().rule)
    }

    #[test]
    fn test_condition_count_threshold() {
        let when: Vec<String> = (0..21).map(|i| format!("\"x greater_than {i}\"")).collect();
        let source = format!(
            "name: X\ninputs: [x]\nwhen: [{}]\nthen: [\"set ok to true\"]\n",
            when.join(", ")
        );
        assert!(issues(&source).iter().any(|i| i.code == "PERF_001"));
    }

    #[test]
    fn test_action_count_threshold() {
        let then: Vec<String> = (0..51).map(|i| format!("\"set v{i} to {i}\"")).collect();
        let source = format!("name: X\nthen: [{}]\n", then.join(", "));
        assert!(issues(&source).iter().any(|i| i.code == "PERF_002"));
    }

    #[test]
    fn test_expensive_condition_ordering() {
        let source = "name: X\ninputs: [x]\nwhen: [\"json_get(x, \\\"$.a\\\") equals 1\", \"x greater_than 0\"]\nthen: [\"set ok to true\"]\n";
        assert!(issues(source).iter().any(|i| i.code == "PERF_003"));

        let reordered = "name: X\ninputs: [x]\nwhen: [\"x greater_than 0\", \"json_get(x, \\\"$.a\\\") equals 1\"]\nthen: [\"set ok to true\"]\n";
        assert!(issues(reordered).iter().all(|i| i.code != "PERF_003"));
    }

    #[test]
    fn test_repeated_subexpression() {
        let source = "name: X\ninputs: [a, b]\nthen: [\"set x to a * b\", \"set y to a * b\", \"set z to a * b\"]\n";
        assert!(issues(source).iter().any(|i| i.code == "PERF_004"));
    }

    #[test]
    fn test_small_rule_is_clean() {
        let source = "name: X\ninputs: [a]\nwhen: [\"a greater_than 1\"]\nthen: [\"set ok to true\"]\n";
        assert!(issues(source).is_empty());
    }
}
