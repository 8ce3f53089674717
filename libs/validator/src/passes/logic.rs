//! Logic pass
//!
//! Finds tautologies, contradictory numeric bounds in AND groups,
//! trivially-false conditions (unreachable branches), and declared outputs
//! that nothing ever assigns.

use crate::issue::{Issue, Severity};
use arbiter_dsl::ast::{
    walk, Action, ComparisonOp, Condition, Expression, LiteralValue, LogicalOp, RuleShape,
    RulesDSL,
};
use rust_decimal::Decimal;
use std::collections::BTreeSet;

pub fn run(rule: &RulesDSL) -> Vec<Issue> {
    let mut issues = Vec::new();

    walk::visit_conditions(&rule.shape, &mut |condition| {
        check_tautology(condition, &mut issues);
        check_trivially_false(condition, &mut issues);
    });

    // Contradictions need the operand list of each AND group; the simple
    // `when` list of a rule is an implicit AND group as well
    collect_and_groups(&rule.shape, &mut |operands| {
        check_contradiction(operands, &mut issues);
    });

    check_unassigned_outputs(rule, &mut issues);

    issues
}

/// `x == x`, `x >= x` and friends on the identical variable reference.
fn check_tautology(condition: &Condition, issues: &mut Vec<Issue>) {
    let Condition::Comparison {
        left,
        op,
        right: Some(right),
        location,
        ..
    } = condition
    else {
        return;
    };
    let same_variable = matches!(
        (left, right),
        (
            Expression::Variable {
                name: a,
                property_path: pa,
                index: None,
                ..
            },
            Expression::Variable {
                name: b,
                property_path: pb,
                index: None,
                ..
            },
        ) if a == b && pa == pb
    );
    if !same_variable {
        return;
    }
    let always = match op {
        ComparisonOp::Equals | ComparisonOp::AtLeast | ComparisonOp::AtMost => Some("true"),
        ComparisonOp::NotEquals | ComparisonOp::GreaterThan | ComparisonOp::LessThan => {
            Some("false")
        }
        _ => None,
    };
    if let Some(outcome) = always {
        issues.push(
            Issue::new(
                "LOGIC_001",
                Severity::Warning,
                format!(
                    "condition compares a variable with itself and is always {outcome}"
                ),
            )
            .at(*location),
        );
    }
}

/// A literal that coerces to false makes its branch unreachable.
fn check_trivially_false(condition: &Condition, issues: &mut Vec<Issue>) {
    let Condition::Expression { expr, location } = condition else {
        return;
    };
    let Expression::Literal { value, .. } = expr else {
        return;
    };
    let falsy = match value {
        LiteralValue::Boolean(b) => !b,
        LiteralValue::Null => true,
        LiteralValue::Number(n) => n.is_zero(),
        _ => false,
    };
    if falsy {
        issues.push(
            Issue::new(
                "LOGIC_003",
                Severity::Warning,
                "condition is a literal that is always false; its branch is unreachable",
            )
            .at(*location),
        );
    }
}

/// Numeric bound on one variable extracted from a comparison.
struct Bound {
    variable: String,
    lower: Option<(Decimal, bool)>, // (bound, inclusive)
    upper: Option<(Decimal, bool)>,
    location: arbiter_dsl::SourceLocation,
}

fn bound_of(condition: &Condition) -> Option<Bound> {
    let Condition::Comparison {
        left:
            Expression::Variable {
                name,
                property_path,
                index: None,
                ..
            },
        op,
        right:
            Some(Expression::Literal {
                value: LiteralValue::Number(bound),
                ..
            }),
        location,
        ..
    } = condition
    else {
        return None;
    };
    if !property_path.is_empty() {
        return None;
    }
    let (lower, upper) = match op {
        ComparisonOp::GreaterThan => (Some((*bound, false)), None),
        ComparisonOp::AtLeast => (Some((*bound, true)), None),
        ComparisonOp::LessThan => (None, Some((*bound, false))),
        ComparisonOp::AtMost => (None, Some((*bound, true))),
        ComparisonOp::Equals => (Some((*bound, true)), Some((*bound, true))),
        _ => return None,
    };
    Some(Bound {
        variable: name.clone(),
        lower,
        upper,
        location: *location,
    })
}

/// Visit every AND-group of conditions: the implicit `when` list plus every
/// explicit `and` node.
fn collect_and_groups<F: FnMut(&[Condition])>(shape: &RuleShape, f: &mut F) {
    if let RuleShape::Simple { when, .. } = shape {
        f(when);
    }
    if let RuleShape::Sequence { rules } = shape {
        for rule in rules {
            collect_and_groups(&rule.shape, f);
        }
    }
    walk::visit_conditions(shape, &mut |condition| {
        if let Condition::Logical {
            op: LogicalOp::And,
            operands,
            ..
        } = condition
        {
            f(operands);
        }
    });
}

fn check_contradiction(operands: &[Condition], issues: &mut Vec<Issue>) {
    let bounds: Vec<Bound> = operands.iter().filter_map(bound_of).collect();
    for (i, a) in bounds.iter().enumerate() {
        for b in bounds.iter().skip(i + 1) {
            if a.variable != b.variable {
                continue;
            }
            let conflict = |lower: &Option<(Decimal, bool)>, upper: &Option<(Decimal, bool)>| {
                match (lower, upper) {
                    (Some((lo, lo_inc)), Some((hi, hi_inc))) => {
                        lo > hi || (lo == hi && !(*lo_inc && *hi_inc))
                    }
                    _ => false,
                }
            };
            if conflict(&a.lower, &b.upper) || conflict(&b.lower, &a.upper) {
                issues.push(
                    Issue::new(
                        "LOGIC_002",
                        Severity::Error,
                        format!(
                            "contradictory bounds on '{}' make this AND group always false",
                            a.variable
                        ),
                    )
                    .at(b.location),
                );
            }
        }
    }
}

fn check_unassigned_outputs(rule: &RulesDSL, issues: &mut Vec<Issue>) {
    if rule.output.is_empty() {
        return;
    }
    let mut assigned = BTreeSet::new();
    walk::visit_actions(&rule.shape, &mut |action| match action {
        Action::Assignment { variable, .. }
        | Action::Calculate { variable, .. }
        | Action::Run { variable, .. }
        | Action::Arithmetic { variable, .. } => {
            assigned.insert(variable.clone());
        }
        Action::List { list, .. } => {
            assigned.insert(list.clone());
        }
        _ => {}
    });

    for name in rule.output.keys() {
        if name == "conditionResult" {
            continue;
        }
        if !assigned.contains(name) && !rule.inputs.contains(name) {
            issues.push(
                Issue::new(
                    "LOGIC_004",
                    Severity::Warning,
                    format!("declared output '{name}' is never assigned"),
                )
                .suggest("assign it in 'then' or 'else', or remove it from 'output'"),
            );
        }
    }
}
