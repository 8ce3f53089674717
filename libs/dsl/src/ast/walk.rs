//! Recursive AST traversal helpers
//!
//! Used by constant auto-discovery and by the static validator passes. The
//! matches here are exhaustive on purpose: a node missed by the walk is a
//! correctness bug in discovery, so new variants must be handled explicitly.

use super::action::Action;
use super::condition::Condition;
use super::expression::Expression;
use super::rules::{ActionBlock, ConditionalBlock, RuleShape, RulesDSL};

/// Visit every expression reachable from the rule document, including
/// sub-expressions (function arguments, indexes, REST URL/body/headers,
/// JSON-path sources, loop lists).
pub fn visit_expressions<F: FnMut(&Expression)>(rule: &RulesDSL, f: &mut F) {
    visit_shape(&rule.shape, f);
}

/// Visit every `Variable` node reachable from the rule document.
pub fn visit_variables<F: FnMut(&str)>(rule: &RulesDSL, f: &mut F) {
    visit_expressions(rule, &mut |expr| {
        if let Expression::Variable { name, .. } = expr {
            f(name);
        }
    });
}

/// Visit every expression inside one condition, including operands of
/// nested logical nodes.
pub fn visit_condition_expressions<F: FnMut(&Expression)>(cond: &Condition, f: &mut F) {
    visit_condition_exprs(cond, f);
}

/// Visit every action reachable from a shape, including loop and
/// conditional bodies, in source order.
pub fn visit_actions<F: FnMut(&Action)>(shape: &RuleShape, f: &mut F) {
    match shape {
        RuleShape::Simple {
            then, else_actions, ..
        } => {
            for action in then.iter().chain(else_actions) {
                visit_action(action, f);
            }
        }
        RuleShape::Sequence { rules } => {
            for rule in rules {
                visit_actions(&rule.shape, f);
            }
        }
        RuleShape::Conditional(block) => visit_conditional_actions(block, f),
    }
}

/// Visit every condition reachable from a shape.
pub fn visit_conditions<F: FnMut(&Condition)>(shape: &RuleShape, f: &mut F) {
    match shape {
        RuleShape::Simple { when, then, else_actions } => {
            for cond in when {
                visit_condition(cond, f);
            }
            for action in then.iter().chain(else_actions) {
                visit_action_conditions(action, f);
            }
        }
        RuleShape::Sequence { rules } => {
            for rule in rules {
                visit_conditions(&rule.shape, f);
            }
        }
        RuleShape::Conditional(block) => visit_conditional_conditions(block, f),
    }
}

fn visit_shape<F: FnMut(&Expression)>(shape: &RuleShape, f: &mut F) {
    match shape {
        RuleShape::Simple {
            when,
            then,
            else_actions,
        } => {
            for cond in when {
                visit_condition_exprs(cond, f);
            }
            for action in then.iter().chain(else_actions) {
                visit_action_exprs(action, f);
            }
        }
        RuleShape::Sequence { rules } => {
            for rule in rules {
                visit_shape(&rule.shape, f);
            }
        }
        RuleShape::Conditional(block) => visit_conditional_exprs(block, f),
    }
}

fn visit_conditional_exprs<F: FnMut(&Expression)>(block: &ConditionalBlock, f: &mut F) {
    visit_condition_exprs(&block.condition, f);
    visit_block_exprs(&block.then_block, f);
    if let Some(else_block) = &block.else_block {
        visit_block_exprs(else_block, f);
    }
}

fn visit_block_exprs<F: FnMut(&Expression)>(block: &ActionBlock, f: &mut F) {
    for action in &block.actions {
        visit_action_exprs(action, f);
    }
    if let Some(nested) = &block.nested {
        visit_conditional_exprs(nested, f);
    }
}

fn visit_conditional_conditions<F: FnMut(&Condition)>(block: &ConditionalBlock, f: &mut F) {
    visit_condition(&block.condition, f);
    for b in std::iter::once(&block.then_block).chain(block.else_block.as_ref()) {
        for action in &b.actions {
            visit_action_conditions(action, f);
        }
        if let Some(nested) = &b.nested {
            visit_conditional_conditions(nested, f);
        }
    }
}

fn visit_conditional_actions<F: FnMut(&Action)>(block: &ConditionalBlock, f: &mut F) {
    for b in std::iter::once(&block.then_block).chain(block.else_block.as_ref()) {
        for action in &b.actions {
            visit_action(action, f);
        }
        if let Some(nested) = &b.nested {
            visit_conditional_actions(nested, f);
        }
    }
}

fn visit_condition<F: FnMut(&Condition)>(cond: &Condition, f: &mut F) {
    f(cond);
    if let Condition::Logical { operands, .. } = cond {
        for operand in operands {
            visit_condition(operand, f);
        }
    }
}

fn visit_action<F: FnMut(&Action)>(action: &Action, f: &mut F) {
    f(action);
    match action {
        Action::Conditional {
            then_actions,
            else_actions,
            ..
        } => {
            for a in then_actions.iter().chain(else_actions) {
                visit_action(a, f);
            }
        }
        Action::ForEach { body, .. }
        | Action::While { body, .. }
        | Action::DoWhile { body, .. } => {
            for a in body {
                visit_action(a, f);
            }
        }
        Action::Assignment { .. }
        | Action::Calculate { .. }
        | Action::Run { .. }
        | Action::Arithmetic { .. }
        | Action::List { .. }
        | Action::FunctionCall { .. }
        | Action::CircuitBreaker { .. } => {}
    }
}

fn visit_action_conditions<F: FnMut(&Condition)>(action: &Action, f: &mut F) {
    match action {
        Action::Conditional {
            condition,
            then_actions,
            else_actions,
            ..
        } => {
            visit_condition(condition, f);
            for a in then_actions.iter().chain(else_actions) {
                visit_action_conditions(a, f);
            }
        }
        Action::While { condition, body, .. } => {
            visit_condition(condition, f);
            for a in body {
                visit_action_conditions(a, f);
            }
        }
        Action::DoWhile { body, condition, .. } => {
            for a in body {
                visit_action_conditions(a, f);
            }
            visit_condition(condition, f);
        }
        Action::ForEach { body, .. } => {
            for a in body {
                visit_action_conditions(a, f);
            }
        }
        Action::Assignment { .. }
        | Action::Calculate { .. }
        | Action::Run { .. }
        | Action::Arithmetic { .. }
        | Action::List { .. }
        | Action::FunctionCall { .. }
        | Action::CircuitBreaker { .. } => {}
    }
}

fn visit_condition_exprs<F: FnMut(&Expression)>(cond: &Condition, f: &mut F) {
    match cond {
        Condition::Comparison {
            left,
            right,
            range_end,
            ..
        } => {
            visit_expr(left, f);
            if let Some(right) = right {
                visit_expr(right, f);
            }
            if let Some(range_end) = range_end {
                visit_expr(range_end, f);
            }
        }
        Condition::Logical { operands, .. } => {
            for operand in operands {
                visit_condition_exprs(operand, f);
            }
        }
        Condition::Expression { expr, .. } => visit_expr(expr, f),
    }
}

fn visit_action_exprs<F: FnMut(&Expression)>(action: &Action, f: &mut F) {
    match action {
        Action::Assignment { value, .. } => visit_expr(value, f),
        Action::Calculate { expression, .. } | Action::Run { expression, .. } => {
            visit_expr(expression, f)
        }
        Action::Arithmetic { operand, .. } => visit_expr(operand, f),
        Action::List { value, .. } => visit_expr(value, f),
        Action::FunctionCall { args, .. } => {
            for arg in args {
                visit_expr(arg, f);
            }
        }
        Action::Conditional {
            condition,
            then_actions,
            else_actions,
            ..
        } => {
            visit_condition_exprs(condition, f);
            for a in then_actions.iter().chain(else_actions) {
                visit_action_exprs(a, f);
            }
        }
        Action::ForEach { list, body, .. } => {
            visit_expr(list, f);
            for a in body {
                visit_action_exprs(a, f);
            }
        }
        Action::While { condition, body, .. } => {
            visit_condition_exprs(condition, f);
            for a in body {
                visit_action_exprs(a, f);
            }
        }
        Action::DoWhile { body, condition, .. } => {
            for a in body {
                visit_action_exprs(a, f);
            }
            visit_condition_exprs(condition, f);
        }
        Action::CircuitBreaker { .. } => {}
    }
}

fn visit_expr<F: FnMut(&Expression)>(expr: &Expression, f: &mut F) {
    f(expr);
    match expr {
        Expression::Literal { .. } => {}
        Expression::Variable { index, .. } => {
            if let Some(index) = index {
                visit_expr(index, f);
            }
        }
        Expression::Unary { operand, .. } => visit_expr(operand, f),
        Expression::Binary { left, right, .. } => {
            visit_expr(left, f);
            visit_expr(right, f);
        }
        Expression::Arithmetic { operands, .. } => {
            for operand in operands {
                visit_expr(operand, f);
            }
        }
        Expression::Array { elements, .. } => {
            for element in elements {
                visit_expr(element, f);
            }
        }
        Expression::FunctionCall { args, .. } => {
            for arg in args {
                visit_expr(arg, f);
            }
        }
        Expression::JsonPath { source, path, .. } => {
            visit_expr(source, f);
            visit_expr(path, f);
        }
        Expression::RestCall {
            url, body, headers, ..
        } => {
            visit_expr(url, f);
            if let Some(body) = body {
                visit_expr(body, f);
            }
            if let Some(headers) = headers {
                visit_expr(headers, f);
            }
        }
    }
}
