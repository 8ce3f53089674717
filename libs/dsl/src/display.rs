//! Canonical DSL rendering of AST nodes
//!
//! `to_dsl_string()` produces source text that parses back to a structurally
//! identical node. Operands are re-parenthesised from the tree structure, so
//! the rendering is canonical rather than a copy of the original spelling.

use crate::ast::{
    Action, AggregateOp, ArithmeticActionOp, BinaryOp, Condition, Expression, ListActionOp,
    LiteralValue, LogicalOp, UnaryOp,
};
use std::fmt::Write;

impl Expression {
    /// Render this expression as canonical DSL source.
    pub fn to_dsl_string(&self) -> String {
        let mut out = String::new();
        write_expression(&mut out, self);
        out
    }
}

impl Condition {
    /// Render this condition as canonical DSL source.
    pub fn to_dsl_string(&self) -> String {
        let mut out = String::new();
        write_condition(&mut out, self);
        out
    }
}

impl Action {
    /// Render this action as canonical DSL source.
    pub fn to_dsl_string(&self) -> String {
        let mut out = String::new();
        write_action(&mut out, self);
        out
    }
}

fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            other => out.push(other),
        }
    }
    out.push('"');
    out
}

fn write_literal(out: &mut String, value: &LiteralValue) {
    match value {
        LiteralValue::Number(n) => {
            let _ = write!(out, "{n}");
        }
        LiteralValue::String(s) => out.push_str(&quote(s)),
        LiteralValue::Boolean(b) => {
            let _ = write!(out, "{b}");
        }
        LiteralValue::Null => out.push_str("null"),
        LiteralValue::List(values) => {
            out.push('[');
            for (idx, v) in values.iter().enumerate() {
                if idx > 0 {
                    out.push_str(", ");
                }
                write_literal(out, v);
            }
            out.push(']');
        }
    }
}

/// Wrap binary operands in parentheses so precedence survives re-parsing.
fn write_operand(out: &mut String, expr: &Expression) {
    if matches!(expr, Expression::Binary { .. }) {
        out.push('(');
        write_expression(out, expr);
        out.push(')');
    } else {
        write_expression(out, expr);
    }
}

fn binary_op_str(op: BinaryOp) -> &'static str {
    match op {
        BinaryOp::Add => "+",
        BinaryOp::Subtract => "-",
        BinaryOp::Multiply => "*",
        BinaryOp::Divide => "/",
        BinaryOp::Modulo => "%",
        BinaryOp::Power => "**",
        BinaryOp::Equals => "==",
        BinaryOp::NotEquals => "!=",
        BinaryOp::GreaterThan => ">",
        BinaryOp::LessThan => "<",
        BinaryOp::AtLeast => ">=",
        BinaryOp::AtMost => "<=",
        BinaryOp::Contains => "contains",
        BinaryOp::NotContains => "not_contains",
        BinaryOp::StartsWith => "starts_with",
        BinaryOp::EndsWith => "ends_with",
        BinaryOp::Matches => "matches",
        BinaryOp::NotMatches => "not_matches",
        BinaryOp::InList => "in_list",
        BinaryOp::NotInList => "not_in_list",
        BinaryOp::And => "and",
        BinaryOp::Or => "or",
    }
}

fn unary_op_str(op: UnaryOp) -> &'static str {
    match op {
        UnaryOp::Not => "not",
        UnaryOp::Negate => "-",
        UnaryOp::Positive => "+",
        UnaryOp::Exists => "exists",
        UnaryOp::IsNull => "is_null",
        UnaryOp::IsNotNull => "is_not_null",
        UnaryOp::IsNumber => "is_number",
        UnaryOp::IsString => "is_string",
        UnaryOp::IsBoolean => "is_boolean",
        UnaryOp::IsList => "is_list",
    }
}

fn aggregate_fn_name(op: AggregateOp) -> &'static str {
    match op {
        AggregateOp::Sum => "sum",
        AggregateOp::Average => "average",
        AggregateOp::Min => "min",
        AggregateOp::Max => "max",
    }
}

fn write_expression(out: &mut String, expr: &Expression) {
    match expr {
        Expression::Literal { value, .. } => write_literal(out, value),
        Expression::Variable {
            name,
            property_path,
            index,
            ..
        } => {
            out.push_str(name);
            for part in property_path {
                out.push('.');
                out.push_str(part);
            }
            if let Some(index) = index {
                out.push('[');
                write_expression(out, index);
                out.push(']');
            }
        }
        Expression::Unary { op, operand, .. } => {
            out.push_str(unary_op_str(*op));
            if matches!(op, UnaryOp::Negate | UnaryOp::Positive) {
                write_operand(out, operand);
            } else {
                out.push(' ');
                write_operand(out, operand);
            }
        }
        Expression::Binary {
            left, op, right, ..
        } => {
            write_operand(out, left);
            let _ = write!(out, " {} ", binary_op_str(*op));
            write_operand(out, right);
        }
        Expression::Arithmetic { op, operands, .. } => {
            out.push_str(aggregate_fn_name(*op));
            out.push('(');
            for (idx, operand) in operands.iter().enumerate() {
                if idx > 0 {
                    out.push_str(", ");
                }
                write_expression(out, operand);
            }
            out.push(')');
        }
        Expression::Array { elements, .. } => {
            out.push('[');
            for (idx, element) in elements.iter().enumerate() {
                if idx > 0 {
                    out.push_str(", ");
                }
                write_expression(out, element);
            }
            out.push(']');
        }
        Expression::FunctionCall { name, args, .. } => {
            out.push_str(name);
            out.push('(');
            for (idx, arg) in args.iter().enumerate() {
                if idx > 0 {
                    out.push_str(", ");
                }
                write_expression(out, arg);
            }
            out.push(')');
        }
        Expression::JsonPath { source, path, .. } => {
            out.push_str("json_get(");
            write_expression(out, source);
            out.push_str(", ");
            write_expression(out, path);
            out.push(')');
        }
        Expression::RestCall {
            method,
            url,
            body,
            headers,
            timeout_ms,
            ..
        } => {
            out.push_str(method.function_name());
            out.push('(');
            write_expression(out, url);
            let tail_args = [
                body.as_deref().map(|e| e.to_dsl_string()),
                headers.as_deref().map(|e| e.to_dsl_string()),
                timeout_ms.map(|t| t.to_string()),
            ];
            let last_present = tail_args.iter().rposition(Option::is_some);
            if let Some(last) = last_present {
                for arg in tail_args.iter().take(last + 1) {
                    out.push_str(", ");
                    match arg {
                        Some(text) => out.push_str(text),
                        None => out.push_str("null"),
                    }
                }
            }
            out.push(')');
        }
    }
}

fn write_condition(out: &mut String, cond: &Condition) {
    match cond {
        Condition::Comparison {
            left,
            op,
            right,
            range_end,
            ..
        } => {
            write_operand(out, left);
            let _ = write!(out, " {}", op.keyword());
            if let Some(right) = right {
                out.push(' ');
                write_operand(out, right);
            }
            if let Some(range_end) = range_end {
                out.push_str(" and ");
                write_operand(out, range_end);
            }
        }
        Condition::Logical { op, operands, .. } => match op {
            LogicalOp::Not => {
                out.push_str("not ");
                write_condition_operand(out, &operands[0]);
            }
            LogicalOp::And | LogicalOp::Or => {
                let joiner = if *op == LogicalOp::And { " and " } else { " or " };
                for (idx, operand) in operands.iter().enumerate() {
                    if idx > 0 {
                        out.push_str(joiner);
                    }
                    write_condition_operand(out, operand);
                }
            }
        },
        Condition::Expression { expr, .. } => write_expression(out, expr),
    }
}

/// Parenthesise logical sub-conditions so nesting survives re-parsing.
fn write_condition_operand(out: &mut String, cond: &Condition) {
    if matches!(cond, Condition::Logical { .. }) {
        out.push('(');
        write_condition(out, cond);
        out.push(')');
    } else {
        write_condition(out, cond);
    }
}

fn write_action_list(out: &mut String, actions: &[Action]) {
    for (idx, action) in actions.iter().enumerate() {
        if idx > 0 {
            out.push_str("; ");
        }
        write_action(out, action);
    }
}

fn write_action(out: &mut String, action: &Action) {
    match action {
        Action::Assignment {
            variable, value, ..
        } => {
            let _ = write!(out, "set {variable} to ");
            write_expression(out, value);
        }
        Action::Calculate {
            variable,
            expression,
            ..
        } => {
            let _ = write!(out, "calculate {variable} as ");
            write_expression(out, expression);
        }
        Action::Run {
            variable,
            expression,
            ..
        } => {
            let _ = write!(out, "run {variable} as ");
            write_expression(out, expression);
        }
        Action::Arithmetic {
            op,
            variable,
            operand,
            ..
        } => match op {
            ArithmeticActionOp::Add => {
                out.push_str("add ");
                write_expression(out, operand);
                let _ = write!(out, " to {variable}");
            }
            ArithmeticActionOp::Subtract => {
                out.push_str("subtract ");
                write_expression(out, operand);
                let _ = write!(out, " from {variable}");
            }
            ArithmeticActionOp::Multiply => {
                let _ = write!(out, "multiply {variable} by ");
                write_expression(out, operand);
            }
            ArithmeticActionOp::Divide => {
                let _ = write!(out, "divide {variable} by ");
                write_expression(out, operand);
            }
        },
        Action::List {
            op, value, list, ..
        } => {
            let verb = match op {
                ListActionOp::Append => "append",
                ListActionOp::Prepend => "prepend",
                ListActionOp::Remove => "remove",
            };
            out.push_str(verb);
            out.push(' ');
            write_expression(out, value);
            let joiner = if *op == ListActionOp::Remove {
                " from "
            } else {
                " to "
            };
            out.push_str(joiner);
            out.push_str(list);
        }
        Action::FunctionCall { name, args, .. } => {
            let _ = write!(out, "call {name}");
            if !args.is_empty() {
                out.push_str(" with ");
                for (idx, arg) in args.iter().enumerate() {
                    if idx > 0 {
                        out.push_str(", ");
                    }
                    write_expression(out, arg);
                }
            }
        }
        Action::Conditional {
            condition,
            then_actions,
            else_actions,
            ..
        } => {
            out.push_str("if ");
            write_condition(out, condition);
            out.push_str(" then ");
            write_action_list(out, then_actions);
            if !else_actions.is_empty() {
                out.push_str(" else ");
                write_action_list(out, else_actions);
            }
        }
        Action::ForEach {
            variable,
            index_variable,
            list,
            body,
            ..
        } => {
            let _ = write!(out, "forEach {variable}");
            if let Some(index) = index_variable {
                let _ = write!(out, ", {index}");
            }
            out.push_str(" in ");
            write_expression(out, list);
            out.push_str(": ");
            write_action_list(out, body);
        }
        Action::While {
            condition, body, ..
        } => {
            out.push_str("while ");
            write_condition(out, condition);
            out.push_str(": ");
            write_action_list(out, body);
        }
        Action::DoWhile {
            body, condition, ..
        } => {
            out.push_str("do: ");
            write_action_list(out, body);
            out.push_str(" while ");
            write_condition(out, condition);
        }
        Action::CircuitBreaker { message, code, .. } => {
            let _ = write!(out, "circuit_breaker {}", quote(message));
            if let Some(code) = code {
                let _ = write!(out, " with {}", quote(code));
            }
        }
    }
}
