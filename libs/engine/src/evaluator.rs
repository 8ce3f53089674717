//! Expression and condition evaluation
//!
//! A fold over the AST variants against one [`EvaluationContext`]. Logical
//! operators short-circuit left to right; arithmetic promotes to decimal
//! with HALF_UP rounding at the configured scale; REST and JSON-path nodes
//! delegate to their collaborators and never throw through the evaluator.

use crate::checks;
use crate::context::EvaluationContext;
use crate::error::{Error, Result};
use crate::functions;
use crate::json_path::JsonPathResolver;
use crate::numeric;
use crate::rest::{RestClient, RestRequest, DEFAULT_TIMEOUT};
use crate::value::Value;
use arbiter_dsl::ast::{
    BinaryOp, ComparisonOp, Condition, Expression, LiteralValue, LogicalOp, UnaryOp,
};
use arbiter_dsl::SourceLocation;
use rust_decimal::Decimal;
use std::time::Duration;
use tracing::{debug, warn};

/// Expression/condition visitor over one evaluation context
pub struct Evaluator<'a> {
    pub ctx: &'a mut EvaluationContext,
    pub scale: u32,
    pub rest: &'a dyn RestClient,
    pub json: &'a dyn JsonPathResolver,
}

impl<'a> Evaluator<'a> {
    pub fn new(
        ctx: &'a mut EvaluationContext,
        scale: u32,
        rest: &'a dyn RestClient,
        json: &'a dyn JsonPathResolver,
    ) -> Self {
        Self {
            ctx,
            scale,
            rest,
            json,
        }
    }

    // ==================================================================
    // Expressions
    // ==================================================================

    pub fn evaluate_expression(&mut self, expr: &Expression) -> Result<Value> {
        match expr {
            Expression::Literal { value, .. } => Ok(literal_to_value(value)),
            Expression::Variable {
                name,
                property_path,
                index,
                location,
            } => self.evaluate_variable(name, property_path, index.as_deref(), *location),
            Expression::Unary {
                op,
                operand,
                location,
            } => self.evaluate_unary(*op, operand, *location),
            Expression::Binary {
                left,
                op,
                right,
                location,
            } => self.evaluate_binary(left, *op, right, *location),
            Expression::Arithmetic { op, operands, .. } => {
                let mut values = Vec::with_capacity(operands.len());
                for operand in operands {
                    values.push(self.evaluate_expression(operand)?);
                }
                let name = match op {
                    arbiter_dsl::ast::AggregateOp::Sum => "sum",
                    arbiter_dsl::ast::AggregateOp::Average => "average",
                    arbiter_dsl::ast::AggregateOp::Min => "min",
                    arbiter_dsl::ast::AggregateOp::Max => "max",
                };
                functions::aggregate(name, &values, self.scale, expr.location())
            }
            Expression::Array { elements, .. } => {
                let mut values = Vec::with_capacity(elements.len());
                for element in elements {
                    values.push(self.evaluate_expression(element)?);
                }
                Ok(Value::List(values))
            }
            Expression::FunctionCall {
                name,
                args,
                location,
            } => self.evaluate_function_call(name, args, *location),
            Expression::JsonPath { source, path, .. } => {
                let source = self.evaluate_expression(source)?;
                let path = self.evaluate_expression(path)?.to_display_string();
                Ok(self.json.get(&source, &path))
            }
            Expression::RestCall {
                method,
                url,
                body,
                headers,
                timeout_ms,
                ..
            } => {
                let url = self.evaluate_expression(url)?.to_display_string();
                let body = body
                    .as_deref()
                    .map(|b| self.evaluate_expression(b))
                    .transpose()?;
                let headers = headers
                    .as_deref()
                    .map(|h| self.evaluate_expression(h))
                    .transpose()?;
                let timeout = timeout_ms
                    .map(Duration::from_millis)
                    .unwrap_or(DEFAULT_TIMEOUT);
                debug!(
                    operation_id = %self.ctx.operation_id,
                    method = method.as_str(),
                    url = %url,
                    "dispatching REST call"
                );
                Ok(self.rest.execute(RestRequest {
                    method: *method,
                    url,
                    body,
                    headers,
                    timeout,
                }))
            }
        }
    }

    fn evaluate_variable(
        &mut self,
        name: &str,
        property_path: &[String],
        index: Option<&Expression>,
        location: SourceLocation,
    ) -> Result<Value> {
        let mut value = match self.ctx.get(name) {
            Some(value) => value.clone(),
            None => {
                debug!(
                    operation_id = %self.ctx.operation_id,
                    variable = name,
                    "variable not found; evaluating as null"
                );
                return Ok(Value::Null);
            }
        };

        for part in property_path {
            value = match &value {
                Value::Object(entries) => entries.get(part).cloned().unwrap_or(Value::Null),
                _ => Value::Null,
            };
            if value.is_null() {
                return Ok(Value::Null);
            }
        }

        if let Some(index_expr) = index {
            let index_value = self.evaluate_expression(index_expr)?;
            let Some(idx) = index_value.as_decimal().and_then(|d| {
                use rust_decimal::prelude::ToPrimitive;
                d.trunc().to_usize()
            }) else {
                return Err(Error::TypeMismatch {
                    message: format!("index into '{name}' must be a non-negative number"),
                    location,
                });
            };
            value = match &value {
                Value::List(items) => items.get(idx).cloned().unwrap_or(Value::Null),
                _ => Value::Null,
            };
        }

        Ok(value)
    }

    fn evaluate_unary(
        &mut self,
        op: UnaryOp,
        operand: &Expression,
        location: SourceLocation,
    ) -> Result<Value> {
        let value = self.evaluate_expression(operand)?;
        match op {
            UnaryOp::Not => Ok(Value::Boolean(!value.to_boolean())),
            UnaryOp::Negate => {
                let n = value.as_decimal().ok_or_else(|| Error::TypeMismatch {
                    message: format!("cannot negate {value}"),
                    location,
                })?;
                Ok(Value::Number(-n))
            }
            UnaryOp::Positive => {
                let n = value.as_decimal().ok_or_else(|| Error::TypeMismatch {
                    message: format!("'+' expects a number, got {value}"),
                    location,
                })?;
                Ok(Value::Number(n))
            }
            UnaryOp::Exists => Ok(Value::Boolean(!value.is_null())),
            UnaryOp::IsNull => Ok(Value::Boolean(value.is_null())),
            UnaryOp::IsNotNull => Ok(Value::Boolean(!value.is_null())),
            UnaryOp::IsNumber => Ok(Value::Boolean(matches!(value, Value::Number(_)))),
            UnaryOp::IsString => Ok(Value::Boolean(matches!(value, Value::String(_)))),
            UnaryOp::IsBoolean => Ok(Value::Boolean(matches!(value, Value::Boolean(_)))),
            UnaryOp::IsList => Ok(Value::Boolean(matches!(value, Value::List(_)))),
        }
    }

    fn evaluate_binary(
        &mut self,
        left: &Expression,
        op: BinaryOp,
        right: &Expression,
        location: SourceLocation,
    ) -> Result<Value> {
        // Logical operators short-circuit before the right side evaluates
        if op == BinaryOp::And {
            let left = self.evaluate_expression(left)?;
            if !left.to_boolean() {
                return Ok(Value::Boolean(false));
            }
            let right = self.evaluate_expression(right)?;
            return Ok(Value::Boolean(right.to_boolean()));
        }
        if op == BinaryOp::Or {
            let left = self.evaluate_expression(left)?;
            if left.to_boolean() {
                return Ok(Value::Boolean(true));
            }
            let right = self.evaluate_expression(right)?;
            return Ok(Value::Boolean(right.to_boolean()));
        }

        let left_value = self.evaluate_expression(left)?;
        let right_value = self.evaluate_expression(right)?;

        match op {
            BinaryOp::Add | BinaryOp::Subtract | BinaryOp::Multiply | BinaryOp::Divide
            | BinaryOp::Modulo | BinaryOp::Power => {
                self.numeric_binary(op, &left_value, &right_value, location)
            }
            BinaryOp::Equals => Ok(Value::Boolean(left_value.value_equals(&right_value))),
            BinaryOp::NotEquals => Ok(Value::Boolean(!left_value.value_equals(&right_value))),
            BinaryOp::GreaterThan | BinaryOp::LessThan | BinaryOp::AtLeast | BinaryOp::AtMost => {
                Ok(Value::Boolean(self.relational(
                    op,
                    &left_value,
                    &right_value,
                )))
            }
            BinaryOp::Contains => Ok(Value::Boolean(contains(&left_value, &right_value))),
            BinaryOp::NotContains => Ok(Value::Boolean(!contains(&left_value, &right_value))),
            BinaryOp::StartsWith => Ok(Value::Boolean(starts_with(&left_value, &right_value))),
            BinaryOp::EndsWith => Ok(Value::Boolean(ends_with(&left_value, &right_value))),
            BinaryOp::Matches => self
                .regex_match(&left_value, &right_value, location)
                .map(Value::Boolean),
            BinaryOp::NotMatches => self
                .regex_match(&left_value, &right_value, location)
                .map(|m| Value::Boolean(!m)),
            BinaryOp::InList => self
                .in_list(&left_value, &right_value, location)
                .map(Value::Boolean),
            BinaryOp::NotInList => self
                .in_list(&left_value, &right_value, location)
                .map(|m| Value::Boolean(!m)),
            BinaryOp::And | BinaryOp::Or => unreachable!("handled above"),
        }
    }

    fn numeric_binary(
        &mut self,
        op: BinaryOp,
        left: &Value,
        right: &Value,
        location: SourceLocation,
    ) -> Result<Value> {
        let a = left.as_decimal().ok_or_else(|| Error::TypeMismatch {
            message: format!("left operand of '{op:?}' is not numeric: {left}"),
            location,
        })?;
        let b = right.as_decimal().ok_or_else(|| Error::TypeMismatch {
            message: format!("right operand of '{op:?}' is not numeric: {right}"),
            location,
        })?;

        let result = match op {
            BinaryOp::Add => a + b,
            BinaryOp::Subtract => a - b,
            BinaryOp::Multiply => numeric::mul(a, b, self.scale),
            BinaryOp::Divide => {
                if b.is_zero() && a.is_zero() {
                    // 0 / 0 yields zero with a warning
                    warn!(
                        operation_id = %self.ctx.operation_id,
                        "0 / 0 evaluated; returning zero"
                    );
                    return Ok(Value::Number(Decimal::ZERO));
                }
                return numeric::div(a, b, self.scale)
                    .map(Value::Number)
                    .ok_or(Error::DivisionByZero { location });
            }
            BinaryOp::Modulo => {
                return numeric::rem(a, b)
                    .map(Value::Number)
                    .ok_or(Error::DivisionByZero { location });
            }
            BinaryOp::Power => {
                let (result, lossy) =
                    numeric::pow(a, b, self.scale).ok_or_else(|| Error::TypeMismatch {
                        message: format!("cannot raise {a} to {b}"),
                        location,
                    })?;
                if lossy {
                    // EVAL_PRECISION_LOSS: fractional exponents go through
                    // binary doubles
                    warn!(
                        operation_id = %self.ctx.operation_id,
                        code = "EVAL_PRECISION_LOSS",
                        "power with non-integer exponent computed as double"
                    );
                }
                result
            }
            _ => unreachable!(),
        };
        Ok(Value::Number(result))
    }

    fn relational(&self, op: BinaryOp, left: &Value, right: &Value) -> bool {
        let Some(ordering) = left.compare(right) else {
            warn!(
                operation_id = %self.ctx.operation_id,
                "incomparable operands {left} and {right}; comparison is false"
            );
            return false;
        };
        match op {
            BinaryOp::GreaterThan => ordering.is_gt(),
            BinaryOp::LessThan => ordering.is_lt(),
            BinaryOp::AtLeast => ordering.is_ge(),
            BinaryOp::AtMost => ordering.is_le(),
            _ => unreachable!(),
        }
    }

    fn regex_match(
        &mut self,
        left: &Value,
        right: &Value,
        location: SourceLocation,
    ) -> Result<bool> {
        let text = left.to_display_string();
        let Some(pattern) = right.as_str() else {
            return Err(Error::TypeMismatch {
                message: "'matches' expects a string pattern".to_string(),
                location,
            });
        };
        let regex = self.ctx.compiled_regex(pattern, location)?;
        Ok(regex.is_match(&text))
    }

    fn in_list(&self, left: &Value, right: &Value, location: SourceLocation) -> Result<bool> {
        let Some(items) = right.as_list() else {
            return Err(Error::TypeMismatch {
                message: "'in_list' expects a list on the right".to_string(),
                location,
            });
        };
        Ok(items.iter().any(|item| left.value_equals(item)))
    }

    fn evaluate_function_call(
        &mut self,
        name: &str,
        args: &[Expression],
        location: SourceLocation,
    ) -> Result<Value> {
        let mut values = Vec::with_capacity(args.len());
        for arg in args {
            values.push(self.evaluate_expression(arg)?);
        }

        // JSON functions route through the collaborator
        match name {
            "json_get" => {
                functions::check_arity(name, values.len(), location)?;
                let path = values[1].to_display_string();
                return Ok(self.json.get(&values[0], &path));
            }
            "json_exists" => {
                functions::check_arity(name, values.len(), location)?;
                let path = values[1].to_display_string();
                return Ok(Value::Boolean(self.json.exists(&values[0], &path)));
            }
            "json_size" => {
                functions::check_arity(name, values.len(), location)?;
                let path = values[1].to_display_string();
                return Ok(self.json.size(&values[0], &path));
            }
            _ => {}
        }

        functions::call(name, &values, self.scale, location)
    }

    // ==================================================================
    // Conditions
    // ==================================================================

    pub fn evaluate_condition(&mut self, cond: &Condition) -> Result<bool> {
        match cond {
            Condition::Expression { expr, .. } => {
                Ok(self.evaluate_expression(expr)?.to_boolean())
            }
            Condition::Logical { op, operands, .. } => match op {
                LogicalOp::And => {
                    // Empty AND is vacuously true
                    for operand in operands {
                        if !self.evaluate_condition(operand)? {
                            return Ok(false);
                        }
                    }
                    Ok(true)
                }
                LogicalOp::Or => {
                    for operand in operands {
                        if self.evaluate_condition(operand)? {
                            return Ok(true);
                        }
                    }
                    Ok(false)
                }
                LogicalOp::Not => match operands.first() {
                    Some(operand) => Ok(!self.evaluate_condition(operand)?),
                    None => Ok(true),
                },
            },
            Condition::Comparison {
                left,
                op,
                right,
                range_end,
                location,
            } => self.evaluate_comparison(left, *op, right.as_ref(), range_end.as_ref(), *location),
        }
    }

    /// Evaluate a condition, defaulting recoverable faults to `false`.
    pub fn evaluate_condition_guarded(&mut self, cond: &Condition) -> Result<bool> {
        match self.evaluate_condition(cond) {
            Ok(result) => Ok(result),
            Err(e) if e.is_recoverable() => {
                warn!(
                    operation_id = %self.ctx.operation_id,
                    code = e.code(),
                    error = %e,
                    "recoverable fault in condition; defaulting to false"
                );
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    fn evaluate_comparison(
        &mut self,
        left: &Expression,
        op: ComparisonOp,
        right: Option<&Expression>,
        range_end: Option<&Expression>,
        location: SourceLocation,
    ) -> Result<bool> {
        let left_value = self.evaluate_expression(left)?;

        // Unary validators need no right operand
        match op {
            ComparisonOp::Exists => return Ok(!left_value.is_null()),
            ComparisonOp::IsNull => return Ok(left_value.is_null()),
            ComparisonOp::IsNotNull => return Ok(!left_value.is_null()),
            ComparisonOp::IsEmpty => return Ok(checks::is_empty(&left_value)),
            ComparisonOp::IsNotEmpty => return Ok(!checks::is_empty(&left_value)),
            ComparisonOp::IsNumeric => return Ok(checks::is_numeric(&left_value)),
            ComparisonOp::IsEmail => return Ok(checks::is_email(&left_value)),
            ComparisonOp::IsPhone => return Ok(checks::is_phone(&left_value)),
            ComparisonOp::IsDate => return Ok(checks::is_date(&left_value)),
            ComparisonOp::IsPositive => return Ok(checks::is_positive(&left_value)),
            ComparisonOp::IsNegative => return Ok(checks::is_negative(&left_value)),
            ComparisonOp::IsZero => return Ok(checks::is_zero(&left_value)),
            ComparisonOp::IsPercentage => return Ok(checks::is_percentage(&left_value)),
            ComparisonOp::IsCurrency => return Ok(checks::is_currency(&left_value)),
            ComparisonOp::IsCreditScore => return Ok(checks::is_credit_score(&left_value)),
            ComparisonOp::IsSsn => return Ok(checks::is_ssn(&left_value)),
            ComparisonOp::IsAccountNumber => return Ok(checks::is_account_number(&left_value)),
            ComparisonOp::IsRoutingNumber => return Ok(checks::is_routing_number(&left_value)),
            ComparisonOp::IsBusinessDay => return Ok(checks::is_business_day(&left_value)),
            ComparisonOp::IsWeekend => return Ok(checks::is_weekend(&left_value)),
            _ => {}
        }

        let right_value = match right {
            Some(right) => self.evaluate_expression(right)?,
            None => {
                return Err(Error::TypeMismatch {
                    message: format!("operator '{}' requires a right operand", op.keyword()),
                    location,
                })
            }
        };

        match op {
            ComparisonOp::Equals => Ok(left_value.value_equals(&right_value)),
            ComparisonOp::NotEquals => Ok(!left_value.value_equals(&right_value)),
            ComparisonOp::GreaterThan => {
                Ok(self.relational(BinaryOp::GreaterThan, &left_value, &right_value))
            }
            ComparisonOp::LessThan => {
                Ok(self.relational(BinaryOp::LessThan, &left_value, &right_value))
            }
            ComparisonOp::AtLeast => {
                Ok(self.relational(BinaryOp::AtLeast, &left_value, &right_value))
            }
            ComparisonOp::AtMost => {
                Ok(self.relational(BinaryOp::AtMost, &left_value, &right_value))
            }
            ComparisonOp::Contains => Ok(contains(&left_value, &right_value)),
            ComparisonOp::NotContains => Ok(!contains(&left_value, &right_value)),
            ComparisonOp::StartsWith => Ok(starts_with(&left_value, &right_value)),
            ComparisonOp::EndsWith => Ok(ends_with(&left_value, &right_value)),
            ComparisonOp::Matches => self.regex_match(&left_value, &right_value, location),
            ComparisonOp::NotMatches => {
                self.regex_match(&left_value, &right_value, location).map(|m| !m)
            }
            ComparisonOp::InList => self.in_list(&left_value, &right_value, location),
            ComparisonOp::NotInList => {
                self.in_list(&left_value, &right_value, location).map(|m| !m)
            }
            ComparisonOp::Between | ComparisonOp::NotBetween => {
                let range_end_value = match range_end {
                    Some(range_end) => self.evaluate_expression(range_end)?,
                    None => {
                        return Err(Error::TypeMismatch {
                            message: "'between' requires an upper bound".to_string(),
                            location,
                        })
                    }
                };
                let within =
                    self.between(&left_value, &right_value, &range_end_value, location)?;
                Ok(if op == ComparisonOp::Between {
                    within
                } else {
                    !within
                })
            }
            ComparisonOp::AgeAtLeast | ComparisonOp::AgeLessThan => {
                let Some(age) = checks::age_in_years(&left_value) else {
                    warn!(
                        operation_id = %self.ctx.operation_id,
                        "age validator could not parse birthdate {left_value}; condition is false"
                    );
                    return Ok(false);
                };
                let Some(threshold) = right_value.as_decimal() else {
                    return Err(Error::TypeMismatch {
                        message: "age validators expect a numeric threshold".to_string(),
                        location,
                    });
                };
                let age = Decimal::from(age);
                Ok(if op == ComparisonOp::AgeAtLeast {
                    age >= threshold
                } else {
                    age < threshold
                })
            }
            _ => unreachable!("unary validators handled above"),
        }
    }

    /// Inclusive on both ends; reversed bounds swap with a warning.
    fn between(
        &mut self,
        value: &Value,
        low: &Value,
        high: &Value,
        location: SourceLocation,
    ) -> Result<bool> {
        let (mut low, mut high) = (low.clone(), high.clone());
        if let (Some(a), Some(b)) = (low.as_decimal(), high.as_decimal()) {
            if a > b {
                warn!(
                    operation_id = %self.ctx.operation_id,
                    code = "EVAL_BETWEEN_REVERSED",
                    "between bounds reversed ({a} > {b}); swapping"
                );
                std::mem::swap(&mut low, &mut high);
            }
        }
        let lower_ok = match value.compare(&low) {
            Some(ordering) => ordering.is_ge(),
            None => {
                return Err(Error::TypeMismatch {
                    message: format!("cannot compare {value} with {low}"),
                    location,
                })
            }
        };
        let upper_ok = match value.compare(&high) {
            Some(ordering) => ordering.is_le(),
            None => {
                return Err(Error::TypeMismatch {
                    message: format!("cannot compare {value} with {high}"),
                    location,
                })
            }
        };
        Ok(lower_ok && upper_ok)
    }
}

fn literal_to_value(literal: &LiteralValue) -> Value {
    match literal {
        LiteralValue::Number(n) => Value::Number(*n),
        LiteralValue::String(s) => Value::String(s.clone()),
        LiteralValue::Boolean(b) => Value::Boolean(*b),
        LiteralValue::Null => Value::Null,
        LiteralValue::List(values) => {
            Value::List(values.iter().map(literal_to_value).collect())
        }
    }
}

fn contains(left: &Value, right: &Value) -> bool {
    match left {
        Value::String(haystack) => match right {
            Value::String(needle) => haystack.contains(needle.as_str()),
            other => haystack.contains(&other.to_display_string()),
        },
        Value::List(items) => items.iter().any(|item| item.value_equals(right)),
        _ => false,
    }
}

fn starts_with(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::String(s), Value::String(prefix)) => s.starts_with(prefix.as_str()),
        _ => false,
    }
}

fn ends_with(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::String(s), Value::String(suffix)) => s.ends_with(suffix.as_str()),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::json_path::SimpleJsonPath;
    use crate::rest::DisabledRestClient;
    use arbiter_dsl::Parser;
    use std::str::FromStr;

    fn eval_expr(source: &str, ctx: &mut EvaluationContext) -> Result<Value> {
        let expr = Parser::parse_expression_source(source).unwrap();
        Evaluator::new(ctx, numeric::DEFAULT_SCALE, &DisabledRestClient, &SimpleJsonPath)
            .evaluate_expression(&expr)
    }

    fn eval_cond(source: &str, ctx: &mut EvaluationContext) -> Result<bool> {
        let cond = Parser::parse_condition_source(source).unwrap();
        Evaluator::new(ctx, numeric::DEFAULT_SCALE, &DisabledRestClient, &SimpleJsonPath)
            .evaluate_condition(&cond)
    }

    fn ctx_with(pairs: &[(&str, serde_json::Value)]) -> EvaluationContext {
        let mut ctx = EvaluationContext::new();
        for (name, value) in pairs {
            ctx.set_input(name, Value::from_json(value)).unwrap();
        }
        ctx
    }

    fn d(text: &str) -> Value {
        Value::Number(Decimal::from_str(text).unwrap())
    }

    #[test]
    fn test_arithmetic_precedence() {
        let mut ctx = EvaluationContext::new();
        assert_eq!(eval_expr("2 + 3 * 4", &mut ctx).unwrap(), d("14"));
        assert_eq!(eval_expr("(2 + 3) * 4", &mut ctx).unwrap(), d("20"));
        assert_eq!(eval_expr("2 ** 3 ** 2", &mut ctx).unwrap(), d("512"));
        assert_eq!(eval_expr("10 % 3", &mut ctx).unwrap(), d("1"));
    }

    #[test]
    fn test_decimal_fidelity() {
        let mut ctx = EvaluationContext::new();
        assert_eq!(eval_expr("0.1 + 0.2", &mut ctx).unwrap(), d("0.3"));
        assert_eq!(eval_expr("0.1 + 0.2 - 0.1", &mut ctx).unwrap(), d("0.2"));
    }

    #[test]
    fn test_division_rounding() {
        let mut ctx = EvaluationContext::new();
        assert_eq!(eval_expr("1 / 3", &mut ctx).unwrap(), d("0.3333333333"));
    }

    #[test]
    fn test_division_by_zero() {
        let mut ctx = EvaluationContext::new();
        let err = eval_expr("5 / 0", &mut ctx).unwrap_err();
        assert_eq!(err.code(), "EVAL_DIV_BY_ZERO");
        assert!(err.is_recoverable());
        // 0 / 0 returns zero with a warning
        assert_eq!(eval_expr("0 / 0", &mut ctx).unwrap(), d("0"));
    }

    #[test]
    fn test_variable_lookup_and_paths() {
        let mut ctx = ctx_with(&[(
            "applicant",
            serde_json::json!({ "income": 50000, "accounts": [{"balance": 10}] }),
        )]);
        assert_eq!(eval_expr("applicant.income", &mut ctx).unwrap(), d("50000"));
        let account = eval_expr("applicant.accounts[0]", &mut ctx).unwrap();
        assert!(matches!(account, Value::Object(_)));
        assert_eq!(eval_expr("applicant.missing", &mut ctx).unwrap(), Value::Null);
    }

    #[test]
    fn test_missing_variable_is_null() {
        let mut ctx = EvaluationContext::new();
        assert_eq!(eval_expr("missing", &mut ctx).unwrap(), Value::Null);
        assert!(eval_cond("missing is_null", &mut ctx).unwrap());
        assert!(!eval_cond("exists missing", &mut ctx).unwrap());
    }

    #[test]
    fn test_condition_comparisons() {
        let mut ctx = ctx_with(&[
            ("creditScore", serde_json::json!(720)),
            ("name", serde_json::json!("McAllister")),
        ]);
        assert!(eval_cond("creditScore at_least 650", &mut ctx).unwrap());
        assert!(!eval_cond("creditScore < 700", &mut ctx).unwrap());
        assert!(eval_cond("name starts_with \"Mc\"", &mut ctx).unwrap());
        assert!(eval_cond("name contains \"Alli\"", &mut ctx).unwrap());
        assert!(eval_cond("creditScore is_credit_score", &mut ctx).unwrap());
    }

    #[test]
    fn test_between_inclusive_and_reversed() {
        let mut ctx = ctx_with(&[("age", serde_json::json!(18))]);
        assert!(eval_cond("age between 18 and 65", &mut ctx).unwrap());
        assert!(eval_cond("age between 65 and 18", &mut ctx).unwrap());
        assert!(!eval_cond("age not_between 18 and 65", &mut ctx).unwrap());
    }

    #[test]
    fn test_short_circuit_and() {
        // The right operand would fault (bad regex); short-circuit must
        // prevent it from ever evaluating
        let mut ctx = ctx_with(&[("x", serde_json::json!(1))]);
        let result = eval_cond("x > 5 and x matches \"[\"", &mut ctx);
        assert_eq!(result.unwrap(), false);

        // Without short-circuit the fault surfaces
        let err = eval_cond("x > 0 and x matches \"[\"", &mut ctx).unwrap_err();
        assert_eq!(err.code(), "EVAL_BAD_REGEX");
    }

    #[test]
    fn test_short_circuit_or() {
        let mut ctx = ctx_with(&[("x", serde_json::json!(1))]);
        let result = eval_cond("x > 0 or x matches \"[\"", &mut ctx);
        assert_eq!(result.unwrap(), true);
    }

    #[test]
    fn test_guarded_condition_defaults_false() {
        let mut ctx = ctx_with(&[("x", serde_json::json!("abc"))]);
        let cond = Parser::parse_condition_source("x matches \"[\"").unwrap();
        let mut evaluator = Evaluator::new(
            &mut ctx,
            numeric::DEFAULT_SCALE,
            &DisabledRestClient,
            &SimpleJsonPath,
        );
        assert_eq!(evaluator.evaluate_condition_guarded(&cond).unwrap(), false);
    }

    #[test]
    fn test_regex_matching() {
        let mut ctx = ctx_with(&[("zip", serde_json::json!("94110"))]);
        assert!(eval_cond("zip matches \"^\\\\d{5}$\"", &mut ctx).unwrap());
        assert!(!eval_cond("zip not_matches \"^\\\\d{5}$\"", &mut ctx).unwrap());
    }

    #[test]
    fn test_in_list() {
        let mut ctx = ctx_with(&[("status", serde_json::json!("OPEN"))]);
        assert!(eval_cond("status in_list [\"NEW\", \"OPEN\"]", &mut ctx).unwrap());
        assert!(eval_cond("status not_in_list [\"CLOSED\"]", &mut ctx).unwrap());
    }

    #[test]
    fn test_mixed_numeric_string_comparison() {
        let mut ctx = ctx_with(&[("score", serde_json::json!("720"))]);
        assert!(eval_cond("score at_least 650", &mut ctx).unwrap());
        let mut ctx = ctx_with(&[("score", serde_json::json!("abc"))]);
        assert!(!eval_cond("score at_least 650", &mut ctx).unwrap());
    }

    #[test]
    fn test_empty_logical_nodes() {
        let mut ctx = EvaluationContext::new();
        let and = Condition::Logical {
            op: LogicalOp::And,
            operands: vec![],
            location: SourceLocation::synthetic(),
        };
        let or = Condition::Logical {
            op: LogicalOp::Or,
            operands: vec![],
            location: SourceLocation::synthetic(),
        };
        let mut evaluator = Evaluator::new(
            &mut ctx,
            numeric::DEFAULT_SCALE,
            &DisabledRestClient,
            &SimpleJsonPath,
        );
        assert!(evaluator.evaluate_condition(&and).unwrap());
        assert!(!evaluator.evaluate_condition(&or).unwrap());
    }

    #[test]
    fn test_truthy_expression_condition() {
        let mut ctx = EvaluationContext::new();
        assert!(eval_cond("\"true\"", &mut ctx).unwrap());
        assert!(!eval_cond("\"nope\"", &mut ctx).unwrap());
    }

    #[test]
    fn test_rest_call_returns_structured_error_without_client() {
        let mut ctx = EvaluationContext::new();
        let result = eval_expr("rest_get(\"https://example.com\")", &mut ctx).unwrap();
        let Value::Object(map) = result else {
            panic!("expected structured map");
        };
        assert_eq!(map.get("success"), Some(&Value::Boolean(false)));
    }

    #[test]
    fn test_json_path_functions() {
        let mut ctx = ctx_with(&[(
            "payload",
            serde_json::json!({ "scores": [700, 720] }),
        )]);
        assert_eq!(
            eval_expr("json_get(payload, \"$.scores[1]\")", &mut ctx).unwrap(),
            d("720")
        );
        assert_eq!(
            eval_expr("json_exists(payload, \"$.scores\")", &mut ctx).unwrap(),
            Value::Boolean(true)
        );
        assert_eq!(
            eval_expr("json_size(payload, \"$.scores\")", &mut ctx).unwrap(),
            d("2")
        );
    }

    #[test]
    fn test_unknown_function() {
        let mut ctx = EvaluationContext::new();
        let err = eval_expr("mystery(1)", &mut ctx).unwrap_err();
        assert_eq!(err.code(), "EVAL_UNKNOWN_FUNCTION");
    }

    #[test]
    fn test_age_validators() {
        let mut ctx = ctx_with(&[("birthDate", serde_json::json!("1990-06-15"))]);
        assert!(eval_cond("birthDate age_at_least 18", &mut ctx).unwrap());
        assert!(!eval_cond("birthDate age_less_than 18", &mut ctx).unwrap());
    }
}
