//! Action execution
//!
//! Actions run strictly sequentially in source order. A recoverable fault in
//! one action is logged and the remaining actions in the block continue; a
//! circuit breaker unwinds the enclosing blocks as a control-flow signal,
//! never as an error.

use crate::context::EvaluationContext;
use crate::error::{Error, Result};
use crate::evaluator::Evaluator;
use crate::json_path::JsonPathResolver;
use crate::numeric;
use crate::rest::RestClient;
use crate::value::Value;
use arbiter_dsl::ast::{Action, ArithmeticActionOp, ListActionOp};
use rust_decimal::Decimal;
use tracing::{debug, warn};

/// Default hard cap on loop iterations
pub const DEFAULT_LOOP_LIMIT: usize = 1000;

/// Control-flow outcome of running a block of actions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    /// A circuit breaker fired; unwind without running further actions
    Broken,
}

/// Action visitor over one evaluation context
pub struct Executor<'a> {
    ctx: &'a mut EvaluationContext,
    scale: u32,
    loop_limit: usize,
    rest: &'a dyn RestClient,
    json: &'a dyn JsonPathResolver,
}

impl<'a> Executor<'a> {
    pub fn new(
        ctx: &'a mut EvaluationContext,
        scale: u32,
        loop_limit: usize,
        rest: &'a dyn RestClient,
        json: &'a dyn JsonPathResolver,
    ) -> Self {
        Self {
            ctx,
            scale,
            loop_limit,
            rest,
            json,
        }
    }

    fn evaluator(&mut self) -> Evaluator<'_> {
        Evaluator::new(self.ctx, self.scale, self.rest, self.json)
    }

    /// Run a block of actions in order. Recoverable faults skip the failing
    /// action; fatal faults and deadline expiry abort.
    pub fn execute_block(&mut self, actions: &[Action]) -> Result<Flow> {
        for action in actions {
            if self.ctx.deadline_exceeded() {
                return Err(Error::Timeout);
            }
            match self.execute_action(action) {
                Ok(Flow::Continue) => {}
                Ok(Flow::Broken) => return Ok(Flow::Broken),
                Err(e) if e.is_recoverable() => {
                    warn!(
                        operation_id = %self.ctx.operation_id,
                        code = e.code(),
                        location = %action.location(),
                        error = %e,
                        "recoverable fault in action; continuing with the next action"
                    );
                }
                Err(e) => return Err(e),
            }
        }
        Ok(Flow::Continue)
    }

    fn execute_action(&mut self, action: &Action) -> Result<Flow> {
        match action {
            Action::Assignment {
                variable, value, ..
            } => {
                let value = self.evaluator().evaluate_expression(value)?;
                self.ctx.set_computed(variable, value)?;
                Ok(Flow::Continue)
            }
            Action::Calculate {
                variable,
                expression,
                ..
            }
            | Action::Run {
                variable,
                expression,
                ..
            } => {
                let value = self.evaluator().evaluate_expression(expression)?;
                self.ctx.set_computed(variable, value)?;
                Ok(Flow::Continue)
            }
            Action::Arithmetic {
                op,
                variable,
                operand,
                location,
            } => {
                let operand_value = self.evaluator().evaluate_expression(operand)?;
                let operand_number =
                    operand_value
                        .as_decimal()
                        .ok_or_else(|| Error::TypeMismatch {
                            message: format!(
                                "arithmetic action operand is not numeric: {operand_value}"
                            ),
                            location: *location,
                        })?;

                let current = self.ctx.get(variable).cloned();
                let current_number = match (&current, op) {
                    // add/subtract treat a missing target as zero
                    (None, ArithmeticActionOp::Add | ArithmeticActionOp::Subtract) => {
                        Decimal::ZERO
                    }
                    (None, _) => {
                        return Err(Error::UndefinedTarget {
                            name: variable.clone(),
                            location: *location,
                        })
                    }
                    (Some(value), _) => {
                        value.as_decimal().ok_or_else(|| Error::TypeMismatch {
                            message: format!("target '{variable}' is not numeric: {value}"),
                            location: *location,
                        })?
                    }
                };

                let result = match op {
                    ArithmeticActionOp::Add => current_number + operand_number,
                    ArithmeticActionOp::Subtract => current_number - operand_number,
                    ArithmeticActionOp::Multiply => {
                        numeric::mul(current_number, operand_number, self.scale)
                    }
                    ArithmeticActionOp::Divide => {
                        if operand_number.is_zero() && current_number.is_zero() {
                            warn!(
                                operation_id = %self.ctx.operation_id,
                                "0 / 0 in arithmetic action; storing zero"
                            );
                            Decimal::ZERO
                        } else {
                            numeric::div(current_number, operand_number, self.scale)
                                .ok_or(Error::DivisionByZero {
                                    location: *location,
                                })?
                        }
                    }
                };
                self.ctx.set_computed(variable, Value::Number(result))?;
                Ok(Flow::Continue)
            }
            Action::List {
                op,
                value,
                list,
                location,
            } => {
                let value = self.evaluator().evaluate_expression(value)?;
                let current = self.ctx.get(list).cloned().unwrap_or(Value::Null);
                let mut items = match current {
                    // A null target initialises to an empty list
                    Value::Null => Vec::new(),
                    Value::List(items) => items,
                    other => {
                        return Err(Error::TypeMismatch {
                            message: format!("'{list}' is not a list: {other}"),
                            location: *location,
                        })
                    }
                };
                match op {
                    ListActionOp::Append => items.push(value),
                    ListActionOp::Prepend => items.insert(0, value),
                    ListActionOp::Remove => {
                        if let Some(pos) = items.iter().position(|item| item.value_equals(&value))
                        {
                            items.remove(pos);
                        }
                    }
                }
                self.ctx.set_computed(list, Value::List(items))?;
                Ok(Flow::Continue)
            }
            Action::FunctionCall {
                name,
                args,
                location,
            } => {
                // Return value discarded; arguments still evaluate
                let call = arbiter_dsl::ast::Expression::FunctionCall {
                    name: name.clone(),
                    args: args.clone(),
                    location: *location,
                };
                self.evaluator().evaluate_expression(&call)?;
                Ok(Flow::Continue)
            }
            Action::Conditional {
                condition,
                then_actions,
                else_actions,
                ..
            } => {
                let matched = self.evaluator().evaluate_condition_guarded(condition)?;
                if matched {
                    self.execute_block(then_actions)
                } else {
                    self.execute_block(else_actions)
                }
            }
            Action::ForEach {
                variable,
                index_variable,
                list,
                body,
                ..
            } => self.execute_foreach(variable, index_variable.as_deref(), list, body),
            Action::While {
                condition,
                body,
                location,
            } => {
                let mut iterations = 0usize;
                loop {
                    if !self.evaluator().evaluate_condition_guarded(condition)? {
                        break;
                    }
                    iterations += 1;
                    if iterations > self.loop_limit {
                        return Err(Error::LoopLimit {
                            limit: self.loop_limit,
                            location: *location,
                        });
                    }
                    if self.ctx.deadline_exceeded() {
                        return Err(Error::Timeout);
                    }
                    if self.execute_block(body)? == Flow::Broken {
                        return Ok(Flow::Broken);
                    }
                }
                Ok(Flow::Continue)
            }
            Action::DoWhile {
                body,
                condition,
                location,
            } => {
                let mut iterations = 0usize;
                loop {
                    iterations += 1;
                    if iterations > self.loop_limit {
                        return Err(Error::LoopLimit {
                            limit: self.loop_limit,
                            location: *location,
                        });
                    }
                    if self.ctx.deadline_exceeded() {
                        return Err(Error::Timeout);
                    }
                    if self.execute_block(body)? == Flow::Broken {
                        return Ok(Flow::Broken);
                    }
                    if !self.evaluator().evaluate_condition_guarded(condition)? {
                        break;
                    }
                }
                Ok(Flow::Continue)
            }
            Action::CircuitBreaker { message, code, .. } => {
                let full_message = match code {
                    Some(code) => format!("{message} ({code})"),
                    None => message.clone(),
                };
                debug!(
                    operation_id = %self.ctx.operation_id,
                    message = %full_message,
                    "circuit breaker triggered"
                );
                self.ctx.trigger_circuit_breaker(full_message);
                Ok(Flow::Broken)
            }
        }
    }

    fn execute_foreach(
        &mut self,
        variable: &str,
        index_variable: Option<&str>,
        list: &arbiter_dsl::ast::Expression,
        body: &[Action],
    ) -> Result<Flow> {
        let list_value = self.evaluator().evaluate_expression(list)?;
        let items = match list_value {
            // Null or empty means zero iterations, not a fault
            Value::Null => Vec::new(),
            Value::List(items) => items,
            other => {
                warn!(
                    operation_id = %self.ctx.operation_id,
                    "forEach target is not a list ({other}); skipping loop"
                );
                Vec::new()
            }
        };

        // Save current bindings so the loop variables can be restored after
        let saved_var = self.ctx.get_computed(variable).cloned();
        let saved_index = index_variable.and_then(|name| self.ctx.get_computed(name).cloned());

        let mut flow = Flow::Continue;
        for (idx, item) in items.into_iter().enumerate() {
            if self.ctx.deadline_exceeded() {
                return Err(Error::Timeout);
            }
            self.ctx.set_computed(variable, item)?;
            if let Some(index_name) = index_variable {
                self.ctx
                    .set_computed(index_name, Value::Number(Decimal::from(idx)))?;
            }
            if self.execute_block(body)? == Flow::Broken {
                flow = Flow::Broken;
                break;
            }
        }

        // Restore prior bindings (or unbind)
        match saved_var {
            Some(value) => self.ctx.set_computed(variable, value)?,
            None => {
                self.ctx.remove_computed(variable);
            }
        }
        if let Some(index_name) = index_variable {
            match saved_index {
                Some(value) => self.ctx.set_computed(index_name, value)?,
                None => {
                    self.ctx.remove_computed(index_name);
                }
            }
        }

        Ok(flow)
    }
}
