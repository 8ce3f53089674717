//! Dependency pass
//!
//! Walks the rule in execution order tracking which names are defined
//! (inputs, constants, computed-so-far, loop bindings). A read of an
//! undefined name is an error; a declared input that is never read is a
//! warning. Sequential execution makes true cycles impossible, so the
//! cycle check reduces to read-before-assignment.

use crate::issue::{Issue, Severity};
use arbiter_dsl::ast::{
    Action, ActionBlock, Condition, ConditionalBlock, Expression, RuleShape, RulesDSL,
};
use arbiter_engine::constants::is_constant_name;
use arbiter_engine::functions::is_known_function;
use std::collections::BTreeSet;

struct DependencyWalk<'a> {
    rule: &'a RulesDSL,
    defined: BTreeSet<String>,
    read: BTreeSet<String>,
    issues: Vec<Issue>,
}

pub fn run(rule: &RulesDSL) -> Vec<Issue> {
    let mut walk = DependencyWalk {
        rule,
        defined: rule.inputs.iter().cloned().collect(),
        read: BTreeSet::new(),
        issues: Vec::new(),
    };

    walk.walk_shape(&rule.shape);

    for input in &rule.inputs {
        if !walk.read.contains(input) {
            walk.issues.push(
                Issue::new(
                    "DEP_002",
                    Severity::Warning,
                    format!("declared input '{input}' is never referenced"),
                )
                .suggest("remove the input or reference it in a condition or action"),
            );
        }
    }

    walk.issues
}

impl DependencyWalk<'_> {
    fn walk_shape(&mut self, shape: &RuleShape) {
        match shape {
            RuleShape::Simple {
                when,
                then,
                else_actions,
            } => {
                for condition in when {
                    self.read_condition(condition);
                }
                // Both branches start from the same defined set; variables
                // assigned in one branch are available to later rules either
                // way at this level of analysis
                for action in then.iter().chain(else_actions) {
                    self.walk_action(action);
                }
            }
            RuleShape::Sequence { rules } => {
                for rule in rules {
                    self.walk_shape(&rule.shape);
                }
            }
            RuleShape::Conditional(block) => self.walk_conditional(block),
        }
    }

    fn walk_conditional(&mut self, block: &ConditionalBlock) {
        self.read_condition(&block.condition);
        self.walk_block(&block.then_block);
        if let Some(else_block) = &block.else_block {
            self.walk_block(else_block);
        }
    }

    fn walk_block(&mut self, block: &ActionBlock) {
        for action in &block.actions {
            self.walk_action(action);
        }
        if let Some(nested) = &block.nested {
            self.walk_conditional(nested);
        }
    }

    fn walk_action(&mut self, action: &Action) {
        match action {
            Action::Assignment {
                variable, value, ..
            } => {
                self.read_expression(value);
                self.defined.insert(variable.clone());
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
                self.read_expression(expression);
                self.defined.insert(variable.clone());
            }
            Action::Arithmetic {
                variable, operand, ..
            } => {
                self.read_expression(operand);
                // add/subtract bootstrap a missing target from zero, so the
                // target counts as defined from here on
                self.defined.insert(variable.clone());
            }
            Action::List { value, list, .. } => {
                self.read_expression(value);
                self.defined.insert(list.clone());
            }
            Action::FunctionCall { args, .. } => {
                for arg in args {
                    self.read_expression(arg);
                }
            }
            Action::Conditional {
                condition,
                then_actions,
                else_actions,
                ..
            } => {
                self.read_condition(condition);
                for action in then_actions.iter().chain(else_actions) {
                    self.walk_action(action);
                }
            }
            Action::ForEach {
                variable,
                index_variable,
                list,
                body,
                ..
            } => {
                self.read_expression(list);
                let var_was_defined = !self.defined.insert(variable.clone());
                let index_was_defined = index_variable
                    .as_ref()
                    .map(|name| !self.defined.insert(name.clone()));
                for action in body {
                    self.walk_action(action);
                }
                if !var_was_defined {
                    self.defined.remove(variable);
                }
                if let (Some(index_name), Some(false)) = (index_variable, index_was_defined) {
                    self.defined.remove(index_name);
                }
            }
            Action::While {
                condition, body, ..
            } => {
                self.read_condition(condition);
                for action in body {
                    self.walk_action(action);
                }
            }
            Action::DoWhile {
                body, condition, ..
            } => {
                for action in body {
                    self.walk_action(action);
                }
                self.read_condition(condition);
            }
            Action::CircuitBreaker { .. } => {}
        }
    }

    fn read_condition(&mut self, condition: &Condition) {
        match condition {
            Condition::Comparison {
                left,
                right,
                range_end,
                ..
            } => {
                self.read_expression(left);
                if let Some(right) = right {
                    self.read_expression(right);
                }
                if let Some(range_end) = range_end {
                    self.read_expression(range_end);
                }
            }
            Condition::Logical { operands, .. } => {
                for operand in operands {
                    self.read_condition(operand);
                }
            }
            Condition::Expression { expr, .. } => self.read_expression(expr),
        }
    }

    fn read_expression(&mut self, expr: &Expression) {
        match expr {
            Expression::Literal { .. } => {}
            Expression::Variable {
                name,
                index,
                location,
                ..
            } => {
                self.read.insert(name.clone());
                let known = self.defined.contains(name)
                    || is_constant_name(name)
                    || self.rule.declared_constant_codes().any(|c| c == name);
                if !known {
                    self.issues.push(
                        Issue::new(
                            "DEP_001",
                            Severity::Error,
                            format!(
                                "'{name}' is read but is not an input, constant, or previously \
                                 computed variable"
                            ),
                        )
                        .at(*location)
                        .suggest("declare it as an input or assign it earlier in the rule"),
                    );
                }
                if let Some(index) = index {
                    self.read_expression(index);
                }
            }
            Expression::Unary { operand, .. } => self.read_expression(operand),
            Expression::Binary { left, right, .. } => {
                self.read_expression(left);
                self.read_expression(right);
            }
            Expression::Arithmetic { operands, .. } => {
                for operand in operands {
                    self.read_expression(operand);
                }
            }
            Expression::Array { elements, .. } => {
                for element in elements {
                    self.read_expression(element);
                }
            }
            Expression::FunctionCall {
                name,
                args,
                location,
            } => {
                if !is_known_function(name) {
                    self.issues.push(
                        Issue::new(
                            "DEP_003",
                            Severity::Error,
                            format!("unknown function '{name}'"),
                        )
                        .at(*location)
                        .suggest("check the built-in function catalogue"),
                    );
                }
                for arg in args {
                    self.read_expression(arg);
                }
            }
            Expression::JsonPath { source, path, .. } => {
                self.read_expression(source);
                self.read_expression(path);
            }
            Expression::RestCall {
                url, body, headers, ..
            } => {
                self.read_expression(url);
                if let Some(body) = body {
                    self.read_expression(body);
                }
                if let Some(headers) = headers {
                    self.read_expression(headers);
                }
            }
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
    fn test_undefined_read_is_error() {
        let found = issues("name: X\nthen: [\"set a to undeclared + 1\"]\n");
        assert!(found.iter().any(|i| i.code == "DEP_001"));
    }

    #[test]
    fn test_inputs_and_constants_are_known() {
        let found = issues(
            "name: X\ninputs: [income]\nwhen: [\"income at_least MIN_INCOME\"]\nthen: [\"set ok to true\"]\n",
        );
        assert!(found.iter().all(|i| i.code != "DEP_001"));
    }

    #[test]
    fn test_computed_available_after_assignment() {
        let found = issues(
            "name: X\ninputs: [debt, income]\nthen: [\"calculate ratio as debt / income\", \"set high to ratio > 0.4\"]\n",
        );
        assert!(found.iter().all(|i| i.code != "DEP_001"));
    }

    #[test]
    fn test_read_before_assignment_is_error() {
        let found = issues(
            "name: X\ninputs: [income]\nthen: [\"set high to ratio > 0.4\", \"calculate ratio as 1 / income\"]\n",
        );
        assert!(found.iter().any(|i| i.code == "DEP_001"));
    }

    #[test]
    fn test_unused_input_is_warning() {
        let found = issues("name: X\ninputs: [unusedThing]\nthen: [\"set a to 1\"]\n");
        assert!(found
            .iter()
            .any(|i| i.code == "DEP_002" && i.severity == Severity::Warning));
    }

    #[test]
    fn test_loop_variable_is_bound_in_body() {
        let found = issues(
            "name: X\ninputs: [items]\nthen: [\"forEach x in items: add x to total\"]\n",
        );
        assert!(found.iter().all(|i| i.code != "DEP_001"));
    }

    #[test]
    fn test_unknown_function_is_error() {
        let found = issues("name: X\nthen: [\"set a to mystery(1)\"]\n");
        assert!(found.iter().any(|i| i.code == "DEP_003"));
    }
}
