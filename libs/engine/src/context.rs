//! Evaluation context
//!
//! A context is created per evaluation and discarded after output
//! extraction; it is owned by exactly one evaluation and never shared
//! across threads. Variables live in three disjoint scopes with lookup
//! order computed -> input -> constants.

use crate::error::{Error, Result};
use crate::value::Value;
use regex::Regex;
use std::collections::HashMap;
use std::time::Instant;
use uuid::Uuid;

/// Which scope a variable resolved from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Computed,
    Input,
    Constant,
}

/// Per-evaluation variable store and flags
pub struct EvaluationContext {
    input: HashMap<String, Value>,
    constants: HashMap<String, Value>,
    computed: HashMap<String, Value>,

    pub operation_id: String,
    pub start_time: Instant,
    pub deadline: Option<Instant>,

    pub circuit_breaker_triggered: bool,
    pub circuit_breaker_message: Option<String>,

    // Compiled regex patterns, cached for the lifetime of this evaluation
    regex_cache: HashMap<String, Regex>,
}

impl EvaluationContext {
    pub fn new() -> Self {
        Self::with_operation_id(Uuid::new_v4().to_string())
    }

    pub fn with_operation_id(operation_id: String) -> Self {
        Self {
            input: HashMap::new(),
            constants: HashMap::new(),
            computed: HashMap::new(),
            operation_id,
            start_time: Instant::now(),
            deadline: None,
            circuit_breaker_triggered: false,
            circuit_breaker_message: None,
            regex_cache: HashMap::new(),
        }
    }

    fn validate_name(name: &str) -> Result<&str> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(Error::InvalidName(
                "variable name must not be empty".to_string(),
            ));
        }
        Ok(trimmed)
    }

    /// Lookup order: computed -> input -> constants.
    pub fn get(&self, name: &str) -> Option<&Value> {
        let name = name.trim();
        self.computed
            .get(name)
            .or_else(|| self.input.get(name))
            .or_else(|| self.constants.get(name))
    }

    pub fn has(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn scope_of(&self, name: &str) -> Option<Scope> {
        let name = name.trim();
        if self.computed.contains_key(name) {
            Some(Scope::Computed)
        } else if self.input.contains_key(name) {
            Some(Scope::Input)
        } else if self.constants.contains_key(name) {
            Some(Scope::Constant)
        } else {
            None
        }
    }

    pub fn set_input(&mut self, name: &str, value: Value) -> Result<()> {
        let name = Self::validate_name(name)?;
        self.input.insert(name.to_string(), value);
        Ok(())
    }

    pub fn set_constant(&mut self, name: &str, value: Value) -> Result<()> {
        let name = Self::validate_name(name)?;
        self.constants.insert(name.to_string(), value);
        Ok(())
    }

    pub fn set_computed(&mut self, name: &str, value: Value) -> Result<()> {
        let name = Self::validate_name(name)?;
        self.computed.insert(name.to_string(), value);
        Ok(())
    }

    /// Remove a computed variable, returning its previous value (used by
    /// `forEach` to restore loop bindings).
    pub fn remove_computed(&mut self, name: &str) -> Option<Value> {
        self.computed.remove(name.trim())
    }

    /// Current computed value, if any (loop binding save/restore).
    pub fn get_computed(&self, name: &str) -> Option<&Value> {
        self.computed.get(name.trim())
    }

    /// Snapshot of all computed variables for output assembly.
    pub fn computed_variables(&self) -> &HashMap<String, Value> {
        &self.computed
    }

    pub fn trigger_circuit_breaker(&mut self, message: String) {
        self.circuit_breaker_triggered = true;
        self.circuit_breaker_message = Some(message);
    }

    pub fn deadline_exceeded(&self) -> bool {
        self.deadline
            .is_some_and(|deadline| Instant::now() >= deadline)
    }

    /// Compile a regex, caching it for this evaluation.
    pub fn compiled_regex(
        &mut self,
        pattern: &str,
        location: arbiter_dsl::SourceLocation,
    ) -> Result<&Regex> {
        if !self.regex_cache.contains_key(pattern) {
            let compiled = Regex::new(pattern).map_err(|e| Error::BadRegex {
                pattern: pattern.to_string(),
                reason: e.to_string(),
                location,
            })?;
            self.regex_cache.insert(pattern.to_string(), compiled);
        }
        Ok(&self.regex_cache[pattern])
    }
}

impl Default for EvaluationContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn test_lookup_order() {
        let mut ctx = EvaluationContext::new();
        ctx.set_constant("x", Value::Number(Decimal::from(1))).unwrap();
        assert_eq!(ctx.scope_of("x"), Some(Scope::Constant));

        ctx.set_input("x", Value::Number(Decimal::from(2))).unwrap();
        assert_eq!(ctx.scope_of("x"), Some(Scope::Input));

        ctx.set_computed("x", Value::Number(Decimal::from(3))).unwrap();
        assert_eq!(ctx.scope_of("x"), Some(Scope::Computed));
        assert_eq!(ctx.get("x"), Some(&Value::Number(Decimal::from(3))));
    }

    #[test]
    fn test_lookup_trims_whitespace() {
        let mut ctx = EvaluationContext::new();
        ctx.set_input("income", Value::Number(Decimal::from(100))).unwrap();
        assert!(ctx.has(" income "));
    }

    #[test]
    fn test_empty_name_rejected() {
        let mut ctx = EvaluationContext::new();
        let err = ctx.set_computed("  ", Value::Null).unwrap_err();
        assert_eq!(err.code(), "EVAL_INVALID_NAME");
    }

    #[test]
    fn test_operation_id_is_generated() {
        let ctx = EvaluationContext::new();
        assert!(!ctx.operation_id.is_empty());
    }

    #[test]
    fn test_regex_cache_reuses_compilation() {
        let mut ctx = EvaluationContext::new();
        let loc = arbiter_dsl::SourceLocation::synthetic();
        assert!(ctx.compiled_regex(r"\d+", loc).is_ok());
        assert!(ctx.compiled_regex(r"\d+", loc).is_ok());
        assert!(ctx.compiled_regex(r"[", loc).is_err());
    }
}
