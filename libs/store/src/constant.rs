//! Constant and rule definition stores
//!
//! Trait-based interface so the engine never depends on a concrete
//! persistence layer. The in-memory implementations back the CLI and tests.

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;

/// A system constant as stored
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Constant {
    pub code: String,
    #[serde(rename = "currentValue")]
    pub current_value: serde_json::Value,
    #[serde(rename = "valueType")]
    pub value_type: String,
    #[serde(rename = "defaultValue", skip_serializing_if = "Option::is_none")]
    pub default_value: Option<serde_json::Value>,
}

impl Constant {
    pub fn new(code: impl Into<String>, value: serde_json::Value) -> Self {
        let value_type = match &value {
            serde_json::Value::Number(_) => "number",
            serde_json::Value::String(_) => "text",
            serde_json::Value::Bool(_) => "boolean",
            serde_json::Value::Array(_) => "list",
            serde_json::Value::Object(_) => "object",
            serde_json::Value::Null => "null",
        }
        .to_string();
        Self {
            code: code.into(),
            current_value: value,
            value_type,
            default_value: None,
        }
    }
}

/// A stored rule definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleDefinition {
    pub code: String,
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Read access to system constants
#[async_trait]
pub trait ConstantStore: Send + Sync {
    /// Fetch one constant by code.
    async fn get_constant_by_code(&self, code: &str) -> Result<Option<Constant>>;

    /// Fetch a batch of constants; missing codes are simply absent from the
    /// returned list.
    async fn get_constants_by_codes(&self, codes: &[String]) -> Result<Vec<Constant>>;
}

/// Read access to stored rule definitions
#[async_trait]
pub trait RuleStore: Send + Sync {
    async fn get_rule_definition_by_code(&self, code: &str) -> Result<Option<RuleDefinition>>;
}

/// In-memory constant store
#[derive(Debug, Default)]
pub struct MemoryConstantStore {
    constants: RwLock<HashMap<String, Constant>>,
}

impl MemoryConstantStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a constant.
    pub fn put(&self, constant: Constant) {
        self.constants
            .write()
            .expect("constant store lock poisoned")
            .insert(constant.code.clone(), constant);
    }

    /// Convenience setter from a code/value pair.
    pub fn put_value(&self, code: impl Into<String>, value: serde_json::Value) {
        self.put(Constant::new(code, value));
    }
}

#[async_trait]
impl ConstantStore for MemoryConstantStore {
    async fn get_constant_by_code(&self, code: &str) -> Result<Option<Constant>> {
        Ok(self
            .constants
            .read()
            .expect("constant store lock poisoned")
            .get(code)
            .cloned())
    }

    async fn get_constants_by_codes(&self, codes: &[String]) -> Result<Vec<Constant>> {
        let constants = self
            .constants
            .read()
            .expect("constant store lock poisoned");
        Ok(codes
            .iter()
            .filter_map(|code| constants.get(code).cloned())
            .collect())
    }
}

/// In-memory rule definition store
#[derive(Debug, Default)]
pub struct MemoryRuleStore {
    rules: RwLock<HashMap<String, RuleDefinition>>,
}

impl MemoryRuleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&self, rule: RuleDefinition) {
        self.rules
            .write()
            .expect("rule store lock poisoned")
            .insert(rule.code.clone(), rule);
    }
}

#[async_trait]
impl RuleStore for MemoryRuleStore {
    async fn get_rule_definition_by_code(&self, code: &str) -> Result<Option<RuleDefinition>> {
        Ok(self
            .rules
            .read()
            .expect("rule store lock poisoned")
            .get(code)
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_constant_store() {
        let store = MemoryConstantStore::new();
        store.put_value("MIN_AGE", serde_json::json!(18));
        store.put_value("MAX_DTI", serde_json::json!(0.43));

        let constant = store.get_constant_by_code("MIN_AGE").await.unwrap().unwrap();
        assert_eq!(constant.current_value, serde_json::json!(18));
        assert_eq!(constant.value_type, "number");

        let batch = store
            .get_constants_by_codes(&["MIN_AGE".into(), "MISSING".into()])
            .await
            .unwrap();
        assert_eq!(batch.len(), 1);
    }

    #[tokio::test]
    async fn test_memory_rule_store() {
        let store = MemoryRuleStore::new();
        store.put(RuleDefinition {
            code: "approval".into(),
            source: "name: X\nthen: [\"set a to 1\"]".into(),
            description: None,
        });
        assert!(store
            .get_rule_definition_by_code("approval")
            .await
            .unwrap()
            .is_some());
        assert!(store
            .get_rule_definition_by_code("missing")
            .await
            .unwrap()
            .is_none());
    }
}
