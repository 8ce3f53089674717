//! Top-level assembled rule document

use super::action::Action;
use super::condition::Condition;
use std::collections::BTreeMap;

/// Declared output value types
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputType {
    Text,
    Number,
    Boolean,
    List,
    Object,
}

impl OutputType {
    pub fn from_str_opt(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "text" | "string" => Some(OutputType::Text),
            "number" => Some(OutputType::Number),
            "boolean" | "bool" => Some(OutputType::Boolean),
            "list" | "array" => Some(OutputType::List),
            "object" | "map" => Some(OutputType::Object),
            _ => None,
        }
    }
}

/// A declared system constant with an optional default
#[derive(Debug, Clone, PartialEq)]
pub struct ConstantDecl {
    pub code: String,
    pub default_value: Option<serde_json::Value>,
}

/// Document-level circuit breaker configuration
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CircuitBreakerSpec {
    pub enabled: bool,
    pub message: Option<String>,
}

/// One action block of a `conditions` tree, with an optional nested block
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ActionBlock {
    pub actions: Vec<Action>,
    pub nested: Option<Box<ConditionalBlock>>,
}

/// A structured `if`/`then`/`else` block
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionalBlock {
    pub condition: Condition,
    pub then_block: ActionBlock,
    pub else_block: Option<ActionBlock>,
}

/// The three recognised top-level shapes
#[derive(Debug, Clone, PartialEq)]
pub enum RuleShape {
    /// `when` / `then` / `else` lists of DSL strings
    Simple {
        when: Vec<Condition>,
        then: Vec<Action>,
        else_actions: Vec<Action>,
    },

    /// Ordered sub-rules sharing one evaluation context
    Sequence { rules: Vec<SubRule> },

    /// Nested structured `conditions` tree
    Conditional(ConditionalBlock),
}

/// A named sub-rule inside a `rules` sequence
#[derive(Debug, Clone, PartialEq)]
pub struct SubRule {
    pub name: String,
    pub shape: RuleShape,
}

/// A fully assembled rule document
#[derive(Debug, Clone, PartialEq)]
pub struct RulesDSL {
    pub name: String,
    pub description: Option<String>,
    pub version: Option<String>,
    pub inputs: Vec<String>,
    pub constants: Vec<ConstantDecl>,
    pub output: BTreeMap<String, OutputType>,
    pub circuit_breaker: Option<CircuitBreakerSpec>,
    pub shape: RuleShape,
}

impl RulesDSL {
    /// All declared constant codes.
    pub fn declared_constant_codes(&self) -> impl Iterator<Item = &str> {
        self.constants.iter().map(|c| c.code.as_str())
    }

    /// Declared default for a constant code, if any.
    pub fn constant_default(&self, code: &str) -> Option<&serde_json::Value> {
        self.constants
            .iter()
            .find(|c| c.code == code)
            .and_then(|c| c.default_value.as_ref())
    }
}
