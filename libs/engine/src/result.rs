//! Evaluation result object

use serde::Serialize;
use serde_json::Map;

/// Outcome of one rule evaluation
#[derive(Debug, Clone, Serialize)]
pub struct EvaluationResult {
    pub success: bool,

    #[serde(rename = "conditionResult")]
    pub condition_result: bool,

    /// All computed variables plus `conditionResult`
    #[serde(rename = "outputData")]
    pub output_data: Map<String, serde_json::Value>,

    #[serde(rename = "executionTimeMs")]
    pub execution_time_ms: u64,

    #[serde(
        rename = "circuitBreakerTriggered",
        skip_serializing_if = "std::ops::Not::not"
    )]
    pub circuit_breaker_triggered: bool,

    #[serde(
        rename = "circuitBreakerMessage",
        skip_serializing_if = "Option::is_none"
    )]
    pub circuit_breaker_message: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(rename = "operationId")]
    pub operation_id: String,
}

impl EvaluationResult {
    /// A failed evaluation with no outputs.
    pub fn failure(operation_id: String, execution_time_ms: u64, error: String) -> Self {
        Self {
            success: false,
            condition_result: false,
            output_data: Map::new(),
            execution_time_ms,
            circuit_breaker_triggered: false,
            circuit_breaker_message: None,
            error: Some(error),
            operation_id,
        }
    }
}
