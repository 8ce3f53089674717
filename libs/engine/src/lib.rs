//! Rule evaluation engine
//!
//! Evaluates assembled rule documents against caller-supplied input data:
//!
//! ```text
//! YAML source --> AST (arbiter-dsl, cached by source hash)
//!      |
//! constant auto-discovery --> store fetch
//!      |
//! Evaluator / Executor walk the AST over a three-scope context
//!      |
//! EvaluationResult { outputs, conditionResult, timing }
//! ```
//!
//! Evaluations are independent: each owns its context, and parallelism lives
//! strictly between evaluations (see [`RulesEngine::evaluate_batch`]).

pub mod checks;
pub mod constants;
pub mod context;
pub mod engine;
pub mod error;
pub mod evaluator;
pub mod executor;
pub mod functions;
pub mod json_path;
pub mod numeric;
pub mod rest;
pub mod result;
pub mod value;

pub use context::{EvaluationContext, Scope};
pub use engine::{EvalOptions, RulesEngine};
pub use error::{Error, Result};
pub use evaluator::Evaluator;
pub use executor::{Executor, Flow};
pub use json_path::{JsonPathResolver, SimpleJsonPath};
pub use rest::{DisabledRestClient, RestClient, RestRequest};
pub use result::EvaluationResult;
pub use value::Value;
