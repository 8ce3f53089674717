//! Rules engine orchestrator
//!
//! Drives one evaluation end to end: AST resolution (with cache), constant
//! loading, shape dispatch, and output assembly. A single evaluation is
//! synchronous within its logic; the async entrypoint exists so callers can
//! compose many evaluations in parallel, each owning its own context.

use crate::constants;
use crate::context::EvaluationContext;
use crate::error::{Error, Result};
use crate::evaluator::Evaluator;
use crate::executor::{Executor, Flow, DEFAULT_LOOP_LIMIT};
use crate::json_path::{JsonPathResolver, SimpleJsonPath};
use crate::numeric::DEFAULT_SCALE;
use crate::rest::{DisabledRestClient, RestClient};
use crate::result::EvaluationResult;
use crate::value::Value;
use arbiter_dsl::ast::{ConditionalBlock, RuleShape, RulesDSL};
use arbiter_store::{keys, ConstantStore, SharedCache};
use serde_json::Map;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tracing::{debug, info_span, warn, Instrument};

/// Per-engine evaluation options
#[derive(Debug, Clone)]
pub struct EvalOptions {
    /// Decimal places for multiplication/division rounding (HALF_UP)
    pub scale: u32,
    /// Hard cap on loop iterations
    pub max_loop_iterations: usize,
    /// Optional wall-clock budget for one evaluation
    pub deadline: Option<Duration>,
}

impl Default for EvalOptions {
    fn default() -> Self {
        Self {
            scale: DEFAULT_SCALE,
            max_loop_iterations: DEFAULT_LOOP_LIMIT,
            deadline: None,
        }
    }
}

/// Evaluation lifecycle phases, traced per operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Parsing,
    ConstantsLoading,
    Evaluating,
    CircuitBroken,
    Completing,
}

/// The rules engine
pub struct RulesEngine {
    store: Arc<dyn ConstantStore>,
    ast_cache: Option<Arc<SharedCache<RulesDSL>>>,
    rest: Arc<dyn RestClient>,
    json: Arc<dyn JsonPathResolver>,
    options: EvalOptions,
}

impl RulesEngine {
    pub fn new(store: Arc<dyn ConstantStore>) -> Self {
        Self {
            store,
            ast_cache: None,
            rest: Arc::new(DisabledRestClient),
            json: Arc::new(SimpleJsonPath),
            options: EvalOptions::default(),
        }
    }

    /// Share an AST cache across engines/evaluations.
    pub fn with_ast_cache(mut self, cache: Arc<SharedCache<RulesDSL>>) -> Self {
        self.ast_cache = Some(cache);
        self
    }

    pub fn with_rest_client(mut self, rest: Arc<dyn RestClient>) -> Self {
        self.rest = rest;
        self
    }

    pub fn with_json_resolver(mut self, json: Arc<dyn JsonPathResolver>) -> Self {
        self.json = json;
        self
    }

    pub fn with_options(mut self, options: EvalOptions) -> Self {
        self.options = options;
        self
    }

    /// Resolve a source to its AST, parsing on cache miss.
    pub fn resolve_ast(&self, source: &str) -> Result<Arc<RulesDSL>> {
        let key = keys::ast_key(source);
        if let Some(cache) = &self.ast_cache {
            if let Some(ast) = cache.get(&key) {
                debug!(key = %key, "AST cache hit");
                return Ok(ast);
            }
        }

        let assembled = arbiter_dsl::assemble(source)?;
        for warning in &assembled.warnings {
            warn!(field = %warning.field, "{}", warning.message);
        }
        let ast = Arc::new(assembled.rule);
        if let Some(cache) = &self.ast_cache {
            cache.put(key, ast.clone());
        }
        Ok(ast)
    }

    /// Evaluate a YAML rule source against the caller's input data.
    ///
    /// The input map is copied, never mutated.
    pub async fn evaluate(
        &self,
        source: &str,
        input_data: &Map<String, serde_json::Value>,
    ) -> EvaluationResult {
        let started = Instant::now();
        let mut ctx = EvaluationContext::new();
        ctx.deadline = self.options.deadline.map(|d| started + d);
        let operation_id = ctx.operation_id.clone();

        let span = info_span!("evaluate", operation_id = %operation_id);
        async {
            debug!(phase = ?Phase::Parsing, "resolving AST");
            let ast = match self.resolve_ast(source) {
                Ok(ast) => ast,
                Err(e) => {
                    return EvaluationResult::failure(
                        operation_id,
                        elapsed_ms(started),
                        render_error(&e),
                    )
                }
            };

            self.evaluate_ast(&ast, input_data, &mut ctx, started).await
        }
        .instrument(span)
        .await
    }

    /// Evaluate an already-parsed rule document.
    pub async fn evaluate_parsed(
        &self,
        ast: &RulesDSL,
        input_data: &Map<String, serde_json::Value>,
    ) -> EvaluationResult {
        let started = Instant::now();
        let mut ctx = EvaluationContext::new();
        ctx.deadline = self.options.deadline.map(|d| started + d);
        self.evaluate_ast(ast, input_data, &mut ctx, started).await
    }

    async fn evaluate_ast(
        &self,
        ast: &RulesDSL,
        input_data: &Map<String, serde_json::Value>,
        ctx: &mut EvaluationContext,
        started: Instant,
    ) -> EvaluationResult {
        let operation_id = ctx.operation_id.clone();

        for (name, value) in input_data {
            if let Err(e) = ctx.set_input(name, Value::from_json(value)) {
                return EvaluationResult::failure(
                    operation_id,
                    elapsed_ms(started),
                    render_error(&e),
                );
            }
        }

        debug!(phase = ?Phase::ConstantsLoading, "loading system constants");
        if let Err(e) = self.load_constants(ast, ctx).await {
            return EvaluationResult::failure(operation_id, elapsed_ms(started), render_error(&e));
        }

        debug!(phase = ?Phase::Evaluating, "dispatching rule shape");
        let condition_result = match self.run_shape(&ast.shape, ctx) {
            Ok(result) => result,
            Err(e) => {
                return EvaluationResult::failure(
                    operation_id,
                    elapsed_ms(started),
                    render_error(&e),
                )
            }
        };

        // Document-level kill switch: an enabled circuit_breaker block trips
        // on a true condition result
        if let Some(spec) = &ast.circuit_breaker {
            if spec.enabled && condition_result && !ctx.circuit_breaker_triggered {
                let message = spec
                    .message
                    .clone()
                    .unwrap_or_else(|| "circuit breaker".to_string());
                ctx.trigger_circuit_breaker(message);
            }
        }

        if ctx.circuit_breaker_triggered {
            debug!(phase = ?Phase::CircuitBroken, "circuit breaker is set");
        }

        debug!(phase = ?Phase::Completing, "assembling output");
        let mut output_data = Map::new();
        for (name, value) in ctx.computed_variables() {
            output_data.insert(name.clone(), value.to_json());
        }
        for name in ast.output.keys() {
            if !output_data.contains_key(name) {
                debug!(output = %name, "declared output was never assigned; omitted");
            }
        }
        output_data.insert(
            "conditionResult".to_string(),
            serde_json::Value::Bool(condition_result),
        );

        EvaluationResult {
            success: true,
            condition_result,
            output_data,
            execution_time_ms: elapsed_ms(started),
            circuit_breaker_triggered: ctx.circuit_breaker_triggered,
            circuit_breaker_message: ctx.circuit_breaker_message.clone(),
            error: None,
            operation_id,
        }
    }

    /// Evaluate many independent jobs with bounded concurrency. Each job
    /// owns its own context; parallelism never crosses one evaluation.
    pub async fn evaluate_batch(
        &self,
        jobs: Vec<(String, Map<String, serde_json::Value>)>,
        max_concurrency: usize,
    ) -> Vec<EvaluationResult> {
        let semaphore = Arc::new(Semaphore::new(max_concurrency.max(1)));
        let futures = jobs.iter().map(|(source, input)| {
            let semaphore = semaphore.clone();
            async move {
                let _permit = semaphore
                    .acquire()
                    .await
                    .expect("batch semaphore never closes");
                self.evaluate(source, input).await
            }
        });
        futures::future::join_all(futures).await
    }

    async fn load_constants(&self, ast: &RulesDSL, ctx: &mut EvaluationContext) -> Result<()> {
        let codes: Vec<String> = constants::collect_constant_codes(ast).into_iter().collect();
        if codes.is_empty() {
            return Ok(());
        }

        let fetched = self
            .store
            .get_constants_by_codes(&codes)
            .await
            .map_err(|e| Error::StoreUnavailable(e.to_string()))?;

        let mut missing = Vec::new();
        for code in &codes {
            if let Some(constant) = fetched.iter().find(|c| &c.code == code) {
                ctx.set_constant(code, Value::from_json(&constant.current_value))?;
            } else if let Some(default) = ast.constant_default(code) {
                debug!(code = %code, "constant missing from store; using declared default");
                ctx.set_constant(code, Value::from_json(default))?;
            } else {
                missing.push(code.clone());
            }
        }

        if !missing.is_empty() {
            return Err(Error::MissingConstants { names: missing });
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Shape dispatch
    // ------------------------------------------------------------------

    fn run_shape(&self, shape: &RuleShape, ctx: &mut EvaluationContext) -> Result<bool> {
        match shape {
            RuleShape::Simple {
                when,
                then,
                else_actions,
            } => {
                // `then` without `when` is unconditional
                let condition_result = if when.is_empty() {
                    true
                } else {
                    let mut evaluator =
                        Evaluator::new(ctx, self.options.scale, &*self.rest, &*self.json);
                    let mut all = true;
                    for condition in when {
                        if !evaluator.evaluate_condition_guarded(condition)? {
                            all = false;
                            break;
                        }
                    }
                    all
                };

                let branch = if condition_result { then } else { else_actions };
                self.run_actions(branch, ctx)?;
                Ok(condition_result)
            }
            RuleShape::Sequence { rules } => {
                let mut any = false;
                for rule in rules {
                    if ctx.deadline_exceeded() {
                        return Err(Error::Timeout);
                    }
                    debug!(sub_rule = %rule.name, "running sub-rule");
                    any |= self.run_shape(&rule.shape, ctx)?;
                    if ctx.circuit_breaker_triggered {
                        break;
                    }
                }
                Ok(any)
            }
            RuleShape::Conditional(block) => self.run_conditional(block, ctx),
        }
    }

    fn run_conditional(&self, block: &ConditionalBlock, ctx: &mut EvaluationContext) -> Result<bool> {
        let matched = {
            let mut evaluator =
                Evaluator::new(ctx, self.options.scale, &*self.rest, &*self.json);
            evaluator.evaluate_condition_guarded(&block.condition)?
        };

        let active = if matched {
            Some(&block.then_block)
        } else {
            block.else_block.as_ref()
        };

        if let Some(active) = active {
            if self.run_actions(&active.actions, ctx)? == Flow::Broken {
                return Ok(matched);
            }
            if let Some(nested) = &active.nested {
                self.run_conditional(nested, ctx)?;
            }
        }
        Ok(matched)
    }

    fn run_actions(
        &self,
        actions: &[arbiter_dsl::ast::Action],
        ctx: &mut EvaluationContext,
    ) -> Result<Flow> {
        if actions.is_empty() {
            return Ok(Flow::Continue);
        }
        let mut executor = Executor::new(
            ctx,
            self.options.scale,
            self.options.max_loop_iterations,
            &*self.rest,
            &*self.json,
        );
        executor.execute_block(actions)
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis() as u64
}

fn render_error(error: &Error) -> String {
    match error {
        Error::Timeout => "timeout".to_string(),
        other => format!("{}: {}", other.code(), other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arbiter_store::MemoryConstantStore;

    fn input(pairs: serde_json::Value) -> Map<String, serde_json::Value> {
        pairs.as_object().unwrap().clone()
    }

    fn engine() -> RulesEngine {
        RulesEngine::new(Arc::new(MemoryConstantStore::new()))
    }

    #[tokio::test]
    async fn test_unconditional_then() {
        let result = engine()
            .evaluate(
                "name: X\nthen: [\"set a to 1\"]\n",
                &input(serde_json::json!({})),
            )
            .await;
        assert!(result.success);
        assert!(result.condition_result);
        assert_eq!(result.output_data["a"], serde_json::json!(1));
    }

    #[tokio::test]
    async fn test_parse_failure_reports_code() {
        let result = engine()
            .evaluate("name: X\nwhen: [\"a >\"]\nthen: [\"set b to 1\"]\n", &Map::new())
            .await;
        assert!(!result.success);
        assert!(result.error.unwrap().contains("PARSE_"));
    }

    #[tokio::test]
    async fn test_ast_cache_shares_parse() {
        let cache = Arc::new(SharedCache::new());
        let engine = engine().with_ast_cache(cache.clone());
        let source = "name: X\nthen: [\"set a to 1\"]\n";
        engine.evaluate(source, &Map::new()).await;
        assert_eq!(cache.len(), 1);
        // Second run hits the cache (observable via unchanged len)
        engine.evaluate(source, &Map::new()).await;
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_deadline_timeout() {
        let engine = engine().with_options(EvalOptions {
            deadline: Some(Duration::from_millis(0)),
            ..EvalOptions::default()
        });
        let result = engine
            .evaluate(
                "name: X\nthen: [\"set a to 1\", \"set b to 2\"]\n",
                &Map::new(),
            )
            .await;
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("timeout"));
    }

    #[tokio::test]
    async fn test_batch_bounded_concurrency() {
        let engine = engine();
        let jobs: Vec<_> = (0..8)
            .map(|i| {
                (
                    format!("name: X{i}\nthen: [\"set n to {i}\"]\n"),
                    Map::new(),
                )
            })
            .collect();
        let results = engine.evaluate_batch(jobs, 2).await;
        assert_eq!(results.len(), 8);
        assert!(results.iter().all(|r| r.success));
        assert_eq!(results[3].output_data["n"], serde_json::json!(3));
    }
}
