//! Arbiter CLI: validate, evaluate and inspect rule files.

use anyhow::{Context, Result};
use arbiter_dsl::ast::RuleShape;
use arbiter_engine::RulesEngine;
use arbiter_store::{Constant, MemoryConstantStore};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "arbiter", about = "Business rule DSL toolchain", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Validate a rule file and print the issue report with a quality score
    Validate {
        /// Path to the YAML rule file
        rule: PathBuf,
        /// Emit the report as JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Evaluate a rule file against input data and print the result
    Evaluate {
        /// Path to the YAML rule file
        rule: PathBuf,
        /// Path to a JSON object with the input data
        #[arg(long)]
        input: Option<PathBuf>,
        /// Path to a JSON object mapping constant codes to values
        #[arg(long)]
        constants: Option<PathBuf>,
    },
    /// Parse a rule file and print its canonical DSL rendering
    Parse {
        /// Path to the YAML rule file
        rule: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Validate { rule, json } => validate(&rule, json),
        Command::Evaluate {
            rule,
            input,
            constants,
        } => evaluate(&rule, input.as_deref(), constants.as_deref()).await,
        Command::Parse { rule } => parse(&rule),
    }
}

fn read_rule(path: &std::path::Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("reading rule file {}", path.display()))
}

fn validate(path: &std::path::Path, json: bool) -> Result<()> {
    let source = read_rule(path)?;
    let report = arbiter_validator::validate(&source);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("status: {:?}", report.status);
        println!("quality score: {}", report.quality_score);
        for issue in &report.issues {
            let location = issue
                .location
                .map(|l| format!(" at {l}"))
                .unwrap_or_default();
            println!(
                "  [{:?}] {}: {}{}",
                issue.severity, issue.code, issue.message, location
            );
            if let Some(suggestion) = &issue.suggestion {
                println!("      suggestion: {suggestion}");
            }
        }
    }

    if report.is_valid() {
        Ok(())
    } else {
        anyhow::bail!("rule failed validation");
    }
}

async fn evaluate(
    rule: &std::path::Path,
    input: Option<&std::path::Path>,
    constants: Option<&std::path::Path>,
) -> Result<()> {
    let source = read_rule(rule)?;

    let input_data = match input {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading input file {}", path.display()))?;
            let value: serde_json::Value =
                serde_json::from_str(&text).context("input file must contain a JSON object")?;
            value
                .as_object()
                .context("input file must contain a JSON object")?
                .clone()
        }
        None => serde_json::Map::new(),
    };

    let store = MemoryConstantStore::new();
    if let Some(path) = constants {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading constants file {}", path.display()))?;
        let value: serde_json::Value =
            serde_json::from_str(&text).context("constants file must contain a JSON object")?;
        let object = value
            .as_object()
            .context("constants file must contain a JSON object")?;
        for (code, value) in object {
            store.put(Constant::new(code.clone(), value.clone()));
        }
    }

    let engine = RulesEngine::new(Arc::new(store));
    let result = engine.evaluate(&source, &input_data).await;
    println!("{}", serde_json::to_string_pretty(&result)?);

    if result.success {
        Ok(())
    } else {
        anyhow::bail!("evaluation failed");
    }
}

fn parse(path: &std::path::Path) -> Result<()> {
    let source = read_rule(path)?;
    let assembled = arbiter_dsl::assemble(&source).context("rule failed to assemble")?;

    println!("name: {}", assembled.rule.name);
    if !assembled.rule.inputs.is_empty() {
        println!("inputs: {}", assembled.rule.inputs.join(", "));
    }
    print_shape(&assembled.rule.shape, 0);

    for warning in &assembled.warnings {
        eprintln!("warning: {}", warning.message);
    }
    Ok(())
}

fn print_shape(shape: &RuleShape, indent: usize) {
    let pad = "  ".repeat(indent);
    match shape {
        RuleShape::Simple {
            when,
            then,
            else_actions,
        } => {
            for condition in when {
                println!("{pad}when: {}", condition.to_dsl_string());
            }
            for action in then {
                println!("{pad}then: {}", action.to_dsl_string());
            }
            for action in else_actions {
                println!("{pad}else: {}", action.to_dsl_string());
            }
        }
        RuleShape::Sequence { rules } => {
            for rule in rules {
                println!("{pad}rule: {}", rule.name);
                print_shape(&rule.shape, indent + 1);
            }
        }
        RuleShape::Conditional(block) => {
            println!("{pad}if: {}", block.condition.to_dsl_string());
            for action in &block.then_block.actions {
                println!("{pad}then: {}", action.to_dsl_string());
            }
            if let Some(nested) = &block.then_block.nested {
                println!("{pad}nested:");
                print_shape(&RuleShape::Conditional((**nested).clone()), indent + 1);
            }
            if let Some(else_block) = &block.else_block {
                for action in &else_block.actions {
                    println!("{pad}else: {}", action.to_dsl_string());
                }
                if let Some(nested) = &else_block.nested {
                    println!("{pad}else nested:");
                    print_shape(&RuleShape::Conditional((**nested).clone()), indent + 1);
                }
            }
        }
    }
}
