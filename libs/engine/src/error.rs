//! Evaluation error types
//!
//! Recoverable faults default the offending condition/action and let the
//! surrounding logic continue; fatal faults stop the evaluation and populate
//! the result's `error` field. The distinction lives on [`Error::is_recoverable`].

use arbiter_dsl::SourceLocation;
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Evaluation faults
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("authoring error: {0}")]
    Dsl(#[from] arbiter_dsl::Error),

    #[error("division by zero at {location}")]
    DivisionByZero { location: SourceLocation },

    #[error("invalid regex '{pattern}': {reason}")]
    BadRegex {
        pattern: String,
        reason: String,
        location: SourceLocation,
    },

    #[error("unknown function '{name}' at {location}")]
    UnknownFunction {
        name: String,
        location: SourceLocation,
    },

    #[error("function '{name}' expects {expected} arguments, got {actual}")]
    BadArity {
        name: String,
        expected: String,
        actual: usize,
    },

    #[error("type mismatch: {message}")]
    TypeMismatch {
        message: String,
        location: SourceLocation,
    },

    #[error("target variable '{name}' is not defined at {location}")]
    UndefinedTarget {
        name: String,
        location: SourceLocation,
    },

    #[error("missing system constants: {}", names.join(", "))]
    MissingConstants { names: Vec<String> },

    #[error("loop exceeded {limit} iterations at {location}")]
    LoopLimit {
        limit: usize,
        location: SourceLocation,
    },

    #[error("invalid variable name: {0}")]
    InvalidName(String),

    #[error("constant store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("evaluation deadline exceeded")]
    Timeout,
}

impl Error {
    /// The stable error code for this fault.
    pub fn code(&self) -> &'static str {
        match self {
            Error::Dsl(inner) => inner.code(),
            Error::DivisionByZero { .. } => "EVAL_DIV_BY_ZERO",
            Error::BadRegex { .. } => "EVAL_BAD_REGEX",
            Error::UnknownFunction { .. } => "EVAL_UNKNOWN_FUNCTION",
            Error::BadArity { .. } => "EVAL_BAD_ARITY",
            Error::TypeMismatch { .. } => "EVAL_TYPE_MISMATCH",
            Error::UndefinedTarget { .. } => "EVAL_UNDEFINED_TARGET",
            Error::MissingConstants { .. } => "EVAL_MISSING_CONSTANT",
            Error::LoopLimit { .. } => "EVAL_LOOP_LIMIT",
            Error::InvalidName(_) => "EVAL_INVALID_NAME",
            Error::StoreUnavailable(_) => "EVAL_STORE_UNAVAILABLE",
            Error::Timeout => "EVAL_TIMEOUT",
        }
    }

    /// Recoverable faults log and default the offending sub-expression;
    /// fatal faults stop the evaluation.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::DivisionByZero { .. }
                | Error::BadRegex { .. }
                | Error::UnknownFunction { .. }
                | Error::BadArity { .. }
                | Error::TypeMismatch { .. }
                | Error::UndefinedTarget { .. }
        )
    }
}
