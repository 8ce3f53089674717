//! Error types for the rule DSL toolchain
//!
//! Every authoring failure carries a stable string code so callers can map
//! errors without matching on messages. Lexer errors additionally carry a
//! rendered source excerpt; parser errors carry a suggestions list.

use crate::location::SourceLocation;
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Authoring errors produced by the lexer, the parsers, and the assembler
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("{code}: {message} at {location}")]
    Lex {
        code: &'static str,
        message: String,
        location: SourceLocation,
        excerpt: String,
    },

    #[error("{code}: {message} at {location}")]
    Parse {
        code: &'static str,
        message: String,
        location: SourceLocation,
        suggestions: Vec<String>,
    },

    #[error("{code}: {message}")]
    Structural { code: &'static str, message: String },
}

impl Error {
    pub fn lex(
        code: &'static str,
        message: impl Into<String>,
        location: SourceLocation,
        source: &str,
    ) -> Self {
        Error::Lex {
            code,
            message: message.into(),
            location,
            excerpt: location.excerpt(source),
        }
    }

    pub fn parse(code: &'static str, message: impl Into<String>, location: SourceLocation) -> Self {
        Error::Parse {
            code,
            message: message.into(),
            location,
            suggestions: Vec::new(),
        }
    }

    pub fn parse_with_suggestions(
        code: &'static str,
        message: impl Into<String>,
        location: SourceLocation,
        suggestions: Vec<String>,
    ) -> Self {
        Error::Parse {
            code,
            message: message.into(),
            location,
            suggestions,
        }
    }

    pub fn structural(code: &'static str, message: impl Into<String>) -> Self {
        Error::Structural {
            code,
            message: message.into(),
        }
    }

    /// The stable error code for this failure.
    pub fn code(&self) -> &'static str {
        match self {
            Error::Lex { code, .. } => code,
            Error::Parse { code, .. } => code,
            Error::Structural { code, .. } => code,
        }
    }

    /// The source location, when the failure points at one.
    pub fn location(&self) -> Option<SourceLocation> {
        match self {
            Error::Lex { location, .. } | Error::Parse { location, .. } => Some(*location),
            Error::Structural { .. } => None,
        }
    }
}

/// Stable lexer error codes
pub mod lex_codes {
    pub const UNEXPECTED_CHAR: &str = "LEX_UNEXPECTED_CHAR";
    pub const BAD_NUMBER: &str = "LEX_BAD_NUMBER";
    pub const UNTERMINATED_STRING: &str = "LEX_UNTERMINATED_STRING";
}

/// Stable parser error codes
pub mod parse_codes {
    pub const UNEXPECTED_TOKEN: &str = "PARSE_UNEXPECTED_TOKEN";
    pub const MISSING_OPERAND: &str = "PARSE_MISSING_OPERAND";
    pub const INVALID_EXPRESSION: &str = "PARSE_INVALID_EXPRESSION";
    pub const BETWEEN_MISSING_AND: &str = "PARSE_BETWEEN_MISSING_AND";
    pub const INVALID_ACTION: &str = "PARSE_INVALID_ACTION";
    pub const TOO_DEEP: &str = "PARSE_TOO_DEEP";
}

/// Stable assembler error codes
pub mod dsl_codes {
    pub const STRUCTURAL_TABS: &str = "DSL_STRUCTURAL_TABS";
    pub const STRUCTURAL_QUOTES: &str = "DSL_STRUCTURAL_QUOTES";
    pub const STRUCTURAL_BRACKETS: &str = "DSL_STRUCTURAL_BRACKETS";
    pub const STRUCTURAL_YAML: &str = "DSL_STRUCTURAL_YAML";
    pub const MISSING_NAME: &str = "DSL_MISSING_NAME";
    pub const INVALID_NAME: &str = "DSL_INVALID_NAME";
    pub const WHEN_WITHOUT_THEN: &str = "DSL_WHEN_WITHOUT_THEN";
    pub const INVALID_FIELD: &str = "DSL_INVALID_FIELD";
    pub const INVALID_SHAPE: &str = "DSL_INVALID_SHAPE";
}
