//! Store error types

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Failures surfaced by store implementations
#[derive(Error, Debug, Clone)]
pub enum Error {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("invalid stored value for '{code}': {reason}")]
    InvalidValue { code: String, reason: String },
}
