//! Store and cache boundaries for the rule engine
//!
//! Persistence of rule definitions and system constants is an external
//! concern; this crate defines the narrow trait interfaces the engine talks
//! to, plus in-memory implementations used by the CLI and by tests.

pub mod cache;
pub mod constant;
pub mod error;

pub use cache::{keys, SharedCache};
pub use constant::{
    Constant, ConstantStore, MemoryConstantStore, MemoryRuleStore, RuleDefinition, RuleStore,
};
pub use error::{Error, Result};
