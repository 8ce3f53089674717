//! The six validation passes

pub mod best_practices;
pub mod dependencies;
pub mod logic;
pub mod naming;
pub mod performance;
pub mod syntax;
