//! Static rule validation
//!
//! Six independent passes walk an assembled rule and emit [`Issue`]s with
//! stable codes; the pipeline rolls them into a [`ValidationReport`] with an
//! overall status and a quality score:
//!
//! | pass | codes | looks for |
//! |------|-------|-----------|
//! | syntax | `SYNTAX_*`, `PARSE_*` | malformed YAML, unknown fields, bad DSL strings |
//! | naming | `NAMING_*` | case conventions, reserved words, constant shadowing |
//! | dependencies | `DEP_*` | undefined reads, unused inputs, unknown functions |
//! | logic | `LOGIC_*` | tautologies, contradictions, unassigned outputs |
//! | performance | `PERF_*` | oversized rules, short-circuit-hostile ordering |
//! | best practices | `BP_*` | missing metadata, magic numbers |

pub mod issue;
pub mod passes;
pub mod pipeline;

pub use issue::{Issue, Severity, ValidationReport, ValidationStatus};
pub use pipeline::validate;
