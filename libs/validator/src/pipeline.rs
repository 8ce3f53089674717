//! Validation pipeline
//!
//! Runs the passes in order and rolls their issues into one report. A
//! critical syntax failure aborts the pipeline; every other pass always
//! runs so authors see all findings at once.

use crate::issue::ValidationReport;
use crate::passes;
use tracing::debug;

/// Validate a YAML rule source.
pub fn validate(source: &str) -> ValidationReport {
    let assembled = match arbiter_dsl::assemble(source) {
        Ok(assembled) => assembled,
        Err(error) => {
            debug!(code = error.code(), "assembly failed; aborting pipeline");
            return ValidationReport::from_issues(vec![passes::syntax::issue_from_error(&error)]);
        }
    };

    let mut issues = Vec::new();
    issues.extend(passes::syntax::run(&assembled));
    issues.extend(passes::naming::run(&assembled.rule));
    issues.extend(passes::dependencies::run(&assembled.rule));
    issues.extend(passes::logic::run(&assembled.rule));
    issues.extend(passes::performance::run(&assembled.rule));
    issues.extend(passes::best_practices::run(&assembled.rule));

    ValidationReport::from_issues(issues)
}
