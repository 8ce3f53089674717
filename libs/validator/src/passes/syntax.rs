//! Syntax pass
//!
//! Maps assembly failures onto stable `SYNTAX_###` / `PARSE_###` issue codes
//! and turns assembler warnings (unknown fields, ignored entries) into
//! warning issues. An assembly failure is CRITICAL: without an AST none of
//! the later passes can run.

use crate::issue::{Issue, Severity};
use arbiter_dsl::error::{dsl_codes, lex_codes, parse_codes};
use arbiter_dsl::{Assembled, Error};

/// Translate an assembly failure into its critical issue.
pub fn issue_from_error(error: &Error) -> Issue {
    let code = match error.code() {
        c if c == dsl_codes::STRUCTURAL_YAML => "SYNTAX_001",
        c if c == dsl_codes::STRUCTURAL_TABS => "SYNTAX_002",
        c if c == dsl_codes::STRUCTURAL_QUOTES || c == dsl_codes::STRUCTURAL_BRACKETS => {
            "SYNTAX_003"
        }
        c if c == dsl_codes::MISSING_NAME => "SYNTAX_004",
        c if c == dsl_codes::INVALID_NAME => "SYNTAX_005",
        c if c == dsl_codes::WHEN_WITHOUT_THEN => "SYNTAX_006",
        c if c == dsl_codes::INVALID_FIELD => "SYNTAX_007",
        c if c == dsl_codes::INVALID_SHAPE => "SYNTAX_008",
        c if c == lex_codes::UNEXPECTED_CHAR
            || c == lex_codes::BAD_NUMBER
            || c == lex_codes::UNTERMINATED_STRING =>
        {
            "SYNTAX_009"
        }
        c if c == parse_codes::UNEXPECTED_TOKEN => "PARSE_001",
        c if c == parse_codes::MISSING_OPERAND => "PARSE_002",
        c if c == parse_codes::INVALID_EXPRESSION => "PARSE_003",
        c if c == parse_codes::BETWEEN_MISSING_AND => "PARSE_004",
        c if c == parse_codes::INVALID_ACTION => "PARSE_005",
        c if c == parse_codes::TOO_DEEP => "PARSE_006",
        _ => "SYNTAX_000",
    };

    let mut issue = Issue::new(code, Severity::Critical, error.to_string());
    if let Some(location) = error.location() {
        issue = issue.at(location);
    }
    if let Error::Parse { suggestions, .. } = error {
        for suggestion in suggestions {
            issue = issue.example(suggestion.clone());
        }
    }
    issue
}

/// Non-fatal syntax findings on a successfully assembled rule.
pub fn run(assembled: &Assembled) -> Vec<Issue> {
    assembled
        .warnings
        .iter()
        .map(|warning| {
            Issue::new(
                "SYNTAX_010",
                Severity::Warning,
                format!("{} (field '{}')", warning.message, warning.field),
            )
            .suggest("remove the field or check its spelling against the recognised set")
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structural_errors_map_to_syntax_codes() {
        let err = arbiter_dsl::assemble("name: X\n\tthen: []\n").unwrap_err();
        let issue = issue_from_error(&err);
        assert_eq!(issue.code, "SYNTAX_002");
        assert_eq!(issue.severity, Severity::Critical);
    }

    #[test]
    fn test_parse_errors_keep_parse_prefix() {
        let err =
            arbiter_dsl::assemble("name: X\nwhen: [\"age between 18\"]\nthen: [\"set a to 1\"]\n")
                .unwrap_err();
        let issue = issue_from_error(&err);
        assert_eq!(issue.code, "PARSE_004");
    }

    #[test]
    fn test_unknown_field_is_warning() {
        let assembled =
            arbiter_dsl::assemble("name: X\nthen: [\"set a to 1\"]\nmystery: 1\n").unwrap();
        let issues = run(&assembled);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].code, "SYNTAX_010");
        assert_eq!(issues[0].severity, Severity::Warning);
    }
}
