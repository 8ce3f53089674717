//! System constant auto-discovery
//!
//! Walks every expression reachable from a rule document (loop bodies,
//! nested conditionals, REST URL/body/headers, JSON-path sources included)
//! and collects variable names shaped like `UPPER_SNAKE` constants. Quoted
//! strings never register: only `Variable` nodes are inspected.

use arbiter_dsl::ast::{walk, RulesDSL};
use std::collections::BTreeSet;

/// Whether a name matches the constant shape `^[A-Z][A-Z0-9_]*$`.
pub fn is_constant_name(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    first.is_ascii_uppercase()
        && chars.all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
}

/// Collect every constant referenced by the rule: auto-discovered names
/// unioned with explicitly declared codes.
pub fn collect_constant_codes(rule: &RulesDSL) -> BTreeSet<String> {
    let mut codes = BTreeSet::new();
    walk::visit_variables(rule, &mut |name| {
        if is_constant_name(name) {
            codes.insert(name.to_string());
        }
    });
    for code in rule.declared_constant_codes() {
        codes.insert(code.to_string());
    }
    codes
}

#[cfg(test)]
mod tests {
    use super::*;
    use arbiter_dsl::assemble;

    #[test]
    fn test_constant_name_shape() {
        assert!(is_constant_name("MIN_AGE"));
        assert!(is_constant_name("MAX_LOAN_2024"));
        assert!(is_constant_name("X"));
        assert!(!is_constant_name("minAge"));
        assert!(!is_constant_name("Min_Age"));
        assert!(!is_constant_name("_PRIVATE"));
        assert!(!is_constant_name(""));
    }

    #[test]
    fn test_discovery_spans_all_shapes() {
        let assembled = assemble(
            r#"
name: Discovery
inputs: [age, items]
when:
  - "age between MIN_AGE and MAX_AGE"
then:
  - "forEach x in items: if x > LIMIT_PER_ITEM then add 1 to breaches"
  - "run data as rest_get(BASE_URL)"
else:
  - "set fallback to DEFAULT_TIER"
"#,
        )
        .unwrap();
        let codes = collect_constant_codes(&assembled.rule);
        let expected: Vec<&str> = vec![
            "BASE_URL",
            "DEFAULT_TIER",
            "LIMIT_PER_ITEM",
            "MAX_AGE",
            "MIN_AGE",
        ];
        assert_eq!(codes.iter().map(String::as_str).collect::<Vec<_>>(), expected);
    }

    #[test]
    fn test_quoted_strings_do_not_register() {
        let assembled = assemble(
            r#"
name: Strings
then:
  - "set label to \"MIN_AGE\""
"#,
        )
        .unwrap();
        assert!(collect_constant_codes(&assembled.rule).is_empty());
    }

    #[test]
    fn test_declared_codes_are_unioned() {
        let assembled = assemble(
            r#"
name: Declared
constants:
  - code: FEE_RATE
    defaultValue: 0.01
then:
  - "set x to MIN_AGE"
"#,
        )
        .unwrap();
        let codes = collect_constant_codes(&assembled.rule);
        assert!(codes.contains("FEE_RATE"));
        assert!(codes.contains("MIN_AGE"));
    }
}
