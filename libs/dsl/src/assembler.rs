//! YAML assembler - turns a parsed YAML tree into a [`RulesDSL`]
//!
//! Structural pre-checks (tabs, unbalanced quotes and brackets) run on the
//! raw text before YAML parsing so the errors can carry the `DSL_STRUCTURAL_*`
//! codes instead of whatever the YAML library reports. Condition and action
//! strings inside the tree are delegated to the recursive descent parsers.

use crate::ast::{
    ActionBlock, CircuitBreakerSpec, Condition, ConditionalBlock, ConstantDecl, Expression,
    LiteralValue, OutputType, RuleShape, RulesDSL, SubRule,
};
use crate::error::{dsl_codes, Error, Result};
use crate::location::SourceLocation;
use crate::parser::Parser;
use serde_yaml::Value as Yaml;

/// Recognised top-level fields; anything else is a warning.
const KNOWN_FIELDS: &[&str] = &[
    "name",
    "description",
    "version",
    "metadata",
    "inputs",
    "constants",
    "when",
    "then",
    "else",
    "conditions",
    "rules",
    "output",
    "circuit_breaker",
];

const MAX_NAME_LENGTH: usize = 255;

/// Non-fatal observation made while assembling
#[derive(Debug, Clone, PartialEq)]
pub struct AssemblerWarning {
    pub field: String,
    pub message: String,
}

/// Assembly result: the rule document plus collected warnings
#[derive(Debug, Clone, PartialEq)]
pub struct Assembled {
    pub rule: RulesDSL,
    pub warnings: Vec<AssemblerWarning>,
}

/// Assemble a YAML source string into a rule document.
pub fn assemble(source: &str) -> Result<Assembled> {
    check_structure(source)?;

    let yaml: Yaml = serde_yaml::from_str(source).map_err(|e| {
        Error::structural(dsl_codes::STRUCTURAL_YAML, format!("malformed YAML: {e}"))
    })?;

    let Yaml::Mapping(ref mapping) = yaml else {
        return Err(Error::structural(
            dsl_codes::STRUCTURAL_YAML,
            "rule source must be a YAML mapping",
        ));
    };

    let mut warnings = Vec::new();
    for key in mapping.keys() {
        if let Yaml::String(key) = key {
            if !KNOWN_FIELDS.contains(&key.as_str()) {
                warnings.push(AssemblerWarning {
                    field: key.clone(),
                    message: format!("unknown field '{key}' is ignored"),
                });
            }
        }
    }

    let name = parse_name(mapping)?;
    let description = string_field(mapping, "description");
    let version = string_field(mapping, "version");
    let inputs = parse_inputs(mapping)?;
    let constants = parse_constants(mapping, &mut warnings)?;
    let output = parse_output(mapping, &mut warnings)?;
    let circuit_breaker = parse_circuit_breaker(mapping, &mut warnings);
    let shape = parse_shape(mapping, &mut warnings)?;

    Ok(Assembled {
        rule: RulesDSL {
            name,
            description,
            version,
            inputs,
            constants,
            output,
            circuit_breaker,
            shape,
        },
        warnings,
    })
}

// ----------------------------------------------------------------------
// Structural pre-checks
// ----------------------------------------------------------------------

fn check_structure(source: &str) -> Result<()> {
    for (idx, line) in source.lines().enumerate() {
        let indent: String = line.chars().take_while(|c| c.is_whitespace()).collect();
        if indent.contains('\t') {
            return Err(Error::structural(
                dsl_codes::STRUCTURAL_TABS,
                format!(
                    "tab character in indentation at line {} (YAML requires spaces)",
                    idx + 1
                ),
            ));
        }
    }

    // Double-quote balance per line (single quotes are skipped: apostrophes
    // in descriptions are legitimate), bracket balance across the document
    let mut depth_square: i32 = 0;
    let mut depth_curly: i32 = 0;
    for (idx, line) in source.lines().enumerate() {
        let mut in_quote = false;
        let mut escaped = false;
        for c in line.chars() {
            if in_quote {
                if escaped {
                    escaped = false;
                } else if c == '\\' {
                    escaped = true;
                } else if c == '"' {
                    in_quote = false;
                }
                continue;
            }
            match c {
                '"' => in_quote = true,
                // Comments may contain anything
                '#' => break,
                '[' => depth_square += 1,
                ']' => depth_square -= 1,
                '{' => depth_curly += 1,
                '}' => depth_curly -= 1,
                _ => {}
            }
            if depth_square < 0 || depth_curly < 0 {
                return Err(Error::structural(
                    dsl_codes::STRUCTURAL_BRACKETS,
                    format!("unbalanced closing bracket at line {}", idx + 1),
                ));
            }
        }
        if in_quote {
            return Err(Error::structural(
                dsl_codes::STRUCTURAL_QUOTES,
                format!("unbalanced quote at line {}", idx + 1),
            ));
        }
    }
    if depth_square != 0 || depth_curly != 0 {
        return Err(Error::structural(
            dsl_codes::STRUCTURAL_BRACKETS,
            "unbalanced brackets",
        ));
    }
    Ok(())
}

// ----------------------------------------------------------------------
// Field parsing
// ----------------------------------------------------------------------

fn field<'a>(mapping: &'a serde_yaml::Mapping, key: &str) -> Option<&'a Yaml> {
    mapping.get(key)
}

fn string_field(mapping: &serde_yaml::Mapping, key: &str) -> Option<String> {
    match field(mapping, key) {
        Some(Yaml::String(s)) => Some(s.clone()),
        Some(Yaml::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}

fn parse_name(mapping: &serde_yaml::Mapping) -> Result<String> {
    let Some(name) = string_field(mapping, "name") else {
        return Err(Error::structural(
            dsl_codes::MISSING_NAME,
            "rule must have a non-empty 'name'",
        ));
    };
    let name = name.trim().to_string();
    if name.is_empty() {
        return Err(Error::structural(
            dsl_codes::MISSING_NAME,
            "rule must have a non-empty 'name'",
        ));
    }
    if name.len() > MAX_NAME_LENGTH {
        return Err(Error::structural(
            dsl_codes::INVALID_NAME,
            format!("rule name exceeds {MAX_NAME_LENGTH} characters"),
        ));
    }
    let valid = name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == ' ' || c == '_' || c == '-');
    if !valid {
        return Err(Error::structural(
            dsl_codes::INVALID_NAME,
            "rule name may contain only letters, digits, spaces, '_' and '-'",
        ));
    }
    Ok(name)
}

fn parse_inputs(mapping: &serde_yaml::Mapping) -> Result<Vec<String>> {
    let Some(value) = field(mapping, "inputs") else {
        return Ok(Vec::new());
    };
    let Yaml::Sequence(items) = value else {
        return Err(Error::structural(
            dsl_codes::INVALID_FIELD,
            "'inputs' must be a list of identifiers",
        ));
    };

    let mut inputs = Vec::new();
    for item in items {
        let Yaml::String(name) = item else {
            return Err(Error::structural(
                dsl_codes::INVALID_FIELD,
                "'inputs' entries must be strings",
            ));
        };
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(Error::structural(
                dsl_codes::INVALID_FIELD,
                "'inputs' entries must be non-empty",
            ));
        }
        if inputs.contains(&name) {
            return Err(Error::structural(
                dsl_codes::INVALID_FIELD,
                format!("duplicate input '{name}'"),
            ));
        }
        inputs.push(name);
    }
    Ok(inputs)
}

fn parse_constants(
    mapping: &serde_yaml::Mapping,
    warnings: &mut Vec<AssemblerWarning>,
) -> Result<Vec<ConstantDecl>> {
    let Some(value) = field(mapping, "constants") else {
        return Ok(Vec::new());
    };
    let Yaml::Sequence(items) = value else {
        return Err(Error::structural(
            dsl_codes::INVALID_FIELD,
            "'constants' must be a list",
        ));
    };

    let mut constants = Vec::new();
    for item in items {
        match item {
            // Shorthand: a bare constant code
            Yaml::String(code) => constants.push(ConstantDecl {
                code: code.clone(),
                default_value: None,
            }),
            Yaml::Mapping(entry) => {
                let Some(code) = entry
                    .get("code")
                    .and_then(|v| v.as_str())
                else {
                    return Err(Error::structural(
                        dsl_codes::INVALID_FIELD,
                        "'constants' entries must have a 'code'",
                    ));
                };
                let default_value = entry
                    .get("defaultValue")
                    .map(yaml_to_json);
                constants.push(ConstantDecl {
                    code: code.to_string(),
                    default_value,
                });
            }
            other => {
                warnings.push(AssemblerWarning {
                    field: "constants".into(),
                    message: format!("ignoring unrecognised constants entry: {other:?}"),
                });
            }
        }
    }
    Ok(constants)
}

fn parse_output(
    mapping: &serde_yaml::Mapping,
    warnings: &mut Vec<AssemblerWarning>,
) -> Result<std::collections::BTreeMap<String, OutputType>> {
    let mut output = std::collections::BTreeMap::new();
    let Some(value) = field(mapping, "output") else {
        return Ok(output);
    };
    let Yaml::Mapping(entries) = value else {
        return Err(Error::structural(
            dsl_codes::INVALID_FIELD,
            "'output' must be a mapping of name to type",
        ));
    };
    for (key, value) in entries {
        let (Yaml::String(name), Yaml::String(type_name)) = (key, value) else {
            warnings.push(AssemblerWarning {
                field: "output".into(),
                message: "ignoring non-string output entry".into(),
            });
            continue;
        };
        match OutputType::from_str_opt(type_name) {
            Some(output_type) => {
                output.insert(name.clone(), output_type);
            }
            None => warnings.push(AssemblerWarning {
                field: "output".into(),
                message: format!("unknown output type '{type_name}' for '{name}'"),
            }),
        }
    }
    Ok(output)
}

fn parse_circuit_breaker(
    mapping: &serde_yaml::Mapping,
    warnings: &mut Vec<AssemblerWarning>,
) -> Option<CircuitBreakerSpec> {
    let value = field(mapping, "circuit_breaker")?;
    let Yaml::Mapping(entry) = value else {
        warnings.push(AssemblerWarning {
            field: "circuit_breaker".into(),
            message: "'circuit_breaker' must be a mapping; ignored".into(),
        });
        return None;
    };
    Some(CircuitBreakerSpec {
        enabled: entry
            .get("enabled")
            .and_then(|v| v.as_bool())
            .unwrap_or(false),
        message: entry
            .get("message")
            .and_then(|v| v.as_str())
            .map(str::to_string),
    })
}

// ----------------------------------------------------------------------
// Shape selection
// ----------------------------------------------------------------------

fn parse_shape(
    mapping: &serde_yaml::Mapping,
    warnings: &mut Vec<AssemblerWarning>,
) -> Result<RuleShape> {
    if let Some(rules) = field(mapping, "rules") {
        return parse_sequence(rules, warnings);
    }
    if let Some(conditions) = field(mapping, "conditions") {
        return Ok(RuleShape::Conditional(parse_conditional_block(
            conditions, warnings,
        )?));
    }
    parse_simple(mapping)
}

fn parse_simple(mapping: &serde_yaml::Mapping) -> Result<RuleShape> {
    let when = parse_condition_list(field(mapping, "when"))?;
    let then = parse_action_lists(field(mapping, "then"))?;
    let else_actions = parse_action_lists(field(mapping, "else"))?;

    if !when.is_empty() && then.is_empty() {
        return Err(Error::structural(
            dsl_codes::WHEN_WITHOUT_THEN,
            "a rule with 'when' must have a non-empty 'then'",
        ));
    }

    Ok(RuleShape::Simple {
        when,
        then,
        else_actions,
    })
}

fn parse_sequence(rules: &Yaml, warnings: &mut Vec<AssemblerWarning>) -> Result<RuleShape> {
    let Yaml::Sequence(items) = rules else {
        return Err(Error::structural(
            dsl_codes::INVALID_SHAPE,
            "'rules' must be a list of named sub-rules",
        ));
    };
    if items.is_empty() {
        return Err(Error::structural(
            dsl_codes::INVALID_SHAPE,
            "'rules' must not be empty",
        ));
    }

    let mut sub_rules = Vec::new();
    for (idx, item) in items.iter().enumerate() {
        let Yaml::Mapping(entry) = item else {
            return Err(Error::structural(
                dsl_codes::INVALID_SHAPE,
                format!("sub-rule #{} must be a mapping", idx + 1),
            ));
        };
        let Some(name) = entry
            .get("name")
            .and_then(|v| v.as_str())
            .map(str::trim)
            .filter(|s| !s.is_empty())
        else {
            return Err(Error::structural(
                dsl_codes::INVALID_SHAPE,
                format!("sub-rule #{} must be named", idx + 1),
            ));
        };

        // A sub-rule carrying both `when` and `conditions` is ambiguous;
        // `when`/`then`/`else` wins
        let shape = if entry.contains_key("when")
            && entry.contains_key("conditions")
        {
            warnings.push(AssemblerWarning {
                field: format!("rules[{idx}]"),
                message: format!(
                    "sub-rule '{name}' has both 'when' and 'conditions'; 'conditions' is ignored"
                ),
            });
            parse_simple(entry)?
        } else if let Some(conditions) = entry.get("conditions") {
            RuleShape::Conditional(parse_conditional_block(conditions, warnings)?)
        } else {
            parse_simple(entry)?
        };

        let is_empty = matches!(
            &shape,
            RuleShape::Simple { when, then, else_actions }
                if when.is_empty() && then.is_empty() && else_actions.is_empty()
        );
        if is_empty {
            return Err(Error::structural(
                dsl_codes::INVALID_SHAPE,
                format!("sub-rule '{name}' is empty"),
            ));
        }

        sub_rules.push(SubRule {
            name: name.to_string(),
            shape,
        });
    }
    Ok(RuleShape::Sequence { rules: sub_rules })
}

fn parse_condition_list(value: Option<&Yaml>) -> Result<Vec<Condition>> {
    let Some(value) = value else {
        return Ok(Vec::new());
    };
    let items = match value {
        Yaml::Sequence(items) => items.clone(),
        // A single string is accepted as a one-element list
        Yaml::String(_) => vec![value.clone()],
        _ => {
            return Err(Error::structural(
                dsl_codes::INVALID_FIELD,
                "'when' must be a list of condition strings",
            ))
        }
    };

    let mut conditions = Vec::new();
    for item in &items {
        match item {
            Yaml::String(source) => conditions.push(Parser::parse_condition_source(source)?),
            Yaml::Bool(b) => conditions.push(Condition::Expression {
                expr: Expression::Literal {
                    value: LiteralValue::Boolean(*b),
                    location: SourceLocation::synthetic(),
                },
                location: SourceLocation::synthetic(),
            }),
            _ => {
                return Err(Error::structural(
                    dsl_codes::INVALID_FIELD,
                    "'when' entries must be strings",
                ))
            }
        }
    }
    Ok(conditions)
}

fn parse_action_lists(value: Option<&Yaml>) -> Result<Vec<crate::ast::Action>> {
    let Some(value) = value else {
        return Ok(Vec::new());
    };
    let items = match value {
        Yaml::Sequence(items) => items.clone(),
        Yaml::String(_) => vec![value.clone()],
        _ => {
            return Err(Error::structural(
                dsl_codes::INVALID_FIELD,
                "'then'/'else' must be a list of action strings",
            ))
        }
    };

    let mut actions = Vec::new();
    for item in &items {
        let Yaml::String(source) = item else {
            return Err(Error::structural(
                dsl_codes::INVALID_FIELD,
                "'then'/'else' entries must be strings",
            ));
        };
        actions.extend(Parser::parse_actions_source(source)?);
    }
    Ok(actions)
}

// ----------------------------------------------------------------------
// Structured conditions
// ----------------------------------------------------------------------

fn parse_conditional_block(
    value: &Yaml,
    warnings: &mut Vec<AssemblerWarning>,
) -> Result<ConditionalBlock> {
    let Yaml::Mapping(entry) = value else {
        return Err(Error::structural(
            dsl_codes::INVALID_SHAPE,
            "'conditions' must be a mapping with 'if'/'then'",
        ));
    };

    let Some(if_value) = entry.get("if") else {
        return Err(Error::structural(
            dsl_codes::INVALID_SHAPE,
            "'conditions' must have an 'if'",
        ));
    };
    let condition = parse_structured_condition(if_value)?;

    let Some(then_value) = entry.get("then") else {
        return Err(Error::structural(
            dsl_codes::INVALID_SHAPE,
            "'conditions' must have a 'then'",
        ));
    };
    let then_block = parse_action_block(then_value, warnings)?;
    let else_block = entry
        .get("else")
        .map(|v| parse_action_block(v, warnings))
        .transpose()?;

    Ok(ConditionalBlock {
        condition,
        then_block,
        else_block,
    })
}

fn parse_action_block(value: &Yaml, warnings: &mut Vec<AssemblerWarning>) -> Result<ActionBlock> {
    match value {
        // Shorthand: a bare list of action strings
        Yaml::Sequence(_) | Yaml::String(_) => Ok(ActionBlock {
            actions: parse_action_lists(Some(value))?,
            nested: None,
        }),
        Yaml::Mapping(entry) => {
            let actions = parse_action_lists(entry.get("actions"))?;
            let nested = entry
                .get("nested")
                .map(|v| parse_conditional_block(v, warnings))
                .transpose()?
                .map(Box::new);
            Ok(ActionBlock { actions, nested })
        }
        _ => Err(Error::structural(
            dsl_codes::INVALID_SHAPE,
            "action block must be a list or a mapping with 'actions'",
        )),
    }
}

fn parse_structured_condition(value: &Yaml) -> Result<Condition> {
    match value {
        // A plain string delegates to the condition parser
        Yaml::String(source) => Parser::parse_condition_source(source),
        Yaml::Mapping(entry) => {
            if let Some(compare) = entry.get("compare") {
                return parse_compare(compare);
            }
            if let Some(operands) = entry.get("and") {
                return parse_structured_logical(operands, crate::ast::LogicalOp::And);
            }
            if let Some(operands) = entry.get("or") {
                return parse_structured_logical(operands, crate::ast::LogicalOp::Or);
            }
            if let Some(operand) = entry.get("not") {
                let inner = parse_structured_condition(operand)?;
                return Ok(Condition::Logical {
                    op: crate::ast::LogicalOp::Not,
                    operands: vec![inner],
                    location: SourceLocation::synthetic(),
                });
            }
            Err(Error::structural(
                dsl_codes::INVALID_SHAPE,
                "structured condition must use 'compare', 'and', 'or' or 'not'",
            ))
        }
        _ => Err(Error::structural(
            dsl_codes::INVALID_SHAPE,
            "unrecognised structured condition",
        )),
    }
}

fn parse_structured_logical(value: &Yaml, op: crate::ast::LogicalOp) -> Result<Condition> {
    let Yaml::Sequence(items) = value else {
        return Err(Error::structural(
            dsl_codes::INVALID_SHAPE,
            "'and'/'or' must take a list of sub-conditions",
        ));
    };
    let operands = items
        .iter()
        .map(parse_structured_condition)
        .collect::<Result<Vec<_>>>()?;
    Ok(Condition::Logical {
        op,
        operands,
        location: SourceLocation::synthetic(),
    })
}

fn parse_compare(value: &Yaml) -> Result<Condition> {
    let Yaml::Mapping(entry) = value else {
        return Err(Error::structural(
            dsl_codes::INVALID_SHAPE,
            "'compare' must be a mapping",
        ));
    };

    let left = entry
        .get("left")
        .ok_or_else(|| Error::structural(dsl_codes::INVALID_SHAPE, "'compare' requires 'left'"))?;
    let operator = entry
        .get("operator")
        .and_then(|v| v.as_str())
        .ok_or_else(|| {
            Error::structural(dsl_codes::INVALID_SHAPE, "'compare' requires 'operator'")
        })?;

    let op = crate::ast::ComparisonOp::from_operator_str(operator).ok_or_else(|| {
        Error::structural(
            dsl_codes::INVALID_SHAPE,
            format!("unknown comparison operator '{operator}'"),
        )
    })?;

    let left = parse_operand(left)?;
    let right = entry
        .get("right")
        .map(parse_operand)
        .transpose()?;
    let range_end = entry
        .get("rangeEnd")
        .map(parse_operand)
        .transpose()?;

    if op.is_binary() && right.is_none() {
        return Err(Error::structural(
            dsl_codes::INVALID_SHAPE,
            format!("'compare' with '{}' requires 'right'", op.keyword()),
        ));
    }
    if op.is_range() && range_end.is_none() {
        return Err(Error::structural(
            dsl_codes::INVALID_SHAPE,
            format!("'compare' with '{}' requires 'rangeEnd'", op.keyword()),
        ));
    }

    Ok(Condition::Comparison {
        left,
        op,
        right,
        range_end,
        location: SourceLocation::synthetic(),
    })
}

/// Operand of a structured `compare`: strings are parsed as expressions,
/// scalars become literals.
fn parse_operand(value: &Yaml) -> Result<Expression> {
    match value {
        Yaml::String(s) => Parser::parse_expression_source(s),
        Yaml::Number(n) => {
            let text = n.to_string();
            let value = text.parse().map_err(|_| {
                Error::structural(dsl_codes::INVALID_SHAPE, format!("invalid number '{text}'"))
            })?;
            Ok(Expression::Literal {
                value: LiteralValue::Number(value),
                location: SourceLocation::synthetic(),
            })
        }
        Yaml::Bool(b) => Ok(Expression::Literal {
            value: LiteralValue::Boolean(*b),
            location: SourceLocation::synthetic(),
        }),
        Yaml::Null => Ok(Expression::Literal {
            value: LiteralValue::Null,
            location: SourceLocation::synthetic(),
        }),
        _ => Err(Error::structural(
            dsl_codes::INVALID_SHAPE,
            "unsupported 'compare' operand",
        )),
    }
}

/// Convert a YAML scalar tree into JSON for constant defaults.
fn yaml_to_json(value: &Yaml) -> serde_json::Value {
    match value {
        Yaml::Null => serde_json::Value::Null,
        Yaml::Bool(b) => serde_json::Value::Bool(*b),
        Yaml::Number(n) => serde_json::from_str(&n.to_string())
            .unwrap_or(serde_json::Value::Null),
        Yaml::String(s) => serde_json::Value::String(s.clone()),
        Yaml::Sequence(items) => {
            serde_json::Value::Array(items.iter().map(yaml_to_json).collect())
        }
        Yaml::Mapping(entries) => {
            let mut map = serde_json::Map::new();
            for (k, v) in entries {
                if let Yaml::String(key) = k {
                    map.insert(key.clone(), yaml_to_json(v));
                }
            }
            serde_json::Value::Object(map)
        }
        Yaml::Tagged(tagged) => yaml_to_json(&tagged.value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::ComparisonOp;

    #[test]
    fn test_simple_shape() {
        let assembled = assemble(
            r#"
name: Basic
inputs: [creditScore, annualIncome]
when:
  - "creditScore at_least 650"
  - "annualIncome greater_than 40000"
then:
  - "set decision to \"APPROVED\""
else:
  - "set decision to \"DECLINED\""
"#,
        )
        .unwrap();
        assert_eq!(assembled.rule.name, "Basic");
        assert_eq!(assembled.rule.inputs.len(), 2);
        let RuleShape::Simple {
            when,
            then,
            else_actions,
        } = &assembled.rule.shape
        else {
            panic!("expected simple shape");
        };
        assert_eq!(when.len(), 2);
        assert_eq!(then.len(), 1);
        assert_eq!(else_actions.len(), 1);
    }

    #[test]
    fn test_tabs_rejected() {
        let err = assemble("name: X\n\twhen: []\n").unwrap_err();
        assert_eq!(err.code(), dsl_codes::STRUCTURAL_TABS);
    }

    #[test]
    fn test_missing_name() {
        let err = assemble("inputs: [a]\nthen: [\"set x to 1\"]\n").unwrap_err();
        assert_eq!(err.code(), dsl_codes::MISSING_NAME);
    }

    #[test]
    fn test_invalid_name_characters() {
        let err = assemble("name: \"bad/name!\"\nthen: [\"set x to 1\"]\n").unwrap_err();
        assert_eq!(err.code(), dsl_codes::INVALID_NAME);
    }

    #[test]
    fn test_when_without_then() {
        let err = assemble("name: X\nwhen: [\"a > 1\"]\n").unwrap_err();
        assert_eq!(err.code(), dsl_codes::WHEN_WITHOUT_THEN);
    }

    #[test]
    fn test_unknown_field_is_warning() {
        let assembled =
            assemble("name: X\nthen: [\"set x to 1\"]\nfrobnicate: true\n").unwrap();
        assert_eq!(assembled.warnings.len(), 1);
        assert_eq!(assembled.warnings[0].field, "frobnicate");
    }

    #[test]
    fn test_constants_with_defaults() {
        let assembled = assemble(
            r#"
name: X
constants:
  - code: MIN_AGE
    defaultValue: 18
  - MAX_RETRIES
then: ["set x to 1"]
"#,
        )
        .unwrap();
        assert_eq!(assembled.rule.constants.len(), 2);
        assert_eq!(
            assembled.rule.constant_default("MIN_AGE"),
            Some(&serde_json::json!(18))
        );
        assert_eq!(assembled.rule.constant_default("MAX_RETRIES"), None);
    }

    #[test]
    fn test_sequence_shape() {
        let assembled = assemble(
            r#"
name: Pipeline
rules:
  - name: first
    when: ["a > 1"]
    then: ["set x to 1"]
  - name: second
    then: ["set y to 2"]
"#,
        )
        .unwrap();
        let RuleShape::Sequence { rules } = &assembled.rule.shape else {
            panic!("expected sequence");
        };
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0].name, "first");
    }

    #[test]
    fn test_sequence_requires_names() {
        let err = assemble(
            r#"
name: Pipeline
rules:
  - when: ["a > 1"]
    then: ["set x to 1"]
"#,
        )
        .unwrap_err();
        assert_eq!(err.code(), dsl_codes::INVALID_SHAPE);
    }

    #[test]
    fn test_conditional_shape_with_compare() {
        let assembled = assemble(
            r#"
name: Structured
conditions:
  if:
    compare:
      left: "creditScore"
      operator: ">="
      right: 650
  then:
    actions: ["set tier to \"PRIME\""]
    nested:
      if:
        compare:
          left: "annualIncome"
          operator: "at_least"
          right: 100000
      then:
        actions: ["set tier to \"PRIME_PLUS\""]
  else:
    actions: ["set tier to \"STANDARD\""]
"#,
        )
        .unwrap();
        let RuleShape::Conditional(block) = &assembled.rule.shape else {
            panic!("expected conditional");
        };
        let Condition::Comparison { op, .. } = &block.condition else {
            panic!("expected comparison");
        };
        assert_eq!(*op, ComparisonOp::AtLeast);
        assert!(block.then_block.nested.is_some());
        assert!(block.else_block.is_some());
    }

    #[test]
    fn test_structured_and_or_not() {
        let assembled = assemble(
            r#"
name: Logic
conditions:
  if:
    and:
      - compare: { left: "a", operator: ">", right: 1 }
      - not:
          compare: { left: "b", operator: "==", right: 0 }
  then: ["set ok to true"]
"#,
        )
        .unwrap();
        let RuleShape::Conditional(block) = &assembled.rule.shape else {
            panic!("expected conditional");
        };
        let Condition::Logical { operands, .. } = &block.condition else {
            panic!("expected logical");
        };
        assert_eq!(operands.len(), 2);
    }

    #[test]
    fn test_compare_between_requires_range_end() {
        let err = assemble(
            r#"
name: Range
conditions:
  if:
    compare: { left: "age", operator: "between", right: 18 }
  then: ["set ok to true"]
"#,
        )
        .unwrap_err();
        assert_eq!(err.code(), dsl_codes::INVALID_SHAPE);
    }

    #[test]
    fn test_sub_rule_with_when_and_conditions_prefers_when() {
        let assembled = assemble(
            r#"
name: Ambiguous
rules:
  - name: both
    when: ["a > 1"]
    then: ["set x to 1"]
    conditions:
      if: { compare: { left: "b", operator: ">", right: 2 } }
      then: ["set y to 2"]
"#,
        )
        .unwrap();
        let RuleShape::Sequence { rules } = &assembled.rule.shape else {
            panic!("expected sequence");
        };
        assert!(matches!(rules[0].shape, RuleShape::Simple { .. }));
        assert!(assembled
            .warnings
            .iter()
            .any(|w| w.message.contains("'conditions' is ignored")));
    }

    #[test]
    fn test_output_types() {
        let assembled = assemble(
            r#"
name: Outputs
then: ["set decision to \"OK\""]
output:
  decision: text
  score: number
"#,
        )
        .unwrap();
        assert_eq!(
            assembled.rule.output.get("decision"),
            Some(&OutputType::Text)
        );
        assert_eq!(assembled.rule.output.get("score"), Some(&OutputType::Number));
    }
}
