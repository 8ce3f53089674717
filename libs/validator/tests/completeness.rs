//! Issue-code completeness
//!
//! Every issue code the pipeline can emit has one source that triggers it
//! and one near-identical source that does not.

use arbiter_validator::validate;

fn emits(source: &str, code: &str) -> bool {
    validate(source).issues.iter().any(|i| i.code == code)
}

#[track_caller]
fn check(code: &str, positive: &str, negative: &str) {
    assert!(
        emits(positive, code),
        "expected {code} from:\n{positive}\ngot: {:#?}",
        validate(positive).issues
    );
    assert!(
        !emits(negative, code),
        "did not expect {code} from:\n{negative}"
    );
}

const CLEAN: &str = "name: X\ndescription: d\nversion: \"1\"\ninputs: [amount]\nwhen: [\"amount greater_than 1\"]\nthen: [\"set ok to true\"]\n";

#[test]
fn syntax_codes() {
    check("SYNTAX_001", "name: X\nthen: @bad\n", CLEAN);
    check("SYNTAX_002", "name: X\n\tthen: []\n", CLEAN);
    check("SYNTAX_003", "name: X\nitems: [1, 2\n", CLEAN);
    check("SYNTAX_004", "then: [\"set a to 1\"]\n", CLEAN);
    check("SYNTAX_005", "name: \"bad!name\"\nthen: [\"set a to 1\"]\n", CLEAN);
    check("SYNTAX_006", "name: X\nwhen: [\"a greater_than 1\"]\n", CLEAN);
    check("SYNTAX_007", "name: X\ninputs: [a, a]\nthen: [\"set b to 1\"]\n", CLEAN);
    check(
        "SYNTAX_008",
        "name: X\nrules:\n  - when: [\"a greater_than 1\"]\n    then: [\"set b to 1\"]\n",
        CLEAN,
    );
    check(
        "SYNTAX_009",
        "name: X\nthen: [\"set a to 'unterminated\"]\n",
        CLEAN,
    );
    check("SYNTAX_010", "name: X\nthen: [\"set a to 1\"]\nmystery: 1\n", CLEAN);
}

#[test]
fn parse_codes() {
    check("PARSE_001", "name: X\nthen: [\"set a to 1 2\"]\n", CLEAN);
    check(
        "PARSE_002",
        "name: X\nthen: [\"set a to sum()\"]\n",
        CLEAN,
    );
    check("PARSE_003", "name: X\nthen: [\"set a to +\"]\n", CLEAN);
    check(
        "PARSE_004",
        "name: X\ninputs: [age]\nwhen: [\"age between 18\"]\nthen: [\"set a to 1\"]\n",
        CLEAN,
    );
    check("PARSE_005", "name: X\nthen: [\"frobnicate a\"]\n", CLEAN);
}

#[test]
fn naming_codes() {
    check(
        "NAMING_001",
        "name: X\ndescription: d\nversion: \"1\"\ninputs: [snake_input]\nwhen: [\"snake_input greater_than 1\"]\nthen: [\"set ok to true\"]\n",
        CLEAN,
    );
    check(
        "NAMING_002",
        "name: X\nthen: [\"set Bad_Name to 1\"]\n",
        "name: X\nthen: [\"set good_name to 1\"]\n",
    );
    check(
        "NAMING_003",
        "name: X\nconstants:\n  - code: lowercase\nthen: [\"set a to 1\"]\n",
        "name: X\nconstants:\n  - code: UPPER_CODE\nthen: [\"set a to UPPER_CODE\"]\n",
    );
    check(
        "NAMING_004",
        "name: X\ninputs: [set]\nthen: [\"set a to 1\"]\n",
        CLEAN,
    );
    check(
        "NAMING_005",
        "name: X\nthen: [\"set MAX_LIMIT to 5\"]\n",
        "name: X\nthen: [\"set max_limit to 5\"]\n",
    );
}

#[test]
fn dependency_codes() {
    check(
        "DEP_001",
        "name: X\nthen: [\"set a to undeclared + 1\"]\n",
        CLEAN,
    );
    check(
        "DEP_002",
        "name: X\ninputs: [neverUsed]\nthen: [\"set a to 1\"]\n",
        CLEAN,
    );
    check(
        "DEP_003",
        "name: X\nthen: [\"set a to mystery(1)\"]\n",
        "name: X\nthen: [\"set a to abs(1)\"]\n",
    );
}

#[test]
fn logic_codes() {
    check(
        "LOGIC_001",
        "name: X\ninputs: [a]\nwhen: [\"a equals a\"]\nthen: [\"set ok to true\"]\n",
        CLEAN,
    );
    check(
        "LOGIC_002",
        "name: X\ninputs: [x]\nwhen: [\"x greater_than 10\", \"x less_than 5\"]\nthen: [\"set ok to true\"]\n",
        "name: X\ninputs: [x]\nwhen: [\"x greater_than 5\", \"x less_than 10\"]\nthen: [\"set ok to true\"]\n",
    );
    check(
        "LOGIC_003",
        "name: X\nwhen: [\"false\"]\nthen: [\"set ok to true\"]\n",
        CLEAN,
    );
    check(
        "LOGIC_004",
        "name: X\nthen: [\"set a to 1\"]\noutput:\n  ghost: number\n",
        "name: X\nthen: [\"set ghost to 1\"]\noutput:\n  ghost: number\n",
    );
}

#[test]
fn performance_codes() {
    let many_conditions: Vec<String> = (0..21)
        .map(|i| format!("\"x greater_than {i}\""))
        .collect();
    check(
        "PERF_001",
        &format!(
            "name: X\ninputs: [x]\nwhen: [{}]\nthen: [\"set ok to true\"]\n",
            many_conditions.join(", ")
        ),
        CLEAN,
    );

    let many_actions: Vec<String> = (0..51).map(|i| format!("\"set v{i} to {i}\"")).collect();
    check(
        "PERF_002",
        &format!("name: X\nthen: [{}]\n", many_actions.join(", ")),
        CLEAN,
    );

    check(
        "PERF_003",
        "name: X\ninputs: [x]\nwhen: [\"json_get(x, \\\"$.a\\\") equals 1\", \"x greater_than 0\"]\nthen: [\"set ok to true\"]\n",
        "name: X\ninputs: [x]\nwhen: [\"x greater_than 0\", \"json_get(x, \\\"$.a\\\") equals 1\"]\nthen: [\"set ok to true\"]\n",
    );

    check(
        "PERF_004",
        "name: X\ninputs: [a, b]\nthen: [\"set x to a * b\", \"set y to a * b\", \"set z to a * b\"]\n",
        CLEAN,
    );
}

#[test]
fn best_practice_codes() {
    check("BP_001", "name: X\nthen: [\"set a to 1\"]\n", CLEAN);
    check("BP_002", "name: X\nthen: [\"set a to 1\"]\n", CLEAN);
    check(
        "BP_003",
        &format!("name: {}\nthen: [\"set a to 1\"]\n", "x".repeat(120)),
        CLEAN,
    );
    check(
        "BP_004",
        "name: X\ninputs: [income]\nwhen: [\"income greater_than 40000\"]\nthen: [\"set ok to true\"]\n",
        CLEAN,
    );
}
