//! Condition nodes

use super::expression::Expression;
use crate::location::SourceLocation;

/// AST node representing a boolean test
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// `left op right`, `left between a and b`, or a postfix validator
    /// (`right` and `range_end` absent)
    Comparison {
        left: Expression,
        op: ComparisonOp,
        right: Option<Expression>,
        range_end: Option<Expression>,
        location: SourceLocation,
    },

    /// `and` / `or` / `not` over sub-conditions
    Logical {
        op: LogicalOp,
        operands: Vec<Condition>,
        location: SourceLocation,
    },

    /// Truthy coercion of a bare expression (`- "true"`, function results)
    Expression {
        expr: Expression,
        location: SourceLocation,
    },
}

impl Condition {
    pub fn location(&self) -> SourceLocation {
        match self {
            Condition::Comparison { location, .. }
            | Condition::Logical { location, .. }
            | Condition::Expression { location, .. } => *location,
        }
    }
}

/// Logical connectives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
    Not,
}

/// Comparison operators, including unary validators (no right operand)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonOp {
    // Binary
    Equals,
    NotEquals,
    GreaterThan,
    LessThan,
    AtLeast,
    AtMost,
    Contains,
    NotContains,
    StartsWith,
    EndsWith,
    Matches,
    NotMatches,
    InList,
    NotInList,
    Between,
    NotBetween,
    AgeAtLeast,
    AgeLessThan,

    // Unary validators
    Exists,
    IsNull,
    IsNotNull,
    IsEmpty,
    IsNotEmpty,
    IsNumeric,
    IsEmail,
    IsPhone,
    IsDate,
    IsPositive,
    IsNegative,
    IsZero,
    IsPercentage,
    IsCurrency,
    IsCreditScore,
    IsSsn,
    IsAccountNumber,
    IsRoutingNumber,
    IsBusinessDay,
    IsWeekend,
}

impl ComparisonOp {
    /// Whether this operator takes a right operand.
    pub fn is_binary(&self) -> bool {
        !matches!(
            self,
            ComparisonOp::Exists
                | ComparisonOp::IsNull
                | ComparisonOp::IsNotNull
                | ComparisonOp::IsEmpty
                | ComparisonOp::IsNotEmpty
                | ComparisonOp::IsNumeric
                | ComparisonOp::IsEmail
                | ComparisonOp::IsPhone
                | ComparisonOp::IsDate
                | ComparisonOp::IsPositive
                | ComparisonOp::IsNegative
                | ComparisonOp::IsZero
                | ComparisonOp::IsPercentage
                | ComparisonOp::IsCurrency
                | ComparisonOp::IsCreditScore
                | ComparisonOp::IsSsn
                | ComparisonOp::IsAccountNumber
                | ComparisonOp::IsRoutingNumber
                | ComparisonOp::IsBusinessDay
                | ComparisonOp::IsWeekend
        )
    }

    /// Whether this operator takes a `between a and b` range.
    pub fn is_range(&self) -> bool {
        matches!(self, ComparisonOp::Between | ComparisonOp::NotBetween)
    }

    /// Canonical operator spelling in the DSL.
    pub fn keyword(&self) -> &'static str {
        match self {
            ComparisonOp::Equals => "equals",
            ComparisonOp::NotEquals => "not_equals",
            ComparisonOp::GreaterThan => "greater_than",
            ComparisonOp::LessThan => "less_than",
            ComparisonOp::AtLeast => "at_least",
            ComparisonOp::AtMost => "at_most",
            ComparisonOp::Contains => "contains",
            ComparisonOp::NotContains => "not_contains",
            ComparisonOp::StartsWith => "starts_with",
            ComparisonOp::EndsWith => "ends_with",
            ComparisonOp::Matches => "matches",
            ComparisonOp::NotMatches => "not_matches",
            ComparisonOp::InList => "in_list",
            ComparisonOp::NotInList => "not_in_list",
            ComparisonOp::Between => "between",
            ComparisonOp::NotBetween => "not_between",
            ComparisonOp::AgeAtLeast => "age_at_least",
            ComparisonOp::AgeLessThan => "age_less_than",
            ComparisonOp::Exists => "exists",
            ComparisonOp::IsNull => "is_null",
            ComparisonOp::IsNotNull => "is_not_null",
            ComparisonOp::IsEmpty => "is_empty",
            ComparisonOp::IsNotEmpty => "is_not_empty",
            ComparisonOp::IsNumeric => "is_numeric",
            ComparisonOp::IsEmail => "is_email",
            ComparisonOp::IsPhone => "is_phone",
            ComparisonOp::IsDate => "is_date",
            ComparisonOp::IsPositive => "is_positive",
            ComparisonOp::IsNegative => "is_negative",
            ComparisonOp::IsZero => "is_zero",
            ComparisonOp::IsPercentage => "is_percentage",
            ComparisonOp::IsCurrency => "is_currency",
            ComparisonOp::IsCreditScore => "is_credit_score",
            ComparisonOp::IsSsn => "is_ssn",
            ComparisonOp::IsAccountNumber => "is_account_number",
            ComparisonOp::IsRoutingNumber => "is_routing_number",
            ComparisonOp::IsBusinessDay => "is_business_day",
            ComparisonOp::IsWeekend => "is_weekend",
        }
    }

    /// Map an operator string from a structured `compare` block, accepting
    /// both keyword spellings and symbol aliases (`>=` for `at_least`, ...).
    pub fn from_operator_str(op: &str) -> Option<Self> {
        match op.to_ascii_lowercase().as_str() {
            "equals" | "==" | "=" => Some(ComparisonOp::Equals),
            "not_equals" | "!=" => Some(ComparisonOp::NotEquals),
            "greater_than" | ">" => Some(ComparisonOp::GreaterThan),
            "less_than" | "<" => Some(ComparisonOp::LessThan),
            "at_least" | ">=" => Some(ComparisonOp::AtLeast),
            "at_most" | "<=" => Some(ComparisonOp::AtMost),
            "contains" => Some(ComparisonOp::Contains),
            "not_contains" => Some(ComparisonOp::NotContains),
            "starts_with" => Some(ComparisonOp::StartsWith),
            "ends_with" => Some(ComparisonOp::EndsWith),
            "matches" => Some(ComparisonOp::Matches),
            "not_matches" => Some(ComparisonOp::NotMatches),
            "in_list" | "in" => Some(ComparisonOp::InList),
            "not_in_list" | "not_in" => Some(ComparisonOp::NotInList),
            "between" => Some(ComparisonOp::Between),
            "not_between" => Some(ComparisonOp::NotBetween),
            "age_at_least" => Some(ComparisonOp::AgeAtLeast),
            "age_less_than" => Some(ComparisonOp::AgeLessThan),
            "exists" => Some(ComparisonOp::Exists),
            "is_null" => Some(ComparisonOp::IsNull),
            "is_not_null" => Some(ComparisonOp::IsNotNull),
            "is_empty" => Some(ComparisonOp::IsEmpty),
            "is_not_empty" => Some(ComparisonOp::IsNotEmpty),
            "is_numeric" => Some(ComparisonOp::IsNumeric),
            "is_email" => Some(ComparisonOp::IsEmail),
            "is_phone" => Some(ComparisonOp::IsPhone),
            "is_date" => Some(ComparisonOp::IsDate),
            "is_positive" => Some(ComparisonOp::IsPositive),
            "is_negative" => Some(ComparisonOp::IsNegative),
            "is_zero" => Some(ComparisonOp::IsZero),
            "is_percentage" => Some(ComparisonOp::IsPercentage),
            "is_currency" => Some(ComparisonOp::IsCurrency),
            "is_credit_score" => Some(ComparisonOp::IsCreditScore),
            "is_ssn" => Some(ComparisonOp::IsSsn),
            "is_account_number" => Some(ComparisonOp::IsAccountNumber),
            "is_routing_number" => Some(ComparisonOp::IsRoutingNumber),
            "is_business_day" => Some(ComparisonOp::IsBusinessDay),
            "is_weekend" => Some(ComparisonOp::IsWeekend),
            _ => None,
        }
    }
}
