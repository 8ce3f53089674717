//! Token types for the rule DSL lexer
//!
//! Tokens represent the lexical elements of condition and action strings.
//! Keyword operators (`at_least`, `not_equals`, `is_credit_score`, ...) are
//! lexed as identifiers and reclassified through a case-insensitive keyword
//! table.

use crate::location::SourceLocation;
use rust_decimal::Decimal;

/// Token kinds for the rule DSL lexer
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum TokenKind {
    // Punctuation
    LeftParen,    // (
    RightParen,   // )
    LeftBracket,  // [
    RightBracket, // ]
    Comma,        // ,
    Dot,          // .
    Semicolon,    // ;
    Colon,        // :

    // Arithmetic
    Plus,     // +
    Minus,    // -
    Star,     // *
    Slash,    // /
    Percent,  // %
    Caret,    // ^
    StarStar, // **

    // Comparison symbols
    EqualEqual,   // ==
    BangEqual,    // !=
    Greater,      // >
    Less,         // <
    GreaterEqual, // >=
    LessEqual,    // <=

    // Keyword comparison operators
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
    Exists,

    // Unary validators
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
    AgeAtLeast,
    AgeLessThan,

    // Type-check operators (expression level)
    IsNumber,
    IsString,
    IsBoolean,
    IsList,

    // Logical
    And,
    Or,
    Not,

    // Action keywords
    Set,
    To,
    Calculate,
    As,
    Add,
    Subtract,
    Multiply,
    Divide,
    From,
    By,
    Call,
    With,
    If,
    Then,
    Else,
    Run,
    ForEach,
    In,
    While,
    Do,
    Append,
    Prepend,
    Remove,
    CircuitBreaker,

    // Literals
    Number,
    String,
    Boolean,
    Null,

    // Identifiers
    Identifier,

    // End of input
    Eof,
}

impl TokenKind {
    /// Binary comparison keyword operators (take a right operand).
    pub fn is_comparison_keyword(&self) -> bool {
        matches!(
            self,
            TokenKind::Equals
                | TokenKind::NotEquals
                | TokenKind::GreaterThan
                | TokenKind::LessThan
                | TokenKind::AtLeast
                | TokenKind::AtMost
                | TokenKind::Contains
                | TokenKind::NotContains
                | TokenKind::StartsWith
                | TokenKind::EndsWith
                | TokenKind::Matches
                | TokenKind::NotMatches
                | TokenKind::InList
                | TokenKind::NotInList
                | TokenKind::Between
                | TokenKind::NotBetween
                | TokenKind::AgeAtLeast
                | TokenKind::AgeLessThan
        )
    }

    /// Comparison symbol operators (`==`, `>=`, ...).
    pub fn is_comparison_symbol(&self) -> bool {
        matches!(
            self,
            TokenKind::EqualEqual
                | TokenKind::BangEqual
                | TokenKind::Greater
                | TokenKind::Less
                | TokenKind::GreaterEqual
                | TokenKind::LessEqual
        )
    }

    /// Postfix validators that take no right operand (`x is_null`, `x exists`).
    pub fn is_unary_validator(&self) -> bool {
        matches!(
            self,
            TokenKind::Exists
                | TokenKind::IsNull
                | TokenKind::IsNotNull
                | TokenKind::IsEmpty
                | TokenKind::IsNotEmpty
                | TokenKind::IsNumeric
                | TokenKind::IsEmail
                | TokenKind::IsPhone
                | TokenKind::IsDate
                | TokenKind::IsPositive
                | TokenKind::IsNegative
                | TokenKind::IsZero
                | TokenKind::IsPercentage
                | TokenKind::IsCurrency
                | TokenKind::IsCreditScore
                | TokenKind::IsSsn
                | TokenKind::IsAccountNumber
                | TokenKind::IsRoutingNumber
                | TokenKind::IsBusinessDay
                | TokenKind::IsWeekend
        )
    }
}

/// Case-insensitive keyword table. The lexer lowercases an identifier before
/// the lookup; identifiers themselves stay case-sensitive.
static KEYWORDS: phf::Map<&'static str, TokenKind> = phf::phf_map! {
    // Comparison keywords
    "equals" => TokenKind::Equals,
    "not_equals" => TokenKind::NotEquals,
    "greater_than" => TokenKind::GreaterThan,
    "less_than" => TokenKind::LessThan,
    "at_least" => TokenKind::AtLeast,
    "at_most" => TokenKind::AtMost,
    "contains" => TokenKind::Contains,
    "not_contains" => TokenKind::NotContains,
    "starts_with" => TokenKind::StartsWith,
    "ends_with" => TokenKind::EndsWith,
    "matches" => TokenKind::Matches,
    "not_matches" => TokenKind::NotMatches,
    "in_list" => TokenKind::InList,
    "not_in_list" => TokenKind::NotInList,
    "between" => TokenKind::Between,
    "not_between" => TokenKind::NotBetween,
    "exists" => TokenKind::Exists,

    // Unary validators
    "is_null" => TokenKind::IsNull,
    "is_not_null" => TokenKind::IsNotNull,
    "is_empty" => TokenKind::IsEmpty,
    "is_not_empty" => TokenKind::IsNotEmpty,
    "is_numeric" => TokenKind::IsNumeric,
    "is_email" => TokenKind::IsEmail,
    "is_phone" => TokenKind::IsPhone,
    "is_date" => TokenKind::IsDate,
    "is_positive" => TokenKind::IsPositive,
    "is_negative" => TokenKind::IsNegative,
    "is_zero" => TokenKind::IsZero,
    "is_percentage" => TokenKind::IsPercentage,
    "is_currency" => TokenKind::IsCurrency,
    "is_credit_score" => TokenKind::IsCreditScore,
    "is_ssn" => TokenKind::IsSsn,
    "is_account_number" => TokenKind::IsAccountNumber,
    "is_routing_number" => TokenKind::IsRoutingNumber,
    "is_business_day" => TokenKind::IsBusinessDay,
    "is_weekend" => TokenKind::IsWeekend,
    "age_at_least" => TokenKind::AgeAtLeast,
    "age_less_than" => TokenKind::AgeLessThan,

    // Type checks
    "is_number" => TokenKind::IsNumber,
    "is_string" => TokenKind::IsString,
    "is_boolean" => TokenKind::IsBoolean,
    "is_list" => TokenKind::IsList,

    // Logical
    "and" => TokenKind::And,
    "or" => TokenKind::Or,
    "not" => TokenKind::Not,

    // Actions
    "set" => TokenKind::Set,
    "to" => TokenKind::To,
    "calculate" => TokenKind::Calculate,
    "as" => TokenKind::As,
    "add" => TokenKind::Add,
    "subtract" => TokenKind::Subtract,
    "multiply" => TokenKind::Multiply,
    "divide" => TokenKind::Divide,
    "from" => TokenKind::From,
    "by" => TokenKind::By,
    "call" => TokenKind::Call,
    "with" => TokenKind::With,
    "if" => TokenKind::If,
    "then" => TokenKind::Then,
    "else" => TokenKind::Else,
    "run" => TokenKind::Run,
    "foreach" => TokenKind::ForEach,
    "in" => TokenKind::In,
    "while" => TokenKind::While,
    "do" => TokenKind::Do,
    "append" => TokenKind::Append,
    "prepend" => TokenKind::Prepend,
    "remove" => TokenKind::Remove,
    "circuit_breaker" => TokenKind::CircuitBreaker,

    // Literals
    "true" => TokenKind::Boolean,
    "false" => TokenKind::Boolean,
    "null" => TokenKind::Null,
};

/// Look up the keyword kind for an identifier, case-insensitively.
pub fn keyword_kind(identifier: &str) -> Option<TokenKind> {
    KEYWORDS.get(identifier.to_ascii_lowercase().as_str()).copied()
}

/// Literal payload attached to literal tokens.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenLiteral {
    Number(Decimal),
    String(String),
    Boolean(bool),
    Null,
}

/// A token in a rule DSL source string
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub literal: Option<TokenLiteral>,
    pub location: SourceLocation,
}

impl Token {
    pub fn new(kind: TokenKind, lexeme: impl Into<String>, location: SourceLocation) -> Self {
        Self {
            kind,
            lexeme: lexeme.into(),
            literal: None,
            location,
        }
    }

    pub fn with_literal(
        kind: TokenKind,
        lexeme: impl Into<String>,
        literal: TokenLiteral,
        location: SourceLocation,
    ) -> Self {
        Self {
            kind,
            lexeme: lexeme.into(),
            literal: Some(literal),
            location,
        }
    }

    pub fn eof(location: SourceLocation) -> Self {
        Self {
            kind: TokenKind::Eof,
            lexeme: String::new(),
            literal: None,
            location,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_lookup_is_case_insensitive() {
        assert_eq!(keyword_kind("at_least"), Some(TokenKind::AtLeast));
        assert_eq!(keyword_kind("AT_LEAST"), Some(TokenKind::AtLeast));
        assert_eq!(keyword_kind("ForEach"), Some(TokenKind::ForEach));
        assert_eq!(keyword_kind("creditScore"), None);
    }

    #[test]
    fn test_multi_word_operators_are_single_keywords() {
        assert_eq!(keyword_kind("not_equals"), Some(TokenKind::NotEquals));
        assert_eq!(
            keyword_kind("is_credit_score"),
            Some(TokenKind::IsCreditScore)
        );
        assert_eq!(keyword_kind("circuit_breaker"), Some(TokenKind::CircuitBreaker));
    }

    #[test]
    fn test_classification_helpers() {
        assert!(TokenKind::AtLeast.is_comparison_keyword());
        assert!(TokenKind::Between.is_comparison_keyword());
        assert!(!TokenKind::IsNull.is_comparison_keyword());
        assert!(TokenKind::IsNull.is_unary_validator());
        assert!(TokenKind::Exists.is_unary_validator());
        assert!(TokenKind::GreaterEqual.is_comparison_symbol());
        assert!(!TokenKind::Plus.is_comparison_symbol());
    }
}
