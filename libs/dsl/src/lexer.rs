//! Rule DSL lexer - tokenizes condition and action strings
//!
//! Converts a source string into a finite token stream terminated by `Eof`.
//! Identifiers are reclassified through the case-insensitive keyword table,
//! which is how multi-word operators (`not_equals`, `is_credit_score`, ...)
//! become single tokens.

use crate::error::{lex_codes, Error, Result};
use crate::location::SourceLocation;
use crate::token::{keyword_kind, Token, TokenKind, TokenLiteral};
use rust_decimal::Decimal;
use std::str::FromStr;

/// The rule DSL lexer
pub struct Lexer {
    chars: Vec<char>,
    source: String,
    position: usize,
    line: usize,
    column: usize,
}

impl Lexer {
    /// Create a new lexer for the given input
    pub fn new(input: &str) -> Self {
        Self {
            chars: input.chars().collect(),
            source: input.to_string(),
            position: 0,
            line: 1,
            column: 1,
        }
    }

    /// Tokenize the whole input, including the trailing `Eof` token.
    pub fn tokenize(mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let done = token.kind == TokenKind::Eof;
            tokens.push(token);
            if done {
                break;
            }
        }
        Ok(tokens)
    }

    fn current(&self) -> Option<char> {
        self.chars.get(self.position).copied()
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.position + 1).copied()
    }

    fn advance(&mut self) {
        if let Some(c) = self.current() {
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
        self.position += 1;
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.current() {
            if c.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn here(&self, length: usize) -> SourceLocation {
        SourceLocation::new(self.line, self.column, self.position, length)
    }

    /// Read an identifier: `[A-Za-z_][A-Za-z0-9_]*`
    fn read_identifier(&mut self) -> String {
        let start = self.position;
        while let Some(c) = self.current() {
            if c.is_ascii_alphanumeric() || c == '_' {
                self.advance();
            } else {
                break;
            }
        }
        self.chars[start..self.position].iter().collect()
    }

    /// Read a string literal delimited by `"` or `'`.
    ///
    /// Supports `\" \' \\ \n \t \r` escapes. Any other backslash pair is kept
    /// verbatim (backslash included) so regex patterns like `"\\d+"` survive.
    fn read_string(&mut self, quote: char, start: SourceLocation) -> Result<Token> {
        self.advance(); // opening quote

        let mut value = String::new();
        while let Some(c) = self.current() {
            if c == quote {
                self.advance(); // closing quote
                let length = self.position - start.offset;
                let location = SourceLocation::new(start.line, start.column, start.offset, length);
                let lexeme: String = self.chars[start.offset..self.position].iter().collect();
                return Ok(Token::with_literal(
                    TokenKind::String,
                    lexeme,
                    TokenLiteral::String(value),
                    location,
                ));
            }
            if c == '\\' {
                self.advance();
                let Some(escaped) = self.current() else {
                    break;
                };
                match escaped {
                    '"' => value.push('"'),
                    '\'' => value.push('\''),
                    '\\' => value.push('\\'),
                    'n' => value.push('\n'),
                    't' => value.push('\t'),
                    'r' => value.push('\r'),
                    other => {
                        // Preserve unknown escapes for regex patterns
                        value.push('\\');
                        value.push(other);
                    }
                }
                self.advance();
            } else {
                value.push(c);
                self.advance();
            }
        }

        Err(Error::lex(
            lex_codes::UNTERMINATED_STRING,
            format!("unterminated string literal (missing closing {quote})"),
            start,
            &self.source,
        ))
    }

    /// Read a number: digits, optional fraction, optional exponent.
    /// Values are kept as arbitrary-precision decimals.
    fn read_number(&mut self) -> Result<Token> {
        let start = self.here(0);
        while self.current().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
        }

        if self.current() == Some('.') && self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.advance(); // '.'
            while self.current().is_some_and(|c| c.is_ascii_digit()) {
                self.advance();
            }
        }

        if matches!(self.current(), Some('e') | Some('E')) {
            let mut lookahead = self.position + 1;
            if matches!(self.chars.get(lookahead), Some('+') | Some('-')) {
                lookahead += 1;
            }
            if self.chars.get(lookahead).is_some_and(|c| c.is_ascii_digit()) {
                self.advance(); // 'e'
                if matches!(self.current(), Some('+') | Some('-')) {
                    self.advance();
                }
                while self.current().is_some_and(|c| c.is_ascii_digit()) {
                    self.advance();
                }
            }
        }

        let lexeme: String = self.chars[start.offset..self.position].iter().collect();
        let location =
            SourceLocation::new(start.line, start.column, start.offset, lexeme.chars().count());

        let value = Decimal::from_str(&lexeme)
            .or_else(|_| Decimal::from_scientific(&lexeme))
            .map_err(|_| {
                Error::lex(
                    lex_codes::BAD_NUMBER,
                    format!("invalid number literal '{lexeme}'"),
                    location,
                    &self.source,
                )
            })?;

        Ok(Token::with_literal(
            TokenKind::Number,
            lexeme,
            TokenLiteral::Number(value),
            location,
        ))
    }

    fn single(&mut self, kind: TokenKind, lexeme: &str) -> Token {
        let location = self.here(lexeme.chars().count());
        for _ in 0..lexeme.chars().count() {
            self.advance();
        }
        Token::new(kind, lexeme, location)
    }

    /// Get the next token from the input
    pub fn next_token(&mut self) -> Result<Token> {
        self.skip_whitespace();

        let Some(c) = self.current() else {
            return Ok(Token::eof(self.here(0)));
        };

        match c {
            '(' => Ok(self.single(TokenKind::LeftParen, "(")),
            ')' => Ok(self.single(TokenKind::RightParen, ")")),
            '[' => Ok(self.single(TokenKind::LeftBracket, "[")),
            ']' => Ok(self.single(TokenKind::RightBracket, "]")),
            ',' => Ok(self.single(TokenKind::Comma, ",")),
            '.' => Ok(self.single(TokenKind::Dot, ".")),
            ';' => Ok(self.single(TokenKind::Semicolon, ";")),
            ':' => Ok(self.single(TokenKind::Colon, ":")),
            '+' => Ok(self.single(TokenKind::Plus, "+")),
            '-' => Ok(self.single(TokenKind::Minus, "-")),
            '%' => Ok(self.single(TokenKind::Percent, "%")),
            '^' => Ok(self.single(TokenKind::Caret, "^")),
            '*' => {
                if self.peek() == Some('*') {
                    Ok(self.single(TokenKind::StarStar, "**"))
                } else {
                    Ok(self.single(TokenKind::Star, "*"))
                }
            }
            '/' => Ok(self.single(TokenKind::Slash, "/")),
            '=' => {
                if self.peek() == Some('=') {
                    Ok(self.single(TokenKind::EqualEqual, "=="))
                } else {
                    Err(Error::lex(
                        lex_codes::UNEXPECTED_CHAR,
                        "unexpected character '=' (use '==' or 'equals')",
                        self.here(1),
                        &self.source,
                    ))
                }
            }
            '!' => {
                if self.peek() == Some('=') {
                    Ok(self.single(TokenKind::BangEqual, "!="))
                } else {
                    Err(Error::lex(
                        lex_codes::UNEXPECTED_CHAR,
                        "unexpected character '!' (use '!=' or 'not')",
                        self.here(1),
                        &self.source,
                    ))
                }
            }
            '>' => {
                if self.peek() == Some('=') {
                    Ok(self.single(TokenKind::GreaterEqual, ">="))
                } else {
                    Ok(self.single(TokenKind::Greater, ">"))
                }
            }
            '<' => {
                if self.peek() == Some('=') {
                    Ok(self.single(TokenKind::LessEqual, "<="))
                } else {
                    Ok(self.single(TokenKind::Less, "<"))
                }
            }
            '"' | '\'' => {
                let start = self.here(0);
                self.read_string(c, start)
            }
            _ if c.is_ascii_digit() => self.read_number(),
            _ if c.is_ascii_alphabetic() || c == '_' => {
                let start = self.here(0);
                let ident = self.read_identifier();
                let location = SourceLocation::new(
                    start.line,
                    start.column,
                    start.offset,
                    ident.chars().count(),
                );
                match keyword_kind(&ident) {
                    Some(TokenKind::Boolean) => Ok(Token::with_literal(
                        TokenKind::Boolean,
                        ident.clone(),
                        TokenLiteral::Boolean(ident.eq_ignore_ascii_case("true")),
                        location,
                    )),
                    Some(TokenKind::Null) => Ok(Token::with_literal(
                        TokenKind::Null,
                        ident,
                        TokenLiteral::Null,
                        location,
                    )),
                    Some(kind) => Ok(Token::new(kind, ident, location)),
                    None => Ok(Token::new(TokenKind::Identifier, ident, location)),
                }
            }
            other => Err(Error::lex(
                lex_codes::UNEXPECTED_CHAR,
                format!("unexpected character '{other}'"),
                self.here(1),
                &self.source,
            )),
        }
    }
}

/// Tokenize a source string.
pub fn tokenize(input: &str) -> Result<Vec<Token>> {
    Lexer::new(input).tokenize()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        tokenize(input).unwrap().iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_identifiers_and_keywords() {
        let tokens = tokenize("creditScore at_least 650").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Identifier);
        assert_eq!(tokens[0].lexeme, "creditScore");
        assert_eq!(tokens[1].kind, TokenKind::AtLeast);
        assert_eq!(tokens[2].kind, TokenKind::Number);
        assert_eq!(tokens[3].kind, TokenKind::Eof);
    }

    #[test]
    fn test_keywords_are_case_insensitive() {
        assert_eq!(
            kinds("AGE Between 18 AND 65"),
            vec![
                TokenKind::Identifier,
                TokenKind::Between,
                TokenKind::Number,
                TokenKind::And,
                TokenKind::Number,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_string_literals_both_quotes() {
        let tokens = tokenize(r#""APPROVED" 'pending'"#).unwrap();
        assert_eq!(
            tokens[0].literal,
            Some(TokenLiteral::String("APPROVED".into()))
        );
        assert_eq!(
            tokens[1].literal,
            Some(TokenLiteral::String("pending".into()))
        );
    }

    #[test]
    fn test_string_escapes() {
        let tokens = tokenize(r#""line\nbreak \"q\" back\\slash""#).unwrap();
        assert_eq!(
            tokens[0].literal,
            Some(TokenLiteral::String("line\nbreak \"q\" back\\slash".into()))
        );
    }

    #[test]
    fn test_regex_friendly_double_escapes() {
        // "\\d{3}" should keep the backslash for the regex engine
        let tokens = tokenize(r#""\\d+""#).unwrap();
        assert_eq!(tokens[0].literal, Some(TokenLiteral::String("\\d+".into())));
    }

    #[test]
    fn test_unterminated_string() {
        let err = tokenize(r#""no closing"#).unwrap_err();
        assert_eq!(err.code(), lex_codes::UNTERMINATED_STRING);
    }

    #[test]
    fn test_numbers() {
        let tokens = tokenize("123 45.67 1.5e3").unwrap();
        assert_eq!(
            tokens[0].literal,
            Some(TokenLiteral::Number(Decimal::from(123)))
        );
        assert_eq!(
            tokens[1].literal,
            Some(TokenLiteral::Number(Decimal::from_str("45.67").unwrap()))
        );
        assert_eq!(
            tokens[2].literal,
            Some(TokenLiteral::Number(Decimal::from(1500)))
        );
    }

    #[test]
    fn test_decimal_is_exact() {
        let tokens = tokenize("0.1").unwrap();
        let Some(TokenLiteral::Number(n)) = &tokens[0].literal else {
            panic!("expected number");
        };
        assert_eq!(n.to_string(), "0.1");
    }

    #[test]
    fn test_operators() {
        assert_eq!(
            kinds("+ - * / % ^ ** == != > < >= <="),
            vec![
                TokenKind::Plus,
                TokenKind::Minus,
                TokenKind::Star,
                TokenKind::Slash,
                TokenKind::Percent,
                TokenKind::Caret,
                TokenKind::StarStar,
                TokenKind::EqualEqual,
                TokenKind::BangEqual,
                TokenKind::Greater,
                TokenKind::Less,
                TokenKind::GreaterEqual,
                TokenKind::LessEqual,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_booleans_and_null() {
        let tokens = tokenize("true false null").unwrap();
        assert_eq!(tokens[0].literal, Some(TokenLiteral::Boolean(true)));
        assert_eq!(tokens[1].literal, Some(TokenLiteral::Boolean(false)));
        assert_eq!(tokens[2].literal, Some(TokenLiteral::Null));
    }

    #[test]
    fn test_locations_track_lines_and_columns() {
        let tokens = tokenize("a\n  bb").unwrap();
        assert_eq!(tokens[0].location.line, 1);
        assert_eq!(tokens[0].location.column, 1);
        assert_eq!(tokens[1].location.line, 2);
        assert_eq!(tokens[1].location.column, 3);
        assert_eq!(tokens[1].location.length, 2);
    }

    #[test]
    fn test_unexpected_char() {
        let err = tokenize("a @ b").unwrap_err();
        assert_eq!(err.code(), lex_codes::UNEXPECTED_CHAR);
        assert_eq!(err.location().unwrap().column, 3);
    }

    #[test]
    fn test_foreach_statement() {
        assert_eq!(
            kinds("forEach x in items: add x to total"),
            vec![
                TokenKind::ForEach,
                TokenKind::Identifier,
                TokenKind::In,
                TokenKind::Identifier,
                TokenKind::Colon,
                TokenKind::Add,
                TokenKind::Identifier,
                TokenKind::To,
                TokenKind::Identifier,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_property_path_and_index() {
        assert_eq!(
            kinds("applicant.address.city items[0]"),
            vec![
                TokenKind::Identifier,
                TokenKind::Dot,
                TokenKind::Identifier,
                TokenKind::Dot,
                TokenKind::Identifier,
                TokenKind::Identifier,
                TokenKind::LeftBracket,
                TokenKind::Number,
                TokenKind::RightBracket,
                TokenKind::Eof,
            ]
        );
    }
}
