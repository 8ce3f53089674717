//! Recursive descent parsers for the rule DSL
//!
//! Three parsers (expression, condition, action) share one token cursor on a
//! single [`Parser`] struct; the method groups live in sibling modules. The
//! condition parser delegates operand parsing to the expression parser and
//! re-enters itself for parenthesised sub-conditions.
//!
//! Precedence (lowest to highest):
//! 1. or
//! 2. and
//! 3. not
//! 4. equality (equals, ==, not_equals, !=)
//! 5. relational (>, <, >=, <=, at_least, at_most, string and membership ops)
//! 6. additive (+, -)
//! 7. multiplicative (*, /, %)
//! 8. unary (not, -, +, exists, is_null, ...)
//! 9. power (**, ^) - right-associative

mod action;
mod condition;
mod expression;

use crate::ast::{Action, Condition, Expression};
use crate::error::{parse_codes, Error, Result};
use crate::lexer;
use crate::location::SourceLocation;
use crate::token::{Token, TokenKind};

const MAX_RECURSION_DEPTH: usize = 200;

/// Shared cursor over a token stream
pub struct Parser {
    tokens: Vec<Token>,
    position: usize,
    depth: usize,
}

impl Parser {
    /// Create a parser over the given source string
    pub fn new(source: &str) -> Result<Self> {
        Ok(Self {
            tokens: lexer::tokenize(source)?,
            position: 0,
            depth: 0,
        })
    }

    /// Parse the source as a single condition, requiring full consumption.
    pub fn parse_condition_source(source: &str) -> Result<Condition> {
        let mut parser = Self::new(source)?;
        let condition = parser.parse_condition()?;
        parser.expect_eof()?;
        Ok(condition)
    }

    /// Parse the source as one or more `;`-separated actions.
    pub fn parse_actions_source(source: &str) -> Result<Vec<Action>> {
        let mut parser = Self::new(source)?;
        let actions = parser.parse_action_list(&[])?;
        parser.expect_eof()?;
        Ok(actions)
    }

    /// Parse the source as a single expression, requiring full consumption.
    pub fn parse_expression_source(source: &str) -> Result<Expression> {
        let mut parser = Self::new(source)?;
        let expression = parser.parse_expression()?;
        parser.expect_eof()?;
        Ok(expression)
    }

    // ------------------------------------------------------------------
    // Cursor primitives
    // ------------------------------------------------------------------

    pub(crate) fn current(&self) -> &Token {
        &self.tokens[self.position.min(self.tokens.len() - 1)]
    }

    pub(crate) fn current_kind(&self) -> TokenKind {
        self.current().kind
    }

    pub(crate) fn location(&self) -> SourceLocation {
        self.current().location
    }

    pub(crate) fn check(&self, kind: TokenKind) -> bool {
        self.current_kind() == kind
    }

    pub(crate) fn check_any(&self, kinds: &[TokenKind]) -> bool {
        kinds.contains(&self.current_kind())
    }

    pub(crate) fn at_end(&self) -> bool {
        self.current_kind() == TokenKind::Eof
    }

    pub(crate) fn advance(&mut self) -> Token {
        let token = self.current().clone();
        if !self.at_end() {
            self.position += 1;
        }
        token
    }

    /// Consume the current token if it matches, returning whether it did.
    pub(crate) fn eat(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub(crate) fn expect(&mut self, kind: TokenKind, what: &str) -> Result<Token> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            let token = self.current();
            Err(Error::parse(
                parse_codes::UNEXPECTED_TOKEN,
                format!("expected {what}, found '{}'", describe(token)),
                token.location,
            ))
        }
    }

    pub(crate) fn expect_identifier(&mut self, what: &str) -> Result<Token> {
        self.expect(TokenKind::Identifier, what)
    }

    fn expect_eof(&mut self) -> Result<()> {
        if self.at_end() {
            Ok(())
        } else {
            let token = self.current();
            Err(Error::parse(
                parse_codes::UNEXPECTED_TOKEN,
                format!("unexpected trailing input '{}'", describe(token)),
                token.location,
            ))
        }
    }

    /// Save the cursor for speculative parsing.
    pub(crate) fn checkpoint(&self) -> (usize, usize) {
        (self.position, self.depth)
    }

    /// Rewind to a saved checkpoint after a failed speculative parse.
    pub(crate) fn restore(&mut self, checkpoint: (usize, usize)) {
        self.position = checkpoint.0;
        self.depth = checkpoint.1;
    }

    pub(crate) fn enter(&mut self) -> Result<()> {
        if self.depth >= MAX_RECURSION_DEPTH {
            return Err(Error::parse(
                parse_codes::TOO_DEEP,
                format!("expression too deeply nested (max depth: {MAX_RECURSION_DEPTH})"),
                self.location(),
            ));
        }
        self.depth += 1;
        Ok(())
    }

    pub(crate) fn exit(&mut self) {
        self.depth -= 1;
    }
}

fn describe(token: &Token) -> String {
    if token.kind == TokenKind::Eof {
        "end of input".to_string()
    } else {
        token.lexeme.clone()
    }
}
