//! Expression parsing methods

use super::Parser;
use crate::ast::{AggregateOp, BinaryOp, Expression, LiteralValue, RestMethod, UnaryOp};
use crate::error::{parse_codes, Error, Result};
use crate::token::{TokenKind, TokenLiteral};

impl Parser {
    /// Parse a full expression (entry point for action right-hand sides).
    pub(crate) fn parse_expression(&mut self) -> Result<Expression> {
        self.enter()?;
        let expr = self.parse_expr_or();
        self.exit();
        expr
    }

    fn parse_expr_or(&mut self) -> Result<Expression> {
        let mut left = self.parse_expr_and()?;
        while self.check(TokenKind::Or) {
            let location = self.location();
            self.advance();
            let right = self.parse_expr_and()?;
            left = Expression::Binary {
                left: Box::new(left),
                op: BinaryOp::Or,
                right: Box::new(right),
                location,
            };
        }
        Ok(left)
    }

    fn parse_expr_and(&mut self) -> Result<Expression> {
        let mut left = self.parse_equality()?;
        while self.check(TokenKind::And) {
            let location = self.location();
            self.advance();
            let right = self.parse_equality()?;
            left = Expression::Binary {
                left: Box::new(left),
                op: BinaryOp::And,
                right: Box::new(right),
                location,
            };
        }
        Ok(left)
    }

    fn parse_equality(&mut self) -> Result<Expression> {
        let mut left = self.parse_relational()?;
        loop {
            let op = match self.current_kind() {
                TokenKind::EqualEqual | TokenKind::Equals => BinaryOp::Equals,
                TokenKind::BangEqual | TokenKind::NotEquals => BinaryOp::NotEquals,
                _ => break,
            };
            let location = self.location();
            self.advance();
            let right = self.parse_relational()?;
            left = Expression::Binary {
                left: Box::new(left),
                op,
                right: Box::new(right),
                location,
            };
        }
        Ok(left)
    }

    fn parse_relational(&mut self) -> Result<Expression> {
        let mut left = self.parse_additive()?;
        loop {
            let op = match self.current_kind() {
                TokenKind::Greater | TokenKind::GreaterThan => BinaryOp::GreaterThan,
                TokenKind::Less | TokenKind::LessThan => BinaryOp::LessThan,
                TokenKind::GreaterEqual | TokenKind::AtLeast => BinaryOp::AtLeast,
                TokenKind::LessEqual | TokenKind::AtMost => BinaryOp::AtMost,
                TokenKind::Contains => BinaryOp::Contains,
                TokenKind::NotContains => BinaryOp::NotContains,
                TokenKind::StartsWith => BinaryOp::StartsWith,
                TokenKind::EndsWith => BinaryOp::EndsWith,
                TokenKind::Matches => BinaryOp::Matches,
                TokenKind::NotMatches => BinaryOp::NotMatches,
                TokenKind::InList => BinaryOp::InList,
                TokenKind::NotInList => BinaryOp::NotInList,
                _ => break,
            };
            let location = self.location();
            self.advance();
            let right = self.parse_additive()?;
            left = Expression::Binary {
                left: Box::new(left),
                op,
                right: Box::new(right),
                location,
            };
        }
        Ok(left)
    }

    /// Additive level; also the operand entry used by the condition parser,
    /// so that `and`/`or` and comparison keywords stay visible to it.
    pub(crate) fn parse_additive(&mut self) -> Result<Expression> {
        self.enter()?;
        let result = self.parse_additive_inner();
        self.exit();
        result
    }

    fn parse_additive_inner(&mut self) -> Result<Expression> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match self.current_kind() {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Subtract,
                _ => break,
            };
            let location = self.location();
            self.advance();
            let right = self.parse_multiplicative()?;
            left = Expression::Binary {
                left: Box::new(left),
                op,
                right: Box::new(right),
                location,
            };
        }
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> Result<Expression> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.current_kind() {
                TokenKind::Star => BinaryOp::Multiply,
                TokenKind::Slash => BinaryOp::Divide,
                TokenKind::Percent => BinaryOp::Modulo,
                _ => break,
            };
            let location = self.location();
            self.advance();
            let right = self.parse_unary()?;
            left = Expression::Binary {
                left: Box::new(left),
                op,
                right: Box::new(right),
                location,
            };
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expression> {
        let op = match self.current_kind() {
            TokenKind::Not => Some(UnaryOp::Not),
            TokenKind::Minus => Some(UnaryOp::Negate),
            TokenKind::Plus => Some(UnaryOp::Positive),
            TokenKind::Exists => Some(UnaryOp::Exists),
            TokenKind::IsNull => Some(UnaryOp::IsNull),
            TokenKind::IsNotNull => Some(UnaryOp::IsNotNull),
            TokenKind::IsNumber => Some(UnaryOp::IsNumber),
            TokenKind::IsString => Some(UnaryOp::IsString),
            TokenKind::IsBoolean => Some(UnaryOp::IsBoolean),
            TokenKind::IsList => Some(UnaryOp::IsList),
            _ => None,
        };

        if let Some(op) = op {
            let location = self.location();
            self.advance();
            self.enter()?;
            let operand = self.parse_unary();
            self.exit();
            return Ok(Expression::Unary {
                op,
                operand: Box::new(operand?),
                location,
            });
        }

        self.parse_power()
    }

    fn parse_power(&mut self) -> Result<Expression> {
        let left = self.parse_primary()?;
        if self.check_any(&[TokenKind::StarStar, TokenKind::Caret]) {
            let location = self.location();
            self.advance();
            // Right-associative: recurse through unary so `2 ** 3 ** 2`
            // parses as `2 ** (3 ** 2)`
            let right = self.parse_unary()?;
            return Ok(Expression::Binary {
                left: Box::new(left),
                op: BinaryOp::Power,
                right: Box::new(right),
                location,
            });
        }
        Ok(left)
    }

    fn parse_primary(&mut self) -> Result<Expression> {
        let location = self.location();
        match self.current_kind() {
            TokenKind::Number | TokenKind::String | TokenKind::Boolean | TokenKind::Null => {
                let token = self.advance();
                let value = match token.literal {
                    Some(TokenLiteral::Number(n)) => LiteralValue::Number(n),
                    Some(TokenLiteral::String(s)) => LiteralValue::String(s),
                    Some(TokenLiteral::Boolean(b)) => LiteralValue::Boolean(b),
                    Some(TokenLiteral::Null) | None => LiteralValue::Null,
                };
                Ok(Expression::Literal { value, location })
            }
            TokenKind::LeftBracket => self.parse_array(),
            TokenKind::LeftParen => {
                self.advance();
                let expr = self.parse_expression()?;
                self.expect(TokenKind::RightParen, "')'")?;
                Ok(expr)
            }
            TokenKind::Identifier => {
                let name = self.advance().lexeme;
                if self.check(TokenKind::LeftParen) {
                    self.parse_function_call(name, location)
                } else {
                    self.parse_variable(name, location)
                }
            }
            _ => {
                let token = self.current();
                Err(Error::parse_with_suggestions(
                    parse_codes::INVALID_EXPRESSION,
                    format!("expected an expression, found '{}'", token.lexeme),
                    token.location,
                    vec![
                        "a literal: 650, \"APPROVED\", true, null".into(),
                        "a variable: creditScore, applicant.income".into(),
                        "a function call: round(ratio, 2)".into(),
                    ],
                ))
            }
        }
    }

    fn parse_array(&mut self) -> Result<Expression> {
        let location = self.location();
        self.expect(TokenKind::LeftBracket, "'['")?;

        let mut elements = Vec::new();
        if !self.check(TokenKind::RightBracket) {
            loop {
                elements.push(self.parse_expression()?);
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(TokenKind::RightBracket, "']'")?;

        // Fully-literal arrays materialise as a literal list value
        let all_literal = elements
            .iter()
            .all(|e| matches!(e, Expression::Literal { .. }));
        if all_literal {
            let values = elements
                .into_iter()
                .map(|e| match e {
                    Expression::Literal { value, .. } => value,
                    _ => unreachable!(),
                })
                .collect();
            return Ok(Expression::Literal {
                value: LiteralValue::List(values),
                location,
            });
        }

        Ok(Expression::Array { elements, location })
    }

    fn parse_variable(
        &mut self,
        name: String,
        location: crate::location::SourceLocation,
    ) -> Result<Expression> {
        let mut property_path = Vec::new();
        while self.check(TokenKind::Dot) {
            self.advance();
            let part = self.expect_identifier("a property name after '.'")?;
            property_path.push(part.lexeme);
        }

        let index = if self.eat(TokenKind::LeftBracket) {
            let index_expr = self.parse_expression()?;
            self.expect(TokenKind::RightBracket, "']'")?;
            Some(Box::new(index_expr))
        } else {
            None
        };

        Ok(Expression::Variable {
            name,
            property_path,
            index,
            location,
        })
    }

    fn parse_function_call(
        &mut self,
        name: String,
        location: crate::location::SourceLocation,
    ) -> Result<Expression> {
        self.expect(TokenKind::LeftParen, "'('")?;
        let mut args = Vec::new();
        if !self.check(TokenKind::RightParen) {
            loop {
                args.push(self.parse_expression()?);
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(TokenKind::RightParen, "')'")?;

        // N-ary arithmetic and external-call functions reify to their own
        // node types; everything else stays a catalogue call.
        if let Some(op) = AggregateOp::from_function_name(&name) {
            if args.is_empty() {
                return Err(Error::parse(
                    parse_codes::MISSING_OPERAND,
                    format!("'{name}' requires at least one argument"),
                    location,
                ));
            }
            return Ok(Expression::Arithmetic {
                op,
                operands: args,
                location,
            });
        }

        if let Some(method) = RestMethod::from_function_name(&name) {
            return self.build_rest_call(method, args, location);
        }

        if name == "json_get" {
            if args.len() != 2 {
                return Err(Error::parse(
                    parse_codes::MISSING_OPERAND,
                    "'json_get' requires (value, path)",
                    location,
                ));
            }
            let mut iter = args.into_iter();
            let source = iter.next().unwrap();
            let path = iter.next().unwrap();
            return Ok(Expression::JsonPath {
                source: Box::new(source),
                path: Box::new(path),
                location,
            });
        }

        Ok(Expression::FunctionCall {
            name,
            args,
            location,
        })
    }

    fn build_rest_call(
        &mut self,
        method: RestMethod,
        args: Vec<Expression>,
        location: crate::location::SourceLocation,
    ) -> Result<Expression> {
        if args.is_empty() {
            return Err(Error::parse(
                parse_codes::MISSING_OPERAND,
                format!("'{}' requires a URL argument", method.function_name()),
                location,
            ));
        }
        let mut iter = args.into_iter();
        let url = iter.next().unwrap();
        // Literal null placeholders mean "argument not provided"
        let not_null = |e: Expression| match e {
            Expression::Literal {
                value: LiteralValue::Null,
                ..
            } => None,
            other => Some(other),
        };
        let body = iter.next().and_then(not_null);
        let headers = iter.next().and_then(not_null);
        let timeout_ms = match iter.next() {
            None => None,
            Some(Expression::Literal {
                value: LiteralValue::Number(n),
                ..
            }) => Some(u64::try_from(n.trunc().mantissa()).unwrap_or(0)),
            Some(other) => {
                return Err(Error::parse(
                    parse_codes::INVALID_EXPRESSION,
                    "REST call timeout must be a number literal",
                    other.location(),
                ))
            }
        };

        Ok(Expression::RestCall {
            method,
            url: Box::new(url),
            body: body.map(Box::new),
            headers: headers.map(Box::new),
            timeout_ms,
            location,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn parse(source: &str) -> Expression {
        Parser::parse_expression_source(source).unwrap()
    }

    #[test]
    fn test_precedence_multiplication_binds_tighter() {
        // a + b * c == a + (b * c)
        assert_eq!(parse("a + b * c"), parse("a + (b * c)"));
        assert_ne!(parse("a + b * c"), parse("(a + b) * c"));
    }

    #[test]
    fn test_precedence_additive_vs_relational() {
        assert_eq!(parse("a + b > c"), parse("(a + b) > c"));
    }

    #[test]
    fn test_power_is_right_associative() {
        assert_eq!(parse("2 ** 3 ** 2"), parse("2 ** (3 ** 2)"));
        assert_eq!(parse("2 ^ 3 ^ 2"), parse("2 ^ (3 ^ 2)"));
    }

    #[test]
    fn test_left_associativity() {
        assert_eq!(parse("a - b - c"), parse("(a - b) - c"));
        assert_eq!(parse("a / b / c"), parse("(a / b) / c"));
    }

    #[test]
    fn test_unary_binds_tighter_than_multiplicative() {
        assert_eq!(parse("-a * b"), parse("(-a) * b"));
    }

    #[test]
    fn test_variable_with_path_and_index() {
        let expr = parse("applicant.accounts[0]");
        let Expression::Variable {
            name,
            property_path,
            index,
            ..
        } = expr
        else {
            panic!("expected variable");
        };
        assert_eq!(name, "applicant");
        assert_eq!(property_path, vec!["accounts"]);
        assert!(index.is_some());
    }

    #[test]
    fn test_literal_array_materialises() {
        let expr = parse("[1, 2, 3]");
        let Expression::Literal {
            value: LiteralValue::List(values),
            ..
        } = expr
        else {
            panic!("expected literal list");
        };
        assert_eq!(values.len(), 3);
        assert_eq!(values[0], LiteralValue::Number(Decimal::from(1)));
    }

    #[test]
    fn test_mixed_array_stays_expression() {
        let expr = parse("[1, x, 3]");
        assert!(matches!(expr, Expression::Array { .. }));
    }

    #[test]
    fn test_function_call() {
        let expr = parse("round(ratio, 2)");
        let Expression::FunctionCall { name, args, .. } = expr else {
            panic!("expected function call");
        };
        assert_eq!(name, "round");
        assert_eq!(args.len(), 2);
    }

    #[test]
    fn test_sum_reifies_to_arithmetic() {
        let expr = parse("sum(a, b, c)");
        let Expression::Arithmetic { op, operands, .. } = expr else {
            panic!("expected arithmetic");
        };
        assert_eq!(op, AggregateOp::Sum);
        assert_eq!(operands.len(), 3);
    }

    #[test]
    fn test_rest_call_reifies() {
        let expr = parse("rest_get(\"https://api.example.com/score\", null, null, 2500)");
        let Expression::RestCall {
            method, timeout_ms, ..
        } = expr
        else {
            panic!("expected rest call");
        };
        assert_eq!(method, RestMethod::Get);
        assert_eq!(timeout_ms, Some(2500));
    }

    #[test]
    fn test_json_get_reifies() {
        let expr = parse("json_get(payload, \"$.score\")");
        assert!(matches!(expr, Expression::JsonPath { .. }));
    }

    #[test]
    fn test_missing_operand() {
        let err = Parser::parse_expression_source("a +").unwrap_err();
        assert_eq!(err.code(), parse_codes::INVALID_EXPRESSION);
    }

    #[test]
    fn test_keyword_comparisons_in_expressions() {
        let expr = parse("creditScore at_least 650");
        let Expression::Binary { op, .. } = expr else {
            panic!("expected binary");
        };
        assert_eq!(op, BinaryOp::AtLeast);
    }
}
