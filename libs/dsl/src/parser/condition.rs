//! Condition parsing methods

use super::Parser;
use crate::ast::{ComparisonOp, Condition, Expression};
use crate::error::{parse_codes, Error, Result};
use crate::token::TokenKind;

impl Parser {
    /// Parse a full condition (entry point for `when` strings).
    pub(crate) fn parse_condition(&mut self) -> Result<Condition> {
        self.enter()?;
        let condition = self.parse_cond_or();
        self.exit();
        condition
    }

    fn parse_cond_or(&mut self) -> Result<Condition> {
        let mut left = self.parse_cond_and()?;
        while self.check(TokenKind::Or) {
            let location = self.location();
            self.advance();
            let right = self.parse_cond_and()?;
            // Flatten chains of `or` into one n-ary node
            left = match left {
                Condition::Logical {
                    op: crate::ast::LogicalOp::Or,
                    mut operands,
                    location,
                } => {
                    operands.push(right);
                    Condition::Logical {
                        op: crate::ast::LogicalOp::Or,
                        operands,
                        location,
                    }
                }
                other => Condition::Logical {
                    op: crate::ast::LogicalOp::Or,
                    operands: vec![other, right],
                    location,
                },
            };
        }
        Ok(left)
    }

    fn parse_cond_and(&mut self) -> Result<Condition> {
        let mut left = self.parse_cond_not()?;
        while self.check(TokenKind::And) {
            let location = self.location();
            self.advance();
            let right = self.parse_cond_not()?;
            left = match left {
                Condition::Logical {
                    op: crate::ast::LogicalOp::And,
                    mut operands,
                    location,
                } => {
                    operands.push(right);
                    Condition::Logical {
                        op: crate::ast::LogicalOp::And,
                        operands,
                        location,
                    }
                }
                other => Condition::Logical {
                    op: crate::ast::LogicalOp::And,
                    operands: vec![other, right],
                    location,
                },
            };
        }
        Ok(left)
    }

    fn parse_cond_not(&mut self) -> Result<Condition> {
        if self.check(TokenKind::Not) {
            let location = self.location();
            self.advance();
            self.enter()?;
            let operand = self.parse_cond_not();
            self.exit();
            return Ok(Condition::Logical {
                op: crate::ast::LogicalOp::Not,
                operands: vec![operand?],
                location,
            });
        }
        self.parse_cond_primary()
    }

    fn parse_cond_primary(&mut self) -> Result<Condition> {
        if self.check(TokenKind::LeftParen) {
            // Distinguish a parenthesised sub-condition from a parenthesised
            // arithmetic operand like `(a + b) > c`: try the sub-condition
            // first and fall back to a comparison on failure.
            let checkpoint = self.checkpoint();
            self.advance();
            if let Ok(condition) = self.parse_condition() {
                if self.eat(TokenKind::RightParen) {
                    // `(cond)` followed by an operator means the parentheses
                    // grouped an expression operand instead
                    if self.condition_ends_here() {
                        return Ok(condition);
                    }
                }
            }
            self.restore(checkpoint);
        }
        self.parse_comparison()
    }

    /// After a closing `)`, only these tokens continue or end a condition;
    /// anything else means the parentheses belonged to an expression.
    fn condition_ends_here(&self) -> bool {
        matches!(
            self.current_kind(),
            TokenKind::Eof
                | TokenKind::And
                | TokenKind::Or
                | TokenKind::RightParen
                | TokenKind::Then
                | TokenKind::Else
                | TokenKind::Semicolon
                | TokenKind::Colon
                | TokenKind::Do
                | TokenKind::While
        )
    }

    /// comparison = expression [ compOp expression [ "and" expression ] ]
    fn parse_comparison(&mut self) -> Result<Condition> {
        let location = self.location();
        let left = self.parse_additive()?;

        let Some(op) = self.peek_comparison_op() else {
            // Bare expression condition: truthy coercion at evaluation time
            return Ok(Condition::Expression {
                expr: left,
                location,
            });
        };
        let op_location = self.location();
        self.advance();

        if !op.is_binary() {
            return Ok(Condition::Comparison {
                left,
                op,
                right: None,
                range_end: None,
                location,
            });
        }

        let right = if self.at_end() {
            return Err(Error::parse(
                parse_codes::MISSING_OPERAND,
                format!("operator '{}' requires a right operand", op.keyword()),
                op_location,
            ));
        } else {
            self.parse_additive()?
        };

        let range_end = if op.is_range() {
            if !self.eat(TokenKind::And) {
                return Err(Error::parse_with_suggestions(
                    parse_codes::BETWEEN_MISSING_AND,
                    format!("'{}' requires 'and' with an upper bound", op.keyword()),
                    self.location(),
                    vec![format!("age {} 18 and 65", op.keyword())],
                ));
            }
            Some(self.parse_additive()?)
        } else {
            None
        };

        Ok(Condition::Comparison {
            left,
            op,
            right: Some(right),
            range_end,
            location,
        })
    }

    fn peek_comparison_op(&self) -> Option<ComparisonOp> {
        let op = match self.current_kind() {
            TokenKind::EqualEqual | TokenKind::Equals => ComparisonOp::Equals,
            TokenKind::BangEqual | TokenKind::NotEquals => ComparisonOp::NotEquals,
            TokenKind::Greater | TokenKind::GreaterThan => ComparisonOp::GreaterThan,
            TokenKind::Less | TokenKind::LessThan => ComparisonOp::LessThan,
            TokenKind::GreaterEqual | TokenKind::AtLeast => ComparisonOp::AtLeast,
            TokenKind::LessEqual | TokenKind::AtMost => ComparisonOp::AtMost,
            TokenKind::Contains => ComparisonOp::Contains,
            TokenKind::NotContains => ComparisonOp::NotContains,
            TokenKind::StartsWith => ComparisonOp::StartsWith,
            TokenKind::EndsWith => ComparisonOp::EndsWith,
            TokenKind::Matches => ComparisonOp::Matches,
            TokenKind::NotMatches => ComparisonOp::NotMatches,
            TokenKind::InList => ComparisonOp::InList,
            TokenKind::NotInList => ComparisonOp::NotInList,
            TokenKind::Between => ComparisonOp::Between,
            TokenKind::NotBetween => ComparisonOp::NotBetween,
            TokenKind::AgeAtLeast => ComparisonOp::AgeAtLeast,
            TokenKind::AgeLessThan => ComparisonOp::AgeLessThan,
            TokenKind::Exists => ComparisonOp::Exists,
            TokenKind::IsNull => ComparisonOp::IsNull,
            TokenKind::IsNotNull => ComparisonOp::IsNotNull,
            TokenKind::IsEmpty => ComparisonOp::IsEmpty,
            TokenKind::IsNotEmpty => ComparisonOp::IsNotEmpty,
            TokenKind::IsNumeric => ComparisonOp::IsNumeric,
            TokenKind::IsEmail => ComparisonOp::IsEmail,
            TokenKind::IsPhone => ComparisonOp::IsPhone,
            TokenKind::IsDate => ComparisonOp::IsDate,
            TokenKind::IsPositive => ComparisonOp::IsPositive,
            TokenKind::IsNegative => ComparisonOp::IsNegative,
            TokenKind::IsZero => ComparisonOp::IsZero,
            TokenKind::IsPercentage => ComparisonOp::IsPercentage,
            TokenKind::IsCurrency => ComparisonOp::IsCurrency,
            TokenKind::IsCreditScore => ComparisonOp::IsCreditScore,
            TokenKind::IsSsn => ComparisonOp::IsSsn,
            TokenKind::IsAccountNumber => ComparisonOp::IsAccountNumber,
            TokenKind::IsRoutingNumber => ComparisonOp::IsRoutingNumber,
            TokenKind::IsBusinessDay => ComparisonOp::IsBusinessDay,
            TokenKind::IsWeekend => ComparisonOp::IsWeekend,
            _ => return None,
        };
        Some(op)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::LogicalOp;

    fn parse(source: &str) -> Condition {
        Parser::parse_condition_source(source).unwrap()
    }

    #[test]
    fn test_simple_comparison() {
        let cond = parse("creditScore at_least 650");
        let Condition::Comparison {
            op, right, range_end, ..
        } = cond
        else {
            panic!("expected comparison");
        };
        assert_eq!(op, ComparisonOp::AtLeast);
        assert!(right.is_some());
        assert!(range_end.is_none());
    }

    #[test]
    fn test_symbol_aliases() {
        let cond = parse("annualIncome >= 40000");
        let Condition::Comparison { op, .. } = cond else {
            panic!("expected comparison");
        };
        assert_eq!(op, ComparisonOp::AtLeast);
    }

    #[test]
    fn test_between_requires_and() {
        let cond = parse("age between 18 and 65");
        let Condition::Comparison {
            op, right, range_end, ..
        } = cond
        else {
            panic!("expected comparison");
        };
        assert_eq!(op, ComparisonOp::Between);
        assert!(right.is_some());
        assert!(range_end.is_some());

        let err = Parser::parse_condition_source("age between 18").unwrap_err();
        assert_eq!(err.code(), parse_codes::BETWEEN_MISSING_AND);
    }

    #[test]
    fn test_between_inside_logical_and() {
        // The inner `and` belongs to between; the outer one joins conditions
        let cond = parse("age between 18 and 65 and creditScore > 600");
        let Condition::Logical { op, operands, .. } = cond else {
            panic!("expected logical");
        };
        assert_eq!(op, LogicalOp::And);
        assert_eq!(operands.len(), 2);
        assert!(matches!(
            operands[0],
            Condition::Comparison {
                op: ComparisonOp::Between,
                ..
            }
        ));
    }

    #[test]
    fn test_unary_validator_has_no_right() {
        let cond = parse("email is_email");
        let Condition::Comparison { op, right, .. } = cond else {
            panic!("expected comparison");
        };
        assert_eq!(op, ComparisonOp::IsEmail);
        assert!(right.is_none());
    }

    #[test]
    fn test_logical_chain_flattens() {
        let cond = parse("a > 1 or b > 2 or c > 3");
        let Condition::Logical { op, operands, .. } = cond else {
            panic!("expected logical");
        };
        assert_eq!(op, LogicalOp::Or);
        assert_eq!(operands.len(), 3);
    }

    #[test]
    fn test_not() {
        let cond = parse("not (a > 1)");
        let Condition::Logical { op, operands, .. } = cond else {
            panic!("expected logical");
        };
        assert_eq!(op, LogicalOp::Not);
        assert_eq!(operands.len(), 1);
    }

    #[test]
    fn test_and_binds_tighter_than_or() {
        let cond = parse("a > 1 or b > 2 and c > 3");
        let Condition::Logical { op, operands, .. } = cond else {
            panic!("expected logical");
        };
        assert_eq!(op, LogicalOp::Or);
        assert_eq!(operands.len(), 2);
        assert!(matches!(
            &operands[1],
            Condition::Logical {
                op: LogicalOp::And,
                ..
            }
        ));
    }

    #[test]
    fn test_parenthesised_sub_condition() {
        let cond = parse("(a > 1 or b > 2) and c > 3");
        let Condition::Logical { op, operands, .. } = cond else {
            panic!("expected logical");
        };
        assert_eq!(op, LogicalOp::And);
        assert!(matches!(
            &operands[0],
            Condition::Logical {
                op: LogicalOp::Or,
                ..
            }
        ));
    }

    #[test]
    fn test_parenthesised_expression_operand() {
        let cond = parse("(a + b) > c");
        assert!(matches!(
            cond,
            Condition::Comparison {
                op: ComparisonOp::GreaterThan,
                ..
            }
        ));
    }

    #[test]
    fn test_bare_expression_condition() {
        let cond = parse("\"true\"");
        assert!(matches!(cond, Condition::Expression { .. }));
    }

    #[test]
    fn test_age_validators_take_right_operand() {
        let cond = parse("birthDate age_at_least 18");
        let Condition::Comparison { op, right, .. } = cond else {
            panic!("expected comparison");
        };
        assert_eq!(op, ComparisonOp::AgeAtLeast);
        assert!(right.is_some());
    }
}
