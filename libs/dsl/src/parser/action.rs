//! Action parsing methods

use super::Parser;
use crate::ast::{Action, ArithmeticActionOp, Expression, ListActionOp};
use crate::error::{parse_codes, Error, Result};
use crate::token::{TokenKind, TokenLiteral};

impl Parser {
    /// Parse a `;`-separated action list, stopping at any of `terminators`
    /// (or end of input).
    pub(crate) fn parse_action_list(&mut self, terminators: &[TokenKind]) -> Result<Vec<Action>> {
        let mut actions = vec![self.parse_action()?];
        while self.eat(TokenKind::Semicolon) {
            if self.at_end() || self.check_any(terminators) {
                break;
            }
            actions.push(self.parse_action()?);
        }
        Ok(actions)
    }

    /// Parse a single action statement.
    pub(crate) fn parse_action(&mut self) -> Result<Action> {
        let location = self.location();
        match self.current_kind() {
            TokenKind::Set => {
                self.advance();
                let variable = self.expect_identifier("a variable name after 'set'")?;
                self.expect(TokenKind::To, "'to'")?;
                let value = self.parse_expression()?;
                Ok(Action::Assignment {
                    variable: variable.lexeme,
                    value,
                    location,
                })
            }
            TokenKind::Calculate => {
                self.advance();
                let variable = self.expect_identifier("a variable name after 'calculate'")?;
                self.expect(TokenKind::As, "'as'")?;
                let expression = self.parse_expression()?;
                Ok(Action::Calculate {
                    variable: variable.lexeme,
                    expression,
                    location,
                })
            }
            TokenKind::Run => {
                self.advance();
                let variable = self.expect_identifier("a variable name after 'run'")?;
                self.expect(TokenKind::As, "'as'")?;
                let expression = self.parse_expression()?;
                Ok(Action::Run {
                    variable: variable.lexeme,
                    expression,
                    location,
                })
            }
            TokenKind::Add => {
                self.advance();
                let operand = self.parse_expression()?;
                self.expect(TokenKind::To, "'to'")?;
                let variable = self.expect_identifier("a target variable")?;
                Ok(Action::Arithmetic {
                    op: ArithmeticActionOp::Add,
                    variable: variable.lexeme,
                    operand,
                    location,
                })
            }
            TokenKind::Subtract => {
                self.advance();
                let operand = self.parse_expression()?;
                self.expect(TokenKind::From, "'from'")?;
                let variable = self.expect_identifier("a target variable")?;
                Ok(Action::Arithmetic {
                    op: ArithmeticActionOp::Subtract,
                    variable: variable.lexeme,
                    operand,
                    location,
                })
            }
            TokenKind::Multiply | TokenKind::Divide => {
                let op = if self.current_kind() == TokenKind::Multiply {
                    ArithmeticActionOp::Multiply
                } else {
                    ArithmeticActionOp::Divide
                };
                self.advance();
                let variable = self.expect_identifier("a target variable")?;
                self.expect(TokenKind::By, "'by'")?;
                let operand = self.parse_expression()?;
                Ok(Action::Arithmetic {
                    op,
                    variable: variable.lexeme,
                    operand,
                    location,
                })
            }
            TokenKind::Append | TokenKind::Prepend => {
                let op = if self.current_kind() == TokenKind::Append {
                    ListActionOp::Append
                } else {
                    ListActionOp::Prepend
                };
                self.advance();
                let value = self.parse_expression()?;
                self.expect(TokenKind::To, "'to'")?;
                let list = self.expect_identifier("a list variable")?;
                Ok(Action::List {
                    op,
                    value,
                    list: list.lexeme,
                    location,
                })
            }
            TokenKind::Remove => {
                self.advance();
                let value = self.parse_expression()?;
                self.expect(TokenKind::From, "'from'")?;
                let list = self.expect_identifier("a list variable")?;
                Ok(Action::List {
                    op: ListActionOp::Remove,
                    value,
                    list: list.lexeme,
                    location,
                })
            }
            TokenKind::Call => {
                self.advance();
                let name = self.expect_identifier("a function name after 'call'")?;
                let mut args = Vec::new();
                if self.eat(TokenKind::With) {
                    loop {
                        args.push(self.parse_expression()?);
                        if !self.eat(TokenKind::Comma) {
                            break;
                        }
                    }
                }
                Ok(Action::FunctionCall {
                    name: name.lexeme,
                    args,
                    location,
                })
            }
            TokenKind::If => {
                self.advance();
                let condition = self.parse_condition()?;
                self.expect(TokenKind::Then, "'then'")?;
                let then_actions =
                    self.parse_action_list(&[TokenKind::Else])?;
                let else_actions = if self.eat(TokenKind::Else) {
                    self.parse_action_list(&[])?
                } else {
                    Vec::new()
                };
                Ok(Action::Conditional {
                    condition,
                    then_actions,
                    else_actions,
                    location,
                })
            }
            TokenKind::ForEach => {
                self.advance();
                let variable = self.expect_identifier("a loop variable after 'forEach'")?;
                let index_variable = if self.eat(TokenKind::Comma) {
                    Some(self.expect_identifier("an index variable")?.lexeme)
                } else {
                    None
                };
                self.expect(TokenKind::In, "'in'")?;
                let list = self.parse_expression()?;
                self.expect_body_opener("forEach")?;
                let body = self.parse_action_list(&[])?;
                Ok(Action::ForEach {
                    variable: variable.lexeme,
                    index_variable,
                    list,
                    body,
                    location,
                })
            }
            TokenKind::While => {
                self.advance();
                let condition = self.parse_condition()?;
                self.expect_body_opener("while")?;
                let body = self.parse_action_list(&[])?;
                Ok(Action::While {
                    condition,
                    body,
                    location,
                })
            }
            TokenKind::Do => {
                self.advance();
                self.eat(TokenKind::Colon);
                let body = self.parse_action_list(&[TokenKind::While])?;
                self.expect(TokenKind::While, "'while' after a 'do' body")?;
                let condition = self.parse_condition()?;
                Ok(Action::DoWhile {
                    body,
                    condition,
                    location,
                })
            }
            TokenKind::CircuitBreaker => {
                self.advance();
                let message = self.expect(TokenKind::String, "a message string")?;
                let Some(TokenLiteral::String(message)) = message.literal else {
                    unreachable!("string token always carries a string literal");
                };
                let code = if self.eat(TokenKind::With) {
                    let code = self.expect(TokenKind::String, "a code string")?;
                    match code.literal {
                        Some(TokenLiteral::String(code)) => Some(code),
                        _ => None,
                    }
                } else {
                    None
                };
                Ok(Action::CircuitBreaker {
                    message,
                    code,
                    location,
                })
            }
            _ => {
                let token = self.current();
                Err(Error::parse_with_suggestions(
                    parse_codes::INVALID_ACTION,
                    format!("expected an action, found '{}'", token.lexeme),
                    token.location,
                    vec![
                        "set decision to \"APPROVED\"".into(),
                        "calculate ratio as debt / income".into(),
                        "add x to total".into(),
                        "forEach x in items: add x to total".into(),
                    ],
                ))
            }
        }
    }

    /// Loop bodies open with `:` or `do`.
    fn expect_body_opener(&mut self, construct: &str) -> Result<()> {
        if self.eat(TokenKind::Colon) || self.eat(TokenKind::Do) {
            Ok(())
        } else {
            Err(Error::parse(
                parse_codes::UNEXPECTED_TOKEN,
                format!("expected ':' or 'do' before the {construct} body"),
                self.location(),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Condition, LiteralValue};

    fn parse(source: &str) -> Action {
        let actions = Parser::parse_actions_source(source).unwrap();
        assert_eq!(actions.len(), 1, "expected a single action");
        actions.into_iter().next().unwrap()
    }

    #[test]
    fn test_set_action() {
        let action = parse("set decision to \"APPROVED\"");
        let Action::Assignment {
            variable, value, ..
        } = action
        else {
            panic!("expected assignment");
        };
        assert_eq!(variable, "decision");
        assert!(matches!(
            value,
            Expression::Literal {
                value: LiteralValue::String(_),
                ..
            }
        ));
    }

    #[test]
    fn test_calculate_action() {
        let action = parse("calculate ratio as debt / income");
        assert!(matches!(action, Action::Calculate { .. }));
    }

    #[test]
    fn test_run_action() {
        let action = parse("run score as rest_get(\"https://scores.example.com\")");
        let Action::Run { expression, .. } = action else {
            panic!("expected run");
        };
        assert!(matches!(expression, Expression::RestCall { .. }));
    }

    #[test]
    fn test_arithmetic_actions() {
        assert!(matches!(
            parse("add 10 to total"),
            Action::Arithmetic {
                op: ArithmeticActionOp::Add,
                ..
            }
        ));
        assert!(matches!(
            parse("subtract fee from balance"),
            Action::Arithmetic {
                op: ArithmeticActionOp::Subtract,
                ..
            }
        ));
        assert!(matches!(
            parse("multiply rate by 1.05"),
            Action::Arithmetic {
                op: ArithmeticActionOp::Multiply,
                ..
            }
        ));
        assert!(matches!(
            parse("divide total by count"),
            Action::Arithmetic {
                op: ArithmeticActionOp::Divide,
                ..
            }
        ));
    }

    #[test]
    fn test_list_actions() {
        assert!(matches!(
            parse("append item to basket"),
            Action::List {
                op: ListActionOp::Append,
                ..
            }
        ));
        assert!(matches!(
            parse("prepend item to basket"),
            Action::List {
                op: ListActionOp::Prepend,
                ..
            }
        ));
        assert!(matches!(
            parse("remove item from basket"),
            Action::List {
                op: ListActionOp::Remove,
                ..
            }
        ));
    }

    #[test]
    fn test_call_action() {
        let action = parse("call log with \"checked\", \"info\"");
        let Action::FunctionCall { name, args, .. } = action else {
            panic!("expected function call");
        };
        assert_eq!(name, "log");
        assert_eq!(args.len(), 2);
    }

    #[test]
    fn test_conditional_action() {
        let action = parse("if risk > 70 then set tier to \"HIGH\" else set tier to \"LOW\"");
        let Action::Conditional {
            condition,
            then_actions,
            else_actions,
            ..
        } = action
        else {
            panic!("expected conditional");
        };
        assert!(matches!(condition, Condition::Comparison { .. }));
        assert_eq!(then_actions.len(), 1);
        assert_eq!(else_actions.len(), 1);
    }

    #[test]
    fn test_conditional_with_multiple_then_actions() {
        let action = parse("if a > 1 then set x to 1; set y to 2 else set x to 0");
        let Action::Conditional {
            then_actions,
            else_actions,
            ..
        } = action
        else {
            panic!("expected conditional");
        };
        assert_eq!(then_actions.len(), 2);
        assert_eq!(else_actions.len(), 1);
    }

    #[test]
    fn test_foreach() {
        let action = parse("forEach x in items: calculate total as total + x");
        let Action::ForEach {
            variable,
            index_variable,
            body,
            ..
        } = action
        else {
            panic!("expected forEach");
        };
        assert_eq!(variable, "x");
        assert!(index_variable.is_none());
        assert_eq!(body.len(), 1);
    }

    #[test]
    fn test_foreach_with_index() {
        let action = parse("forEach x, i in items: set last to i");
        let Action::ForEach { index_variable, .. } = action else {
            panic!("expected forEach");
        };
        assert_eq!(index_variable.as_deref(), Some("i"));
    }

    #[test]
    fn test_while() {
        let action = parse("while counter < 10: add 1 to counter");
        assert!(matches!(action, Action::While { .. }));
    }

    #[test]
    fn test_do_while() {
        let action = parse("do: add 1 to counter while counter < 10");
        let Action::DoWhile { body, .. } = action else {
            panic!("expected do-while");
        };
        assert_eq!(body.len(), 1);
    }

    #[test]
    fn test_circuit_breaker() {
        let action = parse("circuit_breaker \"risk_too_high\"");
        let Action::CircuitBreaker { message, code, .. } = action else {
            panic!("expected circuit breaker");
        };
        assert_eq!(message, "risk_too_high");
        assert!(code.is_none());

        let action = parse("circuit_breaker \"manual review\" with \"CB_042\"");
        let Action::CircuitBreaker { code, .. } = action else {
            panic!("expected circuit breaker");
        };
        assert_eq!(code.as_deref(), Some("CB_042"));
    }

    #[test]
    fn test_invalid_action() {
        let err = Parser::parse_actions_source("frobnicate x").unwrap_err();
        assert_eq!(err.code(), parse_codes::INVALID_ACTION);
    }
}
