//! Token model shared by the parser and the expression runtime.
//!
//! Filter and argument expressions are stored as reverse-polish token lists:
//! the shunting-yard assembler emits postfix order and the finished list is
//! reversed when it is collected off the output stack, so evaluation and
//! rendering both walk the list back to front.

use std::fmt;

use serde_json::Value;

use crate::ast::Selector;
use crate::functions::Function;
use crate::operators::{BinaryOp, UnaryOp};

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// A sub-query chain used as an operand inside an expression.
    Selector(Selector),
    RootNode,
    CurrentNode,
    UnaryOp(UnaryOp),
    BinaryOp(BinaryOp),
    Function(Function),
    /// A nested expression (a function argument or a grouped sub-expression).
    Expression(Expression),
    /// A literal value parsed by the host JSON parser.
    Value(Value),
    /// Moves the evaluated value on top of the stack to the argument list.
    Argument,
    /// Grouping marker; lives on the parser's operator stack and never
    /// survives into a finished expression.
    LeftParen,
}

/// A finished expression: a reverse-polish token list evaluated against
/// (root, current).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Expression {
    pub(crate) tokens: Vec<Token>,
}

impl Expression {
    pub(crate) fn new(tokens: Vec<Token>) -> Self {
        Expression { tokens }
    }

    pub(crate) fn requires_paths(&self) -> bool {
        self.tokens.iter().any(|token| match token {
            Token::Selector(selector) => selector.requires_paths(),
            Token::Expression(inner) => inner.requires_paths(),
            _ => false,
        })
    }
}

/// Reconstructs an infix rendering by symbolically executing the
/// reverse-polish list.
impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut stack: Vec<String> = Vec::new();
        let mut arguments: Vec<String> = Vec::new();

        for token in self.tokens.iter().rev() {
            match token {
                Token::Value(value) => stack.push(value.to_string()),
                Token::RootNode => stack.push("$".to_string()),
                Token::CurrentNode => stack.push("@".to_string()),
                Token::Selector(selector) => {
                    // The anchor operand rendered by the preceding
                    // RootNode/CurrentNode token is part of the chain.
                    stack.pop();
                    stack.push(selector.to_string());
                }
                Token::UnaryOp(op) => {
                    let operand = stack.pop().unwrap_or_default();
                    stack.push(op.render(&operand));
                }
                Token::BinaryOp(op) => {
                    let rhs = stack.pop().unwrap_or_default();
                    let lhs = stack.pop().unwrap_or_default();
                    stack.push(format!("({} {} {})", lhs, op, rhs));
                }
                Token::Argument => {
                    if let Some(value) = stack.pop() {
                        arguments.push(value);
                    }
                }
                Token::Function(function) => {
                    stack.push(format!("{}({})", function.name(), arguments.join(",")));
                    arguments.clear();
                }
                Token::Expression(inner) => stack.push(inner.to_string()),
                _ => {}
            }
        }

        write!(f, "{}", stack.pop().unwrap_or_default())
    }
}
