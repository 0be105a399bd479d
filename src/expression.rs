//! Reverse-polish expression evaluation.
//!
//! The parser stores each filter or argument expression as a token list in
//! reverse-polish order (reversed off its output stack), so evaluation
//! walks the list back to front with a value stack and a per-frame argument
//! list. A failed operator or a dangling stack makes the whole expression
//! evaluate to undefined (falsy), and an arity violation fails it as false;
//! genuine runtime errors (the recursive-descent depth bound) propagate.

use std::sync::Arc;

use serde_json::Value;

use crate::engine::QueryResources;
use crate::error::JsonPathError;
use crate::path::PathNode;
use crate::tokens::{Expression, Token};
use crate::value::PathValue;

impl Expression {
    pub(crate) fn evaluate<'a>(
        &'a self,
        res: &QueryResources<'a>,
        root: &'a Value,
        last_path: &Arc<PathNode>,
        current: &PathValue<'a>,
    ) -> Result<PathValue<'a>, JsonPathError> {
        let mut stack: Vec<PathValue<'a>> = Vec::new();
        let mut arguments: Vec<PathValue<'a>> = Vec::new();

        for token in self.tokens.iter().rev() {
            match token {
                Token::Value(value) => stack.push(PathValue::Node(value)),
                Token::RootNode => stack.push(PathValue::Node(root)),
                Token::CurrentNode => stack.push(current.clone()),

                Token::UnaryOp(op) => {
                    let Some(operand) = stack.pop() else {
                        return Ok(PathValue::Undefined);
                    };
                    match op.apply(&operand) {
                        Some(value) => stack.push(value),
                        None => return Ok(PathValue::Undefined),
                    }
                }

                Token::BinaryOp(op) => {
                    let Some(rhs) = stack.pop() else {
                        return Ok(PathValue::Undefined);
                    };
                    let Some(lhs) = stack.pop() else {
                        return Ok(PathValue::Undefined);
                    };
                    match op.apply(&lhs, &rhs) {
                        Some(value) => stack.push(value),
                        None => return Ok(PathValue::Undefined),
                    }
                }

                Token::Selector(selector) => {
                    let Some(operand) = stack.pop() else {
                        return Ok(PathValue::Undefined);
                    };
                    stack.push(selector.try_evaluate(res, root, last_path, &operand)?);
                }

                Token::Argument => {
                    let Some(value) = stack.pop() else {
                        return Ok(PathValue::Undefined);
                    };
                    arguments.push(value);
                }

                Token::Function(function) => {
                    // An arity violation fails the containing expression as
                    // false, unlike other failures which yield undefined.
                    if arguments.len() != function.arity() {
                        return Ok(PathValue::Bool(false));
                    }
                    let result = function.call(&arguments);
                    arguments.clear();
                    stack.push(result);
                }

                Token::Expression(inner) => {
                    stack.push(inner.evaluate(res, root, last_path, current)?);
                }

                _ => {
                    return Err(JsonPathError::internal(
                        "structural token in a finished expression",
                    ));
                }
            }
        }

        Ok(stack.pop().unwrap_or(PathValue::Undefined))
    }
}
