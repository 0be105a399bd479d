//! Built-in filter-expression functions.
//!
//! Every function has a fixed arity, validated by the parser and again by
//! the expression runtime. A function applied to values of the wrong shape
//! evaluates to null; it never raises.

mod collection;
mod numeric;
mod string;

use crate::value::PathValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Function {
    Abs,
    Avg,
    Ceil,
    Contains,
    EndsWith,
    Floor,
    Keys,
    Length,
    Max,
    Min,
    Prod,
    StartsWith,
    Sum,
    ToNumber,
    Tokenize,
}

impl Function {
    pub fn from_name(name: &str) -> Option<Function> {
        match name {
            "abs" => Some(Function::Abs),
            "avg" => Some(Function::Avg),
            "ceil" => Some(Function::Ceil),
            "contains" => Some(Function::Contains),
            "ends_with" => Some(Function::EndsWith),
            "floor" => Some(Function::Floor),
            "keys" => Some(Function::Keys),
            "length" => Some(Function::Length),
            "max" => Some(Function::Max),
            "min" => Some(Function::Min),
            "prod" => Some(Function::Prod),
            "starts_with" => Some(Function::StartsWith),
            "sum" => Some(Function::Sum),
            "to_number" => Some(Function::ToNumber),
            "tokenize" => Some(Function::Tokenize),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Function::Abs => "abs",
            Function::Avg => "avg",
            Function::Ceil => "ceil",
            Function::Contains => "contains",
            Function::EndsWith => "ends_with",
            Function::Floor => "floor",
            Function::Keys => "keys",
            Function::Length => "length",
            Function::Max => "max",
            Function::Min => "min",
            Function::Prod => "prod",
            Function::StartsWith => "starts_with",
            Function::Sum => "sum",
            Function::ToNumber => "to_number",
            Function::Tokenize => "tokenize",
        }
    }

    pub fn arity(&self) -> usize {
        match self {
            Function::Contains
            | Function::EndsWith
            | Function::StartsWith
            | Function::Tokenize => 2,
            _ => 1,
        }
    }

    pub fn call<'a>(&self, args: &[PathValue<'a>]) -> PathValue<'a> {
        match self {
            Function::Abs => numeric::fn_abs(args),
            Function::Avg => numeric::fn_avg(args),
            Function::Ceil => numeric::fn_ceil(args),
            Function::Contains => collection::fn_contains(args),
            Function::EndsWith => string::fn_ends_with(args),
            Function::Floor => numeric::fn_floor(args),
            Function::Keys => collection::fn_keys(args),
            Function::Length => collection::fn_length(args),
            Function::Max => numeric::fn_max(args),
            Function::Min => numeric::fn_min(args),
            Function::Prod => numeric::fn_prod(args),
            Function::StartsWith => string::fn_starts_with(args),
            Function::Sum => numeric::fn_sum(args),
            Function::ToNumber => numeric::fn_to_number(args),
            Function::Tokenize => string::fn_tokenize(args),
        }
    }
}
