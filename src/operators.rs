//! Unary and binary operator semantics for filter expressions.
//!
//! Operators carry their own precedence and associativity for the
//! shunting-yard assembler. Application returns `None` when an operator
//! cannot evaluate at all (non-numeric arithmetic, division by zero); the
//! expression runtime treats that as failure of the whole expression.
//! Recoverable outcomes (a mixed-kind relational comparison) yield null.

use std::cmp::Ordering;
use std::fmt;

use regex::Regex;

use crate::value::{JsonKind, PathValue};

#[derive(Debug, Clone)]
pub enum UnaryOp {
    /// `!` — boolean complement under the truthiness rule.
    Not,
    /// `-` — numeric negation.
    Minus,
    /// `=~ /pattern/flags` — regex match over a string operand. The pattern
    /// is compiled once at parse time.
    Regex(RegexOp),
}

/// A compiled regex literal, keeping the source pattern for display.
#[derive(Debug, Clone)]
pub struct RegexOp {
    pattern: String,
    case_insensitive: bool,
    regex: Regex,
}

impl RegexOp {
    pub fn new(pattern: &str, case_insensitive: bool) -> Result<Self, regex::Error> {
        let compiled = if case_insensitive {
            Regex::new(&format!("(?i){}", pattern))?
        } else {
            Regex::new(pattern)?
        };
        Ok(RegexOp {
            pattern: pattern.to_string(),
            case_insensitive,
            regex: compiled,
        })
    }

    pub fn is_match(&self, input: &str) -> bool {
        self.regex.is_match(input)
    }
}

impl PartialEq for RegexOp {
    fn eq(&self, other: &Self) -> bool {
        self.pattern == other.pattern && self.case_insensitive == other.case_insensitive
    }
}

impl PartialEq for UnaryOp {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (UnaryOp::Not, UnaryOp::Not) => true,
            (UnaryOp::Minus, UnaryOp::Minus) => true,
            (UnaryOp::Regex(a), UnaryOp::Regex(b)) => a == b,
            _ => false,
        }
    }
}

impl UnaryOp {
    pub fn precedence(&self) -> u8 {
        match self {
            UnaryOp::Not | UnaryOp::Minus => 8,
            UnaryOp::Regex(_) => 7,
        }
    }

    pub fn is_right_associative(&self) -> bool {
        true
    }

    pub fn apply<'a>(&self, operand: &PathValue<'a>) -> Option<PathValue<'a>> {
        match self {
            UnaryOp::Not => Some(PathValue::Bool(!operand.is_truthy())),
            UnaryOp::Minus => {
                if let Some(d) = operand.as_decimal() {
                    Some(PathValue::Decimal(-d))
                } else {
                    operand.as_double().map(|d| PathValue::Double(-d))
                }
            }
            UnaryOp::Regex(op) => Some(match operand.as_str() {
                Some(s) => PathValue::Bool(op.is_match(s)),
                None => PathValue::Null,
            }),
        }
    }

    /// Infix rendering with the operand string, used by expression display.
    pub(crate) fn render(&self, operand: &str) -> String {
        match self {
            UnaryOp::Not => format!("!({})", operand),
            UnaryOp::Minus => format!("-({})", operand),
            UnaryOp::Regex(op) => {
                let flags = if op.case_insensitive { "i" } else { "" };
                format!(
                    "({} =~ /{}/{})",
                    operand,
                    op.pattern.replace('/', "\\/"),
                    flags
                )
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Or,
    And,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

impl BinaryOp {
    pub fn precedence(&self) -> u8 {
        match self {
            BinaryOp::Or => 1,
            BinaryOp::And => 2,
            BinaryOp::Eq | BinaryOp::Ne => 3,
            BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => 4,
            BinaryOp::Add | BinaryOp::Sub => 5,
            BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem => 6,
        }
    }

    pub fn is_right_associative(&self) -> bool {
        false
    }

    pub fn apply<'a>(&self, lhs: &PathValue<'a>, rhs: &PathValue<'a>) -> Option<PathValue<'a>> {
        match self {
            // Logical operators select one of their operands; they do not
            // coerce to booleans.
            BinaryOp::Or => Some(if lhs.is_truthy() {
                lhs.clone()
            } else {
                rhs.clone()
            }),
            BinaryOp::And => Some(if lhs.is_truthy() {
                rhs.clone()
            } else {
                lhs.clone()
            }),
            BinaryOp::Eq => Some(PathValue::Bool(lhs == rhs)),
            BinaryOp::Ne => Some(PathValue::Bool(lhs != rhs)),
            BinaryOp::Lt => Some(relational(lhs, rhs, |ord| ord == Ordering::Less)),
            BinaryOp::Le => Some(relational(lhs, rhs, |ord| ord != Ordering::Greater)),
            BinaryOp::Gt => Some(relational(lhs, rhs, |ord| ord == Ordering::Greater)),
            BinaryOp::Ge => Some(relational(lhs, rhs, |ord| ord != Ordering::Less)),
            BinaryOp::Add => arithmetic(lhs, rhs, |a, b| a.checked_add(b), |a, b| Some(a + b)),
            BinaryOp::Sub => arithmetic(lhs, rhs, |a, b| a.checked_sub(b), |a, b| Some(a - b)),
            BinaryOp::Mul => arithmetic(lhs, rhs, |a, b| a.checked_mul(b), |a, b| Some(a * b)),
            BinaryOp::Div => arithmetic(
                lhs,
                rhs,
                |a, b| a.checked_div(b),
                |a, b| if b == 0.0 { None } else { Some(a / b) },
            ),
            BinaryOp::Rem => arithmetic(
                lhs,
                rhs,
                |a, b| a.checked_rem(b),
                |a, b| if b == 0.0 { None } else { Some(a % b) },
            ),
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            BinaryOp::Or => "||",
            BinaryOp::And => "&&",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
        };
        write!(f, "{}", symbol)
    }
}

/// Ordering over two values for relational operators and for `min`/`max`:
/// numbers compare exactly when both extract as decimals, approximately
/// otherwise; strings compare ordinally. Everything else is unordered.
pub(crate) fn compare_values(lhs: &PathValue, rhs: &PathValue) -> Option<Ordering> {
    if lhs.kind() == JsonKind::Number && rhs.kind() == JsonKind::Number {
        if let (Some(a), Some(b)) = (lhs.as_decimal(), rhs.as_decimal()) {
            return Some(a.cmp(&b));
        }
        if let (Some(a), Some(b)) = (lhs.as_double(), rhs.as_double()) {
            return a.partial_cmp(&b);
        }
        return None;
    }
    match (lhs.as_str(), rhs.as_str()) {
        (Some(a), Some(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

fn relational<'a, F>(lhs: &PathValue<'a>, rhs: &PathValue<'a>, predicate: F) -> PathValue<'a>
where
    F: Fn(Ordering) -> bool,
{
    match compare_values(lhs, rhs) {
        Some(ordering) => PathValue::Bool(predicate(ordering)),
        // Mixed or unordered kinds: null, which is falsy.
        None => PathValue::Null,
    }
}

fn arithmetic<'a, D, F>(
    lhs: &PathValue<'a>,
    rhs: &PathValue<'a>,
    exact: D,
    approximate: F,
) -> Option<PathValue<'a>>
where
    D: Fn(rust_decimal::Decimal, rust_decimal::Decimal) -> Option<rust_decimal::Decimal>,
    F: Fn(f64, f64) -> Option<f64>,
{
    if let (Some(a), Some(b)) = (lhs.as_decimal(), rhs.as_decimal()) {
        // Decimal overflow falls back to the approximate path; a zero
        // divisor does not.
        if let Some(result) = exact(a, b) {
            return Some(PathValue::Decimal(result));
        }
        if b.is_zero() {
            return None;
        }
    }
    let a = lhs.as_double()?;
    let b = rhs.as_double()?;
    approximate(a, b).map(PathValue::Double)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use serde_json::json;

    #[test]
    fn test_logical_operators_yield_operands() {
        let zero = json!(0);
        let empty = json!("");
        let lhs = PathValue::Node(&zero);
        let rhs = PathValue::Node(&empty);

        // 0 is truthy, "" is falsy.
        assert_eq!(BinaryOp::Or.apply(&lhs, &rhs), Some(lhs.clone()));
        assert_eq!(BinaryOp::And.apply(&lhs, &rhs), Some(rhs.clone()));
        assert_eq!(BinaryOp::Or.apply(&rhs, &lhs), Some(lhs.clone()));
        assert_eq!(BinaryOp::And.apply(&rhs, &lhs), Some(rhs));
    }

    #[test]
    fn test_relational_mixed_kinds_yield_null() {
        let s = json!("10");
        let n = json!(9);
        let result = BinaryOp::Lt
            .apply(&PathValue::Node(&n), &PathValue::Node(&s))
            .unwrap();
        assert_eq!(result, PathValue::Null);
        assert!(!result.is_truthy());
    }

    #[test]
    fn test_string_comparison_is_ordinal() {
        let a = PathValue::string("Zebra");
        let b = PathValue::string("apple");
        // 'Z' (0x5A) < 'a' (0x61).
        assert_eq!(BinaryOp::Lt.apply(&a, &b), Some(PathValue::Bool(true)));
    }

    #[test]
    fn test_arithmetic_prefers_decimals() {
        let a = json!(0.1);
        let b = json!(0.2);
        let result = BinaryOp::Add
            .apply(&PathValue::Node(&a), &PathValue::Node(&b))
            .unwrap();
        assert_eq!(result, PathValue::Decimal(Decimal::new(3, 1)));
    }

    #[test]
    fn test_division_by_zero_fails() {
        let a = json!(10);
        let zero = json!(0);
        assert_eq!(
            BinaryOp::Div.apply(&PathValue::Node(&a), &PathValue::Node(&zero)),
            None
        );
        assert_eq!(
            BinaryOp::Rem.apply(&PathValue::Node(&a), &PathValue::Node(&zero)),
            None
        );
    }

    #[test]
    fn test_arithmetic_on_non_numbers_fails() {
        let a = json!("x");
        let b = json!(1);
        assert_eq!(
            BinaryOp::Add.apply(&PathValue::Node(&a), &PathValue::Node(&b)),
            None
        );
    }

    #[test]
    fn test_unary_minus() {
        let n = json!(3.5);
        assert_eq!(
            UnaryOp::Minus.apply(&PathValue::Node(&n)),
            Some(PathValue::Decimal(Decimal::new(-35, 1)))
        );
        let s = json!("3.5");
        assert_eq!(UnaryOp::Minus.apply(&PathValue::Node(&s)), None);
    }

    #[test]
    fn test_not_uses_truthiness() {
        let empty = json!([]);
        assert_eq!(
            UnaryOp::Not.apply(&PathValue::Node(&empty)),
            Some(PathValue::Bool(true))
        );
        let zero = json!(0);
        assert_eq!(
            UnaryOp::Not.apply(&PathValue::Node(&zero)),
            Some(PathValue::Bool(false))
        );
    }

    #[test]
    fn test_regex_match_is_string_only() {
        let op = UnaryOp::Regex(RegexOp::new("wild", true).unwrap());
        let title = json!("A Wild Sheep Chase");
        assert_eq!(
            op.apply(&PathValue::Node(&title)),
            Some(PathValue::Bool(true))
        );
        let number = json!(42);
        assert_eq!(op.apply(&PathValue::Node(&number)), Some(PathValue::Null));
    }

    #[test]
    fn test_equality_is_deep() {
        let a = json!([1, {"k": "v"}]);
        let b = json!([1.0, {"k": "v"}]);
        assert_eq!(
            BinaryOp::Eq.apply(&PathValue::Node(&a), &PathValue::Node(&b)),
            Some(PathValue::Bool(true))
        );
    }
}
