use std::str::FromStr;

use rust_decimal::Decimal;

use crate::operators::compare_values;
use crate::value::{JsonKind, PathValue};

pub fn fn_abs<'a>(args: &[PathValue<'a>]) -> PathValue<'a> {
    let operand = &args[0];
    if let Some(d) = operand.as_decimal() {
        PathValue::Decimal(d.abs())
    } else if let Some(d) = operand.as_double() {
        PathValue::Double(d.abs())
    } else {
        PathValue::Null
    }
}

pub fn fn_ceil<'a>(args: &[PathValue<'a>]) -> PathValue<'a> {
    let operand = &args[0];
    if let Some(d) = operand.as_decimal() {
        PathValue::Decimal(d.ceil())
    } else if let Some(d) = operand.as_double() {
        PathValue::Double(d.ceil())
    } else {
        PathValue::Null
    }
}

pub fn fn_floor<'a>(args: &[PathValue<'a>]) -> PathValue<'a> {
    let operand = &args[0];
    if let Some(d) = operand.as_decimal() {
        PathValue::Decimal(d.floor())
    } else if let Some(d) = operand.as_double() {
        PathValue::Double(d.floor())
    } else {
        PathValue::Null
    }
}

/// Numbers pass through unchanged; strings parse as decimal first, double
/// second; anything else is null.
pub fn fn_to_number<'a>(args: &[PathValue<'a>]) -> PathValue<'a> {
    let operand = &args[0];
    match operand.kind() {
        JsonKind::Number => operand.clone(),
        JsonKind::String => {
            let text = operand.as_str().unwrap_or_default();
            if let Ok(d) = Decimal::from_str(text) {
                PathValue::Decimal(d)
            } else if let Ok(d) = text.parse::<f64>() {
                PathValue::Double(d)
            } else {
                PathValue::Null
            }
        }
        _ => PathValue::Null,
    }
}

/// Sums an array of numbers. Decimal addition is used while every element
/// supports it, falling back to doubles otherwise.
pub fn fn_sum<'a>(args: &[PathValue<'a>]) -> PathValue<'a> {
    match numeric_elements(&args[0]) {
        Some(items) => fold_numbers(&items, Decimal::ZERO, 0.0, Decimal::checked_add, |a, b| a + b),
        None => PathValue::Null,
    }
}

pub fn fn_prod<'a>(args: &[PathValue<'a>]) -> PathValue<'a> {
    match numeric_elements(&args[0]) {
        Some(items) if !items.is_empty() => {
            fold_numbers(&items, Decimal::ONE, 1.0, Decimal::checked_mul, |a, b| a * b)
        }
        _ => PathValue::Null,
    }
}

pub fn fn_avg<'a>(args: &[PathValue<'a>]) -> PathValue<'a> {
    let Some(items) = numeric_elements(&args[0]) else {
        return PathValue::Null;
    };
    if items.is_empty() {
        return PathValue::Null;
    }
    let count = items.len();
    match fold_numbers(&items, Decimal::ZERO, 0.0, Decimal::checked_add, |a, b| {
        a + b
    }) {
        PathValue::Decimal(total) => match total.checked_div(Decimal::from(count)) {
            Some(d) => PathValue::Decimal(d),
            None => match rust_decimal::prelude::ToPrimitive::to_f64(&total) {
                Some(t) => PathValue::Double(t / count as f64),
                None => PathValue::Null,
            },
        },
        PathValue::Double(total) => PathValue::Double(total / count as f64),
        other => other,
    }
}

pub fn fn_min<'a>(args: &[PathValue<'a>]) -> PathValue<'a> {
    extremum(&args[0], std::cmp::Ordering::Less)
}

pub fn fn_max<'a>(args: &[PathValue<'a>]) -> PathValue<'a> {
    extremum(&args[0], std::cmp::Ordering::Greater)
}

/// Picks the least/greatest element of a homogeneous array of numbers or of
/// strings; null for empty or mixed arrays.
fn extremum<'a>(value: &PathValue<'a>, keep: std::cmp::Ordering) -> PathValue<'a> {
    let Some(items) = value.elements() else {
        return PathValue::Null;
    };
    let mut iter = items.into_iter();
    let Some(mut best) = iter.next() else {
        return PathValue::Null;
    };
    let kind_class = |k: JsonKind| matches!(k, JsonKind::Number | JsonKind::String);
    if !kind_class(best.kind()) {
        return PathValue::Null;
    }
    for item in iter {
        match compare_values(&item, &best) {
            Some(ordering) => {
                if ordering == keep {
                    best = item;
                }
            }
            // Heterogeneous array.
            None => return PathValue::Null,
        }
    }
    best
}

/// The elements of an array value, provided every one of them is a number.
fn numeric_elements<'a>(value: &PathValue<'a>) -> Option<Vec<PathValue<'a>>> {
    let items = value.elements()?;
    if items.iter().all(|item| item.kind() == JsonKind::Number) {
        Some(items)
    } else {
        None
    }
}

fn fold_numbers<'a, D, F>(
    items: &[PathValue<'a>],
    decimal_init: Decimal,
    double_init: f64,
    exact: D,
    approximate: F,
) -> PathValue<'a>
where
    D: Fn(Decimal, Decimal) -> Option<Decimal>,
    F: Fn(f64, f64) -> f64,
{
    let mut total = decimal_init;
    let mut exact_ok = true;
    for item in items {
        match item.as_decimal().and_then(|d| exact(total, d)) {
            Some(next) => total = next,
            None => {
                exact_ok = false;
                break;
            }
        }
    }
    if exact_ok {
        return PathValue::Decimal(total);
    }
    let mut total = double_init;
    for item in items {
        match item.as_double() {
            Some(d) => total = approximate(total, d),
            None => return PathValue::Null,
        }
    }
    PathValue::Double(total)
}
