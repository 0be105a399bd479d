use rust_decimal::Decimal;

use crate::value::{JsonKind, PathValue};

/// Array membership by deep equality, or substring containment when both
/// arguments are strings.
pub fn fn_contains<'a>(args: &[PathValue<'a>]) -> PathValue<'a> {
    if let Some(items) = args[0].elements() {
        return PathValue::Bool(items.iter().any(|item| item == &args[1]));
    }
    match (args[0].as_str(), args[1].as_str()) {
        (Some(haystack), Some(needle)) => PathValue::Bool(haystack.contains(needle)),
        _ => PathValue::Null,
    }
}

/// Property count of an object, length of an array, or the number of code
/// points in a string.
pub fn fn_length<'a>(args: &[PathValue<'a>]) -> PathValue<'a> {
    let operand = &args[0];
    let count = match operand.kind() {
        JsonKind::Array => operand.array_len(),
        JsonKind::Object => operand.entries().map(|entries| entries.len()),
        JsonKind::String => operand.as_str().map(|s| s.chars().count()),
        _ => None,
    };
    match count {
        Some(n) => PathValue::Decimal(Decimal::from(n)),
        None => PathValue::Null,
    }
}

/// The property names of an object, as an array of strings.
pub fn fn_keys<'a>(args: &[PathValue<'a>]) -> PathValue<'a> {
    match args[0].entries() {
        Some(entries) => PathValue::array(
            entries
                .into_iter()
                .map(|(name, _)| PathValue::string(name))
                .collect(),
        ),
        None => PathValue::Null,
    }
}
