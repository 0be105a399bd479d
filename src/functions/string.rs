use regex::Regex;

use crate::value::PathValue;

pub fn fn_starts_with<'a>(args: &[PathValue<'a>]) -> PathValue<'a> {
    match (args[0].as_str(), args[1].as_str()) {
        (Some(text), Some(prefix)) => PathValue::Bool(text.starts_with(prefix)),
        _ => PathValue::Null,
    }
}

pub fn fn_ends_with<'a>(args: &[PathValue<'a>]) -> PathValue<'a> {
    match (args[0].as_str(), args[1].as_str()) {
        (Some(text), Some(suffix)) => PathValue::Bool(text.ends_with(suffix)),
        _ => PathValue::Null,
    }
}

/// Splits a string around every match of a regex pattern. The pattern is a
/// runtime value, so a pattern that fails to compile yields null rather
/// than an error.
pub fn fn_tokenize<'a>(args: &[PathValue<'a>]) -> PathValue<'a> {
    let (Some(text), Some(pattern)) = (args[0].as_str(), args[1].as_str()) else {
        return PathValue::Null;
    };
    let Ok(regex) = Regex::new(pattern) else {
        return PathValue::Null;
    };
    PathValue::array(regex.split(text).map(PathValue::string).collect())
}
