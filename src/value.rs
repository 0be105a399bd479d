//! Uniform view over JSON values.
//!
//! Selectors and filter expressions operate on [`PathValue`], which is either
//! a node borrowed from the host `serde_json` document or a synthetic value
//! produced by an operator or function (an exact decimal, an approximate
//! double, a string, or an array wrapping multiple sub-query matches).

use std::hash::{Hash, Hasher};
use std::sync::Arc;

use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use serde_json::Value;

/// Recursion bound applied when hashing nested arrays and objects.
const HASH_DEPTH_LIMIT: usize = 100;

/// The kind of a JSON-like value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JsonKind {
    Null,
    True,
    False,
    Number,
    String,
    Array,
    Object,
    Undefined,
}

impl JsonKind {
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => JsonKind::Null,
            Value::Bool(true) => JsonKind::True,
            Value::Bool(false) => JsonKind::False,
            Value::Number(_) => JsonKind::Number,
            Value::String(_) => JsonKind::String,
            Value::Array(_) => JsonKind::Array,
            Value::Object(_) => JsonKind::Object,
        }
    }
}

/// A JSON value as seen by the query engine: a borrowed document node or a
/// synthetic value produced during evaluation.
///
/// `Undefined` marks the absence of a value (a failed lookup or a failed
/// expression); it is falsy and never appears in query results.
#[derive(Debug, Clone)]
pub enum PathValue<'a> {
    /// A node of the host document.
    Node(&'a Value),
    /// Exact numeric result.
    Decimal(Decimal),
    /// Approximate numeric result.
    Double(f64),
    Str(Arc<str>),
    Bool(bool),
    Null,
    Undefined,
    /// Synthetic array, e.g. the matches of a multi-valued sub-query.
    Array(Arc<Vec<PathValue<'a>>>),
}

impl<'a> PathValue<'a> {
    pub fn string(s: impl Into<Arc<str>>) -> Self {
        PathValue::Str(s.into())
    }

    pub fn array(items: Vec<PathValue<'a>>) -> Self {
        PathValue::Array(Arc::new(items))
    }

    pub fn kind(&self) -> JsonKind {
        match self {
            PathValue::Node(v) => JsonKind::of(v),
            PathValue::Decimal(_) | PathValue::Double(_) => JsonKind::Number,
            PathValue::Str(_) => JsonKind::String,
            PathValue::Bool(true) => JsonKind::True,
            PathValue::Bool(false) => JsonKind::False,
            PathValue::Null => JsonKind::Null,
            PathValue::Undefined => JsonKind::Undefined,
            PathValue::Array(_) => JsonKind::Array,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PathValue::Node(Value::String(s)) => Some(s),
            PathValue::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Exact numeric extraction. Fails for non-numbers and for doubles
    /// outside the decimal range.
    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            PathValue::Node(Value::Number(n)) => {
                if let Some(i) = n.as_i64() {
                    Some(Decimal::from(i))
                } else if let Some(u) = n.as_u64() {
                    Some(Decimal::from(u))
                } else {
                    n.as_f64().and_then(Decimal::from_f64)
                }
            }
            PathValue::Decimal(d) => Some(*d),
            PathValue::Double(d) => Decimal::from_f64(*d),
            _ => None,
        }
    }

    /// Approximate numeric extraction. Fails for non-numbers.
    pub fn as_double(&self) -> Option<f64> {
        match self {
            PathValue::Node(Value::Number(n)) => n.as_f64(),
            PathValue::Decimal(d) => d.to_f64(),
            PathValue::Double(d) => Some(*d),
            _ => None,
        }
    }

    pub fn array_len(&self) -> Option<usize> {
        match self {
            PathValue::Node(Value::Array(items)) => Some(items.len()),
            PathValue::Array(items) => Some(items.len()),
            _ => None,
        }
    }

    /// Indexed access into an array value.
    pub fn item(&self, index: usize) -> Option<PathValue<'a>> {
        match self {
            PathValue::Node(Value::Array(items)) => items.get(index).map(PathValue::Node),
            PathValue::Array(items) => items.get(index).cloned(),
            _ => None,
        }
    }

    /// Keyed access into an object value.
    pub fn property(&self, name: &str) -> Option<PathValue<'a>> {
        match self {
            PathValue::Node(Value::Object(map)) => map.get(name).map(PathValue::Node),
            _ => None,
        }
    }

    /// The elements of an array value, or `None` for any other kind.
    pub fn elements(&self) -> Option<Vec<PathValue<'a>>> {
        match self {
            PathValue::Node(Value::Array(items)) => {
                Some(items.iter().map(PathValue::Node).collect())
            }
            PathValue::Array(items) => Some(items.as_ref().clone()),
            _ => None,
        }
    }

    /// The (name, value) entries of an object value, in host iteration order.
    pub fn entries(&self) -> Option<Vec<(&'a str, PathValue<'a>)>> {
        match self {
            PathValue::Node(Value::Object(map)) => Some(
                map.iter()
                    .map(|(k, v)| (k.as_str(), PathValue::Node(v)))
                    .collect(),
            ),
            _ => None,
        }
    }

    /// Truthiness rule used by logical operators and filter predicates:
    /// false, null, undefined, and empty strings/arrays/objects are falsy;
    /// everything else (all numbers included) is truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            PathValue::Bool(b) => *b,
            PathValue::Null | PathValue::Undefined => false,
            PathValue::Str(s) => !s.is_empty(),
            PathValue::Array(items) => !items.is_empty(),
            PathValue::Decimal(_) | PathValue::Double(_) => true,
            PathValue::Node(v) => match v {
                Value::Bool(b) => *b,
                Value::Null => false,
                Value::String(s) => !s.is_empty(),
                Value::Array(items) => !items.is_empty(),
                Value::Object(map) => !map.is_empty(),
                Value::Number(_) => true,
            },
        }
    }

    /// Materialize an owned `serde_json` value. `Undefined` becomes null;
    /// a synthetic double that cannot be represented (NaN) becomes null.
    pub fn to_value(&self) -> Value {
        match self {
            PathValue::Node(v) => (*v).clone(),
            PathValue::Decimal(d) => decimal_to_value(*d),
            PathValue::Double(d) => serde_json::Number::from_f64(*d)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            PathValue::Str(s) => Value::String(s.to_string()),
            PathValue::Bool(b) => Value::Bool(*b),
            PathValue::Null | PathValue::Undefined => Value::Null,
            PathValue::Array(items) => Value::Array(items.iter().map(|v| v.to_value()).collect()),
        }
    }

    fn hash_into<H: Hasher>(&self, state: &mut H, depth: usize) {
        let kind = self.kind();
        std::mem::discriminant(&kind).hash(state);
        if depth > HASH_DEPTH_LIMIT {
            return;
        }
        match kind {
            JsonKind::Number => {
                if let Some(d) = self.as_decimal() {
                    d.normalize().hash(state);
                } else if let Some(d) = self.as_double() {
                    d.to_bits().hash(state);
                }
            }
            JsonKind::String => self.as_str().hash(state),
            JsonKind::Array => {
                if let Some(items) = self.elements() {
                    items.len().hash(state);
                    for item in items {
                        item.hash_into(state, depth + 1);
                    }
                }
            }
            JsonKind::Object => {
                if let Some(mut entries) = self.entries() {
                    entries.sort_by(|(a, _), (b, _)| a.cmp(b));
                    entries.len().hash(state);
                    for (name, value) in entries {
                        name.hash(state);
                        value.hash_into(state, depth + 1);
                    }
                }
            }
            _ => {}
        }
    }
}

/// Deep, object-order-independent equality.
///
/// Numbers compare exactly when both sides extract as decimals and
/// approximately otherwise; objects compare after sorting properties by name.
impl PartialEq for PathValue<'_> {
    fn eq(&self, other: &Self) -> bool {
        let kind = self.kind();
        if kind != other.kind() {
            return false;
        }
        match kind {
            JsonKind::Null | JsonKind::True | JsonKind::False | JsonKind::Undefined => true,
            JsonKind::Number => match (self.as_decimal(), other.as_decimal()) {
                (Some(a), Some(b)) => a == b,
                _ => match (self.as_double(), other.as_double()) {
                    (Some(a), Some(b)) => a == b,
                    _ => false,
                },
            },
            JsonKind::String => self.as_str() == other.as_str(),
            JsonKind::Array => {
                let a = self.elements().unwrap_or_default();
                let b = other.elements().unwrap_or_default();
                a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x == y)
            }
            JsonKind::Object => {
                let mut a = self.entries().unwrap_or_default();
                let mut b = other.entries().unwrap_or_default();
                if a.len() != b.len() {
                    return false;
                }
                a.sort_by(|(x, _), (y, _)| x.cmp(y));
                b.sort_by(|(x, _), (y, _)| x.cmp(y));
                a.iter()
                    .zip(b.iter())
                    .all(|((an, av), (bn, bv))| an == bn && av == bv)
            }
        }
    }
}

impl Hash for PathValue<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.hash_into(state, 0);
    }
}

fn decimal_to_value(d: Decimal) -> Value {
    if d.is_integer()
        && let Some(i) = d.to_i64()
    {
        return Value::Number(serde_json::Number::from(i));
    }
    d.to_f64()
        .and_then(serde_json::Number::from_f64)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::hash_map::DefaultHasher;

    fn hash_of(v: &PathValue) -> u64 {
        let mut hasher = DefaultHasher::new();
        v.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn test_kind_of_nodes() {
        assert_eq!(PathValue::Node(&json!(true)).kind(), JsonKind::True);
        assert_eq!(PathValue::Node(&json!(false)).kind(), JsonKind::False);
        assert_eq!(PathValue::Node(&json!(null)).kind(), JsonKind::Null);
        assert_eq!(PathValue::Node(&json!(1.5)).kind(), JsonKind::Number);
        assert_eq!(PathValue::Node(&json!([1])).kind(), JsonKind::Array);
        assert_eq!(PathValue::Node(&json!({})).kind(), JsonKind::Object);
        assert_eq!(PathValue::Undefined.kind(), JsonKind::Undefined);
    }

    #[test]
    fn test_numeric_equality_across_representations() {
        let node = json!(22.72);
        let borrowed = PathValue::Node(&node);
        let exact = PathValue::Decimal(Decimal::new(2272, 2));
        let approx = PathValue::Double(22.72);

        assert_eq!(borrowed, exact);
        assert_eq!(borrowed, approx);
        assert_eq!(exact, approx);
    }

    #[test]
    fn test_integer_and_float_forms_compare_equal() {
        let a = json!(2);
        let b = json!(2.0);
        assert_eq!(PathValue::Node(&a), PathValue::Node(&b));
    }

    #[test]
    fn test_object_equality_is_order_independent() {
        let a = serde_json::from_str::<Value>(r#"{"x": 1, "y": [true]}"#).unwrap();
        let b = serde_json::from_str::<Value>(r#"{"y": [true], "x": 1}"#).unwrap();
        assert_eq!(PathValue::Node(&a), PathValue::Node(&b));
    }

    #[test]
    fn test_mixed_kinds_are_not_equal() {
        let s = json!("1");
        let n = json!(1);
        assert_ne!(PathValue::Node(&s), PathValue::Node(&n));
        assert_ne!(PathValue::Null, PathValue::Undefined);
    }

    #[test]
    fn test_equal_values_hash_equal() {
        let a = serde_json::from_str::<Value>(r#"{"x": 2, "y": "s"}"#).unwrap();
        let b = serde_json::from_str::<Value>(r#"{"y": "s", "x": 2.0}"#).unwrap();
        let va = PathValue::Node(&a);
        let vb = PathValue::Node(&b);
        assert_eq!(va, vb);
        assert_eq!(hash_of(&va), hash_of(&vb));
    }

    #[test]
    fn test_truthiness() {
        assert!(!PathValue::Node(&json!(false)).is_truthy());
        assert!(!PathValue::Node(&json!(null)).is_truthy());
        assert!(!PathValue::Node(&json!("")).is_truthy());
        assert!(!PathValue::Node(&json!([])).is_truthy());
        assert!(!PathValue::Node(&json!({})).is_truthy());
        assert!(!PathValue::Undefined.is_truthy());

        assert!(PathValue::Node(&json!(0)).is_truthy());
        assert!(PathValue::Node(&json!("x")).is_truthy());
        assert!(PathValue::Node(&json!([0])).is_truthy());
        assert!(PathValue::Double(f64::NAN).is_truthy());
    }

    #[test]
    fn test_synthetic_array_access() {
        let v = PathValue::array(vec![PathValue::Double(1.0), PathValue::Bool(true)]);
        assert_eq!(v.array_len(), Some(2));
        assert_eq!(v.item(1), Some(PathValue::Bool(true)));
        assert_eq!(v.item(2), None);
        assert_eq!(v.property("x"), None);
    }

    #[test]
    fn test_decimal_materialization() {
        assert_eq!(PathValue::Decimal(Decimal::from(3)).to_value(), json!(3));
        assert_eq!(
            PathValue::Decimal(Decimal::new(2272, 2)).to_value(),
            json!(22.72)
        );
        assert_eq!(PathValue::Double(f64::NAN).to_value(), Value::Null);
        assert_eq!(PathValue::Undefined.to_value(), Value::Null);
    }

    #[test]
    fn test_deep_hash_recursion_is_bounded() {
        let mut nested = json!(1);
        for _ in 0..300 {
            nested = json!([nested]);
        }
        // Must terminate despite 300 levels of nesting.
        let _ = hash_of(&PathValue::Node(&nested));
    }
}
