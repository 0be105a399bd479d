//! Extended JSONPath query engine.
//!
//! Parses JSONPath expressions into a selector tree and evaluates them
//! against `serde_json` documents, producing matched values, normalized
//! paths, or (path, value) pairs. The dialect covers root/current anchors,
//! dot and bracket navigation, recursive descent, wildcards, unions, slices,
//! an ancestor (`^`) operator, and filter expressions with comparison,
//! arithmetic, logical, and regex-match operators plus built-in functions
//! (`length`, `sum`, `min`, `contains`, `tokenize`, ...).
//!
//! # Key Types
//!
//! - [`JsonPath`]: a parsed query, from [`parse`]
//! - [`Options`]: per-query processing options (depth bound, execution
//!   mode, de-duplication, sorting)
//! - [`NormalizedPath`]: canonical location of a match, `$['a'][0]`
//! - [`JsonPathError`]: parse and evaluation errors
//!
//! # Example
//!
//! ```
//! use jpath::{parse, JsonPathQuery, Options};
//! use serde_json::json;
//!
//! let doc = json!({"books": [
//!     {"title": "A Wild Sheep Chase", "price": 22.72},
//!     {"title": "The Night Watch", "price": 23.58},
//! ]});
//!
//! let query = parse("$.books[?@.price > 23].title")?;
//! let titles = query.select_values(&doc, &Options::default())?;
//! assert_eq!(titles, vec![json!("The Night Watch")]);
//!
//! // Or through the extension trait:
//! assert_eq!(doc.query("$.books[0].price")?, vec![json!(22.72)]);
//! # Ok::<(), jpath::JsonPathError>(())
//! ```
//!
//! Filter-expression type mismatches never fail a query; they evaluate to
//! null and the element is simply not selected. The only runtime error is
//! exceeding [`Options::max_depth`] with recursive descent.

pub mod ast;
pub mod engine;
pub mod error;
pub mod expression;
pub mod functions;
pub mod operators;
pub mod options;
pub mod parser;
pub mod path;
pub mod tokens;
pub mod value;

pub use engine::{JsonPath, QueryNode};
pub use error::JsonPathError;
pub use options::{ExecutionMode, Options};
pub use parser::parse;
pub use path::{NormalizedPath, PathStep};
pub use value::JsonKind;

use serde_json::Value;

/// Convenience entry point for one-shot queries on `serde_json` values.
pub trait JsonPathQuery {
    /// Parse `query` and return the matched values with default options.
    fn query(&self, query: &str) -> Result<Vec<Value>, JsonPathError>;
}

impl JsonPathQuery for Value {
    fn query(&self, query: &str) -> Result<Vec<Value>, JsonPathError> {
        parse(query)?.select_values(self, &Options::default())
    }
}
