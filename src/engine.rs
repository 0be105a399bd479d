//! Selector evaluation and the query driver.
//!
//! Selectors walk the document through [`apply_segments`], emitting
//! (path, value) pairs into a [`Sink`]. The driver entry points on
//! [`JsonPath`] install a collecting sink, run the chain from the root, and
//! apply post-processing (sort by path, stable de-duplication) before
//! shaping results as values, paths, or pairs.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::{Arc, Mutex};

use log::debug;
use rayon::prelude::*;
use rust_decimal::Decimal;
use serde_json::Value;

use crate::ast::{Segment, Selector};
use crate::error::JsonPathError;
use crate::options::{ExecutionMode, Options, ProcessingFlags};
use crate::path::{NormalizedPath, PathNode};
use crate::value::PathValue;

/// Per-query evaluation state: the options in force, the derived processing
/// flags, and memoized results of root-anchored sub-queries (keyed by the
/// id assigned to each `$` at parse time). Created per top-level apply and
/// dropped when results are collected.
pub(crate) struct QueryResources<'a> {
    pub(crate) options: Options,
    pub(crate) flags: ProcessingFlags,
    root_cache: Arc<Mutex<HashMap<u32, PathValue<'a>>>>,
}

impl<'a> QueryResources<'a> {
    pub(crate) fn new(options: Options, flags: ProcessingFlags) -> Self {
        QueryResources {
            options,
            flags,
            root_cache: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// A view of the same per-query state with sequential execution, handed
    /// to the arms of a parallel union: the fork-join point is not nested.
    fn sequential_view(&self) -> Self {
        QueryResources {
            options: Options {
                execution_mode: ExecutionMode::Sequential,
                ..self.options
            },
            flags: self.flags,
            root_cache: Arc::clone(&self.root_cache),
        }
    }
}

/// Receiver for (path, value) pairs emitted by selector chains.
pub(crate) trait Sink<'a>: Send {
    fn accept(&mut self, path: &Arc<PathNode>, value: PathValue<'a>) -> Result<(), JsonPathError>;
}

/// Driver-side collector. Paths are materialized only when tracking is on.
struct NodeCollector<'a> {
    track_paths: bool,
    items: Vec<(Option<NormalizedPath>, PathValue<'a>)>,
}

impl<'a> Sink<'a> for NodeCollector<'a> {
    fn accept(&mut self, path: &Arc<PathNode>, value: PathValue<'a>) -> Result<(), JsonPathError> {
        let path = self.track_paths.then(|| path.to_normalized());
        self.items.push((path, value));
        Ok(())
    }
}

/// Collector used by `try_evaluate`: values only.
struct ValueCollector<'a> {
    values: Vec<PathValue<'a>>,
}

impl<'a> Sink<'a> for ValueCollector<'a> {
    fn accept(&mut self, _path: &Arc<PathNode>, value: PathValue<'a>) -> Result<(), JsonPathError> {
        self.values.push(value);
        Ok(())
    }
}

/// Continuation sink: feeds everything a union arm emits through the
/// remainder of the parent chain (the arms' shared tail).
struct TailSink<'s, 'i, 'a> {
    rest: &'a [Segment],
    res: &'s QueryResources<'a>,
    root: &'a Value,
    depth: usize,
    inner: &'s mut (dyn Sink<'a> + 'i),
}

impl<'a> Sink<'a> for TailSink<'_, '_, 'a> {
    fn accept(&mut self, path: &Arc<PathNode>, value: PathValue<'a>) -> Result<(), JsonPathError> {
        apply_segments(
            self.rest, self.res, self.root, path, &value, self.depth, self.inner,
        )
    }
}

/// Mutual-exclusion shim serializing a sink shared by parallel union arms.
struct MutexSink<'m, 'i, S: ?Sized> {
    shared: &'m Mutex<&'i mut S>,
}

impl<'a, S: Sink<'a> + ?Sized> Sink<'a> for MutexSink<'_, '_, S> {
    fn accept(&mut self, path: &Arc<PathNode>, value: PathValue<'a>) -> Result<(), JsonPathError> {
        self.shared.lock().unwrap().accept(path, value)
    }
}

fn extend_name(res: &QueryResources, path: &Arc<PathNode>, name: &str) -> Arc<PathNode> {
    if res.flags.paths() {
        path.child_name(name)
    } else {
        Arc::clone(path)
    }
}

fn extend_index(res: &QueryResources, path: &Arc<PathNode>, index: usize) -> Arc<PathNode> {
    if res.flags.paths() {
        path.child_index(index)
    } else {
        Arc::clone(path)
    }
}

/// Apply a selector chain to `current`, emitting matches to `sink`.
pub(crate) fn apply_segments<'a>(
    segments: &'a [Segment],
    res: &QueryResources<'a>,
    root: &'a Value,
    path: &Arc<PathNode>,
    current: &PathValue<'a>,
    depth: usize,
    sink: &mut dyn Sink<'a>,
) -> Result<(), JsonPathError> {
    let Some((segment, rest)) = segments.split_first() else {
        return sink.accept(path, current.clone());
    };

    match segment {
        Segment::Root { .. } => {
            let root_path = PathNode::root();
            apply_segments(rest, res, root, &root_path, &PathValue::Node(root), depth, sink)
        }

        Segment::Current => apply_segments(rest, res, root, path, current, depth, sink),

        Segment::Parent { depth: levels } => {
            let Some(ancestor) = path.ancestor(*levels) else {
                return Ok(());
            };
            let Some(value) = ancestor.to_normalized().resolve(root) else {
                return Ok(());
            };
            apply_segments(rest, res, root, &ancestor, &PathValue::Node(value), depth, sink)
        }

        Segment::Name(name) => {
            if let Some(value) = current.property(name) {
                let child = extend_name(res, path, name);
                apply_segments(rest, res, root, &child, &value, depth, sink)
            } else if name.as_ref() == "length"
                && let Some(len) = value_length(current)
            {
                let child = extend_name(res, path, name);
                apply_segments(rest, res, root, &child, &len, depth, sink)
            } else {
                Ok(())
            }
        }

        Segment::Index(i) => {
            let Some(len) = current.array_len() else {
                return Ok(());
            };
            let index = if *i >= 0 { *i } else { len as i64 + *i };
            if index < 0 || index >= len as i64 {
                return Ok(());
            }
            let index = index as usize;
            if let Some(value) = current.item(index) {
                let child = extend_index(res, path, index);
                apply_segments(rest, res, root, &child, &value, depth, sink)?;
            }
            Ok(())
        }

        Segment::Slice(slice) => {
            let Some(len) = current.array_len() else {
                return Ok(());
            };
            let (start, stop) = slice.bounds(len);
            let mut i = start;
            while (slice.step > 0 && i < stop) || (slice.step < 0 && i > stop) {
                if i >= 0
                    && let Some(value) = current.item(i as usize)
                {
                    let child = extend_index(res, path, i as usize);
                    apply_segments(rest, res, root, &child, &value, depth, sink)?;
                }
                i += slice.step;
            }
            Ok(())
        }

        Segment::Wildcard => {
            if let Some(items) = current.elements() {
                for (i, value) in items.iter().enumerate() {
                    let child = extend_index(res, path, i);
                    apply_segments(rest, res, root, &child, value, depth, sink)?;
                }
            } else if let Some(entries) = current.entries() {
                for (name, value) in entries {
                    let child = extend_name(res, path, name);
                    apply_segments(rest, res, root, &child, &value, depth, sink)?;
                }
            }
            Ok(())
        }

        Segment::RecursiveDescent => recursive_descent(rest, res, root, path, current, depth, sink),

        Segment::Filter(expr) => {
            if let Some(items) = current.elements() {
                for (i, value) in items.iter().enumerate() {
                    let child = extend_index(res, path, i);
                    if expr.evaluate(res, root, &child, value)?.is_truthy() {
                        apply_segments(rest, res, root, &child, value, depth, sink)?;
                    }
                }
            } else if let Some(entries) = current.entries() {
                for (name, value) in entries {
                    let child = extend_name(res, path, name);
                    if expr.evaluate(res, root, &child, &value)?.is_truthy() {
                        apply_segments(rest, res, root, &child, &value, depth, sink)?;
                    }
                }
            }
            Ok(())
        }

        Segment::Union(arms) => {
            if res.options.execution_mode == ExecutionMode::Parallel {
                let arm_res = res.sequential_view();
                let shared = Mutex::new(&mut *sink);
                arms.par_iter().try_for_each(|arm| {
                    let mut lock_sink = MutexSink { shared: &shared };
                    let mut tail = TailSink {
                        rest,
                        res: &arm_res,
                        root,
                        depth,
                        inner: &mut lock_sink,
                    };
                    apply_segments(arm.segments(), &arm_res, root, path, current, depth, &mut tail)
                })
            } else {
                for arm in arms {
                    let mut tail = TailSink {
                        rest,
                        res,
                        root,
                        depth,
                        inner: &mut *sink,
                    };
                    apply_segments(arm.segments(), res, root, path, current, depth, &mut tail)?;
                }
                Ok(())
            }
        }
    }
}

/// Preorder walk: the current node first, then every child, bounded by
/// `max_depth`.
fn recursive_descent<'a>(
    rest: &'a [Segment],
    res: &QueryResources<'a>,
    root: &'a Value,
    path: &Arc<PathNode>,
    current: &PathValue<'a>,
    depth: usize,
    sink: &mut dyn Sink<'a>,
) -> Result<(), JsonPathError> {
    if depth > res.options.max_depth {
        return Err(JsonPathError::MaxDepthExceeded {
            limit: res.options.max_depth,
        });
    }
    apply_segments(rest, res, root, path, current, depth, sink)?;
    if let Some(items) = current.elements() {
        for (i, value) in items.iter().enumerate() {
            let child = extend_index(res, path, i);
            recursive_descent(rest, res, root, &child, value, depth + 1, sink)?;
        }
    } else if let Some(entries) = current.entries() {
        for (name, value) in entries {
            let child = extend_name(res, path, name);
            recursive_descent(rest, res, root, &child, &value, depth + 1, sink)?;
        }
    }
    Ok(())
}

fn value_length<'a>(current: &PathValue<'a>) -> Option<PathValue<'a>> {
    if let Some(len) = current.array_len() {
        Some(PathValue::Decimal(Decimal::from(len)))
    } else {
        current
            .as_str()
            .map(|s| PathValue::Decimal(Decimal::from(s.chars().count())))
    }
}

impl Selector {
    /// Evaluate this chain as an expression operand: no matches is
    /// undefined, one match is the value itself, several matches wrap into
    /// a synthetic array.
    ///
    /// Root-anchored chains are element-independent, so their result is
    /// memoized per query under the id assigned at parse time.
    pub(crate) fn try_evaluate<'a>(
        &'a self,
        res: &QueryResources<'a>,
        root: &'a Value,
        last_path: &Arc<PathNode>,
        current: &PathValue<'a>,
    ) -> Result<PathValue<'a>, JsonPathError> {
        if let Some(Segment::Root { id }) = self.segments().first() {
            if let Some(hit) = res.root_cache.lock().unwrap().get(id) {
                return Ok(hit.clone());
            }
            let result = self.evaluate_matches(res, root, last_path, current)?;
            res.root_cache.lock().unwrap().insert(*id, result.clone());
            return Ok(result);
        }
        self.evaluate_matches(res, root, last_path, current)
    }

    fn evaluate_matches<'a>(
        &'a self,
        res: &QueryResources<'a>,
        root: &'a Value,
        last_path: &Arc<PathNode>,
        current: &PathValue<'a>,
    ) -> Result<PathValue<'a>, JsonPathError> {
        let mut collector = ValueCollector { values: Vec::new() };
        apply_segments(
            self.segments(),
            res,
            root,
            last_path,
            current,
            0,
            &mut collector,
        )?;
        let mut values = collector.values;
        Ok(match values.len() {
            0 => PathValue::Undefined,
            1 => values.remove(0),
            _ => PathValue::array(values),
        })
    }
}

/// A parsed JSONPath query.
///
/// Obtained from [`parse`](crate::parse); apply it to a document with the
/// three select entry points.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonPath {
    selector: Selector,
    paths_required: bool,
}

/// One query result: a normalized path and the value found there.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryNode {
    pub path: NormalizedPath,
    pub value: Value,
}

impl JsonPath {
    pub(crate) fn new(selector: Selector, paths_required: bool) -> Self {
        JsonPath {
            selector,
            paths_required,
        }
    }

    /// Parse a query. Equivalent to [`crate::parse`].
    pub fn parse(text: &str) -> Result<Self, JsonPathError> {
        crate::parser::parse(text)
    }

    /// The values matched in `root`, in emission order.
    pub fn select_values(
        &self,
        root: &Value,
        options: &Options,
    ) -> Result<Vec<Value>, JsonPathError> {
        let items = self.run(root, options, false)?;
        Ok(items.into_iter().map(|(_, value)| value.to_value()).collect())
    }

    /// The normalized paths of the matches in `root`.
    pub fn select_paths(
        &self,
        root: &Value,
        options: &Options,
    ) -> Result<Vec<NormalizedPath>, JsonPathError> {
        let items = self.run(root, options, true)?;
        Ok(items.into_iter().filter_map(|(path, _)| path).collect())
    }

    /// The matches in `root` as (path, value) pairs.
    pub fn select_nodes(
        &self,
        root: &Value,
        options: &Options,
    ) -> Result<Vec<QueryNode>, JsonPathError> {
        let items = self.run(root, options, true)?;
        Ok(items
            .into_iter()
            .filter_map(|(path, value)| {
                path.map(|path| QueryNode {
                    path,
                    value: value.to_value(),
                })
            })
            .collect())
    }

    fn run<'a>(
        &'a self,
        root: &'a Value,
        options: &Options,
        shape_needs_paths: bool,
    ) -> Result<Vec<(Option<NormalizedPath>, PathValue<'a>)>, JsonPathError> {
        let flags = ProcessingFlags::new(options, shape_needs_paths || self.paths_required);
        let res = QueryResources::new(*options, flags);
        debug!(
            "applying query {} (mode: {:?}, paths: {})",
            self.selector,
            options.execution_mode,
            flags.paths()
        );

        let mut collector = NodeCollector {
            track_paths: flags.paths(),
            items: Vec::new(),
        };
        let root_path = PathNode::root();
        apply_segments(
            self.selector.segments(),
            &res,
            root,
            &root_path,
            &PathValue::Node(root),
            0,
            &mut collector,
        )?;

        let mut items = collector.items;
        if flags.sort_by_path() {
            items.sort_by(|(a, _), (b, _)| a.cmp(b));
        }
        if flags.no_duplicates() {
            let mut seen = HashSet::new();
            items.retain(|(path, _)| match path {
                Some(path) => seen.insert(path.clone()),
                None => true,
            });
        }
        Ok(items)
    }
}

impl fmt::Display for JsonPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.selector)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Slice;
    use serde_json::json;

    fn apply(selector: Selector, root: &Value) -> Vec<Value> {
        JsonPath::new(selector, false)
            .select_values(root, &Options::default())
            .unwrap()
    }

    #[test]
    fn test_name_and_index_chain() {
        let doc = json!({"a": [{"b": 1}, {"b": 2}]});
        let selector = Selector::new(vec![
            Segment::Root { id: 0 },
            Segment::Name("a".into()),
            Segment::Index(-1),
            Segment::Name("b".into()),
        ]);
        assert_eq!(apply(selector, &doc), vec![json!(2)]);
    }

    #[test]
    fn test_wildcard_on_object_uses_iteration_order() {
        let doc = serde_json::from_str::<Value>(r#"{"b": 1, "a": 2}"#).unwrap();
        let selector = Selector::new(vec![Segment::Root { id: 0 }, Segment::Wildcard]);
        assert_eq!(apply(selector, &doc), vec![json!(1), json!(2)]);
    }

    #[test]
    fn test_recursive_descent_visits_scalar_itself() {
        let doc = json!(42);
        let selector = Selector::new(vec![Segment::Root { id: 0 }, Segment::RecursiveDescent]);
        assert_eq!(apply(selector, &doc), vec![json!(42)]);
    }

    #[test]
    fn test_recursive_descent_depth_bound() {
        let doc = json!({"a": {"b": {"c": 1}}});
        let selector = Selector::new(vec![
            Segment::Root { id: 0 },
            Segment::RecursiveDescent,
            Segment::Name("c".into()),
        ]);
        let query = JsonPath::new(selector, false);

        let deep = Options::default();
        assert_eq!(query.select_values(&doc, &deep).unwrap(), vec![json!(1)]);

        let shallow = Options {
            max_depth: 1,
            ..Options::default()
        };
        assert_eq!(
            query.select_values(&doc, &shallow),
            Err(JsonPathError::MaxDepthExceeded { limit: 1 })
        );
    }

    #[test]
    fn test_slice_reverse_emission_order() {
        let doc = json!([0, 1, 2, 3]);
        let selector = Selector::new(vec![
            Segment::Root { id: 0 },
            Segment::Slice(Slice {
                start: None,
                stop: None,
                step: -1,
            }),
        ]);
        assert_eq!(
            apply(selector, &doc),
            vec![json!(3), json!(2), json!(1), json!(0)]
        );
    }

    #[test]
    fn test_union_preserves_sequential_order() {
        let doc = json!(["a", "b", "c"]);
        let selector = Selector::new(vec![
            Segment::Root { id: 0 },
            Segment::Union(vec![
                Selector::new(vec![Segment::Index(2)]),
                Selector::new(vec![Segment::Index(0)]),
            ]),
        ]);
        assert_eq!(apply(selector, &doc), vec![json!("c"), json!("a")]);
    }

    #[test]
    fn test_parallel_union_is_set_equivalent() {
        let doc = json!({"a": [1, 2], "b": [3]});
        let selector = Selector::new(vec![
            Segment::Root { id: 0 },
            Segment::Union(vec![
                Selector::new(vec![Segment::Name("a".into()), Segment::Wildcard]),
                Selector::new(vec![Segment::Name("b".into()), Segment::Wildcard]),
            ]),
        ]);
        let query = JsonPath::new(selector, false);

        let sequential = query.select_values(&doc, &Options::default()).unwrap();
        let parallel_options = Options {
            execution_mode: ExecutionMode::Parallel,
            sort_by_path: true,
            ..Options::default()
        };
        let parallel = query.select_values(&doc, &parallel_options).unwrap();
        assert_eq!(parallel, vec![json!(1), json!(2), json!(3)]);
        assert_eq!(sequential.len(), parallel.len());
    }

    #[test]
    fn test_parent_walks_up_the_emitted_path() {
        let doc = json!({"book": {"title": "x"}});
        let selector = Selector::new(vec![
            Segment::Root { id: 0 },
            Segment::Name("book".into()),
            Segment::Name("title".into()),
            Segment::Parent { depth: 1 },
        ]);
        let query = JsonPath::new(selector, true);
        assert_eq!(
            query.select_values(&doc, &Options::default()).unwrap(),
            vec![json!({"title": "x"})]
        );
    }

    #[test]
    fn test_length_convenience_property() {
        let doc = json!({"items": [1, 2, 3], "name": "héllo"});
        let selector = Selector::new(vec![
            Segment::Root { id: 0 },
            Segment::Name("items".into()),
            Segment::Name("length".into()),
        ]);
        assert_eq!(apply(selector, &doc), vec![json!(3)]);

        let selector = Selector::new(vec![
            Segment::Root { id: 0 },
            Segment::Name("name".into()),
            Segment::Name("length".into()),
        ]);
        assert_eq!(apply(selector, &doc), vec![json!(5)]);
    }

    #[test]
    fn test_real_property_named_length_wins() {
        let doc = json!({"a": {"length": "tall"}});
        let selector = Selector::new(vec![
            Segment::Root { id: 0 },
            Segment::Name("a".into()),
            Segment::Name("length".into()),
        ]);
        assert_eq!(apply(selector, &doc), vec![json!("tall")]);
    }
}
