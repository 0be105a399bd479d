//! Normalized location paths.
//!
//! During evaluation every emitted value carries its location as a chain of
//! [`PathNode`]s linked parent-to-child; nodes are immutable and shared, so
//! extending a path never copies its prefix. A [`NormalizedPath`] is the
//! materialized root-to-node sequence used for result ordering,
//! de-duplication, and display.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

/// One step of a location: the document root, an object property, or an
/// array index.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathStep {
    Root,
    Name(Box<str>),
    Index(usize),
}

impl PathStep {
    /// Total order over steps: roots first, then names (ordinal), then
    /// indices (numeric). Names sorting before indices is a convention of
    /// this crate; only mixed unions under `sort_by_path` observe it.
    fn compare(&self, other: &PathStep) -> Ordering {
        match (self, other) {
            (PathStep::Root, PathStep::Root) => Ordering::Equal,
            (PathStep::Root, _) => Ordering::Less,
            (_, PathStep::Root) => Ordering::Greater,
            (PathStep::Name(a), PathStep::Name(b)) => a.cmp(b),
            (PathStep::Index(a), PathStep::Index(b)) => a.cmp(b),
            (PathStep::Name(_), PathStep::Index(_)) => Ordering::Less,
            (PathStep::Index(_), PathStep::Name(_)) => Ordering::Greater,
        }
    }
}

/// A node in a persistent parent-linked path chain.
#[derive(Debug)]
pub struct PathNode {
    parent: Option<Arc<PathNode>>,
    step: PathStep,
}

impl PathNode {
    pub fn root() -> Arc<PathNode> {
        Arc::new(PathNode {
            parent: None,
            step: PathStep::Root,
        })
    }

    pub fn child_name(self: &Arc<Self>, name: &str) -> Arc<PathNode> {
        Arc::new(PathNode {
            parent: Some(Arc::clone(self)),
            step: PathStep::Name(name.into()),
        })
    }

    pub fn child_index(self: &Arc<Self>, index: usize) -> Arc<PathNode> {
        Arc::new(PathNode {
            parent: Some(Arc::clone(self)),
            step: PathStep::Index(index),
        })
    }

    /// Walk `n` parents up the chain. `Some(self)` when `n` is zero, `None`
    /// when the chain is shorter than `n`.
    pub fn ancestor(self: &Arc<Self>, n: usize) -> Option<Arc<PathNode>> {
        let mut node = Arc::clone(self);
        for _ in 0..n {
            node = Arc::clone(node.parent.as_ref()?);
        }
        Some(node)
    }

    /// Materialize the root-to-here sequence.
    pub fn to_normalized(&self) -> NormalizedPath {
        let mut steps = Vec::new();
        let mut node = Some(self);
        while let Some(n) = node {
            steps.push(n.step.clone());
            node = n.parent.as_deref();
        }
        steps.reverse();
        NormalizedPath { steps }
    }
}

/// A materialized normalized path: the ordered steps from the root sentinel
/// to one node of the document.
///
/// Displays as `$['store']['book'][0]`, with embedded single quotes and
/// backslashes escaped.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NormalizedPath {
    steps: Vec<PathStep>,
}

impl NormalizedPath {
    pub fn steps(&self) -> &[PathStep] {
        &self.steps
    }

    /// Walk the document from `root` along this path.
    pub fn resolve<'a>(&self, root: &'a Value) -> Option<&'a Value> {
        let mut current = root;
        for step in &self.steps {
            match step {
                PathStep::Root => {}
                PathStep::Name(name) => current = current.as_object()?.get(name.as_ref())?,
                PathStep::Index(i) => current = current.as_array()?.get(*i)?,
            }
        }
        Some(current)
    }
}

impl PartialOrd for NormalizedPath {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for NormalizedPath {
    /// Lexicographic over steps; a strict prefix sorts before its extensions.
    fn cmp(&self, other: &Self) -> Ordering {
        for (a, b) in self.steps.iter().zip(other.steps.iter()) {
            match a.compare(b) {
                Ordering::Equal => {}
                unequal => return unequal,
            }
        }
        self.steps.len().cmp(&other.steps.len())
    }
}

impl fmt::Display for NormalizedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for step in &self.steps {
            match step {
                PathStep::Root => write!(f, "$")?,
                PathStep::Name(name) => {
                    write!(f, "['")?;
                    for c in name.chars() {
                        match c {
                            '\'' => write!(f, "\\'")?,
                            '\\' => write!(f, "\\\\")?,
                            _ => write!(f, "{}", c)?,
                        }
                    }
                    write!(f, "']")?;
                }
                PathStep::Index(i) => write!(f, "[{}]", i)?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn path_of(steps: &[PathStep]) -> NormalizedPath {
        let mut node = PathNode::root();
        for step in steps {
            node = match step {
                PathStep::Root => node,
                PathStep::Name(n) => node.child_name(n),
                PathStep::Index(i) => node.child_index(*i),
            };
        }
        node.to_normalized()
    }

    #[test]
    fn test_display_with_escaping() {
        let path = path_of(&[
            PathStep::Name("store".into()),
            PathStep::Name("it's".into()),
            PathStep::Index(3),
        ]);
        assert_eq!(path.to_string(), r"$['store']['it\'s'][3]");
    }

    #[test]
    fn test_shared_prefix_is_not_copied() {
        let root = PathNode::root();
        let a = root.child_name("a");
        let b = a.child_index(0);
        let c = a.child_index(1);
        assert_eq!(b.to_normalized().steps().len(), 3);
        assert_eq!(c.to_normalized().steps()[1], PathStep::Name("a".into()));
    }

    #[test]
    fn test_ancestor_walk() {
        let node = PathNode::root().child_name("a").child_index(2);
        assert_eq!(
            node.ancestor(1).unwrap().to_normalized().to_string(),
            "$['a']"
        );
        assert_eq!(node.ancestor(2).unwrap().to_normalized().to_string(), "$");
        assert!(node.ancestor(3).is_none());
    }

    #[test]
    fn test_ordering_prefix_before_extension() {
        let short = path_of(&[PathStep::Name("a".into())]);
        let long = path_of(&[PathStep::Name("a".into()), PathStep::Index(0)]);
        assert!(short < long);
    }

    #[test]
    fn test_ordering_names_before_indices() {
        let name = path_of(&[PathStep::Name("z".into())]);
        let index = path_of(&[PathStep::Index(0)]);
        assert!(name < index);

        let i1 = path_of(&[PathStep::Index(2)]);
        let i2 = path_of(&[PathStep::Index(10)]);
        assert!(i1 < i2);
    }

    #[test]
    fn test_resolve_walks_document() {
        let doc = json!({"a": [{"b": 7}]});
        let path = path_of(&[
            PathStep::Name("a".into()),
            PathStep::Index(0),
            PathStep::Name("b".into()),
        ]);
        assert_eq!(path.resolve(&doc), Some(&json!(7)));

        let missing = path_of(&[PathStep::Name("x".into())]);
        assert_eq!(missing.resolve(&doc), None);
    }
}
