//! Selector tree types.
//!
//! A parsed query is a [`Selector`]: a linear chain of [`Segment`]s applied
//! left to right. Union segments own one sub-chain per arm and share the
//! remainder of the parent chain as a common tail.

use std::fmt;

use crate::tokens::Expression;

/// A composed selector chain. Applying it to a document yields zero or more
/// (path, value) pairs.
#[derive(Debug, Clone, PartialEq)]
pub struct Selector {
    pub(crate) segments: Vec<Segment>,
}

impl Selector {
    pub(crate) fn new(segments: Vec<Segment>) -> Self {
        Selector { segments }
    }

    pub(crate) fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Whether any segment (including those inside filter expressions)
    /// requires path tracking to evaluate.
    pub(crate) fn requires_paths(&self) -> bool {
        self.segments.iter().any(Segment::requires_paths)
    }
}

/// One step of a selector chain.
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    /// `$` — anchors at the document root. The id keys per-query
    /// memoization of repeated root sub-queries inside filters.
    Root { id: u32 },
    /// `@` — forwards the current value.
    Current,
    /// `^` repeated `depth` times — walks back up the emitted path.
    Parent { depth: usize },
    /// `.name` / `['name']`
    Name(Box<str>),
    /// `[i]`, negative counts from the end.
    Index(i64),
    /// `[start:stop:step]`
    Slice(Slice),
    /// `.*` / `[*]`
    Wildcard,
    /// `..`
    RecursiveDescent,
    /// `[?expr]`
    Filter(Expression),
    /// `[arm, arm, ...]`
    Union(Vec<Selector>),
}

impl Segment {
    fn requires_paths(&self) -> bool {
        match self {
            Segment::Parent { .. } => true,
            Segment::Union(arms) => arms.iter().any(Selector::requires_paths),
            Segment::Filter(expr) => expr.requires_paths(),
            _ => false,
        }
    }
}

/// An array slice with optional bounds and a non-zero step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slice {
    pub start: Option<i64>,
    pub stop: Option<i64>,
    pub step: i64,
}

impl Slice {
    /// Resolve the bounds against a concrete array length, yielding the
    /// iteration as (start, stop) clamped for the step direction.
    pub(crate) fn bounds(&self, len: usize) -> (i64, i64) {
        let len = len as i64;
        if self.step > 0 {
            let start = normalize(self.start.unwrap_or(0), len).clamp(0, len);
            let stop = normalize(self.stop.unwrap_or(len), len).clamp(0, len);
            (start, stop)
        } else {
            let start = normalize(self.start.unwrap_or(len - 1), len).clamp(-1, len - 1);
            let stop = normalize(self.stop.unwrap_or(-len - 1), len).clamp(-1, len - 1);
            (start, stop)
        }
    }
}

fn normalize(index: i64, len: i64) -> i64 {
    if index >= 0 { index } else { len + index }
}

fn write_quoted(f: &mut fmt::Formatter<'_>, name: &str) -> fmt::Result {
    write!(f, "'")?;
    for c in name.chars() {
        match c {
            '\'' => write!(f, "\\'")?,
            '\\' => write!(f, "\\\\")?,
            _ => write!(f, "{}", c)?,
        }
    }
    write!(f, "'")
}

impl Segment {
    /// Render without surrounding brackets, as a union arm or bracket body.
    fn fmt_inner(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Name(name) => write_quoted(f, name),
            Segment::Index(i) => write!(f, "{}", i),
            Segment::Slice(slice) => {
                if let Some(start) = slice.start {
                    write!(f, "{}", start)?;
                }
                write!(f, ":")?;
                if let Some(stop) = slice.stop {
                    write!(f, "{}", stop)?;
                }
                if slice.step != 1 {
                    write!(f, ":{}", slice.step)?;
                }
                Ok(())
            }
            Segment::Wildcard => write!(f, "*"),
            Segment::Filter(expr) => write!(f, "?{}", expr),
            _ => fmt::Display::fmt(self, f),
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Root { .. } => write!(f, "$"),
            Segment::Current => write!(f, "@"),
            Segment::Parent { depth } => {
                for _ in 0..*depth {
                    write!(f, "^")?;
                }
                Ok(())
            }
            Segment::RecursiveDescent => write!(f, ".."),
            Segment::Union(arms) => {
                write!(f, "[")?;
                for (i, arm) in arms.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{}", arm)?;
                }
                write!(f, "]")
            }
            Segment::Name(_)
            | Segment::Index(_)
            | Segment::Slice(_)
            | Segment::Wildcard
            | Segment::Filter(_) => {
                write!(f, "[")?;
                self.fmt_inner(f)?;
                write!(f, "]")
            }
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // A single unanchored segment (a union arm) renders in inner form.
        if self.segments.len() == 1
            && !matches!(self.segments[0], Segment::Root { .. } | Segment::Current)
        {
            return self.segments[0].fmt_inner(f);
        }
        for segment in &self.segments {
            write!(f, "{}", segment)?;
        }
        Ok(())
    }
}
