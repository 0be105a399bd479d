use thiserror::Error;

/// Errors surfaced by parsing or evaluating a JSONPath query.
///
/// Type mismatches inside filter expressions are never errors: they are
/// recovered locally as null/empty results (see the crate docs).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JsonPathError {
    #[error("Parse error at line {line}, column {column}: {message}")]
    Parse {
        line: u32,
        column: u32,
        message: String,
    },

    #[error("Maximum depth {limit} exceeded by recursive descent")]
    MaxDepthExceeded { limit: usize },

    #[error("Internal invariant violated: {0}")]
    Internal(String),
}

impl JsonPathError {
    pub fn parse(line: u32, column: u32, message: impl Into<String>) -> Self {
        Self::Parse {
            line,
            column,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }
}
