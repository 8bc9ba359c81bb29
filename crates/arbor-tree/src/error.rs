//! Error types for the tree crate.

use thiserror::Error;

/// Errors produced while building, addressing or serializing trees.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TreeError {
    /// Malformed XML input.
    #[error("XML parse error: {0}")]
    Parse(String),

    /// A location expression could not be parsed.
    #[error("invalid location {input:?}: {reason}")]
    InvalidLocation { input: String, reason: String },

    /// An element was required but a text or comment node was found.
    #[error("node {0} is not an element")]
    NotAnElement(usize),

    /// Comment text that XML cannot carry (`--` inside, or a trailing `-`).
    #[error("comment {0:?} cannot be written as XML")]
    InvalidComment(String),
}

/// Convenience alias for tree results.
pub type TreeResult<T> = Result<T, TreeError>;
