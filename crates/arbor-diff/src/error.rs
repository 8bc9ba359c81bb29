//! Error types for the differ.

use std::fmt;

use arbor_patch::PatchError;
use arbor_tree::{NodeId, TreeError};

/// Which input tree an error refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Side {
    Old,
    New,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Side::Old => "old",
            Side::New => "new",
        })
    }
}

/// Errors that can occur while computing a patch.
///
/// Every variant is a correctness failure: a partial patch is never returned.
#[derive(Debug, thiserror::Error)]
pub enum DiffError {
    /// The same explicit key appears twice in one scope of one tree.
    #[error("duplicate diff key {key:?} in the {side} tree")]
    DuplicateKey {
        /// The repeated key value.
        key: String,
        /// The tree carrying the duplicate.
        side: Side,
    },

    /// A directive addresses a node that is not attached in its phase snapshot.
    #[error("phase {phase}: node {node} is not reachable in the phase snapshot")]
    UnresolvableLocation { phase: usize, node: NodeId },

    /// The must-follow relation between directives has a cycle.
    #[error("scheduling cycle: {pending} directive(s) can never become ready")]
    SchedulingCycle { pending: usize },

    /// Configuration could not be read.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// A directive failed while simulating its phase.
    #[error(transparent)]
    Patch(#[from] PatchError),

    /// Tree-level failure.
    #[error(transparent)]
    Tree(#[from] TreeError),
}

/// Convenience alias for differ results.
pub type DiffResult<T> = Result<T, DiffError>;
