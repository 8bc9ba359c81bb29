//! Error types for the patch crate.

use arbor_tree::{Location, TreeError};

/// Errors that can occur while reading or applying a patch.
#[derive(Debug, thiserror::Error)]
pub enum PatchError {
    /// A location does not address any node of its phase snapshot.
    #[error("phase {phase}: location {location} does not resolve")]
    UnresolvableLocation { phase: usize, location: Location },

    /// A resolved directive cannot be carried out on the snapshot.
    #[error("invalid directive: {0}")]
    InvalidDirective(String),

    /// The wire document does not follow the patch layout.
    #[error("malformed patch document: {0}")]
    Wire(String),

    /// Tree-level failure (location syntax, XML parsing).
    #[error(transparent)]
    Tree(#[from] TreeError),
}

/// Convenience alias for patch results.
pub type PatchResult<T> = Result<T, PatchError>;
