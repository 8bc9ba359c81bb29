//! Ordered document trees for Arbor.
//!
//! Provides the data model every other Arbor crate builds on: owned trees of
//! elements, text and comments, a mutable index arena used as a working
//! snapshot, and positional [`Location`] addressing into such snapshots.
//!
//! # Key Types
//!
//! - [`Node`] / [`Child`] -- Owned tree (tag, attributes, children)
//! - [`Arena`] / [`NodeId`] -- Index arena used for simulation and application
//! - [`Location`] / [`Step`] -- Snapshot-relative node address
//! - [`normalize`] -- Cosmetic whitespace collapse / restore
//! - [`xml`] -- Reader and writer for fixtures and wire rendering

pub mod arena;
pub mod error;
pub mod location;
pub mod node;
pub mod normalize;
pub mod xml;

pub use arena::{Arena, NodeData, NodeId};
pub use error::{TreeError, TreeResult};
pub use location::{Location, Step};
pub use node::{Attributes, Child, Node};
pub use normalize::{collapse_whitespace, has_adjacent_text, merge_text, restore_indentation};
