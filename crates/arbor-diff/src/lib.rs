//! Identity-driven tree differ for Arbor.
//!
//! Compares two ordered trees and plans a [`Patch`](arbor_patch::Patch):
//! nodes are paired by diff key, only children outside the longest
//! order-preserving run are moved, and the emitted directives are grouped
//! into phases so that every location stays valid against the snapshot its
//! phase is applied to.
//!
//! # Key Types
//!
//! - [`Differ`] / [`diff`] -- Entry points
//! - [`DiffConfig`] -- Key attribute, ignored attributes, location metadata
//! - [`DiffKey`] / [`Matches`] -- Cross-tree identity
//! - [`diff_attributes`] -- Attribute map comparison
//! - [`Emitter`] / [`schedule`] -- Operation log and phase layering

pub mod attributes;
pub mod config;
pub mod differ;
pub mod emit;
pub mod error;
pub mod identity;
pub mod lis;
pub mod reconcile;
pub mod schedule;

pub use attributes::diff_attributes;
pub use config::{DiffConfig, DEFAULT_KEY_ATTRIBUTE};
pub use differ::{diff, CandidateKeyFn, Differ, NewNodeHook, SubtreePredicate};
pub use emit::{Emitter, OpId};
pub use error::{DiffError, DiffResult, Side};
pub use identity::{match_trees, CandidateKey, DiffKey, IndexedTree, Matches};
pub use lis::longest_increasing_subsequence;
pub use schedule::schedule;
