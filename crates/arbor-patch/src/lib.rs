//! Phased edit patches for Arbor trees.
//!
//! A [`Patch`] is an ordered list of [`Phase`]s. Every location inside a
//! phase is addressed against the tree as it stands when that phase begins;
//! applying the phases in order turns the old tree into the new one.
//!
//! # Key Types
//!
//! - [`Directive`] / [`Operation`] -- One location-addressed edit
//! - [`Fragment`] -- Inserted content: literals and moves of existing nodes
//! - [`apply`] -- Two-step phase application (resolve, then execute)
//! - [`wire`] -- `<patch>/<phase>/<xpath>` XML rendering and parsing

pub mod apply;
pub mod directive;
pub mod error;
pub mod wire;

pub use apply::{apply_patch, apply_phase, apply_resolved, resolve_phase};
pub use directive::{
    AttributeChanges, Content, Directive, Fragment, Operation, Patch, Phase, Position,
};
pub use error::{PatchError, PatchResult};
