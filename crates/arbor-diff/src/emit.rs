//! Append-only log of directives over old-tree node ids.
//!
//! Besides the directives themselves the log remembers which operation
//! places every moved node, so that must-follow edges can be derived once the
//! whole tree has been reconciled:
//!
//! - an operation splicing content under `S`, or setting attributes on `S`,
//!   follows every operation that places `S` or one of its new ancestors;
//! - the removal of an old container follows every operation that places a
//!   node out of it.
//!
//! Along the first kind of edge the new-tree depth of the gating node
//! strictly decreases, and removals are never depended upon, so the relation
//! the differ builds is acyclic.

use std::collections::{BTreeSet, HashMap};

use tracing::trace;

use arbor_patch::{Directive, Operation};
use arbor_tree::{Arena, NodeId};

use crate::identity::Matches;

/// Index of an operation in the log.
pub type OpId = usize;

#[derive(Debug)]
struct Entry {
    directive: Directive<NodeId>,
    /// Node whose final address the operation waits for.
    gate: Option<NodeId>,
}

#[derive(Debug, Default)]
pub struct Emitter {
    entries: Vec<Entry>,
    placements: HashMap<NodeId, OpId>,
    removals: Vec<OpId>,
}

impl Emitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a directive gated on the final address of `gate`.
    pub fn emit(&mut self, directive: Directive<NodeId>, gate: Option<NodeId>) -> OpId {
        let op = self.entries.len();
        trace!(op, target = %directive.target, position = %directive.position(), "emit");
        for moved in directive.moves() {
            self.placements.insert(*moved, op);
        }
        self.entries.push(Entry { directive, gate });
        op
    }

    /// Append the removal of a node that has no counterpart in the new tree.
    pub fn remove(&mut self, node: NodeId) -> OpId {
        let op = self.emit(Directive::new(node, Operation::Replace(Vec::new())), None);
        self.removals.push(op);
        op
    }

    /// The operation that moves `node`, if any.
    pub fn placement(&self, node: NodeId) -> Option<OpId> {
        self.placements.get(&node).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Must-follow edges of every operation, indexed like the log.
    pub fn dependencies(&self, old: &Arena, new: &Arena, matches: &Matches) -> Vec<BTreeSet<OpId>> {
        let mut deps = vec![BTreeSet::new(); self.entries.len()];
        for (op, entry) in self.entries.iter().enumerate() {
            if let Some(gate) = entry.gate {
                self.placements_above(gate, new, matches, &mut deps[op]);
            }
        }
        for &op in &self.removals {
            let container = self.entries[op].directive.target;
            deps[op].extend(
                old.subtree(container)
                    .into_iter()
                    .skip(1)
                    .filter_map(|id| self.placement(id)),
            );
        }
        for (op, set) in deps.iter_mut().enumerate() {
            set.remove(&op);
        }
        deps
    }

    /// Placements of `node` and of every matched new ancestor of it.
    fn placements_above(
        &self,
        node: NodeId,
        new: &Arena,
        matches: &Matches,
        out: &mut BTreeSet<OpId>,
    ) {
        let mut cursor = matches.new_of(node);
        while let Some(n) = cursor {
            if let Some(op) = matches.old_of(n).and_then(|o| self.placement(o)) {
                out.insert(op);
            }
            cursor = new.parent(n);
        }
    }

    pub fn into_directives(self) -> Vec<Directive<NodeId>> {
        self.entries.into_iter().map(|e| e.directive).collect()
    }
}
