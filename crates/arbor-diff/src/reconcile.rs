//! Child reconciliation for matched parent pairs.
//!
//! For one matched pair the same-parent matches are ordered by their new
//! position; the longest run whose old positions also increase stays in
//! place (the anchors) and every other matched child is moved. Between two
//! consecutive anchors lies a gap:
//!
//! - old leftovers that are all text or comments, facing the same number of
//!   new text or comment items, are replaced positionally where they differ;
//! - otherwise the old leftovers without a counterpart are removed and the
//!   whole new run is inserted once, after the previous anchor, before the
//!   next one, or inside the parent when there is no anchor at all.
//!
//! Matched nodes inside inserted runs become moves; unmatched elements become
//! literals whose own descendants are searched for moves in turn. Every pair
//! reached this way is reconciled afterwards in new-document order, so
//! directives come out top-down.

use std::collections::{BTreeSet, HashMap};

use tracing::trace;

use arbor_patch::{AttributeChanges, Content, Directive, Fragment, Operation};
use arbor_tree::normalize::is_blank;
use arbor_tree::{Arena, NodeData, NodeId, Node};

use crate::attributes::diff_attributes;
use crate::differ::NewNodeHook;
use crate::emit::Emitter;
use crate::identity::{IndexedTree, Matches};
use crate::lis::longest_increasing_subsequence;

/// Where an inserted run is spliced.
#[derive(Clone, Copy, Debug)]
enum Splice {
    After(NodeId),
    Before(NodeId),
    Inside(NodeId),
}

impl Splice {
    fn directive(self, content: Content<NodeId>) -> Directive<NodeId> {
        match self {
            Splice::After(anchor) => Directive::new(anchor, Operation::InsertAfter(content)),
            Splice::Before(anchor) => Directive::new(anchor, Operation::InsertBefore(content)),
            Splice::Inside(parent) => Directive::new(parent, Operation::InsertInside(content)),
        }
    }
}

pub struct Reconciler<'a> {
    old: &'a IndexedTree,
    new: &'a IndexedTree,
    matches: &'a Matches,
    ignored: &'a BTreeSet<String>,
    on_new_node: Option<&'a NewNodeHook>,
    emitter: Emitter,
}

impl<'a> Reconciler<'a> {
    pub fn new(
        old: &'a IndexedTree,
        new: &'a IndexedTree,
        matches: &'a Matches,
        ignored: &'a BTreeSet<String>,
        on_new_node: Option<&'a NewNodeHook>,
    ) -> Self {
        Self {
            old,
            new,
            matches,
            ignored,
            on_new_node,
            emitter: Emitter::new(),
        }
    }

    /// Reconcile both trees from their roots.
    pub fn run(mut self) -> Emitter {
        let (old_root, new_root) = (self.old.arena.root(), self.new.arena.root());
        if self.matches.new_of(old_root) == Some(new_root) {
            self.reconcile(old_root, new_root);
        } else {
            let mut pending = Vec::new();
            let content = vec![self.fragment(new_root, &mut pending)];
            self.emitter
                .emit(Directive::new(old_root, Operation::Replace(content)), None);
            for (o, n) in pending {
                self.reconcile(o, n);
            }
        }
        self.emitter
    }

    fn reconcile(&mut self, old: NodeId, new: NodeId) {
        let (old_tree, new_tree) = (self.old, self.new);
        let changes = match (
            old_tree.arena.get(old).attributes(),
            new_tree.arena.get(new).attributes(),
        ) {
            (Some(before), Some(after)) => diff_attributes(before, after, self.ignored),
            _ => AttributeChanges::new(),
        };
        if !changes.is_empty() {
            self.emitter
                .emit(Directive::new(old, Operation::SetAttributes(changes)), Some(old));
        }
        for (o, n) in self.reconcile_children(old, new) {
            self.reconcile(o, n);
        }
    }

    /// Emit the gap directives of one pair; returns the child pairs to visit.
    fn reconcile_children(&mut self, parent: NodeId, new_parent: NodeId) -> Vec<(NodeId, NodeId)> {
        let old_children = significant(&self.old.arena, parent);
        let new_children = significant(&self.new.arena, new_parent);
        let old_index: HashMap<NodeId, usize> =
            old_children.iter().enumerate().map(|(i, &c)| (c, i)).collect();

        // (new index, old index) of same-parent matches, in new order
        let kept: Vec<(usize, usize)> = new_children
            .iter()
            .enumerate()
            .filter_map(|(j, &c)| {
                let o = self.matches.old_of(c)?;
                old_index.get(&o).map(|&i| (j, i))
            })
            .collect();
        let old_positions: Vec<usize> = kept.iter().map(|&(_, i)| i).collect();
        let anchors: Vec<(usize, usize)> = longest_increasing_subsequence(&old_positions)
            .into_iter()
            .map(|k| kept[k])
            .collect();
        trace!(
            %parent,
            matched = kept.len(),
            anchors = anchors.len(),
            "reconciling children"
        );

        let mut pending = Vec::new();
        let (mut old_start, mut new_start) = (0, 0);
        let mut previous = None;
        for k in 0..=anchors.len() {
            let next = anchors.get(k).copied();
            let (new_end, old_end) = next.unwrap_or((new_children.len(), old_children.len()));
            let splice = match (previous, next) {
                (Some(anchor), _) => Splice::After(anchor),
                (None, Some((_, i))) => Splice::Before(old_children[i]),
                (None, None) => Splice::Inside(parent),
            };
            self.gap(
                parent,
                &old_children[old_start..old_end],
                &new_children[new_start..new_end],
                splice,
                &mut pending,
            );
            if let Some((j, i)) = next {
                pending.push((old_children[i], new_children[j]));
                previous = Some(old_children[i]);
                old_start = i + 1;
                new_start = j + 1;
            }
        }
        pending
    }

    fn gap(
        &mut self,
        parent: NodeId,
        old_items: &[NodeId],
        new_items: &[NodeId],
        splice: Splice,
        pending: &mut Vec<(NodeId, NodeId)>,
    ) {
        let (old_tree, new_tree) = (self.old, self.new);
        let leftovers: Vec<NodeId> = old_items
            .iter()
            .copied()
            .filter(|&c| self.matches.new_of(c).is_none())
            .collect();

        let leaves_only = leftovers.iter().all(|&c| !old_tree.arena.get(c).is_element())
            && new_items.iter().all(|&c| !new_tree.arena.get(c).is_element());
        if leaves_only && leftovers.len() == new_items.len() {
            for (&o, &n) in leftovers.iter().zip(new_items) {
                let (before, after) = (old_tree.arena.get(o), new_tree.arena.get(n));
                if before != after {
                    let content = vec![leaf(after)];
                    self.emitter
                        .emit(Directive::new(o, Operation::Replace(content)), Some(parent));
                }
            }
            return;
        }

        for o in leftovers {
            self.emitter.remove(o);
        }
        if new_items.is_empty() {
            return;
        }
        let content = new_items
            .iter()
            .map(|&n| self.fragment(n, pending))
            .collect();
        self.emitter.emit(splice.directive(content), Some(parent));
    }

    /// Content for one new node: a move when it is matched, a literal otherwise.
    fn fragment(&mut self, new: NodeId, pending: &mut Vec<(NodeId, NodeId)>) -> Fragment<NodeId> {
        let new_tree = self.new;
        let NodeData::Element { tag, attributes } = new_tree.arena.get(new) else {
            return leaf(new_tree.arena.get(new));
        };
        if let Some(old) = self.matches.old_of(new) {
            pending.push((old, new));
            return Fragment::Move(old);
        }
        let mut shell = Node {
            tag: tag.clone(),
            attributes: attributes.clone(),
            children: Vec::new(),
        };
        if let Some(hook) = self.on_new_node {
            hook(&mut shell);
        }
        let children = significant(&new_tree.arena, new)
            .into_iter()
            .map(|c| self.fragment(c, pending))
            .collect();
        Fragment::Element {
            tag: shell.tag,
            attributes: shell.attributes,
            children,
        }
    }
}

fn leaf(data: &NodeData) -> Fragment<NodeId> {
    match data {
        NodeData::Text(t) => Fragment::Text(t.clone()),
        NodeData::Comment(c) => Fragment::Comment(c.clone()),
        NodeData::Element { tag, attributes } => Fragment::Element {
            tag: tag.clone(),
            attributes: attributes.clone(),
            children: Vec::new(),
        },
    }
}

/// Children that take part in reconciliation: everything but blank text.
fn significant(arena: &Arena, id: NodeId) -> Vec<NodeId> {
    arena
        .children(id)
        .iter()
        .copied()
        .filter(|&c| !matches!(arena.get(c), NodeData::Text(t) if is_blank(t)))
        .collect()
}
