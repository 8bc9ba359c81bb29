//! Node identity across the two trees.
//!
//! Every element gets a [`DiffKey`]: an explicit key read from the key
//! attribute, a candidate key derived by a caller strategy, or nothing.
//! Keys are only compared inside one scope: the document scope (everything
//! below the root, not entering boundary elements) and, for every matched
//! pair of boundary elements, the scope below that pair.

use std::collections::{HashMap, HashSet, VecDeque};

use tracing::{debug, warn};

use arbor_tree::{Arena, NodeId, Node};

use crate::error::{DiffError, DiffResult, Side};

/// Derived identity for nodes without an explicit key.
pub type CandidateKey = Vec<String>;

/// Cross-tree identity of an element.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum DiffKey {
    Explicit(String),
    Candidate(CandidateKey),
    Unkeyed,
}

static UNKEYED: DiffKey = DiffKey::Unkeyed;

impl DiffKey {
    /// Compute the key of an element.
    pub fn of(
        node: &Node,
        key_attribute: &str,
        candidate: &dyn Fn(&Node) -> Option<CandidateKey>,
    ) -> Self {
        if let Some(key) = node.attribute(key_attribute) {
            return DiffKey::Explicit(key.to_string());
        }
        candidate(node).map_or(DiffKey::Unkeyed, DiffKey::Candidate)
    }

    pub fn is_keyed(&self) -> bool {
        !matches!(self, DiffKey::Unkeyed)
    }
}

/// One input tree loaded into an arena, with keys and boundary flags.
#[derive(Clone, Debug)]
pub struct IndexedTree {
    pub arena: Arena,
    keys: HashMap<NodeId, DiffKey>,
}

impl IndexedTree {
    pub fn build(
        node: &Node,
        key_of: impl Fn(&Node) -> DiffKey,
        is_subtree: impl Fn(&Node) -> bool,
    ) -> Self {
        let mut keys = HashMap::new();
        let mut boundaries = Vec::new();
        let mut arena = Arena::from_node_with(node, |id, n| {
            let key = key_of(n);
            if key.is_keyed() {
                keys.insert(id, key);
            }
            if is_subtree(n) {
                boundaries.push(id);
            }
        });
        for id in boundaries {
            arena.set_boundary(id, true);
        }
        Self { arena, keys }
    }

    pub fn key(&self, id: NodeId) -> &DiffKey {
        self.keys.get(&id).unwrap_or(&UNKEYED)
    }

    /// Scope roots: the document root, then every boundary in pre-order.
    pub fn scopes(&self) -> Vec<NodeId> {
        let root = self.arena.root();
        std::iter::once(root)
            .chain(
                self.arena
                    .subtree(root)
                    .into_iter()
                    .filter(|&id| id != root && self.arena.is_boundary(id)),
            )
            .collect()
    }

    /// Reject explicit keys used twice within one scope.
    pub fn check_duplicates(&self, side: Side) -> DiffResult<()> {
        for scope in self.scopes() {
            let mut seen = HashSet::new();
            for id in scope_members(&self.arena, scope) {
                if let DiffKey::Explicit(key) = self.key(id) {
                    if !seen.insert(key.as_str()) {
                        return Err(DiffError::DuplicateKey {
                            key: key.clone(),
                            side,
                        });
                    }
                }
            }
        }
        Ok(())
    }
}

/// Elements addressed in the scope rooted at `scope`, in pre-order.
///
/// Boundary elements belong to the enclosing scope; their descendants do not.
pub fn scope_members(arena: &Arena, scope: NodeId) -> Vec<NodeId> {
    let mut out = Vec::new();
    let mut stack: Vec<NodeId> = arena.children(scope).iter().rev().copied().collect();
    while let Some(id) = stack.pop() {
        if !arena.get(id).is_element() {
            continue;
        }
        out.push(id);
        if !arena.is_boundary(id) {
            stack.extend(arena.children(id).iter().rev());
        }
    }
    out
}

/// Bidirectional old/new pairing.
#[derive(Clone, Debug, Default)]
pub struct Matches {
    old_to_new: HashMap<NodeId, NodeId>,
    new_to_old: HashMap<NodeId, NodeId>,
}

impl Matches {
    pub fn insert(&mut self, old: NodeId, new: NodeId) {
        self.old_to_new.insert(old, new);
        self.new_to_old.insert(new, old);
    }

    /// New counterpart of an old node.
    pub fn new_of(&self, old: NodeId) -> Option<NodeId> {
        self.old_to_new.get(&old).copied()
    }

    /// Old counterpart of a new node.
    pub fn old_of(&self, new: NodeId) -> Option<NodeId> {
        self.new_to_old.get(&new).copied()
    }

    pub fn len(&self) -> usize {
        self.old_to_new.len()
    }

    pub fn is_empty(&self) -> bool {
        self.old_to_new.is_empty()
    }
}

/// Whether the two roots are the same node.
///
/// Roots carry no scope of their own, so they pair whenever the tags agree
/// and neither side has an explicit key the other lacks.
pub fn roots_pair(old: &IndexedTree, new: &IndexedTree) -> bool {
    let (o, n) = (old.arena.root(), new.arena.root());
    if old.arena.get(o).tag() != new.arena.get(n).tag() {
        return false;
    }
    match (old.key(o), new.key(n)) {
        (DiffKey::Explicit(a), DiffKey::Explicit(b)) => a == b,
        (DiffKey::Explicit(_), _) | (_, DiffKey::Explicit(_)) => false,
        _ => true,
    }
}

/// Pair every keyed element of both trees, scope by scope.
pub fn match_trees(old: &IndexedTree, new: &IndexedTree) -> Matches {
    let mut matches = Matches::default();
    let mut scopes = VecDeque::from([(old.arena.root(), new.arena.root())]);
    while let Some((old_scope, new_scope)) = scopes.pop_front() {
        for (o, n) in pair_scope(old, new, old_scope, new_scope) {
            matches.insert(o, n);
            if old.arena.is_boundary(o) {
                scopes.push_back((o, n));
            }
        }
    }
    debug!(pairs = matches.len(), "matched nodes");
    matches
}

fn pair_scope(
    old: &IndexedTree,
    new: &IndexedTree,
    old_scope: NodeId,
    new_scope: NodeId,
) -> Vec<(NodeId, NodeId)> {
    let mut explicit: HashMap<&str, NodeId> = HashMap::new();
    let mut candidates: HashMap<&CandidateKey, VecDeque<NodeId>> = HashMap::new();
    for id in scope_members(&old.arena, old_scope) {
        match old.key(id) {
            DiffKey::Explicit(key) => {
                explicit.insert(key.as_str(), id);
            }
            DiffKey::Candidate(key) => candidates.entry(key).or_default().push_back(id),
            DiffKey::Unkeyed => {}
        }
    }

    let mut pairs = Vec::new();
    for n in scope_members(&new.arena, new_scope) {
        let found = match new.key(n) {
            DiffKey::Explicit(key) => explicit.remove(key.as_str()),
            DiffKey::Candidate(key) => candidates.get_mut(key).and_then(VecDeque::pop_front),
            DiffKey::Unkeyed => None,
        };
        let Some(o) = found else { continue };
        let (old_tag, new_tag) = (old.arena.get(o).tag(), new.arena.get(n).tag());
        if old_tag != new_tag {
            warn!(key = ?new.key(n), ?old_tag, ?new_tag, "keyed nodes differ in tag, not matching");
            continue;
        }
        if old.arena.is_boundary(o) != new.arena.is_boundary(n) {
            warn!(key = ?new.key(n), "only one side is a scope boundary, not matching");
            continue;
        }
        pairs.push((o, n));
    }
    pairs
}
