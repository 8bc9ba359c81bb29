//! Index arena holding a mutable working copy of a tree.
//!
//! Nodes are addressed by [`NodeId`] (an index into a slot vector) instead of
//! references, so parent links and detached subtrees need no shared
//! ownership. Detaching a node only unlinks it; its slot stays allocated and
//! can be re-attached elsewhere, which is how moves are expressed.
//!
//! # Invariants
//!
//! - A node appears in at most one `children` list, and its `parent` points
//!   back at that list's owner.
//! - The root never has a parent.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{TreeError, TreeResult};
use crate::node::{Attributes, Child, Node};

/// Index of a slot in an [`Arena`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(usize);

impl NodeId {
    /// The raw slot index.
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Payload of one arena slot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeData {
    Element { tag: String, attributes: Attributes },
    Text(String),
    Comment(String),
}

impl NodeData {
    /// Tag name for elements.
    pub fn tag(&self) -> Option<&str> {
        match self {
            NodeData::Element { tag, .. } => Some(tag),
            _ => None,
        }
    }

    /// Attributes for elements.
    pub fn attributes(&self) -> Option<&Attributes> {
        match self {
            NodeData::Element { attributes, .. } => Some(attributes),
            _ => None,
        }
    }

    pub fn is_element(&self) -> bool {
        matches!(self, NodeData::Element { .. })
    }
}

#[derive(Clone, Debug)]
struct Slot {
    data: NodeData,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    boundary: bool,
}

/// A tree stored as a flat vector of slots.
#[derive(Clone, Debug)]
pub struct Arena {
    slots: Vec<Slot>,
    root: NodeId,
}

impl Arena {
    /// Build an arena from an owned tree.
    pub fn from_node(node: &Node) -> Self {
        Self::from_node_with(node, |_, _| {})
    }

    /// Build an arena, calling `visit` once per element in pre-order.
    ///
    /// The visitor sees the arena id together with the full source subtree,
    /// so callers can precompute properties that need the original `Node`.
    pub fn from_node_with(node: &Node, mut visit: impl FnMut(NodeId, &Node)) -> Self {
        let mut arena = Arena {
            slots: Vec::with_capacity(node.element_count()),
            root: NodeId(0),
        };
        let root = arena.build(node, None, &mut visit);
        arena.root = root;
        arena
    }

    fn build(
        &mut self,
        node: &Node,
        parent: Option<NodeId>,
        visit: &mut impl FnMut(NodeId, &Node),
    ) -> NodeId {
        let id = self.push(
            NodeData::Element {
                tag: node.tag.clone(),
                attributes: node.attributes.clone(),
            },
            parent,
        );
        visit(id, node);
        for child in &node.children {
            let child_id = match child {
                Child::Element(n) => self.build(n, Some(id), visit),
                Child::Text(t) => self.push(NodeData::Text(t.clone()), Some(id)),
                Child::Comment(c) => self.push(NodeData::Comment(c.clone()), Some(id)),
            };
            self.slots[id.0].children.push(child_id);
        }
        id
    }

    fn push(&mut self, data: NodeData, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(self.slots.len());
        self.slots.push(Slot {
            data,
            parent,
            children: Vec::new(),
            boundary: false,
        });
        id
    }

    /// The current root.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of allocated slots, attached or not.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Node payload.
    pub fn get(&self, id: NodeId) -> &NodeData {
        &self.slots[id.0].data
    }

    /// Mutable node payload.
    pub fn get_mut(&mut self, id: NodeId) -> &mut NodeData {
        &mut self.slots[id.0].data
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.slots[id.0].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.slots[id.0].children
    }

    /// Whether the node opens an independently addressed scope.
    pub fn is_boundary(&self, id: NodeId) -> bool {
        self.slots[id.0].boundary
    }

    pub fn set_boundary(&mut self, id: NodeId, boundary: bool) {
        self.slots[id.0].boundary = boundary;
    }

    /// Allocate a detached node.
    pub fn alloc(&mut self, data: NodeData) -> NodeId {
        self.push(data, None)
    }

    /// Unlink a node from its parent. No-op for the root or detached nodes.
    pub fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.slots[id.0].parent.take() {
            self.slots[parent.0].children.retain(|&c| c != id);
        }
    }

    /// Insert detached nodes into `parent` starting at `index`.
    pub fn insert_children(&mut self, parent: NodeId, index: usize, ids: &[NodeId]) {
        for &id in ids {
            debug_assert!(self.slots[id.0].parent.is_none(), "node {id} is still attached");
            self.slots[id.0].parent = Some(parent);
        }
        let children = &mut self.slots[parent.0].children;
        let index = index.min(children.len());
        children.splice(index..index, ids.iter().copied());
    }

    /// Position of `id` in its parent's child list.
    pub fn index_in_parent(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|&c| c == id)
    }

    /// Replace the root with a detached element.
    pub fn set_root(&mut self, id: NodeId) -> TreeResult<()> {
        if !self.get(id).is_element() {
            return Err(TreeError::NotAnElement(id.0));
        }
        self.detach(id);
        self.root = id;
        Ok(())
    }

    /// Whether the node is reachable from the root.
    pub fn is_attached(&self, id: NodeId) -> bool {
        self.is_ancestor_or_self(self.root, id)
    }

    /// Whether `ancestor` is `node` or one of its ancestors.
    pub fn is_ancestor_or_self(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    /// All nodes of the subtree rooted at `id`, in pre-order.
    pub fn subtree(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            out.push(current);
            stack.extend(self.children(current).iter().rev());
        }
        out
    }

    /// Rebuild an owned tree from the attached part of the arena.
    pub fn to_node(&self) -> TreeResult<Node> {
        self.node_at(self.root)
    }

    /// Rebuild the owned subtree rooted at an element.
    pub fn node_at(&self, id: NodeId) -> TreeResult<Node> {
        let NodeData::Element { tag, attributes } = self.get(id) else {
            return Err(TreeError::NotAnElement(id.0));
        };
        let mut node = Node {
            tag: tag.clone(),
            attributes: attributes.clone(),
            children: Vec::with_capacity(self.children(id).len()),
        };
        for &child in self.children(id) {
            node.children.push(match self.get(child) {
                NodeData::Element { .. } => Child::Element(self.node_at(child)?),
                NodeData::Text(t) => Child::Text(t.clone()),
                NodeData::Comment(c) => Child::Comment(c.clone()),
            });
        }
        Ok(node)
    }
}
