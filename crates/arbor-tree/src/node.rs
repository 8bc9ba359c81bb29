//! Owned document tree: elements with attributes, text and comment leaves.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Attribute map of an element.
///
/// A `BTreeMap` keeps serialization deterministic; comparison never depends
/// on the order attributes were written in.
pub type Attributes = BTreeMap<String, String>;

/// An element node. Nodes own their children exclusively.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    /// Tag name.
    pub tag: String,
    /// Attribute map.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: Attributes,
    /// Ordered children.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Child>,
}

/// One child slot of an element.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Child {
    Element(Node),
    Text(String),
    Comment(String),
}

impl Node {
    /// Create an element with no attributes and no children.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attributes: Attributes::new(),
            children: Vec::new(),
        }
    }

    /// Builder: set an attribute.
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Builder: append an element child.
    pub fn with_child(mut self, child: Node) -> Self {
        self.children.push(Child::Element(child));
        self
    }

    /// Builder: append a text child.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.children.push(Child::Text(text.into()));
        self
    }

    /// Builder: append a comment child.
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.children.push(Child::Comment(comment.into()));
        self
    }

    /// Value of an attribute, if present.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Element children, skipping text and comments.
    pub fn elements(&self) -> impl Iterator<Item = &Node> {
        self.children.iter().filter_map(|c| match c {
            Child::Element(n) => Some(n),
            _ => None,
        })
    }

    /// Number of element nodes in this subtree, including `self`.
    pub fn element_count(&self) -> usize {
        1 + self.elements().map(Node::element_count).sum::<usize>()
    }

    /// Depth-first search for the first element (including `self`) matching `pred`.
    pub fn find(&self, pred: &dyn Fn(&Node) -> bool) -> Option<&Node> {
        if pred(self) {
            return Some(self);
        }
        self.elements().find_map(|n| n.find(pred))
    }
}

impl Child {
    /// The element, if this child is one.
    pub fn as_element(&self) -> Option<&Node> {
        match self {
            Child::Element(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_element_mut(&mut self) -> Option<&mut Node> {
        match self {
            Child::Element(n) => Some(n),
            _ => None,
        }
    }
}

impl From<Node> for Child {
    fn from(node: Node) -> Self {
        Child::Element(node)
    }
}
