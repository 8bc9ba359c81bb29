//! Positional addressing of nodes inside one tree snapshot.
//!
//! A [`Location`] is a list of path segments. The first segment starts at
//! the document and its first step names the root element; every later
//! segment is relative to the node the previous segment addressed. Segments
//! are split at scope boundaries, so anything addressed inside a boundary is
//! expressed relative to it:
//!
//! ```text
//! /form[1]/notebook[1]/page[2]/field[1] >> /tree[1]/field[3]
//! ```
//!
//! Steps count 1-based among siblings of the same tag (or among text / comment
//! siblings). A location is only meaningful against the snapshot it was
//! derived from.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::arena::{Arena, NodeData, NodeId};
use crate::error::TreeError;

const SEGMENT_SEPARATOR: &str = " >> ";

/// One hop from a node to one of its children.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Step {
    Element { tag: String, index: usize },
    Text { index: usize },
    Comment { index: usize },
}

impl Step {
    fn matches(&self, data: &NodeData) -> bool {
        match (self, data) {
            (Step::Element { tag, .. }, NodeData::Element { tag: t, .. }) => tag == t,
            (Step::Text { .. }, NodeData::Text(_)) => true,
            (Step::Comment { .. }, NodeData::Comment(_)) => true,
            _ => false,
        }
    }

    fn index(&self) -> usize {
        match self {
            Step::Element { index, .. } | Step::Text { index } | Step::Comment { index } => *index,
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Element { tag, index } => write!(f, "{tag}[{index}]"),
            Step::Text { index } => write!(f, "text()[{index}]"),
            Step::Comment { index } => write!(f, "comment()[{index}]"),
        }
    }
}

impl FromStr for Step {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let open = s.rfind('[').ok_or_else(|| format!("step {s:?} has no index"))?;
        let name = &s[..open];
        let index: usize = s[open + 1..]
            .strip_suffix(']')
            .ok_or_else(|| format!("step {s:?} is missing ']'"))?
            .parse()
            .map_err(|e| format!("step {s:?}: {e}"))?;
        if index == 0 {
            return Err(format!("step {s:?}: indices start at 1"));
        }
        match name {
            "text()" => Ok(Step::Text { index }),
            "comment()" => Ok(Step::Comment { index }),
            "" => Err(format!("step {s:?} has no name")),
            tag if tag.contains(|c: char| c.is_whitespace() || c == '/' || c == ']') => {
                Err(format!("step {s:?} has an invalid tag"))
            }
            tag => Ok(Step::Element {
                tag: tag.to_string(),
                index,
            }),
        }
    }
}

/// Address of a node in one tree snapshot.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Location {
    segments: Vec<Vec<Step>>,
}

impl Location {
    /// Build a location from raw segments.
    pub fn new(segments: Vec<Vec<Step>>) -> Self {
        Self { segments }
    }

    pub fn segments(&self) -> &[Vec<Step>] {
        &self.segments
    }

    /// Number of nested scopes crossed (0 for the document scope).
    pub fn depth(&self) -> usize {
        self.segments.len().saturating_sub(1)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str(SEGMENT_SEPARATOR)?;
            }
            if segment.is_empty() {
                f.write_str(".")?;
            }
            for step in segment {
                write!(f, "/{step}")?;
            }
        }
        Ok(())
    }
}

impl FromStr for Location {
    type Err = TreeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: String| TreeError::InvalidLocation {
            input: s.to_string(),
            reason,
        };
        let mut segments = Vec::new();
        for raw in s.split(SEGMENT_SEPARATOR) {
            if raw == "." {
                segments.push(Vec::new());
                continue;
            }
            let rest = raw
                .strip_prefix('/')
                .ok_or_else(|| invalid(format!("segment {raw:?} must start with '/'")))?;
            let steps = rest
                .split('/')
                .map(Step::from_str)
                .collect::<Result<Vec<_>, _>>()
                .map_err(invalid)?;
            segments.push(steps);
        }
        match segments.first() {
            Some(first) if !first.is_empty() => Ok(Location { segments }),
            _ => Err(invalid("the first segment must name the root".to_string())),
        }
    }
}

impl TryFrom<String> for Location {
    type Error = TreeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Location> for String {
    fn from(location: Location) -> Self {
        location.to_string()
    }
}

impl Arena {
    /// Derive the location of an attached node in the current snapshot.
    ///
    /// Returns `None` when the node is not reachable from the root.
    pub fn locate(&self, id: NodeId) -> Option<Location> {
        let mut chain = vec![id];
        let mut current = id;
        while let Some(parent) = self.parent(current) {
            chain.push(parent);
            current = parent;
        }
        if current != self.root() {
            return None;
        }
        chain.reverse();

        let root_tag = self.get(current).tag()?.to_string();
        let mut segments = vec![vec![Step::Element {
            tag: root_tag,
            index: 1,
        }]];
        for pair in chain.windows(2) {
            let (parent, node) = (pair[0], pair[1]);
            if parent != self.root() && self.is_boundary(parent) {
                segments.push(Vec::new());
            }
            let step = self.step_for(parent, node);
            if let Some(segment) = segments.last_mut() {
                segment.push(step);
            }
        }
        Some(Location { segments })
    }

    fn step_for(&self, parent: NodeId, node: NodeId) -> Step {
        let data = self.get(node);
        let kind = match data {
            NodeData::Element { tag, .. } => Step::Element {
                tag: tag.clone(),
                index: 0,
            },
            NodeData::Text(_) => Step::Text { index: 0 },
            NodeData::Comment(_) => Step::Comment { index: 0 },
        };
        let index = 1 + self
            .children(parent)
            .iter()
            .take_while(|&&c| c != node)
            .filter(|&&c| kind.matches(self.get(c)))
            .count();
        match kind {
            Step::Element { tag, .. } => Step::Element { tag, index },
            Step::Text { .. } => Step::Text { index },
            Step::Comment { .. } => Step::Comment { index },
        }
    }

    /// Resolve a location against the current snapshot.
    pub fn resolve(&self, location: &Location) -> Option<NodeId> {
        let mut segments = location.segments.iter();
        let first = segments.next()?;
        let (root_step, rest) = first.split_first()?;
        if root_step.index() != 1 || !root_step.matches(self.get(self.root())) {
            return None;
        }
        let mut current = self.resolve_steps(self.root(), rest)?;
        for segment in segments {
            current = self.resolve_steps(current, segment)?;
        }
        Some(current)
    }

    fn resolve_steps(&self, from: NodeId, steps: &[Step]) -> Option<NodeId> {
        steps.iter().try_fold(from, |current, step| {
            self.children(current)
                .iter()
                .copied()
                .filter(|&c| step.matches(self.get(c)))
                .nth(step.index() - 1)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Node;

    fn sample() -> Node {
        Node::new("form")
            .with_child(Node::new("div"))
            .with_text("a")
            .with_child(
                Node::new("div")
                    .with_comment("c")
                    .with_child(Node::new("span"))
                    .with_text("b"),
            )
            .with_child(Node::new("field").with_child(
                Node::new("tree").with_child(Node::new("x")).with_child(Node::new("x")),
            ))
    }

    #[test]
    fn display_and_parse_roundtrip() {
        let text = "/form[1]/field[1] >> /tree[1]/x[2]";
        let loc: Location = text.parse().unwrap();
        assert_eq!(loc.to_string(), text);
        assert_eq!(loc.depth(), 1);

        let leaf: Location = "/form[1]/div[2]/text()[1]".parse().unwrap();
        assert_eq!(leaf.segments()[0][2], Step::Text { index: 1 });
    }

    #[test]
    fn parse_rejects_malformed_input() {
        for bad in ["form[1]", "/form", "/form[0]", "/form[1]/[2]", "", " >> /a[1]"] {
            assert!(bad.parse::<Location>().is_err(), "{bad:?} should not parse");
        }
    }

    #[test]
    fn locate_counts_same_kind_siblings() {
        let arena = Arena::from_node(&sample());
        let root = arena.root();
        let second_div = arena.children(root)[2];
        let span = arena.children(second_div)[1];
        let text = arena.children(second_div)[2];
        assert_eq!(arena.locate(span).unwrap().to_string(), "/form[1]/div[2]/span[1]");
        assert_eq!(arena.locate(text).unwrap().to_string(), "/form[1]/div[2]/text()[1]");
        assert_eq!(arena.locate(root).unwrap().to_string(), "/form[1]");
    }

    #[test]
    fn locate_splits_segments_at_boundaries() {
        let mut arena = Arena::from_node(&sample());
        let root = arena.root();
        let field = arena.children(root)[3];
        arena.set_boundary(field, true);
        let tree = arena.children(field)[0];
        let second_x = arena.children(tree)[1];

        assert_eq!(arena.locate(field).unwrap().to_string(), "/form[1]/field[1]");
        let loc = arena.locate(second_x).unwrap();
        assert_eq!(loc.to_string(), "/form[1]/field[1] >> /tree[1]/x[2]");
        assert_eq!(arena.resolve(&loc), Some(second_x));
    }

    #[test]
    fn resolve_is_inverse_of_locate() {
        let arena = Arena::from_node(&sample());
        for id in arena.subtree(arena.root()) {
            let loc = arena.locate(id).unwrap();
            assert_eq!(arena.resolve(&loc), Some(id), "{loc}");
        }
    }

    #[test]
    fn detached_nodes_have_no_location() {
        let mut arena = Arena::from_node(&sample());
        let first = arena.children(arena.root())[0];
        arena.detach(first);
        assert!(arena.locate(first).is_none());
    }

    #[test]
    fn resolve_fails_on_missing_nodes() {
        let arena = Arena::from_node(&sample());
        for loc in ["/form[1]/div[3]", "/tree[1]", "/form[1]/div[1]/span[1]"] {
            assert!(arena.resolve(&loc.parse().unwrap()).is_none(), "{loc}");
        }
    }

    #[test]
    fn serde_uses_text_form() {
        let loc: Location = "/form[1]/div[2]".parse().unwrap();
        let json = serde_json::to_string(&loc).unwrap();
        assert_eq!(json, "\"/form[1]/div[2]\"");
        let back: Location = serde_json::from_str(&json).unwrap();
        assert_eq!(back, loc);
    }
}
