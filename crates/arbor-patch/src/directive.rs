//! Edit directives and their grouping into phases.
//!
//! Directives are generic over how they reference nodes: `R = Location` for
//! patches exchanged with consumers, `R = NodeId` once every location of a
//! phase has been resolved against its snapshot.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use arbor_tree::{Attributes, Child, Location, Node};

/// Attribute edits: `Some(value)` sets, `None` removes.
pub type AttributeChanges = BTreeMap<String, Option<String>>;

/// One item of inserted content.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", bound(deserialize = "R: Deserialize<'de>"))]
pub enum Fragment<R> {
    /// A literal element whose children may themselves contain moves.
    Element {
        tag: String,
        #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
        attributes: Attributes,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        children: Vec<Fragment<R>>,
    },
    Text(String),
    Comment(String),
    /// Relocate the node currently at this reference into the content.
    Move(R),
}

/// Ordered content spliced by insert and replace directives.
pub type Content<R> = Vec<Fragment<R>>;

impl<R> Fragment<R> {
    /// A literal copy of an owned tree.
    pub fn literal(node: &Node) -> Self {
        Fragment::Element {
            tag: node.tag.clone(),
            attributes: node.attributes.clone(),
            children: node.children.iter().map(Fragment::from_child).collect(),
        }
    }

    fn from_child(child: &Child) -> Self {
        match child {
            Child::Element(n) => Fragment::literal(n),
            Child::Text(t) => Fragment::Text(t.clone()),
            Child::Comment(c) => Fragment::Comment(c.clone()),
        }
    }

    /// Every move reference in this fragment, in document order.
    pub fn moves(&self) -> Vec<&R> {
        let mut out = Vec::new();
        self.collect_moves(&mut out);
        out
    }

    fn collect_moves<'a>(&'a self, out: &mut Vec<&'a R>) {
        match self {
            Fragment::Move(r) => out.push(r),
            Fragment::Element { children, .. } => {
                for child in children {
                    child.collect_moves(out);
                }
            }
            Fragment::Text(_) | Fragment::Comment(_) => {}
        }
    }

    /// Translate every reference, failing on the first error.
    pub fn try_map<S, E>(&self, f: &mut impl FnMut(&R) -> Result<S, E>) -> Result<Fragment<S>, E> {
        Ok(match self {
            Fragment::Element {
                tag,
                attributes,
                children,
            } => Fragment::Element {
                tag: tag.clone(),
                attributes: attributes.clone(),
                children: children
                    .iter()
                    .map(|c| c.try_map(f))
                    .collect::<Result<_, _>>()?,
            },
            Fragment::Text(t) => Fragment::Text(t.clone()),
            Fragment::Comment(c) => Fragment::Comment(c.clone()),
            Fragment::Move(r) => Fragment::Move(f(r)?),
        })
    }
}

/// The vocabulary of the `position` field on the wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Position {
    Before,
    After,
    Inside,
    Replace,
    Attributes,
    Move,
}

impl Position {
    pub fn as_str(self) -> &'static str {
        match self {
            Position::Before => "before",
            Position::After => "after",
            Position::Inside => "inside",
            Position::Replace => "replace",
            Position::Attributes => "attributes",
            Position::Move => "move",
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Position {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "before" => Position::Before,
            "after" => Position::After,
            "inside" => Position::Inside,
            "replace" => Position::Replace,
            "attributes" => Position::Attributes,
            "move" => Position::Move,
            other => return Err(format!("unknown position {other:?}")),
        })
    }
}

/// What a directive does at its target.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation<R> {
    InsertBefore(Content<R>),
    InsertAfter(Content<R>),
    InsertInside(Content<R>),
    /// Replace the target by the content; empty content removes it.
    Replace(Content<R>),
    SetAttributes(AttributeChanges),
}

impl<R> Operation<R> {
    pub fn position(&self) -> Position {
        match self {
            Operation::InsertBefore(_) => Position::Before,
            Operation::InsertAfter(_) => Position::After,
            Operation::InsertInside(_) => Position::Inside,
            Operation::Replace(_) => Position::Replace,
            Operation::SetAttributes(_) => Position::Attributes,
        }
    }

    /// Spliced content, for every operation but attribute edits.
    pub fn content(&self) -> Option<&Content<R>> {
        match self {
            Operation::InsertBefore(c)
            | Operation::InsertAfter(c)
            | Operation::InsertInside(c)
            | Operation::Replace(c) => Some(c),
            Operation::SetAttributes(_) => None,
        }
    }

    /// Whether this is a `Replace` with no content.
    pub fn is_removal(&self) -> bool {
        matches!(self, Operation::Replace(c) if c.is_empty())
    }
}

/// A single location-addressed edit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Directive<R = Location> {
    pub target: R,
    pub operation: Operation<R>,
    /// Original attributes of the target, carried for debugging only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Attributes>,
}

impl<R> Directive<R> {
    pub fn new(target: R, operation: Operation<R>) -> Self {
        Self {
            target,
            operation,
            metadata: None,
        }
    }

    pub fn with_metadata(mut self, metadata: Attributes) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn position(&self) -> Position {
        self.operation.position()
    }

    /// Move references carried by the content, in document order.
    pub fn moves(&self) -> Vec<&R> {
        self.operation
            .content()
            .map(|c| c.iter().flat_map(Fragment::moves).collect())
            .unwrap_or_default()
    }

    /// Translate the target and every nested reference.
    pub fn try_map<S, E>(&self, mut f: impl FnMut(&R) -> Result<S, E>) -> Result<Directive<S>, E> {
        let target = f(&self.target)?;
        let operation = match &self.operation {
            Operation::InsertBefore(c) => Operation::InsertBefore(map_content(c, &mut f)?),
            Operation::InsertAfter(c) => Operation::InsertAfter(map_content(c, &mut f)?),
            Operation::InsertInside(c) => Operation::InsertInside(map_content(c, &mut f)?),
            Operation::Replace(c) => Operation::Replace(map_content(c, &mut f)?),
            Operation::SetAttributes(changes) => Operation::SetAttributes(changes.clone()),
        };
        Ok(Directive {
            target,
            operation,
            metadata: self.metadata.clone(),
        })
    }
}

fn map_content<R, S, E>(
    content: &Content<R>,
    f: &mut impl FnMut(&R) -> Result<S, E>,
) -> Result<Content<S>, E> {
    content.iter().map(|frag| frag.try_map(f)).collect()
}

/// Directives addressed against one common snapshot.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Phase {
    pub directives: Vec<Directive>,
}

impl Phase {
    pub fn new(directives: Vec<Directive>) -> Self {
        Self { directives }
    }

    pub fn len(&self) -> usize {
        self.directives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.directives.is_empty()
    }
}

/// Ordered phases; applying them in order to the old tree yields the new one.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Patch {
    pub phases: Vec<Phase>,
}

impl Patch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the patch has no phases.
    pub fn is_empty(&self) -> bool {
        self.phases.is_empty()
    }

    /// Number of phases.
    pub fn len(&self) -> usize {
        self.phases.len()
    }

    /// All directives across phases, in application order.
    pub fn directives(&self) -> impl Iterator<Item = &Directive> {
        self.phases.iter().flat_map(|p| p.directives.iter())
    }

    pub fn directive_count(&self) -> usize {
        self.phases.iter().map(Phase::len).sum()
    }

    /// Number of move references across all directives.
    pub fn move_count(&self) -> usize {
        self.directives().map(|d| d.moves().len()).sum()
    }
}
