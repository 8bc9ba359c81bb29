//! Patch application.
//!
//! A phase is applied in two steps: every location it mentions (targets and
//! nested moves) is first resolved against the snapshot the phase starts
//! from, then the resolved directives run in order. Later directives of a
//! phase therefore never see locations shifted by earlier ones.

use tracing::{debug, trace};

use arbor_tree::{Arena, NodeData, NodeId, Node};

use crate::directive::{Content, Directive, Fragment, Operation, Patch, Phase};
use crate::error::{PatchError, PatchResult};

/// Apply every phase of `patch` to a copy of `tree`.
pub fn apply_patch(tree: &Node, patch: &Patch) -> PatchResult<Node> {
    let mut arena = Arena::from_node(tree);
    for (index, phase) in patch.phases.iter().enumerate() {
        apply_phase(&mut arena, phase, index)?;
    }
    Ok(arena.to_node()?)
}

/// Resolve and apply one phase in place.
pub fn apply_phase(arena: &mut Arena, phase: &Phase, index: usize) -> PatchResult<()> {
    let resolved = resolve_phase(arena, phase, index)?;
    for directive in &resolved {
        apply_resolved(arena, directive)?;
    }
    debug!(phase = index, directives = resolved.len(), "phase applied");
    Ok(())
}

/// Resolve every location of a phase against the current snapshot.
pub fn resolve_phase(
    arena: &Arena,
    phase: &Phase,
    index: usize,
) -> PatchResult<Vec<Directive<NodeId>>> {
    phase
        .directives
        .iter()
        .map(|d| {
            d.try_map(|location| {
                arena
                    .resolve(location)
                    .ok_or_else(|| PatchError::UnresolvableLocation {
                        phase: index,
                        location: location.clone(),
                    })
            })
        })
        .collect()
}

/// Carry out one resolved directive.
pub fn apply_resolved(arena: &mut Arena, directive: &Directive<NodeId>) -> PatchResult<()> {
    let target = directive.target;
    if !arena.is_attached(target) {
        return Err(PatchError::InvalidDirective(format!(
            "target {target} was detached earlier in the phase"
        )));
    }
    trace!(%target, position = %directive.position(), "applying directive");

    match &directive.operation {
        Operation::SetAttributes(changes) => {
            let NodeData::Element { attributes, .. } = arena.get_mut(target) else {
                return Err(PatchError::InvalidDirective(format!(
                    "cannot set attributes on non-element {target}"
                )));
            };
            for (name, value) in changes {
                match value {
                    Some(v) => {
                        attributes.insert(name.clone(), v.clone());
                    }
                    None => {
                        attributes.remove(name);
                    }
                }
            }
        }
        Operation::InsertInside(content) => {
            if !arena.get(target).is_element() {
                return Err(PatchError::InvalidDirective(format!(
                    "cannot insert inside non-element {target}"
                )));
            }
            let ids = materialize(arena, content, Some(target))?;
            let end = arena.children(target).len();
            arena.insert_children(target, end, &ids);
        }
        Operation::InsertBefore(content) | Operation::InsertAfter(content) => {
            let parent = arena.parent(target).ok_or_else(|| {
                PatchError::InvalidDirective("cannot insert beside the root".into())
            })?;
            let ids = materialize(arena, content, Some(parent))?;
            let index = anchor_index(arena, target)?;
            let at = match directive.operation {
                Operation::InsertAfter(_) => index + 1,
                _ => index,
            };
            arena.insert_children(parent, at, &ids);
        }
        Operation::Replace(content) => match arena.parent(target) {
            Some(parent) => {
                let ids = materialize(arena, content, Some(parent))?;
                let index = anchor_index(arena, target)?;
                arena.detach(target);
                arena.insert_children(parent, index, &ids);
            }
            None => {
                let ids = materialize(arena, content, None)?;
                match ids.as_slice() {
                    [only] if arena.get(*only).is_element() => arena.set_root(*only)?,
                    _ => {
                        return Err(PatchError::InvalidDirective(
                            "the root can only be replaced by exactly one element".into(),
                        ))
                    }
                }
            }
        },
    }
    Ok(())
}

fn anchor_index(arena: &Arena, target: NodeId) -> PatchResult<usize> {
    arena.index_in_parent(target).ok_or_else(|| {
        PatchError::InvalidDirective(format!("anchor {target} was moved by its own directive"))
    })
}

/// Detach every moved node, then build the content into detached nodes.
///
/// `parent` is where the content will be spliced; moving a node into its own
/// subtree is rejected.
fn materialize(
    arena: &mut Arena,
    content: &Content<NodeId>,
    parent: Option<NodeId>,
) -> PatchResult<Vec<NodeId>> {
    let moves: Vec<NodeId> = content.iter().flat_map(Fragment::moves).copied().collect();
    for &moved in &moves {
        if moved == arena.root() {
            return Err(PatchError::InvalidDirective("cannot move the root".into()));
        }
        if !arena.is_attached(moved) {
            return Err(PatchError::InvalidDirective(format!(
                "moved node {moved} is not attached"
            )));
        }
        if parent.is_some_and(|p| arena.is_ancestor_or_self(moved, p)) {
            return Err(PatchError::InvalidDirective(format!(
                "cannot move {moved} into its own subtree"
            )));
        }
    }
    for &moved in &moves {
        arena.detach(moved);
    }
    Ok(content.iter().map(|f| build(arena, f)).collect())
}

fn build(arena: &mut Arena, fragment: &Fragment<NodeId>) -> NodeId {
    match fragment {
        Fragment::Move(id) => *id,
        Fragment::Text(t) => arena.alloc(NodeData::Text(t.clone())),
        Fragment::Comment(c) => arena.alloc(NodeData::Comment(c.clone())),
        Fragment::Element {
            tag,
            attributes,
            children,
        } => {
            let id = arena.alloc(NodeData::Element {
                tag: tag.clone(),
                attributes: attributes.clone(),
            });
            let kids: Vec<NodeId> = children.iter().map(|c| build(arena, c)).collect();
            arena.insert_children(id, 0, &kids);
            id
        }
    }
}
