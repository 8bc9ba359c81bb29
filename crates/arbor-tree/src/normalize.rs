//! Cosmetic whitespace handling.
//!
//! Indentation between elements carries no meaning for a diff. Trees are
//! collapsed before diffing so formatting-only differences never show up as
//! edits, and indentation can be restored afterwards for display.

use crate::node::{Child, Node};

/// Whether a child is a text node made only of whitespace.
pub fn is_cosmetic(child: &Child) -> bool {
    matches!(child, Child::Text(t) if is_blank(t))
}

/// Whether a string is empty or whitespace only.
pub fn is_blank(text: &str) -> bool {
    text.chars().all(char::is_whitespace)
}

/// Remove whitespace-only text children everywhere in the tree.
pub fn collapse_whitespace(node: &mut Node) {
    node.children.retain(|c| !is_cosmetic(c));
    for child in &mut node.children {
        if let Child::Element(n) = child {
            collapse_whitespace(n);
        }
    }
}

/// Join consecutive text children into one, everywhere in the tree.
///
/// XML cannot keep two adjacent text nodes apart, so every tree read back
/// from its serialized form is already merged.
pub fn merge_text(node: &mut Node) {
    let children = std::mem::take(&mut node.children);
    for child in children {
        if let (Child::Text(t), Some(Child::Text(existing))) = (&child, node.children.last_mut()) {
            existing.push_str(t);
            continue;
        }
        node.children.push(child);
    }
    for child in &mut node.children {
        if let Child::Element(n) = child {
            merge_text(n);
        }
    }
}

/// Whether any element of the tree holds two texts side by side.
pub fn has_adjacent_text(node: &Node) -> bool {
    node.children
        .windows(2)
        .any(|w| matches!(w, [Child::Text(_), Child::Text(_)]))
        || node.elements().any(has_adjacent_text)
}

/// Re-insert indentation using `unit` per nesting level.
///
/// Elements holding meaningful text keep their content untouched so mixed
/// content never gains spurious whitespace.
pub fn restore_indentation(node: &mut Node, unit: &str) {
    collapse_whitespace(node);
    indent(node, unit, 0);
}

fn indent(node: &mut Node, unit: &str, depth: usize) {
    let has_text = node
        .children
        .iter()
        .any(|c| matches!(c, Child::Text(_)));
    for child in &mut node.children {
        if let Child::Element(n) = child {
            indent(n, unit, depth + 1);
        }
    }
    if has_text || node.children.is_empty() {
        return;
    }
    let inner = format!("\n{}", unit.repeat(depth + 1));
    let outer = format!("\n{}", unit.repeat(depth));
    let children = std::mem::take(&mut node.children);
    node.children.reserve(children.len() * 2 + 1);
    for child in children {
        node.children.push(Child::Text(inner.clone()));
        node.children.push(child);
    }
    node.children.push(Child::Text(outer));
}
