//! Minimal XML reader and writer for [`Node`] trees.
//!
//! Only the single root element is kept; the XML declaration, processing
//! instructions and doctype are dropped. Whitespace is preserved verbatim;
//! run [`collapse_whitespace`](crate::normalize::collapse_whitespace) before
//! diffing.

use quick_xml::escape::escape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::{TreeError, TreeResult};
use crate::node::{Attributes, Child, Node};
use crate::normalize::{is_blank, restore_indentation};

/// Parse a document into its root element.
pub fn parse(xml: &str) -> TreeResult<Node> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text_start = false;
    reader.config_mut().trim_text_end = false;

    let mut stack: Vec<Node> = Vec::new();
    let mut root: Option<Node> = None;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| TreeError::Parse(format!("at byte {}: {e}", reader.buffer_position())))?;
        match event {
            Event::Start(e) => stack.push(element(&e)?),
            Event::Empty(e) => {
                let node = element(&e)?;
                attach(&mut stack, &mut root, node)?;
            }
            Event::End(_) => {
                let node = stack
                    .pop()
                    .ok_or_else(|| TreeError::Parse("unbalanced closing tag".into()))?;
                attach(&mut stack, &mut root, node)?;
            }
            Event::Text(e) => {
                let text = e.unescape().map_err(|e| TreeError::Parse(e.to_string()))?;
                push_text(&mut stack, &text)?;
            }
            Event::CData(e) => {
                let text = String::from_utf8_lossy(&e).into_owned();
                push_text(&mut stack, &text)?;
            }
            Event::Comment(e) => {
                if let Some(parent) = stack.last_mut() {
                    let text = String::from_utf8_lossy(&e).into_owned();
                    parent.children.push(Child::Comment(text));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(TreeError::Parse(format!("{} unclosed element(s)", stack.len())));
    }
    root.ok_or_else(|| TreeError::Parse("document has no root element".into()))
}

fn element(start: &BytesStart<'_>) -> TreeResult<Node> {
    let tag = std::str::from_utf8(start.name().as_ref())
        .map_err(|e| TreeError::Parse(e.to_string()))?
        .to_string();
    let mut attributes = Attributes::new();
    for attr in start.attributes() {
        let attr = attr.map_err(|e| TreeError::Parse(format!("attribute error: {e}")))?;
        let key = std::str::from_utf8(attr.key.as_ref())
            .map_err(|e| TreeError::Parse(e.to_string()))?
            .to_string();
        let value = attr
            .unescape_value()
            .map_err(|e| TreeError::Parse(e.to_string()))?
            .into_owned();
        attributes.insert(key, value);
    }
    Ok(Node {
        tag,
        attributes,
        children: Vec::new(),
    })
}

fn attach(stack: &mut [Node], root: &mut Option<Node>, node: Node) -> TreeResult<()> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(Child::Element(node)),
        None if root.is_none() => *root = Some(node),
        None => return Err(TreeError::Parse("multiple root elements".into())),
    }
    Ok(())
}

fn push_text(stack: &mut [Node], text: &str) -> TreeResult<()> {
    let Some(parent) = stack.last_mut() else {
        if is_blank(text) {
            return Ok(());
        }
        return Err(TreeError::Parse("text outside the root element".into()));
    };
    match parent.children.last_mut() {
        Some(Child::Text(existing)) => existing.push_str(text),
        _ => parent.children.push(Child::Text(text.to_string())),
    }
    Ok(())
}

/// Serialize a tree without adding whitespace.
///
/// Fails on comments containing `--` or ending in `-`, which have no XML form.
pub fn to_string(node: &Node) -> TreeResult<String> {
    let mut out = String::new();
    write_node(&mut out, node)?;
    Ok(out)
}

/// Serialize a tree with cosmetic indentation.
pub fn to_pretty_string(node: &Node) -> TreeResult<String> {
    let mut pretty = node.clone();
    restore_indentation(&mut pretty, "    ");
    to_string(&pretty)
}

fn write_node(out: &mut String, node: &Node) -> TreeResult<()> {
    out.push('<');
    out.push_str(&node.tag);
    for (name, value) in &node.attributes {
        out.push(' ');
        out.push_str(name);
        out.push_str("=\"");
        out.push_str(&escape(value.as_str()));
        out.push('"');
    }
    if node.children.is_empty() {
        out.push_str("/>");
        return Ok(());
    }
    out.push('>');
    for child in &node.children {
        match child {
            Child::Element(n) => write_node(out, n)?,
            Child::Text(t) => out.push_str(&escape(t.as_str())),
            Child::Comment(c) => {
                if c.contains("--") || c.ends_with('-') {
                    return Err(TreeError::InvalidComment(c.clone()));
                }
                out.push_str("<!--");
                out.push_str(c);
                out.push_str("-->");
            }
        }
    }
    out.push_str("</");
    out.push_str(&node.tag);
    out.push('>');
    Ok(())
}
