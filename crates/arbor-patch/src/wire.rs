//! XML wire format for patches.
//!
//! ```xml
//! <patch>
//!     <phase>
//!         <xpath expr="/form[1]/field[2]" position="after">
//!             <xpath expr="/form[1]/field[1]" position="move"/>
//!             <label string="new"/>
//!         </xpath>
//!         <xpath expr="/form[1]/field[3]" position="attributes">
//!             <attribute name="invisible" value="1"/>
//!             <attribute name="readonly"/>
//!         </xpath>
//!     </phase>
//! </patch>
//! ```
//!
//! An `attribute` without `value` removes the attribute. Debug metadata is
//! carried as `meta-*` attributes on the directive element. Whitespace-only
//! text is cosmetic everywhere in the document.

use arbor_tree::{xml, Attributes, Child, Location, Node};

use crate::directive::{AttributeChanges, Content, Directive, Fragment, Operation, Patch, Phase, Position};
use crate::error::{PatchError, PatchResult};

const PATCH_TAG: &str = "patch";
const PHASE_TAG: &str = "phase";
const DIRECTIVE_TAG: &str = "xpath";
const ATTRIBUTE_TAG: &str = "attribute";
const EXPR_ATTR: &str = "expr";
const POSITION_ATTR: &str = "position";
const NAME_ATTR: &str = "name";
const VALUE_ATTR: &str = "value";
const META_PREFIX: &str = "meta-";

impl Patch {
    /// Render the patch as a wire tree.
    pub fn to_node(&self) -> Node {
        let mut root = Node::new(PATCH_TAG);
        for phase in &self.phases {
            let mut el = Node::new(PHASE_TAG);
            for directive in &phase.directives {
                el.children.push(Child::Element(directive_node(directive)));
            }
            root.children.push(Child::Element(el));
        }
        root
    }

    /// Compact XML rendering.
    pub fn to_xml(&self) -> PatchResult<String> {
        Ok(xml::to_string(&self.to_node())?)
    }

    /// Indented XML rendering.
    pub fn to_pretty_xml(&self) -> PatchResult<String> {
        Ok(xml::to_pretty_string(&self.to_node())?)
    }

    /// Read a patch back from its wire tree.
    pub fn from_node(node: &Node) -> PatchResult<Patch> {
        expect_tag(node, PATCH_TAG)?;
        let phases = significant(node)
            .map(|child| {
                let el = element(child, PHASE_TAG)?;
                let directives = significant(el)
                    .map(|c| read_directive(element(c, DIRECTIVE_TAG)?))
                    .collect::<PatchResult<Vec<_>>>()?;
                Ok(Phase::new(directives))
            })
            .collect::<PatchResult<Vec<_>>>()?;
        Ok(Patch { phases })
    }

    /// Parse a patch from XML text.
    pub fn from_xml(text: &str) -> PatchResult<Patch> {
        Patch::from_node(&xml::parse(text)?)
    }
}

fn directive_node(directive: &Directive) -> Node {
    let mut el = Node::new(DIRECTIVE_TAG)
        .with_attr(EXPR_ATTR, directive.target.to_string())
        .with_attr(POSITION_ATTR, directive.position().as_str());
    if let Some(meta) = &directive.metadata {
        for (name, value) in meta {
            el.attributes.insert(format!("{META_PREFIX}{name}"), value.clone());
        }
    }
    match &directive.operation {
        Operation::SetAttributes(changes) => {
            for (name, value) in changes {
                let mut attr = Node::new(ATTRIBUTE_TAG).with_attr(NAME_ATTR, name.as_str());
                if let Some(v) = value {
                    attr.attributes.insert(VALUE_ATTR.to_string(), v.clone());
                }
                el.children.push(Child::Element(attr));
            }
        }
        Operation::InsertBefore(content)
        | Operation::InsertAfter(content)
        | Operation::InsertInside(content)
        | Operation::Replace(content) => {
            el.children.extend(content.iter().map(fragment_child));
        }
    }
    el
}

fn fragment_child(fragment: &Fragment<Location>) -> Child {
    match fragment {
        Fragment::Move(location) => Child::Element(
            Node::new(DIRECTIVE_TAG)
                .with_attr(EXPR_ATTR, location.to_string())
                .with_attr(POSITION_ATTR, Position::Move.as_str()),
        ),
        Fragment::Text(t) => Child::Text(t.clone()),
        Fragment::Comment(c) => Child::Comment(c.clone()),
        Fragment::Element {
            tag,
            attributes,
            children,
        } => Child::Element(Node {
            tag: tag.clone(),
            attributes: attributes.clone(),
            children: children.iter().map(fragment_child).collect(),
        }),
    }
}

fn read_directive(el: &Node) -> PatchResult<Directive> {
    let target = expr(el)?;
    let position = position(el)?;
    let operation = match position {
        Position::Attributes => {
            let mut changes = AttributeChanges::new();
            for child in significant(el) {
                let attr = element(child, ATTRIBUTE_TAG)?;
                let name = attr
                    .attribute(NAME_ATTR)
                    .ok_or_else(|| PatchError::Wire("attribute without a name".into()))?;
                changes.insert(name.to_string(), attr.attribute(VALUE_ATTR).map(str::to_string));
            }
            Operation::SetAttributes(changes)
        }
        Position::Before => Operation::InsertBefore(read_content(el)?),
        Position::After => Operation::InsertAfter(read_content(el)?),
        Position::Inside => Operation::InsertInside(read_content(el)?),
        Position::Replace => Operation::Replace(read_content(el)?),
        Position::Move => {
            return Err(PatchError::Wire(format!(
                "move of {target} used as a top-level directive"
            )))
        }
    };
    let metadata: Attributes = el
        .attributes
        .iter()
        .filter_map(|(k, v)| Some((k.strip_prefix(META_PREFIX)?.to_string(), v.clone())))
        .collect();
    let directive = Directive::new(target, operation);
    Ok(if metadata.is_empty() {
        directive
    } else {
        directive.with_metadata(metadata)
    })
}

fn read_content(el: &Node) -> PatchResult<Content<Location>> {
    significant(el).map(read_fragment).collect()
}

fn read_fragment(child: &Child) -> PatchResult<Fragment<Location>> {
    Ok(match child {
        Child::Text(t) => Fragment::Text(t.clone()),
        Child::Comment(c) => Fragment::Comment(c.clone()),
        Child::Element(n) if is_move(n) => Fragment::Move(expr(n)?),
        Child::Element(n) => Fragment::Element {
            tag: n.tag.clone(),
            attributes: n.attributes.clone(),
            children: read_content(n)?,
        },
    })
}

fn is_move(node: &Node) -> bool {
    node.tag == DIRECTIVE_TAG && node.attribute(POSITION_ATTR) == Some(Position::Move.as_str())
}

fn expr(el: &Node) -> PatchResult<Location> {
    let raw = el
        .attribute(EXPR_ATTR)
        .ok_or_else(|| PatchError::Wire(format!("<{}> without {EXPR_ATTR}", el.tag)))?;
    Ok(raw.parse()?)
}

fn position(el: &Node) -> PatchResult<Position> {
    el.attribute(POSITION_ATTR)
        .ok_or_else(|| PatchError::Wire(format!("<{}> without {POSITION_ATTR}", el.tag)))?
        .parse()
        .map_err(PatchError::Wire)
}

fn significant(node: &Node) -> impl Iterator<Item = &Child> {
    node.children
        .iter()
        .filter(|c| !arbor_tree::normalize::is_cosmetic(c))
}

fn element<'a>(child: &'a Child, tag: &str) -> PatchResult<&'a Node> {
    match child {
        Child::Element(n) => {
            expect_tag(n, tag)?;
            Ok(n)
        }
        _ => Err(PatchError::Wire(format!("expected <{tag}>, found text or comment"))),
    }
}

fn expect_tag(node: &Node, tag: &str) -> PatchResult<()> {
    if node.tag == tag {
        Ok(())
    } else {
        Err(PatchError::Wire(format!("expected <{tag}>, found <{}>", node.tag)))
    }
}
