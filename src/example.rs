//! Example fragments for element declarations.
//!
//! [`build_example`] expands an element into an [`ExampleElement`] tree,
//! following inline and named complex types through their model groups.
//! Leaves carry the [`ValueMetadata`] of their simple type until
//! [`ExampleElement::decorate`] turns them into literal values, comments or
//! the `?` placeholder. Rendering happens last, so generated values are never
//! confused with the placeholder token.

use roxmltree::Node;

use crate::metadata::resolve_metadata;
use crate::schema::{attribute_qname, is_xsd, xsd_children, SchemaIndex};
use crate::types::{QName, ValueMetadata};

/// Deepest nesting level that is still expanded; deeper elements are
/// replaced by a truncation comment.
pub const MAX_EXAMPLE_DEPTH: usize = 16;

/// Token left in place of a value nothing could be derived for.
pub const PLACEHOLDER: &str = "?";

/// Most elements expanded for one example; elements past the budget are
/// truncated like over-deep ones.
pub const MAX_EXAMPLE_ELEMENTS: usize = 1024;

const TRUNCATED_COMMENT: &str = "maximum depth reached";

/// Limit on `complexContent` extension chains followed for one type.
const MAX_BASE_HOPS: usize = 8;

/// An element declaration, read from the schema or synthesized from a
/// message part.
#[derive(Debug, Clone)]
pub struct ElementDecl<'a, 'input> {
    pub name: String,
    pub type_ref: Option<QName>,
    pub node: Option<Node<'a, 'input>>,
    /// The node carrying `minOccurs`/`maxOccurs` (the referencing node for
    /// `ref=` particles).
    occurs: Option<Node<'a, 'input>>,
}

impl<'a, 'input> ElementDecl<'a, 'input> {
    /// Declaration backed by an `xs:element` node.
    pub fn from_node(node: Node<'a, 'input>) -> Self {
        Self {
            name: node.attribute("name").unwrap_or("").trim().to_string(),
            type_ref: attribute_qname(&node, "type"),
            node: Some(node),
            occurs: Some(node),
        }
    }

    /// Declaration with only a name and an optional type.
    pub fn synthesized(name: impl Into<String>, type_ref: Option<QName>) -> Self {
        Self {
            name: name.into(),
            type_ref,
            node: None,
            occurs: None,
        }
    }

    /// Resolve a particle, following `ref=` through the element table.
    pub fn from_particle(index: &SchemaIndex<'a, 'input>, particle: Node<'a, 'input>) -> Self {
        let Some(reference) = attribute_qname(&particle, "ref") else {
            return Self::from_node(particle);
        };
        let mut decl = match index.element(&reference) {
            Some(target) => Self::from_node(target),
            None => Self::synthesized(reference.local.clone(), None),
        };
        if decl.name.is_empty() {
            decl.name = reference.local;
        }
        decl.occurs = Some(particle);
        decl
    }

    /// True when `maxOccurs` is `unbounded` or greater than one.
    pub fn is_array(&self) -> bool {
        let Some(max) = self.occurs.and_then(|n| n.attribute("maxOccurs")) else {
            return false;
        };
        let max = max.trim();
        max == "unbounded" || max.parse::<u64>().map(|n| n > 1).unwrap_or(false)
    }

    fn inline_complex_type(&self) -> Option<Node<'a, 'input>> {
        self.node
            .and_then(|node| xsd_children(node).find(|c| is_xsd(c, "complexType")))
    }
}

/// Content of an example element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    Children(Vec<ExampleElement>),
    /// Undecorated leaf with the metadata of its type.
    Scalar(ValueMetadata),
    Value(String),
    Comment(String),
    Placeholder,
    /// Expansion stopped at [`MAX_EXAMPLE_DEPTH`] or after
    /// [`MAX_EXAMPLE_ELEMENTS`].
    Truncated,
}

/// One element of an example fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExampleElement {
    pub name: String,
    pub content: Content,
}

/// Expand `decl` into an example tree.
///
/// Recursive types are cut off at [`MAX_EXAMPLE_DEPTH`]; types that fan out
/// into several recursive children also stop once [`MAX_EXAMPLE_ELEMENTS`]
/// elements have been expanded.
pub fn build_example(index: &SchemaIndex, decl: &ElementDecl) -> ExampleElement {
    let mut budget = MAX_EXAMPLE_ELEMENTS;
    expand_element(index, decl, 0, &mut budget)
}

/// `depth` is the nesting level of `decl` itself.
fn expand_element(
    index: &SchemaIndex,
    decl: &ElementDecl,
    depth: usize,
    budget: &mut usize,
) -> ExampleElement {
    let name = decl.name.clone();
    if depth > MAX_EXAMPLE_DEPTH || *budget == 0 {
        return ExampleElement {
            name,
            content: Content::Truncated,
        };
    }
    *budget -= 1;

    let complex_type = decl.inline_complex_type().or_else(|| {
        decl.type_ref
            .as_ref()
            .and_then(|type_ref| index.complex_type(type_ref))
    });

    let content = match complex_type {
        Some(complex_type) => expand_complex_type(index, complex_type, depth, budget),
        None => Content::Scalar(resolve_metadata(index, decl.node, decl.type_ref.as_ref())),
    };
    ExampleElement { name, content }
}

fn expand_complex_type(
    index: &SchemaIndex,
    complex_type: Node,
    depth: usize,
    budget: &mut usize,
) -> Content {
    let mut children = Vec::new();
    if collect_particles(index, complex_type, depth, budget, &mut children, 0) {
        return Content::Children(children);
    }
    Content::Scalar(simple_content_metadata(index, complex_type))
}

/// Collect the child elements of a complex type (or extension). Returns
/// false when no model group was found at all.
fn collect_particles(
    index: &SchemaIndex,
    node: Node,
    depth: usize,
    budget: &mut usize,
    out: &mut Vec<ExampleElement>,
    base_hops: usize,
) -> bool {
    let mut found = false;
    for child in xsd_children(node) {
        match child.tag_name().name() {
            "sequence" | "choice" | "all" => {
                found = true;
                collect_group(index, child, depth, budget, out);
            }
            "complexContent" => {
                for derivation in xsd_children(child) {
                    if !matches!(derivation.tag_name().name(), "extension" | "restriction") {
                        continue;
                    }
                    let is_extension = derivation.tag_name().name() == "extension";
                    if is_extension && base_hops < MAX_BASE_HOPS {
                        let base = attribute_qname(&derivation, "base")
                            .and_then(|base| index.complex_type(&base));
                        if let Some(base) = base {
                            found |= collect_particles(index, base, depth, budget, out, base_hops + 1);
                        }
                    }
                    found |= collect_particles(index, derivation, depth, budget, out, base_hops);
                }
            }
            _ => {}
        }
    }
    found
}

fn collect_group(
    index: &SchemaIndex,
    group: Node,
    depth: usize,
    budget: &mut usize,
    out: &mut Vec<ExampleElement>,
) {
    for particle in xsd_children(group) {
        match particle.tag_name().name() {
            "element" => {
                let decl = ElementDecl::from_particle(index, particle);
                out.push(expand_element(index, &decl, depth + 1, budget));
            }
            "sequence" | "choice" | "all" => collect_group(index, particle, depth, budget, out),
            _ => {}
        }
    }
}

/// Metadata for a complex type without particles, taken from a
/// `simpleContent` base when there is one.
fn simple_content_metadata(index: &SchemaIndex, complex_type: Node) -> ValueMetadata {
    xsd_children(complex_type)
        .find(|c| is_xsd(c, "simpleContent"))
        .and_then(|content| xsd_children(content).next())
        .and_then(|derivation| attribute_qname(&derivation, "base"))
        .map(|base| resolve_metadata(index, None, Some(&base)))
        .unwrap_or_default()
}

impl ExampleElement {
    /// Replace every undecorated leaf with its example value, its first
    /// allowed value, a comment with its description, or the placeholder.
    pub fn decorate(self) -> Self {
        let content = match self.content {
            Content::Children(children) => {
                Content::Children(children.into_iter().map(Self::decorate).collect())
            }
            Content::Scalar(meta) => decorate_scalar(meta),
            other => other,
        };
        Self {
            name: self.name,
            content,
        }
    }

    /// Metadata of this element when it is an undecorated leaf.
    pub fn scalar_metadata(&self) -> Option<&ValueMetadata> {
        match &self.content {
            Content::Scalar(meta) => Some(meta),
            _ => None,
        }
    }

    pub fn children(&self) -> Option<&[ExampleElement]> {
        match &self.content {
            Content::Children(children) => Some(children),
            _ => None,
        }
    }

    /// Render as indented XML text.
    pub fn render(&self) -> String {
        let mut out = String::new();
        self.write(&mut out, 0);
        out
    }

    /// Write this element at `indent` levels (two spaces each), ending with
    /// a newline.
    pub fn write(&self, out: &mut String, indent: usize) {
        let pad = "  ".repeat(indent);
        match &self.content {
            Content::Children(children) if children.is_empty() => {
                out.push_str(&format!("{}<{}/>\n", pad, self.name));
            }
            Content::Children(children) => {
                out.push_str(&format!("{}<{}>\n", pad, self.name));
                for child in children {
                    child.write(out, indent + 1);
                }
                out.push_str(&format!("{}</{}>\n", pad, self.name));
            }
            Content::Scalar(_) | Content::Placeholder => {
                out.push_str(&format!("{}<{}>{}</{}>\n", pad, self.name, PLACEHOLDER, self.name));
            }
            Content::Value(value) => {
                out.push_str(&format!(
                    "{}<{}>{}</{}>\n",
                    pad,
                    self.name,
                    escape_text(value),
                    self.name
                ));
            }
            Content::Comment(text) => {
                out.push_str(&format!(
                    "{}<{}>{}</{}>\n",
                    pad,
                    self.name,
                    comment(text),
                    self.name
                ));
            }
            Content::Truncated => {
                out.push_str(&format!(
                    "{}<{}>{}</{}>\n",
                    pad,
                    self.name,
                    comment(TRUNCATED_COMMENT),
                    self.name
                ));
            }
        }
    }
}

fn decorate_scalar(meta: ValueMetadata) -> Content {
    if let Some(example) = meta.example {
        return Content::Value(example);
    }
    if let Some(first) = meta.allowed_values.into_iter().next() {
        return Content::Value(first);
    }
    match meta.description {
        Some(description) => Content::Comment(description),
        None => Content::Placeholder,
    }
}

/// Escape character data.
pub(crate) fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// An XML comment; `--` is not allowed inside comments.
pub(crate) fn comment(text: &str) -> String {
    format!("<!-- {} -->", text.replace("--", "- -"))
}
