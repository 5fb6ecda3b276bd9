//! Parsed documents and the schema declaration index.
//!
//! Every loaded document is classified by its root element. Service
//! descriptions and standalone schemas contribute their top-level
//! `element`, `complexType` and `simpleType` declarations to one
//! [`SchemaIndex`], keyed by namespace-qualified name.

use indexmap::IndexMap;
use roxmltree::{Document, Node};
use url::Url;

use crate::error::ParseError;
use crate::loader::{parse_document, LoadedSource};
use crate::types::{QName, WSDL_NS, XSD_NS};

/// How a document participates in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    /// WSDL `definitions`: messages, port types, bindings, embedded schemas.
    ServiceDescription,
    /// Standalone XML Schema, usually pulled in by an import.
    Schema,
    /// Anything else; handed to the manifest parser.
    Manifest,
}

/// Classify a document by the name of its root element.
pub fn classify(doc: &Document) -> DocumentKind {
    let root = doc.root_element();
    let name = root.tag_name();
    match (name.namespace(), name.name()) {
        (_, "definitions") => DocumentKind::ServiceDescription,
        (Some(XSD_NS), "schema") => DocumentKind::Schema,
        _ => DocumentKind::Manifest,
    }
}

/// A loaded source together with its parsed tree.
pub struct ResolvedDocument<'input> {
    pub url: &'input Url,
    pub document: Document<'input>,
    pub kind: DocumentKind,
}

impl<'input> ResolvedDocument<'input> {
    /// Parse a loaded source.
    pub fn parse(source: &'input LoadedSource) -> Result<Self, ParseError> {
        let document = parse_document(&source.url, &source.text)?;
        let kind = classify(&document);
        Ok(Self {
            url: &source.url,
            document,
            kind,
        })
    }

    /// The root element's `targetNamespace`, or `""`.
    pub fn target_namespace(&self) -> &str {
        self.document
            .root_element()
            .attribute("targetNamespace")
            .unwrap_or("")
    }

    pub fn root(&self) -> Node<'_, 'input> {
        self.document.root_element()
    }
}

/// True if `node` is an XML Schema element named `local`.
pub(crate) fn is_xsd(node: &Node, local: &str) -> bool {
    node.is_element() && node.has_tag_name((XSD_NS, local))
}

/// True if `node` is a WSDL element named `local`.
pub(crate) fn is_wsdl(node: &Node, local: &str) -> bool {
    node.is_element() && node.has_tag_name((WSDL_NS, local))
}

/// Element children of `node` in the XML Schema namespace.
pub(crate) fn xsd_children<'a, 'input>(
    node: Node<'a, 'input>,
) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children()
        .filter(|child| child.is_element() && child.tag_name().namespace() == Some(XSD_NS))
}

/// Resolve a prefixed name such as `tns:Order` using the namespaces in
/// scope at `node`. Unknown prefixes resolve to the empty namespace.
pub(crate) fn resolve_qname(node: &Node, value: &str) -> QName {
    let value = value.trim();
    match value.split_once(':') {
        Some((prefix, local)) => {
            let namespace = node.lookup_namespace_uri(Some(prefix)).unwrap_or("");
            QName::new(namespace, local)
        }
        None => {
            let namespace = node.lookup_namespace_uri(None).unwrap_or("");
            QName::new(namespace, value)
        }
    }
}

/// Resolve a QName-valued attribute, skipping empty values.
pub(crate) fn attribute_qname(node: &Node, attribute: &str) -> Option<QName> {
    node.attribute(attribute)
        .filter(|value| !value.trim().is_empty())
        .map(|value| resolve_qname(node, value))
}

/// Text of a `wsdl:documentation` or `xs:annotation/xs:documentation` child.
pub(crate) fn documentation(node: &Node) -> String {
    let direct = node
        .children()
        .find(|child| child.is_element() && child.tag_name().name() == "documentation");
    let annotated = || {
        node.children()
            .find(|child| is_xsd(child, "annotation"))
            .and_then(|annotation| {
                annotation
                    .children()
                    .find(|child| is_xsd(child, "documentation"))
            })
    };

    direct
        .or_else(annotated)
        .map(|doc| {
            doc.descendants()
                .filter(|n| n.is_text())
                .filter_map(|n| n.text())
                .collect::<String>()
                .trim()
                .to_string()
        })
        .unwrap_or_default()
}

/// Top-level schema declarations from every loaded document.
///
/// Later documents overwrite earlier ones on name collision.
#[derive(Debug, Default)]
pub struct SchemaIndex<'a, 'input> {
    pub elements: IndexMap<QName, Node<'a, 'input>>,
    pub complex_types: IndexMap<QName, Node<'a, 'input>>,
    pub simple_types: IndexMap<QName, Node<'a, 'input>>,
}

impl<'a, 'input> SchemaIndex<'a, 'input> {
    /// Build the index by one pass over `docs` in fetch order.
    pub fn build(docs: &'a [ResolvedDocument<'input>]) -> Self {
        let mut index = Self::default();
        for doc in docs {
            if doc.kind == DocumentKind::Manifest {
                continue;
            }
            let fallback_ns = doc.target_namespace();
            for schema in doc.root().descendants().filter(|n| is_xsd(n, "schema")) {
                index.add_schema(schema, fallback_ns);
            }
        }
        index
    }

    fn add_schema(&mut self, schema: Node<'a, 'input>, fallback_ns: &str) {
        let target_ns = schema.attribute("targetNamespace").unwrap_or(fallback_ns);

        for decl in xsd_children(schema) {
            let table = match decl.tag_name().name() {
                "element" => &mut self.elements,
                "complexType" => &mut self.complex_types,
                "simpleType" => &mut self.simple_types,
                _ => continue,
            };
            let name = decl.attribute("name").unwrap_or("").trim();
            if name.is_empty() {
                continue;
            }
            table.insert(QName::new(target_ns, name), decl);
        }
    }

    pub fn element(&self, name: &QName) -> Option<Node<'a, 'input>> {
        self.elements.get(name).copied()
    }

    pub fn complex_type(&self, name: &QName) -> Option<Node<'a, 'input>> {
        self.complex_types.get(name).copied()
    }

    pub fn simple_type(&self, name: &QName) -> Option<Node<'a, 'input>> {
        self.simple_types.get(name).copied()
    }
}
