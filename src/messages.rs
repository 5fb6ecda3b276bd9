//! Message and abstract operation tables merged across documents.

use indexmap::IndexMap;

use crate::schema::{attribute_qname, documentation, is_wsdl, DocumentKind, ResolvedDocument};
use crate::types::QName;

/// One `wsdl:part` of a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessagePart {
    pub name: String,
    pub element: Option<QName>,
    pub type_ref: Option<QName>,
}

/// Abstract signature of a port type operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationSignature {
    /// Local name of the input message, or `""`.
    pub input_message: String,
    /// Local name of the output message, or `""`.
    pub output_message: String,
    pub documentation: String,
    /// Position of the declaring document in fetch order.
    pub document: usize,
}

/// Messages and operations from every service description.
///
/// Both tables are keyed by local name; a later declaration replaces an
/// earlier one of the same name.
#[derive(Debug, Default)]
pub struct Definitions {
    pub messages: IndexMap<String, Vec<MessagePart>>,
    pub operations: IndexMap<String, OperationSignature>,
}

impl Definitions {
    /// Fold every service description, in fetch order, into fresh tables.
    pub fn merge(docs: &[ResolvedDocument]) -> Self {
        let mut definitions = Self::default();
        for (position, doc) in docs.iter().enumerate() {
            if doc.kind == DocumentKind::ServiceDescription {
                definitions.add_document(doc, position);
            }
        }
        definitions
    }

    fn add_document(&mut self, doc: &ResolvedDocument, position: usize) {
        let root = doc.root();

        for message in root.children().filter(|n| is_wsdl(n, "message")) {
            let name = message.attribute("name").unwrap_or("").trim();
            if name.is_empty() {
                continue;
            }
            let parts = message
                .children()
                .filter(|n| is_wsdl(n, "part"))
                .map(|part| MessagePart {
                    name: part.attribute("name").unwrap_or("").trim().to_string(),
                    element: attribute_qname(&part, "element"),
                    type_ref: attribute_qname(&part, "type"),
                })
                .collect();
            self.messages.insert(name.to_string(), parts);
        }

        let operations = root
            .children()
            .filter(|n| is_wsdl(n, "portType"))
            .flat_map(|port_type| port_type.children())
            .filter(|n| is_wsdl(n, "operation"));

        for operation in operations {
            let name = operation.attribute("name").unwrap_or("").trim();
            if name.is_empty() {
                continue;
            }
            let message_of = |direction: &str| {
                operation
                    .children()
                    .find(|n| is_wsdl(n, direction))
                    .and_then(|n| attribute_qname(&n, "message"))
                    .map(|q| q.local)
                    .unwrap_or_default()
            };
            let signature = OperationSignature {
                input_message: message_of("input"),
                output_message: message_of("output"),
                documentation: documentation(&operation),
                document: position,
            };
            self.operations.insert(name.to_string(), signature);
        }
    }

    /// Parts of the named message, if it was declared anywhere.
    pub fn message(&self, name: &str) -> Option<&[MessagePart]> {
        self.messages.get(name).map(Vec::as_slice)
    }

    pub fn operation(&self, name: &str) -> Option<&OperationSignature> {
        self.operations.get(name)
    }
}
