//! Core types for catalog parsing.

use std::fmt;

use serde::{Deserialize, Serialize};

/// WSDL 1.1 namespace.
pub const WSDL_NS: &str = "http://schemas.xmlsoap.org/wsdl/";

/// XML Schema namespace.
pub const XSD_NS: &str = "http://www.w3.org/2001/XMLSchema";

/// WSDL SOAP 1.1 binding extension namespace.
pub const SOAP11_BINDING_NS: &str = "http://schemas.xmlsoap.org/wsdl/soap/";

/// WSDL SOAP 1.2 binding extension namespace.
pub const SOAP12_BINDING_NS: &str = "http://schemas.xmlsoap.org/wsdl/soap12/";

/// SOAP 1.1 envelope namespace.
pub const SOAP11_ENVELOPE_NS: &str = "http://schemas.xmlsoap.org/soap/envelope/";

/// SOAP 1.2 envelope namespace.
pub const SOAP12_ENVELOPE_NS: &str = "http://www.w3.org/2003/05/soap-envelope";

/// Namespace-qualified name used as the key of every lookup table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QName {
    pub namespace: String,
    pub local: String,
}

impl QName {
    pub fn new(namespace: impl Into<String>, local: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            local: local.into(),
        }
    }

    /// True for names in the XML Schema namespace (built-in types).
    pub fn is_xsd(&self) -> bool {
        self.namespace == XSD_NS
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.namespace.is_empty() {
            f.write_str(&self.local)
        } else {
            write!(f, "{{{}}}{}", self.namespace, self.local)
        }
    }
}

/// Input of a parse: where to start and whether to chase imports.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseRequest {
    /// Primary descriptor location (absolute URL).
    pub primary_source: Option<String>,
    /// Extra descriptor locations, fetched after the primary one in order.
    #[serde(default)]
    pub additional_sources: Vec<String>,
    /// Whether WSDL/XSD imports and includes are fetched as well.
    #[serde(default)]
    pub follow_imports: bool,
}

impl ParseRequest {
    /// Create a request for a primary source with imports disabled.
    pub fn new(primary_source: impl Into<String>) -> Self {
        Self {
            primary_source: Some(primary_source.into()),
            additional_sources: Vec::new(),
            follow_imports: false,
        }
    }

    /// Append an additional source.
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.additional_sources.push(source.into());
        self
    }

    /// Set whether imports and includes are followed.
    pub fn follow_imports(mut self, follow: bool) -> Self {
        self.follow_imports = follow;
        self
    }

    /// All requested locations, primary first.
    pub fn locations(&self) -> impl Iterator<Item = &str> {
        self.primary_source
            .iter()
            .chain(self.additional_sources.iter())
            .map(String::as_str)
    }
}

/// Description, example, and allowed values derived for one type reference.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValueMetadata {
    pub description: Option<String>,
    pub example: Option<String>,
    pub allowed_values: Vec<String>,
}

impl ValueMetadata {
    pub fn is_empty(&self) -> bool {
        self.description.is_none() && self.example.is_none() && self.allowed_values.is_empty()
    }
}

/// One input parameter of an operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterDescriptor {
    pub name: String,
    pub type_name: Option<String>,
    /// Set from `maxOccurs` or a manifest's array flag. Message parts refer
    /// to global elements or types, which never carry `maxOccurs`, so this
    /// stays false for operations read from a WSDL.
    pub is_array: bool,
    /// Example XML fragment with concrete values filled in.
    pub example: String,
    pub documentation: String,
    pub value_description: Option<String>,
    pub example_value: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allowed_values: Vec<String>,
}

/// One callable operation with its example request envelope.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationDescriptor {
    pub name: String,
    pub soap_action: String,
    pub input_message: String,
    pub output_message: String,
    pub documentation: String,
    pub example_envelope: String,
    pub parameters: Vec<ParameterDescriptor>,
    /// Absolute URL of the document that declared the operation.
    pub source: String,
}

/// Output of a parse.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseResult {
    /// Operations in document, binding, operation order.
    pub operations: Vec<OperationDescriptor>,
    /// Every fetched source in fetch order.
    pub sources: Vec<String>,
}

impl ParseResult {
    /// True when the parse succeeded but found no operations.
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn qname_display() {
        assert_eq!(QName::new("", "Foo").to_string(), "Foo");
        assert_eq!(
            QName::new("urn:test", "Foo").to_string(),
            "{urn:test}Foo"
        );
        assert!(QName::new(XSD_NS, "string").is_xsd());
    }

    #[test]
    fn request_builder_orders_locations() {
        let request = ParseRequest::new("http://a/x.wsdl")
            .with_source("http://b/y.wsdl")
            .with_source("http://c/z.wsdl")
            .follow_imports(true);

        let locations: Vec<&str> = request.locations().collect();
        assert_eq!(
            locations,
            vec!["http://a/x.wsdl", "http://b/y.wsdl", "http://c/z.wsdl"]
        );
        assert!(request.follow_imports);
    }

    #[test]
    fn request_without_primary() {
        let request = ParseRequest {
            additional_sources: vec!["http://b/y.wsdl".into()],
            ..Default::default()
        };
        assert_eq!(request.locations().count(), 1);
    }

    #[test]
    fn empty_result_is_distinct() {
        let result = ParseResult {
            operations: Vec::new(),
            sources: vec!["http://a/x.wsdl".into()],
        };
        assert!(result.is_empty());
    }
}
