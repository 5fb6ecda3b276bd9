//! Operation catalog assembly.
//!
//! Joins bindings with the merged port type signatures and messages,
//! expands each input part into an example fragment, and wraps the
//! fragments in a SOAP envelope.

use roxmltree::Node;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::error::ParseError;
use crate::example::{build_example, comment, ElementDecl, ExampleElement};
use crate::fetch::Fetch;
use crate::loader::{load_documents, LoadedSource};
use crate::manifest::parse_manifest;
use crate::messages::{Definitions, MessagePart};
use crate::schema::{documentation, is_wsdl, DocumentKind, ResolvedDocument, SchemaIndex};
use crate::types::{
    OperationDescriptor, ParameterDescriptor, ParseRequest, ParseResult, SOAP11_BINDING_NS,
    SOAP11_ENVELOPE_NS, SOAP12_BINDING_NS, SOAP12_ENVELOPE_NS,
};

/// Load every requested source and build its operation catalog.
///
/// # Errors
///
/// Fails as a whole on any fetch or XML error, or when `cancel` fires; no
/// partial catalog is ever returned.
pub async fn parse<F: Fetch + ?Sized>(
    request: &ParseRequest,
    fetcher: &F,
    cancel: &CancellationToken,
) -> Result<ParseResult, ParseError> {
    let sources = load_documents(request, fetcher, cancel).await?;
    if cancel.is_cancelled() {
        return Err(ParseError::Cancelled);
    }

    let result = build_catalog(&sources)?;
    info!(
        sources = result.sources.len(),
        operations = result.operations.len(),
        "built operation catalog"
    );
    Ok(result)
}

/// Build the catalog from already-loaded sources.
///
/// Operations from service descriptions come first, in document, binding,
/// operation order, followed by manifest functions.
pub fn build_catalog(sources: &[LoadedSource]) -> Result<ParseResult, ParseError> {
    let docs = sources
        .iter()
        .map(ResolvedDocument::parse)
        .collect::<Result<Vec<_>, _>>()?;

    let index = SchemaIndex::build(&docs);
    let definitions = Definitions::merge(&docs);

    let mut operations = Vec::new();
    for doc in docs
        .iter()
        .filter(|d| d.kind == DocumentKind::ServiceDescription)
    {
        for binding in doc.root().children().filter(|n| is_wsdl(n, "binding")) {
            let soap = SoapVersion::of_binding(binding);
            for operation in binding.children().filter(|n| is_wsdl(n, "operation")) {
                operations.push(describe_operation(
                    doc,
                    operation,
                    soap,
                    &index,
                    &definitions,
                ));
            }
        }
    }

    for doc in docs.iter().filter(|d| d.kind == DocumentKind::Manifest) {
        operations.extend(parse_manifest(doc));
    }

    Ok(ParseResult {
        operations,
        sources: sources.iter().map(|s| s.url.to_string()).collect(),
    })
}

/// SOAP version of a binding, chosen by its `binding` extension element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoapVersion {
    Soap11,
    Soap12,
}

impl SoapVersion {
    fn of_binding(binding: Node) -> Self {
        let is_soap12 = binding
            .children()
            .any(|n| n.is_element() && n.has_tag_name((SOAP12_BINDING_NS, "binding")));
        if is_soap12 {
            SoapVersion::Soap12
        } else {
            SoapVersion::Soap11
        }
    }

    pub fn envelope_namespace(&self) -> &'static str {
        match self {
            SoapVersion::Soap11 => SOAP11_ENVELOPE_NS,
            SoapVersion::Soap12 => SOAP12_ENVELOPE_NS,
        }
    }
}

fn soap_action(operation: Node) -> String {
    operation
        .children()
        .filter(|n| n.is_element() && n.tag_name().name() == "operation")
        .filter(|n| {
            matches!(
                n.tag_name().namespace(),
                Some(SOAP11_BINDING_NS) | Some(SOAP12_BINDING_NS)
            )
        })
        .find_map(|n| n.attribute("soapAction"))
        .unwrap_or("")
        .to_string()
}

fn describe_operation(
    doc: &ResolvedDocument,
    operation: Node,
    soap: SoapVersion,
    index: &SchemaIndex,
    definitions: &Definitions,
) -> OperationDescriptor {
    let name = operation.attribute("name").unwrap_or("").trim().to_string();

    let (input_message, output_message, signature_docs) = match definitions.operation(&name) {
        Some(signature) => (
            signature.input_message.clone(),
            signature.output_message.clone(),
            signature.documentation.clone(),
        ),
        None => {
            debug!(operation = %name, source = %doc.url, "no port type operation for binding operation");
            (String::new(), String::new(), String::new())
        }
    };

    let trees: Vec<(ExampleElement, ParameterDescriptor)> =
        match definitions.message(&input_message) {
            Some(parts) => parts
                .iter()
                .map(|part| describe_part(part, index))
                .collect(),
            None => {
                if !input_message.is_empty() {
                    debug!(operation = %name, message = %input_message, "input message not found");
                }
                Vec::new()
            }
        };

    let example_envelope = envelope(
        &name,
        doc.target_namespace(),
        soap,
        trees.iter().map(|(tree, _)| tree),
    );

    let documentation = if signature_docs.is_empty() {
        documentation(&operation)
    } else {
        signature_docs
    };

    OperationDescriptor {
        soap_action: soap_action(operation),
        input_message,
        output_message,
        documentation,
        example_envelope,
        parameters: trees.into_iter().map(|(_, param)| param).collect(),
        source: doc.url.to_string(),
        name,
    }
}

/// Expand one message part into its decorated example and descriptor.
fn describe_part(part: &MessagePart, index: &SchemaIndex) -> (ExampleElement, ParameterDescriptor) {
    let decl = match (&part.element, &part.type_ref) {
        (Some(element), _) => match index.element(element) {
            Some(node) => ElementDecl::from_node(node),
            None => {
                debug!(element = %element, part = %part.name, "element not found in schema index");
                ElementDecl::synthesized(element.local.clone(), None)
            }
        },
        (None, type_ref) => ElementDecl::synthesized(part.name.clone(), type_ref.clone()),
    };

    let tree = build_example(index, &decl);
    let meta = tree.scalar_metadata().cloned().unwrap_or_default();
    let tree = tree.decorate();

    let documentation = decl
        .node
        .map(|node| documentation(&node))
        .filter(|text| !text.is_empty())
        .or_else(|| {
            decl.type_ref
                .as_ref()
                .and_then(|t| index.complex_type(t).or_else(|| index.simple_type(t)))
                .map(|node| documentation(&node))
        })
        .unwrap_or_default();

    let param = ParameterDescriptor {
        name: decl.name.clone(),
        type_name: decl.type_ref.as_ref().map(|t| t.local.clone()),
        is_array: decl.is_array(),
        example: tree.render(),
        documentation,
        value_description: meta.description,
        example_value: meta.example,
        allowed_values: meta.allowed_values,
    };
    (tree, param)
}

/// Assemble a request envelope around the parameter fragments.
///
/// A fragment whose root is named like the operation contributes only its
/// children, so document/literal wrapped parts are not nested twice.
pub fn envelope<'t>(
    operation: &str,
    target_namespace: &str,
    soap: SoapVersion,
    parameters: impl IntoIterator<Item = &'t ExampleElement>,
) -> String {
    let wrapper = if target_namespace.is_empty() {
        operation.to_string()
    } else {
        format!("tns:{}", operation)
    };
    let tns_decl = if target_namespace.is_empty() {
        String::new()
    } else {
        format!(" xmlns:tns=\"{}\"", escape_attribute(target_namespace))
    };

    let mut body = String::new();
    for tree in parameters {
        match tree.children() {
            Some(children) if tree.name == operation => {
                for child in children {
                    child.write(&mut body, 3);
                }
            }
            _ => tree.write(&mut body, 3),
        }
    }
    if body.is_empty() {
        body = format!("      {}\n", comment("no parameters"));
    }

    let mut out = String::new();
    out.push_str(&format!(
        "<soapenv:Envelope xmlns:soapenv=\"{}\"{}>\n",
        soap.envelope_namespace(),
        tns_decl
    ));
    out.push_str("  <soapenv:Header/>\n");
    out.push_str("  <soapenv:Body>\n");
    out.push_str(&format!("    <{}>\n", wrapper));
    out.push_str(&body);
    out.push_str(&format!("    </{}>\n", wrapper));
    out.push_str("  </soapenv:Body>\n");
    out.push_str("</soapenv:Envelope>");
    out
}

pub(crate) fn escape_attribute(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::example::Content;
    use url::Url;

    fn load(text: &str) -> Vec<LoadedSource> {
        vec![LoadedSource {
            url: Url::parse("http://a.test/svc.wsdl").unwrap(),
            text: text.to_string(),
        }]
    }

    const WRAPPED: &str = r#"<wsdl:definitions xmlns:wsdl="http://schemas.xmlsoap.org/wsdl/"
        xmlns:soap="http://schemas.xmlsoap.org/wsdl/soap/"
        xmlns:xs="http://www.w3.org/2001/XMLSchema"
        xmlns:tns="urn:weather" targetNamespace="urn:weather">
      <wsdl:types>
        <xs:schema targetNamespace="urn:weather">
          <xs:element name="GetWeather">
            <xs:complexType><xs:sequence>
              <xs:element name="city" type="xs:string"/>
              <xs:element name="days" type="xs:int"/>
            </xs:sequence></xs:complexType>
          </xs:element>
        </xs:schema>
      </wsdl:types>
      <wsdl:message name="GetWeatherIn"><wsdl:part name="parameters" element="tns:GetWeather"/></wsdl:message>
      <wsdl:portType name="Weather">
        <wsdl:operation name="GetWeather">
          <wsdl:documentation>Forecast for a city.</wsdl:documentation>
          <wsdl:input message="tns:GetWeatherIn"/>
          <wsdl:output message="tns:GetWeatherOut"/>
        </wsdl:operation>
      </wsdl:portType>
      <wsdl:binding name="WeatherSoap" type="tns:Weather">
        <soap:binding transport="http://schemas.xmlsoap.org/soap/http"/>
        <wsdl:operation name="GetWeather">
          <soap:operation soapAction="urn:weather/GetWeather"/>
        </wsdl:operation>
        <wsdl:operation name="Unknown"/>
      </wsdl:binding>
    </wsdl:definitions>"#;

    #[test]
    fn wrapped_operation_is_inlined() {
        let result = build_catalog(&load(WRAPPED)).unwrap();
        assert_eq!(result.operations.len(), 2);

        let op = &result.operations[0];
        assert_eq!(op.name, "GetWeather");
        assert_eq!(op.soap_action, "urn:weather/GetWeather");
        assert_eq!(op.input_message, "GetWeatherIn");
        assert_eq!(op.output_message, "GetWeatherOut");
        assert_eq!(op.documentation, "Forecast for a city.");
        assert_eq!(op.source, "http://a.test/svc.wsdl");
        assert_eq!(
            op.example_envelope,
            "<soapenv:Envelope xmlns:soapenv=\"http://schemas.xmlsoap.org/soap/envelope/\" xmlns:tns=\"urn:weather\">\n\
             \x20 <soapenv:Header/>\n\
             \x20 <soapenv:Body>\n\
             \x20   <tns:GetWeather>\n\
             \x20     <city>string</city>\n\
             \x20     <days>123</days>\n\
             \x20   </tns:GetWeather>\n\
             \x20 </soapenv:Body>\n\
             </soapenv:Envelope>"
        );

        assert_eq!(op.parameters.len(), 1);
        assert_eq!(op.parameters[0].name, "GetWeather");
        assert!(op.parameters[0].example.starts_with("<GetWeather>\n  <city>"));
    }

    #[test]
    fn missing_signature_is_tolerated() {
        let result = build_catalog(&load(WRAPPED)).unwrap();
        let op = &result.operations[1];
        assert_eq!(op.name, "Unknown");
        assert_eq!(op.soap_action, "");
        assert_eq!(op.input_message, "");
        assert!(op.parameters.is_empty());
        assert!(op.example_envelope.contains("<tns:Unknown>"));
        assert!(op.example_envelope.contains("<!-- no parameters -->"));
    }

    #[test]
    fn rpc_parts_with_types() {
        let text = r#"<definitions xmlns="http://schemas.xmlsoap.org/wsdl/"
            xmlns:soap12="http://schemas.xmlsoap.org/wsdl/soap12/"
            xmlns:xs="http://www.w3.org/2001/XMLSchema">
          <message name="AddIn">
            <part name="a" type="xs:int"/>
            <part name="b" type="xs:int"/>
          </message>
          <portType name="Calc">
            <operation name="Add"><input message="AddIn"/></operation>
          </portType>
          <binding name="CalcSoap12" type="Calc">
            <soap12:binding/>
            <operation name="Add"><soap12:operation soapAction="Add"/></operation>
          </binding>
        </definitions>"#;

        let result = build_catalog(&load(text)).unwrap();
        let op = &result.operations[0];
        assert_eq!(op.soap_action, "Add");
        assert_eq!(op.parameters.len(), 2);
        assert_eq!(op.parameters[0].type_name.as_deref(), Some("int"));
        assert_eq!(op.parameters[0].example, "<a>123</a>\n");
        assert_eq!(op.parameters[0].example_value.as_deref(), Some("123"));
        assert_eq!(op.parameters[0].value_description.as_deref(), Some("Integer"));
        assert!(op
            .example_envelope
            .contains("xmlns:soapenv=\"http://www.w3.org/2003/05/soap-envelope\""));
        // no targetNamespace: unprefixed wrapper
        assert!(op.example_envelope.contains("    <Add>\n      <a>123</a>\n      <b>123</b>\n    </Add>"));
    }

    #[test]
    fn unresolved_element_gets_placeholder() {
        let text = r#"<wsdl:definitions xmlns:wsdl="http://schemas.xmlsoap.org/wsdl/"
            xmlns:tns="urn:t" targetNamespace="urn:t">
          <wsdl:message name="In"><wsdl:part name="p" element="tns:Missing"/></wsdl:message>
          <wsdl:portType name="P"><wsdl:operation name="Op"><wsdl:input message="tns:In"/></wsdl:operation></wsdl:portType>
          <wsdl:binding name="B" type="tns:P"><wsdl:operation name="Op"/></wsdl:binding>
        </wsdl:definitions>"#;

        let result = build_catalog(&load(text)).unwrap();
        let param = &result.operations[0].parameters[0];
        assert_eq!(param.name, "Missing");
        assert_eq!(param.example, "<Missing>?</Missing>\n");
    }

    #[test]
    fn envelope_nests_non_matching_roots() {
        let param = ExampleElement {
            name: "order".into(),
            content: Content::Value("1".into()),
        };
        let text = envelope("Submit", "urn:x", SoapVersion::Soap11, [&param]);
        assert!(text.contains("    <tns:Submit>\n      <order>1</order>\n    </tns:Submit>\n"));
    }
}
