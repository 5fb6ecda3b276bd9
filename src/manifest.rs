//! Fallback parser for flat function manifests.
//!
//! Manifests describe callable functions directly instead of through
//! messages and schemas:
//!
//! ```xml
//! <executable namespace="urn:tools">
//!   <function name="Reboot" action="urn:tools/Reboot">
//!     <Description>Restart the host.</Description>
//!     <parameter name="delay" type="int"/>
//!   </function>
//! </executable>
//! ```
//!
//! Every field is looked up through a short list of attribute and child
//! element names; the first one present wins.

use roxmltree::Node;

use crate::catalog::escape_attribute;
use crate::example::comment;
use crate::schema::ResolvedDocument;
use crate::types::{OperationDescriptor, ParameterDescriptor, SOAP11_ENVELOPE_NS};

/// Element names recognized as functions (case-insensitive).
const FUNCTION_TAGS: &[&str] = &["function", "operation", "method"];

/// Root whose children are functions when none are found by name.
const EXECUTABLE_TAG: &str = "executable";

const PARAMETER_TAGS: &[&str] = &["parameter", "param", "argument"];
const PARAMETER_CONTAINERS: &[&str] = &["parameters", "params", "arguments"];

#[derive(Debug, Clone, Copy)]
enum Candidate {
    Attr(&'static str),
    /// Child element, matched case-insensitively; yields its text.
    Child(&'static str),
    /// Child element, matched case-insensitively; yields its inner XML.
    Markup(&'static str),
}

use Candidate::{Attr, Child, Markup};

const NAME: &[Candidate] = &[Attr("name"), Attr("Name"), Child("Name"), Attr("id")];
const ACTION: &[Candidate] = &[
    Attr("action"),
    Attr("soapAction"),
    Attr("SOAPAction"),
    Child("Action"),
    Child("SoapAction"),
];
const DOCUMENTATION: &[Candidate] = &[
    Attr("description"),
    Attr("documentation"),
    Child("Description"),
    Child("Documentation"),
    Child("Summary"),
];
const ENVELOPE: &[Candidate] = &[
    Markup("SampleEnvelope"),
    Markup("Envelope"),
    Markup("Sample"),
    Markup("Request"),
];
const NAMESPACE: &[Candidate] = &[Attr("namespace"), Attr("targetNamespace")];

const PARAM_TYPE: &[Candidate] = &[Attr("type"), Child("Type")];
const PARAM_ARRAY: &[Candidate] = &[Attr("array"), Attr("isArray")];
const PARAM_SAMPLE: &[Candidate] = &[Attr("sample"), Markup("Sample"), Markup("Example")];
const PARAM_VALUE: &[Candidate] = &[Attr("example"), Attr("default")];
const PARAM_VALUES: &[Candidate] = &[Attr("values"), Attr("allowedValues")];

/// Parse every function of a manifest document.
pub fn parse_manifest(doc: &ResolvedDocument) -> Vec<OperationDescriptor> {
    let root = doc.root();
    let namespace = lookup(root, NAMESPACE).unwrap_or_default();

    find_functions(root)
        .into_iter()
        .enumerate()
        .map(|(position, function)| {
            describe_function(doc, function, position + 1, &namespace)
        })
        .collect()
}

fn local_name_in(node: &Node, names: &[&str]) -> bool {
    node.is_element()
        && names
            .iter()
            .any(|name| node.tag_name().name().eq_ignore_ascii_case(name))
}

/// Outermost function elements, or the root's children for an executable
/// root that declares none.
fn find_functions<'a, 'input>(root: Node<'a, 'input>) -> Vec<Node<'a, 'input>> {
    let functions: Vec<Node> = root
        .descendants()
        .filter(|n| local_name_in(n, FUNCTION_TAGS))
        .filter(|n| !n.ancestors().skip(1).any(|a| local_name_in(&a, FUNCTION_TAGS)))
        .collect();

    if functions.is_empty() && root.tag_name().name().eq_ignore_ascii_case(EXECUTABLE_TAG) {
        return root.children().filter(|n| n.is_element()).collect();
    }
    functions
}

fn find_child<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.children()
        .find(|c| c.is_element() && c.tag_name().name().eq_ignore_ascii_case(name))
}

fn text_content(node: Node) -> String {
    node.descendants()
        .filter(|n| n.is_text())
        .filter_map(|n| n.text())
        .collect::<String>()
        .trim()
        .to_string()
}

/// Inner markup of `node` exactly as written in the source, or its text
/// when it has no child elements (escaped samples, CDATA).
fn inner_xml(doc_text: &str, node: Node) -> String {
    if !node.children().any(|c| c.is_element()) {
        return text_content(node);
    }
    match (node.first_child(), node.last_child()) {
        (Some(first), Some(last)) => doc_text[first.range().start..last.range().end]
            .trim()
            .to_string(),
        _ => String::new(),
    }
}

fn lookup(node: Node, candidates: &[Candidate]) -> Option<String> {
    let doc_text = node.document().input_text();
    candidates
        .iter()
        .find_map(|candidate| match *candidate {
            Attr(name) => node.attribute(name).map(|v| v.trim().to_string()),
            Child(name) => find_child(node, name).map(text_content),
            Markup(name) => find_child(node, name).map(|c| inner_xml(doc_text, c)),
        })
        .filter(|value| !value.is_empty())
}

fn parameter_nodes<'a, 'input>(function: Node<'a, 'input>) -> Vec<Node<'a, 'input>> {
    let direct = function
        .children()
        .filter(|n| local_name_in(n, PARAMETER_TAGS));
    let contained = function
        .children()
        .filter(|n| local_name_in(n, PARAMETER_CONTAINERS))
        .flat_map(|container| container.children())
        .filter(|n| local_name_in(n, PARAMETER_TAGS));
    direct.chain(contained).collect()
}

fn parse_bool(value: &str) -> bool {
    value.eq_ignore_ascii_case("true") || value == "1"
}

fn describe_parameter(node: Node, position: usize) -> ParameterDescriptor {
    let name = lookup(node, NAME).unwrap_or_else(|| format!("param{}", position));
    let example = lookup(node, PARAM_SAMPLE).unwrap_or_else(|| format!("<{0}>?</{0}>", name));
    let allowed_values = lookup(node, PARAM_VALUES)
        .map(|values| {
            values
                .split(',')
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(String::from)
                .collect()
        })
        .unwrap_or_default();

    ParameterDescriptor {
        type_name: lookup(node, PARAM_TYPE),
        is_array: lookup(node, PARAM_ARRAY).map_or(false, |v| parse_bool(&v)),
        example,
        documentation: lookup(node, DOCUMENTATION).unwrap_or_default(),
        value_description: None,
        example_value: lookup(node, PARAM_VALUE),
        allowed_values,
        name,
    }
}

fn describe_function(
    doc: &ResolvedDocument,
    function: Node,
    position: usize,
    namespace: &str,
) -> OperationDescriptor {
    let name = lookup(function, NAME).unwrap_or_else(|| format!("Function{}", position));
    let parameters: Vec<ParameterDescriptor> = parameter_nodes(function)
        .into_iter()
        .enumerate()
        .map(|(i, node)| describe_parameter(node, i + 1))
        .collect();

    let namespace = lookup(function, NAMESPACE).unwrap_or_else(|| namespace.to_string());
    let example_envelope = lookup(function, ENVELOPE)
        .unwrap_or_else(|| fallback_envelope(&name, &namespace, &parameters));

    OperationDescriptor {
        soap_action: lookup(function, ACTION).unwrap_or_default(),
        input_message: String::new(),
        output_message: String::new(),
        documentation: lookup(function, DOCUMENTATION).unwrap_or_default(),
        example_envelope,
        parameters,
        source: doc.url.to_string(),
        name,
    }
}

fn fallback_envelope(name: &str, namespace: &str, parameters: &[ParameterDescriptor]) -> String {
    let (wrapper, tns_decl) = if namespace.is_empty() {
        (name.to_string(), String::new())
    } else {
        (
            format!("tns:{}", name),
            format!(" xmlns:tns=\"{}\"", escape_attribute(namespace)),
        )
    };

    let mut body = String::new();
    for param in parameters {
        for line in param.example.lines() {
            body.push_str("      ");
            body.push_str(line);
            body.push('\n');
        }
    }
    if body.is_empty() {
        body = format!("      {}\n", comment("no parameters"));
    }

    format!(
        "<soapenv:Envelope xmlns:soapenv=\"{}\"{}>\n  <soapenv:Header/>\n  <soapenv:Body>\n    <{}>\n{}    </{}>\n  </soapenv:Body>\n</soapenv:Envelope>",
        SOAP11_ENVELOPE_NS, tns_decl, wrapper, body, wrapper
    )
}
