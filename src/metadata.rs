//! Value metadata for simple types.
//!
//! Turns a type reference into a human description, a synthesized example
//! value, and the set of allowed literals, by walking restriction chains and
//! layering their facets.
//!
//! # Example precedence
//!
//! Facets are applied in document order and the first one that yields an
//! example keeps it. Examples from a restriction's base type take priority
//! over facets of the restriction itself, except for built-in primitive
//! samples, which are only used when nothing else produced a value.

use std::collections::HashSet;
use std::sync::OnceLock;

use chrono::Utc;
use regex::Regex;
use roxmltree::Node;

use crate::schema::{attribute_qname, is_xsd, resolve_qname, xsd_children, SchemaIndex};
use crate::types::{QName, ValueMetadata};

/// Maximum number of enumeration literals listed in a description.
const ENUM_SUMMARY_LIMIT: usize = 5;

/// Example used when a pattern requires digits but no length is known.
const DIGITS_PLACEHOLDER: &str = "12345";

/// Longest value synthesized from a length facet or `\d{n}` pattern. Longer
/// lengths keep their description but get no example.
const MAX_SAMPLE_LENGTH: usize = 64;

/// Resolve metadata for an element declaration and/or a type reference.
///
/// An inline `simpleType` on `element` wins over `type_ref`; a named simple
/// type wins over the built-in primitive table. Misses yield empty metadata.
pub fn resolve_metadata(
    index: &SchemaIndex,
    element: Option<Node>,
    type_ref: Option<&QName>,
) -> ValueMetadata {
    let mut visited = HashSet::new();

    let inline = element.and_then(|e| xsd_children(e).find(|c| is_xsd(c, "simpleType")));
    let accumulated = match (inline, type_ref) {
        (Some(simple_type), _) => resolve_simple_type(index, simple_type, &mut visited),
        (None, Some(type_ref)) => resolve_type_ref(index, type_ref, &mut visited),
        (None, None) => Accumulated::default(),
    };
    accumulated.finish()
}

/// Description and sample of a built-in XML Schema type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Primitive {
    pub description: &'static str,
    pub example: String,
}

/// Look up a built-in type by local name.
pub fn primitive(local: &str) -> Option<Primitive> {
    let (description, example) = match local {
        "string" | "normalizedString" | "token" | "Name" | "NCName" | "NMTOKEN" | "ID"
        | "IDREF" | "ENTITY" | "anySimpleType" | "anyType" => ("Text", "string".to_string()),
        "language" => ("Language code", "en".to_string()),
        "boolean" => ("Boolean (true or false)", "true".to_string()),
        "decimal" | "float" | "double" => ("Decimal number", "123.45".to_string()),
        "integer" | "int" | "long" | "short" | "byte" | "nonNegativeInteger"
        | "positiveInteger" | "unsignedLong" | "unsignedInt" | "unsignedShort"
        | "unsignedByte" => ("Integer", "123".to_string()),
        "negativeInteger" | "nonPositiveInteger" => ("Negative integer", "-1".to_string()),
        "dateTime" => (
            "Date and time (ISO 8601)",
            Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string(),
        ),
        "date" => ("Date (YYYY-MM-DD)", Utc::now().format("%Y-%m-%d").to_string()),
        "time" => ("Time (hh:mm:ss)", Utc::now().format("%H:%M:%S").to_string()),
        "duration" => ("Duration (ISO 8601)", "P1D".to_string()),
        "gYear" => ("Year", "2024".to_string()),
        "base64Binary" => ("Base64-encoded binary", "ZXhhbXBsZQ==".to_string()),
        "hexBinary" => ("Hex-encoded binary", "0FB7".to_string()),
        "anyURI" => ("URI", "http://example.com".to_string()),
        "QName" => ("Qualified name", "tns:name".to_string()),
        "guid" => (
            "GUID",
            "00000000-0000-0000-0000-000000000000".to_string(),
        ),
        _ => return None,
    };
    Some(Primitive {
        description,
        example,
    })
}

/// Metadata gathered while walking a restriction chain.
#[derive(Debug, Default)]
struct Accumulated {
    descriptions: Vec<String>,
    example: Option<String>,
    allowed_values: Vec<String>,
    primitive: Option<Primitive>,
}

impl Accumulated {
    fn set_example(&mut self, example: Option<String>) {
        if self.example.is_none() {
            self.example = example;
        }
    }

    fn finish(self) -> ValueMetadata {
        let description = if self.descriptions.is_empty() {
            self.primitive.as_ref().map(|p| p.description.to_string())
        } else {
            Some(self.descriptions.join("; "))
        };
        let example = self
            .example
            .or_else(|| self.primitive.map(|p| p.example));
        ValueMetadata {
            description,
            example,
            allowed_values: self.allowed_values,
        }
    }
}

fn resolve_type_ref(
    index: &SchemaIndex,
    type_ref: &QName,
    visited: &mut HashSet<QName>,
) -> Accumulated {
    if let Some(simple_type) = index.simple_type(type_ref) {
        if !visited.insert(type_ref.clone()) {
            return Accumulated::default();
        }
        return resolve_simple_type(index, simple_type, visited);
    }

    Accumulated {
        primitive: primitive(&type_ref.local),
        ..Accumulated::default()
    }
}

fn resolve_simple_type(
    index: &SchemaIndex,
    simple_type: Node,
    visited: &mut HashSet<QName>,
) -> Accumulated {
    for child in xsd_children(simple_type) {
        match child.tag_name().name() {
            "restriction" => return resolve_restriction(index, child, visited),
            "list" => return resolve_list(index, child, visited),
            "union" => return resolve_union(index, child, visited),
            _ => {}
        }
    }
    Accumulated::default()
}

/// Resolve the base named by `base=` or an inline `simpleType` child.
fn resolve_base(index: &SchemaIndex, node: Node, visited: &mut HashSet<QName>) -> Accumulated {
    if let Some(base) = attribute_qname(&node, "base") {
        return resolve_type_ref(index, &base, visited);
    }
    match xsd_children(node).find(|c| is_xsd(c, "simpleType")) {
        Some(inline) => resolve_simple_type(index, inline, visited),
        None => Accumulated::default(),
    }
}

fn resolve_restriction(
    index: &SchemaIndex,
    restriction: Node,
    visited: &mut HashSet<QName>,
) -> Accumulated {
    let mut acc = resolve_base(index, restriction, visited);

    let digits = xsd_children(restriction)
        .filter(|f| is_xsd(f, "pattern"))
        .filter_map(|f| f.attribute("value"))
        .any(requires_digits);

    let mut enumeration: Vec<String> = Vec::new();
    let mut enum_slot = None;

    for facet in xsd_children(restriction) {
        let value = facet.attribute("value").unwrap_or("").to_string();
        match facet.tag_name().name() {
            "enumeration" => {
                if enum_slot.is_none() {
                    enum_slot = Some(acc.descriptions.len());
                    acc.descriptions.push(String::new());
                }
                acc.set_example(Some(value.clone()));
                enumeration.push(value);
            }
            "length" => {
                acc.descriptions.push(format!("Length: {}", value));
                acc.set_example(parse_len(&value).and_then(|n| sample_of_length(n, digits)));
            }
            "minLength" => {
                acc.descriptions.push(format!("Minimum length: {}", value));
                acc.set_example(parse_len(&value).and_then(|n| sample_of_length(n, digits)));
            }
            "maxLength" => {
                acc.descriptions.push(format!("Maximum length: {}", value));
                acc.set_example(
                    parse_len(&value).and_then(|n| sample_of_length(n.min(5), digits)),
                );
            }
            "minInclusive" => {
                acc.descriptions.push(format!("Minimum: {} (inclusive)", value));
                acc.set_example(Some(value));
            }
            "minExclusive" => {
                acc.descriptions.push(format!("Minimum: {} (exclusive)", value));
                acc.set_example(Some(exclusive_minimum_sample(&value)));
            }
            "maxInclusive" => acc.descriptions.push(format!("Maximum: {} (inclusive)", value)),
            "maxExclusive" => acc.descriptions.push(format!("Maximum: {} (exclusive)", value)),
            "pattern" => {
                acc.descriptions.push(format!("Pattern: {}", value));
                acc.set_example(sample_from_pattern(&value));
            }
            "totalDigits" => acc.descriptions.push(format!("Total digits: {}", value)),
            "fractionDigits" => acc.descriptions.push(format!("Fraction digits: {}", value)),
            _ => {}
        }
    }

    if let Some(slot) = enum_slot {
        acc.descriptions[slot] = enumeration_summary(&enumeration);
        acc.allowed_values.extend(enumeration);
    }
    acc
}

fn resolve_list(index: &SchemaIndex, list: Node, visited: &mut HashSet<QName>) -> Accumulated {
    let (item, item_name) = match attribute_qname(&list, "itemType") {
        Some(item_type) => {
            let item = resolve_type_ref(index, &item_type, visited);
            (item, item_type.local)
        }
        None => match xsd_children(list).find(|c| is_xsd(c, "simpleType")) {
            Some(inline) => (
                resolve_simple_type(index, inline, visited),
                "anonymous type".to_string(),
            ),
            None => return Accumulated::default(),
        },
    };

    let item = item.finish();
    Accumulated {
        descriptions: vec![format!("List of {}", item_name)],
        example: item.example.map(|e| format!("{} {}", e, e)),
        allowed_values: item.allowed_values,
        primitive: None,
    }
}

fn resolve_union(index: &SchemaIndex, union: Node, visited: &mut HashSet<QName>) -> Accumulated {
    let members: Vec<QName> = union
        .attribute("memberTypes")
        .unwrap_or("")
        .split_whitespace()
        .map(|member| resolve_qname(&union, member))
        .collect();

    let mut acc = match members.first() {
        Some(first) => resolve_type_ref(index, first, visited),
        None => match xsd_children(union).find(|c| is_xsd(c, "simpleType")) {
            Some(inline) => resolve_simple_type(index, inline, visited),
            None => Accumulated::default(),
        },
    };

    if !members.is_empty() {
        let names: Vec<&str> = members.iter().map(|m| m.local.as_str()).collect();
        acc.descriptions
            .insert(0, format!("Union of {}", names.join(", ")));
    }
    acc
}

fn parse_len(value: &str) -> Option<usize> {
    value.trim().parse().ok()
}

fn enumeration_summary(values: &[String]) -> String {
    let shown: Vec<&str> = values
        .iter()
        .take(ENUM_SUMMARY_LIMIT)
        .map(String::as_str)
        .collect();
    let more = if values.len() > ENUM_SUMMARY_LIMIT {
        ", …"
    } else {
        ""
    };
    format!("Allowed values: {}{}", shown.join(", "), more)
}

/// A numeral of exactly `len` digits with no leading zero (`"1000"` for 4).
fn numeral_of_length(len: usize) -> Option<String> {
    if len == 0 || len > MAX_SAMPLE_LENGTH {
        return None;
    }
    Some(format!("1{}", "0".repeat(len - 1)))
}

fn sample_of_length(len: usize, digits: bool) -> Option<String> {
    if digits {
        numeral_of_length(len)
    } else if len == 0 || len > MAX_SAMPLE_LENGTH {
        None
    } else {
        Some("x".repeat(len))
    }
}

fn exclusive_minimum_sample(value: &str) -> String {
    match value.trim().parse::<i64>() {
        Ok(n) => n.saturating_add(1).to_string(),
        Err(_) => value.to_string(),
    }
}

fn fixed_digits_regex() -> &'static Regex {
    static FIXED: OnceLock<Regex> = OnceLock::new();
    FIXED.get_or_init(|| {
        Regex::new(r"^\^?(?:\\d|\[0-9\])\{(\d+)\}\$?$").expect("fixed-digits pattern is valid")
    })
}

fn requires_digits(pattern: &str) -> bool {
    pattern.contains(r"\d") || pattern.contains("[0-9]")
}

/// Synthesize a value for a `pattern` facet.
///
/// `\d{n}` and `[0-9]{n}` give an n-digit numeral; any other pattern that
/// requires digits gives a fixed placeholder; anything else gives nothing.
fn sample_from_pattern(pattern: &str) -> Option<String> {
    let pattern = pattern.trim();
    if let Some(captures) = fixed_digits_regex().captures(pattern) {
        let len = captures.get(1)?.as_str().parse().ok()?;
        return numeral_of_length(len);
    }
    if requires_digits(pattern) {
        return Some(DIGITS_PLACEHOLDER.to_string());
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::LoadedSource;
    use crate::schema::ResolvedDocument;
    use crate::types::XSD_NS;
    use url::Url;

    fn schema(body: &str) -> LoadedSource {
        LoadedSource {
            url: Url::parse("http://a.test/types.xsd").unwrap(),
            text: format!(
                r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
                    xmlns:tns="urn:t" targetNamespace="urn:t">{}</xs:schema>"#,
                body
            ),
        }
    }

    fn resolve_named(body: &str, name: &str) -> ValueMetadata {
        let loaded = [schema(body)];
        let docs: Vec<ResolvedDocument> = loaded
            .iter()
            .map(|s| ResolvedDocument::parse(s).unwrap())
            .collect();
        let index = SchemaIndex::build(&docs);
        resolve_metadata(&index, None, Some(&QName::new("urn:t", name)))
    }

    #[test]
    fn enumeration_values_and_example() {
        let meta = resolve_named(
            r#"<xs:simpleType name="Level">
                <xs:restriction base="xs:string">
                    <xs:enumeration value="A"/>
                    <xs:enumeration value="B"/>
                    <xs:enumeration value="C"/>
                </xs:restriction>
            </xs:simpleType>"#,
            "Level",
        );

        assert_eq!(meta.example.as_deref(), Some("A"));
        assert_eq!(meta.allowed_values, vec!["A", "B", "C"]);
        assert_eq!(meta.description.as_deref(), Some("Allowed values: A, B, C"));
    }

    #[test]
    fn enumeration_summary_truncates() {
        let values: Vec<String> = (1..=7).map(|i| format!("V{}", i)).collect();
        assert_eq!(
            enumeration_summary(&values),
            "Allowed values: V1, V2, V3, V4, V5, …"
        );
    }

    #[test]
    fn fixed_digit_pattern() {
        let meta = resolve_named(
            r#"<xs:simpleType name="Zip">
                <xs:restriction base="xs:string"><xs:pattern value="\d{5}"/></xs:restriction>
            </xs:simpleType>"#,
            "Zip",
        );
        assert_eq!(meta.example.as_deref(), Some("10000"));
        assert_eq!(meta.description.as_deref(), Some(r"Pattern: \d{5}"));
    }

    #[test]
    fn pattern_synthesis_forms() {
        assert_eq!(sample_from_pattern(r"\d{5}").as_deref(), Some("10000"));
        assert_eq!(sample_from_pattern(r"^[0-9]{3}$").as_deref(), Some("100"));
        assert_eq!(sample_from_pattern(r"\d{1}").as_deref(), Some("1"));
        assert_eq!(sample_from_pattern(r"[A-Z]{2}\d+").as_deref(), Some("12345"));
        assert_eq!(sample_from_pattern("[A-Z]+"), None);
    }

    #[test]
    fn length_facets_with_digit_pattern() {
        let meta = resolve_named(
            r#"<xs:simpleType name="Code">
                <xs:restriction base="xs:string">
                    <xs:length value="4"/>
                    <xs:pattern value="\d+"/>
                </xs:restriction>
            </xs:simpleType>"#,
            "Code",
        );
        assert_eq!(meta.example.as_deref(), Some("1000"));
        assert_eq!(
            meta.description.as_deref(),
            Some(r"Length: 4; Pattern: \d+")
        );
    }

    #[test]
    fn length_facets_without_pattern() {
        let meta = resolve_named(
            r#"<xs:simpleType name="Short">
                <xs:restriction base="xs:string">
                    <xs:minLength value="2"/>
                    <xs:maxLength value="8"/>
                </xs:restriction>
            </xs:simpleType>"#,
            "Short",
        );
        assert_eq!(meta.example.as_deref(), Some("xx"));
        assert_eq!(
            meta.description.as_deref(),
            Some("Minimum length: 2; Maximum length: 8")
        );
    }

    #[test]
    fn oversized_lengths_are_not_synthesized() {
        let meta = resolve_named(
            r#"<xs:simpleType name="Big">
                <xs:restriction base="xs:string">
                    <xs:length value="100000000000"/>
                </xs:restriction>
            </xs:simpleType>"#,
            "Big",
        );
        // falls back to the xs:string sample
        assert!(meta.example.map_or(true, |e| e.len() <= MAX_SAMPLE_LENGTH));
        assert_eq!(meta.description.as_deref(), Some("Length: 100000000000"));

        assert_eq!(sample_from_pattern(r"\d{100000000000}"), None);
        assert_eq!(
            sample_of_length(MAX_SAMPLE_LENGTH, false).map(|s| s.len()),
            Some(MAX_SAMPLE_LENGTH)
        );
        assert_eq!(sample_of_length(MAX_SAMPLE_LENGTH + 1, true), None);
    }

    #[test]
    fn numeric_bounds_seed_example() {
        let meta = resolve_named(
            r#"<xs:simpleType name="Qty">
                <xs:restriction base="xs:int">
                    <xs:minExclusive value="0"/>
                    <xs:maxInclusive value="99"/>
                </xs:restriction>
            </xs:simpleType>"#,
            "Qty",
        );
        assert_eq!(meta.example.as_deref(), Some("1"));
        assert_eq!(
            meta.description.as_deref(),
            Some("Minimum: 0 (exclusive); Maximum: 99 (inclusive)")
        );
    }

    #[test]
    fn first_facet_example_wins() {
        let meta = resolve_named(
            r#"<xs:simpleType name="Mixed">
                <xs:restriction base="xs:string">
                    <xs:pattern value="\d{3}"/>
                    <xs:enumeration value="777"/>
                </xs:restriction>
            </xs:simpleType>"#,
            "Mixed",
        );
        assert_eq!(meta.example.as_deref(), Some("100"));
        assert_eq!(meta.allowed_values, vec!["777"]);
    }

    #[test]
    fn restriction_chain_accumulates() {
        let meta = resolve_named(
            r#"<xs:simpleType name="Base">
                <xs:restriction base="xs:string">
                    <xs:enumeration value="X"/>
                    <xs:enumeration value="Y"/>
                </xs:restriction>
            </xs:simpleType>
            <xs:simpleType name="Derived">
                <xs:restriction base="tns:Base">
                    <xs:maxLength value="1"/>
                </xs:restriction>
            </xs:simpleType>"#,
            "Derived",
        );
        assert_eq!(meta.example.as_deref(), Some("X"));
        assert_eq!(meta.allowed_values, vec!["X", "Y"]);
        assert_eq!(
            meta.description.as_deref(),
            Some("Allowed values: X, Y; Maximum length: 1")
        );
    }

    #[test]
    fn list_type_repeats_item() {
        let meta = resolve_named(
            r#"<xs:simpleType name="Ids"><xs:list itemType="xs:int"/></xs:simpleType>"#,
            "Ids",
        );
        assert_eq!(meta.example.as_deref(), Some("123 123"));
        assert_eq!(meta.description.as_deref(), Some("List of int"));
    }

    #[test]
    fn union_uses_first_member() {
        let meta = resolve_named(
            r#"<xs:simpleType name="Either"><xs:union memberTypes="xs:boolean xs:int"/></xs:simpleType>"#,
            "Either",
        );
        assert_eq!(meta.example.as_deref(), Some("true"));
        assert_eq!(meta.description.as_deref(), Some("Union of boolean, int"));
    }

    #[test]
    fn self_referential_type_terminates() {
        let meta = resolve_named(
            r#"<xs:simpleType name="Loop">
                <xs:restriction base="tns:Loop"><xs:enumeration value="Z"/></xs:restriction>
            </xs:simpleType>"#,
            "Loop",
        );
        // the inner revisit is empty; the outer facets still apply
        assert_eq!(meta.allowed_values, vec!["Z"]);
    }

    #[test]
    fn mutual_cycle_terminates() {
        let meta = resolve_named(
            r#"<xs:simpleType name="A"><xs:restriction base="tns:B"/></xs:simpleType>
               <xs:simpleType name="B"><xs:restriction base="tns:A"/></xs:simpleType>"#,
            "A",
        );
        assert!(meta.is_empty());
    }

    #[test]
    fn builtin_fallback() {
        let meta = resolve_named("", "unknown");
        assert!(meta.is_empty());

        let loaded = [schema("")];
        let docs: Vec<ResolvedDocument> = loaded
            .iter()
            .map(|s| ResolvedDocument::parse(s).unwrap())
            .collect();
        let index = SchemaIndex::build(&docs);

        let meta = resolve_metadata(&index, None, Some(&QName::new(XSD_NS, "int")));
        assert_eq!(meta.example.as_deref(), Some("123"));
        assert_eq!(meta.description.as_deref(), Some("Integer"));

        let meta = resolve_metadata(&index, None, Some(&QName::new(XSD_NS, "dateTime")));
        let example = meta.example.unwrap();
        assert_eq!(example.len(), "2024-01-01T00:00:00Z".len());
        assert!(example.ends_with('Z'));
    }

    #[test]
    fn inline_simple_type_wins_over_type_ref() {
        let loaded = [schema(
            r#"<xs:element name="color">
                <xs:simpleType>
                    <xs:restriction base="xs:string"><xs:enumeration value="red"/></xs:restriction>
                </xs:simpleType>
            </xs:element>"#,
        )];
        let docs: Vec<ResolvedDocument> = loaded
            .iter()
            .map(|s| ResolvedDocument::parse(s).unwrap())
            .collect();
        let index = SchemaIndex::build(&docs);
        let element = index.element(&QName::new("urn:t", "color"));

        let meta = resolve_metadata(&index, element, Some(&QName::new(XSD_NS, "int")));
        assert_eq!(meta.example.as_deref(), Some("red"));
    }
}
