//! Reference checking for loaded service descriptions and manifests.
//!
//! Reports references the catalog builder would silently degrade:
//! - binding operations without a port type operation (W001)
//! - input messages that are never declared (E001)
//! - message parts naming a missing element (E002) or type (E003)
//! - manifests declaring no functions (W002)
//! - documents that are not well-formed XML (E004)

use serde::Serialize;

use crate::error::ParseError;
use crate::loader::LoadedSource;
use crate::manifest::parse_manifest;
use crate::messages::Definitions;
use crate::schema::{attribute_qname, is_wsdl, DocumentKind, ResolvedDocument, SchemaIndex};

/// Severity level for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// A single diagnostic message from linting.
#[derive(Debug, Clone, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: String,
    pub source: String,
    /// Location inside the document (e.g., "/binding[Orders]/operation[Get]")
    pub path: String,
    pub message: String,
}

/// Result of linting a single source.
#[derive(Debug, Clone, Serialize)]
pub struct SourceResult {
    pub source: String,
    pub status: SourceStatus,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<Diagnostic>,
}

/// Status of a linted source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceStatus {
    Ok,
    Error,
    Warning,
}

/// Result of linting a set of loaded sources.
#[derive(Debug, Clone, Serialize)]
pub struct LintResult {
    pub sources_checked: usize,
    pub passed: usize,
    pub failed: usize,
    pub errors: usize,
    pub warnings: usize,
    pub results: Vec<SourceResult>,
}

impl LintResult {
    /// Returns true if all sources passed (no errors).
    pub fn is_ok(&self) -> bool {
        self.errors == 0
    }
}

/// Lint every loaded source against the declarations of all of them.
///
/// If `strict` is true, a source with warnings counts as failed.
pub fn lint_sources(sources: &[LoadedSource], strict: bool) -> LintResult {
    let mut docs = Vec::new();
    let mut results: Vec<(usize, SourceResult)> = Vec::new();

    for (position, source) in sources.iter().enumerate() {
        match ResolvedDocument::parse(source) {
            Ok(doc) => docs.push((position, doc)),
            Err(e) => results.push((position, malformed(source, &e))),
        }
    }

    let (positions, docs): (Vec<usize>, Vec<ResolvedDocument>) = docs.into_iter().unzip();
    let index = SchemaIndex::build(&docs);
    let definitions = Definitions::merge(&docs);

    for (position, doc) in positions.into_iter().zip(&docs) {
        let mut diagnostics = Vec::new();
        match doc.kind {
            DocumentKind::ServiceDescription => {
                check_bindings(doc, &definitions, &mut diagnostics);
                check_messages(doc, &index, &mut diagnostics);
            }
            DocumentKind::Manifest => check_manifest(doc, &mut diagnostics),
            DocumentKind::Schema => {}
        }
        results.push((position, source_result(doc.url.to_string(), diagnostics)));
    }

    results.sort_by_key(|(position, _)| *position);
    let results: Vec<SourceResult> = results.into_iter().map(|(_, r)| r).collect();

    let count = |severity: Severity| {
        results
            .iter()
            .flat_map(|r| &r.diagnostics)
            .filter(|d| d.severity == severity)
            .count()
    };
    let errors = count(Severity::Error);
    let warnings = count(Severity::Warning);

    let failed = results
        .iter()
        .filter(|r| {
            if strict {
                r.status != SourceStatus::Ok
            } else {
                r.status == SourceStatus::Error
            }
        })
        .count();

    LintResult {
        sources_checked: results.len(),
        passed: results.len() - failed,
        failed,
        errors,
        warnings,
        results,
    }
}

fn malformed(source: &LoadedSource, error: &ParseError) -> SourceResult {
    let diagnostic = Diagnostic {
        severity: Severity::Error,
        code: "E004".to_string(),
        source: source.url.to_string(),
        path: "/".to_string(),
        message: error.to_string(),
    };
    source_result(source.url.to_string(), vec![diagnostic])
}

fn source_result(source: String, diagnostics: Vec<Diagnostic>) -> SourceResult {
    let has_errors = diagnostics.iter().any(|d| d.severity == Severity::Error);
    let has_warnings = diagnostics.iter().any(|d| d.severity == Severity::Warning);

    let status = if has_errors {
        SourceStatus::Error
    } else if has_warnings {
        SourceStatus::Warning
    } else {
        SourceStatus::Ok
    };

    SourceResult {
        source,
        status,
        diagnostics,
    }
}

fn check_bindings(doc: &ResolvedDocument, definitions: &Definitions, diagnostics: &mut Vec<Diagnostic>) {
    for binding in doc.root().children().filter(|n| is_wsdl(n, "binding")) {
        let binding_name = binding.attribute("name").unwrap_or("");
        for operation in binding.children().filter(|n| is_wsdl(n, "operation")) {
            let name = operation.attribute("name").unwrap_or("").trim();
            let path = format!("/binding[{}]/operation[{}]", binding_name, name);

            let Some(signature) = definitions.operation(name) else {
                diagnostics.push(Diagnostic {
                    severity: Severity::Warning,
                    code: "W001".to_string(),
                    source: doc.url.to_string(),
                    path,
                    message: format!("no port type operation named '{}'", name),
                });
                continue;
            };

            let input = &signature.input_message;
            if !input.is_empty() && definitions.message(input).is_none() {
                diagnostics.push(Diagnostic {
                    severity: Severity::Error,
                    code: "E001".to_string(),
                    source: doc.url.to_string(),
                    path,
                    message: format!("input message '{}' is not declared", input),
                });
            }
        }
    }
}

fn check_messages(doc: &ResolvedDocument, index: &SchemaIndex, diagnostics: &mut Vec<Diagnostic>) {
    for message in doc.root().children().filter(|n| is_wsdl(n, "message")) {
        let message_name = message.attribute("name").unwrap_or("");
        for part in message.children().filter(|n| is_wsdl(n, "part")) {
            let path = format!(
                "/message[{}]/part[{}]",
                message_name,
                part.attribute("name").unwrap_or("")
            );

            if let Some(element) = attribute_qname(&part, "element") {
                if index.element(&element).is_none() {
                    diagnostics.push(Diagnostic {
                        severity: Severity::Error,
                        code: "E002".to_string(),
                        source: doc.url.to_string(),
                        path: path.clone(),
                        message: format!("element '{}' not found", element),
                    });
                }
            }

            if let Some(type_ref) = attribute_qname(&part, "type") {
                let known = type_ref.is_xsd()
                    || index.complex_type(&type_ref).is_some()
                    || index.simple_type(&type_ref).is_some();
                if !known {
                    diagnostics.push(Diagnostic {
                        severity: Severity::Error,
                        code: "E003".to_string(),
                        source: doc.url.to_string(),
                        path,
                        message: format!("type '{}' not found", type_ref),
                    });
                }
            }
        }
    }
}

fn check_manifest(doc: &ResolvedDocument, diagnostics: &mut Vec<Diagnostic>) {
    if parse_manifest(doc).is_empty() {
        diagnostics.push(Diagnostic {
            severity: Severity::Warning,
            code: "W002".to_string(),
            source: doc.url.to_string(),
            path: "/".to_string(),
            message: "manifest declares no functions".to_string(),
        });
    }
}
