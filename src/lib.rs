//! SOAP Service Catalog
//!
//! Turns WSDL service descriptions (and the XML Schemas they import) into a
//! flat catalog of callable operations, each with a ready-to-edit example
//! request envelope.
//!
//! # Example
//!
//! ```no_run
//! use soap_catalog::{parse, ParseRequest, SourceFetcher};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let request = ParseRequest::new("https://example.com/orders?wsdl").follow_imports(true);
//! let fetcher = SourceFetcher::new()?;
//! let result = parse(&request, &fetcher, &CancellationToken::new()).await?;
//!
//! for op in &result.operations {
//!     println!("{} ({})", op.name, op.soap_action);
//!     println!("{}", op.example_envelope);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Pipeline
//!
//! | Stage | Input | Output |
//! |-------|-------|--------|
//! | load | request locations | sources in fetch order |
//! | index | every schema | elements and types by qualified name |
//! | merge | every service description | messages and port type operations |
//! | describe | each binding operation | parameters and example envelope |
//! | manifest | documents that are not WSDL or XSD | flat function list |
//!
//! Values in the examples come from the declared types: enumerations,
//! patterns, length and range facets, and annotations are all consulted.
//! A value that cannot be derived is written as `?`.

mod catalog;
mod error;
mod example;
mod fetch;
mod linter;
mod loader;
mod manifest;
mod messages;
mod metadata;
mod present;
mod schema;
mod types;

pub use catalog::{build_catalog, envelope, parse, SoapVersion};
pub use error::{FetchError, ParseError};
pub use example::{
    build_example, Content, ElementDecl, ExampleElement, MAX_EXAMPLE_DEPTH, MAX_EXAMPLE_ELEMENTS,
    PLACEHOLDER,
};
pub use fetch::{Fetch, FileFetcher, SourceFetcher};
pub use linter::{
    lint_sources, Diagnostic, LintResult, Severity, SourceResult, SourceStatus,
};
pub use loader::{is_url, load_documents, location_from_arg, parse_location, LoadedSource};
pub use manifest::parse_manifest;
pub use messages::{Definitions, MessagePart, OperationSignature};
pub use metadata::{primitive, resolve_metadata, Primitive};
pub use present::{dedup_operations, sort_by_name};
pub use schema::{classify, DocumentKind, ResolvedDocument, SchemaIndex};
pub use types::{
    OperationDescriptor, ParameterDescriptor, ParseRequest, ParseResult, QName, ValueMetadata,
    SOAP11_ENVELOPE_NS, SOAP12_ENVELOPE_NS, WSDL_NS, XSD_NS,
};

#[cfg(feature = "remote")]
pub use fetch::{HttpFetcher, HTTP_TIMEOUT};
