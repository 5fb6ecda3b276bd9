//! Source loading with import expansion.
//!
//! Walks the requested locations breadth-first, fetching each distinct URL
//! once and, when asked, enqueuing the WSDL imports and XSD
//! imports/includes each document declares.

use std::collections::{HashSet, VecDeque};
use std::path::Path;

use roxmltree::{Document, ParsingOptions};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};
use url::Url;

use crate::error::ParseError;
use crate::fetch::{fetch_cancellable, Fetch};
use crate::types::{ParseRequest, WSDL_NS, XSD_NS};

/// A fetched source: its absolute URL and full text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedSource {
    pub url: Url,
    pub text: String,
}

/// Check if a string looks like a URL (has a scheme such as `http://`).
pub fn is_url(s: &str) -> bool {
    s.starts_with("http://") || s.starts_with("https://") || s.starts_with("file://")
}

/// Parse a requested location into an absolute URL.
///
/// Returns `None` for empty or relative locations; those are skipped rather
/// than reported as errors.
pub fn parse_location(location: &str) -> Option<Url> {
    let location = location.trim();
    if location.is_empty() {
        return None;
    }
    Url::parse(location).ok().filter(|url| !url.cannot_be_a_base())
}

/// Turn a command-line argument (URL or local path) into a URL string.
///
/// Anything with a scheme is passed through so unsupported schemes are
/// reported by the fetcher. Paths become absolute `file://` URLs whether or
/// not they exist.
pub fn location_from_arg(arg: &str) -> String {
    if is_url(arg) {
        return arg.to_string();
    }
    // single-letter schemes are drive letters
    if let Ok(url) = Url::parse(arg) {
        if url.scheme().len() > 1 {
            return url.into();
        }
    }

    let path = Path::new(arg);
    let absolute = match path.canonicalize() {
        Ok(absolute) => absolute,
        Err(_) => match std::env::current_dir() {
            Ok(cwd) => cwd.join(path),
            Err(_) => return arg.to_string(),
        },
    };
    Url::from_file_path(&absolute)
        .map(String::from)
        .unwrap_or_else(|()| arg.to_string())
}

/// Case-insensitive identity of a normalized URL.
fn source_key(url: &Url) -> String {
    url.as_str().to_lowercase()
}

/// Parse document text, keeping whitespace-only text nodes.
pub(crate) fn parse_document<'input>(
    url: &Url,
    text: &'input str,
) -> Result<Document<'input>, ParseError> {
    let options = ParsingOptions {
        allow_dtd: true,
        ..ParsingOptions::default()
    };
    Document::parse_with_options(text, options).map_err(|source| ParseError::InvalidXml {
        url: url.to_string(),
        source,
    })
}

/// Locations referenced by WSDL imports and XSD import/include/redefine.
fn import_locations(doc: &Document) -> Vec<String> {
    doc.descendants()
        .filter(|node| node.is_element())
        .filter_map(|node| {
            let name = node.tag_name();
            match (name.namespace(), name.name()) {
                (Some(WSDL_NS), "import") => node.attribute("location"),
                (Some(XSD_NS), "import" | "include" | "redefine") => {
                    node.attribute("schemaLocation")
                }
                _ => None,
            }
        })
        .map(str::trim)
        .filter(|location| !location.is_empty())
        .map(String::from)
        .collect()
}

/// Fetch every requested source (and, optionally, everything it imports).
///
/// Sources are returned in fetch order, which is the breadth-first enqueue
/// order: the primary source, the additional sources, then imports as they
/// are discovered. Imports resolve against the URL of the document that
/// declares them.
///
/// # Errors
///
/// Any fetch or XML failure aborts the load; `ParseError::Cancelled` is
/// returned as soon as `cancel` fires.
pub async fn load_documents<F: Fetch + ?Sized>(
    request: &ParseRequest,
    fetcher: &F,
    cancel: &CancellationToken,
) -> Result<Vec<LoadedSource>, ParseError> {
    let mut queue: VecDeque<Url> = VecDeque::new();
    let mut visited: HashSet<String> = HashSet::new();

    for location in request.locations() {
        match parse_location(location) {
            Some(url) => {
                if visited.insert(source_key(&url)) {
                    queue.push_back(url);
                }
            }
            None => debug!(location, "skipping non-absolute source location"),
        }
    }

    let mut loaded = Vec::new();
    while let Some(url) = queue.pop_front() {
        let text = fetch_cancellable(fetcher, &url, cancel).await?;
        debug!(url = %url, bytes = text.len(), "fetched source");

        let imports = {
            let doc = parse_document(&url, &text)?;
            if request.follow_imports {
                import_locations(&doc)
            } else {
                Vec::new()
            }
        };

        for location in imports {
            match url.join(&location) {
                Ok(import) => {
                    if visited.insert(source_key(&import)) {
                        trace!(from = %url, import = %import, "enqueuing import");
                        queue.push_back(import);
                    }
                }
                Err(err) => {
                    debug!(from = %url, location = %location, %err, "unresolvable import location")
                }
            }
        }

        loaded.push(LoadedSource { url, text });
    }

    Ok(loaded)
}
