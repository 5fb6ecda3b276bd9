//! Error types for source loading and catalog building.

use std::path::PathBuf;
use thiserror::Error;

/// Errors while fetching the text of a single source.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("unsupported URL scheme \"{scheme}\"")]
    UnsupportedScheme { scheme: String },

    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("cannot read {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[cfg(feature = "remote")]
    #[error("request failed: {source}")]
    NetworkError {
        #[source]
        source: reqwest::Error,
    },

    #[error("server answered with HTTP {status}")]
    HttpStatus { status: u16 },

    #[error("fetch cancelled")]
    Cancelled,
}

/// Errors that abort a whole parse.
///
/// A parse either completes or fails as a unit: no partial catalog is
/// returned once any of these occurs.
#[derive(Debug, Error)]
pub enum ParseError {
    // IO errors (exit code 3)
    #[error("failed to fetch {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: FetchError,
    },

    // Parse errors (exit code 2)
    #[error("invalid XML in {url}: {source}")]
    InvalidXml {
        url: String,
        #[source]
        source: roxmltree::Error,
    },

    #[error("parse cancelled")]
    Cancelled,
}

impl FetchError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            FetchError::UnsupportedScheme { .. } => 2,
            FetchError::Cancelled => 130,
            _ => 3,
        }
    }
}

impl ParseError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            ParseError::Fetch { source, .. } => source.exit_code(),
            ParseError::InvalidXml { .. } => 2,
            ParseError::Cancelled => 130,
        }
    }

    /// True when the parse stopped because its cancellation token fired.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ParseError::Cancelled)
    }
}
