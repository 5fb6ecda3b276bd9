//! Fetching source text by URL.
//!
//! `file://` URLs are read from disk; `http://` and `https://` URLs are
//! fetched with reqwest when the `remote` feature is enabled (the default).

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::error::{FetchError, ParseError};

#[cfg(feature = "remote")]
use std::time::Duration;

/// Default timeout for HTTP requests (10 seconds).
#[cfg(feature = "remote")]
pub const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Text fetch by absolute URL.
///
/// Implementations must return promptly once `cancel` fires; the loader
/// also races every call against the token.
#[async_trait]
pub trait Fetch: Send + Sync {
    async fn fetch_text(&self, url: &Url, cancel: &CancellationToken)
        -> Result<String, FetchError>;
}

/// Reads `file://` URLs from the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileFetcher;

#[async_trait]
impl Fetch for FileFetcher {
    async fn fetch_text(
        &self,
        url: &Url,
        _cancel: &CancellationToken,
    ) -> Result<String, FetchError> {
        if url.scheme() != "file" {
            return Err(FetchError::UnsupportedScheme {
                scheme: url.scheme().to_string(),
            });
        }
        let path = url
            .to_file_path()
            .map_err(|()| FetchError::UnsupportedScheme {
                scheme: url.scheme().to_string(),
            })?;

        match tokio::fs::read_to_string(&path).await {
            Ok(text) => Ok(text),
            Err(source) if source.kind() == std::io::ErrorKind::NotFound => {
                Err(FetchError::FileNotFound { path })
            }
            Err(source) => Err(FetchError::ReadError { path, source }),
        }
    }
}

/// Fetches `http://` and `https://` URLs.
#[cfg(feature = "remote")]
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

#[cfg(feature = "remote")]
impl HttpFetcher {
    /// Build a fetcher with the default timeout.
    pub fn new() -> Result<Self, FetchError> {
        Self::with_timeout(HTTP_TIMEOUT)
    }

    /// Build a fetcher with a custom request timeout.
    pub fn with_timeout(timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|source| FetchError::NetworkError { source })?;
        Ok(Self { client })
    }
}

#[cfg(feature = "remote")]
#[async_trait]
impl Fetch for HttpFetcher {
    async fn fetch_text(
        &self,
        url: &Url,
        cancel: &CancellationToken,
    ) -> Result<String, FetchError> {
        if !matches!(url.scheme(), "http" | "https") {
            return Err(FetchError::UnsupportedScheme {
                scheme: url.scheme().to_string(),
            });
        }

        let request = async {
            let response = self
                .client
                .get(url.clone())
                .send()
                .await
                .map_err(|source| FetchError::NetworkError { source })?;

            // Check for HTTP errors before reading the body
            let status = response.status();
            if !status.is_success() {
                return Err(FetchError::HttpStatus {
                    status: status.as_u16(),
                });
            }

            response
                .text()
                .await
                .map_err(|source| FetchError::NetworkError { source })
        };

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(FetchError::Cancelled),
            result = request => result,
        }
    }
}

/// Dispatches to the file or HTTP fetcher by URL scheme.
#[derive(Debug, Clone)]
pub struct SourceFetcher {
    file: FileFetcher,
    #[cfg(feature = "remote")]
    http: HttpFetcher,
}

impl SourceFetcher {
    /// Build a fetcher for every supported scheme with default settings.
    pub fn new() -> Result<Self, FetchError> {
        Ok(Self {
            file: FileFetcher,
            #[cfg(feature = "remote")]
            http: HttpFetcher::new()?,
        })
    }

    /// Build a fetcher whose HTTP requests use `timeout`.
    #[cfg(feature = "remote")]
    pub fn with_timeout(timeout: Duration) -> Result<Self, FetchError> {
        Ok(Self {
            file: FileFetcher,
            http: HttpFetcher::with_timeout(timeout)?,
        })
    }
}

#[async_trait]
impl Fetch for SourceFetcher {
    async fn fetch_text(
        &self,
        url: &Url,
        cancel: &CancellationToken,
    ) -> Result<String, FetchError> {
        match url.scheme() {
            "file" => self.file.fetch_text(url, cancel).await,
            #[cfg(feature = "remote")]
            "http" | "https" => self.http.fetch_text(url, cancel).await,
            other => Err(FetchError::UnsupportedScheme {
                scheme: other.to_string(),
            }),
        }
    }
}

/// Fetch one URL, racing the fetch against the cancellation token.
pub(crate) async fn fetch_cancellable<F: Fetch + ?Sized>(
    fetcher: &F,
    url: &Url,
    cancel: &CancellationToken,
) -> Result<String, ParseError> {
    if cancel.is_cancelled() {
        return Err(ParseError::Cancelled);
    }

    let result = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Err(ParseError::Cancelled),
        result = fetcher.fetch_text(url, cancel) => result,
    };

    match result {
        Ok(text) => Ok(text),
        Err(FetchError::Cancelled) => Err(ParseError::Cancelled),
        Err(source) => Err(ParseError::Fetch {
            url: url.to_string(),
            source,
        }),
    }
}
