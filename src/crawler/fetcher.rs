//! HTTP fetcher implementation
//!
//! This module is the crawl engine's only window onto the network:
//! - The [`Fetcher`] trait, so the engine can be driven by any transport
//! - [`HttpFetcher`], the reqwest-backed implementation used in production
//! - [`FetchOutcome`], the success/failure classification the engine records
//!
//! Warming only needs the request to reach the cache, so the fetcher performs
//! exactly one attempt per URL. There is no retry and no back-off.

use crate::config::RunConfig;
use crate::crawler::parser::DocumentKind;
use crate::{ConfigError, WarmerError};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE, COOKIE};
use reqwest::{Client, StatusCode};
use thiserror::Error;
use url::Url;

/// A completed HTTP exchange, whatever its status
#[derive(Debug, Clone)]
pub struct FetchResponse {
    /// HTTP status code
    pub status_code: u16,

    /// URL after redirects; the base for resolving relative links
    pub final_url: Url,

    /// Content-Type header value (empty when absent)
    pub content_type: String,

    /// Response body; empty for content types that are never scanned for links
    pub body: String,
}

/// A request that produced no usable response
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("redirect error: {0}")]
    Redirect(String),

    #[error("failed to read response body: {message}")]
    Body { status_code: u16, message: String },

    #[error("{0}")]
    Request(String),
}

impl TransportError {
    /// Status code received before the failure, or 0 if none was
    pub fn status_code(&self) -> u16 {
        match self {
            TransportError::Body { status_code, .. } => *status_code,
            _ => 0,
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            TransportError::Timeout
        } else if e.is_connect() {
            TransportError::Connect(e.to_string())
        } else if e.is_redirect() {
            TransportError::Redirect(e.to_string())
        } else {
            TransportError::Request(e.to_string())
        }
    }
}

/// The fetch capability the crawl engine calls into
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Performs one request for `url`
    async fn fetch(&self, url: &Url) -> Result<FetchResponse, TransportError>;
}

/// Outcome of fetching one URL, as recorded by the aggregator
#[derive(Debug, Clone)]
pub enum FetchOutcome {
    /// 2xx response
    Success {
        /// HTTP status code
        status_code: u16,
        /// The URL that was requested
        url: Url,
        /// URL after redirects
        final_url: Url,
        /// Content-Type header value
        content_type: String,
        /// Response body
        body: String,
    },

    /// Non-2xx response or transport error
    Failure {
        /// HTTP status code; 0 for transport errors
        status_code: u16,
        /// The URL that was requested
        url: Url,
        /// Human-readable cause
        cause: String,
    },
}

impl FetchOutcome {
    /// Classifies a fetch result
    ///
    /// Any 2xx status is a success. Every other status, and every transport
    /// error, is a failure carrying the status code (0 when none was received).
    ///
    /// # Example
    ///
    /// ```
    /// use cache_warmer::crawler::{FetchOutcome, TransportError};
    /// use url::Url;
    ///
    /// let url = Url::parse("https://example.com/").unwrap();
    /// let outcome = FetchOutcome::from_fetch(&url, Err(TransportError::Timeout));
    /// assert!(!outcome.is_success());
    /// assert_eq!(outcome.status_code(), 0);
    /// ```
    pub fn from_fetch(url: &Url, result: Result<FetchResponse, TransportError>) -> Self {
        match result {
            Ok(response) if (200..300).contains(&response.status_code) => FetchOutcome::Success {
                status_code: response.status_code,
                url: url.clone(),
                final_url: response.final_url,
                content_type: response.content_type,
                body: response.body,
            },
            Ok(response) => FetchOutcome::Failure {
                status_code: response.status_code,
                url: url.clone(),
                cause: status_text(response.status_code),
            },
            Err(e) => FetchOutcome::Failure {
                status_code: e.status_code(),
                url: url.clone(),
                cause: e.to_string(),
            },
        }
    }

    /// Returns true for a 2xx response
    pub fn is_success(&self) -> bool {
        matches!(self, FetchOutcome::Success { .. })
    }

    /// HTTP status code (0 for transport errors)
    pub fn status_code(&self) -> u16 {
        match self {
            FetchOutcome::Success { status_code, .. } | FetchOutcome::Failure { status_code, .. } => {
                *status_code
            }
        }
    }

    /// The URL that was requested
    pub fn url(&self) -> &Url {
        match self {
            FetchOutcome::Success { url, .. } | FetchOutcome::Failure { url, .. } => url,
        }
    }
}

/// Canonical reason phrase for a status code
fn status_text(status_code: u16) -> String {
    StatusCode::from_u16(status_code)
        .ok()
        .and_then(|s| s.canonical_reason())
        .map(str::to_string)
        .unwrap_or_else(|| format!("HTTP {}", status_code))
}

/// Builds an HTTP client with proper configuration
///
/// The client sends the configured User-Agent and, when set, the Cookie
/// header on every request. Redirects are followed with reqwest's default
/// policy.
///
/// # Arguments
///
/// * `config` - The run configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(WarmerError)` - Invalid cookie header or client build failure
pub fn build_http_client(config: &RunConfig) -> Result<Client, WarmerError> {
    let mut headers = HeaderMap::new();
    if let Some(cookie) = &config.cookie {
        let value = HeaderValue::from_str(cookie)
            .map_err(|e| ConfigError::Validation(format!("invalid cookie header: {}", e)))?;
        headers.insert(COOKIE, value);
    }

    let client = Client::builder()
        .user_agent(config.user_agent.as_str())
        .default_headers(headers)
        .timeout(config.request_timeout)
        .connect_timeout(config.connect_timeout)
        .gzip(true)
        .brotli(true)
        .build()?;

    Ok(client)
}

/// reqwest-backed [`Fetcher`]
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Creates a fetcher from the run configuration
    pub fn new(config: &RunConfig) -> Result<Self, WarmerError> {
        Ok(Self {
            client: build_http_client(config)?,
        })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<FetchResponse, TransportError> {
        let mut response = self.client.get(url.clone()).send().await?;

        let status_code = response.status().as_u16();
        let final_url = response.url().clone();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        let body_error = |e: reqwest::Error| TransportError::Body {
            status_code,
            message: e.to_string(),
        };

        // The body is always drained so the full response passes through the
        // cache, but only documents that can carry links are kept in memory.
        let body = if DocumentKind::from_content_type(&content_type) == DocumentKind::Other {
            let mut drained = 0usize;
            while let Some(chunk) = response.chunk().await.map_err(body_error)? {
                drained += chunk.len();
            }
            tracing::trace!("Drained {} bytes of {} from {}", drained, content_type, url);
            String::new()
        } else {
            response.text().await.map_err(body_error)?
        };

        Ok(FetchResponse {
            status_code,
            final_url,
            content_type,
            body,
        })
    }
}
