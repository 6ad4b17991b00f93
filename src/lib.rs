//! Cache Warmer: a site-warming crawler
//!
//! This crate walks a site from a seed URL up to a bounded depth, issuing one
//! request per discovered page so that an upstream cache (CDN, reverse proxy,
//! application cache) observes and stores every reachable response.

pub mod config;
pub mod crawler;
pub mod output;
pub mod preflight;
pub mod url;

use thiserror::Error;

/// Main error type for Cache Warmer operations
///
/// Per-URL fetch failures are never surfaced through this type; they are
/// recorded by the [`output::ResultAggregator`] instead.
#[derive(Debug, Error)]
pub enum WarmerError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Pre-flight request to {url} failed: {reason}")]
    Preflight { url: String, reason: String },
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid filter pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingHost,
}

/// Result type alias for Cache Warmer operations
pub type Result<T> = std::result::Result<T, WarmerError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::{Config, RunConfig};
pub use crawler::{run_warmer, Coordinator, Frontier};
pub use output::{AggregateResult, ResultAggregator};
pub use crate::url::{normalize_url, UrlFilter};
