//! URL handling module for Cache Warmer
//!
//! This module provides the normalization applied before a URL enters the
//! visited set, and the regex accept filter that restricts a crawl (usually to
//! one domain).

mod matcher;
mod normalize;

// Re-export main functions
pub use matcher::UrlFilter;
pub use normalize::{normalize_url, resolve_url};
