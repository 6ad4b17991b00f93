//! Crawler module for site warming
//!
//! This module contains the crawl engine, including:
//! - The frontier (visited set, pending queue, in-flight accounting)
//! - HTTP fetching behind the `Fetcher` trait
//! - Link extraction from HTML pages and XML sitemaps
//! - Overall crawl coordination across a fixed worker pool

mod coordinator;
mod fetcher;
mod frontier;
mod parser;

pub use coordinator::{run_warmer, Coordinator};
pub use fetcher::{
    build_http_client, FetchOutcome, FetchResponse, Fetcher, HttpFetcher, TransportError,
};
pub use frontier::{CrawlTask, Frontier};
pub use parser::{extract_links, DocumentKind};
