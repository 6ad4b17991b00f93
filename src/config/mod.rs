//! Configuration module for Cache Warmer
//!
//! This module handles loading, parsing, and validating the optional TOML
//! configuration file, and turning the result into the immutable
//! [`RunConfig`] consumed by the crawl engine.
//!
//! Every setting has a default, so an empty file (or no file at all) yields a
//! usable configuration. Command-line flags are applied on top of the loaded
//! values before [`Config::into_run_config`] is called.
//!
//! # Example
//!
//! ```no_run
//! use cache_warmer::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("warmer.toml")).unwrap();
//! println!("Warmer will use max depth: {}", config.crawler.max_depth);
//! ```

mod parser;
mod run;
mod types;
mod validation;

// Re-export types
pub use run::RunConfig;
pub use types::{
    default_user_agent, Config, CrawlerConfig, HttpConfig, PreflightConfig, DEFAULT_FILTER,
    DEFAULT_INITIAL_URL,
};

// Re-export parser functions
pub use parser::{load_config, parse_config};
pub use validation::validate;
