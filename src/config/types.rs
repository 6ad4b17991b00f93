use serde::Deserialize;

/// Seed used when neither the config file nor the command line names one
pub const DEFAULT_INITIAL_URL: &str = "https://www.example.com/";

/// Accept filter used when none is configured
pub const DEFAULT_FILTER: &str = r"example\.com";

/// Returns the User-Agent sent when none is configured
///
/// ```
/// let agent = cache_warmer::config::default_user_agent();
/// assert!(agent.starts_with("cache-warmer_v"));
/// ```
pub fn default_user_agent() -> String {
    format!("cache-warmer_v{}", env!("CARGO_PKG_VERSION"))
}

/// Main configuration structure for Cache Warmer
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub crawler: CrawlerConfig,
    pub http: HttpConfig,
    pub preflight: PreflightConfig,
}

/// Traversal configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Starting point of the crawl; always fetched
    #[serde(rename = "initial-url")]
    pub initial_url: String,

    /// Regular expression a discovered URL must match to be followed
    pub filter: String,

    /// Maximum link depth; 1 fetches only the initial URL
    #[serde(rename = "max-depth")]
    pub max_depth: u32,

    /// Number of concurrent workers
    pub workers: usize,

    /// Upper bound on the whole run in seconds (unbounded when absent)
    #[serde(rename = "max-duration-secs")]
    pub max_duration_secs: Option<u64>,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            initial_url: DEFAULT_INITIAL_URL.to_string(),
            filter: DEFAULT_FILTER.to_string(),
            max_depth: 2,
            workers: 1,
            max_duration_secs: None,
        }
    }
}

/// Request configuration shared by every fetch
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Value of the User-Agent header
    #[serde(rename = "user-agent")]
    pub user_agent: String,

    /// Raw Cookie header value, sent verbatim on every request
    pub cookie: Option<String>,

    /// Whole-request timeout in seconds
    #[serde(rename = "timeout-secs")]
    pub timeout_secs: u64,

    /// Connection establishment timeout in seconds
    #[serde(rename = "connect-timeout-secs")]
    pub connect_timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            cookie: None,
            timeout_secs: 30,
            connect_timeout_secs: 10,
        }
    }
}

/// Optional health check performed before crawling
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PreflightConfig {
    /// URL that must answer 200 before the crawl starts
    pub url: Option<String>,
}
