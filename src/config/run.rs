use crate::config::types::Config;
use crate::config::validation::validate;
use crate::url::UrlFilter;
use crate::ConfigError;
use std::time::Duration;
use url::Url;

/// Immutable settings for one crawl run
///
/// Built once from a validated [`Config`]; the crawl engine only ever reads it.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Seed URL, fetched at depth 1 regardless of the filter
    pub seed: Url,

    /// Accept predicate for discovered URLs
    pub filter: UrlFilter,

    /// Maximum depth; the seed is depth 1
    pub max_depth: u32,

    /// Number of concurrent workers
    pub parallelism: usize,

    /// User-Agent header value
    pub user_agent: String,

    /// Optional Cookie header value
    pub cookie: Option<String>,

    /// Optional health-check URL
    pub preflight_url: Option<Url>,

    /// Whole-request timeout
    pub request_timeout: Duration,

    /// Connection establishment timeout
    pub connect_timeout: Duration,

    /// Optional bound on the whole run
    pub max_duration: Option<Duration>,
}

impl Config {
    /// Validates this configuration and converts it into a [`RunConfig`]
    ///
    /// # Example
    ///
    /// ```
    /// use cache_warmer::config::Config;
    ///
    /// let run = Config::default().into_run_config().unwrap();
    /// assert_eq!(run.max_depth, 2);
    /// assert_eq!(run.parallelism, 1);
    /// ```
    pub fn into_run_config(self) -> Result<RunConfig, ConfigError> {
        validate(&self)?;

        let seed = Url::parse(&self.crawler.initial_url)
            .map_err(|e| ConfigError::InvalidUrl(e.to_string()))?;
        let filter = UrlFilter::new(&self.crawler.filter)?;
        let preflight_url = self
            .preflight
            .url
            .as_deref()
            .map(Url::parse)
            .transpose()
            .map_err(|e| ConfigError::InvalidUrl(e.to_string()))?;

        Ok(RunConfig {
            seed,
            filter,
            max_depth: self.crawler.max_depth,
            parallelism: self.crawler.workers,
            user_agent: self.http.user_agent,
            cookie: self.http.cookie.filter(|c| !c.is_empty()),
            preflight_url,
            request_timeout: Duration::from_secs(self.http.timeout_secs),
            connect_timeout: Duration::from_secs(self.http.connect_timeout_secs),
            max_duration: self.crawler.max_duration_secs.map(Duration::from_secs),
        })
    }
}
