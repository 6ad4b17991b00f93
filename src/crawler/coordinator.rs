//! Crawler coordinator - main crawl orchestration logic
//!
//! This module runs the worker pool that drives a crawl:
//! - Seeding the frontier with the initial URL
//! - Running exactly `parallelism` workers until the frontier is exhausted
//! - Fetching each task once and recording the outcome
//! - Extracting links from successful responses and handing them back to the
//!   frontier one level deeper
//! - Stopping early when the cancellation token fires

use crate::config::RunConfig;
use crate::crawler::fetcher::{FetchOutcome, Fetcher, HttpFetcher};
use crate::crawler::frontier::{CrawlTask, Frontier};
use crate::crawler::parser::{extract_links, DocumentKind};
use crate::output::{AggregateResult, FailureRecord, Reporter, ResultAggregator};
use crate::WarmerError;
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// State shared by every worker of one run
struct CrawlContext {
    config: RunConfig,
    frontier: Frontier,
    fetcher: Arc<dyn Fetcher>,
    aggregator: Arc<ResultAggregator>,
}

/// Main crawler coordinator structure
pub struct Coordinator {
    context: Arc<CrawlContext>,
}

impl Coordinator {
    /// Creates a new coordinator instance
    ///
    /// # Arguments
    ///
    /// * `config` - The run configuration
    /// * `fetcher` - The fetch capability used for every request
    /// * `aggregator` - Where outcomes are recorded
    pub fn new(
        config: RunConfig,
        fetcher: Arc<dyn Fetcher>,
        aggregator: Arc<ResultAggregator>,
    ) -> Self {
        let frontier = Frontier::new(config.max_depth, config.filter.clone());

        Self {
            context: Arc::new(CrawlContext {
                config,
                frontier,
                fetcher,
                aggregator,
            }),
        }
    }

    /// The run's frontier
    pub fn frontier(&self) -> &Frontier {
        &self.context.frontier
    }

    /// The run's aggregator
    pub fn aggregator(&self) -> &Arc<ResultAggregator> {
        &self.context.aggregator
    }

    /// Runs the crawl to completion
    ///
    /// Returns once the frontier has no pending and no in-flight tasks, or as
    /// soon as `cancel` fires. On cancellation, fetches still in flight are
    /// abandoned and not recorded; the returned result covers everything
    /// recorded before that.
    pub async fn run(&self, cancel: CancellationToken) -> AggregateResult {
        let context = &self.context;
        let start_time = Instant::now();

        tracing::info!(
            "Starting crawl of {} (max depth {}, {} workers)",
            context.config.seed,
            context.config.max_depth,
            context.config.parallelism
        );

        context.frontier.seed(&context.config.seed);

        let mut workers = JoinSet::new();
        for worker_id in 0..context.config.parallelism.max(1) {
            let context = Arc::clone(context);
            let cancel = cancel.clone();
            workers.spawn(async move { context.worker_loop(worker_id, cancel).await });
        }

        while let Some(joined) = workers.join_next().await {
            if let Err(e) = joined {
                tracing::error!("Crawl worker terminated abnormally: {}", e);
            }
        }

        let summary = context.aggregator.summary();

        if cancel.is_cancelled() {
            tracing::warn!(
                "Crawl cancelled with {} URLs still pending",
                context.frontier.pending_count()
            );
        }

        tracing::info!(
            "Crawl finished: {} responses, {} errors, {} URLs discovered in {:?}",
            summary.success_count,
            summary.total_failures(),
            context.frontier.visited_count(),
            start_time.elapsed()
        );

        summary
    }
}

/// Completes a dequeued task when dropped, including while unwinding
///
/// A worker that panics mid-task would otherwise leave the in-flight count
/// raised and every other worker waiting forever.
struct InFlight<'a>(&'a Frontier);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.complete();
    }
}

impl CrawlContext {
    async fn worker_loop(&self, worker_id: usize, cancel: CancellationToken) {
        tracing::trace!("Worker {} started", worker_id);

        while let Some(task) = self.frontier.next_task(&cancel).await {
            let _in_flight = InFlight(&self.frontier);

            tracing::debug!(
                "Worker {} fetching {} (depth {})",
                worker_id,
                task.url,
                task.depth
            );

            let outcome = tokio::select! {
                result = self.fetcher.fetch(&task.url) => {
                    Some(FetchOutcome::from_fetch(&task.url, result))
                }
                _ = cancel.cancelled() => None,
            };

            if let Some(outcome) = outcome {
                self.process_outcome(&task, outcome);
            }
        }

        tracing::trace!("Worker {} finished", worker_id);
    }

    /// Records an outcome and enqueues the children of a successful fetch
    ///
    /// # Returns
    ///
    /// The number of new tasks created
    fn process_outcome(&self, task: &CrawlTask, outcome: FetchOutcome) -> usize {
        match outcome {
            FetchOutcome::Failure {
                status_code,
                url,
                cause,
            } => {
                tracing::debug!("Failed {} ({}): {}", url, status_code, cause);
                self.aggregator.record_failure(FailureRecord {
                    status_code,
                    url,
                    cause,
                });
                0
            }

            FetchOutcome::Success {
                status_code,
                url,
                final_url,
                content_type,
                body,
            } => {
                tracing::debug!("Fetched {} ({})", url, status_code);
                self.aggregator.record_success(&url);

                if task.depth >= self.config.max_depth {
                    return 0;
                }

                let kind = DocumentKind::from_content_type(&content_type);
                let links = extract_links(&body, &final_url, kind);
                let child_depth = task.depth + 1;

                let enqueued = links
                    .iter()
                    .filter(|link| self.frontier.try_enqueue(link, &final_url, child_depth))
                    .count();

                tracing::debug!(
                    "{}: {} links found, {} enqueued at depth {}",
                    final_url,
                    links.len(),
                    enqueued,
                    child_depth
                );

                enqueued
            }
        }
    }
}

/// Runs a complete warming pass with the production HTTP fetcher
///
/// This function:
/// 1. Builds the HTTP client from the run configuration
/// 2. Wires the aggregator to the optional reporter
/// 3. Arms the optional overall time limit
/// 4. Runs the coordinator until the crawl completes or is cancelled
///
/// # Arguments
///
/// * `config` - The run configuration
/// * `reporter` - Optional observer for incremental progress
/// * `cancel` - External cancellation (e.g. Ctrl-C)
///
/// # Returns
///
/// * `Ok(AggregateResult)` - The crawl ran; per-URL failures are inside
/// * `Err(WarmerError)` - The HTTP client could not be built
///
/// # Example
///
/// ```no_run
/// use cache_warmer::config::Config;
/// use cache_warmer::crawler::run_warmer;
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = Config::default().into_run_config()?;
/// let result = run_warmer(config, None, CancellationToken::new()).await?;
/// println!("{} responses", result.success_count);
/// # Ok(())
/// # }
/// ```
pub async fn run_warmer(
    config: RunConfig,
    reporter: Option<Arc<dyn Reporter>>,
    cancel: CancellationToken,
) -> Result<AggregateResult, WarmerError> {
    let fetcher = Arc::new(HttpFetcher::new(&config)?);
    let aggregator = Arc::new(ResultAggregator::new(reporter));

    let run_token = cancel.child_token();
    let deadline = config.max_duration.map(|limit| {
        let token = run_token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(limit).await;
            tracing::warn!("Time limit of {:?} reached, stopping crawl", limit);
            token.cancel();
        })
    });

    let coordinator = Coordinator::new(config, fetcher, aggregator);
    let result = coordinator.run(run_token).await;

    if let Some(handle) = deadline {
        handle.abort();
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::crawler::fetcher::{FetchResponse, TransportError};
    use crate::url::UrlFilter;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;
    use url::Url;

    /// In-memory site: URL -> (status, content type, body)
    #[derive(Default)]
    struct MockFetcher {
        pages: HashMap<String, (u16, &'static str, String)>,
        calls: Mutex<HashMap<String, usize>>,
        delay: Option<Duration>,
    }

    impl MockFetcher {
        fn page(mut self, url: &str, status: u16, content_type: &'static str, body: &str) -> Self {
            self.pages
                .insert(url.to_string(), (status, content_type, body.to_string()));
            self
        }

        fn html(self, url: &str, links: &[&str]) -> Self {
            let body: String = links
                .iter()
                .map(|l| format!("<a href=\"{}\">x</a>", l))
                .collect();
            self.page(url, 200, "text/html", &format!("<html><body>{}</body></html>", body))
        }

        fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = Some(delay);
            self
        }

        fn calls(&self) -> HashMap<String, usize> {
            self.calls.lock().unwrap().clone()
        }

        fn total_calls(&self) -> usize {
            self.calls().values().sum()
        }
    }

    #[async_trait]
    impl Fetcher for MockFetcher {
        async fn fetch(&self, url: &Url) -> Result<FetchResponse, TransportError> {
            *self
                .calls
                .lock()
                .unwrap()
                .entry(url.to_string())
                .or_default() += 1;

            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }

            match self.pages.get(url.as_str()) {
                Some((0, _, _)) => Err(TransportError::Connect("refused".to_string())),
                Some((status, content_type, body)) => Ok(FetchResponse {
                    status_code: *status,
                    final_url: url.clone(),
                    content_type: content_type.to_string(),
                    body: body.clone(),
                }),
                None => Ok(FetchResponse {
                    status_code: 404,
                    final_url: url.clone(),
                    content_type: "text/html".to_string(),
                    body: String::new(),
                }),
            }
        }
    }

    /// Panics on one URL, delegates everything else
    struct PanickingFetcher {
        inner: MockFetcher,
        panic_on: &'static str,
    }

    #[async_trait]
    impl Fetcher for PanickingFetcher {
        async fn fetch(&self, url: &Url) -> Result<FetchResponse, TransportError> {
            if url.as_str() == self.panic_on {
                panic!("fetcher failed on {}", url);
            }
            self.inner.fetch(url).await
        }
    }

    fn run_config(max_depth: u32, parallelism: usize) -> RunConfig {
        let mut config = Config::default();
        config.crawler.initial_url = "https://example.com/".to_string();
        config.crawler.max_depth = max_depth;
        config.crawler.workers = parallelism;
        config.into_run_config().unwrap()
    }

    async fn crawl(fetcher: Arc<MockFetcher>, config: RunConfig) -> AggregateResult {
        let coordinator =
            Coordinator::new(config, fetcher, Arc::new(ResultAggregator::default()));
        coordinator.run(CancellationToken::new()).await
    }

    /// A small graph with shared children, a cycle and one of each failure class
    fn site() -> MockFetcher {
        MockFetcher::default()
            .html(
                "https://example.com/",
                &["/a", "/b", "https://other.org/", "/missing", "#top"],
            )
            .html("https://example.com/a", &["/c", "/", "/a"])
            .html("https://example.com/b", &["/c", "/broken", "/down"])
            .html("https://example.com/c", &["/d"])
            .html("https://example.com/d", &[])
            .page("https://example.com/broken", 500, "text/html", "")
            .page("https://example.com/down", 0, "", "")
            .html("https://other.org/", &[])
    }

    #[tokio::test]
    async fn test_depth_one_fetches_only_seed() {
        let fetcher = Arc::new(site());
        let coordinator = Coordinator::new(
            run_config(1, 1),
            fetcher.clone(),
            Arc::new(ResultAggregator::default()),
        );

        let result = coordinator.run(CancellationToken::new()).await;

        assert_eq!(fetcher.total_calls(), 1);
        assert_eq!(result.success_count, 1);
        assert_eq!(coordinator.frontier().visited_count(), 1);
    }

    #[tokio::test]
    async fn test_shared_child_fetched_once() {
        let fetcher = Arc::new(site());
        crawl(fetcher.clone(), run_config(5, 1)).await;

        let calls = fetcher.calls();
        assert_eq!(calls.get("https://example.com/c"), Some(&1));
        assert_eq!(calls.get("https://example.com/"), Some(&1));
        assert!(calls.values().all(|&n| n == 1));
    }

    #[tokio::test]
    async fn test_filter_blocks_other_domain() {
        let fetcher = Arc::new(site());
        crawl(fetcher.clone(), run_config(5, 2)).await;

        assert!(!fetcher.calls().contains_key("https://other.org/"));
    }

    #[tokio::test]
    async fn test_depth_bound() {
        let fetcher = Arc::new(site());
        crawl(fetcher.clone(), run_config(3, 1)).await;

        let calls = fetcher.calls();
        // Depth 3 is /c; /d sits at depth 4.
        assert!(calls.contains_key("https://example.com/c"));
        assert!(!calls.contains_key("https://example.com/d"));
    }

    #[tokio::test]
    async fn test_failures_classified() {
        let fetcher = Arc::new(site());
        let result = crawl(fetcher, run_config(5, 1)).await;

        // /, /a, /b, /c, /d succeed; /missing 404, /broken 500, /down transport.
        assert_eq!(result.success_count, 5);
        assert_eq!(result.error_counts.client_errors, 1);
        assert_eq!(result.error_counts.server_errors, 1);
        assert_eq!(result.error_counts.other, 1);
        assert_eq!(result.errors.len(), 3);

        let down = result
            .errors
            .iter()
            .find(|f| f.url.path() == "/down")
            .unwrap();
        assert_eq!(down.status_code, 0);
    }

    #[tokio::test]
    async fn test_failed_page_children_not_followed() {
        let fetcher = Arc::new(
            MockFetcher::default()
                .html("https://example.com/", &["/gone"])
                .page(
                    "https://example.com/gone",
                    410,
                    "text/html",
                    "<a href=\"/hidden\">x</a>",
                ),
        );
        let result = crawl(fetcher.clone(), run_config(5, 1)).await;

        assert!(!fetcher.calls().contains_key("https://example.com/hidden"));
        assert_eq!(result.error_counts.client_errors, 1);
    }

    #[tokio::test]
    async fn test_parallel_and_sequential_totals_match() {
        let sequential = crawl(Arc::new(site()), run_config(5, 1)).await;
        let parallel = crawl(
            Arc::new(site().with_delay(Duration::from_millis(5))),
            run_config(5, 8),
        )
        .await;

        assert_eq!(sequential.success_count, parallel.success_count);
        assert_eq!(sequential.error_counts, parallel.error_counts);
        assert_eq!(sequential.errors.len(), parallel.errors.len());
    }

    #[tokio::test]
    async fn test_leaf_seed_with_many_workers_terminates() {
        let fetcher = Arc::new(MockFetcher::default().html("https://example.com/", &[]));
        let result = tokio::time::timeout(
            Duration::from_secs(5),
            crawl(fetcher.clone(), run_config(3, 4)),
        )
        .await
        .expect("crawl did not terminate");

        assert_eq!(fetcher.total_calls(), 1);
        assert_eq!(result.success_count, 1);
    }

    #[tokio::test]
    async fn test_sitemap_entries_enqueued() {
        let sitemap = r#"<?xml version="1.0"?>
            <urlset>
              <url><loc>https://example.com/one</loc></url>
              <url><loc>https://example.com/two</loc></url>
              <url><loc>https://example.com/three</loc></url>
            </urlset>"#;
        let fetcher = Arc::new(
            MockFetcher::default()
                .page("https://example.com/", 200, "application/xml", sitemap)
                .html("https://example.com/one", &[])
                .html("https://example.com/two", &[])
                .html("https://example.com/three", &[]),
        );
        let coordinator = Coordinator::new(
            run_config(2, 2),
            fetcher.clone(),
            Arc::new(ResultAggregator::default()),
        );

        let result = coordinator.run(CancellationToken::new()).await;

        assert_eq!(coordinator.frontier().visited_count(), 4);
        assert_eq!(result.success_count, 4);
        assert_eq!(fetcher.total_calls(), 4);
    }

    #[tokio::test]
    async fn test_non_html_body_not_parsed() {
        let fetcher = Arc::new(
            MockFetcher::default()
                .page("https://example.com/", 200, "text/plain", "<a href=\"/x\">x</a>"),
        );
        crawl(fetcher.clone(), run_config(3, 1)).await;

        assert_eq!(fetcher.total_calls(), 1);
    }

    #[tokio::test]
    async fn test_seed_exempt_from_filter() {
        let fetcher = Arc::new(MockFetcher::default().html("https://example.com/", &[]));
        let mut config = run_config(2, 1);
        config.filter = UrlFilter::new(r"nothing-matches\.invalid").unwrap();

        let result = crawl(fetcher.clone(), config).await;

        assert_eq!(result.success_count, 1);
    }

    #[tokio::test]
    async fn test_cancellation_stops_crawl() {
        let fetcher = Arc::new(
            MockFetcher::default()
                .html("https://example.com/", &["/slow"])
                .html("https://example.com/slow", &[])
                .with_delay(Duration::from_secs(30)),
        );
        let coordinator = Coordinator::new(
            run_config(3, 2),
            fetcher,
            Arc::new(ResultAggregator::default()),
        );

        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            trigger.cancel();
        });

        let result = tokio::time::timeout(Duration::from_secs(5), coordinator.run(cancel))
            .await
            .expect("cancelled crawl did not return");

        assert_eq!(result.total_fetches(), 0);
        assert!(coordinator.frontier().is_exhausted());
    }

    #[tokio::test]
    async fn test_reporter_sees_every_outcome() {
        #[derive(Default)]
        struct Counting {
            successes: Mutex<u64>,
            failures: Mutex<u64>,
        }

        impl Reporter for Counting {
            fn on_success(&self, total: u64, _url: &Url) {
                *self.successes.lock().unwrap() = total;
            }

            fn on_failure(
                &self,
                counts: &crate::output::ErrorCounts,
                _successes: u64,
                _failure: &FailureRecord,
            ) {
                *self.failures.lock().unwrap() = counts.total();
            }
        }

        let reporter = Arc::new(Counting::default());
        let aggregator = Arc::new(ResultAggregator::new(Some(reporter.clone())));
        let coordinator = Coordinator::new(run_config(5, 3), Arc::new(site()), aggregator);

        let result = coordinator.run(CancellationToken::new()).await;

        assert_eq!(*reporter.successes.lock().unwrap(), result.success_count);
        assert_eq!(*reporter.failures.lock().unwrap(), result.total_failures());
    }

    #[tokio::test]
    async fn test_worker_panic_does_not_hang_crawl() {
        let fetcher = Arc::new(PanickingFetcher {
            inner: MockFetcher::default()
                .html("https://example.com/", &["/boom", "/ok"])
                .html("https://example.com/ok", &["/deeper"])
                .html("https://example.com/deeper", &[]),
            panic_on: "https://example.com/boom",
        });
        let coordinator = Coordinator::new(
            run_config(3, 2),
            fetcher,
            Arc::new(ResultAggregator::default()),
        );

        let result = tokio::time::timeout(
            Duration::from_secs(5),
            coordinator.run(CancellationToken::new()),
        )
        .await
        .expect("crawl should finish after a worker panicked");

        assert!(coordinator.frontier().is_exhausted());
        assert_eq!(coordinator.frontier().in_flight_count(), 0);
        assert_eq!(result.total_failures(), 0);
        assert_eq!(result.success_count, 3);
    }
}
