//! Thread-safe aggregation of fetch outcomes
//!
//! Workers report every outcome here exactly once. Counters and the failure
//! log sit behind one mutex, and the optional reporter is notified while it is
//! held, so the cumulative numbers a reporter sees never go backwards.

use crate::output::traits::{ErrorClass, ErrorCounts, FailureRecord, Reporter};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use url::Url;

/// Totals for one crawl run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregateResult {
    /// Number of 2xx responses
    pub success_count: u64,

    /// Failure counters by class
    pub error_counts: ErrorCounts,

    /// Every failure, in recording order
    pub errors: Vec<FailureRecord>,
}

impl AggregateResult {
    /// Number of failed fetches
    pub fn total_failures(&self) -> u64 {
        self.error_counts.total()
    }

    /// Number of fetches of any outcome
    pub fn total_fetches(&self) -> u64 {
        self.success_count + self.total_failures()
    }

    /// Failures in one class
    pub fn failures_in(&self, class: ErrorClass) -> impl Iterator<Item = &FailureRecord> {
        self.errors.iter().filter(move |f| f.class() == class)
    }
}

/// Collects outcomes from concurrent workers
pub struct ResultAggregator {
    result: Mutex<AggregateResult>,
    reporter: Option<Arc<dyn Reporter>>,
}

impl ResultAggregator {
    /// Creates an aggregator, optionally wired to a reporter
    pub fn new(reporter: Option<Arc<dyn Reporter>>) -> Self {
        Self {
            result: Mutex::new(AggregateResult::default()),
            reporter,
        }
    }

    fn lock(&self) -> MutexGuard<'_, AggregateResult> {
        self.result.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Records a successful response
    pub fn record_success(&self, url: &Url) {
        let mut result = self.lock();
        result.success_count += 1;

        if let Some(reporter) = &self.reporter {
            reporter.on_success(result.success_count, url);
        }
    }

    /// Records a failed fetch, classified by its status code
    pub fn record_failure(&self, failure: FailureRecord) {
        let mut result = self.lock();
        result.error_counts.increment(failure.class());

        if let Some(reporter) = &self.reporter {
            reporter.on_failure(&result.error_counts, result.success_count, &failure);
        }

        result.errors.push(failure);
    }

    /// Snapshot of the current totals
    pub fn summary(&self) -> AggregateResult {
        self.lock().clone()
    }
}

impl Default for ResultAggregator {
    fn default() -> Self {
        Self::new(None)
    }
}

impl std::fmt::Debug for ResultAggregator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultAggregator")
            .field("result", &*self.lock())
            .field("has_reporter", &self.reporter.is_some())
            .finish()
    }
}
