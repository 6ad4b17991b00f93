//! Frontier: visited set, pending queue and in-flight accounting
//!
//! All three pieces live behind one mutex. The enqueue decision (is this URL
//! new?) and the completion decision (is anything left pending or running?)
//! are each made under that single lock, so a worker that is about to enqueue
//! children can never be missed by a worker deciding the crawl is over.

use crate::url::{normalize_url, resolve_url, UrlFilter};
use std::collections::{HashSet, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;
use url::Url;

/// A URL waiting to be fetched, with its link depth from the seed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlTask {
    /// The normalized URL to fetch
    pub url: Url,

    /// Link hops from the seed; the seed itself is depth 1
    pub depth: u32,
}

#[derive(Debug, Default)]
struct FrontierState {
    visited: HashSet<String>,
    pending: VecDeque<CrawlTask>,
    in_flight: usize,
}

/// Shared traversal state for one crawl run
#[derive(Debug)]
pub struct Frontier {
    state: Mutex<FrontierState>,
    notify: Notify,
    max_depth: u32,
    filter: UrlFilter,
}

impl Frontier {
    /// Creates an empty frontier
    ///
    /// # Arguments
    ///
    /// * `max_depth` - Tasks deeper than this are never created
    /// * `filter` - Accept predicate for discovered (non-seed) URLs
    pub fn new(max_depth: u32, filter: UrlFilter) -> Self {
        Self {
            state: Mutex::new(FrontierState::default()),
            notify: Notify::new(),
            max_depth,
            filter,
        }
    }

    fn lock(&self) -> MutexGuard<'_, FrontierState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Enqueues the operator-supplied seed at depth 1
    ///
    /// The seed bypasses the accept filter but is still deduplicated.
    ///
    /// # Returns
    ///
    /// `true` if the seed was enqueued
    pub fn seed(&self, url: &Url) -> bool {
        match normalize_url(url.as_str()) {
            Ok(url) => self.insert(url, 1),
            Err(e) => {
                tracing::warn!("Seed URL {} rejected: {}", url, e);
                false
            }
        }
    }

    /// Enqueues a discovered link if it is new, shallow enough and accepted
    ///
    /// The reference is resolved against `base` and its fragment stripped
    /// before any check. Rejection reasons are, in order: unresolvable or
    /// non-http(s) URL, depth above the maximum, filter mismatch, already
    /// visited.
    ///
    /// # Returns
    ///
    /// `true` if this call created a task; a concurrent duplicate returns
    /// `false`
    pub fn try_enqueue(&self, href: &str, base: &Url, depth: u32) -> bool {
        if depth > self.max_depth {
            tracing::trace!("Skipping {} (depth {} > {})", href, depth, self.max_depth);
            return false;
        }

        let url = match resolve_url(href, base) {
            Ok(url) => url,
            Err(e) => {
                tracing::trace!("Skipping {}: {}", href, e);
                return false;
            }
        };

        if !self.filter.accepts(url.as_str()) {
            tracing::trace!("Skipping {} (filtered)", url);
            return false;
        }

        self.insert(url, depth)
    }

    /// Atomic test-and-set on the visited set plus queue append
    fn insert(&self, url: Url, depth: u32) -> bool {
        let accepted = {
            let mut state = self.lock();
            if state.visited.insert(url.as_str().to_string()) {
                state.pending.push_back(CrawlTask { url, depth });
                true
            } else {
                false
            }
        };

        if accepted {
            self.notify.notify_waiters();
        }

        accepted
    }

    /// Takes the next pending task without waiting
    ///
    /// A returned task counts as in flight until [`Frontier::complete`] is
    /// called. `None` only means nothing is pending right now; in-flight
    /// tasks may still enqueue more.
    pub fn dequeue(&self) -> Option<CrawlTask> {
        let mut state = self.lock();
        let task = state.pending.pop_front()?;
        state.in_flight += 1;
        Some(task)
    }

    /// Marks one dequeued task as finished
    pub fn complete(&self) {
        {
            let mut state = self.lock();
            state.in_flight = state.in_flight.saturating_sub(1);
        }
        self.notify.notify_waiters();
    }

    /// Waits for the next task
    ///
    /// Blocks while the queue is empty but other tasks are still in flight.
    ///
    /// # Returns
    ///
    /// * `Some(CrawlTask)` - A task, now counted as in flight
    /// * `None` - Nothing pending and nothing in flight, or `cancel` fired
    pub async fn next_task(&self, cancel: &CancellationToken) -> Option<CrawlTask> {
        loop {
            // Registered before the check so a wake-up between the check and
            // the await is not lost.
            let notified = self.notify.notified();

            {
                let mut state = self.lock();
                if let Some(task) = state.pending.pop_front() {
                    state.in_flight += 1;
                    return Some(task);
                }
                if state.in_flight == 0 {
                    drop(state);
                    self.notify.notify_waiters();
                    return None;
                }
            }

            tokio::select! {
                _ = notified => {}
                _ = cancel.cancelled() => return None,
            }
        }
    }

    /// Returns true when nothing is pending and nothing is in flight
    pub fn is_exhausted(&self) -> bool {
        let state = self.lock();
        state.pending.is_empty() && state.in_flight == 0
    }

    /// Number of distinct URLs ever enqueued
    pub fn visited_count(&self) -> usize {
        self.lock().visited.len()
    }

    /// Number of tasks waiting for a worker
    pub fn pending_count(&self) -> usize {
        self.lock().pending.len()
    }

    /// Number of tasks dequeued but not yet completed
    pub fn in_flight_count(&self) -> usize {
        self.lock().in_flight
    }
}
