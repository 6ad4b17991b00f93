//! Reporter trait and outcome types
//!
//! The aggregator notifies an optional [`Reporter`] every time it records an
//! outcome. Reporters only render; they never influence the crawl.

use url::Url;

/// Bucket a failed fetch is counted in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    /// Status 400–499
    ClientError,
    /// Status 500–599
    ServerError,
    /// Anything else: transport errors (status 0), 1xx, 2xx body errors, 3xx
    Other,
}

impl ErrorClass {
    /// Classifies a status code by numeric range
    ///
    /// # Examples
    ///
    /// ```
    /// use cache_warmer::output::ErrorClass;
    ///
    /// assert_eq!(ErrorClass::of(404), ErrorClass::ClientError);
    /// assert_eq!(ErrorClass::of(503), ErrorClass::ServerError);
    /// assert_eq!(ErrorClass::of(0), ErrorClass::Other);
    /// ```
    pub fn of(status_code: u16) -> Self {
        match status_code {
            400..=499 => ErrorClass::ClientError,
            500..=599 => ErrorClass::ServerError,
            _ => ErrorClass::Other,
        }
    }

    /// Single-character marker used in verbose progress output
    pub fn marker(&self) -> char {
        match self {
            ErrorClass::ClientError => '4',
            ErrorClass::ServerError => '5',
            ErrorClass::Other => 'e',
        }
    }
}

/// Failure counters by class
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ErrorCounts {
    pub client_errors: u64,
    pub server_errors: u64,
    pub other: u64,
}

impl ErrorCounts {
    /// Increments the counter for `class`
    pub fn increment(&mut self, class: ErrorClass) {
        match class {
            ErrorClass::ClientError => self.client_errors += 1,
            ErrorClass::ServerError => self.server_errors += 1,
            ErrorClass::Other => self.other += 1,
        }
    }

    /// Count for one class
    pub fn get(&self, class: ErrorClass) -> u64 {
        match class {
            ErrorClass::ClientError => self.client_errors,
            ErrorClass::ServerError => self.server_errors,
            ErrorClass::Other => self.other,
        }
    }

    /// Sum over all classes
    pub fn total(&self) -> u64 {
        self.client_errors + self.server_errors + self.other
    }
}

/// One failed fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureRecord {
    /// HTTP status code; 0 for transport errors
    pub status_code: u16,

    /// The URL that was requested
    pub url: Url,

    /// Human-readable cause
    pub cause: String,
}

impl FailureRecord {
    /// The class this failure is counted in
    pub fn class(&self) -> ErrorClass {
        ErrorClass::of(self.status_code)
    }
}

/// Observer notified synchronously as outcomes are recorded
///
/// Calls arrive from worker tasks, one at a time, in recording order.
pub trait Reporter: Send + Sync {
    /// A response was recorded; `total` is the cumulative success count
    fn on_success(&self, total: u64, url: &Url);

    /// A failure was recorded
    ///
    /// # Arguments
    ///
    /// * `counts` - Cumulative failure counts including this one
    /// * `successes` - Cumulative success count
    /// * `failure` - The failure just recorded
    fn on_failure(&self, counts: &ErrorCounts, successes: u64, failure: &FailureRecord);
}
