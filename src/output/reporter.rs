//! Terminal rendering of crawl progress and the final report

use crate::config::RunConfig;
use crate::output::aggregator::AggregateResult;
use crate::output::traits::{ErrorCounts, FailureRecord, Reporter};
use std::io::{self, Write};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use tokio::sync::mpsc::{self, UnboundedSender};
use url::Url;

/// How incremental progress is shown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportMode {
    /// One line per response, one marker character per failure
    Verbose,
    /// A single tally line rewritten in place
    Progress,
    /// Nothing until the final report
    Silent,
}

impl ReportMode {
    /// Picks the mode from the verbose flag and whether stdout is a terminal
    ///
    /// ```
    /// use cache_warmer::output::ReportMode;
    ///
    /// assert_eq!(ReportMode::detect(true, false), ReportMode::Verbose);
    /// assert_eq!(ReportMode::detect(false, true), ReportMode::Progress);
    /// assert_eq!(ReportMode::detect(false, false), ReportMode::Silent);
    /// ```
    pub fn detect(verbose: bool, is_terminal: bool) -> Self {
        match (verbose, is_terminal) {
            (true, _) => ReportMode::Verbose,
            (false, true) => ReportMode::Progress,
            (false, false) => ReportMode::Silent,
        }
    }
}

/// [`Reporter`] that writes to a terminal (or any writer)
///
/// Callbacks run under the aggregator's lock, so they only format the line
/// and queue it. A dedicated thread does the writing; a stalled stdout grows
/// the queue instead of blocking the crawl workers. Call
/// [`TerminalReporter::finish`] before printing anything else to the same
/// output.
pub struct TerminalReporter {
    mode: ReportMode,
    state: Mutex<ReporterState>,
    writer: Mutex<Option<JoinHandle<()>>>,
}

struct ReporterState {
    lines: Option<UnboundedSender<String>>,
    // The success hook only carries the success total, so the progress line
    // reuses the last failure counts it was given.
    counts: ErrorCounts,
}

impl TerminalReporter {
    /// Creates a reporter writing to stdout
    pub fn new(mode: ReportMode) -> Self {
        Self::with_writer(mode, Box::new(io::stdout()))
    }

    /// Creates a reporter writing to `out`
    pub fn with_writer(mode: ReportMode, mut out: Box<dyn Write + Send>) -> Self {
        let (lines, mut queued) = mpsc::unbounded_channel::<String>();

        let writer = thread::spawn(move || {
            while let Some(text) = queued.blocking_recv() {
                // Progress output is best effort; a closed stdout must not stop the crawl.
                let _ = out.write_all(text.as_bytes()).and_then(|_| out.flush());
            }
        });

        Self {
            mode,
            state: Mutex::new(ReporterState {
                lines: Some(lines),
                counts: ErrorCounts::default(),
            }),
            writer: Mutex::new(Some(writer)),
        }
    }

    /// The configured mode
    pub fn mode(&self) -> ReportMode {
        self.mode
    }

    /// Writes out everything queued so far and stops the writer thread
    ///
    /// Later callbacks are dropped. Calling this more than once is harmless.
    pub fn finish(&self) {
        self.lock_state().lines.take();

        let writer = self
            .writer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(writer) = writer {
            if writer.join().is_err() {
                tracing::warn!("Progress writer thread panicked");
            }
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, ReporterState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for TerminalReporter {
    fn drop(&mut self) {
        self.finish();
    }
}

impl ReporterState {
    fn write(&self, text: String) {
        if let Some(lines) = &self.lines {
            // Only fails once the writer thread is gone.
            let _ = lines.send(text);
        }
    }
}

impl Reporter for TerminalReporter {
    fn on_success(&self, total: u64, url: &Url) {
        let state = self.lock_state();
        match self.mode {
            ReportMode::Verbose => state.write(format!("- {}\n", url)),
            ReportMode::Progress => state.write(format!("\r{}", format_tally(total, &state.counts))),
            ReportMode::Silent => {}
        }
    }

    fn on_failure(&self, counts: &ErrorCounts, successes: u64, failure: &FailureRecord) {
        let mut state = self.lock_state();
        state.counts = *counts;
        match self.mode {
            ReportMode::Verbose => state.write(failure.class().marker().to_string()),
            ReportMode::Progress => state.write(format!("\r{}", format_tally(successes, counts))),
            ReportMode::Silent => {}
        }
    }
}

/// Formats the one-line tally
///
/// ```
/// use cache_warmer::output::{format_tally, ErrorCounts};
///
/// let counts = ErrorCounts { client_errors: 2, server_errors: 1, other: 0 };
/// assert_eq!(format_tally(7, &counts), "responses: 7, 4xx: 2, 5xx: 1, other: 0");
/// ```
pub fn format_tally(successes: u64, counts: &ErrorCounts) -> String {
    format!(
        "responses: {}, 4xx: {}, 5xx: {}, other: {}",
        successes, counts.client_errors, counts.server_errors, counts.other
    )
}

/// Formats the final tally line for a finished run
pub fn format_summary(result: &AggregateResult) -> String {
    format_tally(result.success_count, &result.error_counts)
}

/// Formats every failure as `<status>: <url>, <cause>`, one per line
pub fn format_failures(result: &AggregateResult) -> String {
    let mut text = String::new();
    for failure in &result.errors {
        text.push_str(&format!(
            "{}: {}, {}\n",
            failure.status_code, failure.url, failure.cause
        ));
    }
    text
}

/// Formats the options banner printed before a run
pub fn format_options(config: &RunConfig) -> String {
    let preflight = config
        .preflight_url
        .as_ref()
        .map(Url::to_string)
        .unwrap_or_else(|| "[no preflight]".to_string());

    format!(
        "----- OPTIONS -----\n\
         Initial url: {}\n\
         Regex filter: {}\n\
         Max depth: {}\n\
         Workers: {}\n\
         User agent: {}\n\
         Preflight: {}\n",
        config.seed,
        config.filter,
        config.max_depth,
        config.parallelism,
        config.user_agent,
        preflight
    )
}

/// Formats the final report: tally line, then the failure listing if any
pub fn format_final_report(result: &AggregateResult) -> String {
    let mut report = format!("\n-------- {} --------\n", format_summary(result));

    if !result.errors.is_empty() {
        report.push_str(&format!(
            "\n-------- ERRORS: {} --------\n",
            result.errors.len()
        ));
        report.push_str(&format_failures(result));
    }

    report
}

/// Prints the final report to stdout
pub fn print_final_report(result: &AggregateResult) {
    print!("{}", format_final_report(result));
}
