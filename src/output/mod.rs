//! Output module for aggregating and reporting crawl outcomes
//!
//! This module handles:
//! - Counting successes and classifying failures (4xx / 5xx / other)
//! - Keeping the failure log for the final report
//! - Rendering progress and the final report on the terminal

mod aggregator;
mod reporter;
mod traits;

pub use aggregator::{AggregateResult, ResultAggregator};
pub use reporter::{
    format_failures, format_final_report, format_options, format_summary, format_tally,
    print_final_report, ReportMode, TerminalReporter,
};
pub use traits::{ErrorClass, ErrorCounts, FailureRecord, Reporter};
