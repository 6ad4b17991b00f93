//! Cache Warmer main entry point
//!
//! This is the command-line interface for the Cache Warmer site crawler.

use anyhow::Context;
use cache_warmer::config::{load_config, Config};
use cache_warmer::crawler::run_warmer;
use cache_warmer::output::{format_options, print_final_report, ReportMode, TerminalReporter};
use cache_warmer::preflight;
use clap::Parser;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Cache Warmer: crawls a site so an upstream cache sees every page
///
/// Starting from the initial URL, follows links (HTML anchors and sitemap
/// entries) that match the filter, up to the given depth, fetching each URL
/// exactly once.
#[derive(Parser, Debug)]
#[command(name = "cache-warmer")]
#[command(version)]
#[command(about = "A site-warming crawler", long_about = None)]
struct Cli {
    /// Optional TOML configuration file; flags override its values
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Starting point for the warmer
    #[arg(short = 'i', long = "initial-url", value_name = "URL")]
    initial_url: Option<String>,

    /// Only visit URLs matching this regular expression
    #[arg(short = 'f', long, value_name = "REGEX")]
    filter: Option<String>,

    /// How many steps of links to follow; 1 is just the initial URL
    #[arg(short = 'd', long, value_name = "N")]
    depth: Option<u32>,

    /// How many workers to use
    #[arg(short = 'w', long, value_name = "N")]
    workers: Option<usize>,

    /// Value for the User-Agent header
    #[arg(short = 'a', long = "agent", value_name = "AGENT")]
    agent: Option<String>,

    /// Value for the Cookie header
    #[arg(long, value_name = "COOKIE")]
    cookie: Option<String>,

    /// Request this URL first; the warmer will not start unless it answers 200
    #[arg(short = 'c', long = "curl", value_name = "URL")]
    curl: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long, value_name = "SECS")]
    timeout_secs: Option<u64>,

    /// Stop the crawl after this many seconds
    #[arg(long, value_name = "SECS")]
    max_duration_secs: Option<u64>,

    /// Print every URL as it is warmed; repeat for debug (-vv) and trace (-vvv) logs
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error logging
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

impl Cli {
    /// Applies command-line overrides on top of the file configuration
    fn apply(&self, config: &mut Config) {
        if let Some(url) = &self.initial_url {
            config.crawler.initial_url = url.clone();
        }
        if let Some(filter) = &self.filter {
            config.crawler.filter = filter.clone();
        }
        if let Some(depth) = self.depth {
            config.crawler.max_depth = depth;
        }
        if let Some(workers) = self.workers {
            config.crawler.workers = workers;
        }
        if let Some(agent) = &self.agent {
            config.http.user_agent = agent.clone();
        }
        if let Some(cookie) = &self.cookie {
            config.http.cookie = Some(cookie.clone());
        }
        if let Some(url) = &self.curl {
            config.preflight.url = Some(url.clone());
        }
        if let Some(secs) = self.timeout_secs {
            config.http.timeout_secs = secs;
        }
        if let Some(secs) = self.max_duration_secs {
            config.crawler.max_duration_secs = Some(secs);
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{:#}", e);
            eprintln!("Cache warmer halted: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    tracing::info!("cache warmer start");

    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            load_config(path)
                .with_context(|| format!("failed to load configuration {}", path.display()))?
        }
        None => Config::default(),
    };
    cli.apply(&mut config);

    let run_config = config
        .into_run_config()
        .context("invalid configuration")?;

    println!("{}", format_options(&run_config));

    if let Some(status) = preflight::run_if_configured(&run_config).await? {
        println!("-------- Preflight OK --------\nstatus: {}\n", status);
    }

    let mode = ReportMode::detect(cli.verbose > 0, std::io::stdout().is_terminal());
    if mode == ReportMode::Verbose {
        println!("'- <url>': response, '4': code 4xx, '5': code 5xx, 'e': other error");
    }
    let reporter = Arc::new(TerminalReporter::new(mode));

    let cancel = CancellationToken::new();
    let ctrl_c = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Interrupted, finishing with partial results");
                cancel.cancel();
            }
        })
    };

    let result = run_warmer(run_config, Some(reporter.clone()), cancel).await?;
    ctrl_c.abort();
    reporter.finish();

    print_final_report(&result);

    tracing::info!("cache warmer end");

    // Crawl failures are reported, not treated as a process failure.
    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
///
/// Logs go to stderr so stdout carries only the progress output and report.
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 | 1 => EnvFilter::new("cache_warmer=info,warn"),
            2 => EnvFilter::new("cache_warmer=debug,info"),
            _ => EnvFilter::new("cache_warmer=trace,debug"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}
