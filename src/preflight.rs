//! Pre-flight health check
//!
//! When a pre-flight URL is configured, the crawl only starts if a GET to it
//! answers exactly `200 OK`. Anything else (transport error, redirect left
//! unresolved, any other status) aborts the run before the first crawl
//! request is sent.

use crate::config::RunConfig;
use crate::crawler::build_http_client;
use crate::WarmerError;
use reqwest::StatusCode;
use url::Url;

/// Performs the pre-flight request
///
/// The request uses the same client settings (User-Agent, Cookie, timeouts)
/// as the crawl itself.
///
/// # Returns
///
/// * `Ok(StatusCode)` - The check passed (always `200 OK`)
/// * `Err(WarmerError::Preflight)` - The check failed; the run must not start
pub async fn check(config: &RunConfig, url: &Url) -> Result<StatusCode, WarmerError> {
    let client = build_http_client(config)?;

    tracing::info!("Pre-flight request to {}", url);

    let response = client
        .get(url.clone())
        .send()
        .await
        .map_err(|e| WarmerError::Preflight {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let status = response.status();
    if status != StatusCode::OK {
        return Err(WarmerError::Preflight {
            url: url.to_string(),
            reason: format!("response status was {}", status),
        });
    }

    tracing::info!("Pre-flight OK ({})", status);
    Ok(status)
}

/// Runs the pre-flight check if one is configured
///
/// # Returns
///
/// * `Ok(None)` - No pre-flight URL configured
/// * `Ok(Some(status))` - The check passed
/// * `Err(WarmerError::Preflight)` - The check failed
pub async fn run_if_configured(config: &RunConfig) -> Result<Option<StatusCode>, WarmerError> {
    match &config.preflight_url {
        Some(url) => check(config, url).await.map(Some),
        None => Ok(None),
    }
}
