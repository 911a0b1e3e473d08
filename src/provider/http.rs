//! HTTP client construction and status mapping.

use std::time::Duration;

use crate::error::{AgentreeError, Result};

/// Build a client with the configured request timeout.
pub fn build_client(timeout_secs: u64) -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .pool_max_idle_per_host(10)
        .build()?)
}

/// Classify a transport failure; a client-side timeout becomes
/// [`AgentreeError::Timeout`] so it is retried like one.
pub fn transport_error(err: reqwest::Error, timeout_secs: u64) -> AgentreeError {
    if err.is_timeout() {
        AgentreeError::Timeout(timeout_secs.saturating_mul(1000))
    } else {
        AgentreeError::Network(err)
    }
}

/// Map a non-success HTTP status to a typed error.
pub fn status_to_error(status: u16, body: &str) -> AgentreeError {
    match status {
        401 | 403 => AgentreeError::Authentication(error_message(body)),
        429 => AgentreeError::RateLimited {
            retry_after_ms: extract_retry_after(body),
        },
        _ => AgentreeError::api(status, error_message(body)),
    }
}

/// Pull `error.message` out of a Google-style JSON error body, falling back
/// to the raw body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("message"))
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.to_string())
}

// Google reports retry hints as `error.details[].retryDelay` ("12s").
fn extract_retry_after(body: &str) -> Option<u64> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .get("error")?
        .get("details")?
        .as_array()?
        .iter()
        .find_map(|d| d.get("retryDelay").and_then(|r| r.as_str()))
        .and_then(|delay| delay.strip_suffix('s'))
        .and_then(|secs| secs.parse::<f64>().ok())
        .map(|secs| (secs * 1000.0) as u64)
}
