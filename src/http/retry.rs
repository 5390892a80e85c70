//! Exponential backoff with jitter for outbound requests.
//!
//! Transient failures (the configured status codes, network errors and
//! timeouts) are retried up to `max_retries` times. The delay before retry
//! `n` (0-indexed) is `min(base * 2^n, max)` plus up to `jitter_factor` of
//! that value at random, so callers that failed together do not retry in
//! lockstep. Cancellation is never retried.

use std::future::Future;
use std::sync::LazyLock;
use std::time::Duration;

use parking_lot::RwLock;
use reqwest::{Client, Method, Response};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::FetchError;

/// Default per-attempt timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Retry policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Retries after the first attempt.
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    /// Fraction of the exponential delay added as random jitter, in `[0, 1]`.
    pub jitter_factor: f64,
    /// HTTP statuses treated as transient.
    pub retry_status_codes: Vec<u16>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 1,
            base_delay_ms: 1000,
            max_delay_ms: 10_000,
            jitter_factor: 0.3,
            retry_status_codes: vec![408, 429, 500, 502, 503, 504],
        }
    }
}

impl RetryConfig {
    /// A policy that never retries.
    pub fn no_retry() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }
}

static GLOBAL_RETRY_CONFIG: LazyLock<RwLock<RetryConfig>> =
    LazyLock::new(|| RwLock::new(RetryConfig::default()));

/// Snapshot of the process-wide retry policy.
pub fn retry_config() -> RetryConfig {
    GLOBAL_RETRY_CONFIG.read().clone()
}

/// Replace the process-wide retry policy.
pub fn set_retry_config(config: RetryConfig) {
    info!(
        max_retries = config.max_retries,
        base_delay_ms = config.base_delay_ms,
        max_delay_ms = config.max_delay_ms,
        "Retry configuration updated"
    );
    *GLOBAL_RETRY_CONFIG.write() = config;
}

/// Modify part of the process-wide retry policy in place.
pub fn update_retry_config(f: impl FnOnce(&mut RetryConfig)) {
    f(&mut GLOBAL_RETRY_CONFIG.write());
}

/// Delay to wait before retry number `attempt` (0-indexed).
pub fn backoff_delay(attempt: u32, config: &RetryConfig) -> Duration {
    backoff_delay_with(attempt, config, rand::random::<f64>())
}

/// `unit` is the random draw in `[0, 1)`.
fn backoff_delay_with(attempt: u32, config: &RetryConfig, unit: f64) -> Duration {
    let exponential = config
        .base_delay_ms
        .saturating_mul(2u64.saturating_pow(attempt))
        .min(config.max_delay_ms);
    let jitter = exponential as f64 * config.jitter_factor.clamp(0.0, 1.0) * unit;
    Duration::from_millis(exponential + jitter.floor() as u64)
}

/// Run `op` until it succeeds, fails permanently, or retries run out.
///
/// `op` receives the 0-indexed attempt number. Waits between attempts never
/// shrink: once jitter has pushed one delay up, the next is at least as long.
pub async fn retry_with_backoff<T, F, Fut>(
    config: &RetryConfig,
    cancel: &CancellationToken,
    mut op: F,
) -> Result<T, FetchError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, FetchError>>,
{
    let mut attempt = 0u32;
    let mut previous_delay = Duration::ZERO;

    loop {
        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(FetchError::Cancelled),
            r = op(attempt) => r,
        };

        let err = match result {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        if attempt >= config.max_retries || !err.is_transient(&config.retry_status_codes) {
            if attempt > 0 {
                warn!(attempts = attempt + 1, error = %err, "Request failed after retries");
            }
            return Err(err);
        }

        let delay = backoff_delay(attempt, config).max(previous_delay);
        previous_delay = delay;
        warn!(
            retry = attempt + 1,
            max_retries = config.max_retries,
            delay_ms = delay.as_millis() as u64,
            error = %err,
            "Transient failure, backing off"
        );

        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(FetchError::Cancelled),
            _ = tokio::time::sleep(delay) => {}
        }
        attempt += 1;
    }
}

/// Per-request options for [`fetch_with_retry`].
#[derive(Debug, Clone)]
pub struct FetchOptions {
    pub method: Method,
    pub headers: Vec<(String, String)>,
    pub body: Option<serde_json::Value>,
    /// Budget for each individual attempt.
    pub timeout: Duration,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            method: Method::GET,
            headers: Vec::new(),
            body: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl FetchOptions {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_json_body(mut self, body: serde_json::Value) -> Self {
        self.method = Method::POST;
        self.body = Some(body);
        self
    }
}

/// Send a request, retrying transient failures per `config`.
///
/// Any non-2xx status becomes [`FetchError::Status`]; only the configured
/// statuses are retried.
pub async fn fetch_with_retry(
    client: &Client,
    url: &str,
    options: &FetchOptions,
    config: &RetryConfig,
    cancel: &CancellationToken,
) -> Result<Response, FetchError> {
    let timeout = options.timeout;
    retry_with_backoff(config, cancel, |attempt| {
        let mut request = client
            .request(options.method.clone(), url)
            .timeout(timeout);
        for (name, value) in &options.headers {
            request = request.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &options.body {
            request = request.json(body);
        }

        async move {
            debug!(url, attempt, "Sending request");
            let response = request
                .send()
                .await
                .map_err(|e| FetchError::from_reqwest(e, timeout))?;
            let status = response.status();
            if !status.is_success() {
                return Err(FetchError::status(status.as_u16(), url));
            }
            Ok(response)
        }
    })
    .await
}

/// [`fetch_with_retry`] followed by JSON decoding of the body.
pub async fn fetch_json(
    client: &Client,
    url: &str,
    options: &FetchOptions,
    config: &RetryConfig,
    cancel: &CancellationToken,
) -> Result<serde_json::Value, FetchError> {
    let response = fetch_with_retry(client, url, options, config, cancel).await?;
    response
        .json::<serde_json::Value>()
        .await
        .map_err(|e| FetchError::Decode(e.to_string()))
}

/// [`fetch_with_retry`] followed by reading the body as text.
pub async fn fetch_text(
    client: &Client,
    url: &str,
    options: &FetchOptions,
    config: &RetryConfig,
    cancel: &CancellationToken,
) -> Result<String, FetchError> {
    let response = fetch_with_retry(client, url, options, config, cancel).await?;
    response
        .text()
        .await
        .map_err(|e| FetchError::from_reqwest(e, options.timeout))
}
