use std::fmt;
use std::time::Duration;

use reqwest::Client;
use streamflix_subtitle::{looks_like_html, SubtitleDocument};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::proxy::proxied_subtitle_url;
use crate::config::ProxyConfig;
use crate::http::{build_client, fetch_text, retry_config, FetchError, FetchOptions, RetryConfig};

/// Per-attempt timeout for subtitle downloads.
pub const SUBTITLE_TIMEOUT: Duration = Duration::from_secs(15);

const DIRECT_ACCEPT: &str = "*/*, text/plain, application/octet-stream";

/// Which strategy produced the subtitle text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchSource {
    Direct,
    Proxy,
}

impl fmt::Display for FetchSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Direct => write!(f, "direct"),
            Self::Proxy => write!(f, "proxy"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedText {
    pub text: String,
    pub source: FetchSource,
}

/// Downloads subtitle files, falling back to the relay when the host refuses
/// a direct request.
#[derive(Clone)]
pub struct SubtitleFetcher {
    http: Client,
    proxy: ProxyConfig,
    retry: Option<RetryConfig>,
    timeout: Duration,
}

impl SubtitleFetcher {
    pub fn new(proxy: ProxyConfig) -> Self {
        Self {
            http: build_client(SUBTITLE_TIMEOUT),
            proxy,
            retry: None,
            timeout: SUBTITLE_TIMEOUT,
        }
    }

    /// Use a fixed retry policy instead of the process-wide one.
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = Some(retry);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self.http = build_client(timeout);
        self
    }

    /// Fetch subtitle text, directly first and through the relay second.
    ///
    /// A body that is empty or looks like an HTML page counts as a failure.
    /// The error of the last attempted strategy is returned when both fail.
    pub async fn fetch_text(&self, url: &str) -> Result<FetchedText, FetchError> {
        self.fetch_text_with_cancel(url, &CancellationToken::new())
            .await
    }

    pub async fn fetch_text_with_cancel(
        &self,
        url: &str,
        cancel: &CancellationToken,
    ) -> Result<FetchedText, FetchError> {
        let retry = self.retry.clone().unwrap_or_else(retry_config);

        let direct = FetchOptions::default()
            .with_timeout(self.timeout)
            .with_header("Accept", DIRECT_ACCEPT);
        let direct_err = match self.attempt(url, &direct, &retry, cancel).await {
            Ok(text) => {
                debug!(url, "Direct subtitle fetch succeeded");
                return Ok(FetchedText {
                    text,
                    source: FetchSource::Direct,
                });
            }
            Err(e) if e.is_cancelled() => return Err(e),
            Err(e) => e,
        };

        let proxied = proxied_subtitle_url(url, &self.proxy);
        if proxied == url {
            warn!(url, error = %direct_err, "Subtitle fetch failed");
            return Err(direct_err);
        }
        info!(url, error = %direct_err, "Direct subtitle fetch failed, trying proxy");

        let relayed = FetchOptions::default()
            .with_timeout(self.timeout)
            .with_header("Accept", "*/*");
        match self.attempt(&proxied, &relayed, &retry, cancel).await {
            Ok(text) => {
                debug!(url, "Proxied subtitle fetch succeeded");
                Ok(FetchedText {
                    text,
                    source: FetchSource::Proxy,
                })
            }
            Err(e) => {
                warn!(url, error = %e, "Both subtitle fetch strategies failed");
                Err(e)
            }
        }
    }

    /// Fetch and convert a subtitle file.
    ///
    /// `None` means no subtitles are available from `url`; it is not an error
    /// for the player.
    pub async fn fetch_and_convert(&self, url: &str) -> Option<SubtitleDocument> {
        let fetched = self.fetch_text(url).await.ok()?;
        let document = streamflix_subtitle::parse(&fetched.text);
        if document.is_empty() {
            warn!(url, source = %fetched.source, "Subtitle file contained no cues");
        }
        Some(document)
    }

    async fn attempt(
        &self,
        url: &str,
        options: &FetchOptions,
        retry: &RetryConfig,
        cancel: &CancellationToken,
    ) -> Result<String, FetchError> {
        let text = fetch_text(&self.http, url, options, retry, cancel).await?;
        if text.trim().is_empty() {
            return Err(FetchError::Decode("empty subtitle body".into()));
        }
        if looks_like_html(&text) {
            return Err(FetchError::Decode("received an HTML page instead of subtitles".into()));
        }
        Ok(text)
    }
}
