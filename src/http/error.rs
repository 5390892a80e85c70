//! Failure classification for outbound requests.

use std::time::Duration;

/// Why an outbound request failed.
///
/// `Clone` so a single failure can be handed to every caller sharing an
/// in-flight request.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FetchError {
    /// The server answered with a non-success status.
    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    /// Connection, DNS or TLS failure.
    #[error("network error: {0}")]
    Network(String),

    /// The attempt did not complete within its timeout.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// The body could not be read or decoded.
    #[error("invalid response body: {0}")]
    Decode(String),

    /// The request was cancelled by its caller.
    #[error("request cancelled")]
    Cancelled,

    /// The request could not be built (bad URL, bad input).
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl FetchError {
    pub fn status(status: u16, url: impl Into<String>) -> Self {
        Self::Status {
            status,
            url: url.into(),
        }
    }

    pub fn invalid_request<S: Into<String>>(msg: S) -> Self {
        Self::InvalidRequest(msg.into())
    }

    /// Cancellation is a no-op for callers, never an error to show.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// HTTP status, when the failure came from one.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether another attempt may succeed, given the statuses considered
    /// transient.
    pub fn is_transient(&self, retry_status_codes: &[u16]) -> bool {
        match self {
            Self::Status { status, .. } => retry_status_codes.contains(status),
            Self::Network(_) | Self::Timeout(_) => true,
            Self::Decode(_) | Self::Cancelled | Self::InvalidRequest(_) => false,
        }
    }

    /// Classify a transport error from reqwest.
    ///
    /// `timeout` is the per-attempt budget reported when reqwest signals a
    /// timeout.
    pub fn from_reqwest(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            Self::Timeout(timeout)
        } else if let Some(status) = err.status() {
            let url = err.url().map(|u| u.to_string()).unwrap_or_default();
            Self::status(status.as_u16(), url)
        } else if err.is_decode() {
            Self::Decode(err.to_string())
        } else if err.is_builder() {
            Self::InvalidRequest(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}

impl From<streamflix_common::Error> for FetchError {
    fn from(err: streamflix_common::Error) -> Self {
        Self::InvalidRequest(err.to_string())
    }
}
