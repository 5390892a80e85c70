//! Outbound HTTP plumbing shared by the catalog clients.

mod error;
mod retry;

pub use error::FetchError;
pub use retry::{
    backoff_delay, fetch_json, fetch_text, fetch_with_retry, retry_config, retry_with_backoff,
    set_retry_config, update_retry_config, FetchOptions, RetryConfig, DEFAULT_TIMEOUT,
};

use std::time::Duration;

use reqwest::Client;

const USER_AGENT: &str = concat!("streamflix/", env!("CARGO_PKG_VERSION"));

/// Build the HTTP client used by the catalog clients.
///
/// Per-attempt timeouts are set on each request; `timeout` here is an outer
/// bound for anything sent without one.
pub fn build_client(timeout: Duration) -> Client {
    Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
        .unwrap_or_else(|e| {
            tracing::warn!("Failed to build HTTP client with timeout, using default: {}", e);
            Client::new()
        })
}

/// Minimal percent-encoding for query parameter values.
pub fn urlencoded(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for b in s.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(b as char);
            }
            _ => {
                out.push('%');
                out.push(char::from(HEX[(b >> 4) as usize]));
                out.push(char::from(HEX[(b & 0x0f) as usize]));
            }
        }
    }
    out
}

const HEX: [u8; 16] = *b"0123456789ABCDEF";

/// Append `params` to `base` as a query string.
pub fn with_query(base: &str, params: &[(&str, &str)]) -> String {
    let mut url = base.to_string();
    for (i, (key, value)) in params.iter().enumerate() {
        url.push(if i == 0 && !base.contains('?') { '?' } else { '&' });
        url.push_str(key);
        url.push('=');
        url.push_str(&urlencoded(value));
    }
    url
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_encoding() {
        assert_eq!(urlencoded("hello world"), "hello%20world");
        assert_eq!(urlencoded("foo&bar"), "foo%26bar");
        assert_eq!(urlencoded("https://a.b/c?d=1"), "https%3A%2F%2Fa.b%2Fc%3Fd%3D1");
        assert_eq!(urlencoded("simple"), "simple");
    }

    #[test]
    fn query_building() {
        assert_eq!(with_query("http://x/search", &[]), "http://x/search");
        assert_eq!(
            with_query("http://x/search", &[("keyword", "one piece"), ("page", "2")]),
            "http://x/search?keyword=one%20piece&page=2"
        );
        assert_eq!(
            with_query("http://x/movie?api_key=k", &[("page", "1")]),
            "http://x/movie?api_key=k&page=1"
        );
    }
}
