//! Relay URLs for hosts that refuse direct access.

use crate::config::ProxyConfig;
use crate::http::urlencoded;

/// URL that fetches a subtitle file through the relay.
///
/// `blob:`, `data:` and local URLs are already reachable and are returned
/// unchanged.
pub fn proxied_subtitle_url(url: &str, config: &ProxyConfig) -> String {
    if url.starts_with("blob:") || url.starts_with("data:") {
        return url.to_string();
    }
    if url.contains("localhost") || url.contains("127.0.0.1") {
        return url.to_string();
    }
    format!(
        "{}/proxy?url={}&referer={}",
        config.base_url.trim_end_matches('/'),
        urlencoded(url),
        urlencoded(&config.subtitle_referer)
    )
}

/// URL that plays an HLS stream through the relay.
pub fn proxied_stream_url(url: &str, config: &ProxyConfig) -> String {
    format!(
        "{}/?url={}&referer={}",
        config.base_url.trim_end_matches('/'),
        urlencoded(url),
        urlencoded(&config.stream_referer)
    )
}
