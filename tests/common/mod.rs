//! Shared helpers for integration tests.
//!
//! Catalog clients are pointed at a [`wiremock::MockServer`] with a retry
//! policy whose delays are a few milliseconds, so retry paths run quickly.

#![allow(dead_code)]

use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::{json, Value};
use wiremock::MockServer;

use streamflix::anime::AnimeClient;
use streamflix::config::ProxyConfig;
use streamflix::http::RetryConfig;
use streamflix::playback::MediaElement;
use streamflix::storage::{MemoryStorage, Storage};
use streamflix::subtitles::SubtitleFetcher;
use streamflix::tmdb::TmdbClient;

/// Retry policy with millisecond delays and no jitter.
pub fn fast_retry(max_retries: u32) -> RetryConfig {
    RetryConfig {
        max_retries,
        base_delay_ms: 5,
        max_delay_ms: 20,
        jitter_factor: 0.0,
        ..RetryConfig::default()
    }
}

pub fn anime_client(server: &MockServer) -> AnimeClient {
    AnimeClient::new(server.uri()).with_retry(fast_retry(0))
}

pub fn tmdb_client(server: &MockServer) -> TmdbClient {
    TmdbClient::new("test-key", "en-US")
        .with_base_url(server.uri())
        .with_retry(fast_retry(0))
}

/// A relay config whose base URL is the mock server.
pub fn proxy_config(server: &MockServer) -> ProxyConfig {
    ProxyConfig {
        base_url: server.uri(),
        ..ProxyConfig::default()
    }
}

pub fn subtitle_fetcher(server: &MockServer) -> SubtitleFetcher {
    SubtitleFetcher::new(proxy_config(server)).with_retry(fast_retry(0))
}

pub fn memory_storage() -> Arc<dyn Storage> {
    Arc::new(MemoryStorage::new())
}

/// An anime listing in the backend's `data.response` envelope.
pub fn anime_listing(ids: &[&str]) -> Value {
    let response: Vec<Value> = ids
        .iter()
        .map(|id| json!({ "id": id, "title": id.replace('-', " "), "poster": "p.jpg" }))
        .collect();
    json!({ "success": true, "data": { "response": response, "pageInfo": { "currentPage": 1 } } })
}

pub const SAMPLE_SRT: &str = "1\n00:00:01,000 --> 00:00:02,000\nHello\n\n2\n00:00:03,000 --> 00:00:04,500\nWorld\n";

// ---------------------------------------------------------------------------
// Fake player
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct PlayerState {
    current_time: f64,
    duration: Option<f64>,
    paused: bool,
    seeks: Vec<f64>,
}

/// Scriptable [`MediaElement`].
#[derive(Debug, Default)]
pub struct FakePlayer {
    state: Mutex<PlayerState>,
}

impl FakePlayer {
    /// A player that is paused with no metadata loaded.
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(PlayerState {
                paused: true,
                ..PlayerState::default()
            }),
        })
    }

    pub fn load_metadata(&self, duration: f64) {
        self.state.lock().duration = Some(duration);
    }

    pub fn play(&self) {
        self.state.lock().paused = false;
    }

    pub fn pause(&self) {
        self.state.lock().paused = true;
    }

    pub fn set_time(&self, position: f64) {
        self.state.lock().current_time = position;
    }

    pub fn seeks(&self) -> Vec<f64> {
        self.state.lock().seeks.clone()
    }
}

impl MediaElement for FakePlayer {
    fn current_time(&self) -> f64 {
        self.state.lock().current_time
    }

    fn duration(&self) -> Option<f64> {
        self.state.lock().duration
    }

    fn is_paused(&self) -> bool {
        self.state.lock().paused
    }

    fn seek(&self, position: f64) {
        let mut state = self.state.lock();
        state.current_time = position;
        state.seeks.push(position);
    }
}
