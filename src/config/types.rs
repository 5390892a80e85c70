use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::http::RetryConfig;

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub proxy: ProxyConfig,

    #[serde(default)]
    pub retry: RetryConfig,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub player: PlayerConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ApiConfig {
    /// Base URL of the anime catalog service, including the version segment
    #[serde(default = "default_anime_base_url")]
    pub anime_base_url: String,

    #[serde(default = "default_tmdb_base_url")]
    pub tmdb_base_url: String,

    #[serde(default = "default_tmdb_image_base_url")]
    pub tmdb_image_base_url: String,

    /// TMDB v3 API key; movie and TV lookups are disabled when empty
    #[serde(default)]
    pub tmdb_api_key: String,

    #[serde(default = "default_language")]
    pub language: String,

    /// Per-attempt timeout for catalog requests
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Per-attempt timeout for stream link lookups
    #[serde(default = "default_stream_timeout")]
    pub stream_timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            anime_base_url: default_anime_base_url(),
            tmdb_base_url: default_tmdb_base_url(),
            tmdb_image_base_url: default_tmdb_image_base_url(),
            tmdb_api_key: String::new(),
            language: default_language(),
            request_timeout_secs: default_request_timeout(),
            stream_timeout_secs: default_stream_timeout(),
        }
    }
}

impl ApiConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn stream_timeout(&self) -> Duration {
        Duration::from_secs(self.stream_timeout_secs)
    }
}

fn default_anime_base_url() -> String {
    "https://hianimeapi-6uju.onrender.com/api/v1".to_string()
}

fn default_tmdb_base_url() -> String {
    "https://api.themoviedb.org/3".to_string()
}

fn default_tmdb_image_base_url() -> String {
    "https://image.tmdb.org/t/p".to_string()
}

fn default_language() -> String {
    "en-US".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_stream_timeout() -> u64 {
    15
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ProxyConfig {
    /// Relay used when a subtitle or stream host refuses direct access
    #[serde(default = "default_proxy_base_url")]
    pub base_url: String,

    #[serde(default = "default_subtitle_referer")]
    pub subtitle_referer: String,

    #[serde(default = "default_stream_referer")]
    pub stream_referer: String,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            base_url: default_proxy_base_url(),
            subtitle_referer: default_subtitle_referer(),
            stream_referer: default_stream_referer(),
        }
    }
}

fn default_proxy_base_url() -> String {
    "https://rust-proxy-fy7g.onrender.com".to_string()
}

fn default_subtitle_referer() -> String {
    "https://hianime.to".to_string()
}

fn default_stream_referer() -> String {
    "https://megacloud.tv".to_string()
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CacheConfig {
    /// Default lifetime of a cached response
    #[serde(default = "default_ttl")]
    pub ttl_secs: u64,

    /// How often expired entries are swept out
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_ttl(),
            sweep_interval_secs: default_sweep_interval(),
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

fn default_ttl() -> u64 {
    300
}

fn default_sweep_interval() -> u64 {
    600
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct StorageConfig {
    /// JSON file holding progress, preferences and the watchlist
    #[serde(default = "default_storage_path")]
    pub path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: default_storage_path(),
        }
    }
}

impl StorageConfig {
    /// The storage path with a leading `~` expanded.
    pub fn resolved_path(&self) -> PathBuf {
        let raw = self.path.to_string_lossy();
        PathBuf::from(shellexpand::tilde(raw.as_ref()).as_ref())
    }
}

fn default_storage_path() -> PathBuf {
    PathBuf::from("~/.local/share/streamflix/storage.json")
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PlayerConfig {
    #[serde(default = "default_progress_interval")]
    pub progress_interval_secs: u64,

    /// Saved positions at or below this are not resumed
    #[serde(default = "default_resume_min_position")]
    pub resume_min_position_secs: u64,

    /// Saved positions older than this are not resumed
    #[serde(default = "default_resume_max_age")]
    pub resume_max_age_days: u64,

    /// Remaining time at which the next-episode countdown appears
    #[serde(default = "default_autoplay_threshold")]
    pub autoplay_threshold_secs: u64,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            progress_interval_secs: default_progress_interval(),
            resume_min_position_secs: default_resume_min_position(),
            resume_max_age_days: default_resume_max_age(),
            autoplay_threshold_secs: default_autoplay_threshold(),
        }
    }
}

impl PlayerConfig {
    pub fn progress_interval(&self) -> Duration {
        Duration::from_secs(self.progress_interval_secs)
    }

    pub fn autoplay_threshold(&self) -> Duration {
        Duration::from_secs(self.autoplay_threshold_secs)
    }

    pub fn resume_policy(&self) -> crate::playback::ResumePolicy {
        crate::playback::ResumePolicy {
            min_position: Duration::from_secs(self.resume_min_position_secs),
            max_age: Duration::from_secs(self.resume_max_age_days * 24 * 60 * 60),
        }
    }
}

fn default_progress_interval() -> u64 {
    5
}

fn default_resume_min_position() -> u64 {
    10
}

fn default_resume_max_age() -> u64 {
    30
}

fn default_autoplay_threshold() -> u64 {
    15
}
