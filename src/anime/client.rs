use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use streamflix_common::{AnimeGenre, AudioType, AzLetter, BrowseCategory, MediaType};
use tracing::debug;

use super::extract::{extract_list, normalize_details, normalize_episodes, Episode};
use super::filter::FilterParams;
use crate::cache::{request_key, AbortRegistry, RequestCache, DEFAULT_TTL};
use crate::catalog::{item_from_listing, CatalogProvider};
use crate::config::ApiConfig;
use crate::http::{
    build_client, fetch_json, retry_config, urlencoded, with_query, FetchError, FetchOptions,
    RetryConfig, DEFAULT_TIMEOUT,
};
use crate::watchlist::CatalogItem;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

const SHORT_TTL: Duration = Duration::from_secs(2 * 60);
const STREAM_TTL: Duration = Duration::from_secs(60);
const LONG_TTL: Duration = Duration::from_secs(10 * 60);
const STREAM_TIMEOUT: Duration = Duration::from_secs(15);
const DEFAULT_SERVER: &str = "hd-1";

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Client for the anime catalog service.
///
/// Every call goes through a shared [`RequestCache`]: identical requests made
/// while one is running share its result, and successes are cached for an
/// endpoint-specific TTL. Genre, letter, producer and filter listings
/// supersede an earlier, different request for the same slot, so paging
/// quickly through one genre abandons the page no longer wanted.
///
/// # Examples
///
/// ```no_run
/// use streamflix::anime::AnimeClient;
/// use streamflix_common::BrowseCategory;
///
/// # async fn demo() -> Result<(), streamflix::http::FetchError> {
/// let client = AnimeClient::new("https://hianimeapi-6uju.onrender.com/api/v1");
/// let airing = client.browse(BrowseCategory::TopAiring, 1).await?;
/// println!("{} titles", airing.len());
/// # Ok(())
/// # }
/// ```
pub struct AnimeClient {
    http: Client,
    base_url: String,
    cache: RequestCache<Value>,
    retry: Option<RetryConfig>,
    request_timeout: Duration,
    stream_timeout: Duration,
    slots: AbortRegistry,
}

impl AnimeClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: build_client(DEFAULT_TIMEOUT),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            cache: RequestCache::new(DEFAULT_TTL),
            retry: None,
            request_timeout: DEFAULT_TIMEOUT,
            stream_timeout: STREAM_TIMEOUT,
            slots: AbortRegistry::new(),
        }
    }

    pub fn from_config(config: &ApiConfig, cache: RequestCache<Value>) -> Self {
        Self::new(config.anime_base_url.clone())
            .with_cache(cache)
            .with_timeouts(config.request_timeout(), config.stream_timeout())
    }

    /// Share a cache with other clients.
    pub fn with_cache(mut self, cache: RequestCache<Value>) -> Self {
        self.cache = cache;
        self
    }

    /// Use a fixed retry policy instead of the process-wide one.
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = Some(retry);
        self
    }

    pub fn with_timeouts(mut self, request: Duration, stream: Duration) -> Self {
        self.request_timeout = request;
        self.stream_timeout = stream;
        self.http = build_client(request.max(stream));
        self
    }

    pub fn cache(&self) -> &RequestCache<Value> {
        &self.cache
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Cancel every running request; waiting callers get neutral results.
    pub fn cancel_all(&self) {
        self.slots.abort_all();
        let cancelled = self.cache.cancel_all();
        debug!(cancelled, "Cancelled anime requests");
    }

    // -- Home & discovery ---------------------------------------------------

    pub async fn home(&self) -> Result<Value, FetchError> {
        or_neutral(self.get("/home", &[], DEFAULT_TTL).await, Value::Null)
    }

    pub async fn spotlight(&self) -> Result<Value, FetchError> {
        self.get("/spotlight", &[], DEFAULT_TTL).await
    }

    pub async fn top_ten(&self) -> Result<Value, FetchError> {
        self.get("/topten", &[], DEFAULT_TTL).await
    }

    pub async fn meta(&self) -> Result<Value, FetchError> {
        self.get("/meta", &[], DEFAULT_TTL).await
    }

    // -- Search -------------------------------------------------------------

    /// Search by keyword; the result list is extracted from whichever layout
    /// the service returned.
    pub async fn search(&self, keyword: &str, page: u32) -> Result<Vec<Value>, FetchError> {
        let page = page.to_string();
        let data = self
            .get("/search", &[("keyword", keyword), ("page", page.as_str())], SHORT_TTL)
            .await;
        or_neutral(data.map(|d| extract_list(&d)), Vec::new())
    }

    pub async fn suggestions(&self, keyword: &str) -> Result<Value, FetchError> {
        self.get("/suggestion", &[("keyword", keyword)], DEFAULT_TTL)
            .await
    }

    // -- Details ------------------------------------------------------------

    /// Normalized details for `id`, `None` when the request was cancelled.
    pub async fn details(&self, id: &str) -> Result<Option<Value>, FetchError> {
        let path = format!("/anime/{}", urlencoded(id));
        let data = self.get(&path, &[], DEFAULT_TTL).await;
        or_neutral(data.map(|d| Some(normalize_details(&d, id))), None)
    }

    pub async fn random(&self) -> Result<Value, FetchError> {
        self.get("/anime/random", &[], DEFAULT_TTL).await
    }

    // -- Episodes & streams -------------------------------------------------

    pub async fn episodes(&self, id: &str) -> Result<Vec<Episode>, FetchError> {
        let path = format!("/episodes/{}", urlencoded(id));
        let data = self.get(&path, &[], DEFAULT_TTL).await;
        or_neutral(data.map(|d| normalize_episodes(&d)), Vec::new())
    }

    /// Streaming servers for an episode id such as `frieren-18542?ep=107257`.
    pub async fn servers(&self, episode_id: &str) -> Result<Option<Value>, FetchError> {
        let path = format!("/servers/id={}", urlencoded(episode_id));
        let data = self.get(&path, &[], SHORT_TTL).await;
        or_neutral(data.map(Some), None)
    }

    /// Stream sources for an episode on `server` (default `hd-1`).
    pub async fn stream_link(
        &self,
        episode_id: &str,
        server: Option<&str>,
        audio: AudioType,
    ) -> Result<Option<Value>, FetchError> {
        let audio = audio.to_string();
        let params = [
            ("id", episode_id),
            ("type", audio.as_str()),
            ("server", server.unwrap_or(DEFAULT_SERVER)),
        ];
        let data = self
            .fetch("/stream", &params, STREAM_TTL, self.stream_timeout)
            .await;
        or_neutral(data.map(Some), None)
    }

    // -- Browse -------------------------------------------------------------

    pub async fn browse(
        &self,
        category: BrowseCategory,
        page: u32,
    ) -> Result<Vec<Value>, FetchError> {
        let path = format!("/{}", category.as_str());
        let data = self
            .get(&path, &[("page", page.to_string().as_str())], DEFAULT_TTL)
            .await;
        or_neutral(data.map(|d| extract_list(&d)), Vec::new())
    }

    /// Browse a genre given by slug or display name (`"Slice of Life"`).
    pub async fn browse_genre(&self, genre: &str, page: u32) -> Result<Vec<Value>, FetchError> {
        let genre = AnimeGenre::parse(genre)?;
        let path = format!("/genre/{}", genre.as_str());
        let slot = format!("genre:{}", genre.as_str());
        self.browse_slot(&slot, &path, &[("page", page.to_string().as_str())], DEFAULT_TTL)
            .await
    }

    pub async fn browse_letter(&self, letter: &str, page: u32) -> Result<Vec<Value>, FetchError> {
        let letter = AzLetter::parse(letter)?;
        let path = format!("/az-list/{letter}");
        let slot = format!("letter:{letter}");
        self.browse_slot(&slot, &path, &[("page", page.to_string().as_str())], DEFAULT_TTL)
            .await
    }

    pub async fn browse_producer(
        &self,
        producer_id: &str,
        page: u32,
    ) -> Result<Vec<Value>, FetchError> {
        let path = format!("/producer/{}", urlencoded(producer_id));
        let slot = format!("producer:{producer_id}");
        self.browse_slot(&slot, &path, &[("page", page.to_string().as_str())], DEFAULT_TTL)
            .await
    }

    pub async fn filter(&self, params: &FilterParams) -> Result<Vec<Value>, FetchError> {
        let pairs = params.query_pairs();
        let pairs: Vec<(&str, &str)> = pairs.iter().map(|(k, v)| (*k, v.as_str())).collect();
        self.browse_slot("filter", "/filter", &pairs, DEFAULT_TTL).await
    }

    // -- Schedule -----------------------------------------------------------

    /// Airing schedule for a `YYYY-MM-DD` date.
    pub async fn schedule(&self, date: &str) -> Result<Value, FetchError> {
        self.get("/schedule", &[("date", date)], DEFAULT_TTL).await
    }

    pub async fn next_episode(&self, anime_id: &str) -> Result<Value, FetchError> {
        let path = format!("/schedule/next/{}", urlencoded(anime_id));
        self.get(&path, &[], DEFAULT_TTL).await
    }

    // -- Characters ---------------------------------------------------------

    pub async fn characters(&self, anime_id: &str, page: u32) -> Result<Value, FetchError> {
        let path = format!("/characters/{}", urlencoded(anime_id));
        self.get(&path, &[("page", page.to_string().as_str())], LONG_TTL)
            .await
    }

    pub async fn character(&self, character_id: &str) -> Result<Value, FetchError> {
        let path = format!("/character/{}", urlencoded(character_id));
        self.get(&path, &[], LONG_TTL).await
    }

    pub async fn actor(&self, actor_id: &str) -> Result<Value, FetchError> {
        let path = format!("/actor/{}", urlencoded(actor_id));
        self.get(&path, &[], LONG_TTL).await
    }

    // -- Plumbing -----------------------------------------------------------

    fn retry_policy(&self) -> RetryConfig {
        self.retry.clone().unwrap_or_else(retry_config)
    }

    async fn get(
        &self,
        path: &str,
        params: &[(&str, &str)],
        ttl: Duration,
    ) -> Result<Value, FetchError> {
        self.fetch(path, params, ttl, self.request_timeout).await
    }

    async fn fetch(
        &self,
        path: &str,
        params: &[(&str, &str)],
        ttl: Duration,
        timeout: Duration,
    ) -> Result<Value, FetchError> {
        let url = with_query(&format!("{}{}", self.base_url, path), params);
        let key = request_key(&url, "GET", None);
        let http = self.http.clone();
        let retry = self.retry_policy();
        let options = FetchOptions::default().with_timeout(timeout);

        self.cache
            .get_or_create(&key, ttl, move |cancel| async move {
                fetch_json(&http, &url, &options, &retry, &cancel).await
            })
            .await
    }

    /// A browse request that is abandoned when a different request takes the
    /// same slot. Identical concurrent requests share the slot and the fetch.
    /// Abandoned and cancelled requests yield an empty list.
    async fn browse_slot(
        &self,
        slot: &str,
        path: &str,
        params: &[(&str, &str)],
        ttl: Duration,
    ) -> Result<Vec<Value>, FetchError> {
        let url = with_query(&format!("{}{}", self.base_url, path), params);
        let guard = self.slots.begin(slot, &url);
        let data = tokio::select! {
            biased;
            _ = guard.superseded() => {
                debug!(slot, path, "Browse request superseded");
                Err(FetchError::Cancelled)
            }
            data = self.get(path, params, ttl) => data,
        };
        or_neutral(data.map(|d| extract_list(&d)), Vec::new())
    }
}

/// Map cancellation to `neutral`; anything else passes through.
fn or_neutral<T>(result: Result<T, FetchError>, neutral: T) -> Result<T, FetchError> {
    match result {
        Err(e) if e.is_cancelled() => {
            debug!("Request cancelled, returning empty result");
            Ok(neutral)
        }
        other => other,
    }
}

#[async_trait]
impl CatalogProvider for AnimeClient {
    fn name(&self) -> &'static str {
        "anime"
    }

    fn is_available(&self) -> bool {
        !self.base_url.is_empty()
    }

    async fn search(&self, query: &str, page: u32) -> Result<Vec<CatalogItem>, FetchError> {
        let results = AnimeClient::search(self, query, page).await?;
        Ok(results
            .iter()
            .filter_map(|v| item_from_listing(v, Some(MediaType::Anime)))
            .collect())
    }

    async fn trending(&self) -> Result<Vec<CatalogItem>, FetchError> {
        let results = self.browse(BrowseCategory::TopAiring, 1).await?;
        Ok(results
            .iter()
            .filter_map(|v| item_from_listing(v, Some(MediaType::Anime)))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn neutral_only_for_cancellation() {
        assert_eq!(or_neutral(Err(FetchError::Cancelled), 0), Ok(0));
        assert_eq!(or_neutral(Ok(5), 0), Ok(5));
        assert_eq!(
            or_neutral::<u32>(Err(FetchError::Network("reset".into())), 0),
            Err(FetchError::Network("reset".into()))
        );
    }

    #[test]
    fn base_url_is_normalized() {
        let client = AnimeClient::new("http://localhost:4000/api/v1/");
        assert_eq!(client.base_url(), "http://localhost:4000/api/v1");
    }

    #[tokio::test]
    async fn invalid_genre_fails_before_any_request() {
        let client = AnimeClient::new("http://127.0.0.1:9");
        let err = client.browse_genre("cooking", 1).await.unwrap_err();
        assert!(matches!(err, FetchError::InvalidRequest(msg) if msg.contains("cooking")));
        assert_eq!(client.cache().stats().in_flight, 0);
    }
}
