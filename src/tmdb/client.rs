use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use governor::{Quota, RateLimiter};
use serde_json::{json, Value};
use streamflix_common::{MediaType, TimeWindow};
use tracing::debug;

use super::images::{image_url, DEFAULT_BACKDROP_SIZE, DEFAULT_POSTER_SIZE};
use super::media::{pick_trailer, WatchOptions};
use crate::cache::{request_key, RequestCache, DEFAULT_TTL};
use crate::catalog::{item_from_listing, CatalogProvider};
use crate::config::ApiConfig;
use crate::http::{
    build_client, fetch_json, retry_config, with_query, FetchError, FetchOptions, RetryConfig,
    DEFAULT_TIMEOUT,
};
use crate::watchlist::CatalogItem;

const TMDB_BASE_URL: &str = "https://api.themoviedb.org/3";
const TMDB_IMAGE_BASE_URL: &str = "https://image.tmdb.org/t/p";
const REQUESTS_PER_SECOND: u32 = 4;

type Limiter = RateLimiter<
    governor::state::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Movie and TV metadata client for the TMDB v3 API.
///
/// Requests are rate limited to 4 per second, retried per the retry policy
/// and cached. Responses are returned as JSON.
///
/// # Examples
///
/// ```no_run
/// use streamflix::tmdb::TmdbClient;
/// use streamflix_common::TimeWindow;
///
/// # async fn demo() -> Result<(), streamflix::http::FetchError> {
/// let tmdb = TmdbClient::new("your-api-key", "en-US");
/// let trending = tmdb.trending(TimeWindow::Week).await?;
/// # Ok(())
/// # }
/// ```
pub struct TmdbClient {
    http: reqwest::Client,
    base_url: String,
    image_base_url: String,
    api_key: String,
    language: String,
    cache: RequestCache<Value>,
    retry: Option<RetryConfig>,
    timeout: Duration,
    limiter: Arc<Limiter>,
}

impl TmdbClient {
    pub fn new(api_key: impl Into<String>, language: impl Into<String>) -> Self {
        let quota = Quota::per_second(NonZeroU32::new(REQUESTS_PER_SECOND).unwrap_or(NonZeroU32::MIN));
        Self {
            http: build_client(DEFAULT_TIMEOUT),
            base_url: TMDB_BASE_URL.to_string(),
            image_base_url: TMDB_IMAGE_BASE_URL.to_string(),
            api_key: api_key.into(),
            language: language.into(),
            cache: RequestCache::new(DEFAULT_TTL),
            retry: None,
            timeout: DEFAULT_TIMEOUT,
            limiter: Arc::new(RateLimiter::direct(quota)),
        }
    }

    pub fn from_config(config: &ApiConfig, cache: RequestCache<Value>) -> Self {
        let mut client = Self::new(config.tmdb_api_key.clone(), config.language.clone())
            .with_base_url(config.tmdb_base_url.clone())
            .with_cache(cache);
        client.image_base_url = config.tmdb_image_base_url.clone();
        client.timeout = config.request_timeout();
        client.http = build_client(client.timeout);
        client
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_cache(mut self, cache: RequestCache<Value>) -> Self {
        self.cache = cache;
        self
    }

    /// Use a fixed retry policy instead of the process-wide one.
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = Some(retry);
        self
    }

    pub fn is_available(&self) -> bool {
        !self.api_key.is_empty()
    }

    pub fn cache(&self) -> &RequestCache<Value> {
        &self.cache
    }

    // -----------------------------------------------------------------------
    // Listings
    // -----------------------------------------------------------------------

    /// Trending movies and TV shows.
    pub async fn trending(&self, window: TimeWindow) -> Result<Value, FetchError> {
        self.get(&format!("/trending/all/{window}"), &[]).await
    }

    pub async fn popular_movies(&self, page: u32) -> Result<Value, FetchError> {
        self.list("/movie/popular", page).await
    }

    pub async fn top_rated_movies(&self, page: u32) -> Result<Value, FetchError> {
        self.list("/movie/top_rated", page).await
    }

    pub async fn upcoming_movies(&self, page: u32) -> Result<Value, FetchError> {
        self.list("/movie/upcoming", page).await
    }

    pub async fn now_playing_movies(&self, page: u32) -> Result<Value, FetchError> {
        self.list("/movie/now_playing", page).await
    }

    pub async fn popular_tv(&self, page: u32) -> Result<Value, FetchError> {
        self.list("/tv/popular", page).await
    }

    pub async fn top_rated_tv(&self, page: u32) -> Result<Value, FetchError> {
        self.list("/tv/top_rated", page).await
    }

    pub async fn on_the_air_tv(&self, page: u32) -> Result<Value, FetchError> {
        self.list("/tv/on_the_air", page).await
    }

    // -----------------------------------------------------------------------
    // Details
    // -----------------------------------------------------------------------

    pub async fn details(&self, media: MediaType, id: u64) -> Result<Value, FetchError> {
        let segment = media_segment(media)?;
        self.get(&format!("/{segment}/{id}"), &[]).await
    }

    /// Cast and crew.
    pub async fn credits(&self, media: MediaType, id: u64) -> Result<Value, FetchError> {
        let segment = media_segment(media)?;
        self.get(&format!("/{segment}/{id}/credits"), &[]).await
    }

    pub async fn videos(&self, media: MediaType, id: u64) -> Result<Value, FetchError> {
        let segment = media_segment(media)?;
        self.get(&format!("/{segment}/{id}/videos"), &[]).await
    }

    /// The YouTube trailer (or teaser) for a title, if any.
    pub async fn trailer(&self, media: MediaType, id: u64) -> Result<Option<Value>, FetchError> {
        let videos = self.videos(media, id).await?;
        Ok(pick_trailer(&videos))
    }

    pub async fn recommendations(
        &self,
        media: MediaType,
        id: u64,
        page: u32,
    ) -> Result<Value, FetchError> {
        let segment = media_segment(media)?;
        self.list(&format!("/{segment}/{id}/recommendations"), page)
            .await
    }

    pub async fn watch_providers(&self, media: MediaType, id: u64) -> Result<Value, FetchError> {
        let segment = media_segment(media)?;
        self.get(&format!("/{segment}/{id}/watch/providers"), &[])
            .await
    }

    /// Watch providers summarized for the default region.
    pub async fn watch_options(&self, media: MediaType, id: u64) -> Result<WatchOptions, FetchError> {
        let response = self.watch_providers(media, id).await?;
        Ok(WatchOptions::from_response(&response))
    }

    // -----------------------------------------------------------------------
    // Search & discover
    // -----------------------------------------------------------------------

    /// Movies, TV shows and people matching `query`.
    ///
    /// A blank query returns an empty result without a request.
    pub async fn search_multi(&self, query: &str, page: u32) -> Result<Value, FetchError> {
        self.search_at("/search/multi", query, page).await
    }

    pub async fn search_movies(&self, query: &str, page: u32) -> Result<Value, FetchError> {
        self.search_at("/search/movie", query, page).await
    }

    /// Discover titles; `params` override the defaults (`page=1`,
    /// `sort_by=popularity.desc`, `include_adult=false`).
    pub async fn discover(
        &self,
        media: MediaType,
        params: &[(&str, &str)],
    ) -> Result<Value, FetchError> {
        let segment = media_segment(media)?;
        let mut merged: Vec<(&str, &str)> = [
            ("page", "1"),
            ("sort_by", "popularity.desc"),
            ("include_adult", "false"),
        ]
        .into_iter()
        .filter(|(name, _)| !params.iter().any(|(k, _)| k == name))
        .collect();
        merged.extend_from_slice(params);
        self.get(&format!("/discover/{segment}"), &merged).await
    }

    pub async fn genres(&self, media: MediaType) -> Result<Value, FetchError> {
        let segment = media_segment(media)?;
        self.get(&format!("/genre/{segment}/list"), &[]).await
    }

    // -----------------------------------------------------------------------
    // People
    // -----------------------------------------------------------------------

    pub async fn person(&self, id: u64) -> Result<Value, FetchError> {
        self.get(&format!("/person/{id}"), &[]).await
    }

    /// A person's movie or TV credits.
    pub async fn person_credits(&self, id: u64, media: MediaType) -> Result<Value, FetchError> {
        let segment = media_segment(media)?;
        self.get(&format!("/person/{id}/{segment}_credits"), &[])
            .await
    }

    // -----------------------------------------------------------------------
    // Images
    // -----------------------------------------------------------------------

    pub fn image_url(&self, path: Option<&str>, size: &str) -> String {
        image_url(&self.image_base_url, path, size)
    }

    pub fn poster_url(&self, path: Option<&str>) -> String {
        self.image_url(path, DEFAULT_POSTER_SIZE)
    }

    pub fn backdrop_url(&self, path: Option<&str>) -> String {
        self.image_url(path, DEFAULT_BACKDROP_SIZE)
    }

    // -----------------------------------------------------------------------
    // Plumbing
    // -----------------------------------------------------------------------

    async fn list(&self, path: &str, page: u32) -> Result<Value, FetchError> {
        let page = page.to_string();
        self.get(path, &[("page", page.as_str())]).await
    }

    async fn search_at(&self, path: &str, query: &str, page: u32) -> Result<Value, FetchError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(json!({ "results": [], "total_results": 0 }));
        }
        let page = page.to_string();
        self.get(
            path,
            &[
                ("query", query),
                ("page", page.as_str()),
                ("include_adult", "false"),
            ],
        )
        .await
    }

    /// Rate-limited, retried and cached GET.
    ///
    /// The cache key leaves out the API key; the rate limiter is only
    /// consulted for requests that actually go out.
    async fn get(&self, path: &str, params: &[(&str, &str)]) -> Result<Value, FetchError> {
        if !self.is_available() {
            return Err(FetchError::invalid_request("TMDB API key is not configured"));
        }

        let mut query: Vec<(&str, &str)> = vec![("language", self.language.as_str())];
        query.extend_from_slice(params);
        let public_url = with_query(&format!("{}{path}", self.base_url), &query);
        let key = request_key(&public_url, "GET", None);
        let url = with_query(&public_url, &[("api_key", self.api_key.as_str())]);

        let http = self.http.clone();
        let limiter = Arc::clone(&self.limiter);
        let retry = self.retry.clone().unwrap_or_else(retry_config);
        let options = FetchOptions::default().with_timeout(self.timeout);
        let ttl = self.cache.default_ttl();

        debug!(url = %public_url, "TMDB request");
        self.cache
            .get_or_create(&key, ttl, move |cancel| async move {
                limiter.until_ready().await;
                fetch_json(&http, &url, &options, &retry, &cancel).await
            })
            .await
    }
}

fn media_segment(media: MediaType) -> Result<&'static str, FetchError> {
    match media {
        MediaType::Movie | MediaType::Tv => Ok(media.as_str()),
        MediaType::Anime => Err(FetchError::invalid_request(
            "TMDB lookups take a movie or tv media type",
        )),
    }
}

fn listing_items(response: &Value) -> Vec<CatalogItem> {
    response
        .get("results")
        .and_then(Value::as_array)
        .map(|results| {
            results
                .iter()
                .filter_map(|v| item_from_listing(v, None))
                .collect()
        })
        .unwrap_or_default()
}

#[async_trait]
impl CatalogProvider for TmdbClient {
    fn name(&self) -> &'static str {
        "tmdb"
    }

    fn is_available(&self) -> bool {
        TmdbClient::is_available(self)
    }

    async fn search(&self, query: &str, page: u32) -> Result<Vec<CatalogItem>, FetchError> {
        let response = self.search_multi(query, page).await?;
        Ok(listing_items(&response))
    }

    async fn trending(&self) -> Result<Vec<CatalogItem>, FetchError> {
        let response = TmdbClient::trending(self, TimeWindow::Week).await?;
        Ok(listing_items(&response))
    }
}
