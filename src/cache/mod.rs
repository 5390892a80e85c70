//! Keyed response cache with in-flight request sharing.
//!
//! [`RequestCache`] stores successful responses for a per-entry TTL and makes
//! sure at most one producer runs per key at any time: callers that ask for a
//! key while its request is still running wait on the same result instead of
//! issuing another one.
//!
//! Each producer runs on its own task and receives a [`CancellationToken`].
//! Every waiting caller holds an interest in the request; the token is only
//! cancelled when the last interested caller goes away (its future is
//! dropped) or when [`RequestCache::cancel`] is called for the key. Failures
//! are delivered to every waiter and never cached.

mod clock;
mod supersede;

pub use clock::{Clock, ManualClock, SystemClock};
pub use supersede::{AbortRegistry, SlotGuard};

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

use dashmap::DashMap;
use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::http::FetchError;

/// Default lifetime of a cached response.
pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

/// Default period of the background sweep.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(10 * 60);

type SharedResult<T> = Shared<BoxFuture<'static, Result<T, FetchError>>>;

/// Derive a cache key from the parts of a request that determine its result.
///
/// The layout is `{url}::{"method":M,"body":B}`; a missing body is `null`.
pub fn request_key(url: &str, method: &str, body: Option<&serde_json::Value>) -> String {
    let method = serde_json::Value::String(method.to_string());
    let body = body.map_or_else(|| "null".to_string(), |b| b.to_string());
    format!("{url}::{{\"method\":{method},\"body\":{body}}}")
}

struct Entry<T> {
    value: T,
    stored_at: Instant,
    ttl: Duration,
}

impl<T> Entry<T> {
    fn is_expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.stored_at) >= self.ttl
    }
}

struct InFlight<T> {
    id: u64,
    result: SharedResult<T>,
    token: CancellationToken,
    interest: usize,
}

struct Inner<T> {
    entries: DashMap<String, Entry<T>>,
    in_flight: Mutex<HashMap<String, InFlight<T>>>,
    clock: Arc<dyn Clock>,
    default_ttl: Duration,
    next_id: AtomicU64,
}

impl<T: Clone> Inner<T> {
    fn lookup(&self, key: &str) -> Option<T> {
        let now = self.clock.now();
        let expired = match self.entries.get(key) {
            Some(entry) if !entry.is_expired(now) => return Some(entry.value.clone()),
            Some(_) => true,
            None => false,
        };
        if expired {
            self.entries.remove_if(key, |_, entry| entry.is_expired(now));
        }
        None
    }

    fn store(&self, key: String, value: T, ttl: Duration) {
        let entry = Entry {
            value,
            stored_at: self.clock.now(),
            ttl,
        };
        self.entries.insert(key, entry);
    }

    /// Drop the in-flight record for `key` if it still belongs to request `id`.
    fn settle(&self, key: &str, id: u64) {
        let mut in_flight = self.in_flight.lock();
        if in_flight.get(key).is_some_and(|r| r.id == id) {
            in_flight.remove(key);
        }
    }

    fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let mut removed = 0;
        self.entries.retain(|_, entry| {
            let keep = !entry.is_expired(now);
            if !keep {
                removed += 1;
            }
            keep
        });
        removed
    }
}

/// One caller's claim on an in-flight request.
struct Interest<T> {
    inner: Arc<Inner<T>>,
    key: String,
    id: u64,
}

impl<T> Drop for Interest<T> {
    fn drop(&mut self) {
        let mut in_flight = self.inner.in_flight.lock();
        let last = match in_flight.get_mut(&self.key) {
            Some(record) if record.id == self.id => {
                record.interest -= 1;
                record.interest == 0
            }
            _ => false,
        };
        if last {
            if let Some(record) = in_flight.remove(&self.key) {
                debug!(key = %self.key, "Last waiter gone, cancelling request");
                record.token.cancel();
            }
        }
    }
}

enum Lookup<T> {
    Hit(T),
    Wait(SharedResult<T>, Interest<T>),
}

/// Snapshot of cache occupancy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStats {
    pub entries: usize,
    pub in_flight: usize,
    pub default_ttl: Duration,
}

/// Response cache with TTL expiry and in-flight deduplication.
///
/// Cloning is cheap and clones share state.
///
/// # Examples
///
/// ```no_run
/// use std::time::Duration;
/// use streamflix::cache::RequestCache;
///
/// # async fn demo() -> Result<(), streamflix::http::FetchError> {
/// let cache: RequestCache<String> = RequestCache::new(Duration::from_secs(300));
/// let value = cache
///     .get_or_create("home", Duration::from_secs(60), |_cancel| async {
///         Ok("payload".to_string())
///     })
///     .await?;
/// assert_eq!(value, "payload");
/// # Ok(())
/// # }
/// ```
pub struct RequestCache<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for RequestCache<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Default for RequestCache<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl<T> RequestCache<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Create a cache on the system clock.
    pub fn new(default_ttl: Duration) -> Self {
        Self::with_clock(default_ttl, Arc::new(SystemClock))
    }

    /// Create a cache on the given clock.
    pub fn with_clock(default_ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: Arc::new(Inner {
                entries: DashMap::new(),
                in_flight: Mutex::new(HashMap::new()),
                clock,
                default_ttl,
                next_id: AtomicU64::new(1),
            }),
        }
    }

    pub fn default_ttl(&self) -> Duration {
        self.inner.default_ttl
    }

    /// Cached value for `key`, if present and younger than its TTL.
    ///
    /// An expired entry is evicted.
    pub fn get(&self, key: &str) -> Option<T> {
        self.inner.lookup(key)
    }

    /// Store `value` under `key` with the default TTL.
    pub fn put(&self, key: impl Into<String>, value: T) {
        self.inner.store(key.into(), value, self.inner.default_ttl);
    }

    /// Store `value` under `key` with an explicit TTL.
    pub fn put_with_ttl(&self, key: impl Into<String>, value: T, ttl: Duration) {
        self.inner.store(key.into(), value, ttl);
    }

    pub fn remove(&self, key: &str) -> Option<T> {
        self.inner.entries.remove(key).map(|(_, entry)| entry.value)
    }

    /// Return the cached value for `key`, or the result of the request that
    /// produces it.
    ///
    /// A fresh cached value is returned without running anything. If a request
    /// for `key` is already running, this call waits for that request. Otherwise
    /// `producer` is started on a new task with a cancellation token; its
    /// success is cached for `ttl`.
    ///
    /// Dropping the returned future withdraws this caller's interest. The
    /// producer is cancelled once no caller is left waiting.
    pub async fn get_or_create<F, Fut>(
        &self,
        key: &str,
        ttl: Duration,
        producer: F,
    ) -> Result<T, FetchError>
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = Result<T, FetchError>> + Send + 'static,
    {
        match self.join_or_start(key, ttl, producer) {
            Lookup::Hit(value) => Ok(value),
            Lookup::Wait(result, interest) => {
                let result = result.await;
                drop(interest);
                result
            }
        }
    }

    fn join_or_start<F, Fut>(&self, key: &str, ttl: Duration, producer: F) -> Lookup<T>
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = Result<T, FetchError>> + Send + 'static,
    {
        if let Some(value) = self.inner.lookup(key) {
            debug!(key, "Cache hit");
            return Lookup::Hit(value);
        }

        let mut in_flight = self.inner.in_flight.lock();

        if let Some(record) = in_flight.get_mut(key) {
            record.interest += 1;
            debug!(key, waiters = record.interest, "Joining in-flight request");
            let interest = Interest {
                inner: Arc::clone(&self.inner),
                key: key.to_string(),
                id: record.id,
            };
            return Lookup::Wait(record.result.clone(), interest);
        }

        // The previous request may have settled between the lookup above and
        // taking the lock; it stores before it settles.
        if let Some(value) = self.inner.lookup(key) {
            debug!(key, "Cache hit");
            return Lookup::Hit(value);
        }

        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let token = CancellationToken::new();
        let result = self.spawn_request(key, id, ttl, token.clone(), producer(token.clone()));
        info!(key, "Starting request");

        in_flight.insert(
            key.to_string(),
            InFlight {
                id,
                result: result.clone(),
                token,
                interest: 1,
            },
        );

        let interest = Interest {
            inner: Arc::clone(&self.inner),
            key: key.to_string(),
            id,
        };
        Lookup::Wait(result, interest)
    }

    fn spawn_request<Fut>(
        &self,
        key: &str,
        id: u64,
        ttl: Duration,
        token: CancellationToken,
        request: Fut,
    ) -> SharedResult<T>
    where
        Fut: Future<Output = Result<T, FetchError>> + Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        let task_key = key.to_string();
        let handle: JoinHandle<Result<T, FetchError>> = tokio::spawn(async move {
            let result = tokio::select! {
                biased;
                _ = token.cancelled() => Err(FetchError::Cancelled),
                r = request => r,
            };
            match &result {
                Ok(value) => inner.store(task_key.clone(), value.clone(), ttl),
                Err(e) if e.is_cancelled() => debug!(key = %task_key, "Request cancelled"),
                Err(e) => warn!(key = %task_key, error = %e, "Request failed"),
            }
            inner.settle(&task_key, id);
            result
        });

        let inner = Arc::clone(&self.inner);
        let key = key.to_string();
        async move {
            match handle.await {
                Ok(result) => result,
                Err(e) => {
                    inner.settle(&key, id);
                    if e.is_cancelled() {
                        Err(FetchError::Cancelled)
                    } else {
                        Err(FetchError::Network(format!("request task failed: {e}")))
                    }
                }
            }
        }
        .boxed()
        .shared()
    }

    /// Number of callers currently waiting on the request for `key`.
    pub fn waiters(&self, key: &str) -> usize {
        self.inner
            .in_flight
            .lock()
            .get(key)
            .map_or(0, |record| record.interest)
    }

    /// Cancel the in-flight request for `key`; every waiter receives
    /// [`FetchError::Cancelled`]. Returns whether a request was running.
    pub fn cancel(&self, key: &str) -> bool {
        let record = self.inner.in_flight.lock().remove(key);
        match record {
            Some(record) => {
                record.token.cancel();
                info!(key, "Cancelled request");
                true
            }
            None => false,
        }
    }

    /// Cancel every in-flight request.
    pub fn cancel_all(&self) -> usize {
        let drained: Vec<_> = self.inner.in_flight.lock().drain().collect();
        for (key, record) in &drained {
            record.token.cancel();
            debug!(key = %key, "Cancelled request");
        }
        drained.len()
    }

    /// Drop every cached entry. In-flight requests are unaffected.
    pub fn clear(&self) {
        self.inner.entries.clear();
        info!("Cache cleared");
    }

    /// Evict expired entries, returning how many were removed.
    pub fn purge_expired(&self) -> usize {
        self.inner.purge_expired()
    }

    pub fn len(&self) -> usize {
        self.inner.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.inner.entries.len(),
            in_flight: self.inner.in_flight.lock().len(),
            default_ttl: self.inner.default_ttl,
        }
    }

    /// Start a task that evicts expired entries every `every`.
    ///
    /// The task stops when the returned handle is dropped or when every clone
    /// of the cache is gone.
    pub fn spawn_sweeper(&self, every: Duration) -> SweepHandle {
        let weak: Weak<Inner<T>> = Arc::downgrade(&self.inner);
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(inner) = weak.upgrade() else {
                    break;
                };
                let removed = inner.purge_expired();
                if removed > 0 {
                    debug!(removed, "Swept expired cache entries");
                }
            }
        });
        SweepHandle { handle }
    }
}

/// Owner of the periodic sweep task; dropping it stops the task.
#[derive(Debug)]
pub struct SweepHandle {
    handle: JoinHandle<()>,
}

impl SweepHandle {
    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }
}

impl Drop for SweepHandle {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    const TTL: Duration = Duration::from_secs(300);

    fn manual_cache() -> (RequestCache<u32>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        let cache = RequestCache::with_clock(TTL, clock.clone());
        (cache, clock)
    }

    #[test]
    fn request_key_layout() {
        assert_eq!(
            request_key("https://api/home", "GET", None),
            r#"https://api/home::{"method":"GET","body":null}"#
        );
        let body = serde_json::json!({"q": "naruto"});
        assert_eq!(
            request_key("https://api/search", "POST", Some(&body)),
            r#"https://api/search::{"method":"POST","body":{"q":"naruto"}}"#
        );
    }

    #[test]
    fn entry_visible_until_ttl_elapses() {
        let (cache, clock) = manual_cache();
        cache.put("a", 1);

        clock.advance(TTL - Duration::from_millis(1));
        assert_eq!(cache.get("a"), Some(1));

        clock.advance(Duration::from_millis(1));
        assert_eq!(cache.get("a"), None);
        assert!(cache.is_empty(), "expired entry is evicted on read");
    }

    #[test]
    fn put_overwrites_and_restarts_ttl() {
        let (cache, clock) = manual_cache();
        cache.put("a", 1);
        clock.advance(Duration::from_secs(200));
        cache.put("a", 2);
        clock.advance(Duration::from_secs(200));
        assert_eq!(cache.get("a"), Some(2));
    }

    #[test]
    fn per_entry_ttl() {
        let (cache, clock) = manual_cache();
        cache.put_with_ttl("short", 1, Duration::from_secs(60));
        cache.put("long", 2);
        clock.advance(Duration::from_secs(60));
        assert_eq!(cache.get("short"), None);
        assert_eq!(cache.get("long"), Some(2));
    }

    #[test]
    fn purge_removes_only_expired() {
        let (cache, clock) = manual_cache();
        cache.put("old", 1);
        clock.advance(Duration::from_secs(250));
        cache.put("new", 2);
        clock.advance(Duration::from_secs(60));

        assert_eq!(cache.purge_expired(), 1);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("new"), Some(2));
    }

    #[tokio::test]
    async fn concurrent_callers_share_one_producer() {
        let cache: RequestCache<u32> = RequestCache::new(TTL);
        let calls = Arc::new(AtomicUsize::new(0));

        let callers = (0..8).map(|_| {
            let cache = cache.clone();
            let calls = Arc::clone(&calls);
            async move {
                cache
                    .get_or_create("k", TTL, move |_| async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(20)).await;
                        Ok(7)
                    })
                    .await
            }
        });
        let results = futures::future::join_all(callers).await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(results.iter().all(|r| r == &Ok(7)));
        assert_eq!(cache.stats().in_flight, 0);
        assert_eq!(cache.get("k"), Some(7));
    }

    #[tokio::test]
    async fn failure_reaches_every_waiter_and_is_not_cached() {
        let cache: RequestCache<u32> = RequestCache::new(TTL);
        let calls = Arc::new(AtomicUsize::new(0));

        let callers = (0..3).map(|_| {
            let cache = cache.clone();
            let calls = Arc::clone(&calls);
            async move {
                cache
                    .get_or_create("k", TTL, move |_| async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(10)).await;
                        Err(FetchError::status(500, "http://upstream"))
                    })
                    .await
            }
        });
        let results = futures::future::join_all(callers).await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        for r in &results {
            assert_eq!(r.as_ref().unwrap_err().status_code(), Some(500));
        }
        assert_eq!(cache.get("k"), None);
        assert_eq!(cache.stats().in_flight, 0);

        let retry = cache.get_or_create("k", TTL, |_| async { Ok(1) }).await;
        assert_eq!(retry, Ok(1));
    }

    #[tokio::test]
    async fn fresh_entry_short_circuits_producer() {
        let cache: RequestCache<u32> = RequestCache::new(TTL);
        cache.put("k", 3);
        let value = cache.get_or_create("k", TTL, |_| async { Ok(99) }).await;
        assert_eq!(value, Ok(3));
        assert_eq!(cache.stats().in_flight, 0);
    }

    #[tokio::test]
    async fn cancel_reaches_all_waiters() {
        let cache: RequestCache<u32> = RequestCache::new(TTL);
        let first = tokio::spawn({
            let cache = cache.clone();
            async move {
                cache
                    .get_or_create("k", TTL, |token| async move {
                        token.cancelled().await;
                        Ok(1)
                    })
                    .await
            }
        });
        let second = tokio::spawn({
            let cache = cache.clone();
            async move { cache.get_or_create("k", TTL, |_| async { Ok(2) }).await }
        });

        while cache.waiters("k") < 2 {
            tokio::task::yield_now().await;
        }
        assert!(cache.cancel("k"));

        assert_eq!(first.await.unwrap(), Err(FetchError::Cancelled));
        assert_eq!(second.await.unwrap(), Err(FetchError::Cancelled));
        assert_eq!(cache.get("k"), None);
        assert!(!cache.cancel("k"));
    }

    #[tokio::test(start_paused = true)]
    async fn sweeper_evicts_on_interval_and_stops_on_drop() {
        let (cache, clock) = manual_cache();
        cache.put("a", 1);
        clock.advance(TTL);

        let sweeper = cache.spawn_sweeper(DEFAULT_SWEEP_INTERVAL);
        assert_eq!(cache.len(), 1);

        tokio::time::sleep(DEFAULT_SWEEP_INTERVAL + Duration::from_secs(1)).await;
        assert_eq!(cache.len(), 0);
        assert!(sweeper.is_running());

        drop(sweeper);
        cache.put("b", 2);
        clock.advance(TTL);
        tokio::time::sleep(DEFAULT_SWEEP_INTERVAL * 2).await;
        assert_eq!(cache.len(), 1, "no sweeps after the handle is dropped");
    }
}
