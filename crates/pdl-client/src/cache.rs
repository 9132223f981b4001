//! Response cache keyed by request fingerprint.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use futures_util::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use tracing::debug;

use crate::config::CacheConfig;
use crate::error::PdlError;
use crate::operation::RawEnvelope;

type SharedFetch = Shared<BoxFuture<'static, Result<RawEnvelope, PdlError>>>;

#[derive(Debug)]
struct Entry {
    envelope: RawEnvelope,
    inserted_at: Instant,
    last_access: Instant,
}

#[derive(Default)]
struct CacheState {
    entries: HashMap<String, Entry>,
    in_flight: HashMap<String, SharedFetch>,
}

impl CacheState {
    fn lookup(
        &mut self,
        config: &CacheConfig,
        fingerprint: &str,
        now: Instant,
    ) -> Option<RawEnvelope> {
        let inserted_at = self.entries.get(fingerprint)?.inserted_at;
        if now.duration_since(inserted_at) >= config.entry_duration {
            self.entries.remove(fingerprint);
            return None;
        }
        let entry = self.entries.get_mut(fingerprint)?;
        entry.last_access = now;
        Some(entry.envelope.clone())
    }

    fn insert(&mut self, config: &CacheConfig, fingerprint: &str, envelope: RawEnvelope) {
        let now = Instant::now();
        if !self.entries.contains_key(fingerprint) && self.entries.len() >= config.max_entries {
            let ttl = config.entry_duration;
            self.entries
                .retain(|_, entry| now.duration_since(entry.inserted_at) < ttl);
        }
        while !self.entries.contains_key(fingerprint) && self.entries.len() >= config.max_entries {
            let Some(oldest) = self
                .entries
                .iter()
                .min_by_key(|(_, entry)| entry.last_access)
                .map(|(key, _)| key.clone())
            else {
                break;
            };
            self.entries.remove(&oldest);
        }
        self.entries.insert(
            fingerprint.to_string(),
            Entry {
                envelope,
                inserted_at: now,
                last_access: now,
            },
        );
    }

    /// Record the outcome of a finished fetch. Failures are never stored.
    fn complete(
        &mut self,
        config: &CacheConfig,
        fingerprint: &str,
        result: &Result<RawEnvelope, PdlError>,
    ) {
        self.in_flight.remove(fingerprint);
        if let Ok(envelope) = result {
            if config.cache_error_responses || !envelope.has_errors() {
                self.insert(config, fingerprint, envelope.clone());
            }
        }
    }
}

/// Cache hit and miss counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    /// Lookups answered from the cache.
    pub hits: u64,
    /// Lookups that went to the network.
    pub misses: u64,
}

/// Bounded, time-limited cache of raw response envelopes.
///
/// The lock only guards map updates and is never held across an await.
/// Concurrent misses for one fingerprint share a single fetch, and the fetch
/// records its own result, so a cancelled caller never loses it.
pub struct ResponseCache {
    config: CacheConfig,
    state: Arc<Mutex<CacheState>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl std::fmt::Debug for ResponseCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseCache")
            .field("config", &self.config)
            .field("entries", &self.len())
            .finish_non_exhaustive()
    }
}

impl ResponseCache {
    /// Create a cache.
    #[must_use]
    pub fn new(config: CacheConfig) -> Self {
        Self {
            config,
            state: Arc::new(Mutex::new(CacheState::default())),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Number of stored entries, expired ones included until purged.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    /// Returns `true` if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Hit and miss counters.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    /// Return the cached envelope for `fingerprint`, or run `compute` and store its result.
    ///
    /// Failures from `compute` are returned and never stored.
    pub async fn get_or_compute<F, Fut>(
        &self,
        fingerprint: &str,
        compute: F,
    ) -> Result<RawEnvelope, PdlError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<RawEnvelope, PdlError>> + Send + 'static,
    {
        if !self.config.is_enabled() {
            self.misses.fetch_add(1, Ordering::Relaxed);
            return compute().await;
        }

        let (fetch, joined) = {
            let mut state = self.state.lock();
            if let Some(envelope) = state.lookup(&self.config, fingerprint, Instant::now()) {
                self.hits.fetch_add(1, Ordering::Relaxed);
                debug!("PDL response served from cache");
                return Ok(envelope);
            }

            match state.in_flight.get(fingerprint) {
                Some(existing) if existing.peek().is_none() => (existing.clone(), true),
                _ => {
                    let fetch = self.start_fetch(fingerprint, compute());
                    state
                        .in_flight
                        .insert(fingerprint.to_string(), fetch.clone());
                    (fetch, false)
                }
            }
        };

        if joined {
            self.hits.fetch_add(1, Ordering::Relaxed);
            debug!("joining in-flight PDL request");
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
        }
        fetch.await
    }

    fn start_fetch<Fut>(&self, fingerprint: &str, fetch: Fut) -> SharedFetch
    where
        Fut: Future<Output = Result<RawEnvelope, PdlError>> + Send + 'static,
    {
        let state = Arc::clone(&self.state);
        let config = self.config;
        let fingerprint = fingerprint.to_string();
        async move {
            let result = fetch.await;
            state.lock().complete(&config, &fingerprint, &result);
            result
        }
        .boxed()
        .shared()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    use super::*;

    fn config(entry_duration: Duration, max_entries: usize) -> CacheConfig {
        CacheConfig {
            entry_duration,
            max_entries,
            cache_error_responses: true,
        }
    }

    fn envelope(body: &str) -> RawEnvelope {
        RawEnvelope::parse(body.as_bytes()).expect("envelope")
    }

    async fn fetch(
        cache: &ResponseCache,
        key: &str,
        calls: &Arc<AtomicUsize>,
        body: &'static str,
    ) -> Result<RawEnvelope, PdlError> {
        let calls = Arc::clone(calls);
        cache
            .get_or_compute(key, move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(envelope(body))
            })
            .await
    }

    #[tokio::test]
    async fn identical_fingerprints_hit_once() {
        let cache = ResponseCache::new(config(Duration::from_secs(60), 10));
        let calls = Arc::new(AtomicUsize::new(0));

        fetch(&cache, "a", &calls, r#"{"data":{}}"#).await.expect("first");
        fetch(&cache, "a", &calls, r#"{"data":{}}"#).await.expect("second");

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.stats(), CacheStats { hits: 1, misses: 1 });
    }

    #[tokio::test]
    async fn distinct_fingerprints_miss() {
        let cache = ResponseCache::new(config(Duration::from_secs(60), 10));
        let calls = Arc::new(AtomicUsize::new(0));

        fetch(&cache, "a", &calls, r#"{"data":{}}"#).await.expect("a");
        fetch(&cache, "b", &calls, r#"{"data":{}}"#).await.expect("b");

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.len(), 2);
    }

    #[tokio::test]
    async fn expired_entries_are_refetched() {
        let cache = ResponseCache::new(config(Duration::from_millis(20), 10));
        let calls = Arc::new(AtomicUsize::new(0));

        fetch(&cache, "a", &calls, r#"{"data":{}}"#).await.expect("first");
        tokio::time::sleep(Duration::from_millis(40)).await;
        fetch(&cache, "a", &calls, r#"{"data":{}}"#).await.expect("second");

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn zero_lifetime_disables_cache() {
        let cache = ResponseCache::new(config(Duration::ZERO, 1));
        let calls = Arc::new(AtomicUsize::new(0));

        fetch(&cache, "a", &calls, r#"{"data":{}}"#).await.expect("first");
        fetch(&cache, "a", &calls, r#"{"data":{}}"#).await.expect("second");

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn evicts_least_recently_used() {
        let cache = ResponseCache::new(config(Duration::from_secs(60), 2));
        let calls = Arc::new(AtomicUsize::new(0));

        fetch(&cache, "a", &calls, r#"{"data":{}}"#).await.expect("a");
        tokio::time::sleep(Duration::from_millis(2)).await;
        fetch(&cache, "b", &calls, r#"{"data":{}}"#).await.expect("b");
        tokio::time::sleep(Duration::from_millis(2)).await;
        fetch(&cache, "a", &calls, r#"{"data":{}}"#).await.expect("a hit");
        tokio::time::sleep(Duration::from_millis(2)).await;
        fetch(&cache, "c", &calls, r#"{"data":{}}"#).await.expect("c");
        assert_eq!(cache.len(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);

        fetch(&cache, "a", &calls, r#"{"data":{}}"#).await.expect("a still cached");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        fetch(&cache, "b", &calls, r#"{"data":{}}"#).await.expect("b evicted");
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn failures_are_not_stored() {
        let cache = ResponseCache::new(config(Duration::from_secs(60), 10));

        let err = cache
            .get_or_compute("a", || async {
                Err(PdlError::Timeout {
                    message: "slow".to_string(),
                })
            })
            .await
            .expect_err("timeout");
        assert!(matches!(err, PdlError::Timeout { .. }));
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn error_envelopes_follow_policy() {
        let body = r#"{"errors":[{"message":"Fant ikke person"}]}"#;
        let calls = Arc::new(AtomicUsize::new(0));

        let caching = ResponseCache::new(config(Duration::from_secs(60), 10));
        fetch(&caching, "a", &calls, body).await.expect("first");
        fetch(&caching, "a", &calls, body).await.expect("second");
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let skipping = ResponseCache::new(CacheConfig {
            cache_error_responses: false,
            ..config(Duration::from_secs(60), 10)
        });
        fetch(&skipping, "a", &calls, body).await.expect("first");
        fetch(&skipping, "a", &calls, body).await.expect("second");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(skipping.is_empty());
    }

    #[tokio::test]
    async fn concurrent_misses_share_one_fetch() {
        let cache = ResponseCache::new(config(Duration::from_secs(60), 10));
        let calls = Arc::new(AtomicUsize::new(0));

        let slow = |calls: Arc<AtomicUsize>| {
            move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(30)).await;
                Ok(envelope(r#"{"data":{}}"#))
            }
        };

        let (first, second) = tokio::join!(
            cache.get_or_compute("a", slow(Arc::clone(&calls))),
            cache.get_or_compute("a", slow(Arc::clone(&calls)))
        );
        first.expect("first");
        second.expect("second");

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len(), 1);
    }

    fn slow_fetch(
        calls: &Arc<AtomicUsize>,
        delay: Duration,
    ) -> impl FnOnce() -> BoxFuture<'static, Result<RawEnvelope, PdlError>> {
        let calls = Arc::clone(calls);
        move || {
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(delay).await;
                Ok(envelope(r#"{"data":{}}"#))
            }
            .boxed()
        }
    }

    #[tokio::test]
    async fn cancelled_caller_does_not_lose_the_fetch() {
        let cache = ResponseCache::new(config(Duration::from_secs(60), 10));
        let calls = Arc::new(AtomicUsize::new(0));

        let cancelled = tokio::time::timeout(
            Duration::from_millis(5),
            cache.get_or_compute("k", slow_fetch(&calls, Duration::from_millis(50))),
        )
        .await;
        assert!(cancelled.is_err());

        cache
            .get_or_compute("k", slow_fetch(&calls, Duration::from_millis(50)))
            .await
            .expect("joins the pending fetch");
        cache
            .get_or_compute("k", slow_fetch(&calls, Duration::from_millis(50)))
            .await
            .expect("cached");

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len(), 1);
        assert!(cache.state.lock().in_flight.is_empty());
    }

    #[tokio::test]
    async fn distinct_fingerprints_fetch_in_parallel() {
        let cache = ResponseCache::new(config(Duration::from_secs(60), 10));
        let calls = Arc::new(AtomicUsize::new(0));
        let delay = Duration::from_millis(100);

        let started = Instant::now();
        let (a, b) = tokio::join!(
            cache.get_or_compute("a", slow_fetch(&calls, delay)),
            cache.get_or_compute("b", slow_fetch(&calls, delay))
        );
        let elapsed = started.elapsed();
        a.expect("a");
        b.expect("b");

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(elapsed < delay * 2, "fetches ran one after another: {elapsed:?}");
    }
}
