//! In-memory time-to-live cache for asynchronously produced values.
//!
//! Entries live for the lifetime of the cache and are replaced wholesale on
//! refresh. Refreshes are single-flight per key: while one caller computes a
//! value, other callers for the same key wait for it instead of starting
//! their own computation.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

/// Freshness window used when none is given (1 hour).
pub const DEFAULT_TTL: Duration = Duration::from_secs(60 * 60);

/// A cached value and the instant it was computed.
#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    computed_at: Instant,
}

impl<V> CacheEntry<V> {
    fn is_fresh(&self, ttl: Duration, now: Instant) -> bool {
        now.saturating_duration_since(self.computed_at) < ttl
    }
}

type Slot<V> = Arc<Mutex<Option<CacheEntry<V>>>>;

/// Key/value cache whose entries expire after a freshness window.
#[derive(Debug)]
pub struct TtlCache<V> {
    slots: Mutex<HashMap<String, Slot<V>>>,
    default_ttl: Duration,
}

impl<V> Default for TtlCache<V> {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl<V> TtlCache<V> {
    /// Creates an empty cache with the given default freshness window.
    #[must_use]
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
            default_ttl,
        }
    }

    /// Returns the default freshness window.
    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }
}

impl<V: Clone> TtlCache<V> {
    /// Returns the cached value for `key`, computing it with `producer` if
    /// missing or older than the default freshness window.
    pub async fn get_or_compute<F, Fut>(&self, key: &str, producer: F) -> V
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = V>,
    {
        self.get_or_compute_with_ttl(key, self.default_ttl, producer)
            .await
    }

    /// Like [`get_or_compute`](Self::get_or_compute) with an explicit
    /// freshness window.
    pub async fn get_or_compute_with_ttl<F, Fut>(
        &self,
        key: &str,
        ttl: Duration,
        producer: F,
    ) -> V
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = V>,
    {
        let slot = self.slot(key).await;
        let mut entry = slot.lock().await;

        if let Some(cached) = entry.as_ref().filter(|e| e.is_fresh(ttl, Instant::now())) {
            debug!(key, "Cache hit");
            return cached.value.clone();
        }

        debug!(key, "Cache miss, computing value");
        let value = producer().await;
        *entry = Some(CacheEntry {
            value: value.clone(),
            computed_at: Instant::now(),
        });
        value
    }

    /// Like [`get_or_compute_with_ttl`](Self::get_or_compute_with_ttl) for
    /// fallible producers. Errors are returned to the caller and never
    /// stored, so a stale entry (if any) stays in place.
    ///
    /// # Errors
    ///
    /// Returns whatever error `producer` returns.
    pub async fn try_get_or_compute<F, Fut, E>(
        &self,
        key: &str,
        ttl: Duration,
        producer: F,
    ) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        let slot = self.slot(key).await;
        let mut entry = slot.lock().await;

        if let Some(cached) = entry.as_ref().filter(|e| e.is_fresh(ttl, Instant::now())) {
            debug!(key, "Cache hit");
            return Ok(cached.value.clone());
        }

        debug!(key, "Cache miss, computing value");
        let value = producer().await?;
        *entry = Some(CacheEntry {
            value: value.clone(),
            computed_at: Instant::now(),
        });
        Ok(value)
    }

    /// Returns when the value for `key` was last computed.
    pub async fn computed_at(&self, key: &str) -> Option<Instant> {
        let slot = self.slots.lock().await.get(key).cloned()?;
        let entry = slot.lock().await;
        entry.as_ref().map(|e| e.computed_at)
    }

    /// Returns the per-key slot, creating it if needed.
    async fn slot(&self, key: &str) -> Slot<V> {
        let mut slots = self.slots.lock().await;
        slots.entry(key.to_string()).or_default().clone()
    }
}
