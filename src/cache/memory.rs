//! In-memory cache-aside store with TTL and tag invalidation

use super::clock::Clock;
use super::tags::{CacheTag, TagLedger};
use crate::metrics;
use serde::Serialize;
use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Freshness policy of one cached operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachePolicy {
    pub ttl: Duration,
    pub tags: Vec<CacheTag>,
}

impl CachePolicy {
    pub fn new(ttl: Duration, tags: &[CacheTag]) -> Self {
        Self {
            ttl,
            tags: tags.to_vec(),
        }
    }
}

/// Hit/miss counters and current size of one cache
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

#[derive(Debug)]
struct Entry<V> {
    value: V,
    stored_at: Instant,
    generation: u64,
}

/// Cache keyed by request parameters
///
/// Reads return the stored value while it is younger than the policy TTL and
/// none of the policy tags has been invalidated since it was fetched. Failed
/// fetches are never stored. Concurrent misses on one key may each fetch; the
/// last write wins.
#[derive(Debug)]
pub struct TtlCache<K, V> {
    name: &'static str,
    policy: CachePolicy,
    entries: Mutex<HashMap<K, Entry<V>>>,
    ledger: Arc<TagLedger>,
    clock: Arc<dyn Clock>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone + std::fmt::Debug,
    V: Clone,
{
    pub fn new(
        name: &'static str,
        policy: CachePolicy,
        ledger: Arc<TagLedger>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            name,
            policy,
            entries: Mutex::new(HashMap::new()),
            ledger,
            clock,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn policy(&self) -> &CachePolicy {
        &self.policy
    }

    /// Fresh value for `key`, dropping it if expired or invalidated
    pub async fn get(&self, key: &K) -> Option<V> {
        let mut entries = self.entries.lock().await;
        let (stored_at, generation) = {
            let entry = entries.get(key)?;
            (entry.stored_at, entry.generation)
        };

        let age = self.clock.now().saturating_duration_since(stored_at);
        let expired = age >= self.policy.ttl;
        let invalidated = !expired
            && self
                .ledger
                .invalidated_since(&self.policy.tags, generation)
                .await;

        if expired || invalidated {
            tracing::trace!(cache = self.name, key = ?key, expired, invalidated, "Dropping stale entry");
            entries.remove(key);
            return None;
        }

        entries.get(key).map(|entry| entry.value.clone())
    }

    /// Store `value` for `key` as fetched at the current ledger generation
    pub async fn insert(&self, key: K, value: V) {
        let generation = self.ledger.generation().await;
        self.insert_at(key, value, generation).await;
    }

    /// Store an entry, sweeping every entry already past the TTL
    ///
    /// Keys are caller-controlled (cursors, post ids), so expired entries
    /// are not left waiting for a read of the same key.
    async fn insert_at(&self, key: K, value: V, generation: u64) {
        let now = self.clock.now();
        let ttl = self.policy.ttl;
        let mut entries = self.entries.lock().await;

        let before = entries.len();
        entries.retain(|_, entry| now.saturating_duration_since(entry.stored_at) < ttl);
        let swept = before - entries.len();
        if swept > 0 {
            tracing::trace!(cache = self.name, swept, "Swept expired entries");
        }

        entries.insert(
            key,
            Entry {
                value,
                stored_at: now,
                generation,
            },
        );
    }

    /// Cache-aside read: serve a fresh entry or run `fetch` and store its result
    ///
    /// The generation is taken before `fetch` runs, so an invalidation that
    /// lands while the fetch is in flight still marks the stored value stale.
    pub async fn get_or_try_insert_with<F, Fut, E>(&self, key: K, fetch: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(value) = self.get(&key).await {
            self.hits.fetch_add(1, Ordering::Relaxed);
            metrics::record_cache_operation(self.name, "hit");
            tracing::trace!(cache = self.name, key = ?key, "Cache hit");
            return Ok(value);
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        metrics::record_cache_operation(self.name, "miss");
        tracing::debug!(cache = self.name, key = ?key, "Cache miss");

        let generation = self.ledger.generation().await;
        let value = fetch().await?;
        self.insert_at(key, value.clone(), generation).await;
        Ok(value)
    }

    /// Number of stored entries, fresh or not yet swept
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn clear(&self) {
        self.entries.lock().await.clear();
    }

    pub async fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.len().await,
        }
    }
}
