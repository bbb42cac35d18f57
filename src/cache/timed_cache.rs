//! Time-based cache with per-entry TTL (Time To Live) support.
//!
//! This module provides a thread-safe cache whose entries expire after the
//! duration they were stored with. Expired entries are removed lazily, when a
//! read observes them.
//!
//! Timestamps come from `tokio::time::Instant`, so a paused test clock
//! (`tokio::time::pause`) drives expiry deterministically.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio::time::Instant;

/// A cache entry with its storage and expiry instants.
#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    stored_at: Instant,
    expires_at: Instant,
}

impl<V> CacheEntry<V> {
    fn is_expired(&self, now: Instant) -> bool {
        now > self.expires_at
    }
}

/// A thread-safe cache with time-based expiration.
///
/// Each entry carries its own expiry; `insert` uses the cache's default TTL and
/// `insert_with_ttl` overrides it. There is no size bound and no eviction other
/// than expiry. The cache can be cloned cheaply; clones share storage.
///
/// # Memory Efficiency with Arc
///
/// For large values, consider wrapping them in `Arc` to avoid cloning:
/// ```ignore
/// let cache = TimedCache::<String, Arc<TokenChartData>>::new(Duration::from_secs(180));
/// cache.insert("chart:moonset:7".to_string(), Arc::new(chart));
/// ```
#[derive(Clone)]
pub struct TimedCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    cache: Arc<RwLock<HashMap<K, CacheEntry<V>>>>,
    default_ttl: Duration,
}

impl<K, V> TimedCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Create a new TimedCache with the given default TTL.
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            cache: Arc::new(RwLock::new(HashMap::new())),
            default_ttl,
        }
    }

    /// Insert a value with the default TTL, replacing any existing entry.
    pub fn insert(&self, key: K, value: V) {
        self.insert_with_ttl(key, value, self.default_ttl);
    }

    /// Insert a value that expires `ttl` from now, replacing any existing entry.
    pub fn insert_with_ttl(&self, key: K, value: V, ttl: Duration) {
        let now = Instant::now();
        let entry = CacheEntry {
            value,
            stored_at: now,
            expires_at: now + ttl,
        };

        if let Ok(mut cache) = self.cache.write() {
            cache.insert(key, entry);
        }
    }

    /// Get a value from the cache if it exists and hasn't expired.
    ///
    /// An expired entry is removed as a side effect of the lookup.
    pub fn get(&self, key: &K) -> Option<V> {
        self.get_with_age(key).map(|(value, _)| value)
    }

    /// Like [`get`](Self::get), also returning how long ago the value was stored.
    pub fn get_with_age(&self, key: &K) -> Option<(V, Duration)> {
        let now = Instant::now();

        if let Ok(cache) = self.cache.read() {
            match cache.get(key) {
                Some(entry) if !entry.is_expired(now) => {
                    return Some((entry.value.clone(), now - entry.stored_at))
                }
                Some(_) => {}
                None => return None,
            }
        }

        // Expired: upgrade to a write lock and re-check before deleting, a
        // concurrent insert may have refreshed the entry in between.
        if let Ok(mut cache) = self.cache.write() {
            if cache.get(key).is_some_and(|entry| entry.is_expired(now)) {
                cache.remove(key);
            }
        }

        None
    }

    /// Check if a key exists in the cache and hasn't expired.
    pub fn contains_key(&self, key: &K) -> bool {
        self.get(key).is_some()
    }

    /// Remove a specific key from the cache.
    pub fn remove(&self, key: &K) {
        if let Ok(mut cache) = self.cache.write() {
            cache.remove(key);
        }
    }

    /// Remove every entry whose key matches `predicate`.
    pub fn remove_where<F>(&self, predicate: F)
    where
        F: Fn(&K) -> bool,
    {
        if let Ok(mut cache) = self.cache.write() {
            cache.retain(|key, _| !predicate(key));
        }
    }

    /// Clear all entries from the cache.
    pub fn clear(&self) {
        if let Ok(mut cache) = self.cache.write() {
            cache.clear();
        }
    }

    /// Remove all expired entries from the cache.
    ///
    /// Not required for correctness; `get()` never returns an expired value.
    pub fn cleanup_expired(&self) {
        let now = Instant::now();

        if let Ok(mut cache) = self.cache.write() {
            cache.retain(|_, entry| !entry.is_expired(now));
        }
    }

    /// Get the number of entries in the cache (including expired ones not yet observed).
    pub fn len(&self) -> usize {
        if let Ok(cache) = self.cache.read() {
            cache.len()
        } else {
            0
        }
    }

    /// Check if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get the default TTL for this cache.
    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }
}

impl<K, V> std::fmt::Debug for TimedCache<K, V>
where
    K: Eq + Hash + Clone + std::fmt::Debug,
    V: Clone + std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimedCache")
            .field("default_ttl", &self.default_ttl)
            .field("entries", &self.len())
            .finish()
    }
}
