//! In-memory response cache shared by all manager operations.
//!
//! Entries are keyed by `operation:canonical-json(request)` so equal requests
//! hit the same entry no matter which provider served them or in which
//! order the request's fields were serialized.

use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use log::{debug, warn};
use serde::Serialize;
use serde_json::{Map, Value};
use tokio::time::Instant;

use crate::errors::MarketDataError;
use crate::provider::Operation;

/// A cached value and its expiry.
#[derive(Clone)]
pub struct CacheEntry {
    data: Arc<dyn Any + Send + Sync>,
    expires_at: Instant,
}

impl CacheEntry {
    pub fn expires_at(&self) -> Instant {
        self.expires_at
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// Snapshot of cache occupancy and effectiveness.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub size: usize,
    /// Stored keys, sorted
    pub keys: Vec<String>,
    pub hits: u64,
    pub misses: u64,
}

#[derive(Default)]
struct CacheInner {
    entries: HashMap<String, CacheEntry>,
    hits: u64,
    misses: u64,
}

/// Thread-safe TTL cache holding values of any cloneable type.
pub struct ResponseCache {
    inner: Mutex<CacheInner>,
    ttl: Duration,
}

impl ResponseCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: Mutex::new(CacheInner::default()),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Lock the cache, recovering from poison if necessary.
    fn lock_inner(&self) -> MutexGuard<'_, CacheInner> {
        self.inner.lock().unwrap_or_else(|poisoned| {
            warn!("Response cache mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Returns a clone of the value stored under `key` if it hasn't expired.
    ///
    /// Expired entries are evicted on access. A stored value of a different
    /// type counts as a miss.
    pub fn get<T>(&self, key: &str) -> Option<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        let now = Instant::now();
        let mut inner = self.lock_inner();

        let value = match inner.entries.get(key) {
            Some(entry) if entry.is_expired(now) => {
                debug!("Cache entry '{}' expired", key);
                inner.entries.remove(key);
                None
            }
            Some(entry) => entry.data.downcast_ref::<T>().cloned(),
            None => None,
        };

        if value.is_some() {
            inner.hits += 1;
        } else {
            inner.misses += 1;
        }
        value
    }

    /// Store `value` under `key`, expiring one TTL from now.
    pub fn put<T>(&self, key: String, value: T)
    where
        T: Send + Sync + 'static,
    {
        let entry = CacheEntry {
            data: Arc::new(value),
            expires_at: Instant::now() + self.ttl,
        };
        self.lock_inner().entries.insert(key, entry);
    }

    pub fn len(&self) -> usize {
        self.lock_inner().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every entry. Hit and miss counters are kept.
    pub fn clear(&self) {
        self.lock_inner().entries.clear();
    }

    /// Drop expired entries and return how many were removed.
    pub fn clear_expired(&self) -> usize {
        let now = Instant::now();
        let mut inner = self.lock_inner();
        let before = inner.entries.len();
        inner.entries.retain(|_, entry| !entry.is_expired(now));
        before - inner.entries.len()
    }

    pub fn stats(&self) -> CacheStats {
        let inner = self.lock_inner();
        let mut keys: Vec<String> = inner.entries.keys().cloned().collect();
        keys.sort();
        CacheStats {
            size: keys.len(),
            keys,
            hits: inner.hits,
            misses: inner.misses,
        }
    }
}

/// Cache key for `request` under `operation`.
///
/// The request is serialized to JSON with object keys sorted at every level,
/// so two requests that are equal by value always produce the same key.
pub fn cache_key<R: Serialize + ?Sized>(
    operation: Operation,
    request: &R,
) -> Result<String, MarketDataError> {
    let value = serde_json::to_value(request).map_err(|e| {
        MarketDataError::InvalidRequest(format!("request is not serializable: {}", e))
    })?;
    Ok(format!("{}:{}", operation.as_str(), canonicalize(value)))
}

/// Rebuilds every object with its keys sorted.
///
/// Without serde_json's `preserve_order` feature `Map` is already sorted and
/// this is a no-op. Any crate in the graph can switch that feature on, in
/// which case `Map` keeps insertion order and the keys would diverge.
fn canonicalize(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            let mut sorted = Map::new();
            for (key, value) in entries {
                sorted.insert(key, canonicalize(value));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(canonicalize).collect()),
        other => other,
    }
}
