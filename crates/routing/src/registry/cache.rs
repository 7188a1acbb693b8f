//! Key → route store consulted before any network call.
//!
//! A session-scoped memoization cache, not a bounded LRU: by default entries
//! live until `clear()`. An optional TTL turns stale entries into misses at
//! read time, and an optional capacity cap evicts in FIFO order.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use chrono::{Duration, Utc};
use tracing::debug;

use crate::geokey::GeoKey;
use crate::models::types::CacheEntry;

pub struct RouteCache {
    inner: Mutex<CacheInner>,
    ttl: Option<Duration>,
    capacity: Option<usize>,
}

#[derive(Default)]
struct CacheInner {
    entries: HashMap<GeoKey, CacheEntry>,
    // Insertion order of the keys currently present, oldest first.
    order: VecDeque<GeoKey>,
}

impl RouteCache {
    /// Unbounded cache whose entries are valid for the whole session.
    pub fn new() -> Self {
        Self::with_limits(None, None)
    }

    /// Cache with an optional time-to-live and an optional entry cap.
    ///
    /// Entries older than `ttl` are treated as misses and dropped on lookup.
    /// When `capacity` is reached, inserting a new key evicts the oldest one.
    pub fn with_limits(ttl: Option<Duration>, capacity: Option<usize>) -> Self {
        Self {
            inner: Mutex::new(CacheInner::default()),
            ttl,
            capacity,
        }
    }

    /// Look up a route. No side effects beyond dropping an expired entry.
    pub fn get(&self, key: &GeoKey) -> Option<CacheEntry> {
        let mut inner = self.inner.lock().unwrap();

        if let Some(ttl) = self.ttl {
            let expired = inner
                .entries
                .get(key)
                .is_some_and(|entry| Utc::now().signed_duration_since(entry.cached_at) > ttl);
            if expired {
                debug!(key = key.as_str(), "cached route expired");
                inner.entries.remove(key);
                inner.order.retain(|k| k != key);
                return None;
            }
        }

        inner.entries.get(key).cloned()
    }

    /// Store a route. Last writer wins; re-inserting an existing key keeps
    /// its original position in the eviction order.
    pub fn insert(&self, key: GeoKey, entry: CacheEntry) {
        let mut inner = self.inner.lock().unwrap();

        if inner.entries.insert(key.clone(), entry).is_none() {
            inner.order.push_back(key);
            if let Some(cap) = self.capacity {
                while inner.order.len() > cap {
                    if let Some(oldest) = inner.order.pop_front() {
                        debug!(key = oldest.as_str(), "evicting oldest cached route");
                        inner.entries.remove(&oldest);
                    }
                }
            }
        }
    }

    /// Drop every entry. Used between independent planning sessions and in
    /// test setup.
    pub fn clear(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.entries.clear();
        inner.order.clear();
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for RouteCache {
    fn default() -> Self {
        Self::new()
    }
}
