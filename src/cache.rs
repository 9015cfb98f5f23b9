// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-process LRU cache with per-entry TTL.
//!
//! Keys are wallet addresses and are normalised to lowercase so that the
//! checksummed and lowercase spellings share an entry.

use std::num::NonZeroUsize;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use lru::LruCache;

struct CacheEntry<V> {
    value: V,
    inserted_at: Instant,
}

pub struct TtlCache<V> {
    cache: Mutex<LruCache<String, CacheEntry<V>>>,
    ttl: Duration,
}

impl<V: Clone> TtlCache<V> {
    /// Create a new cache with the given capacity and TTL.
    ///
    /// - `capacity`: Max number of addresses to keep.
    /// - `ttl`: Time-to-live for each entry.
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            cache: Mutex::new(LruCache::new(
                NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN),
            )),
            ttl,
        }
    }

    /// Returns `None` if not cached or expired.
    pub fn get(&self, key: &str) -> Option<V> {
        let key = key.to_lowercase();
        let mut cache = self.cache.lock().ok()?;
        if let Some(entry) = cache.get(&key) {
            if entry.inserted_at.elapsed() < self.ttl {
                return Some(entry.value.clone());
            }
            cache.pop(&key);
        }
        None
    }

    pub fn put(&self, key: &str, value: V) {
        let key = key.to_lowercase();
        if let Ok(mut cache) = self.cache.lock() {
            cache.put(
                key,
                CacheEntry {
                    value,
                    inserted_at: Instant::now(),
                },
            );
        }
    }

    pub fn len(&self) -> usize {
        self.cache.lock().map(|c| c.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_and_get_ignores_case() {
        let cache = TtlCache::new(10, Duration::from_secs(60));
        cache.put("0xABCDEF", 42u32);
        assert_eq!(cache.get("0xabcdef"), Some(42));
        assert_eq!(cache.get("0xAbCdEf"), Some(42));
    }

    #[test]
    fn expired_entries_are_dropped() {
        let cache = TtlCache::new(10, Duration::ZERO);
        cache.put("0xabc", "v".to_string());
        assert!(cache.get("0xabc").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn evicts_least_recently_used() {
        let cache = TtlCache::new(2, Duration::from_secs(60));
        cache.put("a", 1);
        cache.put("b", 2);
        assert_eq!(cache.get("a"), Some(1));
        cache.put("c", 3);
        assert!(cache.get("b").is_none());
        assert_eq!(cache.len(), 2);
    }
}
