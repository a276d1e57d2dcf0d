//! TTL- and capacity-bounded memoization.
//!
//! Writes are idempotent (the same key always maps to the same computed
//! value), so a plain mutex around a map is enough. When a write would exceed
//! capacity the whole map is dropped and the write starts a fresh generation.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub overflow_clears: u64,
}

pub struct TtlCache<V> {
    name: &'static str,
    ttl: Duration,
    capacity: usize,
    entries: Mutex<HashMap<String, (V, Instant)>>,
    hits: AtomicU64,
    misses: AtomicU64,
    overflow_clears: AtomicU64,
}

impl<V: Clone> TtlCache<V> {
    pub fn new(name: &'static str, ttl: Duration, capacity: usize) -> Self {
        Self {
            name,
            ttl,
            capacity: capacity.max(1),
            entries: Mutex::new(HashMap::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            overflow_clears: AtomicU64::new(0),
        }
    }

    pub fn get(&self, key: &str) -> Option<V> {
        self.get_at(key, Instant::now())
    }

    pub fn insert(&self, key: impl Into<String>, value: V) {
        self.insert_at(key.into(), value, Instant::now());
    }

    pub(crate) fn get_at(&self, key: &str, now: Instant) -> Option<V> {
        let mut entries = match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let found = match entries.get(key) {
            Some((value, inserted)) if now.duration_since(*inserted) < self.ttl => {
                Some(value.clone())
            }
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        };
        drop(entries);

        if found.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
        }
        found
    }

    pub(crate) fn insert_at(&self, key: String, value: V, now: Instant) {
        let mut entries = match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if entries.len() >= self.capacity && !entries.contains_key(&key) {
            warn!(
                cache = self.name,
                capacity = self.capacity,
                "Cache full, clearing all entries"
            );
            entries.clear();
            self.overflow_clears.fetch_add(1, Ordering::Relaxed);
        }
        entries.insert(key, (value, now));
    }

    /// Drop expired entries. Returns how many were removed.
    pub fn sweep_expired(&self) -> usize {
        self.sweep_expired_at(Instant::now())
    }

    pub(crate) fn sweep_expired_at(&self, now: Instant) -> usize {
        let mut entries = match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let before = entries.len();
        entries.retain(|_, (_, inserted)| now.duration_since(*inserted) < self.ttl);
        let removed = before - entries.len();
        if removed > 0 {
            debug!(cache = self.name, removed, "Swept expired cache entries");
        }
        removed
    }

    pub fn clear(&self) {
        let mut entries = match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        entries.clear();
    }

    pub fn len(&self) -> usize {
        match self.entries.lock() {
            Ok(guard) => guard.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            overflow_clears: self.overflow_clears.load(Ordering::Relaxed),
        }
    }

    pub fn reset_stats(&self) {
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
        self.overflow_clears.store(0, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache(ttl_secs: u64, capacity: usize) -> TtlCache<u32> {
        TtlCache::new("test", Duration::from_secs(ttl_secs), capacity)
    }

    #[test]
    fn test_hit_within_ttl() {
        let c = cache(60, 10);
        let now = Instant::now();
        c.insert_at("a".to_string(), 1, now);
        assert_eq!(c.get_at("a", now + Duration::from_secs(59)), Some(1));
        assert_eq!(c.stats().hits, 1);
    }

    #[test]
    fn test_expired_entry_never_returned() {
        let c = cache(60, 10);
        let now = Instant::now();
        c.insert_at("a".to_string(), 1, now);
        assert_eq!(c.get_at("a", now + Duration::from_secs(60)), None);
        assert!(c.is_empty());
        assert_eq!(c.stats().misses, 1);
    }

    #[test]
    fn test_overflow_clears_everything() {
        let c = cache(60, 3);
        let now = Instant::now();
        for (i, key) in ["a", "b", "c"].iter().enumerate() {
            c.insert_at(key.to_string(), i as u32, now);
        }
        assert_eq!(c.len(), 3);

        c.insert_at("d".to_string(), 9, now);
        assert_eq!(c.len(), 1);
        assert_eq!(c.get_at("a", now), None);
        assert_eq!(c.get_at("d", now), Some(9));
        assert_eq!(c.stats().overflow_clears, 1);
    }

    #[test]
    fn test_size_never_exceeds_capacity() {
        let c = cache(60, 4);
        for i in 0..50u32 {
            c.insert(format!("k{}", i), i);
            assert!(c.len() <= c.capacity());
        }
    }

    #[test]
    fn test_rewrite_existing_key_at_capacity_does_not_clear() {
        let c = cache(60, 2);
        c.insert("a", 1);
        c.insert("b", 2);
        c.insert("a", 3);
        assert_eq!(c.len(), 2);
        assert_eq!(c.get("a"), Some(3));
        assert_eq!(c.stats().overflow_clears, 0);
    }

    #[test]
    fn test_sweep_removes_only_expired() {
        let c = cache(10, 10);
        let now = Instant::now();
        c.insert_at("old".to_string(), 1, now);
        c.insert_at("new".to_string(), 2, now + Duration::from_secs(8));

        let removed = c.sweep_expired_at(now + Duration::from_secs(12));
        assert_eq!(removed, 1);
        assert_eq!(c.get_at("new", now + Duration::from_secs(12)), Some(2));
    }

    #[test]
    fn test_clear_and_reset_stats() {
        let c = cache(10, 10);
        c.insert("a", 1);
        let _ = c.get("a");
        c.clear();
        assert!(c.is_empty());
        c.reset_stats();
        assert_eq!(c.stats(), CacheStats::default());
    }
}
