use std::hash::Hash;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicUsize, Ordering};

use lru::LruCache;
use parking_lot::Mutex;

/// Bounded associative cache shared by the query hot paths.
///
/// All operations take the one internal mutex; there is no try-lock or
/// read-lock variant. On a hit the entry moves to the MRU end; inserting
/// over capacity evicts from the LRU end first.
pub struct SharedCache<K: Hash + Eq, V: Clone> {
    inner: Mutex<LruCache<K, V>>,
    hits: AtomicUsize,
    misses: AtomicUsize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: usize,
    pub misses: usize,
    pub size: usize,
    pub capacity: usize,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

impl<K: Hash + Eq, V: Clone> SharedCache<K, V> {
    /// `capacity` must be at least 1.
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).unwrap();
        SharedCache {
            inner: Mutex::new(LruCache::new(capacity)),
            hits: AtomicUsize::new(0),
            misses: AtomicUsize::new(0),
        }
    }

    pub fn get(&self, key: &K) -> Option<V> {
        let mut cache = self.inner.lock();
        match cache.get(key) {
            Some(value) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(value.clone())
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    pub fn put(&self, key: K, value: V) {
        self.inner.lock().put(key, value);
    }

    pub fn remove(&self, key: &K) -> Option<V> {
        self.inner.lock().pop(key)
    }

    pub fn clear(&self) {
        self.inner.lock().clear();
    }

    /// Membership probe without touching recency or the hit/miss counters.
    pub fn contains(&self, key: &K) -> bool {
        self.inner.lock().contains(key)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.inner.lock().cap().get()
    }

    /// Shrinking below the current size evicts from the LRU end until the
    /// count fits.
    pub fn set_capacity(&self, capacity: usize) {
        let capacity = NonZeroUsize::new(capacity.max(1)).unwrap();
        self.inner.lock().resize(capacity);
    }

    pub fn stats(&self) -> CacheStats {
        let cache = self.inner.lock();
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            size: cache.len(),
            capacity: cache.cap().get(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eviction_order() {
        let cache: SharedCache<&str, i32> = SharedCache::new(2);
        cache.put("a", 1);
        cache.put("b", 2);
        assert_eq!(cache.get(&"a"), Some(1)); // a becomes MRU
        cache.put("c", 3); // evicts b, the LRU end

        assert!(cache.contains(&"a"));
        assert!(cache.contains(&"c"));
        assert!(!cache.contains(&"b"));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn size_never_exceeds_capacity() {
        let cache: SharedCache<i32, i32> = SharedCache::new(3);
        for i in 0..10 {
            cache.put(i, i * i);
            assert!(cache.len() <= 3);
        }
    }

    #[test]
    fn hit_rate_zero_when_untouched() {
        let cache: SharedCache<i32, i32> = SharedCache::new(4);
        assert_eq!(cache.stats().hit_rate(), 0.0);

        cache.put(1, 1);
        cache.get(&1);
        cache.get(&2);
        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert!((stats.hit_rate() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn shrink_evicts_lru() {
        let cache: SharedCache<i32, i32> = SharedCache::new(4);
        for i in 0..4 {
            cache.put(i, i);
        }
        cache.get(&0); // 0 is now MRU
        cache.set_capacity(2);
        assert_eq!(cache.len(), 2);
        assert!(cache.contains(&0));
        assert!(cache.contains(&3));
    }

    #[test]
    fn remove_and_clear() {
        let cache: SharedCache<i32, i32> = SharedCache::new(4);
        cache.put(1, 10);
        assert_eq!(cache.remove(&1), Some(10));
        assert_eq!(cache.remove(&1), None);

        cache.put(2, 20);
        cache.clear();
        assert!(cache.is_empty());
    }
}
