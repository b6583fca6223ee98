//! Bounded LRU cache for encoded chunks.
//!
//! Pre-tokenized chunks repeat heavily in natural text, and the merge loop is
//! the expensive part of encoding, so chunk → ids results are memoized. The
//! cache is keyed by the chunk's raw bytes (content equality, never identity)
//! and bounded: inserting at capacity evicts the least-recently-used entry.
//!
//! A `Mutex` serializes mutation so concurrent encode calls stay safe. Losing
//! a race only costs a redundant recompute of the same chunk; the inserted
//! value is identical either way.

use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::Mutex;

/// Default capacity, matching the reference p50k implementation.
pub const DEFAULT_CACHE_SIZE: usize = 4096;

/// Fixed-capacity chunk → token-ids cache.
pub struct ChunkCache {
    inner: Mutex<LruCache<Vec<u8>, Vec<u32>>>,
    capacity: usize,
}

impl ChunkCache {
    /// Create a cache holding at most `capacity` entries (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let cap = NonZeroUsize::new(capacity).expect("capacity clamped to >= 1");
        Self {
            inner: Mutex::new(LruCache::new(cap)),
            capacity,
        }
    }

    /// Look up a chunk, marking it most-recently-used on a hit.
    pub fn lookup(&self, key: &[u8]) -> Option<Vec<u32>> {
        match self.inner.lock() {
            Ok(mut cache) => cache.get(key).cloned(),
            Err(_) => None,
        }
    }

    /// Insert a computed result, evicting the least-recently-used entry when
    /// at capacity.
    pub fn insert(&self, key: Vec<u8>, value: Vec<u32>) {
        if let Ok(mut cache) = self.inner.lock() {
            cache.put(key, value);
        }
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.inner.lock().map(|c| c.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop all entries.
    pub fn clear(&self) {
        if let Ok(mut cache) = self.inner.lock() {
            cache.clear();
        }
    }

    /// Configured capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hit_returns_inserted_value() {
        let cache = ChunkCache::new(8);
        cache.insert(b"hello".to_vec(), vec![1, 2]);
        assert_eq!(cache.lookup(b"hello"), Some(vec![1, 2]));
        assert_eq!(cache.lookup(b"world"), None);
    }

    #[test]
    fn evicts_least_recently_used() {
        let cache = ChunkCache::new(2);
        cache.insert(b"a".to_vec(), vec![1]);
        cache.insert(b"b".to_vec(), vec![2]);
        // Touch "a" so "b" becomes the eviction candidate.
        assert!(cache.lookup(b"a").is_some());
        cache.insert(b"c".to_vec(), vec![3]);
        assert_eq!(cache.len(), 2);
        assert!(cache.lookup(b"a").is_some());
        assert!(cache.lookup(b"b").is_none());
        assert!(cache.lookup(b"c").is_some());
    }

    #[test]
    fn zero_capacity_clamps_to_one() {
        let cache = ChunkCache::new(0);
        assert_eq!(cache.capacity(), 1);
        cache.insert(b"a".to_vec(), vec![1]);
        cache.insert(b"b".to_vec(), vec![2]);
        assert_eq!(cache.len(), 1);
        assert!(cache.lookup(b"a").is_none());
        assert!(cache.lookup(b"b").is_some());
    }

    #[test]
    fn clear_empties_cache() {
        let cache = ChunkCache::new(4);
        cache.insert(b"a".to_vec(), vec![1]);
        cache.clear();
        assert!(cache.is_empty());
    }
}
