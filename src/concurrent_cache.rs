//! The [ConcurrentCache] puts a [SizedLru] of [ByteView]s behind a mutex so that many threads can share it.
//!
//! Every `add` and `get` takes the one lock for its whole duration, so calls against the same cache happen in a single
//! total order.  The engine itself is only built on the first `add`; a cache which is declared and never written to
//! allocates nothing.
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::debug;

use crate::*;

#[derive(Debug)]
pub struct ConcurrentCache {
    max_bytes: u64,
    lru: Mutex<Option<SizedLru<ByteView>>>,
}

impl ConcurrentCache {
    pub fn new(max_bytes: u64) -> ConcurrentCache {
        ConcurrentCache {
            max_bytes,
            lru: Mutex::new(None),
        }
    }

    pub fn from_config(config: CacheConfig) -> ConcurrentCache {
        Self::new(config.max_bytes)
    }

    fn lock(&self) -> MutexGuard<'_, Option<SizedLru<ByteView>>> {
        // The engine finishes its bookkeeping before it calls out to anything which could panic, so a poisoned lock
        // still guards a consistent engine.
        self.lru.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add or replace an entry, evicting older entries if this takes the cache over budget.
    pub fn add(&self, key: &str, value: ByteView) {
        let mut guard = self.lock();
        let max_bytes = self.max_bytes;
        let lru = guard.get_or_insert_with(|| {
            debug!(max_bytes, "building cache engine on first add");
            SizedLru::new(max_bytes)
        });
        lru.add(key, value);
    }

    /// Find an entry, marking it as recently used.
    ///
    /// The returned view shares the cached buffer but can't modify it.
    pub fn get(&self, key: &str) -> Option<ByteView> {
        let mut guard = self.lock();
        guard.as_mut()?.get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().as_ref().map_or(0, SizedLru::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Bytes currently charged to live entries.
    pub fn bytes(&self) -> u64 {
        self.lock().as_ref().map_or(0, SizedLru::bytes)
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use super::*;

    fn build_cache(max_bytes: u64) -> ConcurrentCache {
        let cfg = CacheConfig::builder()
            .max_bytes(max_bytes)
            .finish()
            .expect("Should build");
        ConcurrentCache::from_config(cfg)
    }

    #[test]
    fn basic_ops() {
        let cache = build_cache(100);
        assert!(cache.get("a").is_none());
        // Reads alone never build the engine.
        assert!(cache.lru.lock().unwrap().is_none());

        cache.add("a", "abc".into());
        cache.add("b", "def".into());
        assert!(cache.lru.lock().unwrap().is_some());

        assert_eq!(cache.get("a").unwrap().as_str().unwrap(), "abc");
        assert_eq!(cache.get("b").unwrap().to_string(), "def");
        assert!(cache.get("").is_none());
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.bytes(), 8);
    }

    #[test]
    fn test_returned_bytes_are_independent() {
        let cache = build_cache(0);
        cache.add("k", ByteView::from(vec![1u8, 2, 3]));

        let mut copy = cache.get("k").unwrap().byte_slice();
        copy[0] = 9;
        assert_eq!(cache.get("k").unwrap().as_bytes(), &[1, 2, 3]);
    }

    #[test]
    fn test_evicts_least_recently_used() {
        let cache = build_cache(12);
        cache.add("a", "1111".into());
        cache.add("b", "2222".into());
        cache.get("a");
        cache.add("c", "3333".into());

        assert!(cache.get("b").is_none());
        assert!(cache.get("a").is_some());
        assert!(cache.get("c").is_some());
        assert_eq!(cache.bytes(), 10);
    }

    #[test]
    fn test_parallel_callers() {
        const THREADS: usize = 8;
        const PER_THREAD: usize = 500;

        let cache = Arc::new(build_cache(1024));
        let handles = (0..THREADS)
            .map(|t| {
                let cache = cache.clone();
                thread::spawn(move || {
                    for i in 0..PER_THREAD {
                        let key = format!("{}-{}", t, i % 50);
                        cache.add(&key, format!("value{}", i).into());
                        if let Some(v) = cache.get(&key) {
                            assert!(v.as_str().unwrap().starts_with("value"));
                        }
                    }
                })
            })
            .collect::<Vec<_>>();

        for h in handles {
            h.join().unwrap();
        }

        assert!(cache.bytes() <= 1024);
        assert!(!cache.is_empty());

        let guard = cache.lru.lock().unwrap();
        let lru = guard.as_ref().unwrap();
        assert_eq!(lru.keys().len(), lru.len());
        let recomputed: u64 = lru
            .iter()
            .map(|(k, v)| (k.len() + v.len()) as u64)
            .sum();
        assert_eq!(recomputed, lru.bytes());
    }

    #[test]
    fn test_unbounded_across_threads() {
        let cache = Arc::new(ConcurrentCache::new(0));
        let handles = (0..4)
            .map(|t| {
                let cache = cache.clone();
                thread::spawn(move || {
                    for i in 0..250 {
                        cache.add(&format!("{}:{}", t, i), vec![0u8; 64].into());
                    }
                })
            })
            .collect::<Vec<_>>();
        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(cache.len(), 1000);
    }
}
