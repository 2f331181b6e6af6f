//! Cost-bounded in-memory LRU cache.
//!
//! Entries carry a caller-supplied cost. When an insert would push the running
//! total past the ceiling, least recently used entries are dropped until it
//! fits. Eviction is silent: a `get` right after a `put` may miss.

use lru::LruCache;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

/// Default cost ceiling (100 MB when cost is a byte count).
pub const DEFAULT_COST_LIMIT: usize = 100_000_000;

struct Entry<V> {
    value: V,
    cost: usize,
}

struct Inner<V> {
    entries: LruCache<String, Entry<V>>,
    total_cost: usize,
}

/// Memory tier of the cache.
///
/// All bookkeeping sits behind one mutex, so concurrent `get`/`put` calls are
/// linearizable. The lock is never held across an await point.
pub struct MemoryCache<V> {
    inner: Mutex<Inner<V>>,
    cost_limit: usize,
    puts: AtomicU64,
}

impl<V: Clone> MemoryCache<V> {
    pub fn new(cost_limit: usize) -> Self {
        Self {
            inner: Mutex::new(Inner { entries: LruCache::unbounded(), total_cost: 0 }),
            cost_limit,
            puts: AtomicU64::new(0),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner<V>> {
        // No invariant spans a panic point inside the lock.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Look up `key`, marking it most recently used.
    pub fn get(&self, key: &str) -> Option<V> {
        self.lock().entries.get(key).map(|e| e.value.clone())
    }

    /// Insert or replace `key`.
    ///
    /// An entry costing more than the whole ceiling is not stored, and any
    /// previous value under `key` is dropped.
    pub fn put(&self, key: impl Into<String>, value: V, cost: usize) {
        self.puts.fetch_add(1, Ordering::Relaxed);
        let key = key.into();
        let mut inner = self.lock();

        if let Some(old) = inner.entries.pop(&key) {
            inner.total_cost -= old.cost;
        }

        if cost > self.cost_limit {
            tracing::debug!(key = %key, cost, limit = self.cost_limit, "entry exceeds memory cost limit, not cached");
            return;
        }

        while inner.total_cost + cost > self.cost_limit {
            match inner.entries.pop_lru() {
                Some((evicted, entry)) => {
                    inner.total_cost -= entry.cost;
                    tracing::trace!(key = %evicted, cost = entry.cost, "evicted from memory cache");
                }
                None => break,
            }
        }

        inner.total_cost += cost;
        inner.entries.put(key, Entry { value, cost });
    }

    pub fn remove(&self, key: &str) -> Option<V> {
        let mut inner = self.lock();
        let entry = inner.entries.pop(key)?;
        inner.total_cost -= entry.cost;
        Some(entry.value)
    }

    /// Drop every entry, as the environment may do under memory pressure.
    pub fn clear(&self) {
        let mut inner = self.lock();
        inner.entries.clear();
        inner.total_cost = 0;
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sum of the costs of all resident entries.
    pub fn total_cost(&self) -> usize {
        self.lock().total_cost
    }

    pub fn cost_limit(&self) -> usize {
        self.cost_limit
    }

    /// Number of `put` calls made, stored or not.
    pub fn puts(&self) -> u64 {
        self.puts.load(Ordering::Relaxed)
    }
}

impl<V: Clone> Default for MemoryCache<V> {
    fn default() -> Self {
        Self::new(DEFAULT_COST_LIMIT)
    }
}
