//! crates/preiter/src/sizeable.rs
//! Size reporting and the size-bounded recursor cache.

use std::collections::BTreeMap;
use std::fmt;
use std::hash::Hash;

use logging::trace_cache;
use rustc_hash::FxHashMap;

/// Anything that can report a non-negative size.
///
/// For cursors the size is the number of elements currently buffered across
/// every level, so it can grow as lazy sources are drained.
pub trait Sizeable {
    /// Current size.
    fn size(&self) -> usize;
}

impl<S: Sizeable + ?Sized> Sizeable for Box<S> {
    fn size(&self) -> usize {
        (**self).size()
    }
}

struct Slot<V> {
    value: V,
    size: usize,
    tick: u64,
}

/// Cache bounded by the summed [`Sizeable::size`] of its values.
///
/// Entries are evicted least-recently-used first. Sizes are sampled when a
/// value is inserted. An entry larger than the whole limit is evicted by its
/// own insertion.
pub struct SizeableCache<K, V> {
    entries: FxHashMap<K, Slot<V>>,
    order: BTreeMap<u64, K>,
    tick: u64,
    total: usize,
    size_limit: usize,
}

impl<K, V> fmt::Debug for SizeableCache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SizeableCache")
            .field("len", &self.entries.len())
            .field("size", &self.total)
            .field("size_limit", &self.size_limit)
            .finish()
    }
}

impl<K, V> SizeableCache<K, V>
where
    K: Clone + Eq + Hash + fmt::Debug,
    V: Sizeable,
{
    /// Creates an empty cache holding at most `size_limit` total size.
    #[must_use]
    pub fn new(size_limit: usize) -> Self {
        Self {
            entries: FxHashMap::default(),
            order: BTreeMap::new(),
            tick: 0,
            total: 0,
            size_limit,
        }
    }

    /// Summed size of the cached values.
    #[must_use]
    pub const fn size(&self) -> usize {
        self.total
    }

    /// Configured bound.
    #[must_use]
    pub const fn size_limit(&self) -> usize {
        self.size_limit
    }

    /// Number of cached values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns `true` when `key` is cached. Does not count as a use.
    #[must_use]
    pub fn contains(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    /// Borrows the value for `key` and marks it most recently used.
    pub fn get(&mut self, key: &K) -> Option<&V> {
        let tick = self.next_tick();
        let slot = self.entries.get_mut(key)?;
        self.order.remove(&slot.tick);
        slot.tick = tick;
        self.order.insert(tick, key.clone());
        Some(&slot.value)
    }

    /// Inserts `value`, replacing any previous value for `key`, then evicts
    /// least-recently-used entries until the total fits the limit.
    pub fn insert(&mut self, key: K, value: V) {
        self.remove(&key);
        let size = value.size();
        let tick = self.next_tick();
        self.total += size;
        self.order.insert(tick, key.clone());
        self.entries.insert(key, Slot { value, size, tick });
        self.evict();
    }

    /// Removes and returns the value for `key`.
    pub fn take(&mut self, key: &K) -> Option<V> {
        let slot = self.entries.remove(key)?;
        self.order.remove(&slot.tick);
        self.total -= slot.size;
        Some(slot.value)
    }

    /// Removes the value for `key`, returning whether it was present.
    pub fn remove(&mut self, key: &K) -> bool {
        self.take(key).is_some()
    }

    /// Drops every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
        self.total = 0;
    }

    const fn next_tick(&mut self) -> u64 {
        self.tick += 1;
        self.tick
    }

    fn evict(&mut self) {
        while self.total > self.size_limit {
            let Some((_, key)) = self.order.pop_first() else {
                break;
            };
            if let Some(slot) = self.entries.remove(&key) {
                self.total -= slot.size;
                trace_cache!(key = ?key, size = slot.size, total = self.total, "evicted");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Weight(usize);

    impl Sizeable for Weight {
        fn size(&self) -> usize {
            self.0
        }
    }

    #[test]
    fn evicts_least_recently_used_first() {
        let mut cache = SizeableCache::new(10);
        cache.insert("a", Weight(4));
        cache.insert("b", Weight(4));
        assert!(cache.get(&"a").is_some());
        cache.insert("c", Weight(4));

        assert!(cache.contains(&"a"));
        assert!(!cache.contains(&"b"));
        assert!(cache.contains(&"c"));
        assert_eq!(cache.size(), 8);
    }

    #[test]
    fn oversized_entry_evicts_itself() {
        let mut cache = SizeableCache::new(3);
        cache.insert(1, Weight(1));
        cache.insert(2, Weight(5));
        assert!(cache.is_empty());
        assert_eq!(cache.size(), 0);
    }

    #[test]
    fn take_removes_and_returns() {
        let mut cache = SizeableCache::new(100);
        cache.insert('x', Weight(7));
        let value = cache.take(&'x').expect("cached");
        assert_eq!(value.0, 7);
        assert_eq!(cache.size(), 0);
        assert!(cache.take(&'x').is_none());
    }

    #[test]
    fn reinsert_replaces_size() {
        let mut cache = SizeableCache::new(100);
        cache.insert(1, Weight(30));
        cache.insert(1, Weight(10));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.size(), 10);
        cache.clear();
        assert_eq!(cache.size_limit(), 100);
        assert!(cache.is_empty());
    }

    #[test]
    fn zero_sized_entries_never_evict() {
        let mut cache = SizeableCache::new(0);
        cache.insert(1, Weight(0));
        cache.insert(2, Weight(0));
        assert_eq!(cache.len(), 2);
    }
}
