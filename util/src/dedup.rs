//! A bounded, LRU-evicting set used to guard gossip against re-processing
//! the same block hash or transaction id twice.

use std::hash::Hash;
use std::num::NonZeroUsize;

use lru::LruCache;
use parking_lot::Mutex;

/// Thread-safe bounded set of recently-seen keys.
pub struct DedupSet<K: Hash + Eq> {
    seen: Mutex<LruCache<K, ()>>,
}

/// Default capacity for the recent-block-hash and recent-transaction-id
/// dedup sets.
pub const DEFAULT_DEDUP_CAPACITY: usize = 4096;

impl<K: Hash + Eq> DedupSet<K> {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).expect("capacity is at least 1");
        DedupSet { seen: Mutex::new(LruCache::new(capacity)) }
    }

    /// Records `key` as seen and returns `true` if it was already present
    /// (i.e. this call is a duplicate).
    pub fn insert_seen(&self, key: K) -> bool {
        let mut seen = self.seen.lock();
        let already_seen = seen.contains(&key);
        seen.put(key, ());
        already_seen
    }

    pub fn contains(&self, key: &K) -> bool {
        self.seen.lock().contains(key)
    }
}

impl<K: Hash + Eq> Default for DedupSet<K> {
    fn default() -> Self {
        DedupSet::new(DEFAULT_DEDUP_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_insert_of_same_key_is_reported_as_duplicate() {
        let set: DedupSet<u64> = DedupSet::new(10);
        assert!(!set.insert_seen(1));
        assert!(set.insert_seen(1));
    }

    #[test]
    fn capacity_evicts_oldest_entry() {
        let set: DedupSet<u64> = DedupSet::new(2);
        set.insert_seen(1);
        set.insert_seen(2);
        set.insert_seen(3);
        assert!(!set.contains(&1));
        assert!(set.contains(&2));
        assert!(set.contains(&3));
    }
}
