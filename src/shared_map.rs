use parking_lot::RwLock;
use std::{
    collections::hash_map::RandomState,
    hash::{BuildHasher, Hash},
    sync::Arc,
};

use crate::ordered_map::OrderedMap;

/// Wrapper for an OrderedMap which is shareable across thread boundaries.
///
/// Each call takes the lock for the whole operation, so `load_or_store` stays
/// a single step even with several writers racing on the same key.
pub struct SharedOrderedMap<K, V, S = RandomState>(Arc<RwLock<OrderedMap<K, V, S>>>);

impl<K, V> SharedOrderedMap<K, V, RandomState>
where
    K: Eq + Hash,
    V: Clone,
{
    /// Makes a new, empty shared map.
    pub fn new() -> Self {
        Self::with_map(OrderedMap::new())
    }
}

impl<K, V, S> SharedOrderedMap<K, V, S>
where
    K: Eq + Hash,
    V: Clone,
    S: BuildHasher,
{
    /// Wraps a map into a shared map accessor, making it safe to move across
    /// thread boundaries. Enforces an additional constraint of Clone on
    /// values.
    pub fn with_map(map: OrderedMap<K, V, S>) -> Self {
        Self(Arc::from(RwLock::from(map)))
    }

    /// Stores an item in the map, returning the value it replaced.
    pub fn store(&self, k: K, v: V) -> Option<V> {
        self.0.write().store(k, v)
    }

    /// Get an item from the map. This clones it to minimize the lock time of
    /// the map.
    pub fn load(&self, k: &K) -> Option<V> {
        self.0.read().load(k).cloned()
    }

    /// Loads the item under `k`, or stores `v` if there is none. The flag is
    /// `true` when the value was already there.
    pub fn load_or_store(&self, k: K, v: V) -> (V, bool) {
        let mut map = self.0.write();
        let (actual, loaded) = map.load_or_store(k, v);
        (actual.clone(), loaded)
    }

    /// Remove an item from the map, returning the removed item if it existed.
    pub fn delete(&self, k: &K) -> Option<V> {
        self.0.write().delete(k)
    }

    /// Visits entries in insertion order under the read lock until `visit`
    /// returns `false`. Writers wait until the walk is done.
    pub fn range<F>(&self, visit: F)
    where
        F: FnMut(&K, &V) -> bool,
    {
        self.0.read().range(visit)
    }

    /// Clears the map.
    pub fn clear(&self) {
        self.0.write().clear()
    }

    /// The number of elements in the map at present.
    pub fn len(&self) -> usize {
        self.0.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.read().is_empty()
    }
}

impl<K, V, S> Clone for SharedOrderedMap<K, V, S> {
    fn clone(&self) -> Self {
        SharedOrderedMap(self.0.clone())
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use crate::{OrderedMap, SharedOrderedMap};

    #[test]
    fn test_visible_across_threads() {
        let map: SharedOrderedMap<usize, usize> = SharedOrderedMap::new();
        map.store(1, 1);

        let thread_map = map.clone();
        let r = thread::spawn(move || thread_map.load(&1)).join();

        assert_eq!(Some(1), r.unwrap());
    }

    #[test]
    fn test_load_or_store_races_insert_once() {
        let map: SharedOrderedMap<&'static str, usize> = SharedOrderedMap::new();

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let map = map.clone();
                thread::spawn(move || map.load_or_store("key", i).1)
            })
            .collect();
        let loaded: Vec<bool> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        // exactly one thread stored, everyone else loaded its value
        assert_eq!(1, loaded.iter().filter(|l| !**l).count());
        assert_eq!(1, map.len());
    }

    #[test]
    fn test_order_through_wrapper() {
        let mut inner = OrderedMap::new();
        inner.store("a", 1);
        let map = SharedOrderedMap::with_map(inner);
        map.store("b", 2);
        map.store("c", 3);
        assert_eq!(Some(2), map.delete(&"b"));
        map.store("a", 10);

        let mut seen = Vec::new();
        map.range(|k, v| {
            seen.push((*k, *v));
            true
        });
        assert_eq!(vec![("a", 10), ("c", 3)], seen);

        map.clear();
        assert!(map.is_empty());
        assert_eq!(None, map.load(&"a"));
    }
}
