use std::{
    borrow::Borrow,
    collections::hash_map::RandomState,
    fmt,
    hash::{BuildHasher, Hash, Hasher},
    iter::FromIterator,
    mem,
};

use hashbrown::HashTable;

use crate::iter::{IntoIter, Iter, Keys, Values};
use crate::linked_list::{LinkedList, NodeHandle};

/// A hash map that remembers the order its keys were first inserted in.
///
/// Lookups go through a hash table of node handles; the nodes themselves
/// live in an arena-backed doubly linked list that records insertion order.
/// Storing over an existing key updates its value in place without moving it,
/// and new keys always go to the back.
///
/// The map does no locking of its own. Wrap it (for instance in a
/// [`SharedOrderedMap`](crate::SharedOrderedMap)) to share it between threads.
#[derive(Clone)]
pub struct OrderedMap<K, V, S = RandomState> {
    hash_builder: S,
    lookup: HashTable<NodeHandle>,
    order: LinkedList<K, V>,
}

impl<K, V> OrderedMap<K, V, RandomState> {
    /// Makes a new, empty map.
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Makes a new, empty map with room for `capacity` entries.
    pub fn with_capacity(capacity: usize) -> Self {
        OrderedMap::with_capacity_and_hasher(capacity, Default::default())
    }
}

impl<K, V, S> OrderedMap<K, V, S> {
    pub fn with_hasher(hash_builder: S) -> Self {
        Self::with_capacity_and_hasher(0, hash_builder)
    }

    pub fn with_capacity_and_hasher(capacity: usize, hash_builder: S) -> Self {
        Self {
            hash_builder,
            lookup: HashTable::with_capacity(capacity),
            order: LinkedList::with_capacity(capacity),
        }
    }

    pub fn hasher(&self) -> &S {
        &self.hash_builder
    }

    /// The number of entries in the map.
    pub fn len(&self) -> usize {
        self.lookup.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterates over the entries in insertion order. Reverse it to walk from
    /// the newest entry back to the oldest.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter::new(&self.order)
    }

    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys(self.iter())
    }

    pub fn values(&self) -> Values<'_, K, V> {
        Values(self.iter())
    }

    /// Calls `visit` on each entry in insertion order until it returns
    /// `false`.
    pub fn range<F>(&self, mut visit: F)
    where
        F: FnMut(&K, &V) -> bool,
    {
        for (k, v) in self.iter() {
            if !visit(k, v) {
                break;
            }
        }
    }

    /// The oldest entry still in the map.
    pub fn first(&self) -> Option<(&K, &V)> {
        self.order.head().map(|h| {
            let node = &self.order[h];
            (&node.key, &node.value)
        })
    }

    /// The newest entry in the map.
    pub fn last(&self) -> Option<(&K, &V)> {
        self.order.tail().map(|h| {
            let node = &self.order[h];
            (&node.key, &node.value)
        })
    }

    /// Drops every entry, leaving the map as if it were freshly made. The
    /// allocated buffers are kept for reuse.
    pub fn clear(&mut self) {
        self.lookup.clear();
        self.order.clear();

        #[cfg(test)]
        {
            assert_eq!(0, self.len());
            self.continuity_test();
        }
    }

    #[cfg(test)]
    fn continuity_test(&self) {
        assert_eq!(self.lookup.len(), self.order.len());
        assert_eq!(self.is_empty(), self.order.head().is_none());
        assert_eq!(self.is_empty(), self.order.tail().is_none());

        // walk the list forwards, checking each back link on the way, and
        // make sure it matches the number of elements in the map
        let mut count = 0;
        let mut prev = None;
        let mut cursor = self.order.head();
        while let Some(handle) = cursor {
            count += 1;
            assert!(count <= self.len());
            assert_eq!(prev, self.order[handle].prev);
            prev = Some(handle);
            cursor = self.order[handle].next;
        }

        assert_eq!(self.order.tail(), prev);
        assert_eq!(self.len(), count);

        // and again in reverse
        count = 0;
        let mut cursor = self.order.tail();
        while let Some(handle) = cursor {
            count += 1;
            assert!(count <= self.len());
            cursor = self.order[handle].prev;
        }

        assert_eq!(self.len(), count);
    }
}

impl<K, V, S> OrderedMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    /// Stores `v` under `k`. An existing key keeps its place in the order and
    /// has its previous value handed back; a new key goes to the back.
    pub fn store(&mut self, k: K, v: V) -> Option<V> {
        #[cfg(test)]
        let original_len = self.len();
        let hash = self.k_hash(&k);

        if let Some(handle) = self.find_hashed(hash, &k) {
            let previous = mem::replace(&mut self.order[handle].value, v);

            #[cfg(test)]
            {
                assert_eq!(original_len, self.len());
                self.continuity_test();
            }

            return Some(previous);
        }

        self.link_new(hash, k, v);

        #[cfg(test)]
        {
            assert_eq!(original_len + 1, self.len());
            self.continuity_test();
        }

        None
    }

    pub fn load<Q>(&self, k: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.find(k).map(|h| &self.order[h].value)
    }

    /// Gets a mutable reference to the value under `k`. Changing the value
    /// through it does not move the entry.
    pub fn load_mut<Q>(&mut self, k: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let handle = self.find(k)?;
        Some(&mut self.order[handle].value)
    }

    pub fn contains_key<Q>(&self, k: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.find(k).is_some()
    }

    /// Returns the value already under `k` along with `true`, or stores `v`
    /// at the back and returns it along with `false`. When the key is
    /// present, `v` is dropped and the map is left untouched.
    pub fn load_or_store(&mut self, k: K, v: V) -> (&V, bool) {
        let hash = self.k_hash(&k);

        if let Some(handle) = self.find_hashed(hash, &k) {
            return (&self.order[handle].value, true);
        }

        let handle = self.link_new(hash, k, v);

        #[cfg(test)]
        self.continuity_test();

        (&self.order[handle].value, false)
    }

    /// Removes `k` from the map, returning its value. Removing a key that
    /// isn't there does nothing.
    pub fn delete<Q>(&mut self, k: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.remove_entry(k).map(|(_, v)| v)
    }

    pub fn remove_entry<Q>(&mut self, k: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        #[cfg(test)]
        let original_len = self.len();
        let hash = self.k_hash(k);

        let order = &self.order;
        let entry = self
            .lookup
            .find_entry(hash, |&h| Borrow::<Q>::borrow(&order[h].key) == k)
            .ok()?;
        let (handle, _) = entry.remove();

        // unlinking also moves the head and tail along if this was either
        let removed_node = self.order.remove_node(handle);

        #[cfg(test)]
        {
            assert_eq!(original_len - 1, self.len());
            self.continuity_test();
        }

        Some((removed_node.key, removed_node.value))
    }

    /// Appends a node for a key known to be absent and indexes it.
    fn link_new(&mut self, hash: u64, k: K, v: V) -> NodeHandle {
        let handle = self.order.push_back(k, v, hash);
        let order = &self.order;
        self.lookup.insert_unique(hash, handle, |&h| order[h].hash);
        handle
    }

    fn find<Q>(&self, k: &Q) -> Option<NodeHandle>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.find_hashed(self.k_hash(k), k)
    }

    fn find_hashed<Q>(&self, hash: u64, k: &Q) -> Option<NodeHandle>
    where
        K: Borrow<Q>,
        Q: Eq + ?Sized,
    {
        let order = &self.order;
        self.lookup
            .find(hash, |&h| Borrow::<Q>::borrow(&order[h].key) == k)
            .copied()
    }

    fn k_hash<Q>(&self, k: &Q) -> u64
    where
        Q: Hash + ?Sized,
    {
        let mut h = self.hash_builder.build_hasher();
        k.hash(&mut h);
        h.finish()
    }

    /// Checks that every node in the list can be found through the lookup
    /// table under its own key, and that its cached hash is current.
    #[cfg(test)]
    fn lookup_test(&self) {
        for (k, _) in self.iter() {
            let handle = self.find(k);
            assert!(handle.is_some());
            if let Some(handle) = handle {
                assert!(self.order[handle].key == *k);
                assert_eq!(self.k_hash(k), self.order[handle].hash);
            }
        }
    }
}

impl<K, V, S> Default for OrderedMap<K, V, S>
where
    S: Default,
{
    fn default() -> Self {
        Self::with_hasher(Default::default())
    }
}

impl<K, V, S> fmt::Debug for OrderedMap<K, V, S>
where
    K: fmt::Debug,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V, S> Extend<(K, V)> for OrderedMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.store(k, v);
        }
    }
}

impl<K, V, S> FromIterator<(K, V)> for OrderedMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher + Default,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let iter = iter.into_iter();
        let mut map = Self::with_capacity_and_hasher(iter.size_hint().0, S::default());
        map.extend(iter);
        map
    }
}

impl<K, V, S> IntoIterator for OrderedMap<K, V, S> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter::new(self.order)
    }
}

impl<'a, K, V, S> IntoIterator for &'a OrderedMap<K, V, S> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
