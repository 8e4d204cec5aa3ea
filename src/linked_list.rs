//! A linked list that flattens all its nodes onto a Vec for storage, gaining
//! data locality and O(1) random access by handle. Removed slots are
//! freelisted and reused by later pushes.

use std::ops::{Index, IndexMut};

/// Alias for the index of a node in the linked list's storage vec.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) struct NodeHandle(usize);

/// A node that lives in a linked list.
#[derive(Clone, Debug)]
pub(crate) struct Node<K, V> {
    /// The key this node is stored under.
    pub(crate) key: K,

    /// The value being stored.
    pub(crate) value: V,

    /// The key's hash, kept so the lookup table can rehash without touching
    /// the key.
    pub(crate) hash: u64,

    /// The node inserted just before this one, if any.
    pub(crate) prev: Option<NodeHandle>,

    /// The node inserted just after this one, if any.
    pub(crate) next: Option<NodeHandle>,
}

#[cold]
#[inline(never)]
fn vacant_slot(handle: NodeHandle) -> ! {
    panic!("node handle {} points at a vacant slot", handle.0);
}

/// A doubly linked list in a single contiguous Vec of nodes, which are
/// addressed by their position in the Vec. Unlike a ring, the ends are
/// explicit: `head` is the oldest node and `tail` the newest, and both are
/// `None` exactly when the list is empty.
///
/// Handles are only meaningful to the list that issued them, and only until
/// the node is removed or the list is cleared.
#[derive(Clone, Debug)]
pub(crate) struct LinkedList<K, V> {
    /// The nodes in the list. `None` marks a slot on the freelist.
    pub(crate) store: Vec<Option<Node<K, V>>>,

    /// Entries in the list which aren't in use anymore. These will be reused.
    free: Vec<NodeHandle>,

    /// The first (oldest) node in the list.
    head: Option<NodeHandle>,

    /// The last (newest) node in the list.
    tail: Option<NodeHandle>,
}

impl<K, V> LinkedList<K, V> {
    /// Creates a new linked list with a specific capacity.
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            store: Vec::with_capacity(capacity),
            free: Vec::new(),
            head: None,
            tail: None,
        }
    }

    /// The length of this linked list.
    pub(crate) fn len(&self) -> usize {
        self.store.len() - self.free.len()
    }

    pub(crate) fn head(&self) -> Option<NodeHandle> {
        self.head
    }

    pub(crate) fn tail(&self) -> Option<NodeHandle> {
        self.tail
    }

    /// Appends a node after the current tail and returns a handle to it.
    pub(crate) fn push_back(&mut self, key: K, value: V, hash: u64) -> NodeHandle {
        let n = Node {
            key,
            value,
            hash,
            prev: self.tail,
            next: None,
        };

        // use the first available location in the storage vec, or infer what
        // the next location will be on push.
        let idx = self
            .free
            .pop()
            .unwrap_or_else(|| NodeHandle(self.store.len()));

        match self.tail {
            Some(tail) => self[tail].next = Some(idx),
            None => self.head = Some(idx),
        }
        self.tail = Some(idx);

        if self.store.len() <= idx.0 {
            self.store.push(Some(n));
        } else {
            self.store[idx.0] = Some(n);
        }

        idx
    }

    /// Remove an arbitrary node from the list, handing it back to the caller.
    pub(crate) fn remove_node(&mut self, node: NodeHandle) -> Node<K, V> {
        let removed = match self.store.get_mut(node.0).and_then(Option::take) {
            Some(removed) => removed,
            None => vacant_slot(node),
        };

        // link prev to next and next to prev so node doesn't exist in the
        // chain anymore; the slot gets overwritten at some later push by
        // placing its handle on the freelist
        match removed.prev {
            Some(prev) => self[prev].next = removed.next,
            None => self.head = removed.next,
        }
        match removed.next {
            Some(next) => self[next].prev = removed.prev,
            None => self.tail = removed.prev,
        }

        self.free.push(node);
        removed
    }

    /// Clears this linked list. Does not free the underlying buffers.
    pub(crate) fn clear(&mut self) {
        self.store.clear();
        self.free.clear();
        self.head = None;
        self.tail = None;
    }
}

impl<K, V> Index<NodeHandle> for LinkedList<K, V> {
    type Output = Node<K, V>;

    fn index(&self, handle: NodeHandle) -> &Self::Output {
        match self.store.get(handle.0) {
            Some(Some(node)) => node,
            _ => vacant_slot(handle),
        }
    }
}

impl<K, V> IndexMut<NodeHandle> for LinkedList<K, V> {
    fn index_mut(&mut self, handle: NodeHandle) -> &mut Self::Output {
        match self.store.get_mut(handle.0) {
            Some(Some(node)) => node,
            _ => vacant_slot(handle),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::LinkedList;

    fn keys_forward(list: &LinkedList<u32, u32>) -> Vec<u32> {
        let mut keys = Vec::new();
        let mut cursor = list.head();
        while let Some(handle) = cursor {
            keys.push(list[handle].key);
            cursor = list[handle].next;
        }
        keys
    }

    fn keys_backward(list: &LinkedList<u32, u32>) -> Vec<u32> {
        let mut keys = Vec::new();
        let mut cursor = list.tail();
        while let Some(handle) = cursor {
            keys.push(list[handle].key);
            cursor = list[handle].prev;
        }
        keys
    }

    #[test]
    fn test_push_back_keeps_order() {
        let mut list = LinkedList::with_capacity(3);
        list.push_back(0, 10, 0);
        list.push_back(1, 11, 0);
        list.push_back(2, 12, 0);

        assert_eq!(3, list.len());
        assert_eq!(vec![0, 1, 2], keys_forward(&list));
        assert_eq!(vec![2, 1, 0], keys_backward(&list));
    }

    #[test]
    fn test_remove_middle_and_ends() {
        let mut list = LinkedList::with_capacity(4);
        let a = list.push_back(0, 0, 0);
        let b = list.push_back(1, 1, 0);
        let c = list.push_back(2, 2, 0);
        let d = list.push_back(3, 3, 0);

        assert_eq!(1, list.remove_node(b).value);
        assert_eq!(vec![0, 2, 3], keys_forward(&list));

        // removing the head advances it
        assert_eq!(0, list.remove_node(a).key);
        assert_eq!(Some(c), list.head());
        assert_eq!(vec![3, 2], keys_backward(&list));

        // removing the tail pulls it back
        list.remove_node(d);
        assert_eq!(Some(c), list.tail());
        assert_eq!(Some(c), list.head());

        // removing the sole node empties both ends
        list.remove_node(c);
        assert_eq!(0, list.len());
        assert_eq!(None, list.head());
        assert_eq!(None, list.tail());
    }

    #[test]
    fn test_freelist_reuse() {
        let mut list = LinkedList::with_capacity(2);
        let a = list.push_back(0, 0, 0);
        list.push_back(1, 1, 0);
        list.remove_node(a);

        // the vacated slot is handed out again rather than growing the store
        let c = list.push_back(2, 2, 0);
        assert_eq!(a, c);
        assert_eq!(2, list.store.len());
        assert_eq!(vec![1, 2], keys_forward(&list));
    }

    #[test]
    fn test_clear() {
        let mut list = LinkedList::with_capacity(2);
        list.push_back(0, 0, 0);
        list.push_back(1, 1, 0);
        list.clear();

        assert_eq!(0, list.len());
        assert_eq!(None, list.head());
        assert_eq!(None, list.tail());

        list.push_back(5, 5, 0);
        assert_eq!(vec![5], keys_forward(&list));
    }

    #[test]
    #[should_panic]
    fn test_removed_handle_panics() {
        let mut list = LinkedList::with_capacity(1);
        let a = list.push_back(0, 0, 0);
        list.remove_node(a);
        let _ = &list[a];
    }
}
