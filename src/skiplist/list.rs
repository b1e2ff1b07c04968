use epoch::{self, Guard, Owned, Shared};
use rand::{self, Rng};
use skiplist::node::{Node, NodeKey};
use std::hint;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicUsize, Ordering};

/// A concurrent ordered set implemented as a lazy, optimistic skip list.
///
/// Traversals are lock-free: `contains`, `range`, and `iter` never block,
/// and the search phase of every mutation runs without locks. Mutations
/// take the locks of the handful of nodes they rewire, then re-validate
/// that those nodes still bracket the target slot before committing.
///
/// An insertion wires the new node's forward pointers, splices it in from
/// the bottom level upward, and only then sets the node's `fully_linked`
/// flag; the flag is the linearization point, and a traversal never
/// observes a half-linked node as a member. A removal first sets the
/// victim's `marked` flag under its lock (the linearization point), then
/// unlinks it from the top level downward, so the bottom-level list always
/// contains every logically present key. Unlinked nodes are handed to an
/// epoch-based collector and reclaimed once no traversal can still hold a
/// reference to them.
///
/// # Examples
///
/// ```
/// use membership_collections::skiplist::SkipList;
///
/// let list = SkipList::new(100);
///
/// assert!(list.insert("m"));
/// assert!(list.insert("a"));
/// assert!(!list.insert("m"));
///
/// assert!(list.contains(&"a"));
/// assert_eq!(list.range(&"b", &"z"), vec!["m"]);
///
/// assert!(list.remove(&"m"));
/// assert!(!list.contains(&"m"));
/// assert_eq!(list.len(), 1);
/// ```
pub struct SkipList<K> {
    head: epoch::Atomic<Node<K>>,
    max_level: usize,
    len: AtomicUsize,
}

impl<K: Ord> SkipList<K> {
    /// Constructs a new, empty `SkipList<K>` sized for up to `max_elements`
    /// elements.
    ///
    /// The number of levels is fixed at `log2(max_elements)`, the expected
    /// height of a skip list of that size with a level-promotion
    /// probability of one half.
    ///
    /// # Panics
    ///
    /// Panics if `max_elements` is zero.
    ///
    /// # Examples
    ///
    /// ```
    /// use membership_collections::skiplist::SkipList;
    ///
    /// let list: SkipList<u32> = SkipList::new(100);
    /// ```
    pub fn new(max_elements: usize) -> Self {
        assert!(max_elements > 0);
        let max_level = (max_elements as f64).log2() as usize;
        let list = SkipList {
            head: epoch::Atomic::null(),
            max_level,
            len: AtomicUsize::new(0),
        };

        unsafe {
            let guard = epoch::unprotected();
            let tail = Owned::new(Node::new(NodeKey::PosInf, max_level)).into_shared(guard);
            let head = Owned::new(Node::new(NodeKey::NegInf, max_level)).into_shared(guard);
            for level in 0..max_level + 1 {
                head.deref().set_next(level, tail);
            }
            head.deref().set_fully_linked();
            tail.deref().set_fully_linked();
            list.head.store(head, Ordering::Relaxed);
        }
        list
    }

    fn random_level(&self) -> usize {
        let mut rng = rand::thread_rng();
        let mut level = 0;
        while level < self.max_level && rng.gen::<bool>() {
            level += 1;
        }
        level
    }

    /// Records the predecessor and successor of `key` at every level and
    /// returns the highest level at which the successor holds `key`.
    ///
    /// Both slices are fully overwritten; the walk visits every level from
    /// the top down, so each slot is initialized before the walk returns.
    fn find<'g>(
        &self,
        key: &K,
        preds: &mut [Shared<'g, Node<K>>],
        succs: &mut [Shared<'g, Node<K>>],
        guard: &'g Guard,
    ) -> Option<usize> {
        let mut found = None;
        let mut pred = self.head.load(Ordering::Acquire, guard);

        unsafe {
            for level in (0..self.max_level + 1).rev() {
                let mut curr = pred.deref().get_next(level, guard);
                while curr.deref().key_lt(key) {
                    pred = curr;
                    curr = pred.deref().get_next(level, guard);
                }
                if found.is_none() && curr.deref().key_eq(key) {
                    found = Some(level);
                }
                preds[level] = pred;
                succs[level] = curr;
            }
        }
        found
    }

    /// Adds a key to the set. Returns `false` if the key was already
    /// present.
    ///
    /// # Examples
    ///
    /// ```
    /// use membership_collections::skiplist::SkipList;
    ///
    /// let list = SkipList::new(100);
    ///
    /// assert!(list.insert(1));
    /// assert!(!list.insert(1));
    /// ```
    pub fn insert(&self, key: K) -> bool {
        let guard = &epoch::pin();
        let top_level = self.random_level();
        let mut preds = vec![Shared::null(); self.max_level + 1];
        let mut succs = vec![Shared::null(); self.max_level + 1];

        loop {
            if let Some(found) = self.find(&key, &mut preds, &mut succs, guard) {
                let node = succs[found];
                unsafe {
                    if !node.deref().is_marked() {
                        // a concurrent insertion of the same key wins once
                        // its publication flag is set
                        while !node.deref().is_fully_linked() {
                            hint::spin_loop();
                        }
                        return false;
                    }
                }
                // the previous holder of the key is marked; retry once the
                // search no longer reports it
                continue;
            }

            // lock each distinct predecessor, then confirm it still
            // brackets the slot observed by the lock-free search
            let mut locked = Vec::new();
            let mut locked_ptrs: Vec<*const Node<K>> = Vec::new();
            let mut valid = true;
            for level in 0..top_level + 1 {
                let pred = preds[level];
                let succ = succs[level];
                if !locked_ptrs.contains(&pred.as_raw()) {
                    locked_ptrs.push(pred.as_raw());
                    locked.push(unsafe { pred.deref() }.lock.lock());
                }
                valid = unsafe {
                    !pred.deref().is_marked()
                        && pred.deref().get_next(level, guard).as_raw() == succ.as_raw()
                };
                if !valid {
                    break;
                }
            }

            if !valid {
                continue;
            }

            let node = Owned::new(Node::new(NodeKey::Value(key), top_level)).into_shared(guard);
            unsafe {
                for level in 0..top_level + 1 {
                    node.deref().set_next(level, succs[level]);
                }
                // splice bottom-up so the node is reachable at level 0
                // before any higher level points at it
                for level in 0..top_level + 1 {
                    preds[level].deref().set_next(level, node);
                }
                node.deref().set_fully_linked();
            }
            self.len.fetch_add(1, Ordering::Relaxed);
            return true;
        }
    }

    /// Removes a key from the set. Returns `false` if the key was not
    /// present.
    ///
    /// # Examples
    ///
    /// ```
    /// use membership_collections::skiplist::SkipList;
    ///
    /// let list = SkipList::new(100);
    ///
    /// list.insert(1);
    /// assert!(list.remove(&1));
    /// assert!(!list.remove(&1));
    /// ```
    pub fn remove(&self, key: &K) -> bool {
        let guard = &epoch::pin();
        let mut preds = vec![Shared::null(); self.max_level + 1];
        let mut succs = vec![Shared::null(); self.max_level + 1];
        let mut victim = Shared::null();
        let mut victim_guard = None;
        let mut is_marked = false;
        let mut top_level = 0;

        loop {
            let found = self.find(key, &mut preds, &mut succs, guard);
            if let Some(found_level) = found {
                victim = succs[found_level];
            }

            // the victim must be published, unmarked, and seen at its true
            // topmost level; otherwise a concurrent insertion or removal of
            // the same key is still in flight
            let removable = match found {
                Some(found_level) => unsafe {
                    let node = victim.deref();
                    node.is_fully_linked()
                        && node.top_level() == found_level
                        && !node.is_marked()
                },
                None => false,
            };

            if !is_marked && !removable {
                return false;
            }

            if !is_marked {
                let node = unsafe { victim.deref() };
                top_level = node.top_level();
                let node_guard = node.lock.lock();
                if node.is_marked() {
                    return false;
                }
                node.set_marked();
                victim_guard = Some(node_guard);
                is_marked = true;
            }

            let mut locked = Vec::new();
            let mut locked_ptrs: Vec<*const Node<K>> = Vec::new();
            let mut valid = true;
            for level in 0..top_level + 1 {
                let pred = preds[level];
                if !locked_ptrs.contains(&pred.as_raw()) {
                    locked_ptrs.push(pred.as_raw());
                    locked.push(unsafe { pred.deref() }.lock.lock());
                }
                valid = unsafe {
                    !pred.deref().is_marked()
                        && pred.deref().get_next(level, guard).as_raw() == victim.as_raw()
                };
                if !valid {
                    break;
                }
            }

            if !valid {
                // the victim stays marked: it is already logically removed,
                // so the unlink is retried until it lands
                continue;
            }

            unsafe {
                // unlink top-down so higher levels lose the node before the
                // bottom level does
                for level in (0..top_level + 1).rev() {
                    let succ = victim.deref().get_next(level, guard);
                    preds[level].deref().set_next(level, succ);
                }
            }
            drop(victim_guard.take());
            drop(locked);
            self.len.fetch_sub(1, Ordering::Relaxed);
            unsafe {
                guard.defer_destroy(victim);
            }
            return true;
        }
    }

    /// Checks if a key is in the set.
    ///
    /// The check is lock-free: it searches for the key and then confirms
    /// that the node found is published and not tombstoned.
    ///
    /// # Examples
    ///
    /// ```
    /// use membership_collections::skiplist::SkipList;
    ///
    /// let list = SkipList::new(100);
    ///
    /// list.insert(1);
    /// assert!(list.contains(&1));
    /// assert!(!list.contains(&2));
    /// ```
    pub fn contains(&self, key: &K) -> bool {
        let guard = &epoch::pin();
        let mut preds = vec![Shared::null(); self.max_level + 1];
        let mut succs = vec![Shared::null(); self.max_level + 1];

        match self.find(key, &mut preds, &mut succs, guard) {
            Some(found) => unsafe {
                let node = succs[found].deref();
                node.is_fully_linked() && !node.is_marked()
            },
            None => false,
        }
    }

    /// Returns the number of elements in the set.
    ///
    /// Under concurrent mutation the count is approximate: it counts
    /// insertions and removals at their linearization points.
    pub fn len(&self) -> usize {
        self.len.load(Ordering::Relaxed)
    }

    /// Returns `true` if the set holds no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<K: Ord + Clone> SkipList<K> {
    /// Collects every key in `[low, high]`, in order. Returns an empty
    /// vector when `low > high`.
    ///
    /// The scan takes no locks. Keys that are present and unchanged for
    /// the whole scan are always included; keys inserted or removed while
    /// the scan runs may or may not appear.
    ///
    /// # Examples
    ///
    /// ```
    /// use membership_collections::skiplist::SkipList;
    ///
    /// let list = SkipList::new(100);
    ///
    /// list.insert(1);
    /// list.insert(5);
    /// list.insert(9);
    ///
    /// assert_eq!(list.range(&2, &9), vec![5, 9]);
    /// assert_eq!(list.range(&9, &2), vec![]);
    /// ```
    pub fn range(&self, low: &K, high: &K) -> Vec<K> {
        if low > high {
            return Vec::new();
        }

        let guard = &epoch::pin();
        let mut keys = Vec::new();
        let mut pred = self.head.load(Ordering::Acquire, guard);

        unsafe {
            for level in (0..self.max_level + 1).rev() {
                let mut curr = pred.deref().get_next(level, guard);
                while curr.deref().key_lt(low) {
                    pred = curr;
                    curr = pred.deref().get_next(level, guard);
                }
            }

            let mut curr = pred.deref().get_next(0, guard);
            while curr.deref().key_le(high) {
                if let NodeKey::Value(ref value) = curr.deref().key {
                    if value >= low && !curr.deref().is_marked() {
                        keys.push(value.clone());
                    }
                }
                curr = curr.deref().get_next(0, guard);
            }
        }
        keys
    }

    /// Returns an iterator over the keys of the set, in order.
    ///
    /// The iterator is a lock-free walk of the bottom level; it skips
    /// tombstoned nodes and yields owned keys.
    ///
    /// # Examples
    ///
    /// ```
    /// use membership_collections::skiplist::SkipList;
    ///
    /// let list = SkipList::new(100);
    ///
    /// list.insert(2);
    /// list.insert(1);
    ///
    /// assert_eq!(list.iter().collect::<Vec<u32>>(), vec![1, 2]);
    /// ```
    pub fn iter(&self) -> SkipListIter<K> {
        let guard = epoch::pin();
        let current = {
            let head = self.head.load(Ordering::Acquire, &guard);
            unsafe { head.deref().get_next(0, &guard).as_raw() }
        };
        SkipListIter {
            guard,
            current,
            _marker: PhantomData,
        }
    }
}

impl<K> Drop for SkipList<K> {
    fn drop(&mut self) {
        unsafe {
            let guard = epoch::unprotected();
            let mut current = self.head.load(Ordering::Relaxed, guard);
            while !current.is_null() {
                let next = current.deref().get_next(0, guard);
                drop(current.into_owned());
                current = next;
            }
        }
    }
}

/// An iterator for `SkipList<K>`.
///
/// This iterator traverses the bottom level of the list and yields keys in
/// order, skipping tombstoned nodes.
pub struct SkipListIter<'a, K: 'a> {
    guard: Guard,
    current: *const Node<K>,
    _marker: PhantomData<&'a SkipList<K>>,
}

impl<'a, K: 'a + Ord + Clone> Iterator for SkipListIter<'a, K> {
    type Item = K;

    fn next(&mut self) -> Option<K> {
        unsafe {
            loop {
                let node = &*self.current;
                match node.key {
                    NodeKey::PosInf => return None,
                    NodeKey::NegInf => {},
                    NodeKey::Value(ref value) => {
                        if !node.is_marked() {
                            let key = value.clone();
                            self.current = node.get_next(0, &self.guard).as_raw();
                            return Some(key);
                        }
                    },
                }
                self.current = node.get_next(0, &self.guard).as_raw();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::SkipList;

    #[test]
    fn test_len_empty() {
        let list: SkipList<u32> = SkipList::new(100);
        assert_eq!(list.len(), 0);
        assert!(list.is_empty());
    }

    #[test]
    fn test_insert_contains() {
        let list = SkipList::new(100);

        assert!(list.insert(1));
        assert!(list.insert(2));
        assert!(!list.insert(1));

        assert!(list.contains(&1));
        assert!(list.contains(&2));
        assert!(!list.contains(&3));
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn test_remove() {
        let list = SkipList::new(100);

        list.insert(1);
        assert!(list.remove(&1));
        assert!(!list.contains(&1));
        assert!(!list.remove(&1));
        assert_eq!(list.len(), 0);
    }

    #[test]
    fn test_reinsert_after_remove() {
        let list = SkipList::new(100);

        list.insert(1);
        list.remove(&1);
        assert!(list.insert(1));
        assert!(list.contains(&1));
    }

    #[test]
    fn test_range() {
        let list = SkipList::new(100);

        for key in &[1, 3, 5, 7, 9] {
            list.insert(*key);
        }

        assert_eq!(list.range(&2, &8), vec![3, 5, 7]);
        assert_eq!(list.range(&1, &9), vec![1, 3, 5, 7, 9]);
        assert_eq!(list.range(&4, &4), vec![]);
        assert_eq!(list.range(&5, &5), vec![5]);
        assert_eq!(list.range(&8, &2), vec![]);
    }

    #[test]
    fn test_iter_sorted() {
        let list = SkipList::new(100);

        for key in &[5, 1, 9, 3, 7] {
            list.insert(*key);
        }

        assert_eq!(list.iter().collect::<Vec<u32>>(), vec![1, 3, 5, 7, 9]);
    }

    #[test]
    fn test_single_level_list() {
        let list = SkipList::new(1);

        assert!(list.insert(1));
        assert!(list.insert(2));
        assert!(list.contains(&1));
        assert!(list.remove(&2));
        assert!(!list.contains(&2));
    }

    #[test]
    #[should_panic]
    fn test_zero_max_elements() {
        let _list: SkipList<u32> = SkipList::new(0);
    }
}
