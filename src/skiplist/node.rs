use epoch::{Atomic, Guard, Shared};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

/// A node key, ordered below every value by `NegInf` and above every value
/// by `PosInf`. The head and tail sentinels carry the infinities so that
/// traversals never run off either end of a level.
pub enum NodeKey<K> {
    NegInf,
    Value(K),
    PosInf,
}

/// A node in the concurrent skip list.
///
/// A node participates in levels `0..=top_level`, fixed at creation. The
/// `fully_linked` flag is set once after every forward pointer is in place
/// and is the publication point of an insertion; the `marked` flag is the
/// logical tombstone of a removal. Both use acquire/release ordering so
/// publication and tombstoning are visible across threads without the node
/// lock. The lock serializes structural changes to the node's outgoing
/// pointers.
pub struct Node<K> {
    pub key: NodeKey<K>,
    pub lock: Mutex<()>,
    next: Vec<Atomic<Node<K>>>,
    marked: AtomicBool,
    fully_linked: AtomicBool,
    top_level: usize,
}

impl<K> Node<K> {
    pub fn new(key: NodeKey<K>, top_level: usize) -> Self {
        Node {
            key,
            lock: Mutex::new(()),
            next: (0..top_level + 1).map(|_| Atomic::null()).collect(),
            marked: AtomicBool::new(false),
            fully_linked: AtomicBool::new(false),
            top_level,
        }
    }

    pub fn get_next<'g>(&self, level: usize, guard: &'g Guard) -> Shared<'g, Node<K>> {
        self.next[level].load(Ordering::Acquire, guard)
    }

    pub fn set_next(&self, level: usize, node: Shared<Node<K>>) {
        self.next[level].store(node, Ordering::Release);
    }

    pub fn is_marked(&self) -> bool {
        self.marked.load(Ordering::Acquire)
    }

    pub fn set_marked(&self) {
        self.marked.store(true, Ordering::Release);
    }

    pub fn is_fully_linked(&self) -> bool {
        self.fully_linked.load(Ordering::Acquire)
    }

    pub fn set_fully_linked(&self) {
        self.fully_linked.store(true, Ordering::Release);
    }

    pub fn top_level(&self) -> usize {
        self.top_level
    }
}

impl<K: Ord> Node<K> {
    pub fn key_lt(&self, key: &K) -> bool {
        match self.key {
            NodeKey::NegInf => true,
            NodeKey::Value(ref value) => value < key,
            NodeKey::PosInf => false,
        }
    }

    pub fn key_le(&self, key: &K) -> bool {
        match self.key {
            NodeKey::NegInf => true,
            NodeKey::Value(ref value) => value <= key,
            NodeKey::PosInf => false,
        }
    }

    pub fn key_eq(&self, key: &K) -> bool {
        match self.key {
            NodeKey::Value(ref value) => value == key,
            _ => false,
        }
    }
}
