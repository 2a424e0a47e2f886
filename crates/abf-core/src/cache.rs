//! Bounded, time-expiring, LRU-ordered lookup cache.
//!
//! Grounds on the classic hashmap + intrusive doubly-linked-list LRU shape
//! (as in many of the pack's cache crates), but keeps everything safe: nodes
//! live in a `Vec` arena addressed by index instead of raw pointers, and a
//! free list recycles slots vacated by eviction or expiry.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Mutex;
use std::time::{Duration, Instant};

struct Node<K, V> {
    key: K,
    value: V,
    inserted_at: Instant,
    prev: Option<usize>,
    next: Option<usize>,
}

struct Inner<K, V> {
    capacity: usize,
    ttl: Duration,
    nodes: Vec<Option<Node<K, V>>>,
    free: Vec<usize>,
    index: HashMap<K, usize>,
    head: Option<usize>, // most-recently-used
    tail: Option<usize>, // least-recently-used
}

impl<K, V> Inner<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// All indices reachable from `index`, `head`/`tail` or the linked list
    /// always point at an occupied slot; this only fails on an internal bug.
    fn node(&self, idx: usize) -> &Node<K, V> {
        match self.nodes[idx].as_ref() {
            Some(n) => n,
            None => unreachable!("lookup cache arena slot {idx} is vacant"),
        }
    }

    fn node_mut(&mut self, idx: usize) -> &mut Node<K, V> {
        match self.nodes[idx].as_mut() {
            Some(n) => n,
            None => unreachable!("lookup cache arena slot {idx} is vacant"),
        }
    }

    fn unlink(&mut self, idx: usize) {
        let (prev, next) = {
            let node = self.node(idx);
            (node.prev, node.next)
        };
        match prev {
            Some(p) => self.node_mut(p).next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => self.node_mut(n).prev = prev,
            None => self.tail = prev,
        }
    }

    fn push_front(&mut self, idx: usize) {
        let old_head = self.head;
        {
            let node = self.node_mut(idx);
            node.prev = None;
            node.next = old_head;
        }
        if let Some(h) = old_head {
            self.node_mut(h).prev = Some(idx);
        }
        self.head = Some(idx);
        if self.tail.is_none() {
            self.tail = Some(idx);
        }
    }

    fn evict_tail(&mut self) {
        if let Some(t) = self.tail {
            self.unlink(t);
            if let Some(node) = self.nodes[t].take() {
                self.index.remove(&node.key);
            }
            self.free.push(t);
        }
    }

    fn remove_slot(&mut self, idx: usize, key: &K) {
        self.unlink(idx);
        self.nodes[idx] = None;
        self.free.push(idx);
        self.index.remove(key);
    }

    fn alloc(&mut self, node: Node<K, V>) -> usize {
        if let Some(idx) = self.free.pop() {
            self.nodes[idx] = Some(node);
            idx
        } else {
            self.nodes.push(Some(node));
            self.nodes.len() - 1
        }
    }
}

/// A fixed-capacity, time-expiring, LRU-ordered cache.
///
/// All operations are serialised by a single internal mutex, per §4.3.
pub struct LookupCache<K, V> {
    inner: Mutex<Inner<K, V>>,
}

impl<K, V> LookupCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            inner: Mutex::new(Inner {
                capacity: capacity.max(1),
                ttl,
                nodes: Vec::new(),
                free: Vec::new(),
                index: HashMap::new(),
                head: None,
                tail: None,
            }),
        }
    }

    /// Returns the entry if present and fresh; promotes it to most-recent as
    /// a side effect. A stale entry (age >= ttl) is removed and reported as
    /// absent.
    pub fn get_at(&self, key: &K, now: Instant) -> Option<V> {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let idx = *inner.index.get(key)?;

        let stale = now.saturating_duration_since(inner.node(idx).inserted_at) >= inner.ttl;

        if stale {
            inner.remove_slot(idx, key);
            return None;
        }

        inner.unlink(idx);
        inner.push_front(idx);
        Some(inner.node(idx).value.clone())
    }

    pub fn get(&self, key: &K, clock: &dyn crate::clock::Clock) -> Option<V> {
        self.get_at(key, clock.now())
    }

    /// Insert or refresh `key`. Returns `true` if the key already existed.
    pub fn set_at(&self, key: K, value: V, now: Instant) -> bool {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());

        if let Some(&idx) = inner.index.get(&key) {
            inner.unlink(idx);
            {
                let node = inner.node_mut(idx);
                node.value = value;
                node.inserted_at = now;
            }
            inner.push_front(idx);
            return true;
        }

        let node = Node {
            key: key.clone(),
            value,
            inserted_at: now,
            prev: None,
            next: None,
        };
        let idx = inner.alloc(node);
        inner.index.insert(key, idx);
        inner.push_front(idx);

        if inner.index.len() > inner.capacity {
            inner.evict_tail();
        }

        false
    }

    pub fn set(&self, key: K, value: V, clock: &dyn crate::clock::Clock) -> bool {
        self.set_at(key, value, clock.now())
    }

    pub fn clear(&self) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.nodes.clear();
        inner.free.clear();
        inner.index.clear();
        inner.head = None;
        inner.tail = None;
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
