//! a [SizedLru] is an Lru cache keyed by strings which evicts once the bytes it holds exceed a budget.
//!
//! Every entry is charged `key.len() + value.len()`, the latter coming from [SizedValue].  The running total is kept
//! incrementally on every insert, update, removal and eviction; it is never recomputed.
//!
//! This is implemented as a vec-backed doubly linked list of slots plus an auxiliary hash-based index from key to slot.
//! Slots freed by eviction or removal are chained into a free list and reused by later inserts, so the vec only grows
//! to the high-water mark of live entries.  The head of the list is the most recently used entry, the tail the least.
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use ahash::RandomState;
use tracing::{debug, trace, warn};

use crate::SizedValue;

/// Callback run once for every evicted entry, synchronously, from inside the call which caused the eviction.
pub type OnEvicted<V> = Box<dyn FnMut(&str, V) + Send>;

struct OccupiedSlot<V> {
    key: Arc<str>,
    value: V,
    prev: Option<usize>,
    next: Option<usize>,
}

struct EmptySlot {
    next_empty: Option<usize>,
}

enum Slot<V> {
    /// Free, possibly pointing at the next free slot.
    Empty(EmptySlot),
    /// Holds an entry, linked to its neighbours in recency order.
    Occupied(OccupiedSlot<V>),
}

impl<V> Slot<V> {
    fn as_occupied(&self) -> &OccupiedSlot<V> {
        match self {
            Self::Occupied(ref x) => x,
            Self::Empty(_) => panic!("Slot should be occupied"),
        }
    }

    fn as_occupied_mut(&mut self) -> &mut OccupiedSlot<V> {
        match self {
            Self::Occupied(ref mut x) => x,
            Self::Empty(_) => panic!("Slot should be occupied"),
        }
    }

    fn as_empty(&self) -> &EmptySlot {
        match self {
            Self::Empty(ref x) => x,
            Self::Occupied(_) => panic!("Slot should be empty"),
        }
    }
}

fn entry_cost<V: SizedValue>(key: &str, value: &V) -> u64 {
    key.len() as u64 + value.len() as u64
}

pub struct SizedLru<V> {
    slots: Vec<Slot<V>>,
    /// Points at the slot holding the key.
    index: HashMap<Arc<str>, usize, RandomState>,
    /// Zero disables eviction.
    max_bytes: u64,
    /// Bytes charged to the live entries.
    n_bytes: u64,
    /// Number of linked slots; must always agree with `index.len()`.
    len: usize,
    head: Option<usize>,
    tail: Option<usize>,
    empty_head: Option<usize>,
    on_evicted: Option<OnEvicted<V>>,
}

impl<V: SizedValue> SizedLru<V> {
    /// Build an empty cache which evicts once more than `max_bytes` are held.  A budget of 0 never evicts.
    pub fn new(max_bytes: u64) -> SizedLru<V> {
        SizedLru {
            slots: Default::default(),
            index: Default::default(),
            max_bytes,
            n_bytes: 0,
            len: 0,
            head: None,
            tail: None,
            empty_head: None,
            on_evicted: None,
        }
    }

    /// Like [SizedLru::new], but hand every evicted entry to `on_evicted`.
    ///
    /// The callback runs while the caller still holds whatever guards the cache, so it must not reach back into the
    /// same cache.
    pub fn with_on_evicted<F>(max_bytes: u64, on_evicted: F) -> SizedLru<V>
    where
        F: FnMut(&str, V) + Send + 'static,
    {
        let mut ret = Self::new(max_bytes);
        ret.on_evicted = Some(Box::new(on_evicted));
        ret
    }

    /// Take an occupied slot out of the list, patching up its neighbours and the ends.
    fn unlink_index(&mut self, index: usize) {
        let (prev, next) = {
            let e = self.slots[index].as_occupied_mut();
            let links = (e.prev, e.next);
            e.prev = None;
            e.next = None;
            links
        };

        match prev {
            Some(p) => self.slots[p].as_occupied_mut().next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => self.slots[n].as_occupied_mut().prev = prev,
            None => self.tail = prev,
        }
    }

    /// Link an occupied, currently unlinked slot in as the most recent entry.
    fn push_front(&mut self, index: usize) {
        let old_head = self.head;
        self.slots[index].as_occupied_mut().next = old_head;
        match old_head {
            Some(h) => self.slots[h].as_occupied_mut().prev = Some(index),
            // First entry in the list is both ends.
            None => self.tail = Some(index),
        }
        self.head = Some(index);
    }

    fn make_most_recent(&mut self, index: usize) {
        if self.head == Some(index) {
            return;
        }

        self.unlink_index(index);
        self.push_front(index);
    }

    /// Find an available empty slot, or make one if necessary.
    fn find_empty(&mut self) -> usize {
        if let Some(e) = self.empty_head {
            self.empty_head = self.slots[e].as_empty().next_empty;
            return e;
        }

        self.slots.push(Slot::Empty(EmptySlot { next_empty: None }));
        self.slots.len() - 1
    }

    /// Unlink an occupied slot and put it on the free list, returning what it held.
    ///
    /// The index is left alone; callers remove the key themselves.
    fn become_empty(&mut self, index: usize) -> (Arc<str>, V) {
        self.unlink_index(index);
        let old = std::mem::replace(
            &mut self.slots[index],
            Slot::Empty(EmptySlot {
                next_empty: self.empty_head,
            }),
        );
        self.empty_head = Some(index);

        match old {
            Slot::Occupied(OccupiedSlot { key, value, .. }) => {
                self.n_bytes -= entry_cost(&key, &value);
                self.len -= 1;
                (key, value)
            }
            Slot::Empty(_) => panic!("Should have been occupied"),
        }
    }

    /// Look up a key, making it the most recently used entry.
    ///
    /// The empty key is never found.
    pub fn get(&mut self, key: &str) -> Option<&V> {
        if key.is_empty() {
            return None;
        }

        let ind = *self.index.get(key)?;
        self.make_most_recent(ind);
        Some(&self.slots[ind].as_occupied().value)
    }

    /// Look up a key without touching its recency.
    pub fn peek(&self, key: &str) -> Option<&V> {
        if key.is_empty() {
            return None;
        }

        let ind = *self.index.get(key)?;
        Some(&self.slots[ind].as_occupied().value)
    }

    pub fn contains(&self, key: &str) -> bool {
        !key.is_empty() && self.index.contains_key(key)
    }

    /// Add or replace an entry, making it the most recently used, then evict until back under budget.
    ///
    /// Returns the replaced value if the key was already present.  A value too large for the budget on its own is
    /// still inserted, and is then evicted by the same pass that clears everything older than it.
    pub fn add(&mut self, key: &str, value: V) -> Option<V> {
        let new_len = value.len() as u64;

        let ret = if let Some(&ind) = self.index.get(key) {
            let slot = self.slots[ind].as_occupied_mut();
            let old = std::mem::replace(&mut slot.value, value);
            let old_len = old.len() as u64;
            self.n_bytes = self.n_bytes - old_len + new_len;
            trace!(key, old_len, new_len, n_bytes = self.n_bytes, "updated entry");

            self.make_most_recent(ind);
            Some(old)
        } else {
            if key.is_empty() {
                debug!("adding an entry under the empty key, which get will never return");
            }

            let key: Arc<str> = Arc::from(key);
            let ind = self.find_empty();
            self.slots[ind] = Slot::Occupied(OccupiedSlot {
                key: key.clone(),
                value,
                prev: None,
                next: None,
            });
            self.push_front(ind);
            self.index.insert(key.clone(), ind);
            self.len += 1;
            self.n_bytes += key.len() as u64 + new_len;
            trace!(key = %key, new_len, n_bytes = self.n_bytes, "added entry");
            None
        };

        self.maybe_evict();
        ret
    }

    /// Remove an entry outright.  This is not an eviction, so the callback does not run.
    pub fn remove(&mut self, key: &str) -> Option<V> {
        let ind = self.index.remove(key)?;
        let (_, value) = self.become_empty(ind);
        Some(value)
    }

    /// Evict the least recently used entry.  Returns false if there was nothing to evict.
    fn evict_oldest(&mut self) -> bool {
        let tail = match self.tail {
            Some(t) => t,
            None => return false,
        };

        let (key, value) = self.become_empty(tail);
        self.index.remove(&*key);
        debug!(
            key = %key,
            freed = entry_cost(&key, &value),
            n_bytes = self.n_bytes,
            "evicted entry"
        );

        if let Some(cb) = self.on_evicted.as_mut() {
            cb(&*key, value);
        }
        true
    }

    /// Run evictions until the held bytes fit the budget again.
    fn maybe_evict(&mut self) {
        while self.max_bytes != 0 && self.n_bytes > self.max_bytes {
            if !self.evict_oldest() {
                warn!(
                    n_bytes = self.n_bytes,
                    max_bytes = self.max_bytes,
                    "byte account over budget with no entries left to evict"
                );
                break;
            }
        }
    }

    /// Drop every entry without running the eviction callback.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.index.clear();
        self.n_bytes = 0;
        self.len = 0;
        self.head = None;
        self.tail = None;
        self.empty_head = None;
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Bytes currently charged to live entries.
    pub fn bytes(&self) -> u64 {
        self.n_bytes
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    /// Snapshot of the live keys, in no particular order.
    pub fn keys(&self) -> Vec<String> {
        self.index.keys().map(|k| k.to_string()).collect()
    }

    /// Iterator visiting entries in most-recently-used order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        let mut ind = self.head;
        std::iter::from_fn(move || {
            let next = ind?;
            let ret = self.slots[next].as_occupied();
            ind = ret.next;
            Some((&*ret.key, &ret.value))
        })
    }
}

impl<V> fmt::Debug for SizedLru<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SizedLru")
            .field("len", &self.len)
            .field("n_bytes", &self.n_bytes)
            .field("max_bytes", &self.max_bytes)
            .field("on_evicted", &self.on_evicted.is_some())
            .finish()
    }
}
