//! Bounded per-key history.
//!
//! Each key owns an ordered sequence of at most `capacity` values, oldest
//! first. Re-adding a value moves it to the newest position instead of
//! duplicating it; once the sequence exceeds capacity the oldest value is
//! evicted. Capacities are small, so linear scans are fine.
//!
//! ## Example
//!
//! ```rust,ignore
//! use recomenda_engine::history::BoundedHistoryStore;
//!
//! let mut store = BoundedHistoryStore::new(3);
//! for v in ["A", "B", "C", "D"] {
//!     store.add("u1", v);
//! }
//! assert_eq!(store.get(&"u1"), vec!["B", "C", "D"]);
//! ```

use crate::orchestrator::Recommendation;
use recomenda_core::{ItemId, UserId};
use std::collections::{HashMap, VecDeque};
use std::hash::Hash;
use tracing::debug;

/// Default number of entries kept per key.
pub const DEFAULT_HISTORY_CAPACITY: usize = 5;

/// Fixed-capacity, insertion-ordered sequences keyed by `K`.
#[derive(Debug, Clone)]
pub struct BoundedHistoryStore<K, V> {
    capacity: usize,
    entries: HashMap<K, VecDeque<V>>,
}

impl<K, V> Default for BoundedHistoryStore<K, V>
where
    K: Eq + Hash,
    V: PartialEq + Clone,
{
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

impl<K, V> BoundedHistoryStore<K, V>
where
    K: Eq + Hash,
    V: PartialEq + Clone,
{
    /// Creates a store. A capacity of 0 is raised to 1.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: HashMap::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Appends `value` as the newest entry for `key`.
    ///
    /// An existing occurrence is removed first. Returns the evicted value
    /// when the sequence overflowed.
    pub fn add(&mut self, key: K, value: V) -> Option<V> {
        let capacity = self.capacity;
        let seq = self.entries.entry(key).or_default();

        if let Some(pos) = seq.iter().position(|v| *v == value) {
            seq.remove(pos);
        }
        seq.push_back(value);

        let mut evicted = None;
        while seq.len() > capacity {
            evicted = seq.pop_front();
        }
        evicted
    }

    /// Values for `key`, oldest to newest. Unknown keys give an empty list.
    pub fn get(&self, key: &K) -> Vec<V> {
        self.iter(key).cloned().collect()
    }

    /// Iterates values for `key`, oldest to newest.
    pub fn iter(&self, key: &K) -> impl Iterator<Item = &V> {
        self.entries.get(key).into_iter().flat_map(|seq| seq.iter())
    }

    /// Returns true if `value` is in the sequence for `key`.
    pub fn search(&self, key: &K, value: &V) -> bool {
        self.entries
            .get(key)
            .is_some_and(|seq| seq.iter().any(|v| v == value))
    }

    /// The newest value for `key`.
    pub fn last(&self, key: &K) -> Option<&V> {
        self.entries.get(key).and_then(|seq| seq.back())
    }

    /// Removes `value` from the sequence for `key`. Returns true if found.
    pub fn remove(&mut self, key: &K, value: &V) -> bool {
        let Some(seq) = self.entries.get_mut(key) else {
            return false;
        };
        match seq.iter().position(|v| v == value) {
            Some(pos) => {
                seq.remove(pos);
                true
            }
            None => false,
        }
    }

    /// Drops every value for `key`.
    pub fn clear(&mut self, key: &K) {
        self.entries.remove(key);
    }

    /// Number of values held for `key`.
    pub fn len(&self, key: &K) -> usize {
        self.entries.get(key).map_or(0, VecDeque::len)
    }

    /// Number of keys with at least one value.
    pub fn key_count(&self) -> usize {
        self.entries.values().filter(|seq| !seq.is_empty()).count()
    }
}

/// Recent recommendations per user.
#[derive(Debug, Clone, Default)]
pub struct RecommendationHistory {
    store: BoundedHistoryStore<UserId, ItemId>,
}

impl RecommendationHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            store: BoundedHistoryStore::new(capacity),
        }
    }

    pub fn capacity(&self) -> usize {
        self.store.capacity()
    }

    /// Records one recommended item for `user`.
    pub fn add_recommendation(&mut self, user: &UserId, item: &ItemId) {
        if let Some(evicted) = self.store.add(user.clone(), item.clone()) {
            debug!(user = %user, item = %evicted, "evicted oldest history entry");
        }
    }

    /// Records every item of a recommendation, in rank order.
    pub fn record(&mut self, recommendation: &Recommendation) {
        for item in &recommendation.items {
            self.add_recommendation(&recommendation.user_id, item);
        }
    }

    /// History for `user`, oldest first.
    pub fn get_history(&self, user: &UserId) -> Vec<ItemId> {
        self.store.get(user)
    }

    pub fn contains(&self, user: &UserId, item: &ItemId) -> bool {
        self.store.search(user, item)
    }

    pub fn last(&self, user: &UserId) -> Option<&ItemId> {
        self.store.last(user)
    }

    pub fn remove(&mut self, user: &UserId, item: &ItemId) -> bool {
        self.store.remove(user, item)
    }

    pub fn clear(&mut self, user: &UserId) {
        self.store.clear(user);
    }

    /// Renders the history as `A -> B -> C`, oldest first.
    pub fn render(&self, user: &UserId) -> String {
        self.store
            .iter(user)
            .map(ItemId::as_str)
            .collect::<Vec<_>>()
            .join(" -> ")
    }
}
