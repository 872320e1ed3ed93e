//! Insertion-ordered key set with an optional capacity bound

use std::collections::{HashSet, VecDeque};
use std::hash::Hash;

/// Tracks keys in the order they were first inserted.
///
/// With a capacity, inserting a novel key into a full set evicts the oldest
/// inserted key first. Membership checks never change the eviction order.
#[derive(Debug, Clone)]
pub struct SeenSet<K> {
    keys: HashSet<K>,
    order: VecDeque<K>,
    capacity: Option<usize>,
}

impl<K: Hash + Eq + Clone> SeenSet<K> {
    /// Create a set that grows without bound
    pub fn unbounded() -> Self {
        Self::with_capacity(None)
    }

    /// Create a set holding at most `capacity` keys when `Some`.
    ///
    /// A capacity of 0 is raised to 1: the key just inserted is always
    /// tracked.
    pub fn with_capacity(capacity: Option<usize>) -> Self {
        Self {
            keys: HashSet::new(),
            order: VecDeque::new(),
            capacity: capacity.map(|max| max.max(1)),
        }
    }

    /// Record `key`, returning `true` if it was not already tracked
    pub fn insert(&mut self, key: K) -> bool {
        if self.keys.contains(&key) {
            return false;
        }

        if let Some(capacity) = self.capacity {
            while self.keys.len() >= capacity {
                let Some(oldest) = self.order.pop_front() else {
                    break;
                };
                self.keys.remove(&oldest);
            }
        }

        self.order.push_back(key.clone());
        self.keys.insert(key);
        true
    }

    /// Whether `key` is currently tracked
    pub fn contains(&self, key: &K) -> bool {
        self.keys.contains(key)
    }

    /// Number of tracked keys
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether no keys are tracked
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// The configured bound
    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unbounded_keeps_everything() {
        let mut seen = SeenSet::unbounded();
        assert!(seen.insert(1));
        assert!(seen.insert(2));
        assert!(!seen.insert(1));
        assert_eq!(seen.len(), 2);
        assert_eq!(seen.capacity(), None);
    }

    #[test]
    fn test_evicts_oldest_inserted() {
        let mut seen = SeenSet::with_capacity(Some(2));
        assert!(seen.insert("a"));
        assert!(seen.insert("b"));
        assert!(seen.insert("c"));

        assert_eq!(seen.len(), 2);
        assert!(!seen.contains(&"a"));
        assert!(seen.contains(&"b"));
        assert!(seen.contains(&"c"));
    }

    #[test]
    fn test_lookups_do_not_refresh_order() {
        let mut seen = SeenSet::with_capacity(Some(2));
        seen.insert(1);
        seen.insert(2);
        // Repeated hit on 1 must not protect it from eviction
        assert!(!seen.insert(1));
        assert!(seen.insert(3));

        assert!(!seen.contains(&1));
        assert!(seen.contains(&2));
        assert!(seen.insert(1));
        assert!(!seen.contains(&2));
    }

    #[test]
    fn test_zero_capacity_tracks_one_key() {
        let mut seen = SeenSet::with_capacity(Some(0));
        assert_eq!(seen.capacity(), Some(1));

        assert!(seen.insert(1));
        assert!(seen.insert(2));
        assert_eq!(seen.len(), 1);
        assert!(seen.contains(&2));
    }

    #[test]
    fn test_never_exceeds_capacity() {
        let mut seen = SeenSet::with_capacity(Some(3));
        for key in 0..100 {
            seen.insert(key % 7);
            assert!(seen.len() <= 3);
        }
        assert!(!seen.is_empty());
    }
}
