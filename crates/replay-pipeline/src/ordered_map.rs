// SPDX-License-Identifier: Apache-2.0

//! Insertion-ordered map used by the pending-grant set and the batch
//! registry. Both the eviction sweep and the end-of-stream flush depend on
//! iteration following insertion order; this makes that contract explicit
//! instead of leaning on incidental hash-map behavior.

use hashbrown::HashMap;
use std::hash::Hash;

/// Hash map that iterates in insertion order. Overwriting an existing key
/// keeps its original position; removal is O(n) over the key list, which is
/// fine at the pending-set and label-batch cardinalities seen here.
#[derive(Debug, Clone)]
pub struct OrderedMap<K, V> {
    keys: Vec<K>,
    map: HashMap<K, V>,
}

impl<K, V> OrderedMap<K, V>
where
    K: Eq + Hash + Clone,
{
    #[must_use]
    pub fn new() -> Self {
        OrderedMap {
            keys: Vec::new(),
            map: HashMap::new(),
        }
    }

    /// Inserts a value, returning the previous one if the key was present.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        let old = self.map.insert(key.clone(), value);
        if old.is_none() {
            self.keys.push(key);
        }
        old
    }

    #[must_use]
    pub fn get(&self, key: &K) -> Option<&V> {
        self.map.get(key)
    }

    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        self.map.get_mut(key)
    }

    #[must_use]
    pub fn contains_key(&self, key: &K) -> bool {
        self.map.contains_key(key)
    }

    pub fn remove(&mut self, key: &K) -> Option<V> {
        let removed = self.map.remove(key);
        if removed.is_some() {
            self.keys.retain(|k| k != key);
        }
        removed
    }

    /// Iterates entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.keys
            .iter()
            .filter_map(|k| self.map.get(k).map(|v| (k, v)))
    }

    /// Removes and returns all entries in insertion order.
    pub fn drain(&mut self) -> Vec<(K, V)> {
        let mut entries = Vec::with_capacity(self.keys.len());
        for key in self.keys.drain(..) {
            if let Some(value) = self.map.remove(&key) {
                entries.push((key, value));
            }
        }
        entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl<K, V> Default for OrderedMap<K, V>
where
    K: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iterates_in_insertion_order() {
        let mut map = OrderedMap::new();
        map.insert("c", 3);
        map.insert("a", 1);
        map.insert("b", 2);
        let keys: Vec<_> = map.iter().map(|(k, _)| *k).collect();
        assert_eq!(keys, vec!["c", "a", "b"]);
    }

    #[test]
    fn overwrite_keeps_original_position() {
        let mut map = OrderedMap::new();
        map.insert("a", 1);
        map.insert("b", 2);
        let old = map.insert("a", 10);
        assert_eq!(old, Some(1));
        let entries: Vec<_> = map.iter().map(|(k, v)| (*k, *v)).collect();
        assert_eq!(entries, vec![("a", 10), ("b", 2)]);
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn remove_preserves_order_of_rest() {
        let mut map = OrderedMap::new();
        map.insert(1, "one");
        map.insert(2, "two");
        map.insert(3, "three");
        assert_eq!(map.remove(&2), Some("two"));
        assert_eq!(map.remove(&2), None);
        let keys: Vec<_> = map.iter().map(|(k, _)| *k).collect();
        assert_eq!(keys, vec![1, 3]);
    }

    #[test]
    fn drain_empties_in_order() {
        let mut map = OrderedMap::new();
        map.insert("x", 1);
        map.insert("y", 2);
        let drained = map.drain();
        assert_eq!(drained, vec![("x", 1), ("y", 2)]);
        assert!(map.is_empty());
    }
}
