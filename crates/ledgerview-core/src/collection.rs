//! # Keyed Collection
//!
//! A key-unique container for records correlated by join key.
//!
//! [`KeyedCollection`] mirrors a store snapshot indexed by one key:
//! - Exactly one value per key; inserting an existing key overwrites it
//! - Iteration follows first-insertion order, so joins are deterministic
//! - Building from a snapshot reports key collisions instead of failing
//!
//! ## Example
//!
//! ```rust,ignore
//! use ledgerview_core::collection::KeyedCollection;
//!
//! let bills = KeyedCollection::from_records::<Obligations>(&snapshot);
//! let bill = bills.get(&JoinKey::from("p1"));
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::hash::Hash;

use crate::record::{JoinKey, Record, RecordKind};

/// A key-unique collection with deterministic iteration order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyedCollection<K, V>
where
    K: Eq + Hash,
{
    items: IndexMap<K, V>,
}

impl<K, V> Default for KeyedCollection<K, V>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> KeyedCollection<K, V>
where
    K: Eq + Hash,
{
    /// Create an empty collection.
    pub fn new() -> Self {
        Self {
            items: IndexMap::new(),
        }
    }

    /// Create a collection with pre-allocated capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: IndexMap::with_capacity(capacity),
        }
    }

    /// Index values by a key function. Later values win on key collision;
    /// every collision is logged as a likely integrity issue.
    pub fn index_by<F>(values: impl IntoIterator<Item = V>, mut key: F) -> Self
    where
        F: FnMut(&V) -> K,
        K: std::fmt::Debug,
    {
        let values = values.into_iter();
        let mut collection = Self::with_capacity(values.size_hint().0);
        for value in values {
            let k = key(&value);
            if collection.contains(&k) {
                tracing::warn!(key = ?k, "Key collision in keyed collection, last value wins");
            }
            collection.insert(k, value);
        }
        collection
    }

    // ─── Queries ─────────────────────────────────────────────

    /// Get a value by key.
    pub fn get(&self, key: &K) -> Option<&V> {
        self.items.get(key)
    }

    /// Check if a key exists.
    pub fn contains(&self, key: &K) -> bool {
        self.items.contains_key(key)
    }

    /// Iterate over (key, value) pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.items.iter()
    }

    /// Iterate over keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.items.keys()
    }

    /// Iterate over values in insertion order.
    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.items.values()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if the collection is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    // ─── Mutations ───────────────────────────────────────────

    /// Insert or overwrite a value. Returns the previous value if the key
    /// was already present; the key keeps its original position.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        self.items.insert(key, value)
    }

    /// Consume the collection, yielding values in insertion order.
    pub fn into_values(self) -> impl Iterator<Item = V> {
        self.items.into_values()
    }
}

impl<P> KeyedCollection<JoinKey, Record<P>> {
    /// Index a store snapshot by the join key of kind `K`.
    pub fn from_records<K>(records: &[Record<P>]) -> Self
    where
        K: RecordKind<Payload = P>,
        P: Clone,
    {
        Self::index_by(records.iter().cloned(), |record| {
            K::join_key(&record.payload)
        })
    }
}

// ─── Conversion Traits ───────────────────────────────────────

impl<K, V> FromIterator<(K, V)> for KeyedCollection<K, V>
where
    K: Eq + Hash,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

impl<K, V> IntoIterator for KeyedCollection<K, V>
where
    K: Eq + Hash,
{
    type Item = (K, V);
    type IntoIter = indexmap::map::IntoIter<K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a, K, V> IntoIterator for &'a KeyedCollection<K, V>
where
    K: Eq + Hash,
{
    type Item = (&'a K, &'a V);
    type IntoIter = indexmap::map::Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

// ─── Tests ───────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_and_default() {
        let coll1: KeyedCollection<String, i32> = KeyedCollection::new();
        let coll2: KeyedCollection<String, i32> = KeyedCollection::default();

        assert!(coll1.is_empty());
        assert!(coll2.is_empty());
        assert_eq!(coll1.len(), 0);
    }

    #[test]
    fn test_insert_overwrites_and_returns_previous() {
        let mut coll: KeyedCollection<String, i32> = KeyedCollection::new();

        assert!(coll.insert("a".to_string(), 1).is_none());
        assert_eq!(coll.insert("a".to_string(), 10), Some(1));
        assert_eq!(coll.get(&"a".to_string()), Some(&10));
        assert_eq!(coll.len(), 1);
    }

    #[test]
    fn test_iteration_follows_first_insertion_order() {
        let mut coll: KeyedCollection<&str, i32> = KeyedCollection::new();
        coll.insert("c", 3);
        coll.insert("a", 1);
        coll.insert("b", 2);
        coll.insert("c", 30);

        let keys: Vec<_> = coll.keys().copied().collect();
        assert_eq!(keys, vec!["c", "a", "b"]);
        let values: Vec<_> = coll.values().copied().collect();
        assert_eq!(values, vec![30, 1, 2]);
    }

    #[test]
    fn test_index_by_last_value_wins() {
        let coll = KeyedCollection::index_by(vec![("p1", 1), ("p2", 2), ("p1", 3)], |v| v.0);

        assert_eq!(coll.len(), 2);
        assert_eq!(coll.get(&"p1"), Some(&("p1", 3)));
    }

    #[test]
    fn test_from_iter_and_into_iter() {
        let coll: KeyedCollection<String, i32> =
            vec![("a".to_string(), 1), ("b".to_string(), 2)].into_iter().collect();

        let pairs: Vec<_> = coll.into_iter().collect();
        assert_eq!(pairs, vec![("a".to_string(), 1), ("b".to_string(), 2)]);
    }

    #[test]
    fn test_serde_roundtrip_preserves_order() {
        let mut coll: KeyedCollection<String, i32> = KeyedCollection::new();
        coll.insert("z".to_string(), 1);
        coll.insert("a".to_string(), 2);

        let json = serde_json::to_string(&coll).unwrap();
        let restored: KeyedCollection<String, i32> = serde_json::from_str(&json).unwrap();

        assert_eq!(restored, coll);
        let keys: Vec<_> = restored.keys().cloned().collect();
        assert_eq!(keys, vec!["z".to_string(), "a".to_string()]);
    }
}
