//! # Keyed Join
//!
//! Left-outer join of two keyed collections. Every left entry produces
//! exactly one [`JoinedPair`]; right-only keys are dropped.

use serde::{Deserialize, Serialize};
use std::hash::Hash;

use crate::collection::KeyedCollection;

/// A left value with its optional right-side match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinedPair<L, R> {
    /// Left-side value (always present)
    pub left: L,
    /// Right-side value sharing the left key, if any
    pub right: Option<R>,
}

impl<L, R> JoinedPair<L, R> {
    /// Create a pair.
    pub fn new(left: L, right: Option<R>) -> Self {
        Self { left, right }
    }

    /// Check if the right side matched.
    pub fn is_matched(&self) -> bool {
        self.right.is_some()
    }
}

/// Left-join `left` with `right` on their shared keys.
///
/// The result has exactly `left.len()` entries in `left` insertion order.
/// Pure: neither input is modified.
pub fn left_join<K, L, R>(
    left: &KeyedCollection<K, L>,
    right: &KeyedCollection<K, R>,
) -> KeyedCollection<K, JoinedPair<L, R>>
where
    K: Eq + Hash + Clone,
    L: Clone,
    R: Clone,
{
    left.iter()
        .map(|(key, value)| {
            (
                key.clone(),
                JoinedPair::new(value.clone(), right.get(key).cloned()),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coll(entries: &[(&'static str, i32)]) -> KeyedCollection<&'static str, i32> {
        entries.iter().copied().collect()
    }

    #[test]
    fn test_left_join_matches_and_absences() {
        let left = coll(&[("p1", 100), ("p2", 50)]);
        let right = coll(&[("p1", 1), ("p3", 3)]);

        let joined = left_join(&left, &right);

        assert_eq!(joined.len(), 2);
        assert_eq!(joined.get(&"p1"), Some(&JoinedPair::new(100, Some(1))));
        assert_eq!(joined.get(&"p2"), Some(&JoinedPair::new(50, None)));
        assert!(!joined.contains(&"p3"));
    }

    #[test]
    fn test_empty_left_yields_empty() {
        let left = coll(&[]);
        let right = coll(&[("p1", 1), ("p2", 2)]);

        assert!(left_join(&left, &right).is_empty());
    }

    #[test]
    fn test_empty_right_yields_all_absent() {
        let left = coll(&[("p1", 1), ("p2", 2)]);
        let right = coll(&[]);

        let joined = left_join(&left, &right);
        assert!(joined.values().all(|pair| pair.right.is_none()));
        assert_eq!(joined.len(), 2);
    }

    #[test]
    fn test_result_follows_left_order() {
        let left = coll(&[("b", 2), ("a", 1), ("c", 3)]);
        let right = coll(&[("c", 30), ("a", 10)]);

        let keys: Vec<_> = left_join(&left, &right).keys().copied().collect();
        assert_eq!(keys, vec!["b", "a", "c"]);
    }
}

#[cfg(test)]
mod proptest_join {
    use super::*;
    use proptest::prelude::*;

    /// Strategy for small keyed collections over a shared key space so that
    /// left and right overlap often.
    fn arb_collection() -> impl Strategy<Value = KeyedCollection<u8, u32>> {
        prop::collection::vec((0u8..16, any::<u32>()), 0..24)
            .prop_map(|entries| entries.into_iter().collect())
    }

    proptest! {
        /// The join has exactly one entry per left key.
        #[test]
        fn join_preserves_left_membership(l in arb_collection(), r in arb_collection()) {
            let joined = left_join(&l, &r);
            prop_assert_eq!(joined.len(), l.len());
            for key in joined.keys() {
                prop_assert!(l.contains(key));
            }
        }

        /// The right side is R[k] when present and absent otherwise.
        #[test]
        fn join_attaches_right_when_present(l in arb_collection(), r in arb_collection()) {
            let joined = left_join(&l, &r);
            for (key, pair) in joined.iter() {
                prop_assert_eq!(Some(&pair.left), l.get(key));
                prop_assert_eq!(pair.right.as_ref(), r.get(key));
            }
        }

        /// Joining with an empty right side maps every left value to (v, absent).
        #[test]
        fn join_with_empty_right(l in arb_collection()) {
            let joined = left_join(&l, &KeyedCollection::<u8, u32>::new());
            let expected: KeyedCollection<u8, JoinedPair<u32, u32>> = l
                .iter()
                .map(|(k, v)| (*k, JoinedPair::new(*v, None)))
                .collect();
            prop_assert_eq!(joined, expected);
        }

        /// Joining an empty left side is empty for any right side.
        #[test]
        fn join_with_empty_left(r in arb_collection()) {
            prop_assert!(left_join(&KeyedCollection::<u8, u32>::new(), &r).is_empty());
        }

        /// Re-running the join on unchanged snapshots yields an equal result.
        #[test]
        fn join_is_idempotent(l in arb_collection(), r in arb_collection()) {
            let first = left_join(&l, &r);
            let second = left_join(&l, &r);
            prop_assert_eq!(first, second);
        }
    }
}
