//! # Recompute-on-change cell
//!
//! [`KeyedMemo`] holds a value derived from an input key and recomputes it
//! only when the key changes (by equality). The stream binding derives its
//! right-side query from the left-side key set through it.
//!
//! Every recomputation bumps a version counter.

/// A memoised value keyed by its input.
#[derive(Debug, Clone)]
pub struct KeyedMemo<K, V> {
    key: Option<K>,
    value: Option<V>,
    version: u64,
}

impl<K, V> Default for KeyedMemo<K, V> {
    fn default() -> Self {
        Self {
            key: None,
            value: None,
            version: 0,
        }
    }
}

impl<K: PartialEq, V> KeyedMemo<K, V> {
    /// Create an empty memo.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a new input key.
    ///
    /// Recomputes (and bumps the version) only if `key` differs from the
    /// current key. Returns `true` if the value was recomputed.
    pub fn update<F>(&mut self, key: K, compute: F) -> bool
    where
        F: FnOnce(&K) -> V,
    {
        if self.key.as_ref() == Some(&key) {
            return false;
        }
        self.value = Some(compute(&key));
        self.key = Some(key);
        self.version += 1;
        true
    }

    /// Current derived value, if any input has been fed.
    pub fn get(&self) -> Option<&V> {
        self.value.as_ref()
    }

    /// Current input key.
    pub fn key(&self) -> Option<&K> {
        self.key.as_ref()
    }

    /// Number of recomputations so far.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Forget the current key so the next update always recomputes.
    pub fn invalidate(&mut self) {
        self.key = None;
        self.value = None;
    }
}
