//! Ordered buffer of items keyed by a sequence number
use alloc::collections::BTreeMap;
use core::fmt::Debug;

/// Error returned when inserting an item whose key is already present in the buffer.
///
/// The buffered item is left untouched: recorded history is never overwritten.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("sequence {0:?} is already buffered")]
pub struct DuplicateSequence<K: Debug>(pub K);

/// A buffer that contains items associated with a sequence key.
///
/// Items can arrive in any order; they are stored by key ascending and are only
/// removed when they are explicitly taken (or when the buffer is cleared).
/// Each key can be present at most once.
#[derive(Clone, Debug)]
pub struct SequenceBuffer<K, T> {
    items: BTreeMap<K, T>,
}

impl<K, T> Default for SequenceBuffer<K, T> {
    fn default() -> Self {
        Self {
            items: BTreeMap::new(),
        }
    }
}

impl<K: Ord + Copy + Debug, T> SequenceBuffer<K, T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `item` under `key`.
    ///
    /// Fails with [`DuplicateSequence`] if the key is already buffered, in which case
    /// the new item is dropped and the stored one is kept.
    pub fn insert(&mut self, key: K, item: T) -> Result<(), DuplicateSequence<K>> {
        if self.items.contains_key(&key) {
            return Err(DuplicateSequence(key));
        }
        self.items.insert(key, item);
        Ok(())
    }

    /// Remove and return the item for `key`, if it has arrived.
    pub fn try_take(&mut self, key: K) -> Option<T> {
        self.items.remove(&key)
    }

    /// Returns a reference to the item for `key` without removing it.
    pub fn get(&self, key: K) -> Option<&T> {
        self.items.get(&key)
    }

    pub fn contains(&self, key: K) -> bool {
        self.items.contains_key(&key)
    }

    /// Largest key currently buffered
    pub fn highest_sequence(&self) -> Option<K> {
        self.items.last_key_value().map(|(k, _)| *k)
    }

    /// Smallest buffered key that is strictly greater than `key`
    pub fn next_after(&self, key: K) -> Option<K> {
        use core::ops::Bound;
        self.items
            .range((Bound::Excluded(key), Bound::Unbounded))
            .next()
            .map(|(k, _)| *k)
    }

    /// Iterate over the buffered items in ascending key order
    pub fn iter(&self) -> impl Iterator<Item = (&K, &T)> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}
