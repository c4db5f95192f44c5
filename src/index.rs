//! Frozen mapping between entity IDs and dense matrix indices.

use crate::prelude::*;

/// Bijection between 64-bit entity IDs and `0..len()`.
///
/// Indices are assigned in the order of the first appearance and never change afterwards.
#[derive(Clone, Debug, Default)]
pub struct KeyIndex {
    keys: Vec<i64>,
    indices: AHashMap<i64, usize>,
}

impl KeyIndex {
    /// Builds the index, duplicate keys are collapsed onto their first index.
    pub fn from_keys(keys: impl IntoIterator<Item = i64>) -> Self {
        let mut index = Self::default();
        for key in keys {
            index.indices.entry(key).or_insert_with(|| {
                index.keys.push(key);
                index.keys.len() - 1
            });
        }
        index
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    #[must_use]
    #[inline]
    pub fn index_of(&self, key: i64) -> Option<usize> {
        self.indices.get(&key).copied()
    }

    #[must_use]
    #[inline]
    pub fn key_at(&self, index: usize) -> Option<i64> {
        self.keys.get(index).copied()
    }

    pub fn keys(&self) -> impl Iterator<Item = i64> + '_ {
        self.keys.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_keys_ok() {
        let index = KeyIndex::from_keys([42, 7, 42, 13, 7]);
        assert_eq!(index.len(), 3);
        assert_eq!(index.index_of(42), Some(0));
        assert_eq!(index.index_of(7), Some(1));
        assert_eq!(index.index_of(13), Some(2));
        assert_eq!(index.index_of(100), None);
    }

    #[test]
    fn round_trip_ok() {
        let index = KeyIndex::from_keys([5, -3, 9]);
        for key in index.keys() {
            assert_eq!(index.key_at(index.index_of(key).unwrap()), Some(key));
        }
        assert_eq!(index.key_at(3), None);
    }
}
