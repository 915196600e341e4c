//! Sorted Key Index
//!
//! Immutable `(key, slot)` arrays with binary-search lookup.

/// Read-only index snapshot produced by recovery
#[derive(Debug, Default, Clone)]
pub struct SortedIndex {
    /// Ascending, unique keys
    keys: Vec<u64>,
    /// Slot of `keys[i]` within its `(file, block)`
    slots: Vec<u32>,
}

impl SortedIndex {
    /// Wrap arrays that are already sorted ascending and unique
    pub(crate) fn from_sorted(mut keys: Vec<u64>, mut slots: Vec<u32>, len: usize) -> Self {
        keys.truncate(len);
        slots.truncate(len);
        keys.shrink_to_fit();
        slots.shrink_to_fit();
        debug_assert!(keys.windows(2).all(|w| w[0] < w[1]));
        Self { keys, slots }
    }

    /// An index with no entries
    pub fn empty() -> Self {
        Self::default()
    }

    /// Look up the slot of `key` — O(log n)
    pub fn find(&self, key: u64) -> Option<u32> {
        self.position(key).map(|i| self.slots[i])
    }

    /// Position of `key` in the index
    pub fn position(&self, key: u64) -> Option<usize> {
        self.keys.binary_search(&key).ok()
    }

    pub fn contains(&self, key: u64) -> bool {
        self.position(key).is_some()
    }

    /// Entry at position `i`
    pub fn get(&self, i: usize) -> Option<(u64, u32)> {
        Some((*self.keys.get(i)?, self.slots[i]))
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn keys(&self) -> &[u64] {
        &self.keys
    }

    pub fn slots(&self) -> &[u32] {
        &self.slots
    }

    /// Iterate entries in ascending key order
    pub fn iter(&self) -> IndexIter<'_> {
        IndexIter {
            index: self,
            pos: 0,
        }
    }
}

/// Ascending iterator over `(key, slot)` entries
pub struct IndexIter<'a> {
    index: &'a SortedIndex,
    pos: usize,
}

impl Iterator for IndexIter<'_> {
    type Item = (u64, u32);

    fn next(&mut self) -> Option<Self::Item> {
        let entry = self.index.get(self.pos)?;
        self.pos += 1;
        Some(entry)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let rest = self.index.len() - self.pos;
        (rest, Some(rest))
    }
}

impl ExactSizeIterator for IndexIter<'_> {}

impl<'a> IntoIterator for &'a SortedIndex {
    type Item = (u64, u32);
    type IntoIter = IndexIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
