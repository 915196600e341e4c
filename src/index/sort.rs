//! Heap sort and duplicate collapse over the parallel index arrays
//!
//! Order: ascending key; for equal keys the larger slot comes first.
//! Collapse keeps the first entry of every run, i.e. the largest slot.

/// `a` orders after `b`
#[inline]
fn after(keys: &[u64], slots: &[u32], a: usize, b: usize) -> bool {
    keys[a] > keys[b] || (keys[a] == keys[b] && slots[a] < slots[b])
}

#[inline]
fn swap(keys: &mut [u64], slots: &mut [u32], a: usize, b: usize) {
    keys.swap(a, b);
    slots.swap(a, b);
}

/// Sift `root` down a max-heap occupying `0..end`
fn sift_down(keys: &mut [u64], slots: &mut [u32], mut root: usize, end: usize) {
    loop {
        let mut child = 2 * root + 1;
        if child >= end {
            break;
        }
        if child + 1 < end && after(keys, slots, child + 1, child) {
            child += 1;
        }
        if !after(keys, slots, child, root) {
            break;
        }
        swap(keys, slots, root, child);
        root = child;
    }
}

/// Sort both arrays in place, in lockstep
///
/// In-place with no extra memory, which matters at tens of millions of
/// entries.
pub fn heap_sort(keys: &mut [u64], slots: &mut [u32]) {
    assert_eq!(keys.len(), slots.len(), "index arrays out of step");
    let n = keys.len();
    if n < 2 {
        return;
    }

    for root in (0..n / 2).rev() {
        sift_down(keys, slots, root, n);
    }
    for end in (1..n).rev() {
        swap(keys, slots, 0, end);
        sift_down(keys, slots, 0, end);
    }
}

/// Counters from one collapse pass
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CollapseStats {
    /// Entries kept
    pub kept: usize,
    /// Entries dropped because an earlier entry had the same key
    pub duplicates: usize,
    /// Entries dropped because `keep_slot` rejected their slot
    pub rejected: usize,
}

/// Compact sorted arrays so each key appears once, keeping the first
/// entry of every run. Entries whose slot fails `keep_slot` are skipped
/// before duplicate detection. Returns the compacted length in `kept`;
/// the arrays are not truncated.
pub fn collapse_duplicates<F>(keys: &mut [u64], slots: &mut [u32], keep_slot: F) -> CollapseStats
where
    F: Fn(u32) -> bool,
{
    let mut stats = CollapseStats::default();
    let mut write = 0usize;

    for read in 0..keys.len() {
        if !keep_slot(slots[read]) {
            stats.rejected += 1;
            continue;
        }
        if write > 0 && keys[write - 1] == keys[read] {
            stats.duplicates += 1;
            continue;
        }
        keys[write] = keys[read];
        slots[write] = slots[read];
        write += 1;
    }

    stats.kept = write;
    stats
}
