//! Index Module
//!
//! The in-memory sorted key index and the recovery pass that builds it.
//!
//! ## Responsibilities
//! - Load every key-log shard in parallel into disjoint array regions
//! - Heap-sort the combined records by key, larger slot first on ties
//! - Collapse each run of equal keys to its first entry
//! - Serve binary-search lookups and ordered iteration
//!
//! ## Layout
//! Two parallel arrays, 12 bytes per entry:
//! ```text
//! keys:  [k0 < k1 < k2 < ... < kn-1]   (u64)
//! slots: [s0,  s1,  s2,  ...,  sn-1]   (u32, slot within the key's block)
//! ```
//! Built once per open and read-only afterwards.

mod builder;
mod loader;
mod sort;
mod sorted;

pub use builder::{build_index, RecoveryReport};
pub use loader::{load_shards, LoadedRecords};
pub use sort::{collapse_duplicates, heap_sort, CollapseStats};
pub use sorted::{IndexIter, SortedIndex};
