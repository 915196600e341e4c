//! Index Builder
//!
//! Runs once per open: load all shards, sort, collapse duplicates.

use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::error::{Result, SlotError};
use crate::keylog::KeyLogSet;

use super::{collapse_duplicates, heap_sort, load_shards, SortedIndex};

/// What recovery found and how long it took
#[derive(Debug, Clone, Default)]
pub struct RecoveryReport {
    /// Shards that held at least one record
    pub shards_loaded: usize,

    /// Records read across all shards
    pub records_read: u64,

    /// Records hidden by another record of the same key
    pub duplicates_collapsed: u64,

    /// Records dropped because their slot lies outside the layout
    pub records_dropped: u64,

    /// Bytes cut from torn key-log tails
    pub torn_bytes: u64,

    /// Entries in the resulting index
    pub index_len: usize,

    /// Time spent loading shards
    pub load_time: Duration,

    /// Time spent sorting
    pub sort_time: Duration,

    /// Time spent collapsing duplicates
    pub collapse_time: Duration,
}

/// Build the sorted index from the key logs
///
/// Records whose slot is not below `slots_per_block` are dropped. Fails
/// with `KeyCapacity` when the logs already hold more than `max_keys`
/// records.
pub fn build_index(
    logs: &KeyLogSet,
    slots_per_block: u32,
    max_keys: u64,
) -> Result<(SortedIndex, RecoveryReport)> {
    let records = logs.recovered_records();
    if records > max_keys {
        return Err(SlotError::KeyCapacity { max: max_keys });
    }

    let started = Instant::now();
    let mut loaded = load_shards(logs)?;
    let load_time = started.elapsed();

    let sort_started = Instant::now();
    heap_sort(&mut loaded.keys, &mut loaded.slots);
    let sort_time = sort_started.elapsed();
    info!(records, "sorted key records in {:?}", sort_time);

    let collapse_started = Instant::now();
    let stats = collapse_duplicates(&mut loaded.keys, &mut loaded.slots, |slot| {
        slot < slots_per_block
    });
    let collapse_time = collapse_started.elapsed();
    info!(
        kept = stats.kept,
        duplicates = stats.duplicates,
        "collapsed duplicate keys in {:?}",
        collapse_time
    );
    if stats.rejected > 0 {
        warn!(
            dropped = stats.rejected,
            slots_per_block, "dropped key records with out-of-layout slots"
        );
    }

    let index = SortedIndex::from_sorted(loaded.keys, loaded.slots, stats.kept);
    let report = RecoveryReport {
        shards_loaded: loaded.shards_loaded,
        records_read: records,
        duplicates_collapsed: stats.duplicates as u64,
        records_dropped: stats.rejected as u64,
        torn_bytes: logs.torn_bytes(),
        index_len: index.len(),
        load_time,
        sort_time,
        collapse_time,
    };

    Ok((index, report))
}
