//! Parallel shard loading
//!
//! Every non-empty shard gets its own scoped thread and its own disjoint
//! region of the flat arrays, sized from the shard's record count at open.
//! All threads are joined before anything is sorted.

use tracing::debug;

use crate::error::{Result, SlotError};
use crate::keylog::KeyLogSet;

/// Arrays holding the union of all shards, unsorted, plus the number of
/// shards that had records
pub struct LoadedRecords {
    pub keys: Vec<u64>,
    pub slots: Vec<u32>,
    pub shards_loaded: usize,
}

/// Read every shard of `logs` into one pair of flat arrays
pub fn load_shards(logs: &KeyLogSet) -> Result<LoadedRecords> {
    let total = logs.recovered_records() as usize;
    let mut keys = vec![0u64; total];
    let mut slots = vec![0u32; total];
    let mut shards_loaded = 0usize;

    let outcome = crossbeam::scope(|scope| {
        let mut key_rest: &mut [u64] = &mut keys;
        let mut slot_rest: &mut [u32] = &mut slots;
        let mut handles = Vec::new();

        for shard in logs.shards() {
            let count = shard.recovered_records();
            if count == 0 {
                continue;
            }

            let (key_region, k_tail) = std::mem::take(&mut key_rest).split_at_mut(count);
            let (slot_region, s_tail) = std::mem::take(&mut slot_rest).split_at_mut(count);
            key_rest = k_tail;
            slot_rest = s_tail;

            shards_loaded += 1;
            handles.push((
                shard.id(),
                scope.spawn(move |_| shard.load_into(key_region, slot_region)),
            ));
        }

        handles
            .into_iter()
            .map(|(id, handle)| {
                handle.join().map_err(|_| {
                    SlotError::Recovery(format!("loader thread for shard {} panicked", id))
                })?
            })
            .collect::<Result<Vec<()>>>()
    })
    .map_err(|_| SlotError::Recovery("shard loading scope panicked".to_string()))?;
    outcome?;

    debug!(records = total, shards = shards_loaded, "all key log shards loaded");

    Ok(LoadedRecords {
        keys,
        slots,
        shards_loaded,
    })
}
