//! Value Store
//!
//! All value files of one data directory plus the slot counters that
//! assign slots inside each `(file, block)`.

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::error;

use crate::config::Layout;
use crate::error::{Result, SlotError};
use crate::VALUE_LEN;

use super::ValueFile;

/// Mapped value files and their slot allocators
///
/// ## Concurrency:
/// - `counters`: one atomic per `(file, block)`, claimed with `fetch_add`
/// - `files`: immutable after open; writes go to slots owned by the claimer
pub struct ValueStore {
    files: Vec<ValueFile>,
    /// Next free slot, indexed by `file * blocks_per_file + block`
    counters: Vec<AtomicU64>,
    blocks_per_file: usize,
    slots_per_block: u64,
    block_size: usize,
}

impl ValueStore {
    /// Open (and preallocate) every value file described by `layout`
    ///
    /// All slot counters start at 0; recovery seeds them afterwards.
    pub fn open(dir: &Path, layout: &Layout) -> Result<Self> {
        let file_size = layout.file_size();
        let files = (0..layout.value_files())
            .map(|id| ValueFile::open(dir, id, file_size))
            .collect::<Result<Vec<_>>>()?;

        let blocks_per_file = layout.blocks_per_file as usize;
        let counters = (0..files.len() * blocks_per_file)
            .map(|_| AtomicU64::new(0))
            .collect();

        Ok(Self {
            files,
            counters,
            blocks_per_file,
            slots_per_block: layout.slots_per_block as u64,
            block_size: layout.block_size() as usize,
        })
    }

    /// Make sure the counter for `(file, block)` starts past `slot`
    ///
    /// Used at open so that slots referenced by earlier sessions are never
    /// handed out again.
    pub fn reserve_through(&self, file: usize, block: usize, slot: u32) {
        self.counter(file, block)
            .fetch_max(slot as u64 + 1, Ordering::AcqRel);
    }

    /// Claim the next free slot of `(file, block)`
    ///
    /// Fails with `BlockFull` once the block has no slots left; the
    /// counter keeps moving but no byte is written for a failed claim.
    pub fn claim_slot(&self, file: usize, block: usize) -> Result<u32> {
        let slot = self.counter(file, block).fetch_add(1, Ordering::AcqRel);
        if slot >= self.slots_per_block {
            return Err(SlotError::BlockFull { file, block });
        }
        Ok(slot as u32)
    }

    /// Next slot that `claim_slot` would return for `(file, block)`
    pub fn next_slot(&self, file: usize, block: usize) -> u64 {
        self.counter(file, block).load(Ordering::Acquire)
    }

    /// Store one value
    #[inline]
    pub fn put(&self, file: usize, block: usize, slot: u32, value: &[u8]) -> Result<()> {
        self.files[file].write_at(self.slot_offset(block, slot), value)
    }

    /// Load one value into `dst`
    #[inline]
    pub fn get(&self, file: usize, block: usize, slot: u32, dst: &mut [u8]) -> Result<()> {
        self.files[file].read_at(self.slot_offset(block, slot), dst)
    }

    /// Bulk-load consecutive slots `first..first + dst.len() / VALUE_LEN`
    /// of one block into `dst`
    pub fn read_slots(&self, file: usize, block: usize, first: u32, dst: &mut [u8]) -> Result<()> {
        self.files[file].read_at(self.slot_offset(block, first), dst)
    }

    /// Flush every mapping; failures are logged, the first one is returned
    pub fn sync_all(&self) -> Result<()> {
        let mut first_err = None;
        for file in &self.files {
            if let Err(e) = file.sync() {
                error!(file = file.id(), "failed to sync value file: {}", e);
                if first_err.is_none() {
                    first_err = Some(e);
                }
            }
        }
        first_err.map_or(Ok(()), Err)
    }

    pub fn files(&self) -> &[ValueFile] {
        &self.files
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    #[inline]
    fn slot_offset(&self, block: usize, slot: u32) -> usize {
        block * self.block_size + slot as usize * VALUE_LEN
    }

    #[inline]
    fn counter(&self, file: usize, block: usize) -> &AtomicU64 {
        &self.counters[file * self.blocks_per_file + block]
    }
}
