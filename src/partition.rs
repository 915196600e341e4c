//! Key Routing
//!
//! Maps a key onto its key-log shard and its value `(file, block)` using
//! only the key's high bits. Two keys that are equal always land on the
//! same shard and the same block, so every duplicate of a key shares one
//! slot counter.

use crate::config::Layout;

/// Where a key's record and value live
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Location {
    /// Key-log shard receiving the record
    pub shard: usize,
    /// Value file holding the slot
    pub file: usize,
    /// Block within the value file
    pub block: usize,
}

/// Precomputed shift/mask routing derived from a [`Layout`]
#[derive(Debug, Clone, Copy)]
pub struct Partitioner {
    shard_shift: u32,
    file_shift: u32,
    block_shift: u32,
    block_mask: u64,
}

impl Partitioner {
    pub fn new(layout: &Layout) -> Self {
        Self {
            shard_shift: 64 - layout.key_shard_bits,
            file_shift: 64 - layout.value_file_bits,
            block_shift: layout.block_shift,
            block_mask: (1u64 << layout.block_bits) - 1,
        }
    }

    #[inline]
    pub fn shard(&self, key: u64) -> usize {
        (key >> self.shard_shift) as usize
    }

    #[inline]
    pub fn file(&self, key: u64) -> usize {
        (key >> self.file_shift) as usize
    }

    #[inline]
    pub fn block(&self, key: u64) -> usize {
        ((key >> self.block_shift) & self.block_mask) as usize
    }

    /// Route a key
    #[inline]
    pub fn locate(&self, key: u64) -> Location {
        Location {
            shard: self.shard(key),
            file: self.file(key),
            block: self.block(key),
        }
    }
}

impl Default for Partitioner {
    fn default() -> Self {
        Self::new(&Layout::default())
    }
}
