//! Configuration for SlotKV
//!
//! Centralized configuration with defaults matching the production layout:
//! 64 key-log shards, 256 value files of 128 blocks, 2160 slots per block.

use std::path::PathBuf;

use crate::error::{Result, SlotError};
use crate::VALUE_LEN;

/// Main configuration for a SlotKV instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Root directory for all data files
    /// Internal structure:
    ///   {data_dir}/
    ///     ├── 0.key .. 63.key      (append-only key logs)
    ///     └── 0.data .. 255.data   (preallocated value files)
    pub data_dir: PathBuf,

    /// Partitioning and capacity parameters
    pub layout: Layout,

    // -------------------------------------------------------------------------
    // Index Configuration
    // -------------------------------------------------------------------------
    /// Maximum number of key records the logs may hold
    pub max_keys: u64,

    // -------------------------------------------------------------------------
    // Durability Configuration
    // -------------------------------------------------------------------------
    /// Flush value mappings and fsync key logs when closing
    pub sync_on_close: bool,
}

/// How keys are routed onto key-log shards and value blocks, and how big
/// the value files are.
///
/// Routing is a pure function of the key's high bits:
/// - shard = `key >> (64 - key_shard_bits)`
/// - file  = `key >> (64 - value_file_bits)`
/// - block = `(key >> block_shift) & (2^block_bits - 1)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    /// log2 of the number of key-log shards
    pub key_shard_bits: u32,

    /// log2 of the number of value files
    pub value_file_bits: u32,

    /// Right shift applied to the key before masking out the block number
    pub block_shift: u32,

    /// Width of the block number taken from the key
    pub block_bits: u32,

    /// Blocks allocated in every value file (may exceed 2^block_bits)
    pub blocks_per_file: u32,

    /// Value slots in every block
    pub slots_per_block: u32,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            key_shard_bits: 6,
            value_file_bits: 8,
            block_shift: 49,
            block_bits: 6,
            blocks_per_file: 128,
            slots_per_block: 2160,
        }
    }
}

impl Layout {
    /// Number of key-log shards
    pub fn key_shards(&self) -> usize {
        1 << self.key_shard_bits
    }

    /// Number of value files
    pub fn value_files(&self) -> usize {
        1 << self.value_file_bits
    }

    /// Bytes in one block
    pub fn block_size(&self) -> u64 {
        self.slots_per_block as u64 * VALUE_LEN as u64
    }

    /// Bytes in one value file
    pub fn file_size(&self) -> u64 {
        self.blocks_per_file as u64 * self.block_size()
    }

    /// Total value slots across all files
    pub fn slot_capacity(&self) -> u64 {
        self.value_files() as u64 * self.blocks_per_file as u64 * self.slots_per_block as u64
    }

    /// Check that the layout is internally consistent and addressable
    pub fn validate(&self) -> Result<()> {
        if !(1..=16).contains(&self.key_shard_bits) {
            return Err(SlotError::Config(format!(
                "key_shard_bits must be in 1..=16, got {}",
                self.key_shard_bits
            )));
        }
        if !(1..=16).contains(&self.value_file_bits) {
            return Err(SlotError::Config(format!(
                "value_file_bits must be in 1..=16, got {}",
                self.value_file_bits
            )));
        }
        if self.block_bits > 16 {
            return Err(SlotError::Config(format!(
                "block_bits must be at most 16, got {}",
                self.block_bits
            )));
        }
        if self.block_shift > 63 {
            return Err(SlotError::Config(format!(
                "block_shift must be at most 63, got {}",
                self.block_shift
            )));
        }
        if self.block_shift + self.block_bits > 64 {
            return Err(SlotError::Config(format!(
                "block_shift ({}) + block_bits ({}) exceeds 64",
                self.block_shift, self.block_bits
            )));
        }
        if (self.blocks_per_file as u64) < (1u64 << self.block_bits) {
            return Err(SlotError::Config(format!(
                "blocks_per_file ({}) cannot hold 2^{} addressable blocks",
                self.blocks_per_file, self.block_bits
            )));
        }
        if self.slots_per_block == 0 {
            return Err(SlotError::Config(
                "slots_per_block must be at least 1".to_string(),
            ));
        }
        let file_size = (self.blocks_per_file as u128)
            * (self.slots_per_block as u128)
            * (VALUE_LEN as u128);
        if file_size > isize::MAX as u128 {
            return Err(SlotError::Config(format!(
                "value file size {} is not addressable",
                file_size
            )));
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./slotkv_data"),
            layout: Layout::default(),
            max_keys: 64_000_000,
            sync_on_close: false,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Validate the full configuration
    pub fn validate(&self) -> Result<()> {
        self.layout.validate()?;
        if self.max_keys == 0 {
            return Err(SlotError::Config("max_keys must be at least 1".to_string()));
        }
        if self.max_keys > isize::MAX as u64 / crate::RECORD_LEN as u64 {
            return Err(SlotError::Config(format!(
                "max_keys {} is not addressable",
                self.max_keys
            )));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the data directory (root for all storage)
    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.data_dir = path.into();
        self
    }

    /// Replace the whole layout
    pub fn layout(mut self, layout: Layout) -> Self {
        self.config.layout = layout;
        self
    }

    /// Set the number of value slots per block
    pub fn slots_per_block(mut self, slots: u32) -> Self {
        self.config.layout.slots_per_block = slots;
        self
    }

    /// Set log2 of the number of value files
    pub fn value_file_bits(mut self, bits: u32) -> Self {
        self.config.layout.value_file_bits = bits;
        self
    }

    /// Set the number of blocks per value file
    pub fn blocks_per_file(mut self, blocks: u32) -> Self {
        self.config.layout.blocks_per_file = blocks;
        self
    }

    /// Set the maximum number of key records
    pub fn max_keys(mut self, max: u64) -> Self {
        self.config.max_keys = max;
        self
    }

    /// Flush and fsync everything on close
    pub fn sync_on_close(mut self, sync: bool) -> Self {
        self.config.sync_on_close = sync;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
