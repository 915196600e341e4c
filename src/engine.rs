//! Engine Module
//!
//! The storage engine that ties key logs, value files and the index together.
//!
//! ## Responsibilities
//! - Mount (and initialize) a data directory
//! - Rebuild the sorted index from the key logs on every open
//! - Route writes to a key-log shard and a value slot
//! - Serve point reads and full scans from the index built at open

use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use tracing::{error, info};

use crate::config::Config;
use crate::error::{Result, SlotError};
use crate::index::{build_index, RecoveryReport, SortedIndex};
use crate::key::{key_from_bytes, key_to_bytes};
use crate::keylog::{KeyLogSet, KeyRecord};
use crate::partition::Partitioner;
use crate::values::ValueStore;
use crate::visitor::Visitor;
use crate::VALUE_LEN;

/// The main storage engine
///
/// ## Concurrency Model: lock-free writers, snapshot readers
///
/// - **Writes**: any number of threads at once. Each write claims a value
///   slot (atomic counter per `(file, block)`) and a key-log byte range
///   (atomic cursor per shard) before touching any byte.
/// - **Reads / scans**: any number of threads at once, against the index
///   built at open. Writes made since open are not visible until the
///   directory is opened again.
pub struct Engine {
    /// Engine configuration
    config: Config,

    /// Key → shard / file / block routing
    partitioner: Partitioner,

    /// Append-only key logs, one per shard
    key_logs: KeyLogSet,

    /// Mapped value files and slot counters
    values: ValueStore,

    /// Index snapshot built at open
    index: Arc<SortedIndex>,

    /// What recovery did at open
    report: RecoveryReport,

    /// Key records claimed so far (recovered + this session)
    records: AtomicU64,
}

impl Engine {
    /// Open or create an engine with the given config
    ///
    /// On startup:
    /// 1. Validate the config and create the data directory if missing
    /// 2. Open every key-log shard
    /// 3. Load, sort and collapse the key logs into the index
    /// 4. Map every value file and resume slot counters past recovered slots
    pub fn open(config: Config) -> Result<Self> {
        config.validate()?;
        let started = Instant::now();
        let dir = config.data_dir.clone();
        info!(dir = %dir.display(), "opening engine");

        // Step 1: Data directory
        Self::prepare_dir(&dir)?;
        let layout = config.layout;

        // Step 2: Key logs
        let key_logs = KeyLogSet::open(&dir, layout.key_shards())?;

        // Step 3: Recovery
        let (index, report) = build_index(&key_logs, layout.slots_per_block, config.max_keys)?;

        // Step 4: Value files
        let values = ValueStore::open(&dir, &layout)?;
        let partitioner = Partitioner::new(&layout);
        for (key, slot) in index.iter() {
            values.reserve_through(partitioner.file(key), partitioner.block(key), slot);
        }

        info!(
            keys = report.index_len,
            records = report.records_read,
            shards = report.shards_loaded,
            "engine open in {:?}",
            started.elapsed()
        );

        Ok(Self {
            records: AtomicU64::new(report.records_read),
            config,
            partitioner,
            key_logs,
            values,
            index: Arc::new(index),
            report,
        })
    }

    /// Open with a path (convenience method)
    ///
    /// Uses default config with the specified data directory
    pub fn open_path(path: &Path) -> Result<Self> {
        let config = Config::builder().data_dir(path).build();
        Self::open(config)
    }

    // =========================================================================
    // Write Path
    // =========================================================================

    /// Write a value under an 8-byte key
    pub fn write(&self, key: &[u8], value: &[u8]) -> Result<()> {
        self.write_u64(key_from_bytes(key)?, value)
    }

    /// Write a value under a numeric key
    ///
    /// Steps:
    /// 1. Claim room for one more key record
    /// 2. Claim the next slot of the key's `(file, block)`
    /// 3. Append `(key, slot)` to the key's shard
    /// 4. Copy the value into the slot
    pub fn write_u64(&self, key: u64, value: &[u8]) -> Result<()> {
        if value.len() != VALUE_LEN {
            return Err(SlotError::InvalidValue { len: value.len() });
        }
        let loc = self.partitioner.locate(key);

        self.claim_record()?;
        let slot = self.values.claim_slot(loc.file, loc.block)?;
        self.key_logs
            .shard(loc.shard)
            .append(KeyRecord::new(key, slot))?;
        self.values.put(loc.file, loc.block, slot, value)
    }

    fn claim_record(&self) -> Result<()> {
        let max = self.config.max_keys;
        self.records
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                (n < max).then_some(n + 1)
            })
            .map(|_| ())
            .map_err(|_| SlotError::KeyCapacity { max })
    }

    // =========================================================================
    // Read Path
    // =========================================================================

    /// Read the value of an 8-byte key
    ///
    /// Only keys present when the engine was opened are found.
    pub fn read(&self, key: &[u8]) -> Result<Vec<u8>> {
        self.read_u64(key_from_bytes(key)?)
    }

    /// Read the value of a numeric key
    pub fn read_u64(&self, key: u64) -> Result<Vec<u8>> {
        let mut value = vec![0u8; VALUE_LEN];
        self.read_into_u64(key, &mut value)?;
        Ok(value)
    }

    /// Read into a caller-owned buffer, without allocating
    pub fn read_into(&self, key: &[u8], dst: &mut [u8; VALUE_LEN]) -> Result<()> {
        self.read_into_u64(key_from_bytes(key)?, dst)
    }

    fn read_into_u64(&self, key: u64, dst: &mut [u8]) -> Result<()> {
        let slot = self.index.find(key).ok_or(SlotError::KeyNotFound)?;
        self.values.get(
            self.partitioner.file(key),
            self.partitioner.block(key),
            slot,
            dst,
        )
    }

    // =========================================================================
    // Range Path
    // =========================================================================

    /// Visit entries between `lower` and `upper`
    ///
    /// Only the unbounded scan is supported: both bounds must be `None` or
    /// empty. Anything else fails with `NotSupported` before any entry is
    /// visited.
    pub fn range<V>(&self, lower: Option<&[u8]>, upper: Option<&[u8]>, visitor: &mut V) -> Result<()>
    where
        V: Visitor + ?Sized,
    {
        let bounded = |b: Option<&[u8]>| b.map_or(false, |b| !b.is_empty());
        if bounded(lower) || bounded(upper) {
            return Err(SlotError::NotSupported(
                "range scans only support empty lower and upper bounds".to_string(),
            ));
        }
        self.scan(visitor)
    }

    /// Visit every indexed entry in ascending key order
    ///
    /// Consecutive entries that share a `(file, block)` are served from one
    /// bulk read covering the slots they reference.
    pub fn scan<V>(&self, visitor: &mut V) -> Result<()>
    where
        V: Visitor + ?Sized,
    {
        let keys = self.index.keys();
        let slots = self.index.slots();
        let mut block_buf: Vec<u8> = Vec::new();

        let mut start = 0;
        while start < keys.len() {
            let file = self.partitioner.file(keys[start]);
            let block = self.partitioner.block(keys[start]);

            let mut end = start + 1;
            while end < keys.len()
                && self.partitioner.file(keys[end]) == file
                && self.partitioner.block(keys[end]) == block
            {
                end += 1;
            }

            let (low, high) = slots[start..end]
                .iter()
                .fold((u32::MAX, 0u32), |(lo, hi), &s| (lo.min(s), hi.max(s)));
            let span = (high - low + 1) as usize * VALUE_LEN;
            block_buf.resize(span, 0);
            self.values.read_slots(file, block, low, &mut block_buf[..span])?;

            for i in start..end {
                let at = (slots[i] - low) as usize * VALUE_LEN;
                visitor.visit(&key_to_bytes(keys[i]), &block_buf[at..at + VALUE_LEN]);
            }
            start = end;
        }

        Ok(())
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Close the engine, releasing every file handle and mapping
    ///
    /// With `sync_on_close`, value mappings are flushed and key logs synced
    /// first. Failures are logged, never returned.
    pub fn close(self) {
        info!(
            dir = %self.config.data_dir.display(),
            records = self.session_records(),
            "closing engine"
        );

        if self.config.sync_on_close {
            // errors are logged per file by the store
            let _ = self.values.sync_all();
            for shard in self.key_logs.shards() {
                if let Err(e) = shard.sync() {
                    error!(shard = shard.id(), "failed to sync key log: {}", e);
                }
            }
        }
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// Get the data directory path
    pub fn data_dir(&self) -> &Path {
        &self.config.data_dir
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Shared read-only view of the index built at open
    pub fn index(&self) -> Arc<SortedIndex> {
        Arc::clone(&self.index)
    }

    /// Number of distinct keys visible to reads
    pub fn index_len(&self) -> usize {
        self.index.len()
    }

    /// What recovery did at open
    pub fn recovery_report(&self) -> &RecoveryReport {
        &self.report
    }

    /// Key routing used by this engine
    pub fn partitioner(&self) -> &Partitioner {
        &self.partitioner
    }

    /// Current byte length of every key-log shard
    pub fn shard_sizes(&self) -> Vec<u64> {
        self.key_logs.shards().iter().map(|s| s.len()).collect()
    }

    /// Slot the next write of `key` would claim
    pub fn next_slot(&self, key: u64) -> u64 {
        self.values
            .next_slot(self.partitioner.file(key), self.partitioner.block(key))
    }

    /// Key records claimed since open (failed claims included)
    pub fn session_records(&self) -> u64 {
        self.records.load(Ordering::Acquire) - self.report.records_read
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    /// Create the data directory, or reject a path that is not one
    fn prepare_dir(dir: &Path) -> Result<()> {
        match fs::metadata(dir) {
            Ok(meta) if meta.is_dir() => Ok(()),
            Ok(_) => Err(SlotError::NotADirectory(dir.to_path_buf())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                fs::create_dir_all(dir)?;
                info!(dir = %dir.display(), "created data directory");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}
