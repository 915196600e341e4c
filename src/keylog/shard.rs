//! Key Log Shards
//!
//! Each shard is a plain file written with positional writes. A writer
//! claims its 12-byte range with one `fetch_add` on the shard cursor and
//! then writes into that range, so concurrent appends to the same shard
//! never overlap and never take a lock.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use memmap2::MmapOptions;
use tracing::{debug, warn};

use crate::error::{Result, SlotError};

use super::{KeyRecord, RECORD_LEN};

/// A single append-only key log file
pub struct KeyLogShard {
    /// Shard number (also the file stem)
    id: usize,
    /// Path to `{id}.key`
    path: PathBuf,
    /// Open read/write handle
    file: File,
    /// Next append position in bytes
    cursor: AtomicU64,
    /// Whole-record length found at open (the part recovery reads)
    recovered_len: u64,
    /// Bytes cut from a torn tail at open
    torn_bytes: u64,
}

impl KeyLogShard {
    /// Open or create shard `id` inside `dir`
    ///
    /// A tail that is not a whole record is truncated away so the cursor
    /// resumes on a record boundary.
    pub fn open(dir: &Path, id: usize) -> Result<Self> {
        let path = Self::shard_path(dir, id);
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(&path)?;

        let len = file.metadata()?.len();
        let torn_bytes = len % RECORD_LEN as u64;
        let recovered_len = len - torn_bytes;

        if torn_bytes > 0 {
            warn!(
                shard = id,
                torn_bytes,
                "key log ends in a partial record, truncating to {}",
                recovered_len
            );
            file.set_len(recovered_len)?;
        }

        Ok(Self {
            id,
            path,
            file,
            cursor: AtomicU64::new(recovered_len),
            recovered_len,
            torn_bytes,
        })
    }

    /// Append one record; returns the byte position it was written at
    ///
    /// The range is claimed before it is written. If the write fails while
    /// a later append to this shard succeeds, the claimed range stays zero
    /// and is recovered as key 0 at slot 0, so key 0 may become readable
    /// without ever being written.
    pub fn append(&self, record: KeyRecord) -> Result<u64> {
        let buf = record.encode();
        let pos = self.cursor.fetch_add(RECORD_LEN as u64, Ordering::AcqRel);
        write_all_at(&self.file, &buf, pos)?;
        Ok(pos)
    }

    /// Decode every record present at open into the given slices
    ///
    /// Both slices must be exactly `recovered_records()` long.
    pub fn load_into(&self, keys: &mut [u64], slots: &mut [u32]) -> Result<()> {
        let count = self.recovered_records();
        if keys.len() != count || slots.len() != count {
            return Err(SlotError::Recovery(format!(
                "shard {} holds {} records but was given room for {}",
                self.id,
                count,
                keys.len()
            )));
        }
        if count == 0 {
            return Ok(());
        }

        // SAFETY: the mapping is read-only and no writer is active while
        // recovery runs; the mapped range never exceeds the file length.
        let map = unsafe {
            MmapOptions::new()
                .len(self.recovered_len as usize)
                .map(&self.file)?
        };

        for (i, chunk) in map.chunks_exact(RECORD_LEN).enumerate() {
            let mut raw = [0u8; RECORD_LEN];
            raw.copy_from_slice(chunk);
            let record = KeyRecord::decode(&raw);
            keys[i] = record.key;
            slots[i] = record.slot;
        }

        debug!(shard = self.id, records = count, "loaded key log shard");
        Ok(())
    }

    /// Force appended records to disk
    pub fn sync(&self) -> Result<()> {
        self.file.sync_data()?;
        Ok(())
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current append position (bytes claimed so far)
    pub fn len(&self) -> u64 {
        self.cursor.load(Ordering::Acquire)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Records present when the shard was opened
    pub fn recovered_records(&self) -> usize {
        (self.recovered_len / RECORD_LEN as u64) as usize
    }

    /// Bytes dropped from a torn tail at open
    pub fn torn_bytes(&self) -> u64 {
        self.torn_bytes
    }

    /// Generate the shard path given a directory and shard number
    pub fn shard_path(dir: &Path, id: usize) -> PathBuf {
        dir.join(format!("{}.key", id))
    }
}

/// All shards of one data directory
pub struct KeyLogSet {
    shards: Vec<KeyLogShard>,
}

impl KeyLogSet {
    /// Open shards `0..count` inside `dir`
    pub fn open(dir: &Path, count: usize) -> Result<Self> {
        let shards = (0..count)
            .map(|id| KeyLogShard::open(dir, id))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { shards })
    }

    #[inline]
    pub fn shard(&self, id: usize) -> &KeyLogShard {
        &self.shards[id]
    }

    pub fn shards(&self) -> &[KeyLogShard] {
        &self.shards
    }

    /// Records across all shards at open
    pub fn recovered_records(&self) -> u64 {
        self.shards.iter().map(|s| s.recovered_records() as u64).sum()
    }

    /// Torn bytes cut across all shards at open
    pub fn torn_bytes(&self) -> u64 {
        self.shards.iter().map(|s| s.torn_bytes()).sum()
    }

    pub fn len(&self) -> usize {
        self.shards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shards.is_empty()
    }
}

#[cfg(unix)]
fn write_all_at(file: &File, buf: &[u8], offset: u64) -> std::io::Result<()> {
    use std::os::unix::fs::FileExt;
    file.write_all_at(buf, offset)
}

#[cfg(windows)]
fn write_all_at(file: &File, mut buf: &[u8], mut offset: u64) -> std::io::Result<()> {
    use std::os::windows::fs::FileExt;
    while !buf.is_empty() {
        match file.seek_write(buf, offset) {
            Ok(0) => {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::WriteZero,
                    "failed to write whole key record",
                ))
            }
            Ok(n) => {
                buf = &buf[n..];
                offset += n as u64;
            }
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(())
}
