//! Value File
//!
//! One preallocated `.data` file mapped read/write in full.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use memmap2::{MmapMut, MmapOptions};
use tracing::debug;

use crate::error::Result;

/// A memory-mapped value file
///
/// Writers and readers touch the mapping through a raw base pointer so
/// that many threads can copy into disjoint slots at once. Callers
/// guarantee that no two threads write the same byte range; slot
/// ownership comes from the store's atomic counters.
pub struct ValueFile {
    /// File number (also the file stem)
    id: usize,
    /// Path to `{id}.data`
    path: PathBuf,
    /// Kept open for flushing and closing
    file: File,
    /// Owns the mapping; `base` points into it
    map: MmapMut,
    base: *mut u8,
    len: usize,
}

// SAFETY: the mapping lives as long as `self` and all access goes through
// bounds-checked copies on byte ranges that the store hands out exclusively.
unsafe impl Send for ValueFile {}
unsafe impl Sync for ValueFile {}

impl ValueFile {
    /// Open or create file `id` inside `dir`, sized to `size` bytes
    ///
    /// Short or new files are extended (sparsely); longer files are left
    /// alone and only their first `size` bytes are mapped.
    pub fn open(dir: &Path, id: usize, size: u64) -> Result<Self> {
        let path = Self::file_path(dir, id);
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(&path)?;

        let existing = file.metadata()?.len();
        if existing < size {
            file.set_len(size)?;
            debug!(file = id, from = existing, to = size, "preallocated value file");
        }

        let len = size as usize;
        // SAFETY: the file is at least `len` bytes long and stays open for
        // the lifetime of the mapping.
        let mut map = unsafe { MmapOptions::new().len(len).map_mut(&file)? };
        let base = map.as_mut_ptr();

        Ok(Self {
            id,
            path,
            file,
            map,
            base,
            len,
        })
    }

    /// Copy `src` into the mapping at `offset`
    pub fn write_at(&self, offset: usize, src: &[u8]) -> Result<()> {
        self.check_range(offset, src.len())?;
        // SAFETY: range checked above; slot ownership makes it exclusive.
        unsafe {
            std::ptr::copy_nonoverlapping(src.as_ptr(), self.base.add(offset), src.len());
        }
        Ok(())
    }

    /// Copy `dst.len()` bytes out of the mapping starting at `offset`
    pub fn read_at(&self, offset: usize, dst: &mut [u8]) -> Result<()> {
        self.check_range(offset, dst.len())?;
        // SAFETY: range checked above; only slots that no writer of this
        // session can claim are read.
        unsafe {
            std::ptr::copy_nonoverlapping(self.base.add(offset), dst.as_mut_ptr(), dst.len());
        }
        Ok(())
    }

    /// Flush dirty pages and file metadata to disk
    pub fn sync(&self) -> Result<()> {
        self.map.flush()?;
        self.file.sync_all()?;
        Ok(())
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Mapped length in bytes
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Generate the value file path given a directory and file number
    pub fn file_path(dir: &Path, id: usize) -> PathBuf {
        dir.join(format!("{}.data", id))
    }

    fn check_range(&self, offset: usize, len: usize) -> Result<()> {
        match offset.checked_add(len) {
            Some(end) if end <= self.len => Ok(()),
            _ => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!(
                    "range {}+{} outside value file {} ({} bytes)",
                    offset, len, self.id, self.len
                ),
            )
            .into()),
        }
    }
}
