//! Key Record definitions
//!
//! A fixed-width 12-byte record: big-endian key followed by big-endian slot.

/// Encoded size of one record
pub const RECORD_LEN: usize = 12;

/// One `(key, slot)` entry in a key log
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyRecord {
    /// The key as an unsigned integer
    pub key: u64,

    /// Slot index within the key's `(file, block)`
    pub slot: u32,
}

impl KeyRecord {
    pub fn new(key: u64, slot: u32) -> Self {
        Self { key, slot }
    }

    /// Encode into a stack buffer
    pub fn encode(&self) -> [u8; RECORD_LEN] {
        let mut buf = [0u8; RECORD_LEN];
        buf[0..8].copy_from_slice(&self.key.to_be_bytes());
        buf[8..12].copy_from_slice(&self.slot.to_be_bytes());
        buf
    }

    /// Decode from exactly one record's worth of bytes
    pub fn decode(buf: &[u8; RECORD_LEN]) -> Self {
        let mut key = [0u8; 8];
        let mut slot = [0u8; 4];
        key.copy_from_slice(&buf[0..8]);
        slot.copy_from_slice(&buf[8..12]);
        Self {
            key: u64::from_be_bytes(key),
            slot: u32::from_be_bytes(slot),
        }
    }
}
