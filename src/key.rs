//! Key encoding
//!
//! Keys travel as 8 big-endian bytes and are handled internally as `u64`,
//! so byte order and numeric order agree.

use crate::error::{Result, SlotError};
use crate::KEY_LEN;

/// Decode an 8-byte big-endian key
pub fn key_from_bytes(bytes: &[u8]) -> Result<u64> {
    let raw: [u8; KEY_LEN] = bytes
        .try_into()
        .map_err(|_| SlotError::InvalidKey { len: bytes.len() })?;
    Ok(u64::from_be_bytes(raw))
}

/// Encode a key as 8 big-endian bytes
pub fn key_to_bytes(key: u64) -> [u8; KEY_LEN] {
    key.to_be_bytes()
}
