//! Key Log Module
//!
//! Durable, append-only logs of `(key, slot)` records, one file per shard.
//!
//! ## Responsibilities
//! - Append records without locks (atomic cursor claims a byte range first)
//! - Resume the append cursor at the existing file size on reopen
//! - Cut torn tails back to the last whole record
//! - Hand the raw record bytes to recovery
//!
//! ## File Format
//! ```text
//! {shard}.key
//! ┌──────────────────────────┐
//! │ Record 1                 │
//! │ ┌─────────────┬────────┐ │
//! │ │ Key (8, BE) │Slot(4) │ │
//! │ └─────────────┴────────┘ │
//! ├──────────────────────────┤
//! │ Record 2 ...             │
//! └──────────────────────────┘
//! ```

mod record;
mod shard;

pub use record::{KeyRecord, RECORD_LEN};
pub use shard::{KeyLogSet, KeyLogShard};
