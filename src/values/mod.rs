//! Value Store Module
//!
//! Fixed-capacity, memory-mapped storage for 4096-byte values.
//!
//! ## Responsibilities
//! - Preallocate and map every value file at open
//! - Hand out slots through one atomic counter per `(file, block)`
//! - Copy values in and out of the mappings by fixed arithmetic
//!
//! ## File Format
//! ```text
//! {file}.data  (blocks_per_file × block_size bytes, sparse until written)
//! ┌───────────────────────────────────────────────┐
//! │ Block 0                                       │
//! │ ┌──────────┬──────────┬─────┬───────────────┐ │
//! │ │ Slot 0   │ Slot 1   │ ... │ Slot N-1      │ │
//! │ │ (4096 B) │ (4096 B) │     │ (4096 B)      │ │
//! │ └──────────┴──────────┴─────┴───────────────┘ │
//! ├───────────────────────────────────────────────┤
//! │ Block 1 ...                                   │
//! └───────────────────────────────────────────────┘
//!
//! byte offset = block * block_size + slot * 4096
//! ```

mod file;
mod store;

pub use file::ValueFile;
pub use store::ValueStore;
