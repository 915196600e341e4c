//! # SlotKV
//!
//! An embedded key-value engine for fixed-size records (8-byte keys,
//! 4096-byte values) at tens of millions of entries:
//! - Sharded append-only key logs for durability
//! - Preallocated, memory-mapped value files addressed by slot arithmetic
//! - Lock-free concurrent writers (atomic slot and cursor claims)
//! - A sorted in-memory index rebuilt in parallel on every open
//!
//! ## Architecture Overview
//!
//! ```text
//!   write(key, value)                      read(key) / range(visitor)
//!          │                                        │
//!          ▼                                        ▼
//!   ┌──────────────┐                        ┌──────────────┐
//!   │ Partitioner  │                        │ SortedIndex  │
//!   │ (high bits)  │                        │ (built at    │
//!   └──┬────────┬──┘                        │  open)       │
//!      │        │                           └──────┬───────┘
//!      ▼        ▼                                  │
//! ┌─────────┐ ┌──────────────┐                     │
//! │ KeyLog  │ │ ValueStore   │◄────────────────────┘
//! │ shards  │ │ (mmap slots) │
//! └────┬────┘ └──────────────┘
//!      │            ▲
//!      └── open ────┘  recovery: load shards ∥ → heap sort → collapse
//! ```
//!
//! Reads see exactly the records that were durable when the engine was
//! opened; writes of the current session become visible after the next
//! open.

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod key;
pub mod partition;
pub mod keylog;
pub mod values;
pub mod index;
pub mod visitor;
pub mod engine;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{RetCode, Result, SlotError};
pub use config::{Config, Layout};
pub use engine::Engine;
pub use index::{RecoveryReport, SortedIndex};
pub use visitor::Visitor;

// =============================================================================
// Record Geometry
// =============================================================================

/// Key width in bytes
pub const KEY_LEN: usize = 8;

/// Value width in bytes
pub const VALUE_LEN: usize = 4096;

/// Width of one key-log record in bytes
pub const RECORD_LEN: usize = keylog::RECORD_LEN;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of SlotKV
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
