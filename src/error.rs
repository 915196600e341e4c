//! Error types for SlotKV
//!
//! Provides a unified error type for all operations.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using SlotError
pub type Result<T> = std::result::Result<T, SlotError>;

/// Unified error type for SlotKV operations
#[derive(Debug, Error)]
pub enum SlotError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    // -------------------------------------------------------------------------
    // Lookup Errors
    // -------------------------------------------------------------------------
    #[error("Key not found")]
    KeyNotFound,

    #[error("Operation not supported: {0}")]
    NotSupported(String),

    // -------------------------------------------------------------------------
    // Argument Errors
    // -------------------------------------------------------------------------
    #[error("Invalid key length: expected 8 bytes, got {len}")]
    InvalidKey { len: usize },

    #[error("Invalid value length: expected 4096 bytes, got {len}")]
    InvalidValue { len: usize },

    // -------------------------------------------------------------------------
    // Capacity Errors
    // -------------------------------------------------------------------------
    #[error("Value block full: file {file}, block {block}")]
    BlockFull { file: usize, block: usize },

    #[error("Key capacity exhausted: at most {max} records")]
    KeyCapacity { max: u64 },

    // -------------------------------------------------------------------------
    // Configuration / Recovery Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Recovery failed: {0}")]
    Recovery(String),
}

/// Status codes understood by callers that speak the classic engine return codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetCode {
    NotFound,
    Corruption,
    NotSupported,
    InvalidArgument,
    IoError,
    Full,
}

impl SlotError {
    /// Map this error onto its status code
    pub fn code(&self) -> RetCode {
        match self {
            SlotError::Io(_) | SlotError::NotADirectory(_) => RetCode::IoError,
            SlotError::KeyNotFound => RetCode::NotFound,
            SlotError::NotSupported(_) => RetCode::NotSupported,
            SlotError::InvalidKey { .. } | SlotError::InvalidValue { .. } => {
                RetCode::InvalidArgument
            }
            SlotError::Config(_) => RetCode::InvalidArgument,
            SlotError::BlockFull { .. } | SlotError::KeyCapacity { .. } => RetCode::Full,
            SlotError::Recovery(_) => RetCode::Corruption,
        }
    }
}
