//! Error types for the store module.

use blockledger_core::{LoadError, Sha256Hash};
use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Block encoding or decoding failed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// A stored chain file could not be rebuilt.
    #[error("load error: {0}")]
    Load(#[from] LoadError),

    /// A different block already occupies this index.
    #[error("conflict at index {index}: existing block {existing}")]
    Conflict { index: u64, existing: Sha256Hash },

    /// The first new block does not extend the stored tail.
    #[error("gap in chain: expected index {expected}, found {found}")]
    Gap { expected: u64, found: u64 },

    /// Stored data could not be decoded.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// Migration error.
    #[error("migration error: {0}")]
    Migration(String),

    /// A blocking task panicked or was cancelled.
    #[error("blocking task failed: {0}")]
    Task(String),
}

impl From<tokio::task::JoinError> for StoreError {
    fn from(e: tokio::task::JoinError) -> Self {
        StoreError::Task(e.to_string())
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
