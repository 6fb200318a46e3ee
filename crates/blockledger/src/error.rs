//! Error types for the Ledger.

use blockledger_core::{CoreError, LoadError, ValidationError};
use blockledger_store::StoreError;
use thiserror::Error;

/// Errors that can occur during Ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Block construction or record conversion failed.
    #[error("core error: {0}")]
    Core(#[from] CoreError),

    /// Stored blocks could not be rebuilt into a chain.
    #[error("load error: {0}")]
    Load(#[from] LoadError),

    /// Storage error.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// The chain failed validation.
    #[error("invalid chain: {0}")]
    InvalidChain(#[from] ValidationError),

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Result type for Ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;
