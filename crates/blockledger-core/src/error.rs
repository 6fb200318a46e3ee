//! Error types for blockledger core.

use thiserror::Error;

use crate::crypto::Sha256Hash;
use crate::types::{MerkleRoot, PreviousHash};

/// Core errors that can occur while building blocks and chains.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A transaction record could not be canonically serialized.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The per-block byte budget must be positive.
    #[error("max block size must be positive")]
    InvalidBlockSize,
}

impl From<serde_json::Error> for CoreError {
    fn from(e: serde_json::Error) -> Self {
        CoreError::Serialization(e.to_string())
    }
}

/// The first integrity failure found while walking a chain.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("genesis block must not link to a predecessor, found {found}")]
    GenesisLink { found: PreviousHash },

    #[error("block at position {position} carries index {index}")]
    IndexMismatch { position: u64, index: u64 },

    #[error("block {index} links to {found}, expected {expected}")]
    BrokenLink {
        index: u64,
        expected: Sha256Hash,
        found: PreviousHash,
    },

    #[error("block {index} hash mismatch: stored {stored}, computed {computed}")]
    HashMismatch {
        index: u64,
        stored: Sha256Hash,
        computed: Sha256Hash,
    },

    #[error("block {index} merkle root mismatch: stored {stored}, computed {computed}")]
    MerkleRootMismatch {
        index: u64,
        stored: MerkleRoot,
        computed: MerkleRoot,
    },
}

impl ValidationError {
    /// Index of the block that failed, as recorded on that block.
    pub fn block_index(&self) -> u64 {
        match self {
            ValidationError::GenesisLink { .. } => 0,
            ValidationError::IndexMismatch { position, .. } => *position,
            ValidationError::BrokenLink { index, .. }
            | ValidationError::HashMismatch { index, .. }
            | ValidationError::MerkleRootMismatch { index, .. } => *index,
        }
    }
}

/// Errors raised when rebuilding a chain from its structured representation.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The representation is not valid JSON or a block is missing fields.
    #[error("malformed chain representation: {0}")]
    Malformed(#[from] serde_json::Error),

    /// A chain always contains at least its genesis block.
    #[error("chain representation contains no blocks")]
    Empty,

    #[error("max block size must be positive")]
    InvalidBlockSize,
}
