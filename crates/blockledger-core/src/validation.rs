//! Chain validation: link integrity, self-digests, and Merkle roots.

use serde::{Deserialize, Serialize};

use crate::block::Block;
use crate::error::ValidationError;
use crate::types::PreviousHash;

/// How thoroughly a chain is checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationMode {
    /// Links, indices, and self-digests recomputed from stored metadata.
    Links,
    /// Everything in `Links`, plus each Merkle root recomputed from the
    /// block's transactions.
    #[default]
    Full,
}

/// The health of a chain after an audit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainHealth {
    /// Every block passed.
    Healthy,
    /// One or more blocks failed, in chain order.
    Broken {
        failures: Vec<ValidationError>,
    },
}

impl ChainHealth {
    pub fn is_healthy(&self) -> bool {
        matches!(self, ChainHealth::Healthy)
    }

    /// Index of the first failing block, if any.
    pub fn first_failure(&self) -> Option<u64> {
        match self {
            ChainHealth::Healthy => None,
            ChainHealth::Broken { failures } => failures.first().map(ValidationError::block_index),
        }
    }
}

/// Check one block in its chain position.
///
/// `previous` is `None` only for the block at position 0.
pub fn validate_block(
    position: u64,
    block: &Block,
    previous: Option<&Block>,
    mode: ValidationMode,
) -> Result<(), ValidationError> {
    // 1. Position and index agree
    if block.index() != position {
        return Err(ValidationError::IndexMismatch {
            position,
            index: block.index(),
        });
    }

    // 2. Link to predecessor
    match previous {
        None => {
            if let PreviousHash::Block(_) = block.previous_hash() {
                return Err(ValidationError::GenesisLink {
                    found: *block.previous_hash(),
                });
            }
        }
        Some(prev) => {
            if block.previous_hash() != &PreviousHash::Block(*prev.hash()) {
                return Err(ValidationError::BrokenLink {
                    index: block.index(),
                    expected: *prev.hash(),
                    found: *block.previous_hash(),
                });
            }
        }
    }

    // 3. Self-digest over stored metadata
    let computed = block.recompute_hash();
    if computed != *block.hash() {
        return Err(ValidationError::HashMismatch {
            index: block.index(),
            stored: *block.hash(),
            computed,
        });
    }

    // 4. Merkle root against transactions
    if mode == ValidationMode::Full {
        let computed = block.recompute_merkle_root();
        if computed != *block.merkle_root() {
            return Err(ValidationError::MerkleRootMismatch {
                index: block.index(),
                stored: *block.merkle_root(),
                computed,
            });
        }
    }

    Ok(())
}

/// Check every block, stopping at the first failure.
pub fn validate_blocks(blocks: &[Block], mode: ValidationMode) -> Result<(), ValidationError> {
    let mut previous = None;
    for (position, block) in blocks.iter().enumerate() {
        validate_block(position as u64, block, previous, mode)?;
        previous = Some(block);
    }
    Ok(())
}

/// Check every block and collect all failures.
pub fn audit_blocks(blocks: &[Block], mode: ValidationMode) -> ChainHealth {
    let mut failures = Vec::new();
    let mut previous = None;
    for (position, block) in blocks.iter().enumerate() {
        if let Err(e) = validate_block(position as u64, block, previous, mode) {
            failures.push(e);
        }
        previous = Some(block);
    }

    if failures.is_empty() {
        ChainHealth::Healthy
    } else {
        ChainHealth::Broken { failures }
    }
}
