//! BlockStore trait: the abstract interface for block persistence.
//!
//! This trait allows the ledger to be storage-agnostic. Implementations
//! include SQLite, a flat JSON file, and in-memory (for tests).

use std::sync::Arc;

use async_trait::async_trait;
use blockledger_core::{Block, Sha256Hash};

use crate::error::{Result, StoreError};

/// Result of inserting a run of blocks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertResult {
    /// At least one new block was written.
    Inserted {
        /// Number of blocks written.
        count: usize,
    },
    /// Every block was already stored with the same hash (idempotent - not an error).
    AlreadyExists,
    /// A different block already occupies this index.
    Conflict {
        index: u64,
        /// The hash of the block already stored there.
        existing: Sha256Hash,
    },
    /// The first new block does not extend the stored tail.
    Gap {
        /// The next free index.
        expected: u64,
        /// The index the caller tried to write.
        found: u64,
    },
}

impl InsertResult {
    /// Turn a rejected insert into its error.
    pub fn into_result(self) -> Result<usize> {
        match self {
            InsertResult::Inserted { count } => Ok(count),
            InsertResult::AlreadyExists => Ok(0),
            InsertResult::Conflict { index, existing } => {
                Err(StoreError::Conflict { index, existing })
            }
            InsertResult::Gap { expected, found } => Err(StoreError::Gap { expected, found }),
        }
    }
}

/// The BlockStore trait: async interface for block persistence.
///
/// All methods are async to support both sync (SQLite, files) and async
/// backends. Blocking backends use `spawn_blocking` internally.
///
/// # Design Notes
///
/// - **Append-only**: stored blocks are never updated or removed.
/// - **Idempotent inserts**: re-inserting stored blocks returns `AlreadyExists`.
/// - **All or nothing**: a batch that conflicts or leaves a gap writes nothing.
/// - **No validation**: hashes and links are stored as given; validating them
///   is the ledger's job.
#[async_trait]
pub trait BlockStore: Send + Sync {
    // ─────────────────────────────────────────────────────────────────────────
    // Writes
    // ─────────────────────────────────────────────────────────────────────────

    /// Insert blocks in index order.
    ///
    /// # Returns
    /// - `Inserted` if one or more blocks were new.
    /// - `AlreadyExists` if every block is already stored with the same hash.
    /// - `Conflict` if a different block exists at one of the indices.
    /// - `Gap` if a new block's index is not the next free index.
    async fn insert_blocks(&self, blocks: &[Block]) -> Result<InsertResult>;

    // ─────────────────────────────────────────────────────────────────────────
    // Reads
    // ─────────────────────────────────────────────────────────────────────────

    /// Load every stored block, ordered by index.
    async fn load_blocks(&self) -> Result<Vec<Block>>;

    /// Get a block by index.
    async fn get_block(&self, index: u64) -> Result<Option<Block>>;

    /// Get blocks with `start <= index <= end`, ordered by index.
    async fn get_blocks_range(&self, start: u64, end: u64) -> Result<Vec<Block>>;

    /// Number of stored blocks.
    async fn block_count(&self) -> Result<u64>;

    /// Index and hash of the last stored block.
    async fn head(&self) -> Result<Option<(u64, Sha256Hash)>>;
}

/// Shared stores: several owners (for example a ledger and a reader) can
/// hold one backend.
#[async_trait]
impl<T: BlockStore + ?Sized> BlockStore for Arc<T> {
    async fn insert_blocks(&self, blocks: &[Block]) -> Result<InsertResult> {
        (**self).insert_blocks(blocks).await
    }

    async fn load_blocks(&self) -> Result<Vec<Block>> {
        (**self).load_blocks().await
    }

    async fn get_block(&self, index: u64) -> Result<Option<Block>> {
        (**self).get_block(index).await
    }

    async fn get_blocks_range(&self, start: u64, end: u64) -> Result<Vec<Block>> {
        (**self).get_blocks_range(start, end).await
    }

    async fn block_count(&self) -> Result<u64> {
        (**self).block_count().await
    }

    async fn head(&self) -> Result<Option<(u64, Sha256Hash)>> {
        (**self).head().await
    }
}

/// How a batch relates to what is already stored.
#[derive(Debug)]
pub(crate) enum InsertPlan<'a> {
    /// Write these blocks after the stored tail.
    Write(Vec<&'a Block>),
    /// Write nothing and report this outcome.
    Skip(InsertResult),
}

/// Compare a batch against a stored chain of `stored` blocks.
///
/// `stored_hash` looks up the hash stored at an index below `stored`.
pub(crate) fn plan_insert<'a, F>(
    stored: u64,
    blocks: &'a [Block],
    mut stored_hash: F,
) -> Result<InsertPlan<'a>>
where
    F: FnMut(u64) -> Result<Option<Sha256Hash>>,
{
    let mut fresh = Vec::new();
    for block in blocks {
        let index = block.index();
        if index < stored {
            match stored_hash(index)? {
                Some(existing) if existing == *block.hash() => continue,
                Some(existing) => return Ok(InsertPlan::Skip(InsertResult::Conflict { index, existing })),
                None => {}
            }
        }

        let expected = stored + fresh.len() as u64;
        if index != expected {
            return Ok(InsertPlan::Skip(InsertResult::Gap {
                expected,
                found: index,
            }));
        }
        fresh.push(block);
    }

    if fresh.is_empty() {
        Ok(InsertPlan::Skip(InsertResult::AlreadyExists))
    } else {
        Ok(InsertPlan::Write(fresh))
    }
}
