//! In-memory implementation of the BlockStore trait.
//!
//! This is primarily for testing. It has the same semantics as SQLite
//! but keeps everything in memory with no persistence.

use std::sync::RwLock;

use async_trait::async_trait;
use blockledger_core::{Block, Sha256Hash};

use crate::error::Result;
use crate::traits::{plan_insert, BlockStore, InsertPlan, InsertResult};

/// In-memory store implementation.
///
/// All data is lost when the store is dropped. Thread-safe via RwLock.
pub struct MemoryStore {
    /// Blocks by position; `blocks[i].index() == i`.
    blocks: RwLock<Vec<Block>>,
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            blocks: RwLock::new(Vec::new()),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BlockStore for MemoryStore {
    async fn insert_blocks(&self, blocks: &[Block]) -> Result<InsertResult> {
        let mut stored = self.blocks.write().unwrap();

        let plan = plan_insert(stored.len() as u64, blocks, |index| {
            Ok(stored.get(index as usize).map(|b| *b.hash()))
        })?;

        match plan {
            InsertPlan::Skip(result) => Ok(result),
            InsertPlan::Write(fresh) => {
                let count = fresh.len();
                stored.extend(fresh.into_iter().cloned());
                Ok(InsertResult::Inserted { count })
            }
        }
    }

    async fn load_blocks(&self) -> Result<Vec<Block>> {
        Ok(self.blocks.read().unwrap().clone())
    }

    async fn get_block(&self, index: u64) -> Result<Option<Block>> {
        let stored = self.blocks.read().unwrap();
        Ok(stored.get(index as usize).cloned())
    }

    async fn get_blocks_range(&self, start: u64, end: u64) -> Result<Vec<Block>> {
        let stored = self.blocks.read().unwrap();
        Ok(stored
            .iter()
            .filter(|b| b.index() >= start && b.index() <= end)
            .cloned()
            .collect())
    }

    async fn block_count(&self) -> Result<u64> {
        Ok(self.blocks.read().unwrap().len() as u64)
    }

    async fn head(&self) -> Result<Option<(u64, Sha256Hash)>> {
        let stored = self.blocks.read().unwrap();
        Ok(stored.last().map(|b| (b.index(), *b.hash())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::sample_chain;

    #[tokio::test]
    async fn test_insert_and_load() {
        let store = MemoryStore::new();
        let chain = sample_chain(3);

        let result = store.insert_blocks(chain.blocks()).await.unwrap();
        assert_eq!(result, InsertResult::Inserted { count: 4 });

        assert_eq!(store.load_blocks().await.unwrap(), chain.blocks());
        assert_eq!(store.block_count().await.unwrap(), 4);
        assert_eq!(
            store.head().await.unwrap(),
            Some((3, *chain.tail().hash()))
        );
    }

    #[tokio::test]
    async fn test_insert_idempotent() {
        let store = MemoryStore::new();
        let chain = sample_chain(2);

        store.insert_blocks(chain.blocks()).await.unwrap();
        let result = store.insert_blocks(chain.blocks()).await.unwrap();
        assert_eq!(result, InsertResult::AlreadyExists);
        assert_eq!(store.block_count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_conflict_writes_nothing() {
        let store = MemoryStore::new();
        let ours = sample_chain(2);
        store.insert_blocks(&ours.blocks()[..2]).await.unwrap();

        let theirs = crate::test_support::sample_chain_from(50, 2);
        let result = store.insert_blocks(&theirs.blocks()[1..]).await.unwrap();
        assert!(matches!(result, InsertResult::Conflict { index: 1, .. }));
        assert_eq!(store.block_count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_gap_rejected() {
        let store = MemoryStore::new();
        let chain = sample_chain(3);
        store.insert_blocks(&chain.blocks()[..1]).await.unwrap();

        let result = store.insert_blocks(&chain.blocks()[2..]).await.unwrap();
        assert_eq!(result, InsertResult::Gap { expected: 1, found: 2 });
    }

    #[tokio::test]
    async fn test_reads() {
        let store = MemoryStore::new();
        let chain = sample_chain(4);
        store.insert_blocks(chain.blocks()).await.unwrap();

        assert_eq!(store.get_block(2).await.unwrap().as_ref(), chain.get(2));
        assert!(store.get_block(9).await.unwrap().is_none());

        let range = store.get_blocks_range(1, 3).await.unwrap();
        let indices: Vec<u64> = range.iter().map(Block::index).collect();
        assert_eq!(indices, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_empty_store() {
        let store = MemoryStore::default();
        assert!(store.load_blocks().await.unwrap().is_empty());
        assert_eq!(store.head().await.unwrap(), None);
    }
}
