//! Flat-file implementation of the BlockStore trait.
//!
//! The whole chain lives in one JSON file holding its structured
//! representation (an array of block objects). Every insert rewrites the
//! file through a temporary sibling and a rename, so a crash leaves either
//! the old or the new chain on disk.

use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use blockledger_core::{Block, LoadError, Sha256Hash};
use chrono::Local;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::Result;
use crate::traits::{plan_insert, BlockStore, InsertPlan, InsertResult};

/// Default file name for a chain snapshot taken now: `chain_YYYYmmdd_HHMM.json`.
pub fn default_file_name() -> String {
    Local::now().format("chain_%Y%m%d_%H%M.json").to_string()
}

/// JSON file store.
///
/// Blocks are cached in memory; the file is read once on open.
pub struct JsonFileStore {
    path: PathBuf,
    blocks: Mutex<Vec<Block>>,
}

impl JsonFileStore {
    /// Open a chain file, starting empty if it does not exist yet.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let blocks = if path.exists() {
            read_blocks(&path)?
        } else {
            Vec::new()
        };
        debug!(path = %path.display(), blocks = blocks.len(), "opened chain file");

        Ok(Self {
            path,
            blocks: Mutex::new(blocks),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write a snapshot of the stored chain into `dir`.
    ///
    /// Uses [`default_file_name`] when `name` is `None`. Returns the path
    /// written.
    pub async fn save_to(&self, dir: impl AsRef<Path>, name: Option<&str>) -> Result<PathBuf> {
        let target = dir
            .as_ref()
            .join(name.map_or_else(default_file_name, str::to_owned));
        let (text, count) = {
            let stored = self.blocks.lock().await;
            (serde_json::to_string(&*stored)?, stored.len())
        };

        let written = target.clone();
        tokio::task::spawn_blocking(move || write_text(&written, &text)).await??;

        info!(path = %target.display(), blocks = count, "saved chain snapshot");
        Ok(target)
    }
}

fn read_blocks(path: &Path) -> Result<Vec<Block>> {
    let text = fs::read_to_string(path)?;
    let blocks = serde_json::from_str(&text).map_err(LoadError::from)?;
    Ok(blocks)
}

fn write_text(path: &Path, text: &str) -> Result<()> {
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, text.as_bytes())?;
    fs::rename(&tmp, path)?;
    Ok(())
}

#[async_trait]
impl BlockStore for JsonFileStore {
    async fn insert_blocks(&self, blocks: &[Block]) -> Result<InsertResult> {
        // Held across the write so concurrent inserts cannot interleave.
        let mut stored = self.blocks.lock().await;

        let plan = plan_insert(stored.len() as u64, blocks, |index| {
            Ok(stored.get(index as usize).map(|b| *b.hash()))
        })?;

        let fresh = match plan {
            InsertPlan::Skip(result) => return Ok(result),
            InsertPlan::Write(fresh) => fresh,
        };

        let text = {
            let all: Vec<&Block> = stored.iter().chain(fresh.iter().copied()).collect();
            serde_json::to_string(&all)?
        };
        let count = fresh.len();

        let path = self.path.clone();
        tokio::task::spawn_blocking(move || write_text(&path, &text)).await??;

        // the cache only grows once the file holds the new blocks
        stored.extend(fresh.into_iter().cloned());
        debug!(path = %self.path.display(), count, "appended blocks to chain file");
        Ok(InsertResult::Inserted { count })
    }

    async fn load_blocks(&self) -> Result<Vec<Block>> {
        Ok(self.blocks.lock().await.clone())
    }

    async fn get_block(&self, index: u64) -> Result<Option<Block>> {
        Ok(self.blocks.lock().await.get(index as usize).cloned())
    }

    async fn get_blocks_range(&self, start: u64, end: u64) -> Result<Vec<Block>> {
        let stored = self.blocks.lock().await;
        Ok(stored
            .iter()
            .filter(|b| b.index() >= start && b.index() <= end)
            .cloned()
            .collect())
    }

    async fn block_count(&self) -> Result<u64> {
        Ok(self.blocks.lock().await.len() as u64)
    }

    async fn head(&self) -> Result<Option<(u64, Sha256Hash)>> {
        let stored = self.blocks.lock().await;
        Ok(stored.last().map(|b| (b.index(), *b.hash())))
    }
}
