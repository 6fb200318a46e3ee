//! SQLite implementation of the BlockStore trait.
//!
//! This is the primary persistent backend. It uses rusqlite with bundled
//! SQLite, wrapped in async via tokio::spawn_blocking.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use blockledger_core::clock::format_timestamp;
use blockledger_core::{Block, Sha256Hash};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

use crate::error::{Result, StoreError};
use crate::migration;
use crate::traits::{plan_insert, BlockStore, InsertPlan, InsertResult};

/// SQLite-based store implementation.
///
/// Thread-safe via internal Mutex. All operations use spawn_blocking
/// to avoid blocking the async runtime.
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the file and runs migrations if it doesn't exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut conn = Connection::open(path)?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory SQLite database.
    ///
    /// Useful for testing.
    pub fn open_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run a blocking operation on the connection off the async runtime.
    async fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = conn
                .lock()
                .map_err(|e| StoreError::Task(format!("connection mutex poisoned: {}", e)))?;
            f(&mut conn)
        })
        .await?
    }
}

fn row_to_block(row: &rusqlite::Row<'_>) -> rusqlite::Result<String> {
    row.get("body")
}

fn decode_block(body: &str) -> Result<Block> {
    Ok(serde_json::from_str(body)?)
}

fn decode_hash(hex: &str) -> Result<Sha256Hash> {
    Sha256Hash::from_hex(hex)
        .map_err(|e| StoreError::InvalidData(format!("bad block hash {:?}: {}", hex, e)))
}

fn block_count(conn: &Connection) -> Result<u64> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM blocks", [], |row| row.get(0))?;
    Ok(count as u64)
}

fn stored_hash(conn: &Connection, index: u64) -> Result<Option<Sha256Hash>> {
    let hex: Option<String> = conn
        .query_row(
            "SELECT hash FROM blocks WHERE block_index = ?1",
            params![index as i64],
            |row| row.get(0),
        )
        .optional()?;
    hex.as_deref().map(decode_hash).transpose()
}

fn insert_block(conn: &Connection, block: &Block) -> Result<()> {
    let body = serde_json::to_string(block)?;
    conn.execute(
        "INSERT INTO blocks (
            block_index, hash, previous_hash, merkle_root, timestamp, tx_count, body
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            block.index() as i64,
            block.hash().to_hex(),
            block.previous_hash().digest().map(Sha256Hash::to_hex),
            block.merkle_root().digest().map(Sha256Hash::to_hex),
            format_timestamp(block.timestamp()),
            block.transactions().len() as i64,
            body,
        ],
    )?;
    Ok(())
}

#[async_trait]
impl BlockStore for SqliteStore {
    async fn insert_blocks(&self, blocks: &[Block]) -> Result<InsertResult> {
        let blocks = blocks.to_vec();

        self.with_conn(move |conn| {
            let tx = conn.transaction()?;

            let stored = block_count(&tx)?;
            let plan = plan_insert(stored, &blocks, |index| stored_hash(&tx, index))?;

            let fresh = match plan {
                InsertPlan::Skip(result) => return Ok(result),
                InsertPlan::Write(fresh) => fresh,
            };

            for block in &fresh {
                insert_block(&tx, block)?;
            }
            tx.commit()?;

            debug!(from = stored, count = fresh.len(), "inserted blocks");
            Ok(InsertResult::Inserted { count: fresh.len() })
        })
        .await
    }

    async fn load_blocks(&self) -> Result<Vec<Block>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT body FROM blocks ORDER BY block_index")?;
            let bodies = stmt
                .query_map([], row_to_block)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            bodies.iter().map(|body| decode_block(body)).collect()
        })
        .await
    }

    async fn get_block(&self, index: u64) -> Result<Option<Block>> {
        self.with_conn(move |conn| {
            let body: Option<String> = conn
                .query_row(
                    "SELECT body FROM blocks WHERE block_index = ?1",
                    params![index as i64],
                    row_to_block,
                )
                .optional()?;
            body.as_deref().map(decode_block).transpose()
        })
        .await
    }

    async fn get_blocks_range(&self, start: u64, end: u64) -> Result<Vec<Block>> {
        self.with_conn(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT body FROM blocks
                 WHERE block_index >= ?1 AND block_index <= ?2
                 ORDER BY block_index",
            )?;
            let bodies = stmt
                .query_map(params![start as i64, end as i64], row_to_block)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            bodies.iter().map(|body| decode_block(body)).collect()
        })
        .await
    }

    async fn block_count(&self) -> Result<u64> {
        self.with_conn(|conn| block_count(conn)).await
    }

    async fn head(&self) -> Result<Option<(u64, Sha256Hash)>> {
        self.with_conn(|conn| {
            let row: Option<(i64, String)> = conn
                .query_row(
                    "SELECT block_index, hash FROM blocks ORDER BY block_index DESC LIMIT 1",
                    [],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()?;

            match row {
                Some((index, hex)) => Ok(Some((index as u64, decode_hash(&hex)?))),
                None => Ok(None),
            }
        })
        .await
    }
}
