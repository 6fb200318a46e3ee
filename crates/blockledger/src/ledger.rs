//! The Ledger: a chain kept in step with its store.
//!
//! The Ledger owns the in-memory [`Chain`] and persists every block it
//! seals. Mutating calls take `&mut self`, so one ledger has one writer.

use std::sync::Arc;

use blockledger_core::{Block, Chain, ChainHealth, Clock, Transaction};
use blockledger_store::BlockStore;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::LedgerConfig;
use crate::error::{LedgerError, Result};

/// The main Ledger struct.
///
/// Provides a unified API for:
/// - Opening a stored chain or creating its genesis block
/// - Appending transaction batches
/// - Validating and exporting the chain
pub struct Ledger<S: BlockStore> {
    /// The storage backend.
    store: S,
    /// The chain as loaded and extended.
    chain: Chain,
    /// Timestamp source for new blocks.
    clock: Arc<dyn Clock>,
    /// Configuration.
    config: LedgerConfig,
}

impl<S: BlockStore> Ledger<S> {
    /// Open a ledger on `store`, stamping blocks with the wall clock.
    pub async fn open(store: S, config: LedgerConfig) -> Result<Self> {
        let clock = Arc::new(config.system_clock()?);
        Self::open_with_clock(store, config, clock).await
    }

    /// Open a ledger on `store` with an explicit clock.
    ///
    /// An empty store gets a genesis block built from `config.genesis`. A
    /// non-empty store is loaded and, when `config.validate_on_open` is set,
    /// validated; a failing chain is rejected with
    /// [`LedgerError::InvalidChain`].
    pub async fn open_with_clock(
        store: S,
        config: LedgerConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        config.check()?;

        let blocks = store.load_blocks().await?;
        let chain = if blocks.is_empty() {
            let chain = Chain::new(config.genesis.clone(), config.max_block_size, clock.as_ref())?;
            store.insert_blocks(chain.blocks()).await?.into_result()?;
            info!(
                hash = %chain.genesis().hash(),
                transactions = chain.genesis().transactions().len(),
                "created genesis block"
            );
            chain
        } else {
            let chain = Chain::from_blocks(blocks, config.max_block_size)?;
            if config.validate_on_open {
                if let Err(e) = chain.validate(config.validation) {
                    warn!(index = e.block_index(), error = %e, "stored chain failed validation");
                    return Err(LedgerError::InvalidChain(e));
                }
            }
            info!(blocks = chain.len(), head = %chain.tail().hash(), "opened ledger");
            chain
        };

        Ok(Self {
            store,
            chain,
            clock,
            config,
        })
    }

    /// Get the store reference.
    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn chain(&self) -> &Chain {
        &self.chain
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Append
    // ─────────────────────────────────────────────────────────────────────────

    /// Commit a batch of transactions and persist the sealed blocks.
    ///
    /// Blocks are sealed without touching the in-memory chain, which only
    /// advances once the store has accepted them. An empty batch commits nothing.
    pub async fn append(&mut self, transactions: Vec<Transaction>) -> Result<&[Block]> {
        let count = transactions.len();
        let sealed = self.chain.seal(transactions, self.clock.as_ref());
        if sealed.is_empty() {
            return Ok(&self.chain.blocks()[self.chain.len()..]);
        }

        self.store.insert_blocks(&sealed).await?.into_result()?;
        debug!(
            transactions = count,
            blocks = sealed.len(),
            first_index = sealed[0].index(),
            "appended batch"
        );

        Ok(self.chain.commit(sealed)?)
    }

    /// Convert serializable records and commit them.
    ///
    /// Nothing is committed if any record fails to convert.
    pub async fn append_records<T: Serialize>(&mut self, records: &[T]) -> Result<&[Block]> {
        let transactions = records
            .iter()
            .map(Transaction::from_record)
            .collect::<std::result::Result<Vec<_>, _>>()?;
        self.append(transactions).await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Validation
    // ─────────────────────────────────────────────────────────────────────────

    /// Link and stored-metadata check, as [`Chain::is_valid`].
    pub fn is_valid(&self) -> bool {
        self.chain.is_valid()
    }

    /// Validate the chain at the configured depth.
    pub fn validate(&self) -> Result<()> {
        Ok(self.chain.validate(self.config.validation)?)
    }

    /// Collect every failing block at the configured depth.
    pub fn audit(&self) -> ChainHealth {
        self.chain.audit(self.config.validation)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Export
    // ─────────────────────────────────────────────────────────────────────────

    /// The chain representation as JSON text.
    pub fn export_json(&self) -> String {
        self.chain.to_json()
    }
}
