//! Test fixtures and helpers.
//!
//! Common setup code for integration tests: deterministic clocks, sample
//! chains, and tampered copies of them.

use std::sync::Arc;

use blockledger::{Ledger, LedgerConfig, Result};
use blockledger_core::clock::parse_timestamp;
use blockledger_core::{Chain, Clock, SteppingClock, Transaction};
use blockledger_store::MemoryStore;
use chrono::Duration;
use serde_json::{json, Value};

/// Start of every fixture clock.
pub const FIXTURE_START: &str = "2024-01-01T09:00:00+09:00";

/// A clock starting at [`FIXTURE_START`] that advances one second per block.
pub fn fixture_clock() -> SteppingClock {
    SteppingClock::new(
        parse_timestamp(FIXTURE_START).expect("fixture start is ISO-8601"),
        Duration::seconds(1),
    )
}

/// `{"id": n}` records for each id.
pub fn id_records(ids: impl IntoIterator<Item = u64>) -> Vec<Transaction> {
    ids.into_iter()
        .map(|id| Transaction::try_from(json!({ "id": id })).expect("object literal"))
        .collect()
}

/// A test fixture with a deterministic clock and a chain configuration.
pub struct TestFixture {
    pub clock: Arc<SteppingClock>,
    pub config: LedgerConfig,
}

impl TestFixture {
    /// Genesis `[{"a": 1}]` with the default block budget.
    pub fn new() -> Self {
        Self::with_block_size(blockledger_core::DEFAULT_MAX_BLOCK_SIZE)
    }

    pub fn with_block_size(max_block_size: usize) -> Self {
        Self {
            clock: Arc::new(fixture_clock()),
            config: LedgerConfig {
                max_block_size,
                genesis: vec![Transaction::try_from(json!({"a": 1})).expect("object literal")],
                ..LedgerConfig::default()
            },
        }
    }

    /// A chain holding only the genesis block.
    pub fn chain(&self) -> Chain {
        Chain::new(
            self.config.genesis.clone(),
            self.config.max_block_size,
            self.clock.as_ref(),
        )
        .expect("fixture block size is positive")
    }

    /// A chain with one appended batch per entry of `batches`.
    pub fn chain_with(&self, batches: &[Vec<Transaction>]) -> Chain {
        let mut chain = self.chain();
        for batch in batches {
            chain.append(batch.clone(), self.clock.as_ref());
        }
        chain
    }

    /// Open a ledger on a fresh in-memory store.
    pub async fn ledger(&self) -> Result<Ledger<MemoryStore>> {
        let clock: Arc<dyn Clock> = self.clock.clone();
        Ledger::open_with_clock(MemoryStore::new(), self.config.clone(), clock).await
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Copy `chain` with one transaction replaced, keeping every stored hash.
///
/// The copy passes link checks but fails Merkle-root validation at
/// `block_index`.
pub fn tamper_transaction(chain: &Chain, block_index: usize, position: usize, value: Value) -> Chain {
    let mut repr = chain.to_representation();
    repr[block_index]["transactions"][position] = value;
    Chain::from_representation(repr, chain.max_block_size()).expect("representation reloads")
}

/// Copy `chain` with one block's timestamp rewritten, keeping its stored hash.
///
/// The copy fails even the link and self-digest check.
pub fn tamper_timestamp(chain: &Chain, block_index: usize, timestamp: &str) -> Chain {
    let mut repr = chain.to_representation();
    repr[block_index]["timestamp"] = json!(timestamp);
    Chain::from_representation(repr, chain.max_block_size()).expect("representation reloads")
}
