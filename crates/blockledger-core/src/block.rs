//! Block: an immutable batch of transactions linked to its predecessor.
//!
//! A block's `hash` is computed once, at construction, over
//! `{index, previous_hash, merkle_root, timestamp}`. Fields are private and
//! there is no mutation API, so `merkle_root` and `hash` cannot drift from
//! the data they were derived from.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::canonical::hash_value;
use crate::clock::{format_timestamp, iso8601, Clock, SystemClock, Timestamp};
use crate::crypto::Sha256Hash;
use crate::error::CoreError;
use crate::merkle::{merkle_root, MerkleProof, MerkleTree};
use crate::types::{MerkleRoot, PreviousHash, Transaction};

/// A sealed block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    index: u64,
    previous_hash: PreviousHash,
    transactions: Vec<Transaction>,
    #[serde(with = "iso8601")]
    timestamp: Timestamp,
    hash: Sha256Hash,
    #[serde(rename = "merkle_tree")]
    merkle_root: MerkleRoot,
}

impl Block {
    /// Construct a block at an explicit timestamp.
    pub fn new(
        index: u64,
        previous_hash: PreviousHash,
        transactions: Vec<Transaction>,
        timestamp: Timestamp,
    ) -> Self {
        let timestamp = crate::clock::truncate_to_micros(timestamp);
        let merkle_root = merkle_root(&transactions);
        let hash = compute_hash(index, &previous_hash, &merkle_root, &timestamp);
        Self {
            index,
            previous_hash,
            transactions,
            timestamp,
            hash,
            merkle_root,
        }
    }

    /// Construct a block stamped by `clock`.
    pub fn construct(
        index: u64,
        previous_hash: PreviousHash,
        transactions: Vec<Transaction>,
        clock: &dyn Clock,
    ) -> Self {
        Self::new(index, previous_hash, transactions, clock.now())
    }

    /// The first block of a chain.
    pub fn genesis(transactions: Vec<Transaction>, clock: &dyn Clock) -> Self {
        Self::construct(0, PreviousHash::Genesis, transactions, clock)
    }

    pub fn index(&self) -> u64 {
        self.index
    }

    pub fn previous_hash(&self) -> &PreviousHash {
        &self.previous_hash
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn timestamp(&self) -> &Timestamp {
        &self.timestamp
    }

    /// The block's identity, linked to by its successor.
    pub fn hash(&self) -> &Sha256Hash {
        &self.hash
    }

    /// The Merkle root recorded when the block was built.
    pub fn merkle_root(&self) -> &MerkleRoot {
        &self.merkle_root
    }

    pub fn is_genesis(&self) -> bool {
        self.index == 0 && self.previous_hash.is_genesis()
    }

    /// Recompute the self-digest from the stored metadata.
    ///
    /// Uses the stored `merkle_root`, not one derived from `transactions`.
    pub fn recompute_hash(&self) -> Sha256Hash {
        compute_hash(
            self.index,
            &self.previous_hash,
            &self.merkle_root,
            &self.timestamp,
        )
    }

    /// Recompute the Merkle root from the stored transactions.
    pub fn recompute_merkle_root(&self) -> MerkleRoot {
        merkle_root(&self.transactions)
    }

    /// Membership proof for the transaction at `position`.
    pub fn proof(&self, position: usize) -> Option<MerkleProof> {
        MerkleTree::build(&self.transactions).proof(position)
    }

    /// Check a transaction against this block's recorded Merkle root.
    pub fn verify_transaction(&self, transaction: &Transaction, proof: &MerkleProof) -> bool {
        proof.verify_transaction(transaction, &self.merkle_root)
    }

    /// Total canonical size of the block's transactions in bytes.
    pub fn content_size(&self) -> usize {
        self.transactions.iter().map(Transaction::canonical_size).sum()
    }

    /// Structured representation of the block.
    pub fn to_representation(&self) -> Value {
        json!({
            "index": self.index,
            "previous_hash": self.previous_hash.to_value(),
            "transactions": self.transactions.iter().map(Transaction::to_value).collect::<Vec<_>>(),
            "timestamp": format_timestamp(&self.timestamp),
            "hash": self.hash.to_hex(),
            "merkle_tree": self.merkle_root.to_value(),
        })
    }

    /// Rebuild a block from its structured representation.
    ///
    /// The stored hash and Merkle root are taken as-is; use chain validation
    /// to check them.
    pub fn from_representation(value: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }
}

/// The metadata record a block hash is computed over.
pub fn header_value(
    index: u64,
    previous_hash: &PreviousHash,
    merkle_root: &MerkleRoot,
    timestamp: &Timestamp,
) -> Value {
    json!({
        "index": index,
        "merkle_root": merkle_root.to_value(),
        "previous_hash": previous_hash.to_value(),
        "timestamp": format_timestamp(timestamp),
    })
}

/// Compute a block hash from its metadata.
pub fn compute_hash(
    index: u64,
    previous_hash: &PreviousHash,
    merkle_root: &MerkleRoot,
    timestamp: &Timestamp,
) -> Sha256Hash {
    hash_value(&header_value(index, previous_hash, merkle_root, timestamp))
}

/// Builder for constructing blocks from arbitrary serializable records.
///
/// Accepts a single record, a sequence of records, or none. The first record
/// that fails to serialize is reported by [`BlockBuilder::build`] and no block
/// is produced.
pub struct BlockBuilder<'a> {
    index: u64,
    previous_hash: PreviousHash,
    transactions: Vec<Transaction>,
    timestamp: Option<Timestamp>,
    clock: Option<&'a dyn Clock>,
    error: Option<CoreError>,
}

impl<'a> BlockBuilder<'a> {
    /// Start a block at `index` linked to `previous_hash`.
    pub fn new(index: u64, previous_hash: PreviousHash) -> Self {
        Self {
            index,
            previous_hash,
            transactions: Vec::new(),
            timestamp: None,
            clock: None,
            error: None,
        }
    }

    /// Start a genesis block.
    pub fn genesis() -> Self {
        Self::new(0, PreviousHash::Genesis)
    }

    /// Add an already-converted transaction.
    pub fn transaction(mut self, transaction: Transaction) -> Self {
        self.transactions.push(transaction);
        self
    }

    /// Add several already-converted transactions.
    pub fn transactions(mut self, transactions: impl IntoIterator<Item = Transaction>) -> Self {
        self.transactions.extend(transactions);
        self
    }

    /// Add one serializable record.
    pub fn record<T: Serialize + ?Sized>(mut self, record: &T) -> Self {
        if self.error.is_none() {
            match Transaction::from_record(record) {
                Ok(tx) => self.transactions.push(tx),
                Err(e) => self.error = Some(e),
            }
        }
        self
    }

    /// Add a sequence of serializable records.
    pub fn records<I, T>(self, records: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Serialize,
    {
        records.into_iter().fold(self, |builder, record| builder.record(&record))
    }

    /// Stamp the block with an explicit timestamp.
    pub fn timestamp(mut self, timestamp: Timestamp) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Stamp the block from a clock.
    pub fn clock(mut self, clock: &'a dyn Clock) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Seal the block.
    ///
    /// Without an explicit timestamp or clock, the UTC wall clock is used.
    pub fn build(self) -> Result<Block, CoreError> {
        if let Some(e) = self.error {
            return Err(e);
        }

        let timestamp = match (self.timestamp, self.clock) {
            (Some(ts), _) => ts,
            (None, Some(clock)) => clock.now(),
            (None, None) => SystemClock::utc().now(),
        };

        Ok(Block::new(
            self.index,
            self.previous_hash,
            self.transactions,
            timestamp,
        ))
    }
}
