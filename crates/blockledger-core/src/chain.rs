//! Chain: an ordered, append-only sequence of blocks.
//!
//! New data enters only through [`Chain::append`], which packs a batch into
//! as many blocks as the byte budget requires. Blocks are never removed,
//! reordered, or modified.

use serde::Serialize;
use serde_json::Value;
use std::ops::Range;

use crate::block::Block;
use crate::clock::Clock;
use crate::error::{CoreError, LoadError, ValidationError};
use crate::types::{PreviousHash, Transaction};
use crate::validation::{audit_blocks, validate_blocks, ChainHealth, ValidationMode};

/// Default per-block byte budget.
pub const DEFAULT_MAX_BLOCK_SIZE: usize = 1_000_000;

/// A hash-linked chain of blocks.
#[derive(Debug, Clone, PartialEq)]
pub struct Chain {
    /// Never empty: index 0 is the genesis block.
    blocks: Vec<Block>,
    max_block_size: usize,
}

impl Chain {
    /// Start a chain from a genesis batch.
    pub fn new(
        genesis: Vec<Transaction>,
        max_block_size: usize,
        clock: &dyn Clock,
    ) -> Result<Self, CoreError> {
        if max_block_size == 0 {
            return Err(CoreError::InvalidBlockSize);
        }
        Ok(Self {
            blocks: vec![Block::genesis(genesis, clock)],
            max_block_size,
        })
    }

    /// Adopt previously built blocks without re-hashing them.
    pub fn from_blocks(blocks: Vec<Block>, max_block_size: usize) -> Result<Self, LoadError> {
        if max_block_size == 0 {
            return Err(LoadError::InvalidBlockSize);
        }
        if blocks.is_empty() {
            return Err(LoadError::Empty);
        }
        Ok(Self {
            blocks,
            max_block_size,
        })
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn get(&self, index: u64) -> Option<&Block> {
        usize::try_from(index).ok().and_then(|i| self.blocks.get(i))
    }

    pub fn genesis(&self) -> &Block {
        &self.blocks[0]
    }

    /// The most recently appended block.
    pub fn tail(&self) -> &Block {
        &self.blocks[self.blocks.len() - 1]
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Always false; present for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn max_block_size(&self) -> usize {
        self.max_block_size
    }

    pub fn transaction_count(&self) -> usize {
        self.blocks.iter().map(|b| b.transactions().len()).sum()
    }

    /// Commit a batch of transactions, returning the newly sealed blocks.
    ///
    /// Records are packed greedily, in order, into blocks whose canonical
    /// content stays within `max_block_size`. A record larger than the budget
    /// is sealed alone. An empty batch commits nothing.
    pub fn append(&mut self, transactions: Vec<Transaction>, clock: &dyn Clock) -> &[Block] {
        let start = self.blocks.len();
        let sealed = self.seal(transactions, clock);
        self.blocks.extend(sealed);
        &self.blocks[start..]
    }

    /// Build the blocks [`Chain::append`] would add, leaving the chain as is.
    ///
    /// The blocks extend the current tail. Pass them to [`Chain::commit`]
    /// once they are safely stored elsewhere.
    pub fn seal(&self, transactions: Vec<Transaction>, clock: &dyn Clock) -> Vec<Block> {
        let plan = partition(&transactions, self.max_block_size);
        let mut remaining = transactions.into_iter();
        let mut sealed: Vec<Block> = Vec::with_capacity(plan.len());

        for range in plan {
            let previous = sealed.last().unwrap_or_else(|| self.tail());
            let block = Block::construct(
                previous.index() + 1,
                PreviousHash::Block(*previous.hash()),
                remaining.by_ref().take(range.len()).collect(),
                clock,
            );
            sealed.push(block);
        }
        sealed
    }

    /// Append blocks produced by [`Chain::seal`].
    ///
    /// Every block must carry the next index and link to the block before
    /// it. On the first that does not, nothing is appended.
    pub fn commit(&mut self, blocks: Vec<Block>) -> Result<&[Block], ValidationError> {
        let start = self.blocks.len();
        let mut previous = self.tail();

        for (offset, block) in blocks.iter().enumerate() {
            let position = (start + offset) as u64;
            if block.index() != position {
                return Err(ValidationError::IndexMismatch {
                    position,
                    index: block.index(),
                });
            }
            if block.previous_hash() != &PreviousHash::Block(*previous.hash()) {
                return Err(ValidationError::BrokenLink {
                    index: block.index(),
                    expected: *previous.hash(),
                    found: *block.previous_hash(),
                });
            }
            previous = block;
        }

        self.blocks.extend(blocks);
        Ok(&self.blocks[start..])
    }

    /// Convert and commit serializable records.
    ///
    /// Every record is converted before the chain is touched, so a record
    /// that fails to serialize commits nothing.
    pub fn append_records<T: Serialize>(
        &mut self,
        records: &[T],
        clock: &dyn Clock,
    ) -> Result<&[Block], CoreError> {
        let transactions = records
            .iter()
            .map(Transaction::from_record)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(self.append(transactions, clock))
    }

    /// Link and self-digest check over stored metadata.
    ///
    /// For each adjacent pair, the later block must link to the earlier one
    /// and its hash must match one recomputed from its own stored
    /// `{index, previous_hash, merkle_root, timestamp}`. Transactions are not
    /// re-hashed, so a transaction set altered behind a stale Merkle root
    /// passes; use [`Chain::validate`] with [`ValidationMode::Full`] to catch
    /// that.
    pub fn is_valid(&self) -> bool {
        self.blocks.windows(2).all(|pair| {
            let (previous, current) = (&pair[0], &pair[1]);
            current.previous_hash() == &PreviousHash::Block(*previous.hash())
                && current.recompute_hash() == *current.hash()
        })
    }

    /// Validate the whole chain, reporting the first failing block.
    pub fn validate(&self, mode: ValidationMode) -> Result<(), ValidationError> {
        validate_blocks(&self.blocks, mode)
    }

    /// Validate the whole chain, collecting every failing block.
    pub fn audit(&self, mode: ValidationMode) -> ChainHealth {
        audit_blocks(&self.blocks, mode)
    }

    /// Structured representation: an array of block objects.
    pub fn to_representation(&self) -> Value {
        Value::Array(self.blocks.iter().map(Block::to_representation).collect())
    }

    /// The representation rendered as JSON text, non-ASCII kept as-is.
    pub fn to_json(&self) -> String {
        self.to_representation().to_string()
    }

    /// Rebuild a chain from its structured representation.
    ///
    /// Stored hashes are kept, not recomputed, so a tampered representation
    /// loads and then fails validation.
    pub fn from_representation(value: Value, max_block_size: usize) -> Result<Self, LoadError> {
        let blocks: Vec<Block> = serde_json::from_value(value)?;
        Self::from_blocks(blocks, max_block_size)
    }

    pub fn from_json(text: &str, max_block_size: usize) -> Result<Self, LoadError> {
        let blocks: Vec<Block> = serde_json::from_str(text)?;
        Self::from_blocks(blocks, max_block_size)
    }
}

/// Plan how a batch is split into blocks.
///
/// Returns contiguous index ranges covering `transactions` in order. The
/// whole batch is one range when its total size fits the budget; otherwise
/// records are packed greedily and a record that alone exceeds the budget
/// gets a range of its own.
pub fn partition(transactions: &[Transaction], max_block_size: usize) -> Vec<Range<usize>> {
    if transactions.is_empty() {
        return Vec::new();
    }

    let sizes: Vec<usize> = transactions.iter().map(Transaction::canonical_size).collect();
    if sizes.iter().sum::<usize>() <= max_block_size {
        return vec![0..transactions.len()];
    }

    let mut ranges = Vec::new();
    let mut start = 0;
    let mut pending_size = 0usize;
    for (i, size) in sizes.into_iter().enumerate() {
        if i > start && pending_size + size > max_block_size {
            ranges.push(start..i);
            start = i;
            pending_size = 0;
        }
        pending_size += size;
    }
    ranges.push(start..transactions.len());
    ranges
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{parse_timestamp, FixedClock, SteppingClock};
    use crate::types::MerkleRoot;
    use chrono::Duration;
    use serde_json::json;

    fn clock() -> SteppingClock {
        SteppingClock::new(
            parse_timestamp("2024-01-01T09:00:00+09:00").unwrap(),
            Duration::seconds(1),
        )
    }

    fn tx(value: Value) -> Transaction {
        Transaction::try_from(value).unwrap()
    }

    fn ids(ids: &[u64]) -> Vec<Transaction> {
        ids.iter().map(|id| tx(json!({ "id": id }))).collect()
    }

    #[test]
    fn test_genesis_chain() {
        let chain = Chain::new(vec![tx(json!({"a": 1}))], DEFAULT_MAX_BLOCK_SIZE, &clock()).unwrap();
        assert_eq!(chain.len(), 1);
        let genesis = chain.genesis();
        assert_eq!(genesis.index(), 0);
        assert_eq!(genesis.previous_hash(), &PreviousHash::Genesis);
        assert_eq!(
            genesis.merkle_root().digest().unwrap().to_hex(),
            "f9d86028c6e0d64e225186f96acb69338b2c59764df79162107f5c4bb34d1310"
        );
        assert_eq!(
            genesis.hash().to_hex(),
            "a31687343681c8c1b43d02829abab1edd0b5603bd43de48fbb24969bfaea4443"
        );
        assert!(chain.is_valid());
    }

    #[test]
    fn test_zero_budget_rejected() {
        assert!(matches!(
            Chain::new(vec![], 0, &clock()),
            Err(CoreError::InvalidBlockSize)
        ));
    }

    #[test]
    fn test_small_batch_is_one_block() {
        let clock = clock();
        let mut chain = Chain::new(vec![], DEFAULT_MAX_BLOCK_SIZE, &clock).unwrap();
        let batch = ids(&[1, 2, 3]);
        let added = chain.append(batch.clone(), &clock);
        assert_eq!(added.len(), 1);
        assert_eq!(added[0].transactions(), &batch[..]);
        assert_eq!(added[0].index(), 1);
        assert!(chain.is_valid());
    }

    #[test]
    fn test_two_one_split_matches_reference() {
        // each `{"id": n}` is 9 bytes; a budget of 20 fits two per block
        let clock = clock();
        let mut chain = Chain::new(vec![tx(json!({"a": 1}))], 20, &clock).unwrap();
        let added = chain.append(ids(&[1, 2, 3]), &clock);

        assert_eq!(added.len(), 2);
        assert_eq!(added[0].transactions(), &ids(&[1, 2])[..]);
        assert_eq!(added[1].transactions(), &ids(&[3])[..]);
        assert_eq!(added[1].previous_hash(), &PreviousHash::Block(*added[0].hash()));

        assert_eq!(
            added[0].hash().to_hex(),
            "c1f518f31b62324ff4e51ae7a3915b4b320bd6f91280d2ae8a964cd8042a3663"
        );
        assert_eq!(
            added[1].hash().to_hex(),
            "7ac89d1e4f9c7f31344b302809523d52f76969f99eca5fa82e8588e23e089a41"
        );
        assert!(chain.is_valid());
    }

    #[test]
    fn test_oversized_record_sealed_alone() {
        let clock = clock();
        let mut chain = Chain::new(vec![], 10, &clock).unwrap();
        let big = tx(json!({"blob": "x".repeat(64)}));
        let batch = vec![big.clone(), tx(json!({"id": 1})), big.clone()];
        let added = chain.append(batch, &clock);

        assert_eq!(added.len(), 3);
        assert_eq!(added[0].transactions(), &[big.clone()][..]);
        assert_eq!(added[1].transactions().len(), 1);
        assert_eq!(added[2].transactions(), &[big][..]);
        assert!(added.iter().all(|b| !b.transactions().is_empty()));
    }

    #[test]
    fn test_empty_batch_commits_nothing() {
        let clock = clock();
        let mut chain = Chain::new(vec![], 100, &clock).unwrap();
        assert!(chain.append(vec![], &clock).is_empty());
        assert_eq!(chain.len(), 1);
    }

    #[test]
    fn test_indices_continue_across_appends() {
        let clock = clock();
        let mut chain = Chain::new(vec![], 9, &clock).unwrap();
        chain.append(ids(&[1, 2]), &clock);
        chain.append(ids(&[3]), &clock);
        let indices: Vec<u64> = chain.blocks().iter().map(Block::index).collect();
        assert_eq!(indices, vec![0, 1, 2, 3]);
        assert_eq!(chain.transaction_count(), 3);
        assert!(chain.validate(ValidationMode::Full).is_ok());
    }

    #[test]
    fn test_same_timestamp_blocks_are_valid() {
        let clock = FixedClock::new(parse_timestamp("2024-01-01T00:00:00+00:00").unwrap());
        let mut chain = Chain::new(vec![], 9, &clock).unwrap();
        chain.append(ids(&[1, 2, 3]), &clock);
        assert_eq!(chain.len(), 4);
        assert!(chain.is_valid());
    }

    #[test]
    fn test_append_records_failure_commits_nothing() {
        let clock = clock();
        let mut chain = Chain::new(vec![], 100, &clock).unwrap();
        let records = vec![json!({"id": 1}), json!("not an object")];
        let result = chain.append_records(&records, &clock);
        assert!(matches!(result, Err(CoreError::Serialization(_))));
        assert_eq!(chain.len(), 1);
    }

    #[test]
    fn test_partition_plan() {
        assert!(partition(&[], 10).is_empty());
        assert_eq!(partition(&ids(&[1, 2, 3]), 27), vec![0..3]);
        assert_eq!(partition(&ids(&[1, 2, 3]), 26), vec![0..2, 2..3]);
        assert_eq!(partition(&ids(&[1, 2, 3]), 9), vec![0..1, 1..2, 2..3]);
        assert_eq!(partition(&ids(&[1, 2, 3]), 1), vec![0..1, 1..2, 2..3]);
    }

    #[test]
    fn test_is_valid_detects_tampered_metadata() {
        let clock = clock();
        let mut chain = Chain::new(vec![], 9, &clock).unwrap();
        chain.append(ids(&[1, 2, 3]), &clock);

        let mut repr = chain.to_representation();
        repr[2]["timestamp"] = json!("1999-01-01T00:00:00+00:00");
        let tampered = Chain::from_representation(repr, 9).unwrap();

        assert!(!tampered.is_valid());
        assert!(matches!(
            tampered.validate(ValidationMode::Links),
            Err(ValidationError::HashMismatch { index: 2, .. })
        ));
    }

    #[test]
    fn test_is_valid_detects_each_tampered_header_field() {
        let clock = clock();
        let mut chain = Chain::new(vec![], 9, &clock).unwrap();
        chain.append(ids(&[1, 2, 3]), &clock);
        let genesis_hash = chain.genesis().hash().to_hex();

        let cases = [
            ("index", json!(7)),
            (
                "merkle_tree",
                json!("0000000000000000000000000000000000000000000000000000000000000000"),
            ),
            ("previous_hash", json!(genesis_hash)),
            ("previous_hash", json!(0)),
            ("timestamp", json!("1999-01-01T00:00:00+00:00")),
        ];

        for (field, value) in cases {
            let mut repr = chain.to_representation();
            repr[2][field] = value.clone();
            let tampered = Chain::from_representation(repr, 9).unwrap();
            assert!(!tampered.is_valid(), "{} = {} went unnoticed", field, value);
            assert_eq!(
                tampered.validate(ValidationMode::Links).unwrap_err().block_index(),
                2,
                "{} = {}",
                field,
                value
            );
        }
    }

    #[test]
    fn test_is_valid_detects_relinked_block() {
        let clock = clock();
        let mut chain = Chain::new(vec![], 9, &clock).unwrap();
        chain.append(ids(&[1, 2, 3]), &clock);

        // block 3 rebuilt honestly on top of block 1 instead of block 2
        let relinked = Block::construct(
            3,
            PreviousHash::Block(*chain.blocks()[1].hash()),
            ids(&[3]),
            &clock,
        );
        let mut repr = chain.to_representation();
        repr[3] = relinked.to_representation();
        let tampered = Chain::from_representation(repr, 9).unwrap();

        assert_eq!(tampered.blocks()[3].recompute_hash(), *tampered.blocks()[3].hash());
        assert!(!tampered.is_valid());
        assert!(matches!(
            tampered.validate(ValidationMode::Links),
            Err(ValidationError::BrokenLink { index: 3, .. })
        ));
    }

    #[test]
    fn test_seal_leaves_chain_unchanged() {
        let clock = clock();
        let mut chain = Chain::new(vec![tx(json!({"a": 1}))], 20, &clock).unwrap();
        let before = chain.clone();

        let sealed = chain.seal(ids(&[1, 2, 3]), &clock);
        assert_eq!(chain, before);
        assert_eq!(sealed.len(), 2);
        assert_eq!(
            sealed[1].hash().to_hex(),
            "7ac89d1e4f9c7f31344b302809523d52f76969f99eca5fa82e8588e23e089a41"
        );
        assert!(chain.seal(vec![], &clock).is_empty());

        let committed = chain.commit(sealed.clone()).unwrap();
        assert_eq!(committed, &sealed[..]);
        assert_eq!(chain.len(), 3);
        assert!(chain.validate(ValidationMode::Full).is_ok());
    }

    #[test]
    fn test_commit_rejects_blocks_that_do_not_extend_tail() {
        let clock = clock();
        let mut chain = Chain::new(vec![], 9, &clock).unwrap();
        let stale = chain.seal(ids(&[1]), &clock);
        chain.append(ids(&[2]), &clock);
        let before = chain.clone();

        // sealed against an older tail: the index is already taken
        assert!(matches!(
            chain.commit(stale.clone()),
            Err(ValidationError::IndexMismatch { position: 2, index: 1 })
        ));

        // right index, wrong predecessor
        let detached = Block::construct(
            2,
            PreviousHash::Block(*stale[0].hash()),
            ids(&[3]),
            &clock,
        );
        assert!(matches!(
            chain.commit(vec![detached]),
            Err(ValidationError::BrokenLink { index: 2, .. })
        ));
        assert_eq!(chain, before);
    }

    #[test]
    fn test_transaction_tampering_needs_full_validation() {
        let clock = clock();
        let mut chain = Chain::new(vec![], 100, &clock).unwrap();
        chain.append(ids(&[1, 2]), &clock);

        let mut repr = chain.to_representation();
        repr[1]["transactions"][0] = json!({"id": 999});
        let tampered = Chain::from_representation(repr, 100).unwrap();

        assert!(tampered.is_valid());
        assert!(tampered.validate(ValidationMode::Links).is_ok());
        assert!(matches!(
            tampered.validate(ValidationMode::Full),
            Err(ValidationError::MerkleRootMismatch { index: 1, .. })
        ));
    }

    #[test]
    fn test_representation_roundtrip() {
        let clock = clock();
        let mut chain = Chain::new(vec![tx(json!({"名前": "値"}))], 20, &clock).unwrap();
        chain.append(ids(&[1, 2, 3]), &clock);

        let text = chain.to_json();
        assert!(text.contains("名前"));
        let loaded = Chain::from_json(&text, 20).unwrap();
        assert_eq!(loaded, chain);
        assert_eq!(loaded.is_valid(), chain.is_valid());
    }

    #[test]
    fn test_load_errors() {
        assert!(matches!(
            Chain::from_representation(json!([]), 10),
            Err(LoadError::Empty)
        ));
        assert!(matches!(
            Chain::from_representation(json!([{"index": 0}]), 10),
            Err(LoadError::Malformed(_))
        ));
        assert!(matches!(Chain::from_json("not json", 10), Err(LoadError::Malformed(_))));

        let chain = Chain::new(vec![], 10, &clock()).unwrap();
        assert!(matches!(
            Chain::from_representation(chain.to_representation(), 0),
            Err(LoadError::InvalidBlockSize)
        ));
    }

    #[test]
    fn test_empty_genesis_root_is_sentinel() {
        let chain = Chain::new(vec![], 10, &clock()).unwrap();
        assert_eq!(chain.genesis().merkle_root(), &MerkleRoot::Empty);
        assert_eq!(chain.to_representation()[0]["merkle_tree"], json!(0));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use crate::clock::{parse_timestamp, SteppingClock};
    use chrono::Duration;
    use proptest::prelude::*;
    use serde_json::json;

    fn ids(ids: &[u64]) -> Vec<Transaction> {
        ids.iter()
            .map(|id| Transaction::try_from(json!({ "id": id })).unwrap())
            .collect()
    }

    fn clock() -> SteppingClock {
        SteppingClock::new(
            parse_timestamp("2024-01-01T00:00:00+00:00").unwrap(),
            Duration::milliseconds(250),
        )
    }

    proptest! {
        #[test]
        fn prop_partition_covers_batch_in_order(
            values in prop::collection::vec(0u64..100_000, 0..40),
            max in 1usize..64,
        ) {
            let batch = ids(&values);
            let ranges = partition(&batch, max);

            let mut next = 0;
            for range in &ranges {
                prop_assert_eq!(range.start, next);
                prop_assert!(!range.is_empty());
                let size: usize = batch[range.clone()].iter().map(Transaction::canonical_size).sum();
                prop_assert!(range.len() == 1 || size <= max);
                next = range.end;
            }
            prop_assert_eq!(next, batch.len());
        }

        #[test]
        fn prop_appended_chain_validates(
            batches in prop::collection::vec(prop::collection::vec(0u64..1_000, 0..8), 0..5),
            max in 1usize..48,
        ) {
            let clock = clock();
            let mut chain = Chain::new(vec![], max, &clock).unwrap();
            for batch in &batches {
                chain.append(ids(batch), &clock);
            }
            prop_assert!(chain.is_valid());
            prop_assert!(chain.validate(ValidationMode::Full).is_ok());
            prop_assert_eq!(
                chain.transaction_count(),
                batches.iter().map(Vec::len).sum::<usize>()
            );
        }
    }
}
