//! Golden test vectors for deterministic verification.
//!
//! These vectors ensure that canonical encoding, Merkle roots, and block
//! hashes produce identical results across all implementations.

use blockledger_core::clock::parse_timestamp;
use blockledger_core::{Block, PreviousHash, Sha256Hash, Transaction};

/// A golden test vector for one block.
#[derive(Debug, Clone)]
pub struct GoldenVector {
    /// Human-readable name for the vector.
    pub name: &'static str,
    /// Block index.
    pub index: u64,
    /// Predecessor hash (hex), or `None` for the genesis sentinel.
    pub previous_hash: Option<&'static str>,
    /// Transactions as a JSON array.
    pub transactions: &'static str,
    /// ISO-8601 timestamp with offset.
    pub timestamp: &'static str,
    /// Expected Merkle root (hex), or `None` for the empty sentinel.
    pub expected_merkle_root: Option<&'static str>,
    /// Expected block hash (hex).
    pub expected_hash: &'static str,
}

/// Get all golden test vectors.
pub fn all_vectors() -> Vec<GoldenVector> {
    vec![
        GoldenVector {
            name: "genesis with one record",
            index: 0,
            previous_hash: None,
            transactions: r#"[{"a": 1}]"#,
            timestamp: "2024-01-01T09:00:00+09:00",
            expected_merkle_root: Some(
                "f9d86028c6e0d64e225186f96acb69338b2c59764df79162107f5c4bb34d1310",
            ),
            expected_hash: "a31687343681c8c1b43d02829abab1edd0b5603bd43de48fbb24969bfaea4443",
        },
        GoldenVector {
            name: "empty genesis",
            index: 0,
            previous_hash: None,
            transactions: "[]",
            timestamp: "2024-01-01T00:00:00+00:00",
            expected_merkle_root: None,
            expected_hash: "d4737d1ab7a0ff040cded3f5019cc99f46db852e242541fea810cc4ffcb8a505",
        },
        GoldenVector {
            name: "two records linked to genesis",
            index: 1,
            previous_hash: Some("a31687343681c8c1b43d02829abab1edd0b5603bd43de48fbb24969bfaea4443"),
            transactions: r#"[{"id": 1}, {"id": 2}]"#,
            timestamp: "2024-01-01T09:00:01+09:00",
            expected_merkle_root: Some(
                "fda55d69266bbd1c07b82901e0dc7f7f0059892a87e4d54bd34ab777e8dca5de",
            ),
            expected_hash: "c1f518f31b62324ff4e51ae7a3915b4b320bd6f91280d2ae8a964cd8042a3663",
        },
        GoldenVector {
            name: "single record",
            index: 2,
            previous_hash: Some("c1f518f31b62324ff4e51ae7a3915b4b320bd6f91280d2ae8a964cd8042a3663"),
            transactions: r#"[{"id": 3}]"#,
            timestamp: "2024-01-01T09:00:02+09:00",
            expected_merkle_root: Some(
                "e7e47cffe2c803349c298b11ac2b371dc4b15dade05ae740a774992f0bf25b62",
            ),
            expected_hash: "7ac89d1e4f9c7f31344b302809523d52f76969f99eca5fa82e8588e23e089a41",
        },
        GoldenVector {
            name: "non-ASCII keys and fractional timestamp",
            index: 5,
            previous_hash: Some("a31687343681c8c1b43d02829abab1edd0b5603bd43de48fbb24969bfaea4443"),
            transactions: r#"[{"名前": "値", "n": 1.5}]"#,
            timestamp: "2024-06-30T23:59:59.250000-05:00",
            expected_merkle_root: Some(
                "ae25641130a12f5a359a9c10aec548bc6556e539a495cba7e721d2254e20d233",
            ),
            expected_hash: "84011d9eb7dfa89dcd52bef710137c944403ffea4c15d7cbd35bad26d71aa89c",
        },
        GoldenVector {
            name: "nested records with odd leaf count",
            index: 3,
            previous_hash: Some("84011d9eb7dfa89dcd52bef710137c944403ffea4c15d7cbd35bad26d71aa89c"),
            transactions: r#"[{"b": {"y": [1, 2], "x": null}, "a": true}, {"a": false}, {"c": "x"}]"#,
            timestamp: "2023-12-31T15:00:00+00:00",
            expected_merkle_root: Some(
                "af725f52ab0a5fe7b9d193f0e29f127979f030fc83c307b5adc837197073565d",
            ),
            expected_hash: "c6f24e8e1a6c6bdfb584386ce17558373017c00f12e1d22d39bfb012ce693c9d",
        },
    ]
}

/// Build the block a golden vector describes.
///
/// Panics on a malformed vector; vectors are fixed test data.
pub fn block_from_vector(vector: &GoldenVector) -> Block {
    let previous_hash = match vector.previous_hash {
        Some(hex) => PreviousHash::Block(Sha256Hash::from_hex(hex).expect("vector hash is hex")),
        None => PreviousHash::Genesis,
    };
    let transactions: Vec<Transaction> =
        serde_json::from_str(vector.transactions).expect("vector transactions are JSON objects");
    let timestamp = parse_timestamp(vector.timestamp).expect("vector timestamp is ISO-8601");

    Block::new(vector.index, previous_hash, transactions, timestamp)
}

/// Verify all golden vectors produce the expected block hashes.
///
/// Returns `(name, matches, computed_hash)` for each vector.
pub fn verify_all_vectors() -> Vec<(String, bool, String)> {
    all_vectors()
        .iter()
        .map(|v| {
            let block = block_from_vector(v);
            let hex = block.hash().to_hex();
            let root = block.merkle_root().digest().map(Sha256Hash::to_hex);

            let matches = hex == v.expected_hash
                && root.as_deref() == v.expected_merkle_root;

            (v.name.to_string(), matches, hex)
        })
        .collect()
}
