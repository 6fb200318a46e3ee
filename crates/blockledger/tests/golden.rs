//! Golden test vectors for cross-implementation verification.
//!
//! Every implementation of blockledger must produce identical:
//! - canonical record bytes
//! - Merkle roots
//! - block hashes
//! - chain representations

use blockledger::core::canonical::canonical_json;
use blockledger::core::clock::parse_timestamp;
use blockledger::core::merkle_root;
use blockledger::{Block, Chain, MerkleRoot, PreviousHash, SteppingClock, Transaction};
use chrono::Duration;
use serde_json::{json, Value};

fn tx(value: Value) -> Transaction {
    Transaction::try_from(value).unwrap()
}

fn clock() -> SteppingClock {
    SteppingClock::new(
        parse_timestamp("2024-01-01T09:00:00+09:00").unwrap(),
        Duration::seconds(1),
    )
}

#[test]
fn golden_canonical_bytes() {
    let cases = [
        (json!({"b": 2, "a": 1}), r#"{"a": 1, "b": 2}"#),
        (json!({"list": [1, "x", null, true]}), r#"{"list": [1, "x", null, true]}"#),
        (json!({"nested": {"z": 0, "y": {}}}), r#"{"nested": {"y": {}, "z": 0}}"#),
        (json!({"name": "caf\u{e9}"}), r#"{"name": "caf\u00e9"}"#),
    ];

    for (value, expected) in cases {
        assert_eq!(String::from_utf8(canonical_json(&value)).unwrap(), expected);
    }
}

#[test]
fn golden_merkle_roots() {
    let cases: [(Vec<u64>, &str); 3] = [
        (vec![1], "354aaef7a5f6ecbb2faee49fbe47a24e024cb62b3183b853a1ecc01e01920e49"),
        (vec![1, 2], "fda55d69266bbd1c07b82901e0dc7f7f0059892a87e4d54bd34ab777e8dca5de"),
        (vec![1, 2, 3], "eff7e7de64326d5788c1109f08beaa575498aacaee2ba2958e79a16fd69a3ab3"),
    ];

    for (ids, expected) in cases {
        let txs: Vec<Transaction> = ids.iter().map(|id| tx(json!({ "id": id }))).collect();
        let root = merkle_root(&txs);
        assert_eq!(root.digest().unwrap().to_hex(), expected, "ids {:?}", ids);
    }

    assert_eq!(merkle_root(&[]), MerkleRoot::Empty);
}

#[test]
fn golden_chain() {
    let clock = clock();
    let mut chain = Chain::new(vec![tx(json!({"a": 1}))], 20, &clock).unwrap();
    chain.append(
        vec![tx(json!({"id": 1})), tx(json!({"id": 2})), tx(json!({"id": 3}))],
        &clock,
    );

    let hashes: Vec<String> = chain.blocks().iter().map(|b| b.hash().to_hex()).collect();
    assert_eq!(
        hashes,
        vec![
            "a31687343681c8c1b43d02829abab1edd0b5603bd43de48fbb24969bfaea4443",
            "c1f518f31b62324ff4e51ae7a3915b4b320bd6f91280d2ae8a964cd8042a3663",
            "7ac89d1e4f9c7f31344b302809523d52f76969f99eca5fa82e8588e23e089a41",
        ]
    );
}

#[test]
fn golden_empty_genesis() {
    let at = parse_timestamp("2024-01-01T00:00:00+00:00").unwrap();
    let block = Block::new(0, PreviousHash::Genesis, vec![], at);
    assert_eq!(
        block.hash().to_hex(),
        "d4737d1ab7a0ff040cded3f5019cc99f46db852e242541fea810cc4ffcb8a505"
    );
}

#[test]
fn golden_representation_shape() {
    let clock = clock();
    let chain = Chain::new(vec![tx(json!({"a": 1}))], 20, &clock).unwrap();
    let repr = chain.to_representation();

    assert_eq!(
        repr,
        json!([{
            "index": 0,
            "previous_hash": 0,
            "transactions": [{"a": 1}],
            "timestamp": "2024-01-01T09:00:00+09:00",
            "hash": "a31687343681c8c1b43d02829abab1edd0b5603bd43de48fbb24969bfaea4443",
            "merkle_tree": "f9d86028c6e0d64e225186f96acb69338b2c59764df79162107f5c4bb34d1310",
        }])
    );
}
