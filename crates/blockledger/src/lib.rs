//! # Blockledger
//!
//! The unified API for blockledger - an append-only, hash-linked ledger of
//! transaction blocks.
//!
//! ## Overview
//!
//! - **Transactions**: JSON-object records, committed in batches
//! - **Blocks**: Immutable batches linked to their predecessor by hash, each
//!   carrying the Merkle root of its transactions
//! - **Chain**: Blocks in index order, grown only by appending
//! - **Validation**: Link, self-digest, and Merkle-root checks over the chain
//!
//! ## Usage
//!
//! ```rust,no_run
//! use blockledger::{Ledger, LedgerConfig};
//! use blockledger::store::SqliteStore;
//! use serde_json::json;
//!
//! async fn example() {
//!     // Open storage
//!     let store = SqliteStore::open("ledger.db").unwrap();
//!
//!     // Open the ledger (creates the genesis block on first use)
//!     let mut ledger = Ledger::open(store, LedgerConfig::default()).await.unwrap();
//!
//!     // Commit a batch
//!     let blocks = ledger
//!         .append_records(&[json!({"id": 1}), json!({"id": 2})])
//!         .await
//!         .unwrap();
//!     println!("sealed {} block(s)", blocks.len());
//!
//!     assert!(ledger.validate().is_ok());
//! }
//! ```
//!
//! ## Re-exports
//!
//! This crate re-exports the component crates for convenience:
//!
//! - `blockledger::core` - Core primitives (Block, Chain, Merkle trees, etc.)
//! - `blockledger::store` - Storage abstraction, SQLite, and JSON files

pub mod config;
pub mod error;
pub mod ledger;

// Re-export component crates
pub use blockledger_core as core;
pub use blockledger_store as store;

// Re-export main types for convenience
pub use config::LedgerConfig;
pub use error::{LedgerError, Result};
pub use ledger::Ledger;

// Re-export commonly used core types
pub use blockledger_core::{
    Block, BlockBuilder, Chain, ChainHealth, Clock, FixedClock, MerkleProof, MerkleRoot,
    MerkleTree, PreviousHash, Sha256Hash, SteppingClock, SystemClock, Transaction,
    ValidationError, ValidationMode,
};
