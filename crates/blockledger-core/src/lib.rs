//! # Blockledger Core
//!
//! Pure primitives for blockledger: canonical hashing, Merkle roots, blocks,
//! and hash-linked chains.
//!
//! This crate contains no I/O and no storage. Time enters only through the
//! [`Clock`] trait.
//!
//! ## Key Types
//!
//! - [`Transaction`] - A JSON-object record committed to the ledger
//! - [`Block`] - An immutable batch of transactions linked to its predecessor
//! - [`Chain`] - An ordered, append-only sequence of blocks
//! - [`PreviousHash`] / [`MerkleRoot`] - Digests with explicit "none" sentinels
//!
//! ## Canonicalization
//!
//! Every digest is SHA-256 over a canonical JSON encoding with sorted keys.
//! See the [`canonical`] module.

pub mod block;
pub mod canonical;
pub mod chain;
pub mod clock;
pub mod crypto;
pub mod error;
pub mod merkle;
pub mod types;
pub mod validation;

pub use block::{Block, BlockBuilder};
pub use canonical::{canonical_bytes, canonical_json, hash_record, hash_value};
pub use chain::{partition, Chain, DEFAULT_MAX_BLOCK_SIZE};
pub use clock::{Clock, FixedClock, SteppingClock, SystemClock, Timestamp};
pub use crypto::Sha256Hash;
pub use error::{CoreError, LoadError, ValidationError};
pub use merkle::{diff_leaves, merkle_root, MerkleProof, MerkleTree};
pub use types::{MerkleRoot, PreviousHash, Transaction};
pub use validation::{audit_blocks, validate_block, validate_blocks, ChainHealth, ValidationMode};
