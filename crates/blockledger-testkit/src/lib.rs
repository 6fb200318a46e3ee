//! # Blockledger Testkit
//!
//! Testing utilities for blockledger.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Golden vectors**: Known blocks with expected Merkle roots and hashes
//! - **Generators**: Proptest strategies for property-based testing
//! - **Fixtures**: Deterministic clocks, sample chains, and tamper helpers
//!
//! ## Golden Vectors
//!
//! ```rust
//! use blockledger_testkit::vectors::{all_vectors, block_from_vector};
//!
//! for vector in all_vectors() {
//!     let block = block_from_vector(&vector);
//!     assert_eq!(block.hash().to_hex(), vector.expected_hash);
//! }
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use blockledger_testkit::generators::{chain_from_params, ChainParams};
//!
//! proptest! {
//!     #[test]
//!     fn chain_is_valid(params: ChainParams) {
//!         prop_assert!(chain_from_params(&params).is_valid());
//!     }
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! ```rust
//! use blockledger_testkit::fixtures::{id_records, TestFixture};
//!
//! let fixture = TestFixture::with_block_size(20);
//! let chain = fixture.chain_with(&[id_records(1..=3)]);
//! assert_eq!(chain.len(), 3);
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{fixture_clock, id_records, tamper_timestamp, tamper_transaction, TestFixture};
pub use generators::{chain_from_params, ChainParams};
pub use vectors::{all_vectors, block_from_vector, verify_all_vectors, GoldenVector};
