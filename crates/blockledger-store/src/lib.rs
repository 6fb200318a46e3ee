//! # Blockledger Store
//!
//! Storage abstraction for blockledger. Provides a trait-based interface
//! for block persistence with SQLite, JSON file, and in-memory
//! implementations.
//!
//! ## Key Types
//!
//! - [`BlockStore`] - The async trait for all storage operations
//! - [`SqliteStore`] - SQLite-based persistent storage
//! - [`JsonFileStore`] - The chain representation in one flat JSON file
//! - [`MemoryStore`] - In-memory storage for tests
//! - [`InsertResult`] - Result of inserting blocks
//!
//! ## Usage
//!
//! ```rust,no_run
//! use blockledger_store::{BlockStore, SqliteStore};
//!
//! async fn example() {
//!     // Open a SQLite database
//!     let store = SqliteStore::open("ledger.db").unwrap();
//!
//!     // Or use an in-memory database for testing
//!     let store = SqliteStore::open_memory().unwrap();
//!
//!     let blocks = store.load_blocks().await.unwrap();
//!     println!("{} blocks stored", blocks.len());
//! }
//! ```
//!
//! ## Design Notes
//!
//! - **Idempotent inserts**: Inserting stored blocks again returns `AlreadyExists`
//! - **Conflict detection**: A different block at a stored index returns `Conflict`
//! - **No holes**: A block that skips past the stored tail returns `Gap`

pub mod error;
pub mod json_file;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod traits;

pub use error::{Result, StoreError};
pub use json_file::{default_file_name, JsonFileStore};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{BlockStore, InsertResult};
