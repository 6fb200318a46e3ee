//! Database schema migrations for SQLite.
//!
//! We use a simple versioned migration system. Each migration is a SQL string
//! that transforms the schema from version N to N+1.

use chrono::Utc;
use rusqlite::Connection;
use tracing::info;

use crate::error::{Result, StoreError};

/// Current schema version.
pub const CURRENT_VERSION: u32 = 1;

/// Initialize or migrate the database schema.
///
/// This function is idempotent - it can be called multiple times safely.
pub fn migrate(conn: &mut Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at INTEGER NOT NULL
        )",
        [],
    )?;

    let current: u32 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
        [],
        |row| row.get(0),
    )?;

    if current > CURRENT_VERSION {
        return Err(StoreError::Migration(format!(
            "database schema version {} is newer than supported version {}",
            current, CURRENT_VERSION
        )));
    }

    if current < CURRENT_VERSION {
        let tx = conn.transaction()?;

        for version in (current + 1)..=CURRENT_VERSION {
            apply_migration(&tx, version)?;

            tx.execute(
                "INSERT INTO schema_migrations (version, applied_at) VALUES (?1, ?2)",
                rusqlite::params![version, Utc::now().timestamp_millis()],
            )?;
        }

        tx.commit()?;
        info!(from = current, to = CURRENT_VERSION, "migrated block store schema");
    }

    Ok(())
}

/// Apply a specific migration version.
fn apply_migration(conn: &Connection, version: u32) -> Result<()> {
    match version {
        1 => apply_v1(conn),
        _ => Err(StoreError::Migration(format!(
            "unknown migration version: {}",
            version
        ))),
    }
}

/// Migration v1: Initial schema.
fn apply_v1(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE blocks (
            block_index INTEGER PRIMARY KEY,  -- position in the chain, from 0
            hash TEXT NOT NULL UNIQUE,        -- hex SHA-256 block hash
            previous_hash TEXT,               -- hex, NULL for the genesis sentinel
            merkle_root TEXT,                 -- hex, NULL for an empty block
            timestamp TEXT NOT NULL,          -- ISO-8601 with offset
            tx_count INTEGER NOT NULL,
            body TEXT NOT NULL                -- full block representation (JSON)
        );

        CREATE INDEX idx_blocks_timestamp ON blocks(timestamp);
        "#,
    )?;

    Ok(())
}
