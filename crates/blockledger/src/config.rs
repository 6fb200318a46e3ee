//! Ledger configuration.

use blockledger_core::{SystemClock, Transaction, ValidationMode, DEFAULT_MAX_BLOCK_SIZE};
use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, Result};

/// Configuration for a [`Ledger`](crate::Ledger).
///
/// Every field has a default, so a partial JSON document is enough:
///
/// ```
/// use blockledger::LedgerConfig;
///
/// let config = LedgerConfig::from_json(r#"{ "max_block_size": 4096 }"#).unwrap();
/// assert_eq!(config.max_block_size, 4096);
/// assert!(config.validate_on_open);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Per-block byte budget for canonical transaction content.
    pub max_block_size: usize,
    /// How thoroughly `validate` and `open` check the chain.
    ///
    /// `Full` re-hashes every transaction. Integers outside the `i64`/`u64`
    /// range are read back as floats and re-encode differently, so a chain
    /// holding such values fails `Full`; open it with `Links` instead.
    pub validation: ValidationMode,
    /// Whether `open` validates blocks loaded from the store.
    pub validate_on_open: bool,
    /// Offset, in seconds east of UTC, for wall-clock block timestamps.
    pub utc_offset_seconds: i32,
    /// Transactions of the genesis block when the store is empty.
    pub genesis: Vec<Transaction>,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            max_block_size: DEFAULT_MAX_BLOCK_SIZE,
            validation: ValidationMode::Full,
            validate_on_open: true,
            utc_offset_seconds: 0,
            genesis: Vec::new(),
        }
    }
}

impl LedgerConfig {
    /// Parse a configuration from JSON, filling in defaults.
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| LedgerError::Config(e.to_string()))
    }

    /// Check field ranges without touching any store.
    pub fn check(&self) -> Result<()> {
        if self.max_block_size == 0 {
            return Err(LedgerError::Config("max_block_size must be positive".into()));
        }
        self.system_clock().map(|_| ())
    }

    /// The wall clock at the configured offset.
    pub fn system_clock(&self) -> Result<SystemClock> {
        SystemClock::with_offset_seconds(self.utc_offset_seconds).ok_or_else(|| {
            LedgerError::Config(format!(
                "utc_offset_seconds out of range: {}",
                self.utc_offset_seconds
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blockledger_core::Clock;

    #[test]
    fn test_defaults() {
        let config = LedgerConfig::default();
        assert_eq!(config.max_block_size, 1_000_000);
        assert_eq!(config.validation, ValidationMode::Full);
        assert!(config.validate_on_open);
        assert!(config.genesis.is_empty());
        assert!(config.check().is_ok());
    }

    #[test]
    fn test_from_json_partial() {
        let config = LedgerConfig::from_json(
            r#"{"validation": "links", "utc_offset_seconds": 32400, "genesis": [{"a": 1}]}"#,
        )
        .unwrap();
        assert_eq!(config.validation, ValidationMode::Links);
        assert_eq!(config.max_block_size, DEFAULT_MAX_BLOCK_SIZE);
        assert_eq!(config.genesis.len(), 1);

        let clock = config.system_clock().unwrap();
        assert_eq!(clock.now().offset().local_minus_utc(), 32400);
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(matches!(
            LedgerConfig::from_json(r#"{"genesis": [1]}"#),
            Err(LedgerError::Config(_))
        ));

        let zero = LedgerConfig {
            max_block_size: 0,
            ..LedgerConfig::default()
        };
        assert!(matches!(zero.check(), Err(LedgerError::Config(_))));

        let far = LedgerConfig {
            utc_offset_seconds: 90_000,
            ..LedgerConfig::default()
        };
        assert!(matches!(far.check(), Err(LedgerError::Config(_))));
    }
}
