//! Trade configuration.

use std::path::Path;
use std::time::Duration;

use alloy::primitives::Address;
use serde::{Deserialize, Serialize};

use ct_chain::{base, ChainDefinition, ReceiptPoller};

use crate::error::ConfigError;

/// Canonical USDC contract on Base.
const BASE_USDC: &str = "0x833589fCD6eDb6E08f4c7C32D4f71b54bdA02913";

fn default_settlement_chain() -> ChainDefinition {
    base()
}

fn default_usdc_address() -> String {
    BASE_USDC.to_string()
}

fn default_slippage_bps() -> u32 {
    100
}

fn default_quote_ttl_ms() -> u64 {
    30_000
}

fn default_receipt_poll_interval_ms() -> u64 {
    2_000
}

fn default_receipt_max_wait_ms() -> u64 {
    120_000
}

fn default_max_quote_quantity() -> u64 {
    100
}

/// Settings for the trade flow. Defaults describe USDC settlement on
/// Base mainnet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeConfig {
    /// Network every trade settles on.
    #[serde(default = "default_settlement_chain")]
    pub settlement_chain: ChainDefinition,

    /// Stablecoin contract address (hex).
    #[serde(default = "default_usdc_address")]
    pub usdc_address: String,

    /// Slippage tolerance applied to settlement bounds, in basis points.
    #[serde(default = "default_slippage_bps")]
    pub slippage_bps: u32,

    /// How long a quote may be used before settlement refetches it.
    #[serde(default = "default_quote_ttl_ms")]
    pub quote_ttl_ms: u64,

    /// Interval between transaction receipt polls.
    #[serde(default = "default_receipt_poll_interval_ms")]
    pub receipt_poll_interval_ms: u64,

    /// Maximum wait for a transaction to confirm.
    #[serde(default = "default_receipt_max_wait_ms")]
    pub receipt_max_wait_ms: u64,

    /// Per-trade quantity cap; larger requests are rejected at quoting.
    #[serde(default = "default_max_quote_quantity")]
    pub max_quote_quantity: u64,
}

impl Default for TradeConfig {
    fn default() -> Self {
        Self {
            settlement_chain: default_settlement_chain(),
            usdc_address: default_usdc_address(),
            slippage_bps: default_slippage_bps(),
            quote_ttl_ms: default_quote_ttl_ms(),
            receipt_poll_interval_ms: default_receipt_poll_interval_ms(),
            receipt_max_wait_ms: default_receipt_max_wait_ms(),
            max_quote_quantity: default_max_quote_quantity(),
        }
    }
}

impl TradeConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::Read(format!("{}: {e}", path.as_ref().display())))?;
        let config: Self = toml::from_str(&raw).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate field values and cross-field consistency.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.usdc()?;
        if self.slippage_bps >= 10_000 {
            return Err(ConfigError::Invalid(format!(
                "slippage_bps must be below 10000, got {}",
                self.slippage_bps
            )));
        }
        if self.receipt_poll_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "receipt_poll_interval_ms must be positive".to_string(),
            ));
        }
        if self.receipt_max_wait_ms < self.receipt_poll_interval_ms {
            return Err(ConfigError::Invalid(
                "receipt_max_wait_ms must be at least receipt_poll_interval_ms".to_string(),
            ));
        }
        if self.max_quote_quantity == 0 {
            return Err(ConfigError::Invalid(
                "max_quote_quantity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Parsed stablecoin contract address.
    pub fn usdc(&self) -> Result<Address, ConfigError> {
        self.usdc_address
            .parse()
            .map_err(|_| ConfigError::Invalid(format!("invalid usdc_address: {}", self.usdc_address)))
    }

    #[must_use]
    pub fn quote_ttl(&self) -> Duration {
        Duration::from_millis(self.quote_ttl_ms)
    }

    #[must_use]
    pub fn receipt_poll_interval(&self) -> Duration {
        Duration::from_millis(self.receipt_poll_interval_ms)
    }

    #[must_use]
    pub fn receipt_max_wait(&self) -> Duration {
        Duration::from_millis(self.receipt_max_wait_ms)
    }

    /// Receipt poller configured from the polling fields.
    #[must_use]
    pub fn receipt_poller(&self) -> ReceiptPoller {
        ReceiptPoller::new(self.receipt_poll_interval(), self.receipt_max_wait())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = TradeConfig::default();
        config.validate().unwrap();
        assert_eq!(config.settlement_chain.chain_id, 8453);
        assert_eq!(config.slippage_bps, 100);
        assert_eq!(config.receipt_poll_interval(), Duration::from_secs(2));
    }

    #[test]
    fn test_shipped_default_config_matches_builtin_defaults() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../../config/default.toml");
        let shipped = TradeConfig::from_file(path).unwrap();
        let builtin = TradeConfig::default();
        assert_eq!(shipped.settlement_chain, builtin.settlement_chain);
        assert_eq!(shipped.usdc_address, builtin.usdc_address);
        assert_eq!(shipped.slippage_bps, builtin.slippage_bps);
        assert_eq!(shipped.quote_ttl_ms, builtin.quote_ttl_ms);
        assert_eq!(
            shipped.receipt_poll_interval_ms,
            builtin.receipt_poll_interval_ms
        );
        assert_eq!(shipped.receipt_max_wait_ms, builtin.receipt_max_wait_ms);
        assert_eq!(shipped.max_quote_quantity, builtin.max_quote_quantity);
    }

    #[test]
    fn test_parse_partial_toml_fills_defaults() {
        let config: TradeConfig = toml::from_str("slippage_bps = 50").unwrap();
        assert_eq!(config.slippage_bps, 50);
        assert_eq!(config.quote_ttl_ms, 30_000);
        assert_eq!(config.usdc_address, BASE_USDC);
    }

    #[test]
    fn test_rejects_bad_usdc_address() {
        let config = TradeConfig {
            usdc_address: "not-an-address".to_string(),
            ..TradeConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_full_slippage() {
        let config = TradeConfig {
            slippage_bps: 10_000,
            ..TradeConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_wait_below_interval() {
        let config = TradeConfig {
            receipt_poll_interval_ms: 5_000,
            receipt_max_wait_ms: 1_000,
            ..TradeConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
