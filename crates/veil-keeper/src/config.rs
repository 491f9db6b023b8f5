//! Keeper configuration.

use crate::error::{KeeperError, KeeperResult};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use veil_core::{Address, Price};

/// Where a tracked asset's price comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "lowercase")]
pub enum AssetPriceSource {
    /// Quoted by the external feed under this asset id (e.g. "ethereum").
    Feed { id: String },
    /// Pinned to a constant (stablecoins).
    Fixed { price: Price },
}

/// One price-feed entry: a quote source and the on-chain tokens it prices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedAsset {
    #[serde(flatten)]
    pub source: AssetPriceSource,
    pub tokens: Vec<Address>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeeperConfig {
    /// JSON-RPC endpoint of the chain hosting the pool.
    pub rpc_url: String,
    #[serde(default = "default_chain_id")]
    pub chain_id: u64,
    pub pool_address: Address,
    pub price_vault_address: Address,

    /// External quote API base URL.
    #[serde(default = "default_feed_url")]
    pub feed_url: String,

    /// Price-sync loop interval (ms). Default: 10s.
    #[serde(default = "default_price_interval_ms")]
    pub price_interval_ms: u64,
    /// Order-execution loop interval (ms). Default: 15s.
    #[serde(default = "default_order_interval_ms")]
    pub order_interval_ms: u64,
    /// Minimum price move (%) that warrants an on-chain update. Default: 0.5.
    #[serde(default = "default_min_change_percent")]
    pub min_price_change_percent: Decimal,
    /// Upper bound on any submit-and-confirm wait (ms). Default: 90s.
    #[serde(default = "default_confirmation_timeout_ms")]
    pub confirmation_timeout_ms: u64,
    /// Warn at startup when the signer balance is below this (native units).
    #[serde(default = "default_low_balance_warning")]
    pub low_balance_warning: Decimal,

    #[serde(default)]
    pub assets: Vec<TrackedAsset>,
}

fn default_chain_id() -> u64 {
    421614 // Arbitrum Sepolia
}

fn default_feed_url() -> String {
    "https://api.coingecko.com/api/v3".to_string()
}

fn default_price_interval_ms() -> u64 {
    10_000
}

fn default_order_interval_ms() -> u64 {
    15_000
}

fn default_min_change_percent() -> Decimal {
    dec!(0.5)
}

fn default_confirmation_timeout_ms() -> u64 {
    90_000
}

fn default_low_balance_warning() -> Decimal {
    dec!(0.001)
}

impl KeeperConfig {
    /// Load from a TOML file.
    pub fn from_file(path: &str) -> KeeperResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| KeeperError::Config(format!("failed to read {path}: {e}")))?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| KeeperError::Config(format!("failed to parse {path}: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the loops cannot run with.
    pub fn validate(&self) -> KeeperResult<()> {
        if self.rpc_url.is_empty() {
            return Err(KeeperError::Config("rpc_url is empty".into()));
        }
        if self.assets.is_empty() {
            return Err(KeeperError::Config("no tracked assets configured".into()));
        }
        for (i, asset) in self.assets.iter().enumerate() {
            if asset.tokens.is_empty() {
                return Err(KeeperError::Config(format!("asset #{i} has no tokens")));
            }
            if let AssetPriceSource::Feed { id } = &asset.source {
                if id.is_empty() {
                    return Err(KeeperError::Config(format!("asset #{i} has an empty feed id")));
                }
            }
        }
        if self.min_price_change_percent.is_sign_negative() {
            return Err(KeeperError::Config(
                "min_price_change_percent must be non-negative".into(),
            ));
        }
        Ok(())
    }

    pub fn price_interval(&self) -> Duration {
        Duration::from_millis(self.price_interval_ms)
    }

    pub fn order_interval(&self) -> Duration {
        Duration::from_millis(self.order_interval_ms)
    }

    pub fn confirmation_timeout(&self) -> Duration {
        Duration::from_millis(self.confirmation_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        rpc_url = "https://sepolia-rollup.arbitrum.io/rpc"
        pool_address = "0xffcdce40dfd214f2e13f67d9337b0e0e22024f09"
        price_vault_address = "0xb87889a99accf70a2aea7f63fdcde302fcd2e006"

        [[assets]]
        source = "feed"
        id = "ethereum"
        tokens = ["0x62b64cc9b1aa2f2c9d612f0b4a58cfba0eec9be2"]

        [[assets]]
        source = "fixed"
        price = "1"
        tokens = ["0xcc5f8fc3ccab02157f82afb7e19fc65f4808849e"]
    "#;

    #[test]
    fn test_parse_with_defaults() {
        let config: KeeperConfig = toml::from_str(SAMPLE).unwrap();
        config.validate().unwrap();

        assert_eq!(config.chain_id, 421614);
        assert_eq!(config.price_interval(), Duration::from_secs(10));
        assert_eq!(config.order_interval(), Duration::from_secs(15));
        assert_eq!(config.min_price_change_percent, dec!(0.5));
        assert_eq!(config.assets.len(), 2);
        assert_eq!(
            config.assets[0].source,
            AssetPriceSource::Feed { id: "ethereum".into() }
        );
        assert_eq!(
            config.assets[1].source,
            AssetPriceSource::Fixed { price: Price::new(dec!(1)) }
        );
    }

    #[test]
    fn test_validate_rejects_empty_assets() {
        let mut config: KeeperConfig = toml::from_str(SAMPLE).unwrap();
        config.assets.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_tokenless_asset() {
        let mut config: KeeperConfig = toml::from_str(SAMPLE).unwrap();
        config.assets[0].tokens.clear();
        assert!(config.validate().is_err());
    }
}
