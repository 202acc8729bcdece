//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the sale client.
//! All types derive Serde traits for deserialization from config files.

use alloy::primitives::Address;
use serde::{Deserialize, Serialize};

use crate::currency::Currency;

/// Root configuration for the sale client.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct SaleConfig {
    /// Wallet connector settings.
    pub connector: ConnectorConfig,

    /// RPC endpoints and confirmation policy.
    pub blockchain: BlockchainConfig,

    /// Purchase flow tuning.
    pub purchase: PurchaseConfig,

    /// Static currency table.
    pub currencies: CurrenciesConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Wallet connector configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ConnectorConfig {
    /// Project identifier handed to the wallet connector.
    pub project_id: String,

    /// Environment variable holding the signer's private key.
    pub private_key_env: String,
}

impl Default for ConnectorConfig {
    fn default() -> Self {
        Self {
            project_id: String::new(),
            private_key_env: "SALE_WALLET_PRIVATE_KEY".to_string(),
        }
    }
}

/// Blockchain integration configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BlockchainConfig {
    /// RPC request timeout in seconds.
    pub rpc_timeout_secs: u64,

    /// Number of block confirmations required for finality.
    pub confirmation_blocks: u32,

    /// Networks the wallet may switch between.
    pub networks: Vec<NetworkConfig>,
}

impl Default for BlockchainConfig {
    fn default() -> Self {
        Self {
            rpc_timeout_secs: 10,
            confirmation_blocks: 1,
            networks: vec![
                NetworkConfig::new(11155111, "sepolia", "https://rpc.sepolia.org"),
                NetworkConfig::new(5, "goerli", "https://rpc.ankr.com/eth_goerli"),
                NetworkConfig::new(97, "bsc-testnet", "https://data-seed-prebsc-1-s1.binance.org:8545"),
            ],
        }
    }
}

impl BlockchainConfig {
    /// Look up the network entry for a chain id.
    pub fn network(&self, chain_id: u64) -> Option<&NetworkConfig> {
        self.networks.iter().find(|n| n.chain_id == chain_id)
    }
}

/// A single EVM network reachable over JSON-RPC.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NetworkConfig {
    /// Chain ID (e.g., 11155111 for Sepolia).
    pub chain_id: u64,

    /// Human readable name for logs.
    pub name: String,

    /// JSON-RPC endpoint URL.
    pub rpc_url: String,

    /// Failover JSON-RPC endpoint URLs.
    #[serde(default)]
    pub failover_urls: Vec<String>,
}

impl NetworkConfig {
    pub fn new(chain_id: u64, name: &str, rpc_url: &str) -> Self {
        Self {
            chain_id,
            name: name.to_string(),
            rpc_url: rpc_url.to_string(),
            failover_urls: Vec::new(),
        }
    }
}

/// Purchase flow configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PurchaseConfig {
    /// Gas limit attached to both the approval and the purchase call.
    pub gas_limit: u64,

    /// Maximum time to wait for a single transaction to confirm.
    pub confirmation_timeout_secs: u64,

    /// Base receipt polling interval in milliseconds.
    pub poll_interval_ms: u64,

    /// Upper bound for the receipt polling backoff in milliseconds.
    pub max_poll_backoff_ms: u64,

    /// Where purchase records are persisted.
    pub journal_path: String,
}

impl Default for PurchaseConfig {
    fn default() -> Self {
        Self {
            gas_limit: 100_000,
            confirmation_timeout_secs: 300,
            poll_interval_ms: 2_000,
            max_poll_backoff_ms: 15_000,
            journal_path: "purchases.json".to_string(),
        }
    }
}

/// Contract addresses and chain parameters for each accepted stablecoin.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CurrenciesConfig {
    pub usdt: CurrencyConfig,
    pub usdc: CurrencyConfig,
    pub busd: CurrencyConfig,
}

impl Default for CurrenciesConfig {
    fn default() -> Self {
        Self {
            usdt: CurrencyConfig::unconfigured(11155111, 6),
            usdc: CurrencyConfig::unconfigured(5, 6),
            busd: CurrencyConfig::unconfigured(97, 18),
        }
    }
}

impl CurrenciesConfig {
    /// Get the entry for a currency.
    pub fn get(&self, currency: Currency) -> &CurrencyConfig {
        match currency {
            Currency::Usdt => &self.usdt,
            Currency::Usdc => &self.usdc,
            Currency::Busd => &self.busd,
        }
    }
}

/// Static record for one stablecoin.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CurrencyConfig {
    /// ERC-20 stablecoin contract.
    pub stablecoin_address: Address,

    /// Sale contract accepting this stablecoin.
    pub sale_address: Address,

    /// Chain the two contracts live on.
    pub chain_id: u64,

    /// Decimal exponent of the stablecoin.
    pub decimals: u8,
}

impl CurrencyConfig {
    fn unconfigured(chain_id: u64, decimals: u8) -> Self {
        Self {
            stablecoin_address: Address::ZERO,
            sale_address: Address::ZERO,
            chain_id,
            decimals,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit JSON log lines instead of the human readable format.
    pub json: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_currency_chains() {
        let config = SaleConfig::default();
        assert_eq!(config.currencies.usdt.chain_id, 11155111);
        assert_eq!(config.currencies.usdc.chain_id, 5);
        assert_eq!(config.currencies.busd.chain_id, 97);
        assert_eq!(config.currencies.busd.decimals, 18);
        assert!(config.blockchain.network(97).is_some());
    }

    #[test]
    fn test_partial_toml() {
        let raw = r#"
            [purchase]
            gas_limit = 150000

            [currencies.usdt]
            stablecoin_address = "0x1111111111111111111111111111111111111111"
            sale_address = "0x2222222222222222222222222222222222222222"
            chain_id = 11155111
            decimals = 6
        "#;
        let config: SaleConfig = toml::from_str(raw).unwrap();
        assert_eq!(config.purchase.gas_limit, 150_000);
        assert_eq!(config.purchase.poll_interval_ms, 2_000);
        assert_ne!(config.currencies.usdt.sale_address, Address::ZERO);
        assert_eq!(config.currencies.usdc.sale_address, Address::ZERO);
    }
}
