//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check referential integrity (every currency chain has an RPC network)
//! - Validate value ranges (timeouts > 0, decimals sane, addresses set)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: SaleConfig → Result<(), Vec<ValidationError>>

use alloy::primitives::Address;
use thiserror::Error;

use crate::config::schema::SaleConfig;
use crate::currency::Currency;

/// Largest decimal exponent accepted for a stablecoin.
pub const MAX_DECIMALS: u8 = 36;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{currency}: {field} is the zero address")]
    ZeroAddress { currency: Currency, field: &'static str },

    #[error("{currency}: chain {chain_id} has no configured RPC network")]
    MissingNetwork { currency: Currency, chain_id: u64 },

    #[error("{currency}: decimals {decimals} exceeds {max}", max = MAX_DECIMALS)]
    Decimals { currency: Currency, decimals: u8 },

    #[error("network {chain_id}: invalid RPC URL '{url}'")]
    InvalidUrl { chain_id: u64, url: String },

    #[error("network {0} is configured more than once")]
    DuplicateNetwork(u64),

    #[error("{0} must be greater than zero")]
    Zero(&'static str),
}

pub fn validate_config(config: &SaleConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    for currency in Currency::ALL {
        let entry = config.currencies.get(currency);
        if entry.stablecoin_address == Address::ZERO {
            errors.push(ValidationError::ZeroAddress {
                currency,
                field: "stablecoin_address",
            });
        }
        if entry.sale_address == Address::ZERO {
            errors.push(ValidationError::ZeroAddress {
                currency,
                field: "sale_address",
            });
        }
        if entry.decimals > MAX_DECIMALS {
            errors.push(ValidationError::Decimals {
                currency,
                decimals: entry.decimals,
            });
        }
        if config.blockchain.network(entry.chain_id).is_none() {
            errors.push(ValidationError::MissingNetwork {
                currency,
                chain_id: entry.chain_id,
            });
        }
    }

    let mut seen = Vec::new();
    for network in &config.blockchain.networks {
        if seen.contains(&network.chain_id) {
            errors.push(ValidationError::DuplicateNetwork(network.chain_id));
        }
        seen.push(network.chain_id);

        for url in std::iter::once(&network.rpc_url).chain(&network.failover_urls) {
            if url.parse::<url::Url>().is_err() {
                errors.push(ValidationError::InvalidUrl {
                    chain_id: network.chain_id,
                    url: url.clone(),
                });
            }
        }
    }

    if config.blockchain.rpc_timeout_secs == 0 {
        errors.push(ValidationError::Zero("blockchain.rpc_timeout_secs"));
    }
    if config.purchase.gas_limit == 0 {
        errors.push(ValidationError::Zero("purchase.gas_limit"));
    }
    if config.purchase.confirmation_timeout_secs == 0 {
        errors.push(ValidationError::Zero("purchase.confirmation_timeout_secs"));
    }
    if config.purchase.poll_interval_ms == 0 {
        errors.push(ValidationError::Zero("purchase.poll_interval_ms"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::NetworkConfig;

    fn filled_config() -> SaleConfig {
        let mut config = SaleConfig::default();
        for (i, entry) in [
            &mut config.currencies.usdt,
            &mut config.currencies.usdc,
            &mut config.currencies.busd,
        ]
        .into_iter()
        .enumerate()
        {
            entry.stablecoin_address = Address::repeat_byte(0x10 + i as u8);
            entry.sale_address = Address::repeat_byte(0x20 + i as u8);
        }
        config
    }

    #[test]
    fn test_default_config_requires_addresses() {
        let errors = validate_config(&SaleConfig::default()).unwrap_err();
        assert_eq!(errors.len(), 6);
        assert!(errors.contains(&ValidationError::ZeroAddress {
            currency: Currency::Busd,
            field: "sale_address",
        }));
    }

    #[test]
    fn test_filled_config_is_valid() {
        assert!(validate_config(&filled_config()).is_ok());
    }

    #[test]
    fn test_collects_every_error() {
        let mut config = filled_config();
        config.blockchain.networks.retain(|n| n.chain_id != 5);
        config.blockchain.networks.push(NetworkConfig::new(97, "dup", "not a url"));
        config.purchase.gas_limit = 0;
        config.currencies.usdt.decimals = 40;

        let errors = validate_config(&config).unwrap_err();
        assert!(errors.contains(&ValidationError::MissingNetwork {
            currency: Currency::Usdc,
            chain_id: 5,
        }));
        assert!(errors.contains(&ValidationError::DuplicateNetwork(97)));
        assert!(errors.contains(&ValidationError::Zero("purchase.gas_limit")));
        assert!(errors
            .iter()
            .any(|e| matches!(e, ValidationError::InvalidUrl { chain_id: 97, .. })));
        assert!(errors
            .iter()
            .any(|e| matches!(e, ValidationError::Decimals { decimals: 40, .. })));
    }
}
