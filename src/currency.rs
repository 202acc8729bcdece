//! Accepted stablecoins and their static contract table.

use std::fmt;
use std::str::FromStr;

use alloy::primitives::utils::{parse_units, ParseUnits};
use alloy::primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::schema::CurrenciesConfig;

/// Stablecoins the sale accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Currency {
    Usdt,
    Usdc,
    Busd,
}

impl Currency {
    pub const ALL: [Currency; 3] = [Currency::Usdt, Currency::Usdc, Currency::Busd];

    /// Lowercase key used in config files and on the command line.
    pub fn key(self) -> &'static str {
        match self {
            Currency::Usdt => "usdt",
            Currency::Usdc => "usdc",
            Currency::Busd => "busd",
        }
    }

    /// Token symbol for display.
    pub fn symbol(self) -> &'static str {
        match self {
            Currency::Usdt => "USDT",
            Currency::Usdc => "USDC",
            Currency::Busd => "BUSD",
        }
    }

    /// ABI document the stablecoin contract is described by.
    pub fn abi(self) -> StablecoinAbi {
        match self {
            Currency::Usdt => StablecoinAbi::Tether,
            Currency::Usdc => StablecoinAbi::UsdCoin,
            Currency::Busd => StablecoinAbi::BinanceUsd,
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown currency '{0}' (expected usdt, usdc or busd)")]
pub struct UnknownCurrency(pub String);

impl FromStr for Currency {
    type Err = UnknownCurrency;

    /// Case-insensitive, so `"USDT"` and `"usdt"` resolve to the same entry.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "usdt" => Ok(Currency::Usdt),
            "usdc" => Ok(Currency::Usdc),
            "busd" => Ok(Currency::Busd),
            _ => Err(UnknownCurrency(s.to_string())),
        }
    }
}

/// Identity of the ABI document describing a stablecoin contract.
///
/// All three expose the ERC-20 `approve(address,uint256)` entry point, so
/// calls are encoded through the shared `IERC20` binding; the identity is
/// tracked so the active session always names the document it targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StablecoinAbi {
    Tether,
    UsdCoin,
    BinanceUsd,
}

/// Errors raised while turning a user-entered amount into token units.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountError {
    #[error("amount is empty")]
    Empty,

    #[error("amount '{0}' is not a valid decimal number: {1}")]
    Invalid(String, String),

    #[error("amount must be greater than zero")]
    NotPositive,
}

/// One fully resolved row of the currency table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedCurrency {
    pub currency: Currency,
    pub stablecoin_address: Address,
    pub sale_address: Address,
    pub chain_id: u64,
    pub decimals: u8,
    pub abi: StablecoinAbi,
}

impl ResolvedCurrency {
    /// Scale a decimal string by this currency's exponent.
    ///
    /// `"10"` with 6 decimals becomes `10_000_000`.
    pub fn to_units(&self, amount: &str) -> Result<U256, AmountError> {
        let amount = amount.trim();
        if amount.is_empty() {
            return Err(AmountError::Empty);
        }

        let parsed = parse_units(amount, self.decimals)
            .map_err(|e| AmountError::Invalid(amount.to_string(), e.to_string()))?;

        match parsed {
            ParseUnits::U256(units) if !units.is_zero() => Ok(units),
            ParseUnits::U256(_) => Err(AmountError::NotPositive),
            ParseUnits::I256(_) => Err(AmountError::NotPositive),
        }
    }
}

/// Immutable currency → contract table, built once from configuration.
#[derive(Debug, Clone)]
pub struct CurrencyTable {
    entries: [ResolvedCurrency; 3],
}

impl CurrencyTable {
    pub fn from_config(config: &CurrenciesConfig) -> Self {
        let entries = Currency::ALL.map(|currency| {
            let entry = config.get(currency);
            ResolvedCurrency {
                currency,
                stablecoin_address: entry.stablecoin_address,
                sale_address: entry.sale_address,
                chain_id: entry.chain_id,
                decimals: entry.decimals,
                abi: currency.abi(),
            }
        });
        Self { entries }
    }

    pub fn resolve(&self, currency: Currency) -> ResolvedCurrency {
        let idx = match currency {
            Currency::Usdt => 0,
            Currency::Usdc => 1,
            Currency::Busd => 2,
        };
        self.entries[idx]
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResolvedCurrency> {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn usdt() -> ResolvedCurrency {
        ResolvedCurrency {
            currency: Currency::Usdt,
            stablecoin_address: Address::repeat_byte(1),
            sale_address: Address::repeat_byte(2),
            chain_id: 11155111,
            decimals: 6,
            abi: StablecoinAbi::Tether,
        }
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("usdt".parse::<Currency>().unwrap(), Currency::Usdt);
        assert_eq!("USDC".parse::<Currency>().unwrap(), Currency::Usdc);
        assert_eq!(" Busd ".parse::<Currency>().unwrap(), Currency::Busd);
        assert!("dai".parse::<Currency>().is_err());
    }

    #[test]
    fn test_serde_uses_lowercase_keys() {
        let json = serde_json::to_string(&Currency::Busd).unwrap();
        assert_eq!(json, "\"busd\"");
        let decoded: Currency = serde_json::from_str("\"usdc\"").unwrap();
        assert_eq!(decoded, Currency::Usdc);
    }

    #[test]
    fn test_each_currency_has_its_own_abi() {
        assert_eq!(Currency::Usdt.abi(), StablecoinAbi::Tether);
        assert_eq!(Currency::Usdc.abi(), StablecoinAbi::UsdCoin);
        assert_eq!(Currency::Busd.abi(), StablecoinAbi::BinanceUsd);
    }

    #[test]
    fn test_amount_scaling() {
        let usdt = usdt();
        assert_eq!(usdt.to_units("10").unwrap(), U256::from(10_000_000u64));
        assert_eq!(usdt.to_units("1.5").unwrap(), U256::from(1_500_000u64));

        let busd = ResolvedCurrency { decimals: 18, ..usdt };
        assert_eq!(
            busd.to_units("2").unwrap(),
            U256::from(2_000_000_000_000_000_000u128)
        );
    }

    #[test]
    fn test_amount_rejects_bad_input() {
        let usdt = usdt();
        assert_eq!(usdt.to_units("  "), Err(AmountError::Empty));
        assert_eq!(usdt.to_units("0"), Err(AmountError::NotPositive));
        assert!(matches!(usdt.to_units("ten"), Err(AmountError::Invalid(..))));
    }

    #[test]
    fn test_table_resolution() {
        let mut config = CurrenciesConfig::default();
        config.usdc.stablecoin_address = Address::repeat_byte(0xcc);
        let table = CurrencyTable::from_config(&config);

        let usdc = table.resolve(Currency::Usdc);
        assert_eq!(usdc.stablecoin_address, Address::repeat_byte(0xcc));
        assert_eq!(usdc.chain_id, 5);
        assert_eq!(usdc.abi, StablecoinAbi::UsdCoin);
        assert_eq!(table.iter().count(), 3);
    }
}
