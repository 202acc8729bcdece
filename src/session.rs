//! Purchase form state.
//!
//! The session is a plain value: handlers borrow the current one and hand
//! back a new one, so a failed handler leaves the caller's copy untouched.

use alloy::primitives::Address;
use serde::{Deserialize, Serialize};

use crate::currency::{Currency, CurrencyTable, ResolvedCurrency, StablecoinAbi};

/// Contracts the session currently targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveContracts {
    pub stablecoin_address: Address,
    pub sale_address: Address,
    pub abi: StablecoinAbi,
    pub chain_id: u64,
}

impl From<&ResolvedCurrency> for ActiveContracts {
    fn from(resolved: &ResolvedCurrency) -> Self {
        Self {
            stablecoin_address: resolved.stablecoin_address,
            sale_address: resolved.sale_address,
            abi: resolved.abi,
            chain_id: resolved.chain_id,
        }
    }
}

/// User input plus the contracts it resolves to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseSession {
    pub amount: Option<String>,
    pub selected_currency: Currency,
    pub active: ActiveContracts,
}

impl PurchaseSession {
    /// A fresh session with no amount.
    pub fn new(table: &CurrencyTable, currency: Currency) -> Self {
        Self {
            amount: None,
            selected_currency: currency,
            active: ActiveContracts::from(&table.resolve(currency)),
        }
    }

    /// Copy of this session with the amount replaced; blank clears it.
    pub fn with_amount(&self, amount: impl Into<String>) -> Self {
        let amount = amount.into();
        Self {
            amount: (!amount.trim().is_empty()).then_some(amount),
            ..self.clone()
        }
    }

    /// Copy of this session pointed at another currency's contracts.
    pub fn with_currency(&self, resolved: &ResolvedCurrency) -> Self {
        Self {
            selected_currency: resolved.currency,
            active: ActiveContracts::from(resolved),
            ..self.clone()
        }
    }
}

/// A single edit of the purchase form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "snake_case")]
pub enum InputChange {
    Amount(String),
    SelectedCurrency(Currency),
}
