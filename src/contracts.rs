//! Contract bindings and call preparation.

use alloy::primitives::{Address, Bytes, U256};
use alloy::sol;
use alloy::sol_types::SolCall;
use serde::{Deserialize, Serialize};

use crate::currency::ResolvedCurrency;

sol! {
    /// ERC-20 surface used by the sale flow.
    #[derive(Debug)]
    interface IERC20 {
        function approve(address spender, uint256 amount) external returns (bool);
    }

    /// Token sale contract accepting stablecoin payment.
    #[derive(Debug)]
    interface ITokenSale {
        function buyTokensWthStableCoin(uint256 amount) external;
    }
}

/// Which contract function a prepared call targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallKind {
    Approve,
    Purchase,
    Revoke,
}

impl CallKind {
    pub fn as_str(self) -> &'static str {
        match self {
            CallKind::Approve => "approve",
            CallKind::Purchase => "purchase",
            CallKind::Revoke => "revoke",
        }
    }
}

/// A fully encoded contract call, ready to be signed and broadcast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedCall {
    pub kind: CallKind,
    pub chain_id: u64,
    pub to: Address,
    pub input: Bytes,
    pub gas_limit: u64,
}

/// `approve(sale, amount)` against the stablecoin.
pub fn prepare_approve(currency: &ResolvedCurrency, amount: U256, gas_limit: u64) -> PreparedCall {
    let call = IERC20::approveCall {
        spender: currency.sale_address,
        amount,
    };
    PreparedCall {
        kind: if amount.is_zero() {
            CallKind::Revoke
        } else {
            CallKind::Approve
        },
        chain_id: currency.chain_id,
        to: currency.stablecoin_address,
        input: call.abi_encode().into(),
        gas_limit,
    }
}

/// `buyTokensWthStableCoin(amount)` against the sale contract.
pub fn prepare_purchase(currency: &ResolvedCurrency, amount: U256, gas_limit: u64) -> PreparedCall {
    let call = ITokenSale::buyTokensWthStableCoinCall { amount };
    PreparedCall {
        kind: CallKind::Purchase,
        chain_id: currency.chain_id,
        to: currency.sale_address,
        input: call.abi_encode().into(),
        gas_limit,
    }
}
