//! Stablecoin token-sale client.
//!
//! Connects a wallet, selects a stablecoin (USDT, USDC or BUSD), moves the
//! wallet onto that coin's network, approves the sale contract and buys.

pub mod blockchain;
pub mod config;
pub mod contracts;
pub mod currency;
pub mod observability;
pub mod purchase;
pub mod resilience;
pub mod session;

pub use config::SaleConfig;
pub use currency::{Currency, CurrencyTable};
pub use purchase::{PurchaseError, PurchaseOrchestrator, PurchaseRecord, SwitchError};
pub use session::{InputChange, PurchaseSession};
