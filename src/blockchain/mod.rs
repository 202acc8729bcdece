//! Blockchain integration subsystem.
//!
//! # Data Flow
//! ```text
//! Environment variable (private key) + [blockchain.networks]
//!     → wallet.rs (WalletConnector: connect, switch network, active account)
//!     → client.rs (per-network RPC with failover and timeouts)
//!     → transaction.rs (TransactionSender: sign+broadcast, confirm)
//! ```
//!
//! # Security Constraints
//! - Private keys ONLY from environment variables
//! - Never log private keys or sensitive data
//! - All RPC calls have configurable timeouts

pub mod client;
pub mod transaction;
pub mod types;
pub mod wallet;

pub use client::ChainClient;
pub use transaction::{ConfirmationPolicy, TransactionSender};
pub use types::{ChainError, ChainId, ChainResult, Confirmation, ErrorCategory};
pub use wallet::{LocalWalletConnector, WalletConnector};
