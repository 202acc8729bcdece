//! Chain-specific types and error definitions.

use alloy::primitives::TxHash;
use alloy::transports::TransportError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Chain ID type for strong typing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChainId(pub u64);

impl From<u64> for ChainId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl From<ChainId> for u64 {
    fn from(id: ChainId) -> Self {
        id.0
    }
}

impl std::fmt::Display for ChainId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Broad failure family, used to pick the message shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// The wallet refused, is disconnected, or is on an unsupported network.
    Wallet,
    /// The transaction was mined but failed, or could not be funded.
    Transaction,
    /// The RPC node could not be reached or did not answer in time.
    Network,
}

impl ErrorCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCategory::Wallet => "wallet",
            ErrorCategory::Transaction => "transaction",
            ErrorCategory::Network => "network",
        }
    }
}

/// Errors that can occur at the wallet and contract boundaries.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainError {
    /// The user declined the request in the wallet.
    #[error("request rejected by the wallet")]
    Rejected,

    /// No RPC network is configured for the requested chain.
    #[error("chain {0} is not supported by the wallet")]
    UnsupportedNetwork(u64),

    /// No account is connected.
    #[error("wallet is not connected")]
    NotConnected,

    /// The wallet is connected to a different chain than the call needs.
    #[error("wallet is on chain {actual}, expected {expected}")]
    WrongNetwork { expected: u64, actual: u64 },

    /// Invalid private key format or signer failure.
    #[error("wallet error: {0}")]
    Wallet(String),

    /// Transaction was reverted on-chain.
    #[error("transaction {0} reverted")]
    Reverted(TxHash),

    /// Call could not be executed (revert during estimation, bad calldata).
    #[error("execution reverted: {0}")]
    ExecutionReverted(String),

    /// The account cannot pay for the transaction.
    #[error("insufficient funds: {0}")]
    InsufficientFunds(String),

    /// RPC connection or request failed.
    #[error("RPC error: {0}")]
    Rpc(String),

    /// RPC request timed out.
    #[error("RPC timeout after {0} seconds")]
    Timeout(u64),

    /// Transaction was not confirmed within the configured wait.
    #[error("transaction {tx_hash} not confirmed after {secs} seconds")]
    ConfirmationTimeout { tx_hash: TxHash, secs: u64 },
}

impl ChainError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ChainError::Rejected
            | ChainError::UnsupportedNetwork(_)
            | ChainError::NotConnected
            | ChainError::WrongNetwork { .. }
            | ChainError::Wallet(_) => ErrorCategory::Wallet,
            ChainError::Reverted(_)
            | ChainError::ExecutionReverted(_)
            | ChainError::InsufficientFunds(_) => ErrorCategory::Transaction,
            ChainError::Rpc(_) | ChainError::Timeout(_) | ChainError::ConfirmationTimeout { .. } => {
                ErrorCategory::Network
            }
        }
    }

    /// Classify a JSON-RPC transport failure.
    pub fn from_transport(err: &TransportError) -> Self {
        if let Some(payload) = err.as_error_resp() {
            let message = payload.message.to_string();
            let lower = message.to_ascii_lowercase();
            if payload.code == USER_REJECTED_CODE || lower.contains("user denied") {
                return ChainError::Rejected;
            }
            if lower.contains("insufficient funds") {
                return ChainError::InsufficientFunds(message);
            }
            if lower.contains("execution reverted") {
                return ChainError::ExecutionReverted(message);
            }
            return ChainError::Rpc(format!("{} (code {})", message, payload.code));
        }
        ChainError::Rpc(err.to_string())
    }
}

/// EIP-1193 "user rejected request".
pub const USER_REJECTED_CODE: i64 = 4001;

/// Result type for chain operations.
pub type ChainResult<T> = Result<T, ChainError>;

/// Outcome of waiting for a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Confirmation {
    pub tx_hash: TxHash,
    pub block_number: u64,
    pub success: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::rpc::json_rpc::{ErrorPayload, RpcError};
    use alloy::transports::TransportErrorKind;

    fn error_resp(code: i64, message: &'static str) -> TransportError {
        RpcError::ErrorResp(ErrorPayload {
            code,
            message: message.into(),
            data: None,
        })
    }

    #[test]
    fn test_chain_id_conversion() {
        let chain_id = ChainId::from(97u64);
        assert_eq!(chain_id.0, 97);
        assert_eq!(u64::from(chain_id), 97);
        assert_eq!(chain_id.to_string(), "97");
    }

    #[test]
    fn test_categories() {
        assert_eq!(ChainError::Rejected.category(), ErrorCategory::Wallet);
        assert_eq!(
            ChainError::WrongNetwork { expected: 5, actual: 97 }.category(),
            ErrorCategory::Wallet
        );
        assert_eq!(
            ChainError::Reverted(TxHash::ZERO).category(),
            ErrorCategory::Transaction
        );
        assert_eq!(
            ChainError::InsufficientFunds("gas".into()).category(),
            ErrorCategory::Transaction
        );
        assert_eq!(ChainError::Timeout(10).category(), ErrorCategory::Network);
    }

    #[test]
    fn test_error_display() {
        let err = ChainError::Timeout(10);
        assert_eq!(err.to_string(), "RPC timeout after 10 seconds");

        let err = ChainError::WrongNetwork {
            expected: 11155111,
            actual: 5,
        };
        assert!(err.to_string().contains("11155111"));
    }

    #[test]
    fn test_user_rejection_code() {
        let err = ChainError::from_transport(&error_resp(4001, "MetaMask Tx Signature: request rejected"));
        assert_eq!(err, ChainError::Rejected);

        let err = ChainError::from_transport(&error_resp(-32000, "User denied transaction signature"));
        assert_eq!(err, ChainError::Rejected);
    }

    #[test]
    fn test_transaction_failures_from_transport() {
        let err = ChainError::from_transport(&error_resp(
            -32000,
            "insufficient funds for gas * price + value",
        ));
        assert!(matches!(err, ChainError::InsufficientFunds(_)));
        assert_eq!(err.category(), ErrorCategory::Transaction);

        let err = ChainError::from_transport(&error_resp(
            3,
            "execution reverted: ERC20: transfer amount exceeds allowance",
        ));
        assert!(matches!(err, ChainError::ExecutionReverted(ref m) if m.contains("exceeds allowance")));
        assert_eq!(err.category(), ErrorCategory::Transaction);
    }

    #[test]
    fn test_other_transport_failures_are_network() {
        let err = ChainError::from_transport(&error_resp(-32603, "internal error"));
        assert_eq!(err, ChainError::Rpc("internal error (code -32603)".to_string()));
        assert_eq!(err.category(), ErrorCategory::Network);

        let err = ChainError::from_transport(&TransportErrorKind::backend_gone());
        assert!(matches!(err, ChainError::Rpc(_)));
        assert_eq!(err.category(), ErrorCategory::Network);
    }
}
