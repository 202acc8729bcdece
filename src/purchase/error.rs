//! Errors surfaced by the purchase orchestrator.

use thiserror::Error;
use uuid::Uuid;

use crate::blockchain::types::{ChainError, ErrorCategory};
use crate::currency::{AmountError, Currency};
use crate::purchase::journal::JournalError;
use crate::purchase::types::{PurchasePhase, PurchaseStage};

/// The wallet did not move to the network a currency lives on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("switching to {currency} (chain {chain_id}) failed: {source}")]
pub struct SwitchError {
    pub currency: Currency,
    pub chain_id: u64,
    #[source]
    pub source: ChainError,
}

impl SwitchError {
    pub fn category(&self) -> ErrorCategory {
        self.source.category()
    }

    /// Text suitable for showing to the user.
    pub fn user_message(&self) -> String {
        let reason = match &self.source {
            ChainError::Rejected => "the request was rejected in the wallet".to_string(),
            ChainError::NotConnected => "no wallet is connected".to_string(),
            ChainError::UnsupportedNetwork(_) => "the wallet does not support that network".to_string(),
            other => category_reason(other),
        };
        format!(
            "Could not switch to {} (chain {}): {}. The previous selection is still active.",
            self.currency.symbol(),
            self.chain_id,
            reason
        )
    }
}

#[derive(Debug, Error)]
pub enum PurchaseError {
    #[error("invalid amount: {0}")]
    InvalidAmount(#[from] AmountError),

    #[error("a purchase is already in progress")]
    InProgress,

    /// Checked before anything is submitted.
    #[error("wallet not ready: {0}")]
    WalletNotReady(#[source] ChainError),

    #[error("{stage} step of purchase {record_id} failed: {source}")]
    Step {
        record_id: Uuid,
        stage: PurchaseStage,
        allowance_outstanding: bool,
        /// Stage whose transaction may still land.
        unresolved: Option<PurchaseStage>,
        #[source]
        source: ChainError,
    },

    #[error(transparent)]
    Journal(#[from] JournalError),

    #[error("no purchase record {0}")]
    UnknownRecord(Uuid),

    #[error("purchase {record_id} is {phase} and cannot be resumed")]
    NotResumable { record_id: Uuid, phase: PurchasePhase },

    #[error("purchase {0} has no outstanding allowance to revoke")]
    NothingToRevoke(Uuid),

    #[error("purchase {0} has a purchase transaction awaiting confirmation")]
    PurchaseInFlight(Uuid),
}

impl PurchaseError {
    /// Failure family for chain errors; `None` for local problems.
    pub fn category(&self) -> Option<ErrorCategory> {
        match self {
            PurchaseError::WalletNotReady(source) | PurchaseError::Step { source, .. } => {
                Some(source.category())
            }
            _ => None,
        }
    }

    /// Text suitable for showing to the user.
    pub fn user_message(&self) -> String {
        match self {
            PurchaseError::InvalidAmount(e) => format!("Please enter a valid amount ({}).", e),
            PurchaseError::InProgress => {
                "A purchase is already being processed; wait for it to finish.".to_string()
            }
            PurchaseError::WalletNotReady(source) => match source {
                ChainError::WrongNetwork { expected, actual } => format!(
                    "Your wallet is on chain {}; switch to chain {} before purchasing.",
                    actual, expected
                ),
                ChainError::NotConnected => "Connect a wallet before purchasing.".to_string(),
                other => format!("Wallet problem: {}.", category_reason(other)),
            },
            PurchaseError::Step {
                record_id,
                stage,
                allowance_outstanding,
                unresolved,
                source,
            } => {
                let mut message = match stage {
                    PurchaseStage::Approve => format!("Approval failed: {}.", category_reason(source)),
                    PurchaseStage::Purchase => format!("Purchase failed: {}.", category_reason(source)),
                    PurchaseStage::Revoke => {
                        format!("Revoking the allowance failed: {}.", category_reason(source))
                    }
                };
                if *unresolved == Some(PurchaseStage::Purchase) {
                    message.push_str(&format!(
                        " Your purchase transaction may still confirm. Run `resume {}` to keep waiting for it.",
                        record_id
                    ));
                } else if *allowance_outstanding {
                    message.push_str(&format!(
                        " Your stablecoin approval is still active. Run `resume {}` to finish the purchase or `revoke {}` to withdraw it.",
                        record_id, record_id
                    ));
                } else if *unresolved == Some(PurchaseStage::Approve) {
                    message.push_str(&format!(
                        " Your stablecoin approval may still confirm. Run `resume {}` to finish the purchase or `revoke {}` to withdraw it.",
                        record_id, record_id
                    ));
                }
                message
            }
            PurchaseError::Journal(e) => format!("Could not save purchase progress: {}.", e),
            PurchaseError::UnknownRecord(id) => format!("No purchase with id {} was found.", id),
            PurchaseError::NotResumable { record_id, phase } => {
                format!("Purchase {} is {} and has nothing left to resume.", record_id, phase)
            }
            PurchaseError::NothingToRevoke(id) => {
                format!("Purchase {} has no active approval to revoke.", id)
            }
            PurchaseError::PurchaseInFlight(id) => format!(
                "Purchase {} may still confirm, so its approval cannot be revoked yet. Run `resume {}` to wait for it.",
                id, id
            ),
        }
    }
}

fn category_reason(source: &ChainError) -> String {
    match source.category() {
        ErrorCategory::Wallet => match source {
            ChainError::Rejected => "you rejected the request in your wallet".to_string(),
            other => format!("the wallet could not complete the request ({})", other),
        },
        ErrorCategory::Transaction => match source {
            ChainError::InsufficientFunds(_) => {
                "the account cannot cover the amount or the gas fee".to_string()
            }
            other => format!("the transaction failed on-chain ({})", other),
        },
        ErrorCategory::Network => format!("the network could not be reached ({}); try again later", source),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::TxHash;

    #[test]
    fn test_distinct_messages_per_category() {
        let id = Uuid::nil();
        let step = |source| PurchaseError::Step {
            record_id: id,
            stage: PurchaseStage::Approve,
            allowance_outstanding: false,
            unresolved: None,
            source,
        };

        let wallet = step(ChainError::Rejected).user_message();
        let tx = step(ChainError::Reverted(TxHash::ZERO)).user_message();
        let net = step(ChainError::Timeout(5)).user_message();

        assert!(wallet.contains("rejected"));
        assert!(tx.contains("failed on-chain"));
        assert!(net.contains("could not be reached"));
        assert_ne!(wallet, tx);
        assert_ne!(tx, net);
    }

    #[test]
    fn test_outstanding_allowance_is_reported() {
        let id = Uuid::new_v4();
        let err = PurchaseError::Step {
            record_id: id,
            stage: PurchaseStage::Purchase,
            allowance_outstanding: true,
            unresolved: None,
            source: ChainError::Rejected,
        };
        let message = err.user_message();
        assert!(message.contains(&format!("resume {}", id)));
        assert!(message.contains(&format!("revoke {}", id)));
        assert_eq!(err.category(), Some(ErrorCategory::Wallet));
    }

    #[test]
    fn test_unresolved_approval_is_reported() {
        let id = Uuid::new_v4();
        let err = PurchaseError::Step {
            record_id: id,
            stage: PurchaseStage::Approve,
            allowance_outstanding: false,
            unresolved: Some(PurchaseStage::Approve),
            source: ChainError::ConfirmationTimeout {
                tx_hash: TxHash::ZERO,
                secs: 300,
            },
        };
        let message = err.user_message();
        assert!(message.contains("may still confirm"));
        assert!(message.contains(&format!("revoke {}", id)));
        assert_eq!(err.category(), Some(ErrorCategory::Network));
    }

    #[test]
    fn test_unresolved_purchase_only_offers_resume() {
        let id = Uuid::new_v4();
        let err = PurchaseError::Step {
            record_id: id,
            stage: PurchaseStage::Purchase,
            allowance_outstanding: true,
            unresolved: Some(PurchaseStage::Purchase),
            source: ChainError::Timeout(10),
        };
        let message = err.user_message();
        assert!(message.contains(&format!("resume {}", id)));
        assert!(!message.contains("revoke"));
        assert!(PurchaseError::PurchaseInFlight(id)
            .user_message()
            .contains(&format!("resume {}", id)));
    }

    #[test]
    fn test_switch_error_message() {
        let err = SwitchError {
            currency: Currency::Busd,
            chain_id: 97,
            source: ChainError::Rejected,
        };
        assert!(err.user_message().contains("BUSD"));
        assert!(err.user_message().contains("previous selection"));
        assert_eq!(err.category(), ErrorCategory::Wallet);
    }

    #[test]
    fn test_local_errors_have_no_category() {
        assert_eq!(PurchaseError::InProgress.category(), None);
        assert_eq!(PurchaseError::from(AmountError::Empty).category(), None);
    }
}
