//! Persisted purchase records.

use alloy::primitives::{Address, TxHash, U256};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

use crate::blockchain::types::ErrorCategory;
use crate::currency::{Currency, ResolvedCurrency};

/// Where a purchase currently stands.
///
/// `approving → approved → buying → bought`, with `failed` reachable from
/// any non-terminal phase and `revoked` after an orphaned allowance is
/// withdrawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PurchasePhase {
    Approving,
    Approved,
    Buying,
    Bought,
    Failed,
    Revoked,
}

impl PurchasePhase {
    pub fn as_str(self) -> &'static str {
        match self {
            PurchasePhase::Approving => "approving",
            PurchasePhase::Approved => "approved",
            PurchasePhase::Buying => "buying",
            PurchasePhase::Bought => "bought",
            PurchasePhase::Failed => "failed",
            PurchasePhase::Revoked => "revoked",
        }
    }
}

impl std::fmt::Display for PurchasePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which step of the flow an error came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PurchaseStage {
    Approve,
    Purchase,
    Revoke,
}

impl PurchaseStage {
    pub fn as_str(self) -> &'static str {
        match self {
            PurchaseStage::Approve => "approve",
            PurchaseStage::Purchase => "purchase",
            PurchaseStage::Revoke => "revoke",
        }
    }
}

impl std::fmt::Display for PurchaseStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Last failure recorded against a purchase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureInfo {
    pub stage: PurchaseStage,
    pub category: ErrorCategory,
    pub message: String,
}

/// One approve-then-buy attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseRecord {
    pub id: Uuid,
    pub currency: Currency,
    /// Amount as the user typed it.
    pub amount: String,
    /// Amount scaled by `decimals`.
    pub amount_units: U256,
    pub decimals: u8,
    pub account: Address,
    pub stablecoin_address: Address,
    pub sale_address: Address,
    pub chain_id: u64,
    pub phase: PurchasePhase,
    pub approval_tx: Option<TxHash>,
    pub approval_confirmed: bool,
    pub purchase_tx: Option<TxHash>,
    pub purchase_block: Option<u64>,
    pub revoke_tx: Option<TxHash>,
    pub failure: Option<FailureInfo>,
    /// Unix seconds.
    pub created_at: u64,
    /// Unix seconds.
    pub updated_at: u64,
}

pub(crate) fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

impl PurchaseRecord {
    pub fn new(currency: &ResolvedCurrency, amount: &str, amount_units: U256, account: Address) -> Self {
        let now = unix_now();
        Self {
            id: Uuid::new_v4(),
            currency: currency.currency,
            amount: amount.trim().to_string(),
            amount_units,
            decimals: currency.decimals,
            account,
            stablecoin_address: currency.stablecoin_address,
            sale_address: currency.sale_address,
            chain_id: currency.chain_id,
            phase: PurchasePhase::Approving,
            approval_tx: None,
            approval_confirmed: false,
            purchase_tx: None,
            purchase_block: None,
            revoke_tx: None,
            failure: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Contracts this record was created against.
    pub fn contracts(&self) -> ResolvedCurrency {
        ResolvedCurrency {
            currency: self.currency,
            stablecoin_address: self.stablecoin_address,
            sale_address: self.sale_address,
            chain_id: self.chain_id,
            decimals: self.decimals,
            abi: self.currency.abi(),
        }
    }

    /// True once nothing more will happen to this record.
    pub fn is_terminal(&self) -> bool {
        self.resume_phase().is_none()
    }

    /// Phase to restart this record from, if anything is left to do.
    ///
    /// A network failure around the approval re-runs it: a known approval
    /// is waited on again and an unknown one is resubmitted, since `approve`
    /// sets the allowance rather than adding to it. A network failure while
    /// waiting on the purchase waits on that same purchase again.
    pub fn resume_phase(&self) -> Option<PurchasePhase> {
        match self.phase {
            PurchasePhase::Approving | PurchasePhase::Approved | PurchasePhase::Buying => Some(self.phase),
            PurchasePhase::Failed => {
                let failure = self.failure.as_ref();
                let network = failure.is_some_and(|f| f.category == ErrorCategory::Network);
                match failure.map(|f| f.stage) {
                    Some(PurchaseStage::Purchase) if network && self.purchase_tx.is_some() => {
                        Some(PurchasePhase::Buying)
                    }
                    _ if self.approval_confirmed => Some(PurchasePhase::Approved),
                    Some(PurchaseStage::Approve) if network => Some(PurchasePhase::Approving),
                    // Revoke is only attempted while an allowance may exist.
                    Some(PurchaseStage::Revoke) => Some(PurchasePhase::Approving),
                    _ => None,
                }
            }
            PurchasePhase::Bought | PurchasePhase::Revoked => None,
        }
    }

    /// An approval confirmed on-chain that no purchase has consumed.
    pub fn allowance_outstanding(&self) -> bool {
        self.approval_confirmed
            && !matches!(self.phase, PurchasePhase::Bought | PurchasePhase::Revoked)
    }

    /// An approval that is, or may yet become, active on-chain.
    ///
    /// Covers confirmed allowances as well as approvals whose broadcast or
    /// confirmation wait was cut short by the network.
    pub fn allowance_possible(&self) -> bool {
        match self.phase {
            PurchasePhase::Bought | PurchasePhase::Revoked => false,
            _ if self.approval_confirmed => true,
            PurchasePhase::Failed => match &self.failure {
                Some(f) => {
                    f.stage == PurchaseStage::Revoke
                        || (f.stage == PurchaseStage::Approve && f.category == ErrorCategory::Network)
                }
                None => false,
            },
            _ => self.approval_tx.is_some(),
        }
    }

    /// A purchase transaction was broadcast and its outcome is not known.
    pub fn purchase_unresolved(&self) -> bool {
        if self.purchase_tx.is_none() {
            return false;
        }
        match self.phase {
            PurchasePhase::Buying => true,
            PurchasePhase::Failed => matches!(
                &self.failure,
                Some(f) if f.stage == PurchaseStage::Purchase && f.category == ErrorCategory::Network
            ),
            _ => false,
        }
    }

    /// Stage whose transaction may still land without having been observed.
    pub fn unresolved_stage(&self) -> Option<PurchaseStage> {
        if self.purchase_unresolved() {
            Some(PurchaseStage::Purchase)
        } else if self.allowance_possible() && !self.approval_confirmed {
            Some(PurchaseStage::Approve)
        } else {
            None
        }
    }

    pub(crate) fn touch(&mut self) {
        self.updated_at = unix_now();
    }
}
