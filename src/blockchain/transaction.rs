//! Transaction submission boundary and confirmation monitoring.
//!
//! # Responsibilities
//! - Define the sign+broadcast / wait-for-confirmation seam
//! - Poll receipts with backoff until the required depth is reached
//! - Bound every wait with a deadline

use alloy::primitives::TxHash;
use async_trait::async_trait;
use std::time::Duration;
use tokio::time::{sleep, timeout};

use crate::blockchain::client::ChainClient;
use crate::blockchain::types::{ChainError, ChainResult, Confirmation};
use crate::config::schema::{BlockchainConfig, PurchaseConfig};
use crate::contracts::PreparedCall;
use crate::resilience::Backoff;

/// Contract-binding boundary: write a prepared call and await its receipt.
#[async_trait]
pub trait TransactionSender: Send + Sync {
    /// Sign and broadcast the call; returns as soon as the hash is known.
    async fn send(&self, call: &PreparedCall) -> ChainResult<TxHash>;

    /// Block until the transaction is mined with enough confirmations.
    ///
    /// A mined-but-reverted transaction is returned with `success == false`.
    async fn wait_for_confirmation(&self, chain_id: u64, tx_hash: TxHash) -> ChainResult<Confirmation>;
}

/// How long and how often to poll for a receipt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfirmationPolicy {
    pub confirmations: u32,
    pub timeout: Duration,
    pub poll_interval_ms: u64,
    pub max_backoff_ms: u64,
}

impl ConfirmationPolicy {
    pub fn from_config(blockchain: &BlockchainConfig, purchase: &PurchaseConfig) -> Self {
        Self {
            confirmations: blockchain.confirmation_blocks.max(1),
            timeout: Duration::from_secs(purchase.confirmation_timeout_secs),
            poll_interval_ms: purchase.poll_interval_ms,
            max_backoff_ms: purchase.max_poll_backoff_ms,
        }
    }
}

/// Number of confirmations a transaction mined in `tx_block` has at `head`.
///
/// The including block counts as the first confirmation.
pub fn confirmations_at(tx_block: u64, head: u64) -> u32 {
    let depth = head.saturating_sub(tx_block).saturating_add(1);
    u32::try_from(depth).unwrap_or(u32::MAX)
}

/// Wait for a transaction to be confirmed.
///
/// Transient RPC failures while polling are logged and retried until the
/// policy's deadline expires.
pub async fn wait_for_confirmation(
    client: &ChainClient,
    tx_hash: TxHash,
    policy: &ConfirmationPolicy,
) -> ChainResult<Confirmation> {
    let required = policy.confirmations;

    let result = timeout(policy.timeout, async {
        let mut backoff = Backoff::new(policy.poll_interval_ms, policy.max_backoff_ms);

        loop {
            sleep(backoff.next_delay()).await;

            let receipt = match client.get_transaction_receipt(tx_hash).await {
                Ok(Some(r)) => r,
                Ok(None) => {
                    tracing::debug!(tx_hash = %tx_hash, "Transaction pending");
                    continue;
                }
                Err(e) => {
                    tracing::warn!(tx_hash = %tx_hash, error = %e, "Receipt poll failed");
                    continue;
                }
            };

            let head = match client.get_block_number().await {
                Ok(head) => head,
                Err(e) => {
                    tracing::warn!(tx_hash = %tx_hash, error = %e, "Block number poll failed");
                    continue;
                }
            };
            let tx_block = receipt.block_number.unwrap_or(head);

            if !receipt.status() {
                return Confirmation {
                    tx_hash,
                    block_number: tx_block,
                    success: false,
                };
            }

            let confirmations = confirmations_at(tx_block, head);
            if confirmations >= required {
                return Confirmation {
                    tx_hash,
                    block_number: tx_block,
                    success: true,
                };
            }

            tracing::debug!(
                tx_hash = %tx_hash,
                confirmations = confirmations,
                required = required,
                "Waiting for confirmations"
            );
        }
    })
    .await;

    result.map_err(|_| ChainError::ConfirmationTimeout {
        tx_hash,
        secs: policy.timeout.as_secs(),
    })
}
