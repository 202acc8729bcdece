//! Approve-then-buy saga.
//!
//! # Flow
//! ```text
//! purchase_tokens(session)
//!     → validate amount, check wallet account + network
//!     → record (approving) ── approve(sale, units) ── wait ──▶ approved
//!     → buyTokensWthStableCoin(units) ──▶ buying ── wait ──▶ bought
//! ```
//!
//! Every phase change is written to the journal before the next step starts,
//! so a crash between approval and purchase can be resumed (`resume`) or the
//! allowance withdrawn (`revoke`). The purchase is never submitted before the
//! approval receipt has been observed as confirmed.

use alloy::primitives::{Address, TxHash, U256};
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::blockchain::transaction::TransactionSender;
use crate::blockchain::types::{ChainError, Confirmation};
use crate::blockchain::wallet::WalletConnector;
use crate::contracts::{prepare_approve, prepare_purchase, PreparedCall};
use crate::currency::{Currency, CurrencyTable};
use crate::observability::metrics;
use crate::purchase::error::{PurchaseError, SwitchError};
use crate::purchase::journal::PurchaseJournal;
use crate::purchase::types::{FailureInfo, PurchasePhase, PurchaseRecord, PurchaseStage};
use crate::session::{InputChange, PurchaseSession};

/// Drives currency selection and the purchase saga against a connector.
pub struct PurchaseOrchestrator<C> {
    connector: Arc<C>,
    table: CurrencyTable,
    journal: PurchaseJournal,
    gas_limit: u64,
    /// Held for the whole of a purchase, resume or revoke.
    in_flight: Mutex<()>,
}

impl<C> PurchaseOrchestrator<C>
where
    C: WalletConnector + TransactionSender,
{
    pub fn new(connector: Arc<C>, table: CurrencyTable, journal: PurchaseJournal, gas_limit: u64) -> Self {
        Self {
            connector,
            table,
            journal,
            gas_limit,
            in_flight: Mutex::new(()),
        }
    }

    pub fn connector(&self) -> &Arc<C> {
        &self.connector
    }

    pub fn table(&self) -> &CurrencyTable {
        &self.table
    }

    pub fn journal(&self) -> &PurchaseJournal {
        &self.journal
    }

    /// Starting session for a currency.
    pub fn new_session(&self, currency: Currency) -> PurchaseSession {
        PurchaseSession::new(&self.table, currency)
    }

    /// Apply one form edit. Currency edits go through the network switch.
    pub async fn handle_input_change(
        &self,
        session: &PurchaseSession,
        change: InputChange,
    ) -> Result<PurchaseSession, SwitchError> {
        match change {
            InputChange::Amount(amount) => Ok(session.with_amount(amount)),
            InputChange::SelectedCurrency(currency) => self.handle_network_switch(session, currency).await,
        }
    }

    /// Move the wallet to `currency`'s chain and retarget the session.
    ///
    /// Selecting the current currency is not a change and sends nothing. On
    /// failure the caller's session is left as it was.
    pub async fn handle_network_switch(
        &self,
        session: &PurchaseSession,
        currency: Currency,
    ) -> Result<PurchaseSession, SwitchError> {
        if currency == session.selected_currency {
            return Ok(session.clone());
        }

        let resolved = self.table.resolve(currency);
        match self.connector.switch_chain(resolved.chain_id).await {
            Ok(()) => {
                metrics::record_network_switch(currency.key(), true);
                tracing::info!(currency = %currency, chain_id = resolved.chain_id, "Currency selected");
                Ok(session.with_currency(&resolved))
            }
            Err(source) => {
                metrics::record_network_switch(currency.key(), false);
                tracing::warn!(
                    currency = %currency,
                    chain_id = resolved.chain_id,
                    error = %source,
                    category = source.category().as_str(),
                    "Network switch failed"
                );
                Err(SwitchError {
                    currency,
                    chain_id: resolved.chain_id,
                    source,
                })
            }
        }
    }

    /// Put the wallet on the session's chain if it is elsewhere.
    pub async fn sync_network(&self, session: &PurchaseSession) -> Result<(), SwitchError> {
        let chain_id = session.active.chain_id;
        if self.connector.active_chain() == Some(chain_id) {
            return Ok(());
        }
        let currency = session.selected_currency;
        match self.connector.switch_chain(chain_id).await {
            Ok(()) => {
                metrics::record_network_switch(currency.key(), true);
                tracing::info!(currency = %currency, chain_id, "Wallet moved to session network");
                Ok(())
            }
            Err(source) => {
                metrics::record_network_switch(currency.key(), false);
                tracing::warn!(currency = %currency, chain_id, error = %source, "Network switch failed");
                Err(SwitchError {
                    currency,
                    chain_id,
                    source,
                })
            }
        }
    }

    /// Approve the sale contract, wait, buy, wait.
    pub async fn purchase_tokens(&self, session: &PurchaseSession) -> Result<PurchaseRecord, PurchaseError> {
        let _guard = self.in_flight.try_lock().map_err(|_| PurchaseError::InProgress)?;

        let resolved = self.table.resolve(session.selected_currency);
        let amount = session.amount.as_deref().unwrap_or_default();
        let units = resolved.to_units(amount)?;
        let account = self.ready_account(resolved.chain_id)?;

        let mut record = PurchaseRecord::new(&resolved, amount, units, account);
        self.journal.upsert(&record)?;
        tracing::info!(
            record_id = %record.id,
            currency = %record.currency,
            amount = %record.amount,
            units = %units,
            "Purchase started"
        );

        self.drive(&mut record).await?;
        Ok(record)
    }

    /// Continue an unfinished purchase from its last persisted phase.
    pub async fn resume(&self, record_id: Uuid) -> Result<PurchaseRecord, PurchaseError> {
        let _guard = self.in_flight.try_lock().map_err(|_| PurchaseError::InProgress)?;

        let mut record = self
            .journal
            .get(&record_id)
            .ok_or(PurchaseError::UnknownRecord(record_id))?;

        if record.phase == PurchasePhase::Bought {
            return Ok(record);
        }
        let restart = record.resume_phase().ok_or(PurchaseError::NotResumable {
            record_id,
            phase: record.phase,
        })?;

        self.ready_account(record.chain_id)?;

        if restart == PurchasePhase::Approved {
            record.purchase_tx = None;
        }
        record.phase = restart;
        record.failure = None;
        record.touch();
        self.journal.upsert(&record)?;
        tracing::info!(record_id = %record.id, phase = %record.phase, "Resuming purchase");

        self.drive(&mut record).await?;
        Ok(record)
    }

    /// Withdraw an allowance whose purchase never completed.
    ///
    /// Also accepts approvals whose outcome was never observed. Refused while
    /// a purchase transaction may still land.
    pub async fn revoke(&self, record_id: Uuid) -> Result<PurchaseRecord, PurchaseError> {
        let _guard = self.in_flight.try_lock().map_err(|_| PurchaseError::InProgress)?;

        let mut record = self
            .journal
            .get(&record_id)
            .ok_or(PurchaseError::UnknownRecord(record_id))?;
        if record.purchase_unresolved() {
            return Err(PurchaseError::PurchaseInFlight(record_id));
        }
        if !record.allowance_possible() {
            return Err(PurchaseError::NothingToRevoke(record_id));
        }
        self.ready_account(record.chain_id)?;

        let call = prepare_approve(&record.contracts(), U256::ZERO, self.gas_limit);
        let tx_hash = match self.submit(&call).await {
            Ok(tx_hash) => tx_hash,
            Err(source) => return Err(self.fail(&mut record, PurchaseStage::Revoke, source)),
        };
        record.revoke_tx = Some(tx_hash);
        record.touch();
        self.journal.upsert(&record)?;

        if let Err(source) = self.confirm(record.chain_id, tx_hash, &call).await {
            return Err(self.fail(&mut record, PurchaseStage::Revoke, source));
        }

        record.phase = PurchasePhase::Revoked;
        record.failure = None;
        record.touch();
        self.journal.upsert(&record)?;
        metrics::record_purchase("revoked");
        tracing::info!(record_id = %record.id, tx_hash = %tx_hash, "Allowance revoked");
        Ok(record)
    }

    /// Purchases still needing attention, including orphaned allowances.
    pub fn pending(&self) -> Vec<PurchaseRecord> {
        self.journal.pending()
    }

    fn ready_account(&self, chain_id: u64) -> Result<Address, PurchaseError> {
        let account = self
            .connector
            .active_account()
            .ok_or(PurchaseError::WalletNotReady(ChainError::NotConnected))?;
        match self.connector.active_chain() {
            Some(active) if active == chain_id => Ok(account),
            Some(active) => Err(PurchaseError::WalletNotReady(ChainError::WrongNetwork {
                expected: chain_id,
                actual: active,
            })),
            None => Err(PurchaseError::WalletNotReady(ChainError::NotConnected)),
        }
    }

    /// Advance `record` until it is bought or a step fails.
    async fn drive(&self, record: &mut PurchaseRecord) -> Result<(), PurchaseError> {
        let contracts = record.contracts();

        loop {
            match record.phase {
                PurchasePhase::Approving => {
                    let call = prepare_approve(&contracts, record.amount_units, self.gas_limit);
                    let tx_hash = match record.approval_tx {
                        Some(tx_hash) => tx_hash,
                        None => match self.submit(&call).await {
                            Ok(tx_hash) => {
                                record.approval_tx = Some(tx_hash);
                                record.touch();
                                self.journal.upsert(record)?;
                                tx_hash
                            }
                            Err(source) => return Err(self.fail(record, PurchaseStage::Approve, source)),
                        },
                    };

                    if let Err(source) = self.confirm(record.chain_id, tx_hash, &call).await {
                        return Err(self.fail(record, PurchaseStage::Approve, source));
                    }
                    record.approval_confirmed = true;
                    record.phase = PurchasePhase::Approved;
                    record.touch();
                    self.journal.upsert(record)?;
                    tracing::info!(record_id = %record.id, tx_hash = %tx_hash, "Allowance approved");
                }
                PurchasePhase::Approved => {
                    let call = prepare_purchase(&contracts, record.amount_units, self.gas_limit);
                    match self.submit(&call).await {
                        Ok(tx_hash) => {
                            record.purchase_tx = Some(tx_hash);
                            record.phase = PurchasePhase::Buying;
                            record.touch();
                            self.journal.upsert(record)?;
                        }
                        Err(source) => return Err(self.fail(record, PurchaseStage::Purchase, source)),
                    }
                }
                PurchasePhase::Buying => {
                    let Some(tx_hash) = record.purchase_tx else {
                        record.phase = PurchasePhase::Approved;
                        continue;
                    };
                    let call = prepare_purchase(&contracts, record.amount_units, self.gas_limit);
                    match self.confirm(record.chain_id, tx_hash, &call).await {
                        Ok(confirmation) => {
                            record.purchase_block = Some(confirmation.block_number);
                            record.phase = PurchasePhase::Bought;
                            record.touch();
                            self.journal.upsert(record)?;
                            metrics::record_purchase("bought");
                            tracing::info!(
                                record_id = %record.id,
                                tx_hash = %tx_hash,
                                block_number = confirmation.block_number,
                                "Purchase confirmed"
                            );
                        }
                        Err(source) => return Err(self.fail(record, PurchaseStage::Purchase, source)),
                    }
                }
                PurchasePhase::Bought => return Ok(()),
                PurchasePhase::Failed | PurchasePhase::Revoked => {
                    return Err(PurchaseError::NotResumable {
                        record_id: record.id,
                        phase: record.phase,
                    })
                }
            }
        }
    }

    async fn submit(&self, call: &PreparedCall) -> Result<TxHash, ChainError> {
        match self.connector.send(call).await {
            Ok(tx_hash) => {
                metrics::record_transaction(call.kind.as_str(), "submitted");
                Ok(tx_hash)
            }
            Err(e) => {
                metrics::record_transaction(call.kind.as_str(), "rejected");
                Err(e)
            }
        }
    }

    /// Wait for a receipt; a reverted receipt is an error.
    async fn confirm(
        &self,
        chain_id: u64,
        tx_hash: TxHash,
        call: &PreparedCall,
    ) -> Result<Confirmation, ChainError> {
        let confirmation = match self.connector.wait_for_confirmation(chain_id, tx_hash).await {
            Ok(confirmation) => confirmation,
            Err(e) => {
                metrics::record_transaction(call.kind.as_str(), "unconfirmed");
                return Err(e);
            }
        };
        if !confirmation.success {
            metrics::record_transaction(call.kind.as_str(), "reverted");
            return Err(ChainError::Reverted(tx_hash));
        }
        metrics::record_transaction(call.kind.as_str(), "confirmed");
        Ok(confirmation)
    }

    /// Record a failed step and build the error returned to the caller.
    fn fail(&self, record: &mut PurchaseRecord, stage: PurchaseStage, source: ChainError) -> PurchaseError {
        if stage != PurchaseStage::Revoke {
            record.phase = PurchasePhase::Failed;
        }
        record.failure = Some(FailureInfo {
            stage,
            category: source.category(),
            message: source.to_string(),
        });
        record.touch();

        if let Err(e) = self.journal.upsert(record) {
            tracing::error!(record_id = %record.id, error = %e, "Failed to persist purchase failure");
        }
        if stage != PurchaseStage::Revoke {
            metrics::record_purchase("failed");
        }
        let unresolved = record.unresolved_stage();
        tracing::error!(
            record_id = %record.id,
            stage = stage.as_str(),
            category = source.category().as_str(),
            allowance_outstanding = record.allowance_outstanding(),
            unresolved = unresolved.map(PurchaseStage::as_str),
            error = %source,
            "Purchase step failed"
        );

        PurchaseError::Step {
            record_id: record.id,
            stage,
            allowance_outstanding: record.allowance_outstanding(),
            unresolved,
            source,
        }
    }
}
