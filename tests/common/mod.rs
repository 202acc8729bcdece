//! Shared mock wallet for orchestrator integration tests.

#![allow(dead_code)]

use alloy::primitives::{Address, TxHash, B256};
use async_trait::async_trait;
use metrics::{
    Counter, CounterFn, Gauge, Histogram, Key, KeyName, Metadata, Recorder, SharedString, Unit,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;

use stablecoin_sale::blockchain::{
    ChainError, ChainResult, Confirmation, TransactionSender, WalletConnector,
};
use stablecoin_sale::config::CurrenciesConfig;
use stablecoin_sale::contracts::{CallKind, PreparedCall};
use stablecoin_sale::purchase::{PurchaseJournal, PurchaseOrchestrator};
use stablecoin_sale::CurrencyTable;

pub const ACCOUNT: Address = Address::new([0xee; 20]);
pub const GAS_LIMIT: u64 = 100_000;

/// Something the orchestrator asked the wallet to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Switch(u64),
    Send(PreparedCall),
    Confirmed(TxHash),
}

/// How a wait for a given call kind should end.
#[derive(Debug, Clone)]
pub enum WaitOutcome {
    Revert,
    Fail(ChainError),
}

/// In-memory wallet implementing both boundaries.
pub struct MockWallet {
    connected: AtomicBool,
    chain: Mutex<Option<u64>>,
    supported: Vec<u64>,
    reject_switch: AtomicBool,
    events: Mutex<Vec<Event>>,
    send_failures: Mutex<HashMap<CallKind, ChainError>>,
    wait_outcomes: Mutex<HashMap<CallKind, WaitOutcome>>,
    tx_kinds: Mutex<HashMap<TxHash, CallKind>>,
    next_tx: AtomicU64,
    block: AtomicU64,
    /// When set, every wait takes one permit before answering.
    gate: Option<Arc<Semaphore>>,
}

impl MockWallet {
    /// Connected, sitting on `chain_id`.
    pub fn on_chain(chain_id: u64) -> Self {
        let wallet = Self::disconnected();
        wallet.connected.store(true, Ordering::SeqCst);
        *wallet.chain.lock().unwrap() = Some(chain_id);
        wallet
    }

    pub fn disconnected() -> Self {
        Self {
            connected: AtomicBool::new(false),
            chain: Mutex::new(None),
            supported: vec![11155111, 5, 97],
            reject_switch: AtomicBool::new(false),
            events: Mutex::new(Vec::new()),
            send_failures: Mutex::new(HashMap::new()),
            wait_outcomes: Mutex::new(HashMap::new()),
            tx_kinds: Mutex::new(HashMap::new()),
            next_tx: AtomicU64::new(1),
            block: AtomicU64::new(1000),
            gate: None,
        }
    }

    pub fn with_gate(mut self, gate: Arc<Semaphore>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn reject_switches(&self) {
        self.reject_switch.store(true, Ordering::SeqCst);
    }

    /// Next `send` of this kind fails with `err`.
    pub fn fail_send(&self, kind: CallKind, err: ChainError) {
        self.send_failures.lock().unwrap().insert(kind, err);
    }

    /// Next wait on a transaction of this kind ends with `outcome`.
    pub fn fail_wait(&self, kind: CallKind, outcome: WaitOutcome) {
        self.wait_outcomes.lock().unwrap().insert(kind, outcome);
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    pub fn switches(&self) -> Vec<u64> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Switch(chain) => Some(chain),
                _ => None,
            })
            .collect()
    }

    pub fn sent(&self) -> Vec<PreparedCall> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Send(call) => Some(call),
                _ => None,
            })
            .collect()
    }

    pub fn sent_kinds(&self) -> Vec<CallKind> {
        self.sent().into_iter().map(|c| c.kind).collect()
    }

    fn record(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }
}

#[async_trait]
impl WalletConnector for MockWallet {
    async fn connect(&self) -> ChainResult<Address> {
        self.connected.store(true, Ordering::SeqCst);
        Ok(ACCOUNT)
    }

    async fn switch_chain(&self, chain_id: u64) -> ChainResult<()> {
        self.record(Event::Switch(chain_id));
        if !self.connected.load(Ordering::SeqCst) {
            return Err(ChainError::NotConnected);
        }
        if self.reject_switch.load(Ordering::SeqCst) {
            return Err(ChainError::Rejected);
        }
        if !self.supported.contains(&chain_id) {
            return Err(ChainError::UnsupportedNetwork(chain_id));
        }
        *self.chain.lock().unwrap() = Some(chain_id);
        Ok(())
    }

    fn active_account(&self) -> Option<Address> {
        self.connected.load(Ordering::SeqCst).then_some(ACCOUNT)
    }

    fn active_chain(&self) -> Option<u64> {
        if !self.connected.load(Ordering::SeqCst) {
            return None;
        }
        *self.chain.lock().unwrap()
    }
}

#[async_trait]
impl TransactionSender for MockWallet {
    async fn send(&self, call: &PreparedCall) -> ChainResult<TxHash> {
        self.record(Event::Send(call.clone()));
        if let Some(err) = self.send_failures.lock().unwrap().remove(&call.kind) {
            return Err(err);
        }
        match self.active_chain() {
            Some(chain) if chain == call.chain_id => {}
            Some(chain) => {
                return Err(ChainError::WrongNetwork {
                    expected: call.chain_id,
                    actual: chain,
                })
            }
            None => return Err(ChainError::NotConnected),
        }

        let n = self.next_tx.fetch_add(1, Ordering::SeqCst);
        let tx_hash = B256::left_padding_from(&n.to_be_bytes());
        self.tx_kinds.lock().unwrap().insert(tx_hash, call.kind);
        Ok(tx_hash)
    }

    async fn wait_for_confirmation(&self, _chain_id: u64, tx_hash: TxHash) -> ChainResult<Confirmation> {
        if let Some(gate) = &self.gate {
            gate.acquire().await.expect("gate closed").forget();
        }

        let kind = self.tx_kinds.lock().unwrap().get(&tx_hash).copied();
        let outcome = kind.and_then(|k| self.wait_outcomes.lock().unwrap().remove(&k));
        let block_number = self.block.fetch_add(1, Ordering::SeqCst);

        match outcome {
            Some(WaitOutcome::Fail(err)) => Err(err),
            Some(WaitOutcome::Revert) => Ok(Confirmation {
                tx_hash,
                block_number,
                success: false,
            }),
            None => {
                self.record(Event::Confirmed(tx_hash));
                Ok(Confirmation {
                    tx_hash,
                    block_number,
                    success: true,
                })
            }
        }
    }
}

/// Currency table with distinct addresses per coin.
pub fn table() -> CurrencyTable {
    let mut config = CurrenciesConfig::default();
    config.usdt.stablecoin_address = Address::repeat_byte(0x11);
    config.usdt.sale_address = Address::repeat_byte(0xa1);
    config.usdc.stablecoin_address = Address::repeat_byte(0x22);
    config.usdc.sale_address = Address::repeat_byte(0xa2);
    config.busd.stablecoin_address = Address::repeat_byte(0x33);
    config.busd.sale_address = Address::repeat_byte(0xa3);
    CurrencyTable::from_config(&config)
}

pub fn orchestrator(wallet: MockWallet) -> PurchaseOrchestrator<MockWallet> {
    orchestrator_with_journal(wallet, PurchaseJournal::new(None))
}

pub fn orchestrator_with_journal(
    wallet: MockWallet,
    journal: PurchaseJournal,
) -> PurchaseOrchestrator<MockWallet> {
    PurchaseOrchestrator::new(Arc::new(wallet), table(), journal, GAS_LIMIT)
}

/// Recorder that tallies counters as `name{label=value,...}`.
#[derive(Clone, Default)]
pub struct CountingRecorder {
    counts: Arc<Mutex<HashMap<String, u64>>>,
}

impl CountingRecorder {
    pub fn count(&self, key: &str) -> u64 {
        self.counts.lock().unwrap().get(key).copied().unwrap_or(0)
    }
}

struct TalliedCounter {
    key: String,
    counts: Arc<Mutex<HashMap<String, u64>>>,
}

impl CounterFn for TalliedCounter {
    fn increment(&self, value: u64) {
        *self.counts.lock().unwrap().entry(self.key.clone()).or_default() += value;
    }

    fn absolute(&self, value: u64) {
        self.counts.lock().unwrap().insert(self.key.clone(), value);
    }
}

impl Recorder for CountingRecorder {
    fn describe_counter(&self, _: KeyName, _: Option<Unit>, _: SharedString) {}
    fn describe_gauge(&self, _: KeyName, _: Option<Unit>, _: SharedString) {}
    fn describe_histogram(&self, _: KeyName, _: Option<Unit>, _: SharedString) {}

    fn register_counter(&self, key: &Key, _: &Metadata<'_>) -> Counter {
        let labels: Vec<String> = key
            .labels()
            .map(|l| format!("{}={}", l.key(), l.value()))
            .collect();
        Counter::from_arc(Arc::new(TalliedCounter {
            key: format!("{}{{{}}}", key.name(), labels.join(",")),
            counts: self.counts.clone(),
        }))
    }

    fn register_gauge(&self, _: &Key, _: &Metadata<'_>) -> Gauge {
        Gauge::noop()
    }

    fn register_histogram(&self, _: &Key, _: &Metadata<'_>) -> Histogram {
        Histogram::noop()
    }
}
