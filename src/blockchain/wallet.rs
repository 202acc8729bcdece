//! Wallet connector boundary and the local-key implementation.
//!
//! # Security
//! - Private keys are loaded ONLY from environment variables
//! - Keys are never logged or serialized

use alloy::network::TransactionBuilder;
use alloy::primitives::{Address, TxHash};
use alloy::rpc::types::TransactionRequest;
use alloy::signers::local::PrivateKeySigner;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use crate::blockchain::client::ChainClient;
use crate::blockchain::transaction::{self, ConfirmationPolicy, TransactionSender};
use crate::blockchain::types::{ChainError, ChainResult, Confirmation};
use crate::config::schema::{ConnectorConfig, SaleConfig};
use crate::contracts::PreparedCall;

/// Wallet connector boundary.
#[async_trait]
pub trait WalletConnector: Send + Sync {
    /// Connect and return the active account.
    async fn connect(&self) -> ChainResult<Address>;

    /// Ask the wallet to move to another network.
    async fn switch_chain(&self, chain_id: u64) -> ChainResult<()>;

    /// Currently connected account, if any.
    fn active_account(&self) -> Option<Address>;

    /// Network the wallet is on, if connected.
    fn active_chain(&self) -> Option<u64>;
}

/// Signs with a local private key over the configured RPC networks.
pub struct LocalWalletConnector {
    signer: PrivateKeySigner,
    project_id: String,
    clients: HashMap<u64, ChainClient>,
    policy: ConfirmationPolicy,
    connected: AtomicBool,
    /// Zero while no network has been selected.
    active_chain: AtomicU64,
}

impl LocalWalletConnector {
    /// Build a connector from a hex-encoded private key (with or without `0x`).
    pub fn from_private_key(private_key_hex: &str, config: &SaleConfig) -> ChainResult<Self> {
        let key_hex = private_key_hex
            .trim()
            .strip_prefix("0x")
            .unwrap_or(private_key_hex.trim());

        let signer: PrivateKeySigner = key_hex
            .parse()
            .map_err(|e| ChainError::Wallet(format!("Invalid private key format: {}", e)))?;

        let mut clients = HashMap::new();
        for network in &config.blockchain.networks {
            let client = ChainClient::new(network, &signer, config.blockchain.rpc_timeout_secs)?;
            clients.insert(network.chain_id, client);
        }

        Ok(Self {
            signer,
            project_id: config.connector.project_id.clone(),
            clients,
            policy: ConfirmationPolicy::from_config(&config.blockchain, &config.purchase),
            connected: AtomicBool::new(false),
            active_chain: AtomicU64::new(0),
        })
    }

    /// Load the key from the environment variable named in the config.
    pub fn from_env(config: &SaleConfig) -> ChainResult<Self> {
        let ConnectorConfig { private_key_env, .. } = &config.connector;
        let private_key = std::env::var(private_key_env).map_err(|_| {
            ChainError::Wallet(format!("Environment variable {} not set", private_key_env))
        })?;

        Self::from_private_key(&private_key, config)
    }

    /// Signer address, available before connecting.
    pub fn address(&self) -> Address {
        self.signer.address()
    }

    fn client(&self, chain_id: u64) -> ChainResult<&ChainClient> {
        self.clients
            .get(&chain_id)
            .ok_or(ChainError::UnsupportedNetwork(chain_id))
    }
}

#[async_trait]
impl WalletConnector for LocalWalletConnector {
    async fn connect(&self) -> ChainResult<Address> {
        self.connected.store(true, Ordering::SeqCst);
        tracing::info!(
            address = %self.signer.address(),
            project_id = %self.project_id,
            "Wallet connected"
        );
        Ok(self.signer.address())
    }

    async fn switch_chain(&self, chain_id: u64) -> ChainResult<()> {
        if !self.connected.load(Ordering::SeqCst) {
            return Err(ChainError::NotConnected);
        }
        let client = self.client(chain_id)?;
        client.verify_chain_id().await?;

        self.active_chain.store(chain_id, Ordering::SeqCst);
        tracing::info!(chain_id, network = %client.network().name, "Wallet switched network");
        Ok(())
    }

    fn active_account(&self) -> Option<Address> {
        self.connected
            .load(Ordering::SeqCst)
            .then(|| self.signer.address())
    }

    fn active_chain(&self) -> Option<u64> {
        if !self.connected.load(Ordering::SeqCst) {
            return None;
        }
        match self.active_chain.load(Ordering::SeqCst) {
            0 => None,
            id => Some(id),
        }
    }
}

#[async_trait]
impl TransactionSender for LocalWalletConnector {
    async fn send(&self, call: &PreparedCall) -> ChainResult<TxHash> {
        let from = self.active_account().ok_or(ChainError::NotConnected)?;
        match self.active_chain() {
            Some(active) if active == call.chain_id => {}
            Some(active) => {
                return Err(ChainError::WrongNetwork {
                    expected: call.chain_id,
                    actual: active,
                })
            }
            None => return Err(ChainError::NotConnected),
        }

        let tx = TransactionRequest::default()
            .with_from(from)
            .with_to(call.to)
            .with_input(call.input.clone())
            .with_gas_limit(call.gas_limit)
            .with_chain_id(call.chain_id);

        let tx_hash = self.client(call.chain_id)?.send_transaction(tx).await?;
        tracing::info!(
            kind = call.kind.as_str(),
            chain_id = call.chain_id,
            to = %call.to,
            tx_hash = %tx_hash,
            "Transaction broadcast"
        );
        Ok(tx_hash)
    }

    async fn wait_for_confirmation(&self, chain_id: u64, tx_hash: TxHash) -> ChainResult<Confirmation> {
        let client = self.client(chain_id)?;
        transaction::wait_for_confirmation(client, tx_hash, &self.policy).await
    }
}

impl std::fmt::Debug for LocalWalletConnector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalWalletConnector")
            .field("address", &self.signer.address())
            .field("networks", &self.clients.len())
            .field("active_chain", &self.active_chain())
            .finish()
    }
}
