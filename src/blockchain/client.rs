//! Per-network RPC client with failover, timeouts and a signing provider.
//!
//! # Responsibilities
//! - Connect to the JSON-RPC endpoints of one configured network
//! - Query chain state (chain id, block number, receipts)
//! - Sign and broadcast transactions through the primary endpoint
//! - Handle timeouts and network errors gracefully

use alloy::network::EthereumWallet;
use alloy::primitives::TxHash;
use alloy::providers::{Provider, ProviderBuilder};
use alloy::rpc::types::{TransactionReceipt, TransactionRequest};
use alloy::signers::local::PrivateKeySigner;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

use crate::blockchain::types::{ChainError, ChainId, ChainResult};
use crate::config::schema::NetworkConfig;

/// RPC access to a single network.
#[derive(Clone)]
pub struct ChainClient {
    /// Read providers (primary + failovers).
    providers: Vec<Arc<dyn Provider + Send + Sync>>,
    /// Primary endpoint with the local signer attached.
    signing: Arc<dyn Provider + Send + Sync>,
    network: NetworkConfig,
    timeout_duration: Duration,
}

impl ChainClient {
    /// Create a client for one network.
    ///
    /// Nothing is contacted here; the chain id is verified when the wallet
    /// switches onto this network.
    pub fn new(
        network: &NetworkConfig,
        signer: &PrivateKeySigner,
        rpc_timeout_secs: u64,
    ) -> ChainResult<Self> {
        let primary_url: url::Url = network.rpc_url.parse().map_err(|e| {
            ChainError::Rpc(format!("Invalid RPC URL '{}': {}", network.rpc_url, e))
        })?;

        let mut providers = Vec::new();
        providers.push(
            Arc::new(ProviderBuilder::new().connect_http(primary_url.clone()))
                as Arc<dyn Provider + Send + Sync>,
        );

        for url_str in &network.failover_urls {
            if let Ok(url) = url_str.parse() {
                providers.push(
                    Arc::new(ProviderBuilder::new().connect_http(url)) as Arc<dyn Provider + Send + Sync>
                );
            } else {
                tracing::warn!(url = %url_str, chain_id = network.chain_id, "Ignoring invalid failover RPC URL");
            }
        }

        let signing = Arc::new(
            ProviderBuilder::new()
                .wallet(EthereumWallet::from(signer.clone()))
                .connect_http(primary_url),
        ) as Arc<dyn Provider + Send + Sync>;

        Ok(Self {
            providers,
            signing,
            network: network.clone(),
            timeout_duration: Duration::from_secs(rpc_timeout_secs),
        })
    }

    /// Verify the endpoint actually serves the configured chain.
    pub async fn verify_chain_id(&self) -> ChainResult<()> {
        let chain_id = self.get_chain_id().await?;
        if chain_id.0 != self.network.chain_id {
            return Err(ChainError::UnsupportedNetwork(self.network.chain_id));
        }
        Ok(())
    }

    /// Get the chain ID from the RPC.
    pub async fn get_chain_id(&self) -> ChainResult<ChainId> {
        for (i, provider) in self.providers.iter().enumerate() {
            match timeout(self.timeout_duration, provider.get_chain_id()).await {
                Ok(Ok(result)) => return Ok(ChainId(result)),
                Ok(Err(e)) => {
                    tracing::warn!(provider_idx = i, error = %e, "RPC error, trying next provider");
                }
                Err(_) => {
                    tracing::warn!(provider_idx = i, "RPC timeout, trying next provider");
                }
            }
        }
        Err(ChainError::Rpc("All RPC providers failed".to_string()))
    }

    /// Get the latest block number.
    pub async fn get_block_number(&self) -> ChainResult<u64> {
        for (i, provider) in self.providers.iter().enumerate() {
            match timeout(self.timeout_duration, provider.get_block_number()).await {
                Ok(Ok(result)) => return Ok(result),
                Ok(Err(e)) => tracing::warn!(provider_idx = i, error = %e, "RPC error"),
                Err(_) => tracing::warn!(provider_idx = i, "RPC timeout"),
            }
        }
        Err(ChainError::Rpc("All providers failed to get block number".to_string()))
    }

    /// Get a transaction receipt by hash.
    pub async fn get_transaction_receipt(
        &self,
        tx_hash: TxHash,
    ) -> ChainResult<Option<TransactionReceipt>> {
        for (i, provider) in self.providers.iter().enumerate() {
            match timeout(self.timeout_duration, provider.get_transaction_receipt(tx_hash)).await {
                Ok(Ok(result)) => return Ok(result),
                Ok(Err(e)) => tracing::warn!(provider_idx = i, error = %e, "RPC error"),
                Err(_) => tracing::warn!(provider_idx = i, "RPC timeout"),
            }
        }
        Err(ChainError::Rpc("All providers failed to get receipt".to_string()))
    }

    /// Sign and broadcast a transaction.
    ///
    /// Broadcasts are never retried on a failover endpoint: a timed out
    /// send may still land, and resending would duplicate it.
    pub async fn send_transaction(&self, tx: TransactionRequest) -> ChainResult<TxHash> {
        match timeout(self.timeout_duration, self.signing.send_transaction(tx)).await {
            Ok(Ok(pending)) => Ok(*pending.tx_hash()),
            Ok(Err(e)) => Err(ChainError::from_transport(&e)),
            Err(_) => Err(ChainError::Timeout(self.timeout_duration.as_secs())),
        }
    }

    pub fn network(&self) -> &NetworkConfig {
        &self.network
    }
}

impl std::fmt::Debug for ChainClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainClient")
            .field("name", &self.network.name)
            .field("rpc_url", &self.network.rpc_url)
            .field("chain_id", &self.network.chain_id)
            .field("timeout_secs", &self.timeout_duration.as_secs())
            .finish()
    }
}
