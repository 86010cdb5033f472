//! Blockchain RPC client with timeout and error handling.
//!
//! # Responsibilities
//! - Connect to JSON-RPC endpoint(s)
//! - Query chain state (chain id, block number, pending nonce, receipts)
//! - Broadcast signed transactions and run read-only calls
//! - Move to the next endpoint on timeouts and network errors only

use alloy::primitives::{Address, Bytes, TxHash};
use alloy::providers::{Provider, ProviderBuilder};
use alloy::rpc::types::{TransactionReceipt, TransactionRequest};
use alloy::transports::TransportResult;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

use crate::blockchain::types::{BlockchainError, BlockchainResult, ChainId};
use crate::config::ChainConfig;
use crate::observability::metrics;

type DynProvider = Arc<dyn Provider + Send + Sync>;

/// Blockchain RPC client wrapper with failover support.
#[derive(Clone)]
pub struct BlockchainClient {
    /// List of providers (primary + failovers).
    providers: Vec<DynProvider>,
    /// Primary endpoint, kept for logging.
    rpc_url: String,
    /// Request timeout duration.
    timeout_duration: Duration,
}

impl BlockchainClient {
    /// Create a new blockchain client.
    ///
    /// No request is made here; an unreachable node only shows up on the
    /// first call.
    pub fn new(config: &ChainConfig) -> BlockchainResult<Self> {
        let mut providers = Vec::new();

        let primary_url: url::Url = config.rpc_url.parse().map_err(|e| {
            BlockchainError::Rpc(format!("Invalid RPC URL '{}': {}", config.rpc_url, e))
        })?;
        providers.push(Self::connect(primary_url));

        for url_str in &config.failover_urls {
            if let Ok(url) = url_str.parse() {
                providers.push(Self::connect(url));
            } else {
                tracing::warn!(url = %url_str, "Ignoring invalid failover RPC URL");
            }
        }

        tracing::info!(
            rpc_url = %config.rpc_url,
            failover_count = providers.len() - 1,
            "Blockchain client initialized"
        );

        Ok(Self {
            providers,
            rpc_url: config.rpc_url.clone(),
            timeout_duration: Duration::from_secs(config.rpc_timeout_secs),
        })
    }

    fn connect(url: url::Url) -> DynProvider {
        Arc::new(
            ProviderBuilder::new()
                .disable_recommended_fillers()
                .connect_http(url),
        ) as DynProvider
    }

    /// Run `call` against each provider in order until one answers in time.
    ///
    /// Only transport failures and timeouts move on to the next provider.
    /// An error response from a node is returned as is.
    async fn with_failover<T, F, Fut>(&self, what: &str, call: F) -> BlockchainResult<T>
    where
        F: Fn(DynProvider) -> Fut,
        Fut: Future<Output = TransportResult<T>>,
    {
        let mut last_error = String::from("no providers configured");
        for (i, provider) in self.providers.iter().enumerate() {
            match timeout(self.timeout_duration, call(provider.clone())).await {
                Ok(Ok(result)) => return Ok(result),
                // The node answered; another node would only repeat or resubmit
                Ok(Err(e)) if e.is_error_resp() => {
                    tracing::warn!(provider_idx = i, rpc = what, error = %e, "RPC rejected");
                    return Err(BlockchainError::Rpc(e.to_string()));
                }
                Ok(Err(e)) => {
                    tracing::warn!(provider_idx = i, rpc = what, error = %e, "RPC error");
                    last_error = e.to_string();
                }
                Err(_) => {
                    tracing::warn!(provider_idx = i, rpc = what, "RPC timeout");
                    last_error = format!("timed out after {}s", self.timeout_duration.as_secs());
                }
            }
        }

        if self.providers.len() == 1 {
            Err(BlockchainError::Rpc(last_error))
        } else {
            Err(BlockchainError::Rpc(format!(
                "All providers failed to {}: {}",
                what, last_error
            )))
        }
    }

    /// Get the chain ID from the RPC.
    pub async fn get_chain_id(&self) -> BlockchainResult<ChainId> {
        self.with_failover("get chain id", |p| async move { p.get_chain_id().await })
            .await
            .map(ChainId)
    }

    /// Resolve the chain ID to sign with.
    ///
    /// A configured ID is checked against the node when it is reachable;
    /// without one, the node's answer is used.
    pub async fn resolve_chain_id(&self, configured: Option<u64>) -> BlockchainResult<ChainId> {
        match configured {
            Some(expected) => {
                match self.get_chain_id().await {
                    Ok(actual) if actual.0 != expected => {
                        return Err(BlockchainError::ChainMismatch {
                            expected,
                            actual: actual.0,
                        });
                    }
                    Ok(_) => {}
                    Err(e) => {
                        tracing::warn!(
                            error = %e,
                            chain_id = expected,
                            "Chain verification failed, using configured chain id"
                        );
                    }
                }
                Ok(ChainId(expected))
            }
            None => self.get_chain_id().await,
        }
    }

    /// Get the latest block number.
    pub async fn get_block_number(&self) -> BlockchainResult<u64> {
        self.with_failover("get block number", |p| async move { p.get_block_number().await })
            .await
    }

    /// Get the pending-inclusive transaction count (next nonce) for an address.
    pub async fn get_pending_transaction_count(&self, address: Address) -> BlockchainResult<u64> {
        self.with_failover("get transaction count", |p| async move {
            p.get_transaction_count(address).pending().await
        })
        .await
    }

    /// Broadcast signed transaction bytes. Returns the hash reported by the node.
    pub async fn send_raw_transaction(&self, raw: Bytes) -> BlockchainResult<TxHash> {
        self.with_failover("send transaction", |p| {
            let raw = raw.clone();
            async move {
                p.send_raw_transaction(&raw)
                    .await
                    .map(|pending| *pending.tx_hash())
            }
        })
        .await
    }

    /// Get a transaction receipt by hash.
    pub async fn get_transaction_receipt(
        &self,
        tx_hash: TxHash,
    ) -> BlockchainResult<Option<TransactionReceipt>> {
        self.with_failover("get receipt", |p| async move {
            p.get_transaction_receipt(tx_hash).await
        })
        .await
    }

    /// Execute a read-only `eth_call` against `to` with `input` calldata.
    pub async fn call(&self, to: Address, input: Bytes) -> BlockchainResult<Bytes> {
        let request = TransactionRequest::default().to(to).input(input.into());
        self.with_failover("call contract", |p| {
            let request = request.clone();
            async move { p.call(request).await }
        })
        .await
    }

    /// Check if the blockchain is reachable and healthy.
    ///
    /// Returns true if we can query the block number.
    pub async fn is_healthy(&self) -> bool {
        let healthy = self.get_block_number().await.is_ok();
        metrics::record_rpc_health(healthy);
        healthy
    }

    /// Primary RPC endpoint URL.
    pub fn rpc_url(&self) -> &str {
        &self.rpc_url
    }
}

impl std::fmt::Debug for BlockchainClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockchainClient")
            .field("rpc_url", &self.rpc_url)
            .field("providers", &self.providers.len())
            .field("timeout_secs", &self.timeout_duration.as_secs())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> ChainConfig {
        ChainConfig {
            rpc_url: "http://127.0.0.1:1".to_string(),
            rpc_timeout_secs: 2,
            ..ChainConfig::default()
        }
    }

    #[test]
    fn test_client_creation_is_lazy() {
        // Nothing listens on port 1, but construction must not touch the network
        let client = BlockchainClient::new(&test_config()).unwrap();
        assert_eq!(client.rpc_url(), "http://127.0.0.1:1");
    }

    #[test]
    fn test_invalid_rpc_url() {
        let mut config = test_config();
        config.rpc_url = "not a url".to_string();
        let err = BlockchainClient::new(&config).unwrap_err();
        assert!(err.to_string().contains("Invalid RPC URL"));
    }

    #[tokio::test]
    async fn test_rpc_failover() {
        let mut config = test_config();
        config.failover_urls.push("http://127.0.0.1:2".to_string());
        config.failover_urls.push("::garbage::".to_string());

        let client = BlockchainClient::new(&config).unwrap();
        assert_eq!(client.providers.len(), 2);

        let result = client.get_chain_id().await;
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("All providers failed to get chain id"));
    }

    #[tokio::test]
    async fn test_unreachable_node_is_unhealthy() {
        let client = BlockchainClient::new(&test_config()).unwrap();
        assert!(!client.is_healthy().await);
    }
}
