//! The article contract: submit, vote, read.
//!
//! # Data Flow
//! ```text
//! submit_article / vote_article
//!     → abi.rs (encode calldata)
//!     → queue.rs (direct or serialized submission)
//!     → transaction.rs (nonce, sign, broadcast[, receipt wait])
//!
//! get_article
//!     → abi.rs (count strategy) → eth_call → bounds check
//!     → abi.rs (getArticle) → eth_call → decode
//! ```

use alloy::primitives::Address;
use async_trait::async_trait;
use std::path::Path;
use std::time::Instant;
use tokio::sync::broadcast;

use crate::blockchain::abi::ContractBindings;
use crate::blockchain::client::BlockchainClient;
use crate::blockchain::queue::Submitter;
use crate::blockchain::transaction::{ContractCall, TxBuilder, TxSettings};
use crate::blockchain::types::{
    Article, BlockchainError, BlockchainResult, ConfirmationStatus, SubmittedTx,
};
use crate::blockchain::wallet::Wallet;
use crate::config::ChainConfig;
use crate::observability::metrics;

/// Operations the HTTP gateway needs from the chain.
#[async_trait]
pub trait ArticleLedger: Send + Sync {
    /// Submit an article and wait (bounded) for its receipt.
    ///
    /// On-chain execution failure is logged, not returned as an error.
    async fn submit_article(
        &self,
        title: &str,
        content_hash: &str,
    ) -> BlockchainResult<SubmittedTx>;

    /// Cast a vote. Returns once the node accepts the transaction.
    async fn vote_article(&self, article_id: u64, upvote: bool) -> BlockchainResult<SubmittedTx>;

    /// Read one article, rejecting out-of-range indices before the read.
    async fn get_article(&self, article_id: u64) -> BlockchainResult<Article>;

    /// Whether the chain endpoint currently answers.
    async fn is_healthy(&self) -> bool;
}

/// Chain client bound to one deployed article contract and one signer.
#[derive(Debug, Clone)]
pub struct ArticleContract {
    bindings: ContractBindings,
    builder: TxBuilder,
    submitter: Submitter,
    submit_gas_limit: u64,
    vote_gas_limit: u64,
}

impl ArticleContract {
    /// Wire up the contract from configuration.
    ///
    /// Loads and checks the ABI, resolves the chain id, and starts the
    /// submission worker when `serialize_submissions` is set.
    pub async fn connect(
        config: &ChainConfig,
        wallet: Wallet,
        shutdown: broadcast::Receiver<()>,
    ) -> BlockchainResult<Self> {
        let address: Address = config.contract_address.parse().map_err(|e| {
            BlockchainError::Abi(format!(
                "Invalid contract address '{}': {}",
                config.contract_address, e
            ))
        })?;
        let bindings = ContractBindings::load(Path::new(&config.abi_path), address)?;

        let client = BlockchainClient::new(config)?;
        let chain_id = client.resolve_chain_id(config.chain_id).await?;
        let builder = TxBuilder::new(client, wallet, TxSettings::from_config(config, chain_id));

        let submitter = if config.serialize_submissions {
            Submitter::spawn_queued(builder.clone(), shutdown)
        } else {
            Submitter::direct(builder.clone())
        };

        tracing::info!(
            contract = %address,
            chain_id = chain_id.0,
            account = %builder.address(),
            serialized = submitter.is_serialized(),
            "Article contract ready"
        );

        Ok(Self::new(
            bindings,
            builder,
            submitter,
            config.submit_gas_limit,
            config.vote_gas_limit,
        ))
    }

    pub fn new(
        bindings: ContractBindings,
        builder: TxBuilder,
        submitter: Submitter,
        submit_gas_limit: u64,
        vote_gas_limit: u64,
    ) -> Self {
        Self {
            bindings,
            builder,
            submitter,
            submit_gas_limit,
            vote_gas_limit,
        }
    }

    /// Current number of articles, using the strategy chosen at startup.
    pub async fn article_count(&self) -> BlockchainResult<u64> {
        let input = self.bindings.encode_count()?;
        let output = self.builder.client().call(self.bindings.address(), input).await?;
        self.bindings.decode_count(&output)
    }

    fn call(&self, input: alloy::primitives::Bytes, gas_limit: u64) -> ContractCall {
        ContractCall {
            to: self.bindings.address(),
            input,
            gas_limit,
        }
    }

    async fn try_submit_article(
        &self,
        title: &str,
        content_hash: &str,
    ) -> BlockchainResult<SubmittedTx> {
        let input = self.bindings.encode_submit_article(title, content_hash)?;
        let tx_hash = self
            .submitter
            .submit(self.call(input, self.submit_gas_limit))
            .await?;

        let status = self.builder.wait_for_receipt(tx_hash).await;
        match &status {
            ConfirmationStatus::Confirmed { block_number } => {
                tracing::info!(tx_hash = %tx_hash, block_number, "Article submitted successfully");
            }
            ConfirmationStatus::Reverted { block_number } => {
                tracing::warn!(
                    tx_hash = %tx_hash,
                    block_number,
                    "Article transaction failed on-chain"
                );
            }
            ConfirmationStatus::Pending => {
                tracing::warn!(tx_hash = %tx_hash, "Receipt timeout, transaction still pending");
            }
            ConfirmationStatus::Unknown(reason) => {
                tracing::warn!(tx_hash = %tx_hash, error = %reason, "Receipt wait failed");
            }
        }

        Ok(SubmittedTx { tx_hash, status })
    }

    async fn try_vote_article(
        &self,
        article_id: u64,
        upvote: bool,
    ) -> BlockchainResult<SubmittedTx> {
        let input = self.bindings.encode_vote_article(article_id, upvote)?;
        let tx_hash = self
            .submitter
            .submit(self.call(input, self.vote_gas_limit))
            .await?;

        tracing::info!(tx_hash = %tx_hash, article_id, upvote, "Vote transaction sent");
        Ok(SubmittedTx {
            tx_hash,
            status: ConfirmationStatus::Pending,
        })
    }

    async fn try_get_article(&self, article_id: u64) -> BlockchainResult<Article> {
        let total = self.article_count().await?;
        check_bounds(article_id, total)?;

        let input = self.bindings.encode_get_article(article_id)?;
        let output = self.builder.client().call(self.bindings.address(), input).await?;
        self.bindings.decode_article(&output)
    }
}

#[async_trait]
impl ArticleLedger for ArticleContract {
    async fn submit_article(
        &self,
        title: &str,
        content_hash: &str,
    ) -> BlockchainResult<SubmittedTx> {
        let start = Instant::now();
        let result = self.try_submit_article(title, content_hash).await;
        observe("submit_article", start, &result, |tx| status_label(&tx.status));
        result
    }

    async fn vote_article(&self, article_id: u64, upvote: bool) -> BlockchainResult<SubmittedTx> {
        let start = Instant::now();
        let result = self.try_vote_article(article_id, upvote).await;
        observe("vote_article", start, &result, |_| "sent");
        result
    }

    async fn get_article(&self, article_id: u64) -> BlockchainResult<Article> {
        let start = Instant::now();
        let result = self.try_get_article(article_id).await;
        observe("get_article", start, &result, |_| "ok");
        result
    }

    async fn is_healthy(&self) -> bool {
        self.builder.client().is_healthy().await
    }
}

/// Reject `index` unless it is below `total`.
pub fn check_bounds(index: u64, total: u64) -> BlockchainResult<()> {
    if index >= total {
        return Err(BlockchainError::ArticleOutOfBounds { index, total });
    }
    Ok(())
}

fn status_label(status: &ConfirmationStatus) -> &'static str {
    match status {
        ConfirmationStatus::Confirmed { .. } => "confirmed",
        ConfirmationStatus::Reverted { .. } => "reverted",
        ConfirmationStatus::Pending => "pending",
        ConfirmationStatus::Unknown(_) => "unknown",
    }
}

/// Log failures with the operation tag and record metrics for every call.
fn observe<T>(
    op: &'static str,
    start: Instant,
    result: &BlockchainResult<T>,
    label: impl FnOnce(&T) -> &'static str,
) {
    let outcome = match result {
        Ok(value) => label(value),
        Err(BlockchainError::ArticleOutOfBounds { index, total }) => {
            tracing::info!(op, index, total, "Article index out of bounds");
            "out_of_bounds"
        }
        Err(e) => {
            tracing::error!(op, error = %e, "Chain operation failed");
            "error"
        }
    };
    metrics::record_chain_operation(op, outcome, start);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds() {
        assert!(check_bounds(0, 5).is_ok());
        assert!(check_bounds(4, 5).is_ok());
        assert!(matches!(
            check_bounds(5, 5),
            Err(BlockchainError::ArticleOutOfBounds { index: 5, total: 5 })
        ));
        assert!(check_bounds(0, 0).is_err());
        assert!(check_bounds(u64::MAX, 5).is_err());
    }

    #[test]
    fn test_status_labels() {
        assert_eq!(status_label(&ConfirmationStatus::Pending), "pending");
        assert_eq!(
            status_label(&ConfirmationStatus::Reverted { block_number: 9 }),
            "reverted"
        );
    }
}
