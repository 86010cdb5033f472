//! Transaction building, signing, and receipt monitoring.
//!
//! # Responsibilities
//! - Build legacy transactions with fixed gas limit and gas price
//! - Fetch the pending nonce fresh for every transaction
//! - Sign locally and broadcast
//! - Poll for a receipt within a bounded wait
//!
//! Nothing here retries: a rejected broadcast is returned to the caller.

use alloy::network::TransactionBuilder;
use alloy::primitives::{Address, Bytes, TxHash, U256};
use alloy::rpc::types::TransactionRequest;
use std::time::Duration;
use tokio::time::{interval, timeout};

use crate::blockchain::client::BlockchainClient;
use crate::blockchain::types::{BlockchainError, BlockchainResult, ChainId, ConfirmationStatus};
use crate::blockchain::wallet::Wallet;
use crate::config::ChainConfig;

const WEI_PER_GWEI: u128 = 1_000_000_000;

/// A contract call ready to be turned into a transaction.
#[derive(Debug, Clone)]
pub struct ContractCall {
    pub to: Address,
    pub input: Bytes,
    pub gas_limit: u64,
}

/// Fixed transaction parameters.
#[derive(Debug, Clone)]
pub struct TxSettings {
    pub chain_id: ChainId,
    pub gas_price_wei: u128,
    pub receipt_timeout: Duration,
    pub receipt_poll_interval: Duration,
}

impl TxSettings {
    pub fn from_config(config: &ChainConfig, chain_id: ChainId) -> Self {
        Self {
            chain_id,
            gas_price_wei: config.gas_price_gwei as u128 * WEI_PER_GWEI,
            receipt_timeout: Duration::from_secs(config.receipt_timeout_secs),
            receipt_poll_interval: Duration::from_millis(config.receipt_poll_interval_ms),
        }
    }
}

/// Transaction builder for contract calls.
#[derive(Debug, Clone)]
pub struct TxBuilder {
    client: BlockchainClient,
    wallet: Wallet,
    settings: TxSettings,
}

impl TxBuilder {
    /// Create a new transaction builder.
    pub fn new(client: BlockchainClient, wallet: Wallet, settings: TxSettings) -> Self {
        Self {
            client,
            wallet,
            settings,
        }
    }

    /// Build a transaction request for `call`.
    ///
    /// The nonce is the account's pending-inclusive transaction count,
    /// fetched on every call.
    pub async fn build(&self, call: ContractCall) -> BlockchainResult<TransactionRequest> {
        let nonce = self
            .client
            .get_pending_transaction_count(self.wallet.address())
            .await?;

        let tx = TransactionRequest::default()
            .with_from(self.wallet.address())
            .with_to(call.to)
            .with_value(U256::ZERO)
            .with_input(call.input)
            .with_nonce(nonce)
            .with_gas_price(self.settings.gas_price_wei)
            .with_chain_id(self.settings.chain_id.0)
            .with_gas_limit(call.gas_limit);

        Ok(tx)
    }

    /// Build, sign and broadcast `call`. Returns as soon as the node accepts it.
    pub async fn send(&self, call: ContractCall) -> BlockchainResult<TxHash> {
        let tx = self.build(call).await?;
        let nonce = tx.nonce;
        let raw = self.wallet.sign_transaction(tx).await?;
        let tx_hash = self.client.send_raw_transaction(raw).await?;

        tracing::debug!(tx_hash = %tx_hash, nonce = ?nonce, "Transaction broadcast");
        Ok(tx_hash)
    }

    /// Wait for a receipt for `tx_hash`.
    ///
    /// Never fails: a timeout yields [`ConfirmationStatus::Pending`] and a
    /// polling error yields [`ConfirmationStatus::Unknown`].
    pub async fn wait_for_receipt(&self, tx_hash: TxHash) -> ConfirmationStatus {
        let poll_interval = self.settings.receipt_poll_interval;

        let result = timeout(self.settings.receipt_timeout, async {
            let mut ticker = interval(poll_interval);

            loop {
                ticker.tick().await;

                let receipt = match self.client.get_transaction_receipt(tx_hash).await? {
                    Some(r) => r,
                    None => {
                        tracing::debug!(tx_hash = %tx_hash, "Transaction pending");
                        continue;
                    }
                };

                let block_number = receipt.block_number.unwrap_or_default();
                let status = if receipt.status() {
                    ConfirmationStatus::Confirmed { block_number }
                } else {
                    ConfirmationStatus::Reverted { block_number }
                };
                return Ok::<_, BlockchainError>(status);
            }
        })
        .await;

        match result {
            Ok(Ok(status)) => status,
            Ok(Err(e)) => ConfirmationStatus::Unknown(e.to_string()),
            Err(_) => ConfirmationStatus::Pending,
        }
    }

    /// Get the wallet address.
    pub fn address(&self) -> Address {
        self.wallet.address()
    }

    /// Underlying RPC client.
    pub fn client(&self) -> &BlockchainClient {
        &self.client
    }
}
