//! Chain-specific types and error definitions.

use alloy::primitives::{Address, TxHash};
use serde::Serialize;
use thiserror::Error;

/// Chain ID type for strong typing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChainId(pub u64);

impl From<u64> for ChainId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl From<ChainId> for u64 {
    fn from(id: ChainId) -> Self {
        id.0
    }
}

/// Errors that can occur during blockchain operations.
#[derive(Debug, Error)]
pub enum BlockchainError {
    /// RPC connection or request failed.
    #[error("RPC error: {0}")]
    Rpc(String),

    /// RPC request timed out.
    #[error("RPC timeout after {0} seconds")]
    Timeout(u64),

    /// Invalid private key format or missing key.
    #[error("Wallet error: {0}")]
    Wallet(String),

    /// ABI file unreadable or missing a required entry point.
    #[error("ABI error: {0}")]
    Abi(String),

    /// Arguments could not be encoded for the contract call.
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// Contract return data did not match the expected shape.
    #[error("Decoding error: {0}")]
    Decoding(String),

    /// Transaction could not be signed.
    #[error("Signing error: {0}")]
    Signing(String),

    /// Chain configuration mismatch.
    #[error("Chain ID mismatch: expected {expected}, got {actual}")]
    ChainMismatch { expected: u64, actual: u64 },

    /// Requested article index is at or past the current article count.
    #[error("Invalid article ID {index}: out of bounds (total {total})")]
    ArticleOutOfBounds { index: u64, total: u64 },

    /// The serialized submission worker is gone.
    #[error("Submission queue closed")]
    SubmissionQueueClosed,
}

/// Result type for blockchain operations.
pub type BlockchainResult<T> = Result<T, BlockchainError>;

/// Transaction confirmation status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmationStatus {
    /// Not waited for, or no receipt before the deadline.
    Pending,
    /// Mined and executed successfully.
    Confirmed { block_number: u64 },
    /// Mined but execution failed.
    Reverted { block_number: u64 },
    /// Receipt polling itself failed.
    Unknown(String),
}

/// Result of a state-changing contract call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmittedTx {
    pub tx_hash: TxHash,
    pub status: ConfirmationStatus,
}

impl SubmittedTx {
    /// The hash as `0x` followed by 64 lowercase hex characters.
    pub fn tx_hash_hex(&self) -> String {
        format!("{:#x}", self.tx_hash)
    }
}

/// Contract-owned article snapshot, fields in contract order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Article {
    pub title: String,
    #[serde(rename = "hash")]
    pub content_hash: String,
    #[serde(rename = "submittedBy", serialize_with = "checksummed")]
    pub submitter: Address,
    pub upvotes: u64,
    pub downvotes: u64,
    pub verified: bool,
}

fn checksummed<S: serde::Serializer>(address: &Address, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&address.to_checksum(None))
}
