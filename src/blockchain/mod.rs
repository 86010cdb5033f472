//! Blockchain integration subsystem.
//!
//! # Data Flow
//! ```text
//! Environment Variables (private key, RPC URL, contract address)
//!     → wallet.rs (key loading, signing)
//!     → abi.rs (entry points from the ABI file)
//!     → client.rs (RPC connection with timeouts)
//!     → transaction.rs (build, sign, broadcast, receipt)
//!     → queue.rs (direct or single-writer submission)
//!     → contract.rs (submit / vote / read articles)
//! ```
//!
//! # Security Constraints
//! - Private keys ONLY from environment variables
//! - Never log private keys or sensitive data
//! - All RPC calls have configurable timeouts

pub mod abi;
pub mod client;
pub mod contract;
pub mod queue;
pub mod transaction;
pub mod types;
pub mod wallet;

pub use abi::ContractBindings;
pub use client::BlockchainClient;
pub use contract::{ArticleContract, ArticleLedger};
pub use types::{Article, BlockchainError, ChainId, ConfirmationStatus, SubmittedTx};
pub use wallet::Wallet;
