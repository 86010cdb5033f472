//! Article bridge: HTTP gateway in front of an article contract.
//!
//! Submits articles, casts votes and reads articles from a deployed EVM
//! contract, signing transactions locally with one configured key.

pub mod blockchain;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;

pub use blockchain::{ArticleContract, ArticleLedger};
pub use config::BridgeConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
