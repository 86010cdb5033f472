//! Shared utilities for integration tests.
//!
//! - [`MockLedger`]: in-memory `ArticleLedger` that counts calls
//! - [`start_mock_node`]: a JSON-RPC node that serves the article contract

#![allow(dead_code)]

use alloy::consensus::{Transaction, TxEnvelope};
use alloy::dyn_abi::DynSolValue;
use alloy::eips::eip2718::Decodable2718;
use alloy::json_abi::JsonAbi;
use alloy::primitives::{address, hex, Address, FixedBytes, TxHash, U256};
use async_trait::async_trait;
use axum::{extract::State, routing::post, Json, Router};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::Barrier;

use ziptales_bridge::blockchain::contract::check_bounds;
use ziptales_bridge::blockchain::types::{
    Article, BlockchainError, BlockchainResult, ConfirmationStatus, SubmittedTx,
};
use ziptales_bridge::blockchain::ArticleLedger;
use ziptales_bridge::config::ChainConfig;

/// Anvil's first account.
pub const TEST_PRIVATE_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
pub const TEST_ACCOUNT: Address = address!("f39fd6e51aad88f6f4ce6ab8827279cfffb92266");
pub const CONTRACT: Address = address!("5FbDB2315678afecb367f032d93F642f64180aa3");
pub const CHAIN_ID: u64 = 31337;

pub fn abi_path() -> String {
    concat!(env!("CARGO_MANIFEST_DIR"), "/abi/ZipTalesABI.json").to_string()
}

pub fn sample_article(i: u64) -> Article {
    Article {
        title: format!("Article {}", i),
        content_hash: format!("0x{:064x}", i + 1),
        submitter: TEST_ACCOUNT,
        upvotes: i * 2,
        downvotes: i,
        verified: i % 2 == 0,
    }
}

pub fn is_tx_hash(s: &str) -> bool {
    s.len() == 66 && s.starts_with("0x") && s[2..].chars().all(|c| c.is_ascii_hexdigit())
}

// ---------------------------------------------------------------------------
// Mock ledger
// ---------------------------------------------------------------------------

/// In-memory ledger with call counters.
#[derive(Default)]
pub struct MockLedger {
    pub articles: Vec<Article>,
    pub fail_with: Option<String>,
    pub healthy: bool,
    pub submit_calls: AtomicUsize,
    pub vote_calls: AtomicUsize,
    pub read_calls: AtomicUsize,
    pub last_vote: Mutex<Option<(u64, bool)>>,
    /// Submissions take this long before answering.
    pub delay: Option<Duration>,
}

impl MockLedger {
    pub fn with_articles(n: u64) -> Self {
        Self {
            articles: (0..n).map(sample_article).collect(),
            healthy: true,
            ..Default::default()
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            fail_with: Some(message.to_string()),
            ..Default::default()
        }
    }

    pub fn slow(delay: Duration) -> Self {
        Self {
            healthy: true,
            delay: Some(delay),
            ..Default::default()
        }
    }

    fn check_failure(&self) -> BlockchainResult<()> {
        match &self.fail_with {
            Some(msg) => Err(BlockchainError::Rpc(msg.clone())),
            None => Ok(()),
        }
    }

    fn next_hash(&self) -> TxHash {
        let n = self.submit_calls.load(Ordering::SeqCst) + self.vote_calls.load(Ordering::SeqCst);
        TxHash::left_padding_from(&(n as u64 + 0xabc).to_be_bytes())
    }
}

#[async_trait]
impl ArticleLedger for MockLedger {
    async fn submit_article(
        &self,
        _title: &str,
        _content_hash: &str,
    ) -> BlockchainResult<SubmittedTx> {
        self.submit_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.check_failure()?;
        Ok(SubmittedTx {
            tx_hash: self.next_hash(),
            status: ConfirmationStatus::Reverted { block_number: 1 },
        })
    }

    async fn vote_article(&self, article_id: u64, upvote: bool) -> BlockchainResult<SubmittedTx> {
        self.vote_calls.fetch_add(1, Ordering::SeqCst);
        self.check_failure()?;
        *self.last_vote.lock().unwrap() = Some((article_id, upvote));
        Ok(SubmittedTx {
            tx_hash: self.next_hash(),
            status: ConfirmationStatus::Pending,
        })
    }

    async fn get_article(&self, article_id: u64) -> BlockchainResult<Article> {
        self.check_failure()?;
        check_bounds(article_id, self.articles.len() as u64)?;
        self.read_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.articles[article_id as usize].clone())
    }

    async fn is_healthy(&self) -> bool {
        self.healthy
    }
}

// ---------------------------------------------------------------------------
// Mock JSON-RPC node
// ---------------------------------------------------------------------------

/// Behaviour knobs and observations for the mock node.
pub struct NodeState {
    pub articles: Vec<Article>,
    /// `None` keeps every receipt pending.
    pub receipt_status: Option<bool>,
    /// Hold pending-count answers until this many callers are waiting.
    pub count_barrier: Option<Barrier>,
    pub count_calls: AtomicUsize,
    pub get_article_calls: AtomicUsize,
    /// Accepted transactions by nonce.
    pub accepted: Mutex<HashMap<u64, TxHash>>,
    /// Gas limits of accepted transactions, in arrival order.
    pub gas_limits: Mutex<Vec<u64>>,
    /// Reject every raw transaction with this message.
    pub reject_sends: Option<String>,
    abi: JsonAbi,
}

impl NodeState {
    pub fn new(articles: u64) -> Self {
        let abi: JsonAbi =
            serde_json::from_str(&std::fs::read_to_string(abi_path()).unwrap()).unwrap();
        Self {
            articles: (0..articles).map(sample_article).collect(),
            receipt_status: None,
            count_barrier: None,
            count_calls: AtomicUsize::new(0),
            get_article_calls: AtomicUsize::new(0),
            accepted: Mutex::new(HashMap::new()),
            gas_limits: Mutex::new(Vec::new()),
            reject_sends: None,
            abi,
        }
    }

    fn selector(&self, name: &str) -> FixedBytes<4> {
        self.abi.function(name).unwrap()[0].selector()
    }
}

/// Start the mock node on an ephemeral port and return its address.
pub async fn start_mock_node(state: Arc<NodeState>) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = Router::new().route("/", post(rpc)).with_state(state);

    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    addr
}

/// Chain config pointing at a mock node.
pub fn chain_config(node: SocketAddr) -> ChainConfig {
    ChainConfig {
        rpc_url: format!("http://{}", node),
        contract_address: CONTRACT.to_string(),
        abi_path: abi_path(),
        chain_id: Some(CHAIN_ID),
        rpc_timeout_secs: 5,
        receipt_timeout_secs: 2,
        receipt_poll_interval_ms: 50,
        ..ChainConfig::default()
    }
}

async fn rpc(State(state): State<Arc<NodeState>>, Json(body): Json<Value>) -> Json<Value> {
    match body {
        Value::Array(calls) => {
            let mut out = Vec::with_capacity(calls.len());
            for call in calls {
                out.push(handle_call(&state, call).await);
            }
            Json(Value::Array(out))
        }
        call => Json(handle_call(&state, call).await),
    }
}

async fn handle_call(state: &NodeState, call: Value) -> Value {
    let id = call["id"].clone();
    let params = call["params"].clone();

    let result = match call["method"].as_str().unwrap_or_default() {
        "eth_chainId" => Ok(json!(format!("0x{:x}", CHAIN_ID))),
        "eth_blockNumber" => Ok(json!("0x10")),
        "eth_getTransactionCount" => {
            state.count_calls.fetch_add(1, Ordering::SeqCst);
            if let Some(barrier) = &state.count_barrier {
                barrier.wait().await;
            }
            let count = state.accepted.lock().unwrap().len();
            Ok(json!(format!("0x{:x}", count)))
        }
        "eth_sendRawTransaction" => send_raw(state, params[0].as_str().unwrap_or_default()),
        "eth_getTransactionReceipt" => Ok(receipt(state, params[0].as_str().unwrap_or_default())),
        "eth_call" => eth_call(state, &params[0]),
        other => Err(format!("method {} not supported", other)),
    };

    match result {
        Ok(result) => json!({ "jsonrpc": "2.0", "id": id, "result": result }),
        Err(message) => json!({
            "jsonrpc": "2.0",
            "id": id,
            "error": { "code": -32000, "message": message }
        }),
    }
}

fn send_raw(state: &NodeState, raw_hex: &str) -> Result<Value, String> {
    if let Some(message) = &state.reject_sends {
        return Err(message.clone());
    }
    let raw = hex::decode(raw_hex).map_err(|e| e.to_string())?;
    let envelope = TxEnvelope::decode_2718(&mut raw.as_slice()).map_err(|e| e.to_string())?;
    let tx_hash = *envelope.tx_hash();

    let mut accepted = state.accepted.lock().unwrap();
    if accepted.contains_key(&envelope.nonce()) {
        return Err("nonce too low".to_string());
    }
    accepted.insert(envelope.nonce(), tx_hash);
    state.gas_limits.lock().unwrap().push(envelope.gas_limit());

    Ok(json!(format!("{:#x}", tx_hash)))
}

fn receipt(state: &NodeState, tx_hash: &str) -> Value {
    let Some(success) = state.receipt_status else {
        return Value::Null;
    };
    json!({
        "transactionHash": tx_hash,
        "transactionIndex": "0x0",
        "blockHash": format!("0x{}", "11".repeat(32)),
        "blockNumber": "0x10",
        "from": TEST_ACCOUNT.to_string(),
        "to": CONTRACT.to_string(),
        "cumulativeGasUsed": "0x5208",
        "gasUsed": "0x5208",
        "effectiveGasPrice": "0x4a817c800",
        "contractAddress": null,
        "logs": [],
        "logsBloom": format!("0x{}", "00".repeat(256)),
        "type": "0x0",
        "status": if success { "0x1" } else { "0x0" },
    })
}

fn eth_call(state: &NodeState, request: &Value) -> Result<Value, String> {
    let data = request["input"]
        .as_str()
        .or_else(|| request["data"].as_str())
        .ok_or("missing calldata")?;
    let data = hex::decode(data).map_err(|e| e.to_string())?;
    if data.len() < 4 {
        return Err("calldata too short".to_string());
    }
    let selector = FixedBytes::<4>::from_slice(&data[..4]);

    let encoded = if selector == state.selector("articlesLength") {
        DynSolValue::Uint(U256::from(state.articles.len()), 256).abi_encode()
    } else if selector == state.selector("getArticle") {
        state.get_article_calls.fetch_add(1, Ordering::SeqCst);
        let index = U256::from_be_slice(&data[4..36]).to::<usize>();
        // Mirrors the contract: reading past the end reverts
        let article = state.articles.get(index).ok_or("execution reverted")?;
        DynSolValue::Tuple(vec![
            DynSolValue::String(article.title.clone()),
            DynSolValue::String(article.content_hash.clone()),
            DynSolValue::Address(article.submitter),
            DynSolValue::Uint(U256::from(article.upvotes), 256),
            DynSolValue::Uint(U256::from(article.downvotes), 256),
            DynSolValue::Bool(article.verified),
        ])
        .abi_encode_params()
    } else {
        return Err("execution reverted: unknown selector".to_string());
    };

    Ok(json!(hex::encode_prefixed(encoded)))
}
