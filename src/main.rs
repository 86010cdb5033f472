//! ZipTales article bridge.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request          ┌──────────────────────────────────────────────┐
//!     ────────────────────────┼─▶ http::server ─▶ http::handlers             │
//!                             │                        │                     │
//!                             │                        ▼                     │
//!                             │            blockchain::contract              │
//!                             │          (submit / vote / read)              │
//!                             │             │                 │              │
//!                             │             ▼                 ▼              │
//!                             │   blockchain::transaction  eth_call          │
//!                             │   (nonce, sign, send)         │              │
//!                             │             │                 │              │
//!                             │             ▼                 ▼              │
//!                             │          blockchain::client (JSON-RPC) ──────┼──▶ Node
//!                             └──────────────────────────────────────────────┘
//! ```
//!
//! Configuration comes from an optional TOML file (`--config` or
//! `BRIDGE_CONFIG`) overlaid with `WEB3_PROVIDER`, `CONTRACT_ADDRESS`,
//! `CONTRACT_ABI_PATH` and `BRIDGE_BIND_ADDRESS`. The signing key is read
//! from `PRIVATE_KEY`. A `.env` file in the working directory is honored.

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;

use ziptales_bridge::blockchain::{ArticleContract, Wallet};
use ziptales_bridge::config::load_config;
use ziptales_bridge::http::HttpServer;
use ziptales_bridge::lifecycle::Shutdown;
use ziptales_bridge::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "ziptales-bridge")]
#[command(about = "HTTP bridge to the ZipTales article contract", long_about = None)]
struct Cli {
    /// Path to a TOML config file (falls back to BRIDGE_CONFIG).
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let config_path = cli
        .config
        .or_else(|| std::env::var_os("BRIDGE_CONFIG").map(PathBuf::from));
    let config = load_config(config_path.as_deref())?;

    logging::init_logging(&config.observability);
    tracing::info!("ziptales-bridge v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        bind_address = %config.listener.bind_address,
        rpc_url = %config.chain.rpc_url,
        contract = %config.chain.contract_address,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let shutdown = Shutdown::new();

    let wallet = Wallet::from_env()?;
    let contract = ArticleContract::connect(&config.chain, wallet, shutdown.subscribe()).await?;

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    shutdown.listen_for_signals();

    let server = HttpServer::new(&config, Arc::new(contract));
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
