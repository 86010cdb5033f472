//! Fetch one block and print it as JSON. Connectivity check for the RPC provider.

use alloy::eips::BlockNumberOrTag;
use alloy::providers::{Provider, ProviderBuilder};
use clap::Parser;

/// Environment variable holding the hosted-provider API key.
const API_KEY_ENV_VAR: &str = "ALCHEMY_API_KEY";

#[derive(Parser)]
#[command(name = "block-fetch")]
#[command(about = "Fetch a block from the configured chain and print it", long_about = None)]
struct Cli {
    /// Block number to fetch.
    #[arg(short, long, default_value_t = 123456)]
    block: u64,

    /// Full RPC URL. Overrides --network and the API key.
    #[arg(short, long)]
    rpc_url: Option<String>,

    /// Hosted network name used with the API key.
    #[arg(short, long, default_value = "eth-holesky")]
    network: String,

    /// Include full transaction objects.
    #[arg(long)]
    full: bool,
}

fn hosted_url(network: &str, api_key: &str) -> String {
    format!("https://{}.g.alchemy.com/v2/{}", network, api_key)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let rpc_url = match cli.rpc_url {
        Some(url) => url,
        None => {
            let api_key = std::env::var(API_KEY_ENV_VAR).map_err(|_| {
                format!("Pass --rpc-url or set {} in the environment", API_KEY_ENV_VAR)
            })?;
            hosted_url(&cli.network, &api_key)
        }
    };

    let provider = ProviderBuilder::new()
        .disable_recommended_fillers()
        .connect_http(rpc_url.parse()?);

    let request = provider.get_block_by_number(BlockNumberOrTag::Number(cli.block));
    let block = if cli.full {
        request.full().await?
    } else {
        request.await?
    };

    match block {
        Some(block) => println!("{}", serde_json::to_string_pretty(&block)?),
        None => {
            eprintln!("Block {} not found", cli.block);
            std::process::exit(1);
        }
    }

    Ok(())
}
