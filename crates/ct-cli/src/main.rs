//! Quote inspection CLI.
//!
//! Reads the bonding-curve oracle over JSON-RPC and prints the per-unit
//! price schedule for a prospective trade. Read-only: no wallet is
//! involved and nothing is signed or sent.

use std::sync::Arc;

use alloy::primitives::Address;
use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use ct_chain::{RpcChainReader, TokenReader};
use ct_core::TradeAction;
use ct_trade::{QuoteEngine, TradeConfig};

/// Creator token quote inspector
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (can also be set via CT_CONFIG env var)
    #[arg(short, long)]
    config: Option<String>,

    /// Creator token contract address
    #[arg(short, long)]
    token: String,

    /// Trade side to quote
    #[arg(short, long, value_enum, default_value = "buy")]
    action: CliAction,

    /// Number of tokens to quote
    #[arg(short, long, default_value_t = 1)]
    quantity: u64,

    /// Override the RPC endpoint from the configured settlement chain
    #[arg(long)]
    rpc_url: Option<String>,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum CliAction {
    Buy,
    Sell,
}

impl From<CliAction> for TradeAction {
    fn from(action: CliAction) -> Self {
        match action {
            CliAction::Buy => TradeAction::Buy,
            CliAction::Sell => TradeAction::Sell,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    ct_telemetry::init_logging()?;

    // Config path precedence: CLI arg > CT_CONFIG env var > default
    let config_path = args
        .config
        .or_else(|| std::env::var("CT_CONFIG").ok())
        .unwrap_or_else(|| "config/default.toml".to_string());
    info!(config_path = %config_path, "Loading configuration");
    let config = TradeConfig::from_file(&config_path)?;

    let token: Address = args
        .token
        .parse()
        .with_context(|| format!("invalid token address: {}", args.token))?;

    let rpc_url = args
        .rpc_url
        .unwrap_or_else(|| config.settlement_chain.rpc_url.clone());
    info!(
        rpc_url = %rpc_url,
        chain = %config.settlement_chain.name,
        "Connecting to settlement network"
    );

    let reader = Arc::new(RpcChainReader::new(rpc_url)?);
    let engine = QuoteEngine::new(TokenReader::new(reader), config);

    let action: TradeAction = args.action.into();
    let quote = engine.get_quote(token, action, args.quantity).await?;

    println!("{action} quote for {} token(s) at {token}", quote.quantity);
    for (i, price) in quote.unit_prices.iter().enumerate() {
        println!("  unit {:>3}: {price} USDC", i + 1);
    }
    println!("  total:    {} USDC", quote.total);

    Ok(())
}
