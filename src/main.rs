#![recursion_limit = "256"]

use alloy::primitives::B256;
use anyhow::Result;
use bridge_relayer::api::Server;
use bridge_relayer::tokens::{parse_address, parse_amount};
use bridge_relayer::types::DepositRequest;
use bridge_relayer::{BridgeConfig, BridgeRelayer};
use clap::{Parser, Subcommand};
use std::str::FromStr;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "bridge-relayer")]
#[command(about = "Relays deposits from the origin chain to the destination rollup")]
struct Cli {
    /// Network config file
    #[arg(short, long, default_value = "configs/testnet.toml")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API and the finalization watcher
    Serve,
    /// Submit a deposit and wait for it to be mined
    Deposit {
        /// Token symbol, e.g. ETH or MNT
        #[arg(short, long)]
        token: String,
        /// Amount in whole tokens, e.g. 0.001
        #[arg(short, long)]
        amount: String,
        /// Recipient on the destination chain (defaults to the operator)
        #[arg(long)]
        to: Option<String>,
    },
    /// Wait for a transaction to be mined and show its tracked status
    Status {
        tx_hash: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = BridgeConfig::load(&cli.config)?;
    info!("Starting bridge relayer ({})", config.network.name);

    let relayer = Arc::new(BridgeRelayer::from_config(&config).await?);
    let cancel = CancellationToken::new();

    match cli.command {
        Commands::Serve => {
            let watcher = relayer.spawn_watcher(cancel.clone());
            let server = Server::new(relayer.clone(), config.api.bind_address.clone());

            tokio::select! {
                result = server.start() => result?,
                _ = tokio::signal::ctrl_c() => info!("Shutting down"),
            }
            cancel.cancel();
            if let Err(e) = watcher.await? {
                error!("Finalization watcher exited with error: {}", e);
            }
        }
        Commands::Deposit { token, amount, to } => {
            let request = DepositRequest {
                token,
                amount: parse_amount(&amount)?,
                recipient: to.as_deref().map(parse_address).transpose()?,
            };
            let (deposit, _watch) = relayer.deposit(request).await?;
            println!("✅ Deposit submitted: {:?} (gas limit {})", deposit.tx_hash, deposit.gas_limit);

            let receipt = relayer.resolve_status(deposit.tx_hash).await?;
            println!(
                "⛏️  Mined in block {}: {:?}, gas used {}",
                receipt.block_number, receipt.outcome, receipt.gas_used
            );
        }
        Commands::Status { tx_hash } => {
            let tx_hash = B256::from_str(&tx_hash)?;
            let receipt = relayer.resolve_status(tx_hash).await?;
            println!("{}", serde_json::to_string_pretty(&receipt)?);
        }
    }

    Ok(())
}
