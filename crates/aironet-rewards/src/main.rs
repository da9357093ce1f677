use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use aironet_common::config::CoreConfig;
use aironet_ledger::HttpLedgerClient;
use aironet_rewards::RewardsService;
use aironet_store::MemoryStore;

#[derive(Debug, Parser)]
#[command(name = "aironet-rewards", about = "AiroNet reward distribution node")]
struct Args {
    /// Path to a JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log filter, e.g. "info" or "aironet_rewards=debug"
    #[arg(long)]
    log: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config =
        CoreConfig::load(args.config.as_deref()).context("Failed to load configuration")?;
    let filter = args.log.clone().unwrap_or_else(|| config.log_level.clone());
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&filter).unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting AiroNet rewards node...");

    let store = Arc::new(MemoryStore::open(&config.store)?);
    let ledger = Arc::new(HttpLedgerClient::new(&config.ledger));
    let mut service = RewardsService::new(store, ledger, config);

    match service.start().await {
        Ok(handle) => {
            info!("Rewards node started successfully");
            tokio::signal::ctrl_c().await?;
            info!("Shutting down rewards node...");
            handle.stop().await;
        }
        Err(e) => {
            error!("Failed to start rewards node: {}", e);
            std::process::exit(1);
        }
    }

    Ok(())
}
