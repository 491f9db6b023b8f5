//! Veil keeper entry point.

use anyhow::Result;
use clap::Parser;
use tracing::info;
use veil_keeper::{Keeper, KeeperConfig};

/// Price-triggered execution scheduler for the veil exchange.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (can also be set via VEIL_KEEPER_CONFIG).
    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Secrets come from the environment; .env is a development convenience.
    dotenv::dotenv().ok();

    let args = Args::parse();
    veil_telemetry::init_logging()?;

    info!("Starting veil keeper v{}", env!("CARGO_PKG_VERSION"));

    let config_path = args
        .config
        .or_else(|| std::env::var("VEIL_KEEPER_CONFIG").ok())
        .unwrap_or_else(|| "config/default.toml".to_string());
    info!(config_path = %config_path, "loading configuration");

    let config = KeeperConfig::from_file(&config_path)?;

    let keeper = Keeper::new(config)?;
    keeper.preflight().await?;
    keeper.run().await?;

    Ok(())
}
