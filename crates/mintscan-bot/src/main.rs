//! mintscan - token feed ingester entry point.

use anyhow::Result;
use clap::Parser;
use std::path::Path;
use tracing::{info, warn};

/// Records newly launched tokens from the live feed.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (can also be set via MINTSCAN_CONFIG env var)
    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize TLS crypto provider (must be before any WS connections)
    mintscan_ws::init_crypto();

    let args = Args::parse();

    // A missing .env file is not an error
    let dotenv = dotenvy::dotenv();

    // Determine config path: CLI arg > MINTSCAN_CONFIG env var > default
    let config_path = args
        .config
        .or_else(|| std::env::var("MINTSCAN_CONFIG").ok())
        .unwrap_or_else(|| "config/default.toml".to_string());

    let config_found = Path::new(&config_path).exists();
    let config = if config_found {
        mintscan_bot::AppConfig::from_file(&config_path)?
    } else {
        mintscan_bot::AppConfig::default()
    };

    mintscan_telemetry::init_logging(&config.telemetry.log_level)?;

    if let Ok(path) = dotenv {
        info!(path = %path.display(), "Loaded environment file");
    }
    if config_found {
        info!(config_path = %config_path, "Configuration loaded");
    } else {
        warn!(config_path = %config_path, "Config file not found, using defaults");
    }

    let credentials = mintscan_bot::StoreCredentials::from_env()?;
    let app = mintscan_bot::Application::new(config, &credentials)?;
    app.run().await?;

    Ok(())
}
