//! Agriprice dashboard binary

use std::path::PathBuf;

use agriprice_service::{start_server, AppState, PricePredictor, ServiceConfig};
use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser, Debug)]
#[command(name = "agriprice-dashboard")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Vegetable price prediction dashboard", long_about = None)]
struct Cli {
    /// TOML configuration file (defaults to config/agriprice.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen address, overrides the config file
    #[arg(long)]
    host: Option<String>,

    /// Listen port, overrides the config file
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging();

    info!("Starting agriprice dashboard v{}", agriprice_service::VERSION);

    let mut config =
        ServiceConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(host) = cli.host {
        config.server.host = host;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    info!(
        "Models from {}, data in {}",
        config.paths.model_dir.display(),
        config.paths.data_dir.display()
    );
    let predictor = PricePredictor::from_config(&config)
        .context("Failed to load market models and encoders")?;
    info!("Serving {} markets", config.markets.len());

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState::new(predictor, config).context("Failed to prepare market forms")?;
    start_server(state, &addr).await
}

fn init_logging() {
    let env = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(env)),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
