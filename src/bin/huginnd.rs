//! huginnd: video metadata daemon.
//!
//! Serves cached, rate-limited YouTube metadata over HTTP with a static
//! snapshot fallback.

use std::net::SocketAddr;

use clap::Parser;
use tokio::signal;
use tracing::{error, info};

use huginn::server::{self, Config, Secrets};

/// huginnd: cached video metadata gateway.
#[derive(Parser)]
#[command(name = "huginnd")]
#[command(version = huginn::PKG_VERSION)]
#[command(about = "Video metadata gateway daemon")]
struct Args {
    /// Path to configuration file.
    #[arg(short, long, env = "HUGINN_CONFIG")]
    config: Option<std::path::PathBuf>,

    /// Override the bind address from the config file.
    #[arg(short, long)]
    address: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    // Load configuration
    let mut config = Config::load(args.config.as_deref())?;
    config.apply_env_overrides()?;
    if let Some(address) = args.address {
        config.server.address = address;
    }
    let secrets = Secrets::load()?;

    let app = server::app(&config, &secrets)?;

    // Parse address
    let addr: SocketAddr = config.server.address.parse().map_err(|e| {
        huginn::HuginnError::Configuration(format!("Invalid address: {e}"))
    })?;

    info!(version = huginn::version_string(), %addr, "huginnd starting");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("huginnd stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = signal::ctrl_c().await {
        error!(error = %err, "failed to install shutdown signal handler");
    }
    info!("shutdown signal received");
}
