//! `vaultd` entry point.
//!
//! Startup sequence:
//! 1. Load and validate [`Config`] from environment variables.
//! 2. Initialise the telemetry pipeline (tracing + optional OTLP).
//! 3. Decode the master key and open the vault under `DATA_DIR`.
//! 4. Build the Axum router and serve until Ctrl-C.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use vault::config::Config;
use vault::crypto::generate_key;
use vault::server::{self, router::RouterOptions, state::AppState};
use vault::{telemetry, Vault};

#[derive(Debug, Parser)]
#[command(name = "vaultd", version, about = "Encrypted file storage service")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP service (default).
    Serve,
    /// Print a fresh hex-encoded master key and exit.
    GenerateKey,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command.unwrap_or(Command::Serve) {
        Command::GenerateKey => {
            println!("{}", generate_key().to_hex().as_str());
            Ok(())
        }
        Command::Serve => serve().await,
    }
}

async fn serve() -> Result<()> {
    let cfg = Config::from_env().map_err(|e| {
        // Telemetry is not yet up; write to stderr directly.
        eprintln!("ERROR: configuration invalid: {e:#}");
        e
    })?;

    telemetry::init_telemetry(cfg.otel_exporter_otlp_endpoint.as_deref(), &cfg.log_level)?;
    info!(
        version = env!("CARGO_PKG_VERSION"),
        port = cfg.port,
        data_dir = %cfg.data_dir.display(),
        max_file_size = cfg.max_file_size,
        "vaultd starting"
    );

    let key = cfg.master_key()?;
    let vault = Vault::open(&cfg.data_dir, key, cfg.max_file_size)
        .await
        .context("failed to open storage")?;
    info!(objects = vault.count().await?, "storage ready");

    let opts = RouterOptions {
        max_file_size: cfg.max_file_size,
        client_url: cfg.client_url.clone(),
    };
    let router = server::router::build(AppState::new(vault), &opts);

    let addr: std::net::SocketAddr = ([0, 0, 0, 0], cfg.port).into();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(addr = %addr, "listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("vaultd stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
