//! Stowage Gateway
//!
//! Serves the stowage bookkeeping API over HTTP/JSON. All state is in memory
//! and is lost on restart.
//!
//! Usage:
//!   stowage-gateway [--config stowage.toml] [--bind-addr 0.0.0.0:8000]

use anyhow::Context;
use clap::Parser;
use stowage::server::{self, AppState};
use stowage::{Stowage, StowageConfig};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "stowage-gateway")]
#[command(version)]
#[command(about = "Cargo stowage bookkeeping service")]
struct Args {
    /// Path to a TOML configuration file
    #[arg(long, env = "STOWAGE_CONFIG")]
    config: Option<String>,

    /// Address to listen on (overrides the config file)
    #[arg(long, env = "STOWAGE_BIND_ADDR")]
    bind_addr: Option<String>,

    /// tracing filter directives, e.g. "stowage=debug" (RUST_LOG wins if set)
    #[arg(long, env = "STOWAGE_LOG")]
    log_filter: Option<String>,

    /// Maximum request body size in bytes
    #[arg(long, env = "STOWAGE_MAX_UPLOAD_BYTES")]
    max_upload_bytes: Option<usize>,

    /// Disable coloured log output
    #[arg(long)]
    no_ansi: bool,
}

impl Args {
    /// CLI/env > config file > defaults.
    fn resolve_config(&self) -> anyhow::Result<StowageConfig> {
        let mut config = match &self.config {
            Some(path) => StowageConfig::load(path)
                .with_context(|| format!("loading config from {path}"))?,
            None => StowageConfig::default(),
        };

        if let Some(bind_addr) = &self.bind_addr {
            config.bind_addr = bind_addr.clone();
        }
        if let Some(filter) = &self.log_filter {
            config.log_filter = filter.clone();
        }
        if let Some(max) = self.max_upload_bytes {
            config.max_upload_bytes = max;
        }
        Ok(config)
    }
}

fn init_tracing(filter: &str, ansi: bool) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_ansi(ansi)
        .init();
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("failed to listen for ctrl-c: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::warn!("failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = args.resolve_config()?;
    init_tracing(&config.log_filter, !args.no_ansi);

    if let Some(path) = &args.config {
        info!("Using configuration: {}", path);
    }
    info!("Stowage gateway starting on {}", config.bind_addr);

    let state = AppState::new(Stowage::new());
    server::serve(&config, state, shutdown_signal()).await?;
    Ok(())
}
