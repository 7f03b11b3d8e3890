//! parley relay daemon
//!
//! Accepts TCP connections and relays chat lines between members. The
//! first member to join becomes the coordinator.
//!
//! # Usage
//!
//! ```bash
//! # Listen on the default address (127.0.0.1:7878)
//! parleyd
//!
//! # Listen on all interfaces with a config file
//! parleyd --listen 0.0.0.0:7878 --config /etc/parley/relay.toml
//!
//! # Override the listen address through the environment
//! PARLEY_ADDR=0.0.0.0:9000 parleyd
//!
//! # Enable debug logging
//! RUST_LOG=parleyd=debug parleyd
//! ```
//!
//! # Signal Handling
//!
//! - SIGTERM/SIGINT: Graceful shutdown, every member's session is ended

use std::env;
use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use parleyd::config::RelayConfig;
use parleyd::server::RelayServer;

/// Environment variable overriding the listen address.
const ADDR_ENV: &str = "PARLEY_ADDR";

/// parley relay - group chat with an elected coordinator
#[derive(Parser, Debug)]
#[command(name = "parleyd", version, about)]
struct Args {
    /// Address to listen on (overrides config file and PARLEY_ADDR)
    #[arg(short, long)]
    listen: Option<String>,

    /// Path to a TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Maximum number of connected members
    #[arg(long)]
    max_members: Option<usize>,

    /// End sessions silent for this many seconds
    #[arg(long)]
    idle_timeout_secs: Option<u64>,
}

impl Args {
    /// Builds the effective config: defaults, then file, then env, then flags.
    fn into_config(self) -> Result<RelayConfig> {
        let mut config = match &self.config {
            Some(path) => RelayConfig::load(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?,
            None => RelayConfig::default(),
        };

        if let Ok(addr) = env::var(ADDR_ENV) {
            config.listen_addr = addr;
        }
        if let Some(listen) = self.listen {
            config.listen_addr = listen;
        }
        if let Some(max_members) = self.max_members {
            config.max_members = max_members;
        }
        if let Some(idle) = self.idle_timeout_secs {
            config.idle_timeout_secs = Some(idle);
        }

        config.validate().context("Invalid configuration")?;
        Ok(config)
    }
}

fn main() -> Result<()> {
    let config = Args::parse().into_config()?;
    run_relay(config)
}

#[tokio::main]
async fn run_relay(config: RelayConfig) -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("parleyd=info".parse()?)
                .add_directive("parley_core=info".parse()?)
                .add_directive("parley_protocol=info".parse()?),
        )
        .init();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        pid = process::id(),
        max_members = config.max_members,
        "parley relay starting"
    );

    let cancel_token = CancellationToken::new();

    let shutdown_token = cancel_token.clone();
    tokio::spawn(async move {
        if let Err(e) = wait_for_shutdown_signal().await {
            error!(error = %e, "Error waiting for shutdown signal");
        }
        info!("Shutdown signal received");
        shutdown_token.cancel();
    });

    let server = RelayServer::from_config(&config, cancel_token);

    info!(addr = %server.listen_addr(), "Starting server");

    if let Err(e) = server.run().await {
        error!(error = %e, "Server error");
        return Err(e.into());
    }

    info!("parley relay stopped");
    Ok(())
}

async fn wait_for_shutdown_signal() -> Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm = signal(SignalKind::terminate())?;
        let mut sigint = signal(SignalKind::interrupt())?;

        tokio::select! {
            _ = sigterm.recv() => {
                info!("Received SIGTERM");
            }
            _ = sigint.recv() => {
                info!("Received SIGINT");
            }
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
        info!("Received Ctrl+C");
    }

    Ok(())
}
