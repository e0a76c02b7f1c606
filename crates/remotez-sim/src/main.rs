//! RemoteZ Simulator
//!
//! Simulates a RemoteZ universal remote on the network channel.
//!
//! # Usage
//!
//! ```bash
//! ./remotez-sim --bind 127.0.0.1:5540
//! ```
//!
//! With config file:
//! ```bash
//! ./remotez-sim --config config/remotez-sim.toml
//! ```

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use remotez_sim::{SimConfig, SimServer, SimulatedRemote};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "remotez-sim")]
#[command(about = "Simulated RemoteZ remote for protocol development")]
struct Args {
    /// Configuration file path (TOML format)
    #[arg(short, long)]
    config: Option<String>,

    /// Listen address, overrides the config file
    #[arg(short, long)]
    bind: Option<String>,

    /// Device name, overrides the config file
    #[arg(long)]
    name: Option<String>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let filter = if args.verbose {
        "remotez_sim=debug,remotez=debug"
    } else {
        "remotez_sim=info"
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut config = match &args.config {
        Some(path) => {
            info!("Loading config from: {}", path);
            SimConfig::load(path).with_context(|| format!("Failed to load config {}", path))?
        }
        None => SimConfig::default(),
    };
    if let Some(bind) = args.bind {
        config.bind = bind;
    }
    if let Some(name) = args.name {
        config.name = name;
    }

    info!(
        name = %config.name,
        serial = %config.identity.serial,
        flash_size = config.flash_size,
        "Starting RemoteZ simulator"
    );

    let bind = config.bind.clone();
    let remote = Arc::new(SimulatedRemote::new(config));
    let server = SimServer::bind(&bind, remote)
        .await
        .with_context(|| format!("Failed to bind {}", bind))?;

    info!("Press Ctrl+C to stop");
    tokio::select! {
        result = server.run() => result.context("Accept loop failed")?,
        _ = tokio::signal::ctrl_c() => info!("Shutting down"),
    }

    Ok(())
}
