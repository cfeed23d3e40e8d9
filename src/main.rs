//! Origin health monitor.
//!
//! # Architecture Overview
//!
//! ```text
//!   config.toml
//!       │
//!       ▼
//!   ┌──────────┐    ┌────────────┐    ┌─────────────────────┐
//!   │  config  │───▶│ translator │───▶│   ObjectStore       │◀──── live routing path
//!   └──────────┘    └────────────┘    │ (tags per origin)   │      (reads state=)
//!                                     └─────────▲───────────┘
//!                                               │ update_tags
//!                                     ┌─────────┴───────────┐
//!                                     │ HealthCheckMonitor  │───▶ probes ───▶ origins
//!                                     │   (one per group)   │
//!                                     └─────────────────────┘
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;

use origin_health::config::load_config;
use origin_health::lifecycle::signals::shutdown_signal;
use origin_health::lifecycle::HealthSystem;
use origin_health::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "origin-health")]
#[command(about = "Active health checking for reverse proxy origins", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "origin-health.toml")]
    config: PathBuf,

    /// Validate the configuration and exit.
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = load_config(&cli.config)?;
    logging::init(&config.observability);

    tracing::info!(
        config = %cli.config.display(),
        applications = config.applications.len(),
        "Configuration loaded"
    );

    if cli.check {
        println!("configuration OK");
        return Ok(());
    }

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr);
    }

    let system = HealthSystem::from_config(&config)?;
    system.start_all().await?;

    shutdown_signal().await;

    tracing::info!("Stopping health checks");
    system.stop_all().await;

    tracing::info!("Shutdown complete");
    Ok(())
}
