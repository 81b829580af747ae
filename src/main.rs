//! COVID-19 dashboard server.
//!
//! # Architecture Overview
//!
//! ```text
//!     Browser                ┌──────────────────────────────────────────────┐
//!     ───────────────────────┼─▶ http (router, request id, trace, timeout) │
//!                            │        │                                     │
//!                            │        ▼                                     │
//!                            │   drivers (country / state / county)         │
//!                            │        │                 │                   │
//!                            │        ▼                 ▼                   │
//!                            │   cache (TTL tables) ─▶ upstream ───────────┼──▶ public CSV / JSON
//!                            │        │                                     │
//!                            │        ▼                                     │
//!                            │   transform → chart (Vega-Lite JSON)         │
//!     ◀──────────────────────┼────────┘                                     │
//!                            │                                              │
//!                            │   config · observability · lifecycle · admin │
//!                            └──────────────────────────────────────────────┘
//! ```

use std::path::{Path, PathBuf};

use clap::Parser;
use tokio::net::TcpListener;

use covid_dashboard::config::resolve_config;
use covid_dashboard::lifecycle::{spawn_signal_listener, Shutdown};
use covid_dashboard::observability::{logging, metrics};
use covid_dashboard::DashboardServer;

#[derive(Parser)]
#[command(name = "covid-dashboard", version)]
#[command(about = "COVID-19 statistics dashboard", long_about = None)]
struct Args {
    /// TOML configuration file; built-in defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override listener.bind_address.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = resolve_config(args.config.as_deref(), args.bind)?;

    logging::init_logging(&config.observability);

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "covid-dashboard starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        cache_backend = ?config.cache.backend,
        ttl_secs = config.cache.ttl_secs,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if !Path::new(&config.sources.data_dir).is_dir() {
        tracing::warn!(
            data_dir = %config.sources.data_dir,
            "Population directory missing; state charts will fail until it holds pop-est2019.csv and state-abbre.csv"
        );
    }

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let server = DashboardServer::connect(config).await?;

    let shutdown = Shutdown::new();
    let signals = spawn_signal_listener(shutdown.clone());

    server.run(listener, shutdown.subscribe()).await?;
    signals.abort();

    tracing::info!("Shutdown complete");
    Ok(())
}
