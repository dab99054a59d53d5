//! Configuration reconciler.
//!
//! Loads a proxy configuration, builds the runtime topology, then watches the
//! file and reconciles every valid change into the live topology.
//!
//! # Architecture Overview
//!
//! ```text
//!   proxy.toml ──▶ loader + validation ──▶ ProxyConfig (generation N+1)
//!        ▲                                       │
//!        │ notify / SIGHUP                       ▼
//!   ┌─────────┐                    ┌──────────────────────────┐
//!   │ watcher │                    │ diff (generation N, N+1) │
//!   └─────────┘                    └────────────┬─────────────┘
//!                                               ▼
//!                           ┌──────────────────────────────────────┐
//!                           │ apply: keep unchanged runtime state, │
//!                           │ create added, replace updated        │
//!                           └────────────────┬─────────────────────┘
//!                                            ▼
//!                           ArcSwap<Topology>::store (one atomic swap)
//!                                            ▼
//!                           release removed clusters / destinations
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::sync::mpsc;

use proxy_reconcile::config::loader::load_config;
use proxy_reconcile::config::watcher::ConfigWatcher;
use proxy_reconcile::lifecycle::{run_reload_loop, signals, Shutdown};
use proxy_reconcile::observability::{logging, metrics};
use proxy_reconcile::ProxyState;

#[derive(Parser)]
#[command(name = "reconciler")]
#[command(about = "Reconcile proxy configuration reloads into a live topology", long_about = None)]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "proxy.toml")]
    config: PathBuf,

    /// Do not watch the configuration file (SIGHUP still reloads).
    #[arg(long)]
    no_watch: bool,

    /// Override the configured log level.
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = load_config(&args.config)?;

    let level = args
        .log_level
        .clone()
        .unwrap_or_else(|| config.observability.log_level.clone());
    logging::init_logging(&level);

    tracing::info!("reconciler v{} starting", env!("CARGO_PKG_VERSION"));

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let watch = config.reload.watch && !args.no_watch;
    let poll_interval = Duration::from_secs(config.reload.poll_interval_secs.max(1));

    let state = Arc::new(ProxyState::from_config(config)?);
    let topology = state.load();
    tracing::info!(
        path = ?args.config,
        clusters = topology.clusters().count(),
        destinations = topology.destination_count(),
        routes = topology.routes().count(),
        "Configuration loaded"
    );

    let (update_tx, update_rx) = mpsc::unbounded_channel();

    let _watcher = if watch {
        Some(ConfigWatcher::with_sender(&args.config, poll_interval, update_tx.clone()).run()?)
    } else {
        tracing::info!("Config file watching disabled");
        None
    };
    let _hangup = signals::spawn_reload_on_hangup(args.config.clone(), update_tx.clone())?;

    let shutdown = Shutdown::new();
    let reload_shutdown = shutdown.subscribe();
    tokio::spawn(signals::shutdown_on_signal(shutdown));

    run_reload_loop(state.clone(), update_rx, reload_shutdown).await;
    drop(update_tx);

    tracing::info!(generation = state.load().generation(), "Shutdown complete");
    Ok(())
}
