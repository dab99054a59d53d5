//! OS signal handling.
//!
//! # Responsibilities
//! - Wait for SIGTERM/SIGINT and trigger shutdown
//! - Reload the configuration file on SIGHUP
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - SIGHUP feeds the same channel as the file watcher, so every reload goes
//!   through one loop

use std::path::PathBuf;

use tokio::sync::mpsc;

use crate::config::loader::load_config;
use crate::config::ProxyConfig;
use crate::lifecycle::Shutdown;

/// Wait for Ctrl+C (or SIGTERM on unix), then trigger `shutdown`.
pub async fn shutdown_on_signal(shutdown: Shutdown) {
    wait_for_termination().await;
    tracing::info!("Shutdown signal received");
    shutdown.trigger();
}

#[cfg(unix)]
async fn wait_for_termination() {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = match signal(SignalKind::terminate()) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "Failed to install SIGTERM handler");
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            }
            return;
        }
    };

    tokio::select! {
        res = tokio::signal::ctrl_c() => {
            if let Err(e) = res {
                tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            }
        }
        _ = terminate.recv() => {}
    }
}

#[cfg(not(unix))]
async fn wait_for_termination() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to install Ctrl+C handler");
    }
}

/// Reload `path` on every SIGHUP and send valid configs to `updates`.
#[cfg(unix)]
pub fn spawn_reload_on_hangup(
    path: PathBuf,
    updates: mpsc::UnboundedSender<ProxyConfig>,
) -> std::io::Result<tokio::task::JoinHandle<()>> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut hangup = signal(SignalKind::hangup())?;
    Ok(tokio::spawn(async move {
        while hangup.recv().await.is_some() {
            tracing::info!(path = ?path, "SIGHUP received, reloading configuration");
            match load_config(&path) {
                Ok(config) => {
                    if updates.send(config).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    tracing::error!("Failed to reload config: {}. Keeping current configuration.", e);
                }
            }
        }
    }))
}

#[cfg(not(unix))]
pub fn spawn_reload_on_hangup(
    _path: PathBuf,
    _updates: mpsc::UnboundedSender<ProxyConfig>,
) -> std::io::Result<tokio::task::JoinHandle<()>> {
    Ok(tokio::spawn(async {}))
}
