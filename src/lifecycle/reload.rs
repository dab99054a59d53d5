//! Reload loop.
//!
//! Applies every configuration received on the update channel to the shared
//! [`ProxyState`] until shutdown or until all senders are gone.

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};

use crate::config::ProxyConfig;
use crate::runtime::ProxyState;

pub async fn run_reload_loop(
    state: Arc<ProxyState>,
    mut updates: mpsc::UnboundedReceiver<ProxyConfig>,
    mut shutdown: broadcast::Receiver<()>,
) {
    tracing::info!(generation = state.load().generation(), "Reload loop starting");

    loop {
        tokio::select! {
            update = updates.recv() => {
                let Some(config) = update else {
                    tracing::info!("Config update channel closed, exiting reload loop");
                    break;
                };
                match state.apply(config) {
                    Ok(report) if report.has_changes() => {
                        tracing::info!(generation = report.generation, "Reload applied");
                    }
                    Ok(report) => {
                        tracing::debug!(generation = report.generation, "Reload had no changes");
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Reload rejected. Keeping current configuration.");
                    }
                }
            }
            _ = shutdown.recv() => {
                tracing::info!("Reload loop received shutdown signal, exiting loop");
                break;
            }
        }
    }
}
