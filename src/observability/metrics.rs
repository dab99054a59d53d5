//! Metrics collection and exposition.
//!
//! # Metrics
//! - `config_reloads_total` (counter): reloads by outcome (applied, unchanged, failed)
//! - `config_changes_total` (counter): entity changes by kind and change type
//! - `config_entities` (gauge): entities in the published topology, by kind
//! - `config_reconcile_duration_seconds` (histogram): time to reconcile and publish

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

use crate::reconcile::ChangeSummary;

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_reload(outcome: &'static str) {
    metrics::counter!("config_reloads_total", "outcome" => outcome).increment(1);
}

pub fn record_changes(kind: &'static str, summary: &ChangeSummary) {
    for (change, count) in [
        ("added", summary.added),
        ("updated", summary.updated),
        ("removed", summary.removed),
    ] {
        if count > 0 {
            metrics::counter!("config_changes_total", "kind" => kind, "change" => change)
                .increment(count as u64);
        }
    }
}

pub fn record_entities(kind: &'static str, count: usize) {
    metrics::gauge!("config_entities", "kind" => kind).set(count as f64);
}

pub fn record_reconcile_duration(start: Instant) {
    metrics::histogram!("config_reconcile_duration_seconds").record(start.elapsed().as_secs_f64());
}
