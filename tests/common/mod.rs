//! Shared builders for integration tests.

#![allow(dead_code)]

use proxy_reconcile::config::{ClusterConfig, DestinationConfig, RouteConfig, Snapshot};
use proxy_reconcile::ProxyConfig;

/// Destination snapshot from `(name, address)` pairs.
pub fn destinations(entries: &[(&str, &str)]) -> Snapshot<DestinationConfig> {
    Snapshot::from_entries(
        entries
            .iter()
            .map(|(name, address)| (*name, DestinationConfig::new(*address))),
    )
    .unwrap()
}

pub fn cluster(entries: &[(&str, &str)]) -> ClusterConfig {
    ClusterConfig::new(destinations(entries))
}

/// Configuration with the given clusters and one route per cluster, named
/// after the cluster.
pub fn config(clusters: Vec<(&str, ClusterConfig)>) -> ProxyConfig {
    let routes = Snapshot::from_entries(
        clusters
            .iter()
            .map(|(name, _)| (*name, RouteConfig::to_cluster(*name))),
    )
    .unwrap();

    ProxyConfig {
        clusters: Snapshot::from_entries(clusters).unwrap(),
        routes,
        ..ProxyConfig::default()
    }
}
