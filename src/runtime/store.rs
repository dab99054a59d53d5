//! Live topology and its atomic publication.
//!
//! # Responsibilities
//! - Hold the published topology (clusters, destinations, routes)
//! - Reconcile a new configuration against it and publish the result
//! - Release removed runtime state once the new topology is visible
//!
//! # Design Decisions
//! - The next topology is fully built before a single `ArcSwap::store`,
//!   so readers see either the old or the new topology, never a mix
//! - Readers holding an older `Arc<Topology>` keep it valid until dropped
//! - Reloads are serialized; two reloads never diff against the same base
//! - A failed reload publishes nothing and releases nothing

use std::sync::{Arc, Mutex};
use std::time::Instant;

use arc_swap::ArcSwap;
use serde::Serialize;

use crate::config::{ClusterConfig, ConfigKey, ProxyConfig, RouteConfig, Snapshot};
use crate::observability::metrics;
use crate::reconcile::{apply, diff, ApplyError, ChangeSummary, Reconcile, RuntimeIndex};
use crate::runtime::cluster::{ClusterReconciler, ClusterState};
use crate::runtime::route::{RouteReconciler, RouteState};

/// One published generation of runtime state.
#[derive(Debug, Default)]
pub struct Topology {
    generation: u64,
    config: ProxyConfig,
    clusters: RuntimeIndex<ClusterState>,
    routes: RuntimeIndex<RouteState>,
}

impl Topology {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Configuration in service. Unchanged entities are the instances from
    /// the generation that introduced them.
    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }

    pub fn cluster(&self, name: &str) -> Option<&Arc<ClusterState>> {
        self.clusters.get(&ConfigKey::new(name))
    }

    pub fn clusters(&self) -> impl Iterator<Item = &Arc<ClusterState>> {
        self.clusters.values()
    }

    pub fn route(&self, name: &str) -> Option<&Arc<RouteState>> {
        self.routes.get(&ConfigKey::new(name))
    }

    pub fn routes(&self) -> impl Iterator<Item = &Arc<RouteState>> {
        self.routes.values()
    }

    pub fn destination_count(&self) -> usize {
        self.clusters.values().map(|c| c.destination_count()).sum()
    }
}

/// Outcome of one reload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReloadReport {
    pub generation: u64,
    pub clusters: ChangeSummary,
    pub destinations: ChangeSummary,
    pub routes: ChangeSummary,
}

impl ReloadReport {
    pub fn has_changes(&self) -> bool {
        self.clusters.has_changes() || self.destinations.has_changes() || self.routes.has_changes()
    }
}

/// Shared handle to the live topology.
#[derive(Debug)]
pub struct ProxyState {
    current: ArcSwap<Topology>,
    reload_lock: Mutex<()>,
}

impl Default for ProxyState {
    fn default() -> Self {
        Self::new()
    }
}

impl ProxyState {
    /// Start with an empty topology (generation 0).
    pub fn new() -> Self {
        Self {
            current: ArcSwap::from_pointee(Topology::default()),
            reload_lock: Mutex::new(()),
        }
    }

    /// Start from an initial configuration.
    pub fn from_config(config: ProxyConfig) -> Result<Self, ApplyError> {
        let state = Self::new();
        state.apply(config)?;
        Ok(state)
    }

    /// The currently published topology.
    pub fn load(&self) -> Arc<Topology> {
        self.current.load_full()
    }

    /// Reconcile `config` against the live topology and publish the result.
    pub fn apply(&self, config: ProxyConfig) -> Result<ReloadReport, ApplyError> {
        let _guard = self
            .reload_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let start = Instant::now();

        let current = self.current.load_full();
        let generation = current.generation + 1;

        let cluster_changes = diff(&current.config.clusters, &config.clusters);
        let route_changes = diff(&current.config.routes, &config.routes);

        let cluster_reconciler = ClusterReconciler::new(generation);
        let route_reconciler = RouteReconciler::new(generation);

        let applied_clusters = apply(&current.clusters, &cluster_changes, &cluster_reconciler)
            .inspect_err(|e| {
                tracing::error!(generation, error = %e, "Cluster reconciliation failed");
                metrics::record_reload("failed");
            })?;
        let applied_routes = apply(&current.routes, &route_changes, &route_reconciler)
            .inspect_err(|e| {
                tracing::error!(generation, error = %e, "Route reconciliation failed");
                metrics::record_reload("failed");
            })?;

        let mut destinations = cluster_reconciler.destination_changes();
        for entry in &cluster_changes.unchanged {
            destinations.unchanged += entry.config.destinations.len();
        }
        for entry in &cluster_changes.added {
            destinations.added += entry.config.destinations.len();
        }
        for entry in &cluster_changes.removed {
            destinations.removed += entry.config.destinations.len();
        }

        let next = Topology {
            generation,
            config: ProxyConfig {
                clusters: retained_clusters(&applied_clusters.index),
                routes: retained_routes(&applied_routes.index),
                observability: config.observability,
                reload: config.reload,
            },
            clusters: applied_clusters.index,
            routes: applied_routes.index,
        };
        let destination_total = next.destination_count();
        let cluster_total = next.clusters.len();
        let route_total = next.routes.len();

        self.current.store(Arc::new(next));

        // Only now is it safe to take removed state out of service.
        for (key, cluster) in &applied_clusters.removed {
            cluster_reconciler.release(key, cluster);
        }
        for (key, route) in &applied_routes.removed {
            route_reconciler.release(key, route);
        }
        let retired = cluster_reconciler.retire_pending();

        let report = ReloadReport {
            generation,
            clusters: cluster_changes.summary(),
            destinations,
            routes: route_changes.summary(),
        };

        metrics::record_reload(if report.has_changes() { "applied" } else { "unchanged" });
        metrics::record_changes("cluster", &report.clusters);
        metrics::record_changes("destination", &report.destinations);
        metrics::record_changes("route", &report.routes);
        metrics::record_entities("cluster", cluster_total);
        metrics::record_entities("destination", destination_total);
        metrics::record_entities("route", route_total);
        metrics::record_reconcile_duration(start);

        tracing::info!(
            generation,
            clusters_added = report.clusters.added,
            clusters_updated = report.clusters.updated,
            clusters_removed = report.clusters.removed,
            destinations_added = report.destinations.added,
            destinations_updated = report.destinations.updated,
            destinations_removed = report.destinations.removed,
            routes_added = report.routes.added,
            routes_updated = report.routes.updated,
            routes_removed = report.routes.removed,
            retired_destinations = retired,
            elapsed_us = start.elapsed().as_micros() as u64,
            "Configuration reconciled"
        );

        Ok(report)
    }
}

fn retained_clusters(index: &RuntimeIndex<ClusterState>) -> Snapshot<ClusterConfig> {
    let mut builder = Snapshot::builder();
    for (key, state) in index {
        // Keys come from a HashMap keyed the same way, so they cannot collide.
        let _ = builder.insert_shared(key.clone(), state.config().clone());
    }
    builder.build()
}

fn retained_routes(index: &RuntimeIndex<RouteState>) -> Snapshot<RouteConfig> {
    let mut builder = Snapshot::builder();
    for (key, state) in index {
        let _ = builder.insert_shared(key.clone(), state.config().clone());
    }
    builder.build()
}
