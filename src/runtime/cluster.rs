//! Cluster runtime state and its reconcilers.
//!
//! # Responsibilities
//! - Own the destination states of a cluster
//! - On cluster update, diff the destinations one level down so only the
//!   destinations that changed get new state
//!
//! # Design Decisions
//! - An unchanged cluster keeps its `ClusterState` object entirely
//! - An updated cluster gets a new `ClusterState`, but unchanged destinations
//!   inside it carry over by reference, along with their old config instances
//! - Destinations dropped by an update are collected and retired only after
//!   the new topology is published

use std::cell::RefCell;
use std::sync::Arc;

use crate::config::{ClusterConfig, ConfigKey, DestinationConfig, HealthCheckConfig, Snapshot};
use crate::reconcile::{
    apply, diff, Applied, ApplyError, ChangeSummary, Reconcile, RuntimeIndex, Update,
};
use crate::runtime::destination::DestinationState;

/// Live state of one cluster.
#[derive(Debug)]
pub struct ClusterState {
    name: ConfigKey,
    config: Arc<ClusterConfig>,
    destinations: RuntimeIndex<DestinationState>,
    generation: u64,
}

impl ClusterState {
    pub fn name(&self) -> &ConfigKey {
        &self.name
    }

    /// Configuration of this cluster. Its destination snapshot holds the
    /// same instances as the destination states.
    pub fn config(&self) -> &Arc<ClusterConfig> {
        &self.config
    }

    /// Look up a destination by name, ignoring case.
    pub fn destination(&self, name: &str) -> Option<&Arc<DestinationState>> {
        self.destinations.get(&ConfigKey::new(name))
    }

    pub fn destinations(&self) -> impl Iterator<Item = &Arc<DestinationState>> {
        self.destinations.values()
    }

    pub fn destination_count(&self) -> usize {
        self.destinations.len()
    }

    /// Destinations currently considered healthy.
    pub fn healthy_destinations(&self) -> Vec<Arc<DestinationState>> {
        self.destinations
            .values()
            .filter(|d| d.is_healthy())
            .cloned()
            .collect()
    }

    /// Generation in which this state was built.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn health_check(&self) -> Option<&HealthCheckConfig> {
        self.config.health_check.as_ref()
    }
}

/// Reconciles destinations within one cluster.
#[derive(Debug, Default)]
pub struct DestinationReconciler;

impl Reconcile<DestinationConfig> for DestinationReconciler {
    type Runtime = DestinationState;

    fn create(
        &self,
        key: &ConfigKey,
        config: &Arc<DestinationConfig>,
    ) -> Result<Arc<DestinationState>, ApplyError> {
        Ok(Arc::new(DestinationState::new(key.clone(), config.clone())))
    }

    fn release(&self, _key: &ConfigKey, runtime: &Arc<DestinationState>) {
        runtime.retire();
    }
}

/// Reconciles clusters for one reload.
///
/// Holds per-reload bookkeeping, so a fresh instance is used for each reload.
#[derive(Debug)]
pub struct ClusterReconciler {
    generation: u64,
    destination_changes: RefCell<ChangeSummary>,
    pending_retirement: RefCell<Vec<Arc<DestinationState>>>,
}

impl ClusterReconciler {
    pub fn new(generation: u64) -> Self {
        Self {
            generation,
            destination_changes: RefCell::new(ChangeSummary::default()),
            pending_retirement: RefCell::new(Vec::new()),
        }
    }

    /// Destination changes made inside updated clusters.
    pub fn destination_changes(&self) -> ChangeSummary {
        *self.destination_changes.borrow()
    }

    /// Retire destinations dropped or replaced inside updated clusters.
    /// Call after the new topology is published.
    pub fn retire_pending(&self) -> usize {
        let pending = std::mem::take(&mut *self.pending_retirement.borrow_mut());
        for destination in &pending {
            destination.retire();
        }
        pending.len()
    }

    fn build(
        &self,
        key: &ConfigKey,
        config: &ClusterConfig,
        destinations: RuntimeIndex<DestinationState>,
    ) -> Result<Arc<ClusterState>, ApplyError> {
        // Rebuild the snapshot from the retained destination configs, so the
        // next reload diffs against the instances actually in service.
        let mut retained = Snapshot::builder();
        for (name, state) in &destinations {
            retained
                .insert_shared(name.clone(), state.config().clone())
                .map_err(|e| ApplyError::Create {
                    kind: "cluster",
                    key: key.to_string(),
                    reason: e.to_string(),
                })?;
        }

        let config = ClusterConfig {
            destinations: retained.build(),
            ..config.clone()
        };

        Ok(Arc::new(ClusterState {
            name: key.clone(),
            config: Arc::new(config),
            destinations,
            generation: self.generation,
        }))
    }
}

impl Reconcile<ClusterConfig> for ClusterReconciler {
    type Runtime = ClusterState;

    fn create(
        &self,
        key: &ConfigKey,
        config: &Arc<ClusterConfig>,
    ) -> Result<Arc<ClusterState>, ApplyError> {
        let changes = diff(&Snapshot::default(), &config.destinations);
        let applied = apply(&RuntimeIndex::new(), &changes, &DestinationReconciler)?;

        tracing::debug!(
            cluster = %key,
            destinations = applied.index.len(),
            "Cluster created"
        );
        self.build(key, config, applied.index)
    }

    fn replace(
        &self,
        key: &ConfigKey,
        previous: &Arc<ClusterState>,
        update: &Update<ClusterConfig>,
    ) -> Result<Arc<ClusterState>, ApplyError> {
        let changes = diff(&previous.config.destinations, &update.current.destinations);
        let Applied {
            index,
            removed,
            replaced,
        } = apply(&previous.destinations, &changes, &DestinationReconciler)?;

        let summary = changes.summary();
        tracing::debug!(
            cluster = %key,
            unchanged = summary.unchanged,
            added = summary.added,
            updated = summary.updated,
            removed = summary.removed,
            "Cluster destinations reconciled"
        );

        let state = self.build(key, &update.current, index)?;

        *self.destination_changes.borrow_mut() += summary;
        self.pending_retirement
            .borrow_mut()
            .extend(removed.into_iter().chain(replaced).map(|(_, d)| d));

        Ok(state)
    }

    fn release(&self, key: &ConfigKey, runtime: &Arc<ClusterState>) {
        for destination in runtime.destinations() {
            destination.retire();
        }
        tracing::debug!(
            cluster = %key,
            destinations = runtime.destination_count(),
            "Cluster released"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cluster(destinations: &[(&str, &str)]) -> Arc<ClusterConfig> {
        Arc::new(ClusterConfig::new(
            Snapshot::from_entries(
                destinations
                    .iter()
                    .map(|(name, addr)| (*name, DestinationConfig::new(*addr))),
            )
            .unwrap(),
        ))
    }

    #[test]
    fn test_create_builds_every_destination() {
        let reconciler = ClusterReconciler::new(1);
        let key = ConfigKey::new("web");
        let state = reconciler
            .create(&key, &cluster(&[("d1", "http://10.0.0.1"), ("d2", "http://10.0.0.2")]))
            .unwrap();

        assert_eq!(state.destination_count(), 2);
        assert_eq!(state.generation(), 1);
        assert_eq!(state.destination("D1").unwrap().address(), "http://10.0.0.1");
    }

    #[test]
    fn test_replace_keeps_unchanged_destinations() {
        let key = ConfigKey::new("web");
        let previous = ClusterReconciler::new(1)
            .create(&key, &cluster(&[("d1", "http://10.0.0.1"), ("d2", "http://10.0.0.2")]))
            .unwrap();
        let d1 = previous.destination("d1").unwrap().clone();
        let d2 = previous.destination("d2").unwrap().clone();
        d1.mark_failure(1);

        let reconciler = ClusterReconciler::new(2);
        let update = Update {
            key: key.clone(),
            previous: previous.config().clone(),
            current: cluster(&[("d1", "http://10.0.0.1"), ("d3", "http://10.0.0.3")]),
        };
        let next = reconciler.replace(&key, &previous, &update).unwrap();

        let kept = next.destination("d1").unwrap();
        assert!(Arc::ptr_eq(kept, &d1));
        assert!(!kept.is_healthy());
        assert!(Arc::ptr_eq(
            next.config().destinations.get("d1").unwrap(),
            d1.config()
        ));
        assert!(next.destination("d3").is_some());
        assert!(next.destination("d2").is_none());

        assert!(!d2.is_retired());
        assert_eq!(reconciler.retire_pending(), 1);
        assert!(d2.is_retired());
        assert!(!d1.is_retired());
        assert_eq!(
            reconciler.destination_changes(),
            ChangeSummary {
                unchanged: 1,
                added: 1,
                updated: 0,
                removed: 1,
            }
        );
    }

    #[test]
    fn test_release_retires_all_destinations() {
        let reconciler = ClusterReconciler::new(1);
        let key = ConfigKey::new("web");
        let state = reconciler
            .create(&key, &cluster(&[("d1", "http://10.0.0.1")]))
            .unwrap();

        reconciler.release(&key, &state);
        assert!(state.destinations().all(|d| d.is_retired()));
    }
}
