//! Cluster configuration.

use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::config::compare::StringComparison::OrdinalIgnoreCase;
use crate::config::destination::DestinationConfig;
use crate::config::metadata::{self, Metadata};
use crate::config::schema::HealthCheckConfig;
use crate::config::snapshot::Snapshot;
use crate::config::ConfigEntity;

/// A named group of destinations that routes forward to.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ClusterConfig {
    /// Destinations of this cluster, keyed by name (case-insensitive).
    #[serde(default)]
    pub destinations: Snapshot<DestinationConfig>,

    /// Load balancing policy name, e.g. `round_robin`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub load_balancing_policy: Option<String>,

    /// Active health check settings for the destinations of this cluster.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health_check: Option<HealthCheckConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
}

impl ClusterConfig {
    pub fn new(destinations: Snapshot<DestinationConfig>) -> Self {
        Self {
            destinations,
            ..Default::default()
        }
    }

    pub fn with_load_balancing_policy(mut self, policy: impl Into<String>) -> Self {
        self.load_balancing_policy = Some(policy.into());
        self
    }

    pub fn with_health_check(mut self, health_check: HealthCheckConfig) -> Self {
        self.health_check = Some(health_check);
        self
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

impl PartialEq for ClusterConfig {
    fn eq(&self, other: &Self) -> bool {
        self.destinations == other.destinations
            && OrdinalIgnoreCase.equals_opt(
                self.load_balancing_policy.as_deref(),
                other.load_balancing_policy.as_deref(),
            )
            && self.health_check == other.health_check
            && metadata::equals(self.metadata.as_ref(), other.metadata.as_ref())
    }
}

impl Eq for ClusterConfig {}

impl Hash for ClusterConfig {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.destinations.hash(state);
        OrdinalIgnoreCase.hash_opt(self.load_balancing_policy.as_deref(), state);
        self.health_check.hash(state);
        metadata::hash(self.metadata.as_ref(), state);
    }
}

impl ConfigEntity for ClusterConfig {
    const KIND: &'static str = "cluster";
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::hash_map::DefaultHasher;

    fn hash_of(c: &ClusterConfig) -> u64 {
        let mut hasher = DefaultHasher::new();
        c.hash(&mut hasher);
        hasher.finish()
    }

    fn cluster(destinations: &[(&str, &str)]) -> ClusterConfig {
        ClusterConfig::new(
            Snapshot::from_entries(
                destinations
                    .iter()
                    .map(|(name, addr)| (*name, DestinationConfig::new(*addr))),
            )
            .unwrap(),
        )
    }

    #[test]
    fn test_destination_names_and_addresses_ignore_case() {
        let a = cluster(&[("D1", "http://10.0.0.1"), ("d2", "http://10.0.0.2")]);
        let b = cluster(&[("d2", "HTTP://10.0.0.2"), ("d1", "http://10.0.0.1")]);
        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));
    }

    #[test]
    fn test_destination_change_changes_cluster() {
        let a = cluster(&[("d1", "http://10.0.0.1")]);
        let b = cluster(&[("d1", "http://10.0.0.9")]);
        let c = cluster(&[("d1", "http://10.0.0.1"), ("d2", "http://10.0.0.2")]);
        assert_ne!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_policy_ignores_case() {
        let a = cluster(&[]).with_load_balancing_policy("RoundRobin");
        let b = cluster(&[]).with_load_balancing_policy("roundrobin");
        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));
        assert_ne!(a, cluster(&[]));
    }

    #[test]
    fn test_health_check_participates() {
        let checked = cluster(&[]).with_health_check(HealthCheckConfig::default());
        let mut slower = HealthCheckConfig::default();
        slower.interval_secs += 5;

        assert_ne!(checked, cluster(&[]));
        assert_ne!(checked, cluster(&[]).with_health_check(slower));
        assert_eq!(checked, cluster(&[]).with_health_check(HealthCheckConfig::default()));
    }
}
