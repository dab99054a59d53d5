//! Configuration schema definitions.
//!
//! This module defines the root of one configuration generation. Entity
//! types (clusters, routes, destinations) live in their own modules and carry
//! hand-written equality; the settings here are plain values.

use serde::{Deserialize, Serialize};

use crate::config::cluster::ClusterConfig;
use crate::config::route::RouteConfig;
use crate::config::snapshot::Snapshot;

/// Root configuration for the proxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Cluster definitions, keyed by cluster name.
    pub clusters: Snapshot<ClusterConfig>,

    /// Route definitions, keyed by route name.
    pub routes: Snapshot<RouteConfig>,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Hot reload settings.
    pub reload: ReloadConfig,
}

/// Active health check configuration for a cluster.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(default)]
pub struct HealthCheckConfig {
    /// Enable active health checks.
    pub enabled: bool,

    /// Health check interval in seconds.
    pub interval_secs: u64,

    /// Health check timeout in seconds.
    pub timeout_secs: u64,

    /// Path to probe when a destination has no explicit health endpoint.
    pub path: String,

    /// Number of consecutive failures before marking unhealthy.
    pub unhealthy_threshold: u32,

    /// Number of consecutive successes before marking healthy.
    pub healthy_threshold: u32,
}

impl Default for HealthCheckConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: 10,
            timeout_secs: 5,
            path: "/health".to_string(),
            unhealthy_threshold: 3,
            healthy_threshold: 2,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Hot reload configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ReloadConfig {
    /// Watch the configuration file and apply changes automatically.
    pub watch: bool,

    /// Poll interval for file watchers that fall back to polling, in seconds.
    pub poll_interval_secs: u64,
}

impl Default for ReloadConfig {
    fn default() -> Self {
        Self {
            watch: true,
            poll_interval_secs: 2,
        }
    }
}
