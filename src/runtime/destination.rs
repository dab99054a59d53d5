//! Destination runtime state.
//!
//! # Responsibilities
//! - Hold the configuration instance a destination was built from
//! - Track active connections and health state across reloads
//! - Expose health endpoint and metadata verbatim to probers
//!
//! # Design Decisions
//! - A destination whose configuration is unchanged keeps this object, so
//!   its counters survive reloads
//! - A retired destination is no longer part of the live topology; the
//!   forwarding engine must stop selecting it

use std::ops::Deref;
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicUsize, Ordering};
use std::sync::Arc;

use crate::config::{ConfigKey, DestinationConfig, Metadata};

/// Health State enum.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthState {
    Unknown = 0,
    Healthy = 1,
    Unhealthy = 2,
}

impl From<u8> for HealthState {
    fn from(val: u8) -> Self {
        match val {
            1 => HealthState::Healthy,
            2 => HealthState::Unhealthy,
            _ => HealthState::Unknown,
        }
    }
}

/// Live state of one destination.
#[derive(Debug)]
pub struct DestinationState {
    name: ConfigKey,
    config: Arc<DestinationConfig>,

    /// Number of currently active connections.
    active_connections: AtomicUsize,
    /// Current health state (0=Unknown, 1=Healthy, 2=Unhealthy).
    state: AtomicU8,
    consecutive_failures: AtomicUsize,
    consecutive_successes: AtomicUsize,
    retired: AtomicBool,
}

impl DestinationState {
    pub fn new(name: ConfigKey, config: Arc<DestinationConfig>) -> Self {
        Self {
            name,
            config,
            active_connections: AtomicUsize::new(0),
            state: AtomicU8::new(HealthState::Unknown as u8),
            consecutive_failures: AtomicUsize::new(0),
            consecutive_successes: AtomicUsize::new(0),
            retired: AtomicBool::new(false),
        }
    }

    pub fn name(&self) -> &ConfigKey {
        &self.name
    }

    /// The configuration instance this state was built from.
    pub fn config(&self) -> &Arc<DestinationConfig> {
        &self.config
    }

    pub fn address(&self) -> &str {
        &self.config.address
    }

    /// Active health probe endpoint, uninterpreted.
    pub fn health_endpoint(&self) -> Option<&str> {
        self.config.health.as_deref()
    }

    /// Outbound host header override, uninterpreted.
    pub fn host(&self) -> Option<&str> {
        self.config.host.as_deref()
    }

    pub fn metadata(&self) -> Option<&Metadata> {
        self.config.metadata.as_ref()
    }

    // --- Connections ---

    pub fn active_connections(&self) -> usize {
        self.active_connections.load(Ordering::Relaxed)
    }

    /// Track a connection until the returned guard is dropped.
    pub fn connect(self: &Arc<Self>) -> ConnectionGuard {
        self.active_connections.fetch_add(1, Ordering::Relaxed);
        ConnectionGuard {
            destination: self.clone(),
        }
    }

    // --- Health Logic ---

    pub fn health(&self) -> HealthState {
        HealthState::from(self.state.load(Ordering::Relaxed))
    }

    /// Return true if destination is considered healthy (Healthy or Unknown).
    pub fn is_healthy(&self) -> bool {
        self.health() != HealthState::Unhealthy
    }

    /// Report a successful request/check.
    pub fn mark_success(&self, healthy_threshold: usize) {
        self.consecutive_failures.store(0, Ordering::Relaxed);

        if self.health() == HealthState::Healthy {
            return;
        }

        let successes = self.consecutive_successes.fetch_add(1, Ordering::Relaxed) + 1;
        if successes >= healthy_threshold {
            self.state.store(HealthState::Healthy as u8, Ordering::Relaxed);
            self.consecutive_successes.store(0, Ordering::Relaxed);
            tracing::info!(destination = %self.name, address = %self.config.address, "Destination marked healthy");
        }
    }

    /// Report a failed request/check.
    pub fn mark_failure(&self, unhealthy_threshold: usize) {
        self.consecutive_successes.store(0, Ordering::Relaxed);

        if self.health() == HealthState::Unhealthy {
            return;
        }

        let failures = self.consecutive_failures.fetch_add(1, Ordering::Relaxed) + 1;
        if failures >= unhealthy_threshold {
            self.state.store(HealthState::Unhealthy as u8, Ordering::Relaxed);
            self.consecutive_failures.store(0, Ordering::Relaxed);
            tracing::warn!(destination = %self.name, address = %self.config.address, "Destination marked unhealthy");
        }
    }

    // --- Lifecycle ---

    /// Take this destination out of service.
    pub fn retire(&self) {
        if !self.retired.swap(true, Ordering::AcqRel) {
            tracing::debug!(
                destination = %self.name,
                active_connections = self.active_connections(),
                "Destination retired"
            );
        }
    }

    pub fn is_retired(&self) -> bool {
        self.retired.load(Ordering::Acquire)
    }
}

/// A RAII guard that manages the active connection count.
#[derive(Debug)]
pub struct ConnectionGuard {
    destination: Arc<DestinationState>,
}

impl Deref for ConnectionGuard {
    type Target = DestinationState;
    fn deref(&self) -> &Self::Target {
        &self.destination
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.destination
            .active_connections
            .fetch_sub(1, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn destination() -> Arc<DestinationState> {
        Arc::new(DestinationState::new(
            ConfigKey::new("d1"),
            Arc::new(DestinationConfig::new("http://10.0.0.1").with_health("http://10.0.0.1/healthz")),
        ))
    }

    #[test]
    fn test_health_hysteresis() {
        let d = destination();
        assert_eq!(d.health(), HealthState::Unknown);
        assert!(d.is_healthy());

        d.mark_failure(2);
        assert!(d.is_healthy());
        d.mark_failure(2);
        assert_eq!(d.health(), HealthState::Unhealthy);

        d.mark_success(2);
        assert_eq!(d.health(), HealthState::Unhealthy);
        d.mark_success(2);
        assert_eq!(d.health(), HealthState::Healthy);
    }

    #[test]
    fn test_connection_guard() {
        let d = destination();
        {
            let _a = d.connect();
            let b = d.connect();
            assert_eq!(b.active_connections(), 2);
        }
        assert_eq!(d.active_connections(), 0);
    }

    #[test]
    fn test_passthrough_fields() {
        let d = destination();
        assert_eq!(d.address(), "http://10.0.0.1");
        assert_eq!(d.health_endpoint(), Some("http://10.0.0.1/healthz"));
        assert!(d.host().is_none());
        assert!(d.metadata().is_none());
    }

    #[test]
    fn test_retire_is_idempotent() {
        let d = destination();
        assert!(!d.is_retired());
        d.retire();
        d.retire();
        assert!(d.is_retired());
    }
}
