//! Route runtime state.

use std::sync::Arc;

use crate::config::{ConfigKey, RouteConfig};
use crate::reconcile::{ApplyError, Reconcile};

/// Live state of one route.
#[derive(Debug)]
pub struct RouteState {
    name: ConfigKey,
    config: Arc<RouteConfig>,
    generation: u64,
}

impl RouteState {
    pub fn name(&self) -> &ConfigKey {
        &self.name
    }

    pub fn config(&self) -> &Arc<RouteConfig> {
        &self.config
    }

    /// Target cluster name.
    pub fn cluster(&self) -> Option<&str> {
        self.config.cluster.as_deref()
    }

    /// Generation in which this state was built.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Reconciles routes for one reload.
#[derive(Debug)]
pub struct RouteReconciler {
    generation: u64,
}

impl RouteReconciler {
    pub fn new(generation: u64) -> Self {
        Self { generation }
    }
}

impl Reconcile<RouteConfig> for RouteReconciler {
    type Runtime = RouteState;

    fn create(&self, key: &ConfigKey, config: &Arc<RouteConfig>) -> Result<Arc<RouteState>, ApplyError> {
        Ok(Arc::new(RouteState {
            name: key.clone(),
            config: config.clone(),
            generation: self.generation,
        }))
    }

    fn release(&self, key: &ConfigKey, runtime: &Arc<RouteState>) {
        tracing::debug!(route = %key, cluster = ?runtime.cluster(), "Route released");
    }
}
