//! Route configuration.

use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::config::compare::StringComparison::{Ordinal, OrdinalIgnoreCase};
use crate::config::metadata::{self, Metadata};
use crate::config::ConfigEntity;

/// Route mapping matching requests to a cluster.
///
/// Hosts, methods and the cluster name compare ignoring case. The path
/// prefix compares exactly because path matching is case-sensitive.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RouteConfig {
    /// Cluster name to forward to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster: Option<String>,

    /// Host headers to match (any of).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hosts: Option<Vec<String>>,

    /// Path prefix to match.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path_prefix: Option<String>,

    /// HTTP methods to match (any of).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub methods: Option<Vec<String>>,

    /// Route order (lower = checked first).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
}

impl RouteConfig {
    pub fn to_cluster(cluster: impl Into<String>) -> Self {
        Self {
            cluster: Some(cluster.into()),
            ..Default::default()
        }
    }

    pub fn with_hosts<I, S>(mut self, hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.hosts = Some(hosts.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_path_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.path_prefix = Some(prefix.into());
        self
    }

    pub fn with_methods<I, S>(mut self, methods: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.methods = Some(methods.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_order(mut self, order: i32) -> Self {
        self.order = Some(order);
        self
    }
}

impl PartialEq for RouteConfig {
    fn eq(&self, other: &Self) -> bool {
        OrdinalIgnoreCase.equals_opt(self.cluster.as_deref(), other.cluster.as_deref())
            && OrdinalIgnoreCase.equals_opt_seq(self.hosts.as_deref(), other.hosts.as_deref())
            && Ordinal.equals_opt(self.path_prefix.as_deref(), other.path_prefix.as_deref())
            && OrdinalIgnoreCase.equals_opt_seq(self.methods.as_deref(), other.methods.as_deref())
            && self.order == other.order
            && metadata::equals(self.metadata.as_ref(), other.metadata.as_ref())
    }
}

impl Eq for RouteConfig {}

impl Hash for RouteConfig {
    fn hash<H: Hasher>(&self, state: &mut H) {
        OrdinalIgnoreCase.hash_opt(self.cluster.as_deref(), state);
        OrdinalIgnoreCase.hash_opt_seq(self.hosts.as_deref(), state);
        Ordinal.hash_opt(self.path_prefix.as_deref(), state);
        OrdinalIgnoreCase.hash_opt_seq(self.methods.as_deref(), state);
        self.order.hash(state);
        metadata::hash(self.metadata.as_ref(), state);
    }
}

impl ConfigEntity for RouteConfig {
    const KIND: &'static str = "route";
}
