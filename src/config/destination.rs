//! Destination configuration.

use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::config::compare::StringComparison::OrdinalIgnoreCase;
use crate::config::metadata::{self, Metadata};
use crate::config::ConfigEntity;

/// A single upstream endpoint of a cluster.
///
/// Two destinations are the same configuration when their address, health
/// endpoint and host match ignoring case, and their metadata matches exactly.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DestinationConfig {
    /// Address of this destination, e.g. `https://127.0.0.1:123/abcd1234/`.
    /// Required; an absent address is reported by validation.
    #[serde(default)]
    pub address: String,

    /// Endpoint accepting active health check probes, e.g. `http://127.0.0.1:1234/`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health: Option<String>,

    /// Host header value to pass to this destination, used when request
    /// transforms do not set one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,

    /// Arbitrary key-value pairs that further describe this destination.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
}

impl DestinationConfig {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            ..Default::default()
        }
    }

    pub fn with_health(mut self, health: impl Into<String>) -> Self {
        self.health = Some(health.into());
        self
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

impl PartialEq for DestinationConfig {
    fn eq(&self, other: &Self) -> bool {
        OrdinalIgnoreCase.equals(&self.address, &other.address)
            && OrdinalIgnoreCase.equals_opt(self.health.as_deref(), other.health.as_deref())
            && OrdinalIgnoreCase.equals_opt(self.host.as_deref(), other.host.as_deref())
            && metadata::equals(self.metadata.as_ref(), other.metadata.as_ref())
    }
}

impl Eq for DestinationConfig {}

impl Hash for DestinationConfig {
    fn hash<H: Hasher>(&self, state: &mut H) {
        OrdinalIgnoreCase.hash(&self.address, state);
        OrdinalIgnoreCase.hash_opt(self.health.as_deref(), state);
        OrdinalIgnoreCase.hash_opt(self.host.as_deref(), state);
        metadata::hash(self.metadata.as_ref(), state);
    }
}

impl ConfigEntity for DestinationConfig {
    const KIND: &'static str = "destination";
}
