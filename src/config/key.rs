//! Case-insensitive names for configuration entities.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::config::compare::StringComparison;

const KEY_COMPARISON: StringComparison = StringComparison::OrdinalIgnoreCase;

/// Name of a cluster, route or destination.
///
/// Keeps the spelling it was loaded with, but `"Web"` and `"web"` are the
/// same key for equality, hashing and ordering.
#[derive(Debug, Clone)]
pub struct ConfigKey(String);

impl ConfigKey {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl PartialEq for ConfigKey {
    fn eq(&self, other: &Self) -> bool {
        KEY_COMPARISON.equals(&self.0, &other.0)
    }
}

impl Eq for ConfigKey {}

impl Hash for ConfigKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        KEY_COMPARISON.hash(&self.0, state);
    }
}

impl PartialOrd for ConfigKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ConfigKey {
    fn cmp(&self, other: &Self) -> Ordering {
        KEY_COMPARISON.cmp(&self.0, &other.0)
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ConfigKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ConfigKey {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for ConfigKey {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl Serialize for ConfigKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for ConfigKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(ConfigKey)
    }
}
