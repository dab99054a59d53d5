//! Immutable, name-keyed collections of configuration entities.
//!
//! A [`Snapshot`] is one generation of a named collection (the clusters of a
//! config, the destinations of a cluster, ...). It is assembled by a
//! [`SnapshotBuilder`] and only becomes visible once complete, so the differ
//! never observes a collection that is still being filled.
//!
//! Entities are held behind `Arc` so that a later generation can keep an
//! older instance by reference rather than by copy.

use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::sync::Arc;

use serde::de::{self, Deserialize, Deserializer, MapAccess, Visitor};
use serde::ser::{Serialize, SerializeMap, Serializer};
use thiserror::Error;

use crate::config::key::ConfigKey;

/// Error building a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SnapshotError {
    #[error("duplicate name '{duplicate}' (conflicts with '{existing}', names are case-insensitive)")]
    DuplicateKey { existing: String, duplicate: String },
}

/// A complete generation of named entities.
#[derive(Debug)]
pub struct Snapshot<T> {
    entries: HashMap<ConfigKey, Arc<T>>,
}

impl<T> Snapshot<T> {
    pub fn builder() -> SnapshotBuilder<T> {
        SnapshotBuilder::default()
    }

    /// Build a snapshot from `(name, entity)` pairs.
    pub fn from_entries<K, I>(entries: I) -> Result<Self, SnapshotError>
    where
        K: Into<ConfigKey>,
        I: IntoIterator<Item = (K, T)>,
    {
        let mut builder = Self::builder();
        for (name, entity) in entries {
            builder.insert(name, entity)?;
        }
        Ok(builder.build())
    }

    /// Look up an entity by name, ignoring case.
    pub fn get(&self, name: &str) -> Option<&Arc<T>> {
        self.entries.get(&ConfigKey::new(name))
    }

    /// Look up an entity along with the key spelling it was stored under.
    pub fn get_key_value(&self, key: &ConfigKey) -> Option<(&ConfigKey, &Arc<T>)> {
        self.entries.get_key_value(key)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &ConfigKey> {
        self.entries.keys()
    }

    /// Iterate entries in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (&ConfigKey, &Arc<T>)> {
        self.entries.iter()
    }

    /// Entries ordered by name.
    pub fn sorted(&self) -> Vec<(&ConfigKey, &Arc<T>)> {
        let mut entries: Vec<_> = self.entries.iter().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        entries
    }
}

impl<T> Default for Snapshot<T> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<T> Clone for Snapshot<T> {
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
        }
    }
}

impl<T: PartialEq> PartialEq for Snapshot<T> {
    fn eq(&self, other: &Self) -> bool {
        self.entries.len() == other.entries.len()
            && self.entries.iter().all(|(key, value)| {
                other
                    .entries
                    .get(key)
                    .is_some_and(|theirs| Arc::ptr_eq(value, theirs) || **value == **theirs)
            })
    }
}

impl<T: Eq> Eq for Snapshot<T> {}

impl<T: Hash> Hash for Snapshot<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        let sum = self.entries.iter().fold(0u64, |acc, (key, value)| {
            let mut hasher = DefaultHasher::new();
            key.hash(&mut hasher);
            value.hash(&mut hasher);
            acc.wrapping_add(hasher.finish())
        });
        state.write_usize(self.entries.len());
        state.write_u64(sum);
    }
}

impl<T: Serialize> Serialize for Snapshot<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let entries = self.sorted();
        let mut map = serializer.serialize_map(Some(entries.len()))?;
        for (key, value) in entries {
            map.serialize_entry(key.as_str(), &**value)?;
        }
        map.end()
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Snapshot<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(SnapshotVisitor(PhantomData))
    }
}

struct SnapshotVisitor<T>(PhantomData<T>);

impl<'de, T: Deserialize<'de>> Visitor<'de> for SnapshotVisitor<T> {
    type Value = Snapshot<T>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a table of named entries")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        // Collect in name order so duplicate reports are deterministic.
        let mut raw = BTreeMap::new();
        while let Some((name, entity)) = access.next_entry::<String, T>()? {
            raw.insert(name, entity);
        }
        Snapshot::from_entries(raw).map_err(de::Error::custom)
    }
}

/// Collects entries for a [`Snapshot`]; the snapshot only exists once
/// [`SnapshotBuilder::build`] consumes the builder.
#[derive(Debug)]
pub struct SnapshotBuilder<T> {
    entries: HashMap<ConfigKey, Arc<T>>,
}

impl<T> Default for SnapshotBuilder<T> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<T> SnapshotBuilder<T> {
    pub fn insert(&mut self, name: impl Into<ConfigKey>, entity: T) -> Result<(), SnapshotError> {
        self.insert_shared(name, Arc::new(entity))
    }

    /// Insert an instance that may already be held by another snapshot.
    pub fn insert_shared(
        &mut self,
        name: impl Into<ConfigKey>,
        entity: Arc<T>,
    ) -> Result<(), SnapshotError> {
        let key = name.into();
        if let Some((existing, _)) = self.entries.get_key_value(&key) {
            return Err(SnapshotError::DuplicateKey {
                existing: existing.to_string(),
                duplicate: key.to_string(),
            });
        }
        self.entries.insert(key, entity);
        Ok(())
    }

    pub fn build(self) -> Snapshot<T> {
        Snapshot {
            entries: self.entries,
        }
    }
}
