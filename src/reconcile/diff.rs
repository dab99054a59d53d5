//! Snapshot differ.
//!
//! # Responsibilities
//! - Partition two generations of a named collection into unchanged,
//!   added, updated and removed entries
//! - Hand back the OLD instance for unchanged names so runtime state attached
//!   to it survives the reload
//!
//! # Design Decisions
//! - Explicit set operations over the key sets: intersection tested for
//!   equality, differences give added/removed
//! - Names match ignoring case (ConfigKey)
//! - Every group is sorted by name, so output is identical across runs
//! - Read-only over both inputs; only the result groups are allocated

use std::sync::Arc;

use serde::Serialize;

use crate::config::{ConfigEntity, ConfigKey, Snapshot};

/// An entity kept, added or removed by a reload.
#[derive(Debug)]
pub struct Entry<T> {
    pub key: ConfigKey,
    pub config: Arc<T>,
}

impl<T> Clone for Entry<T> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            config: self.config.clone(),
        }
    }
}

/// An entity present in both generations whose configuration changed.
#[derive(Debug)]
pub struct Update<T> {
    pub key: ConfigKey,
    pub previous: Arc<T>,
    pub current: Arc<T>,
}

impl<T> Clone for Update<T> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            previous: self.previous.clone(),
            current: self.current.clone(),
        }
    }
}

/// Four-way partition of two generations. The groups are disjoint.
#[derive(Debug)]
pub struct ChangeSet<T> {
    /// Present in both and equal; holds the old key and old instance.
    pub unchanged: Vec<Entry<T>>,
    /// Present only in the new generation.
    pub added: Vec<Entry<T>>,
    /// Present in both but different; `current` is the new instance.
    pub updated: Vec<Update<T>>,
    /// Present only in the old generation.
    pub removed: Vec<Entry<T>>,
}

impl<T> Default for ChangeSet<T> {
    fn default() -> Self {
        Self {
            unchanged: Vec::new(),
            added: Vec::new(),
            updated: Vec::new(),
            removed: Vec::new(),
        }
    }
}

impl<T> Clone for ChangeSet<T> {
    fn clone(&self) -> Self {
        Self {
            unchanged: self.unchanged.clone(),
            added: self.added.clone(),
            updated: self.updated.clone(),
            removed: self.removed.clone(),
        }
    }
}

impl<T> ChangeSet<T> {
    /// True if applying this change set would touch any runtime state.
    pub fn has_changes(&self) -> bool {
        !(self.added.is_empty() && self.updated.is_empty() && self.removed.is_empty())
    }

    /// Total number of entries across all groups.
    pub fn len(&self) -> usize {
        self.unchanged.len() + self.added.len() + self.updated.len() + self.removed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn summary(&self) -> ChangeSummary {
        ChangeSummary {
            unchanged: self.unchanged.len(),
            added: self.added.len(),
            updated: self.updated.len(),
            removed: self.removed.len(),
        }
    }

    /// Names per group, for display.
    pub fn report(&self) -> ChangeReport {
        fn names<'a>(keys: impl Iterator<Item = &'a ConfigKey>) -> Vec<String> {
            keys.map(ToString::to_string).collect()
        }
        ChangeReport {
            unchanged: names(self.unchanged.iter().map(|e| &e.key)),
            added: names(self.added.iter().map(|e| &e.key)),
            updated: names(self.updated.iter().map(|u| &u.key)),
            removed: names(self.removed.iter().map(|e| &e.key)),
        }
    }
}

/// Counts per group.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ChangeSummary {
    pub unchanged: usize,
    pub added: usize,
    pub updated: usize,
    pub removed: usize,
}

impl ChangeSummary {
    pub fn has_changes(&self) -> bool {
        self.added + self.updated + self.removed > 0
    }
}

impl std::ops::AddAssign for ChangeSummary {
    fn add_assign(&mut self, other: Self) {
        self.unchanged += other.unchanged;
        self.added += other.added;
        self.updated += other.updated;
        self.removed += other.removed;
    }
}

/// Names per group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChangeReport {
    pub unchanged: Vec<String>,
    pub added: Vec<String>,
    pub updated: Vec<String>,
    pub removed: Vec<String>,
}

/// Compare two generations of a named collection.
pub fn diff<T: ConfigEntity>(old: &Snapshot<T>, new: &Snapshot<T>) -> ChangeSet<T> {
    let mut changes = ChangeSet::default();

    for (key, current) in new.iter() {
        match old.get_key_value(key) {
            Some((old_key, previous)) => {
                if Arc::ptr_eq(previous, current) || **previous == **current {
                    changes.unchanged.push(Entry {
                        key: old_key.clone(),
                        config: previous.clone(),
                    });
                } else {
                    changes.updated.push(Update {
                        key: key.clone(),
                        previous: previous.clone(),
                        current: current.clone(),
                    });
                }
            }
            None => changes.added.push(Entry {
                key: key.clone(),
                config: current.clone(),
            }),
        }
    }

    for (key, previous) in old.iter() {
        if new.get_key_value(key).is_none() {
            changes.removed.push(Entry {
                key: key.clone(),
                config: previous.clone(),
            });
        }
    }

    changes.unchanged.sort_by(|a, b| a.key.cmp(&b.key));
    changes.added.sort_by(|a, b| a.key.cmp(&b.key));
    changes.updated.sort_by(|a, b| a.key.cmp(&b.key));
    changes.removed.sort_by(|a, b| a.key.cmp(&b.key));

    tracing::trace!(
        kind = T::KIND,
        unchanged = changes.unchanged.len(),
        added = changes.added.len(),
        updated = changes.updated.len(),
        removed = changes.removed.len(),
        "Snapshot diff computed"
    );

    changes
}
