//! Reconciliation applier.
//!
//! Turns a [`ChangeSet`] and the current runtime index into the next runtime
//! index. The runtime objects themselves (connection counters, health state,
//! ...) belong to whoever implements [`Reconcile`]; this module only decides
//! which object each name ends up with.
//!
//! # Design Decisions
//! - Unchanged names reuse the existing runtime `Arc` verbatim
//! - The next index is built off to the side; if any hook fails, the current
//!   index is untouched and nothing is released
//! - Removed runtimes are returned rather than released here, so the caller
//!   can release them after publishing the new index

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;

use crate::config::{ConfigEntity, ConfigKey};
use crate::reconcile::diff::{ChangeSet, Update};

/// Runtime objects by name.
pub type RuntimeIndex<R> = HashMap<ConfigKey, Arc<R>>;

/// A reconcile hook refused a change.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApplyError {
    #[error("failed to create {kind} '{key}': {reason}")]
    Create {
        kind: &'static str,
        key: String,
        reason: String,
    },

    #[error("failed to replace {kind} '{key}': {reason}")]
    Replace {
        kind: &'static str,
        key: String,
        reason: String,
    },
}

/// Runtime side of reconciliation for one entity kind.
pub trait Reconcile<T: ConfigEntity> {
    type Runtime;

    /// Build runtime state for an added entity.
    fn create(&self, key: &ConfigKey, config: &Arc<T>) -> Result<Arc<Self::Runtime>, ApplyError>;

    /// Build runtime state for an updated entity. Defaults to starting over.
    fn replace(
        &self,
        key: &ConfigKey,
        _previous: &Arc<Self::Runtime>,
        update: &Update<T>,
    ) -> Result<Arc<Self::Runtime>, ApplyError> {
        self.create(key, &update.current)
    }

    /// Stop using the runtime state of a removed entity.
    fn release(&self, _key: &ConfigKey, _runtime: &Arc<Self::Runtime>) {}
}

/// Result of applying a change set.
#[derive(Debug)]
pub struct Applied<R> {
    /// The next runtime index.
    pub index: RuntimeIndex<R>,
    /// Runtimes of removed entities, not yet released.
    pub removed: Vec<(ConfigKey, Arc<R>)>,
    /// Previous runtimes of updated entities that were swapped for new ones.
    pub replaced: Vec<(ConfigKey, Arc<R>)>,
}

impl<R> Applied<R> {
    /// Release removed runtimes. Call after the new index is published.
    pub fn release_removed<T, C>(&self, reconciler: &C)
    where
        T: ConfigEntity,
        C: Reconcile<T, Runtime = R>,
    {
        for (key, runtime) in &self.removed {
            reconciler.release(key, runtime);
        }
    }
}

/// Compute the next runtime index for `changes`.
pub fn apply<T, C>(
    current: &RuntimeIndex<C::Runtime>,
    changes: &ChangeSet<T>,
    reconciler: &C,
) -> Result<Applied<C::Runtime>, ApplyError>
where
    T: ConfigEntity,
    C: Reconcile<T>,
{
    let mut index = HashMap::with_capacity(
        changes.unchanged.len() + changes.added.len() + changes.updated.len(),
    );
    let mut replaced = Vec::new();

    for entry in &changes.unchanged {
        let runtime = match current.get(&entry.key) {
            Some(runtime) => runtime.clone(),
            None => {
                tracing::warn!(
                    kind = T::KIND,
                    name = %entry.key,
                    "Unchanged entity has no runtime state, creating it"
                );
                reconciler.create(&entry.key, &entry.config)?
            }
        };
        index.insert(entry.key.clone(), runtime);
    }

    for entry in &changes.added {
        let runtime = reconciler.create(&entry.key, &entry.config)?;
        index.insert(entry.key.clone(), runtime);
    }

    for update in &changes.updated {
        let runtime = match current.get(&update.key) {
            Some(previous) => {
                let runtime = reconciler.replace(&update.key, previous, update)?;
                if !Arc::ptr_eq(previous, &runtime) {
                    replaced.push((update.key.clone(), previous.clone()));
                }
                runtime
            }
            None => reconciler.create(&update.key, &update.current)?,
        };
        index.insert(update.key.clone(), runtime);
    }

    let removed = changes
        .removed
        .iter()
        .filter_map(|entry| {
            current
                .get(&entry.key)
                .map(|runtime| (entry.key.clone(), runtime.clone()))
        })
        .collect();

    Ok(Applied {
        index,
        removed,
        replaced,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DestinationConfig, Snapshot};
    use crate::reconcile::diff::diff;
    use std::cell::RefCell;

    #[derive(Debug)]
    struct Counter {
        address: String,
    }

    #[derive(Default)]
    struct Recorder {
        released: RefCell<Vec<String>>,
        fail_on: Option<&'static str>,
    }

    impl Reconcile<DestinationConfig> for Recorder {
        type Runtime = Counter;

        fn create(
            &self,
            key: &ConfigKey,
            config: &Arc<DestinationConfig>,
        ) -> Result<Arc<Counter>, ApplyError> {
            if self.fail_on == Some(key.as_str()) {
                return Err(ApplyError::Create {
                    kind: "destination",
                    key: key.to_string(),
                    reason: "refused".into(),
                });
            }
            Ok(Arc::new(Counter {
                address: config.address.clone(),
            }))
        }

        fn release(&self, key: &ConfigKey, _runtime: &Arc<Counter>) {
            self.released.borrow_mut().push(key.to_string());
        }
    }

    fn snapshot(entries: &[(&str, &str)]) -> Snapshot<DestinationConfig> {
        Snapshot::from_entries(
            entries
                .iter()
                .map(|(name, addr)| (*name, DestinationConfig::new(*addr))),
        )
        .unwrap()
    }

    fn bootstrap(
        config: &Snapshot<DestinationConfig>,
        recorder: &Recorder,
    ) -> RuntimeIndex<Counter> {
        let changes = diff(&Snapshot::default(), config);
        apply(&RuntimeIndex::new(), &changes, recorder).unwrap().index
    }

    #[test]
    fn test_unchanged_runtime_is_reused() {
        let recorder = Recorder::default();
        let old = snapshot(&[("d1", "http://10.0.0.1"), ("d2", "http://10.0.0.2")]);
        let current = bootstrap(&old, &recorder);

        let new = snapshot(&[("d1", "http://10.0.0.1"), ("d2", "http://10.0.0.3"), ("d3", "http://10.0.0.4")]);
        let applied = apply(&current, &diff(&old, &new), &recorder).unwrap();

        let d1 = ConfigKey::new("d1");
        let d2 = ConfigKey::new("d2");
        assert!(Arc::ptr_eq(&applied.index[&d1], &current[&d1]));
        assert!(!Arc::ptr_eq(&applied.index[&d2], &current[&d2]));
        assert_eq!(applied.index[&d2].address, "http://10.0.0.3");
        assert_eq!(applied.index.len(), 3);
        assert_eq!(applied.replaced.len(), 1);
        assert!(applied.removed.is_empty());
    }

    #[test]
    fn test_removed_released_on_request() {
        let recorder = Recorder::default();
        let old = snapshot(&[("d1", "http://10.0.0.1"), ("d2", "http://10.0.0.2")]);
        let current = bootstrap(&old, &recorder);

        let new = snapshot(&[("d1", "http://10.0.0.1")]);
        let applied = apply(&current, &diff(&old, &new), &recorder).unwrap();

        assert!(recorder.released.borrow().is_empty());
        applied.release_removed::<DestinationConfig, _>(&recorder);
        assert_eq!(*recorder.released.borrow(), vec!["d2".to_string()]);
        assert!(!applied.index.contains_key(&ConfigKey::new("d2")));
    }

    #[test]
    fn test_failure_leaves_nothing_released() {
        let recorder = Recorder {
            fail_on: Some("d3"),
            ..Default::default()
        };
        let old = snapshot(&[("d1", "http://10.0.0.1"), ("d2", "http://10.0.0.2")]);
        let current = bootstrap(&old, &recorder);

        let new = snapshot(&[("d1", "http://10.0.0.1"), ("d3", "http://10.0.0.3")]);
        let err = apply(&current, &diff(&old, &new), &recorder).unwrap_err();

        assert!(matches!(err, ApplyError::Create { .. }));
        assert!(recorder.released.borrow().is_empty());
        assert_eq!(current.len(), 2);
    }

    #[test]
    fn test_missing_runtime_for_unchanged_is_created() {
        let recorder = Recorder::default();
        let old = snapshot(&[("d1", "http://10.0.0.1")]);
        let applied = apply(&RuntimeIndex::new(), &diff(&old, &old.clone()), &recorder).unwrap();
        assert_eq!(applied.index.len(), 1);
    }
}
