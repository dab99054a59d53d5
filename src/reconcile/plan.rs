//! Dry-run view of a reload.
//!
//! Computes what applying a new configuration would change, down to the
//! destinations of each updated cluster, without touching any runtime state.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::config::ProxyConfig;
use crate::reconcile::diff::{diff, ChangeReport};

/// Names added, updated and removed per entity kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReloadPlan {
    pub clusters: ChangeReport,
    /// Destination changes of each updated cluster, by cluster name.
    pub destinations: BTreeMap<String, ChangeReport>,
    pub routes: ChangeReport,
}

impl ReloadPlan {
    pub fn has_changes(&self) -> bool {
        let changed = |r: &ChangeReport| {
            !(r.added.is_empty() && r.updated.is_empty() && r.removed.is_empty())
        };
        changed(&self.clusters) || changed(&self.routes)
    }
}

/// Plan the reload from `old` to `new`.
pub fn plan(old: &ProxyConfig, new: &ProxyConfig) -> ReloadPlan {
    let clusters = diff(&old.clusters, &new.clusters);
    let destinations = clusters
        .updated
        .iter()
        .map(|u| {
            let report = diff(&u.previous.destinations, &u.current.destinations).report();
            (u.key.to_string(), report)
        })
        .collect();

    ReloadPlan {
        clusters: clusters.report(),
        destinations,
        routes: diff(&old.routes, &new.routes).report(),
    }
}

impl fmt::Display for ReloadPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "clusters:")?;
        for name in &self.clusters.added {
            writeln!(f, "  + {}", name)?;
        }
        for name in &self.clusters.updated {
            writeln!(f, "  ~ {}", name)?;
            if let Some(report) = self.destinations.get(name) {
                for d in &report.added {
                    writeln!(f, "      + {}", d)?;
                }
                for d in &report.updated {
                    writeln!(f, "      ~ {}", d)?;
                }
                for d in &report.removed {
                    writeln!(f, "      - {}", d)?;
                }
            }
        }
        for name in &self.clusters.removed {
            writeln!(f, "  - {}", name)?;
        }
        writeln!(f, "routes:")?;
        for name in &self.routes.added {
            writeln!(f, "  + {}", name)?;
        }
        for name in &self.routes.updated {
            writeln!(f, "  ~ {}", name)?;
        }
        for name in &self.routes.removed {
            writeln!(f, "  - {}", name)?;
        }
        write!(
            f,
            "unchanged: {} cluster(s), {} route(s)",
            self.clusters.unchanged.len(),
            self.routes.unchanged.len()
        )
    }
}
