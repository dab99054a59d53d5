//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize into snapshots)
//!     → validation.rs (semantic checks)
//!     → ProxyConfig (validated, immutable)
//!     → reconcile::diff against the running generation
//!
//! On reload:
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → runtime::ProxyState reconciles and atomically publishes
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require full reload
//! - Entity equality is semantic: names, addresses and hosts ignore case,
//!   metadata is exact (see compare.rs and metadata.rs)
//! - Validation separates syntactic (serde) from semantic checks

pub mod cluster;
pub mod compare;
pub mod destination;
pub mod key;
pub mod loader;
pub mod metadata;
pub mod route;
pub mod schema;
pub mod snapshot;
pub mod validation;
pub mod watcher;

use std::hash::Hash;

pub use cluster::ClusterConfig;
pub use compare::StringComparison;
pub use destination::DestinationConfig;
pub use key::ConfigKey;
pub use metadata::Metadata;
pub use route::RouteConfig;
pub use schema::{HealthCheckConfig, ObservabilityConfig, ProxyConfig, ReloadConfig};
pub use snapshot::{Snapshot, SnapshotBuilder, SnapshotError};

/// A named configuration record with value semantics.
///
/// `Eq` and `Hash` are semantic (field policies, not identity), which is
/// what the differ relies on to tell unchanged entities from updated ones.
pub trait ConfigEntity: Eq + Hash + Send + Sync + 'static {
    /// Entity kind used in logs and metric labels.
    const KIND: &'static str;
}
