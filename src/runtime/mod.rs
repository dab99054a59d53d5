//! Runtime topology subsystem.
//!
//! # Data Flow
//! ```text
//! ProxyConfig (new generation)
//!     → store.rs: diff clusters and routes against the live topology
//!     → cluster.rs: create / replace (destination diff) / release clusters
//!     → destination.rs: per-destination connection and health state
//!     → route.rs: per-route state
//!     → store.rs: publish Topology with one atomic swap
//!     → release removed clusters, routes and destinations
//! ```
//!
//! # Design Decisions
//! - Runtime objects are looked up by case-insensitive name
//! - Unchanged entities keep their runtime objects across reloads
//! - Health and connection counters are per-destination, not per-cluster

pub mod cluster;
pub mod destination;
pub mod route;
pub mod store;

pub use cluster::{ClusterReconciler, ClusterState, DestinationReconciler};
pub use destination::{ConnectionGuard, DestinationState, HealthState};
pub use route::{RouteReconciler, RouteState};
pub use store::{ProxyState, ReloadReport, Topology};
