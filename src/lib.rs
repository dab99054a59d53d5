//! Configuration identity and reconciliation for a reloadable reverse proxy.
//!
//! Given the running configuration and a newly loaded one, decides which
//! clusters, destinations and routes are unchanged, added, updated or
//! removed, and swaps in a new runtime topology that keeps the runtime state
//! of everything that did not change.

pub mod config;
pub mod lifecycle;
pub mod observability;
pub mod reconcile;
pub mod runtime;

pub use config::schema::ProxyConfig;
pub use reconcile::{diff, ChangeSet};
pub use runtime::ProxyState;
