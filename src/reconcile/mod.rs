//! Reconciliation subsystem.
//!
//! # Data Flow
//! ```text
//! running generation (Snapshot<T>)      new generation (Snapshot<T>)
//!                 \                        /
//!                  → diff.rs (four-way partition)
//!                  → ChangeSet<T> { unchanged, added, updated, removed }
//!                  → apply.rs (Reconcile<T> hooks per added/updated/removed)
//!                  → next RuntimeIndex, published by the caller
//! ```
//!
//! # Design Decisions
//! - Diffing is pure and synchronous; only complete snapshots are compared
//! - Unchanged entities keep both their old config instance and their
//!   runtime object, so attached state survives a no-op reload
//! - Applying never mutates the current index

pub mod apply;
pub mod diff;
pub mod plan;

pub use apply::{apply, Applied, ApplyError, Reconcile, RuntimeIndex};
pub use diff::{diff, ChangeReport, ChangeSet, ChangeSummary, Entry, Update};
pub use plan::{plan, ReloadPlan};
