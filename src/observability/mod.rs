//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Reload and reconcile paths produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → Log aggregation (stdout)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Structured logging with named fields for every reload
//! - Metrics go through the `metrics` facade; without an installed
//!   recorder they are no-ops, so library users pay nothing

pub mod logging;
pub mod metrics;
