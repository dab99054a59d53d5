//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs):
//!     Load config → Validate → Reconcile into ProxyState → Start watcher
//!
//! Reload (reload.rs):
//!     watcher / SIGHUP → validated ProxyConfig → ProxyState::apply
//!
//! Shutdown (shutdown.rs, signals.rs):
//!     SIGTERM/SIGINT → broadcast → reload loop exits
//! ```
//!
//! # Design Decisions
//! - A rejected reload never stops the loop; the current topology stays
//! - SIGHUP triggers config reload, not shutdown

pub mod reload;
pub mod shutdown;
pub mod signals;

pub use reload::run_reload_loop;
pub use shutdown::Shutdown;
