//! Process lifecycle.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs):
//!     Load config → Logging → Dispatcher → (Preload schemas) → Watcher → Listeners
//!
//! Shutdown:
//!     SIGINT/SIGTERM (signals.rs) → Shutdown::trigger (shutdown.rs)
//!     → gateway listener drains → admin listener drains → reload task exits
//! ```
//!
//! Any startup error is fatal; nothing is retried.

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
