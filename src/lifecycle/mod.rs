//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load config → Validate upstream → Build server → Bind listener
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Stop accepting → Drain in-flight requests → Exit
//!
//! Signals (signals.rs):
//!     Register handlers before bind → SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal and maps to exit code 1
//! - Shutdown is one-shot and has no forced deadline
//! - The serve loop runs on its own task; the caller only waits for signals

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::{serve_until, serve_until_signal, Shutdown};
pub use signals::TerminationSignals;
pub use startup::{bootstrap, Startup, StartupError};
