//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events via `tracing`)
//!
//! Consumers:
//!     → stdout (fmt layer)
//! ```
//!
//! # Design Decisions
//! - Structured fields instead of formatted messages
//! - Credentials never reach a log line; usernames only after successful auth
//! - Log level comes from the command line, not the environment

pub mod logging;

pub use logging::init_logging;
