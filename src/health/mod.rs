//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! GET /-/ready   → probe.rs → GET {target}/{readiness}  → 200 | 503
//! GET /-/healthy → probe.rs → GET {target}/{liveness}   → 200 | 503
//! ```
//!
//! # Design Decisions
//! - Probe routes need no credentials so orchestrators can poll them
//! - Probes travel the same network path as forwarded traffic
//! - No background monitoring; the orchestrator drives the polling

pub mod probe;

pub use probe::{HealthProbe, ProbeError, ProbeKind, ProbeStatus};
