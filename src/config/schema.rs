//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from JSON or YAML files.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Port used when the config leaves `port` unset or zero.
pub const DEFAULT_PORT: u16 = 8080;

/// Health check timeout used when the config leaves it unset or zero.
pub const DEFAULT_HEALTH_CHECK_TIMEOUT_SECS: u64 = 3;

/// Root configuration for the proxy.
///
/// Loaded once at startup and never mutated afterwards.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProxyConfig {
    /// Listen port. Zero means "use the default".
    #[serde(default)]
    pub port: u16,

    /// The single upstream every authorized request goes to.
    pub backend: BackendConfig,

    /// Username to one-way password hash (bcrypt).
    #[serde(default)]
    pub users: HashMap<String, String>,
}

impl ProxyConfig {
    /// Build a config for `target` with defaults applied and no users.
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            port: DEFAULT_PORT,
            backend: BackendConfig::new(target),
            users: HashMap::new(),
        }
    }

    /// Fill in defaults for fields the file left empty.
    pub fn apply_defaults(&mut self) {
        if self.port == 0 {
            self.port = DEFAULT_PORT;
        }
        if self.backend.health_check_timeout_in_second == 0 {
            self.backend.health_check_timeout_in_second = DEFAULT_HEALTH_CHECK_TIMEOUT_SECS;
        }
    }
}

/// Upstream definition.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendConfig {
    /// Absolute URL of the upstream (e.g. "http://127.0.0.1:3000/api").
    pub target: String,

    /// Sub-path probed by `/-/ready`. Empty disables the probe.
    #[serde(default)]
    pub readiness: String,

    /// Sub-path probed by `/-/healthy`. Empty disables the probe.
    #[serde(default)]
    pub liveness: String,

    /// Deadline for a single probe call, in seconds.
    #[serde(default, alias = "healthCheckTimeoutSeconds")]
    pub health_check_timeout_in_second: u64,

    /// Deadline for upstream response headers on forwarded requests, in
    /// seconds. Zero leaves forwarded requests unbounded.
    #[serde(default)]
    pub request_timeout_in_second: u64,
}

impl BackendConfig {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            readiness: String::new(),
            liveness: String::new(),
            health_check_timeout_in_second: DEFAULT_HEALTH_CHECK_TIMEOUT_SECS,
            request_timeout_in_second: 0,
        }
    }

    /// Probe deadline, falling back to the default when unset.
    pub fn health_check_timeout(&self) -> Duration {
        match self.health_check_timeout_in_second {
            0 => Duration::from_secs(DEFAULT_HEALTH_CHECK_TIMEOUT_SECS),
            secs => Duration::from_secs(secs),
        }
    }

    /// Forwarding deadline, if one is configured.
    pub fn request_timeout(&self) -> Option<Duration> {
        match self.request_timeout_in_second {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }
}
