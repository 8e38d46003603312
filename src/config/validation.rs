//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Compile `backend.target` into the upstream URL used for forwarding and probes
//!
//! # Design Decisions
//! - Validation is a pure function: &str → Result<Url, ValidationError>
//! - Runs before the listener is bound; any failure is fatal at startup

use thiserror::Error;
use url::Url;

/// Upstream URL rejected at startup.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("backend target {target:?} is not an absolute URL: {source}")]
    InvalidTarget {
        target: String,
        #[source]
        source: url::ParseError,
    },

    #[error("backend target {0:?} has no host")]
    MissingHost(String),

    #[error("backend target {target:?} uses unsupported scheme {scheme:?} (expected http or https)")]
    UnsupportedScheme { target: String, scheme: String },
}

/// Parse and check the upstream target.
pub fn validate_target(target: &str) -> Result<Url, ValidationError> {
    let url = Url::parse(target).map_err(|source| ValidationError::InvalidTarget {
        target: target.to_string(),
        source,
    })?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ValidationError::UnsupportedScheme {
            target: target.to_string(),
            scheme: url.scheme().to_string(),
        });
    }

    match url.host_str() {
        Some(host) if !host.is_empty() => Ok(url),
        _ => Err(ValidationError::MissingHost(target.to_string())),
    }
}
