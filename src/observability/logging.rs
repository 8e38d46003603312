//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber once at process start
//! - Apply the log filter given on the command line

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when the requested one does not parse.
pub const DEFAULT_FILTER: &str = "info";

/// Install the global subscriber with `filter` (e.g. "info" or
/// "basic_auth_proxy=debug,tower_http=debug").
pub fn init_logging(filter: &str) {
    let (env_filter, rejected) = match EnvFilter::try_new(filter) {
        Ok(env_filter) => (env_filter, None),
        Err(e) => (EnvFilter::new(DEFAULT_FILTER), Some(e)),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Some(e) = rejected {
        tracing::warn!(filter = %filter, error = %e, "Invalid log filter, using default");
    }
}
