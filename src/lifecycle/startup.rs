//! Startup orchestration.
//!
//! # Responsibilities
//! - Load configuration
//! - Compile the upstream URL and build the HTTP server
//! - Bind the listener on `0.0.0.0:{port}`
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - The listener is bound last, once everything else is ready

use std::net::SocketAddr;
use std::path::Path;

use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::{load_config, ConfigError};
use crate::http::{HttpServer, ServerError};

/// Fatal startup failure.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to parse config: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to resolve backend: {0}")]
    Upstream(#[from] ServerError),

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
}

/// A server ready to accept traffic.
pub struct Startup {
    pub server: HttpServer,
    pub listener: TcpListener,
}

/// Load the config at `config_path`, build the server and bind its port.
pub async fn bootstrap(config_path: &Path) -> Result<Startup, StartupError> {
    tracing::info!(path = %config_path.display(), "parse config");
    let config = load_config(config_path)?;

    tracing::info!(
        target_url = %config.backend.target,
        port = config.port,
        users = config.users.len(),
        "Configuration loaded"
    );

    let server = HttpServer::new(config)?;

    let addr = SocketAddr::from(([0, 0, 0, 0], server.config().port));
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| StartupError::Bind { addr, source })?;

    tracing::info!(
        server = %server.upstream(),
        port = server.config().port,
        "proxying"
    );

    Ok(Startup { server, listener })
}
