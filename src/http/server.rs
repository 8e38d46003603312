//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (tracing)
//! - Dispatch probe paths to the health relay, everything else to the
//!   authenticated forwarder
//! - Serve on a bound listener until shutdown is broadcast

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use url::Url;

use crate::auth::CredentialStore;
use crate::config::{validate_target, ProxyConfig, ValidationError};
use crate::health::{HealthProbe, ProbeKind};
use crate::http::client::upstream_client;
use crate::http::forward::AuthenticatedForwarder;
use crate::http::proxy::{upstream_authority, ReverseProxy};
use crate::http::response;

/// Why the server could not be built from a config.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Upstream(#[from] ValidationError),

    #[error("cannot set up upstream TLS: {0}")]
    Tls(#[from] rustls::Error),
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub probe: Arc<HealthProbe>,
    pub forwarder: Arc<AuthenticatedForwarder>,
}

/// HTTP server for the proxy.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
    upstream: Url,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    ///
    /// Fails when `backend.target` is not a usable upstream URL.
    pub fn new(config: ProxyConfig) -> Result<Self, ServerError> {
        let upstream = validate_target(&config.backend.target)?;
        let client = upstream_client()?;

        let credentials = Arc::new(CredentialStore::new(config.users.clone()));
        let proxy = ReverseProxy::new(
            upstream.clone(),
            upstream_authority(&config.backend.target, &upstream),
            client.clone(),
            config.backend.request_timeout(),
        );

        let state = AppState {
            probe: Arc::new(HealthProbe::new(upstream.clone(), &config.backend, client)),
            forwarder: Arc::new(AuthenticatedForwarder::new(credentials, proxy)),
        };

        let router = Self::build_router(state);
        Ok(Self {
            router,
            config,
            upstream,
        })
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// Only GET (and HEAD) under `/-/` reach the probe handlers; other
    /// methods there fall through to the forwarder like any other path.
    fn build_router(state: AppState) -> Router {
        Router::new()
            .route("/-/ready", get(readiness_handler).fallback(forward_handler))
            .route("/-/healthy", get(liveness_handler).fallback(forward_handler))
            .route("/-/", get(unknown_probe_handler).fallback(forward_handler))
            .route("/-/{*rest}", get(unknown_probe_handler).fallback(forward_handler))
            .fallback(forward_handler)
            .with_state(state)
            .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
    }

    /// Router clone, for driving the server without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            upstream = %self.upstream,
            "HTTP server starting"
        );

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Stopping, draining in-flight requests");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }

    /// The compiled upstream URL.
    pub fn upstream(&self) -> &Url {
        &self.upstream
    }
}

async fn readiness_handler(State(state): State<AppState>) -> Response {
    probe_response(&state, ProbeKind::Readiness).await
}

async fn liveness_handler(State(state): State<AppState>) -> Response {
    probe_response(&state, ProbeKind::Liveness).await
}

/// Unknown paths under the probe prefix answer with an empty success.
async fn unknown_probe_handler() -> StatusCode {
    StatusCode::OK
}

async fn probe_response(state: &AppState, kind: ProbeKind) -> Response {
    match state.probe.check(kind).await {
        Ok(_) => StatusCode::OK.into_response(),
        Err(e) => {
            tracing::warn!(probe = kind.as_str(), error = %e, "Upstream health probe failed");
            response::status_text(e.status_code())
        }
    }
}

/// Main proxy handler.
async fn forward_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let client_addr = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);

    state.forwarder.handle(request, client_addr).await
}
