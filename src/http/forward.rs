//! Authenticated forwarding.
//!
//! Every request that is not a health probe passes through here: Basic
//! credentials are checked first, and only authorized requests reach the
//! reverse proxy. Failed authentication never forwards anything upstream.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, HeaderMap, Request},
    response::Response,
};

use crate::auth::{BasicCredentials, CredentialStore};
use crate::http::proxy::ReverseProxy;
use crate::http::response;

/// Gate in front of the reverse proxy.
pub struct AuthenticatedForwarder {
    credentials: Arc<CredentialStore>,
    proxy: ReverseProxy,
}

impl AuthenticatedForwarder {
    pub fn new(credentials: Arc<CredentialStore>, proxy: ReverseProxy) -> Self {
        Self { credentials, proxy }
    }

    /// Authenticate and forward `request`, or answer `401`.
    pub async fn handle(&self, request: Request<Body>, client_addr: Option<SocketAddr>) -> Response {
        let Some(user) = self.authenticate(request.headers()).await else {
            return response::unauthorized();
        };

        let path = request.uri().path().to_string();
        let host = request
            .headers()
            .get(header::HOST)
            .and_then(|v| v.to_str().ok())
            .or_else(|| request.uri().host())
            .unwrap_or_default()
            .to_string();

        tracing::info!(user = %user, host = %host, path = %path, "New request");

        match self.proxy.forward(request, client_addr).await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(
                    user = %user,
                    path = %path,
                    upstream = %self.proxy.target(),
                    error = %e,
                    "Upstream request failed"
                );
                response::gateway_error(e.status_code())
            }
        }
    }

    /// Returns the username when the request carries valid Basic credentials.
    ///
    /// The bcrypt comparison runs on the blocking pool.
    pub async fn authenticate(&self, headers: &HeaderMap) -> Option<String> {
        let credentials = BasicCredentials::from_headers(headers)?;
        let store = Arc::clone(&self.credentials);

        let verified = tokio::task::spawn_blocking(move || {
            store
                .verify(&credentials.username, &credentials.password)
                .then(|| credentials.display_username())
        })
        .await;

        match verified {
            Ok(user) => user,
            Err(e) => {
                tracing::error!(error = %e, "Credential check aborted");
                None
            }
        }
    }
}
