//! Shared outbound HTTP client.

use axum::body::Body;
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};

/// Pooled client used for forwarding and health probes; speaks plain HTTP and
/// HTTPS.
pub type UpstreamClient = Client<HttpsConnector<HttpConnector>, Body>;

/// Build the client once at startup; clones share the connection pool.
///
/// Upstream certificates are checked against the bundled webpki roots.
/// Only HTTP/1.1 is negotiated so protocol upgrades keep working over TLS.
pub fn upstream_client() -> Result<UpstreamClient, rustls::Error> {
    let connector = HttpsConnectorBuilder::new()
        .with_provider_and_webpki_roots(rustls::crypto::ring::default_provider())?
        .https_or_http()
        .enable_http1()
        .build();

    Ok(Client::builder(TokioExecutor::new()).build(connector))
}
