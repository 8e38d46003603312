//! Single-target reverse proxy.
//!
//! # Responsibilities
//! - Rewrite the request URI onto the upstream (path joined, query merged)
//! - Set `Host` to the upstream authority
//! - Strip hop-by-hop headers in both directions
//! - Append the client address to `X-Forwarded-For`
//! - Stream request and response bodies without buffering
//! - Splice both connections after a `101 Switching Protocols`
//!
//! # Design Decisions
//! - Method, body and end-to-end headers pass through untouched
//! - Requests are always sent upstream as HTTP/1.1
//! - No retries; a transport error is reported to the caller once
//! - `Upgrade` survives hop-by-hop stripping only when `Connection` asks for it

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use axum::{
    body::Body,
    http::{
        header::{self, HeaderName},
        HeaderMap, HeaderValue, Request, Response, StatusCode, Uri, Version,
    },
};
use hyper::{body::Incoming, upgrade::OnUpgrade};
use hyper_util::rt::TokioIo;
use thiserror::Error;
use tokio::time;
use url::Url;

use crate::http::client::UpstreamClient;

static X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");

/// Headers that describe a single connection and must not be forwarded.
const HOP_BY_HOP_HEADERS: [&str; 9] = [
    "connection",
    "proxy-connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// Errors raised while forwarding a request upstream.
#[derive(Debug, Error)]
pub enum ForwardError {
    #[error("failed to build upstream URI: {0}")]
    InvalidUri(#[from] axum::http::uri::InvalidUri),

    #[error("invalid upstream host header: {0}")]
    InvalidHost(#[from] axum::http::header::InvalidHeaderValue),

    #[error("upstream request failed: {0}")]
    Upstream(#[from] hyper_util::client::legacy::Error),

    #[error("upstream did not respond within {0:?}")]
    Timeout(Duration),

    #[error("upstream switched to protocol {offered:?} when {requested:?} was requested")]
    UpgradeMismatch { requested: String, offered: String },
}

impl ForwardError {
    /// Status returned to the client for this failure.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ForwardError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            _ => StatusCode::BAD_GATEWAY,
        }
    }
}

/// Reverse proxy bound once to a single upstream.
#[derive(Clone)]
pub struct ReverseProxy {
    target: Url,
    authority: String,
    client: UpstreamClient,
    timeout: Option<Duration>,
}

impl ReverseProxy {
    /// `authority` is sent as `Host`, see [`upstream_authority`].
    ///
    /// `timeout` bounds the wait for upstream response headers; `None` waits
    /// as long as the upstream and client keep the exchange open.
    pub fn new(
        target: Url,
        authority: String,
        client: UpstreamClient,
        timeout: Option<Duration>,
    ) -> Self {
        Self {
            target,
            authority,
            client,
            timeout,
        }
    }

    pub fn target(&self) -> &Url {
        &self.target
    }

    /// Upstream `host[:port]`, as sent in the `Host` header.
    pub fn authority(&self) -> &str {
        &self.authority
    }

    /// Forward `request` and relay the upstream response.
    pub async fn forward(
        &self,
        mut request: Request<Body>,
        client_addr: Option<SocketAddr>,
    ) -> Result<Response<Body>, ForwardError> {
        let upgrade = requested_upgrade(request.headers());
        let client_upgrade = upgrade.as_ref().map(|_| hyper::upgrade::on(&mut request));
        let (mut parts, body) = request.into_parts();

        parts.uri = self.upstream_uri(&parts.uri)?;
        parts.version = Version::HTTP_11;
        remove_hop_by_hop_headers(&mut parts.headers);
        if let Some(protocol) = &upgrade {
            parts
                .headers
                .insert(header::CONNECTION, HeaderValue::from_static("upgrade"));
            parts.headers.insert(header::UPGRADE, protocol.clone());
        }
        if let Some(addr) = client_addr {
            append_forwarded_for(&mut parts.headers, addr.ip());
        }
        parts
            .headers
            .insert(header::HOST, HeaderValue::from_str(&self.authority)?);

        let pending = self.client.request(Request::from_parts(parts, body));
        let response: Response<Incoming> = match self.timeout {
            Some(limit) => time::timeout(limit, pending)
                .await
                .map_err(|_| ForwardError::Timeout(limit))??,
            None => pending.await?,
        };

        if response.status() == StatusCode::SWITCHING_PROTOCOLS {
            return switch_protocols(response, upgrade, client_upgrade);
        }

        let (mut parts, body) = response.into_parts();
        remove_hop_by_hop_headers(&mut parts.headers);
        Ok(Response::from_parts(parts, Body::new(body)))
    }

    /// Map an inbound request URI onto the upstream.
    pub fn upstream_uri(&self, original: &Uri) -> Result<Uri, ForwardError> {
        let path = join_url_path(self.target.path(), original.path());
        let query = match (self.target.query().unwrap_or(""), original.query().unwrap_or("")) {
            ("", query) | (query, "") => query.to_string(),
            (base, extra) => format!("{}&{}", base, extra),
        };

        let mut uri = format!("{}://{}{}", self.target.scheme(), self.authority, path);
        if !query.is_empty() {
            uri.push('?');
            uri.push_str(&query);
        }

        Ok(Uri::try_from(uri)?)
    }
}

/// `host[:port]` of the upstream exactly as written in `target`.
///
/// An explicit default port stays in place. Falls back to `url` when `target`
/// is not a valid URI.
pub fn upstream_authority(target: &str, url: &Url) -> String {
    let written = target.parse::<Uri>().ok().and_then(|uri| {
        uri.authority()
            .and_then(|authority| authority.as_str().rsplit('@').next())
            .map(str::to_string)
    });

    match written {
        Some(authority) if !authority.is_empty() => authority,
        _ => match (url.host_str(), url.port()) {
            (Some(host), Some(port)) => format!("{}:{}", host, port),
            (Some(host), None) => host.to_string(),
            (None, _) => String::new(),
        },
    }
}

/// Protocol named in `Upgrade`, if `Connection` asks for an upgrade.
pub fn requested_upgrade(headers: &HeaderMap) -> Option<HeaderValue> {
    let wants_upgrade = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .any(|token| token.trim().eq_ignore_ascii_case("upgrade"));

    if wants_upgrade {
        headers.get(header::UPGRADE).cloned()
    } else {
        None
    }
}

/// Relay a `101` to the client and join both connections once each side has
/// switched.
fn switch_protocols(
    mut response: Response<Incoming>,
    requested: Option<HeaderValue>,
    client_upgrade: Option<OnUpgrade>,
) -> Result<Response<Body>, ForwardError> {
    let offered = response.headers().get(header::UPGRADE);
    let client_upgrade = match (&requested, offered, client_upgrade) {
        (Some(requested), Some(offered), Some(client_upgrade))
            if offered.as_bytes().eq_ignore_ascii_case(requested.as_bytes()) =>
        {
            client_upgrade
        }
        _ => {
            let lossy = |value: Option<&HeaderValue>| {
                value
                    .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned())
                    .unwrap_or_default()
            };
            return Err(ForwardError::UpgradeMismatch {
                requested: lossy(requested.as_ref()),
                offered: lossy(offered),
            });
        }
    };

    let upstream_upgrade = hyper::upgrade::on(&mut response);
    tokio::spawn(splice(client_upgrade, upstream_upgrade));

    let (parts, _) = response.into_parts();
    Ok(Response::from_parts(parts, Body::empty()))
}

async fn splice(client: OnUpgrade, upstream: OnUpgrade) {
    let (client, upstream) = match tokio::try_join!(client, upstream) {
        Ok(pair) => pair,
        Err(e) => {
            tracing::warn!(error = %e, "Protocol upgrade failed");
            return;
        }
    };

    let mut client = TokioIo::new(client);
    let mut upstream = TokioIo::new(upstream);
    match tokio::io::copy_bidirectional(&mut client, &mut upstream).await {
        Ok((sent, received)) => {
            tracing::debug!(sent, received, "Upgraded connection closed")
        }
        Err(e) => tracing::debug!(error = %e, "Upgraded connection ended"),
    }
}

/// Join two URL paths with exactly one slash between them.
pub fn join_url_path(base: &str, path: &str) -> String {
    match (base.ends_with('/'), path.starts_with('/')) {
        (true, true) => format!("{}{}", base, &path[1..]),
        (false, false) => format!("{}/{}", base, path),
        _ => format!("{}{}", base, path),
    }
}

/// Remove hop-by-hop headers, including any named in `Connection`.
pub fn remove_hop_by_hop_headers(headers: &mut HeaderMap) {
    let listed: Vec<HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();

    // "TE: trailers" is the one TE value that may travel end to end.
    let keeps_trailers = headers
        .get_all(header::TE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .any(|value| value.trim().eq_ignore_ascii_case("trailers"));

    for name in listed {
        headers.remove(name);
    }
    for name in HOP_BY_HOP_HEADERS {
        headers.remove(name);
    }

    if keeps_trailers {
        headers.insert(header::TE, HeaderValue::from_static("trailers"));
    }
}

/// Append `ip` to any `X-Forwarded-For` chain already on the request.
pub fn append_forwarded_for(headers: &mut HeaderMap, ip: IpAddr) {
    let prior: Vec<&str> = headers
        .get_all(&X_FORWARDED_FOR)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .collect();

    let chain = if prior.is_empty() {
        ip.to_string()
    } else {
        format!("{}, {}", prior.join(", "), ip)
    };

    if let Ok(value) = HeaderValue::from_str(&chain) {
        headers.insert(X_FORWARDED_FOR.clone(), value);
    }
}
