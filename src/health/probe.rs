//! Health probe relay.
//!
//! # Responsibilities
//! - Translate `/-/ready` and `/-/healthy` into a GET against the upstream's
//!   readiness/liveness sub-path
//! - Bound every probe call by the configured timeout
//! - Follow redirects and judge the final response
//! - Reduce the outcome to up/down
//!
//! # Design Decisions
//! - Stateless: nothing is cached between probes
//! - Fail fast: a single failed attempt is reported immediately, no retries
//! - An empty sub-path disables the probe without contacting the upstream
//! - The timeout covers the whole redirect chain

use std::time::Duration;

use axum::{
    body::Body,
    http::{header, Method, Request, Response, StatusCode, Uri},
};
use thiserror::Error;
use tokio::time;
use url::Url;

use crate::config::BackendConfig;
use crate::http::client::UpstreamClient;

const PROBE_USER_AGENT: &str = "basic-auth-proxy-health-check";

/// Redirect responses accepted before a probe gives up.
const MAX_REDIRECTS: usize = 10;

/// Which upstream check a probe route maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeKind {
    Readiness,
    Liveness,
}

impl ProbeKind {
    /// Resolve a request path under the probe prefix.
    pub fn from_path(path: &str) -> Option<Self> {
        match path {
            "/-/ready" => Some(ProbeKind::Readiness),
            "/-/healthy" => Some(ProbeKind::Liveness),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProbeKind::Readiness => "readiness",
            ProbeKind::Liveness => "liveness",
        }
    }
}

/// Successful probe outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeStatus {
    /// No sub-path configured; the upstream was not contacted.
    Disabled,
    /// Upstream answered `200 OK`.
    Healthy,
}

/// Why a probe reports the upstream as down.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("cannot build probe request for {url}: {reason}")]
    Construction { url: String, reason: String },

    #[error("upstream unreachable: {0}")]
    Unreachable(#[source] hyper_util::client::legacy::Error),

    #[error("upstream did not answer within {0:?}")]
    Timeout(Duration),

    #[error("upstream answered {0}")]
    NonOk(StatusCode),

    #[error("bad redirect to {location:?}: {reason}")]
    Redirect { location: String, reason: String },

    #[error("stopped after {0} redirects")]
    TooManyRedirects(usize),
}

impl ProbeError {
    /// Status returned to the orchestrator for this failure.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ProbeError::Construction { .. } => StatusCode::BAD_GATEWAY,
            _ => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

/// Relays readiness and liveness checks to the upstream.
pub struct HealthProbe {
    upstream: Url,
    readiness: String,
    liveness: String,
    timeout: Duration,
    client: UpstreamClient,
}

impl HealthProbe {
    pub fn new(upstream: Url, backend: &BackendConfig, client: UpstreamClient) -> Self {
        Self {
            upstream,
            readiness: backend.readiness.clone(),
            liveness: backend.liveness.clone(),
            timeout: backend.health_check_timeout(),
            client,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Absolute URL probed for `kind`, or `None` when that probe is disabled.
    pub fn probe_url(&self, kind: ProbeKind) -> Option<Url> {
        let sub_path = match kind {
            ProbeKind::Readiness => &self.readiness,
            ProbeKind::Liveness => &self.liveness,
        };
        if sub_path.is_empty() {
            return None;
        }
        Some(join_path(&self.upstream, sub_path))
    }

    /// Run one probe against the upstream.
    pub async fn check(&self, kind: ProbeKind) -> Result<ProbeStatus, ProbeError> {
        let Some(url) = self.probe_url(kind) else {
            return Ok(ProbeStatus::Disabled);
        };

        match time::timeout(self.timeout, self.final_status(url)).await {
            Ok(Ok(StatusCode::OK)) => Ok(ProbeStatus::Healthy),
            Ok(Ok(status)) => Err(ProbeError::NonOk(status)),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(ProbeError::Timeout(self.timeout)),
        }
    }

    /// GET `url`, following redirects, and return the status of the last
    /// response.
    async fn final_status(&self, mut url: Url) -> Result<StatusCode, ProbeError> {
        let mut request = probe_request(&url).map_err(|reason| ProbeError::Construction {
            url: url.to_string(),
            reason,
        })?;

        for _ in 0..MAX_REDIRECTS {
            // Response bodies are dropped unread.
            let response = self
                .client
                .request(request)
                .await
                .map_err(ProbeError::Unreachable)?;

            let Some(location) = redirect_location(&response) else {
                return Ok(response.status());
            };

            let bad_redirect = |reason: String| ProbeError::Redirect {
                location: location.clone(),
                reason,
            };
            url = url.join(&location).map_err(|e| bad_redirect(e.to_string()))?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(bad_redirect(format!("unsupported scheme {:?}", url.scheme())));
            }
            tracing::debug!(to = %url, "Following probe redirect");
            request = probe_request(&url).map_err(bad_redirect)?;
        }

        Err(ProbeError::TooManyRedirects(MAX_REDIRECTS))
    }
}

fn probe_request(url: &Url) -> Result<Request<Body>, String> {
    let uri = Uri::try_from(url.as_str()).map_err(|e| e.to_string())?;
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .header(header::USER_AGENT, PROBE_USER_AGENT)
        .body(Body::empty())
        .map_err(|e| e.to_string())
}

/// `Location` of a response that asks to be followed.
fn redirect_location<B>(response: &Response<B>) -> Option<String> {
    match response.status() {
        StatusCode::MOVED_PERMANENTLY
        | StatusCode::FOUND
        | StatusCode::SEE_OTHER
        | StatusCode::TEMPORARY_REDIRECT
        | StatusCode::PERMANENT_REDIRECT => response
            .headers()
            .get(header::LOCATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string),
        _ => None,
    }
}

/// Append `sub_path` to the path of `base` as clean segments.
///
/// Empty and `.` segments are dropped, `..` removes the previous segment, and
/// a trailing slash on `sub_path` is kept. Query and fragment of `base` are
/// preserved.
pub fn join_path(base: &Url, sub_path: &str) -> Url {
    let mut segments: Vec<&str> = Vec::new();
    for segment in base.path().split('/').chain(sub_path.split('/')) {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            segment => segments.push(segment),
        }
    }

    let mut path = format!("/{}", segments.join("/"));
    if sub_path.ends_with('/') && !path.ends_with('/') {
        path.push('/');
    }

    let mut url = base.clone();
    url.set_path(&path);
    url
}
