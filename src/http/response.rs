//! Locally generated responses.
//!
//! # Responsibilities
//! - Plain status-text error bodies (`401`, `503`, ...)
//! - The Basic challenge sent with `401`
//! - Gateway errors for failed forwarding
//!
//! # Design Decisions
//! - Upstream responses are never rewritten here; only responses the proxy
//!   produces itself
//! - Gateway errors carry no body, matching a conventional reverse proxy

use axum::{
    body::Body,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};

/// `status` with its canonical reason phrase as a `text/plain` body.
pub fn status_text(status: StatusCode) -> Response {
    let body = format!("{}\n", status.canonical_reason().unwrap_or_default());
    (
        status,
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8"),
            (header::X_CONTENT_TYPE_OPTIONS, "nosniff"),
        ],
        body,
    )
        .into_response()
}

/// `401 Unauthorized` with a `WWW-Authenticate: Basic` challenge.
pub fn unauthorized() -> Response {
    let mut response = status_text(StatusCode::UNAUTHORIZED);
    response
        .headers_mut()
        .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Basic"));
    response
}

/// Empty-bodied gateway error for a failed forward.
pub fn gateway_error(status: StatusCode) -> Response {
    Response::builder()
        .status(status)
        .body(Body::empty())
        .unwrap_or_else(|_| status.into_response())
}
