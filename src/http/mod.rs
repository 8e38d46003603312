//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum router, dispatch by path)
//!     ├─ /-/ready, /-/healthy → health::probe (no auth)
//!     └─ everything else      → forward.rs (Basic auth gate)
//!                                → proxy.rs (rewrite, stream to upstream)
//!     → response.rs (locally generated errors)
//!     → Send to client
//! ```

pub mod client;
pub mod forward;
pub mod proxy;
pub mod response;
pub mod server;

pub use client::{upstream_client, UpstreamClient};
pub use forward::AuthenticatedForwarder;
pub use proxy::{ForwardError, ReverseProxy};
pub use server::{AppState, HttpServer, ServerError};
