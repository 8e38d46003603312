//! Basic-auth reverse proxy library.
//!
//! Accepts HTTP requests, checks Basic credentials against a table of bcrypt
//! hashes and forwards authorized requests to a single upstream. Two
//! unauthenticated routes, `/-/ready` and `/-/healthy`, relay readiness and
//! liveness checks to the upstream.

// Core subsystems
pub mod auth;
pub mod config;
pub mod health;
pub mod http;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub use config::schema::ProxyConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
