//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (JSON/YAML, chosen by extension)
//!     → loader.rs (read, decode, apply defaults)
//!     → ProxyConfig (immutable for the process lifetime)
//!     → validation.rs (compile backend.target into a Url)
//!     → shared via Arc to every handler
//! ```
//!
//! # Design Decisions
//! - Config is loaded exactly once; there is no reload path
//! - Optional fields default to zero values; defaults are applied after decoding
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError, ConfigFormat};
pub use schema::{BackendConfig, ProxyConfig};
pub use validation::{validate_target, ValidationError};
