//! Authentication subsystem.
//!
//! # Data Flow
//! ```text
//! Authorization header
//!     → basic.rs (decode "Basic base64(user:pass)")
//!     → credentials.rs (bcrypt comparison against the user table)
//!     → authorized / unauthorized
//! ```
//!
//! # Design Decisions
//! - The user table is immutable after load; no runtime credential changes
//! - Passwords are never logged, only usernames of authenticated requests

pub mod basic;
pub mod credentials;

pub use basic::BasicCredentials;
pub use credentials::{
    verify_user_pass, BcryptVerifier, CredentialStore, PasswordVerifier, DUMMY_PASSWORD_HASH,
};
