//! Credential verification against the configured user table.
//!
//! # Design Decisions
//! - Unknown usernames are compared against a fixed dummy hash so that every
//!   call pays for one full hash comparison; response latency must not reveal
//!   whether a username exists
//! - The dummy path never reports success, whatever password is supplied
//! - Hash comparison sits behind [`PasswordVerifier`] so the lookup logic can
//!   be tested without bcrypt

use std::collections::HashMap;

/// bcrypt hash (cost 10) of "fakepassword", compared on the unknown-user path.
pub const DUMMY_PASSWORD_HASH: &str =
    "$2y$10$QOauhQNbBCuQDKes6eFzPeMqBSjb7Mr5DUmpZ/VcEd00UAV/LDeSi";

/// One-way, salted comparison of a plaintext password against a stored hash.
pub trait PasswordVerifier: Send + Sync {
    /// Returns true only when `password` matches `hash`. Malformed hashes
    /// compare as a mismatch.
    fn verify(&self, password: &[u8], hash: &str) -> bool;
}

/// bcrypt-backed verifier, accepting `$2a$`, `$2b$`, `$2x$` and `$2y$` hashes.
#[derive(Debug, Clone, Copy, Default)]
pub struct BcryptVerifier;

impl PasswordVerifier for BcryptVerifier {
    fn verify(&self, password: &[u8], hash: &str) -> bool {
        match bcrypt::verify(password, hash) {
            Ok(matched) => matched,
            Err(e) => {
                tracing::warn!(error = %e, "Stored password hash could not be compared");
                false
            }
        }
    }
}

/// Immutable username → password hash table.
pub struct CredentialStore<V = BcryptVerifier> {
    users: HashMap<String, String>,
    verifier: V,
}

impl CredentialStore<BcryptVerifier> {
    pub fn new(users: HashMap<String, String>) -> Self {
        Self::with_verifier(users, BcryptVerifier)
    }
}

impl<V: PasswordVerifier> CredentialStore<V> {
    pub fn with_verifier(users: HashMap<String, String>, verifier: V) -> Self {
        Self { users, verifier }
    }

    /// Check `password` for `username`.
    ///
    /// Both are raw bytes as sent by the client; a username that is not UTF-8
    /// never names a configured user. Always performs exactly one hash
    /// comparison.
    pub fn verify(&self, username: impl AsRef<[u8]>, password: impl AsRef<[u8]>) -> bool {
        compare(&self.users, &self.verifier, username.as_ref(), password.as_ref())
    }
}

impl<V> std::fmt::Debug for CredentialStore<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialStore")
            .field("users", &self.users.len())
            .finish()
    }
}

/// Verify `username`/`password` against `users` using bcrypt.
pub fn verify_user_pass(users: &HashMap<String, String>, username: &str, password: &str) -> bool {
    compare(users, &BcryptVerifier, username.as_bytes(), password.as_bytes())
}

fn compare<V: PasswordVerifier>(
    users: &HashMap<String, String>,
    verifier: &V,
    username: &[u8],
    password: &[u8],
) -> bool {
    let stored = std::str::from_utf8(username)
        .ok()
        .and_then(|username| users.get(username));
    let (hash, known_user) = match stored {
        Some(hash) => (hash.as_str(), true),
        None => (DUMMY_PASSWORD_HASH, false),
    };

    // Compare first: the unknown-user path must cost the same as a real check.
    verifier.verify(password, hash) && known_user
}
