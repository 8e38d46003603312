//! HTTP Basic credential extraction.
//!
//! The decoded username and password are kept as raw bytes; nothing requires
//! them to be UTF-8.

use std::fmt;

use axum::http::{header, HeaderMap};
use base64::engine::general_purpose;
use base64::Engine;

const BASIC_PREFIX: &str = "Basic ";

/// Username and password taken from an `Authorization: Basic` header.
#[derive(Clone, PartialEq, Eq)]
pub struct BasicCredentials {
    pub username: Vec<u8>,
    pub password: Vec<u8>,
}

impl BasicCredentials {
    /// Extract credentials from request headers.
    ///
    /// Returns `None` when the header is missing, uses another scheme, is not
    /// valid base64, or lacks the `user:password` separator.
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
        Self::parse(value)
    }

    /// Parse a raw `Authorization` header value. The scheme is case-insensitive.
    pub fn parse(value: &str) -> Option<Self> {
        if value.len() < BASIC_PREFIX.len()
            || !value.is_char_boundary(BASIC_PREFIX.len())
            || !value[..BASIC_PREFIX.len()].eq_ignore_ascii_case(BASIC_PREFIX)
        {
            return None;
        }

        let decoded = general_purpose::STANDARD
            .decode(&value[BASIC_PREFIX.len()..])
            .ok()?;
        let separator = decoded.iter().position(|&b| b == b':')?;

        Some(Self {
            username: decoded[..separator].to_vec(),
            password: decoded[separator + 1..].to_vec(),
        })
    }

    /// Username for log output; invalid UTF-8 is replaced.
    pub fn display_username(&self) -> String {
        String::from_utf8_lossy(&self.username).into_owned()
    }
}

impl fmt::Debug for BasicCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicCredentials")
            .field("username", &self.display_username())
            .field("password", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn encode(raw: impl AsRef<[u8]>) -> String {
        format!("Basic {}", general_purpose::STANDARD.encode(raw))
    }

    #[test]
    fn test_parse_valid() {
        let creds = BasicCredentials::parse(&encode("alice:s3cret")).unwrap();
        assert_eq!(creds.username, b"alice");
        assert_eq!(creds.password, b"s3cret");
    }

    #[test]
    fn test_password_may_contain_colon() {
        let creds = BasicCredentials::parse(&encode("alice:a:b:c")).unwrap();
        assert_eq!(creds.username, b"alice");
        assert_eq!(creds.password, b"a:b:c");
    }

    #[test]
    fn test_empty_password() {
        let creds = BasicCredentials::parse(&encode("alice:")).unwrap();
        assert!(creds.password.is_empty());
    }

    #[test]
    fn test_scheme_case_insensitive() {
        let value = format!("bAsIc {}", general_purpose::STANDARD.encode("alice:pw"));
        assert!(BasicCredentials::parse(&value).is_some());
    }

    #[test]
    fn test_rejects_malformed() {
        assert!(BasicCredentials::parse("Bearer abc").is_none());
        assert!(BasicCredentials::parse("Basic").is_none());
        assert!(BasicCredentials::parse("Basic !!!not-base64!!!").is_none());
        assert!(BasicCredentials::parse(&encode("no-separator")).is_none());
        assert!(BasicCredentials::parse("").is_none());
        assert!(BasicCredentials::parse("Básico").is_none());
    }

    #[test]
    fn test_from_headers() {
        let mut headers = HeaderMap::new();
        assert!(BasicCredentials::from_headers(&headers).is_none());

        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(&encode("bob:hunter2")).unwrap(),
        );
        let creds = BasicCredentials::from_headers(&headers).unwrap();
        assert_eq!(creds.username, b"bob");
    }

    #[test]
    fn test_non_utf8_kept_as_bytes() {
        let creds = BasicCredentials::parse(&encode(b"j\xf6rg:p\xe4ss")).unwrap();
        assert_eq!(creds.username, b"j\xf6rg");
        assert_eq!(creds.password, b"p\xe4ss");
        assert_eq!(creds.display_username(), "j\u{fffd}rg");
    }

    #[test]
    fn test_debug_redacts_password() {
        let creds = BasicCredentials::parse(&encode("bob:hunter2")).unwrap();
        let rendered = format!("{:?}", creds);
        assert!(rendered.contains("bob"));
        assert!(!rendered.contains("hunter2"));
    }
}
