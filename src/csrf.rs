//! Double-submit CSRF tokens: one copy in a cookie, one in a hidden form field.

use std::fmt;

use axum::http::header::COOKIE;
use axum::http::HeaderMap;
use uuid::Uuid;

/// Cookie carrying the per-browser token.
pub const COOKIE_NAME: &str = "churnform_csrf";
/// Hidden form field echoing the token.
pub const FIELD_NAME: &str = "csrf_token";

const MAX_TOKEN_LEN: usize = 64;

/// Generates a fresh random token.
pub fn new_token() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Extracts a well-formed token from the request's `Cookie` headers.
pub fn cookie_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == COOKIE_NAME)
        .map(|(_, token)| token.trim())
        .filter(|token| is_well_formed(token))
        .map(str::to_string)
}

/// `Set-Cookie` header value that stores `token`.
pub fn set_cookie(token: &str) -> String {
    format!("{COOKIE_NAME}={token}; Path=/; HttpOnly; SameSite=Strict")
}

/// Why a submission failed the CSRF check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CsrfFailure {
    /// The form carried no token.
    Missing,
    /// The browser presented no cookie token.
    SessionMissing,
    /// Form and cookie tokens differ.
    Mismatch,
}

impl fmt::Display for CsrfFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Missing => "The CSRF token is missing.",
            Self::SessionMissing => "The CSRF session token is missing.",
            Self::Mismatch => "The CSRF tokens do not match.",
        })
    }
}

impl std::error::Error for CsrfFailure {}

/// Checks the submitted form token against the cookie token.
pub fn verify(cookie: Option<&str>, submitted: Option<&str>) -> Result<(), CsrfFailure> {
    let submitted = submitted
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or(CsrfFailure::Missing)?;
    let cookie = cookie.ok_or(CsrfFailure::SessionMissing)?;
    if constant_time_eq(cookie.as_bytes(), submitted.as_bytes()) {
        Ok(())
    } else {
        Err(CsrfFailure::Mismatch)
    }
}

fn is_well_formed(token: &str) -> bool {
    !token.is_empty()
        && token.len() <= MAX_TOKEN_LEN
        && token.bytes().all(|byte| byte.is_ascii_alphanumeric())
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
