//! Bearer token extraction.
//!
//! Flow Overview: read `Authorization: Bearer <token>`, verify the token, and
//! hand the resulting [`Identity`] to the handler. Handlers call
//! [`require_auth`] before touching anything owned.

use axum::http::{header::AUTHORIZATION, HeaderMap};
use tracing::{debug, warn};

use crate::auth::{AuthError, Identity, TokenVerifier};

/// Return the raw token from the `Authorization` header, if well formed.
#[must_use]
pub fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }

    let token = token.trim();
    if token.is_empty() || token.contains(' ') {
        return None;
    }

    Some(token)
}

/// Resolve the bearer token into an identity, or `InvalidToken`/`ExpiredToken`.
///
/// # Errors
/// Missing or malformed headers are `InvalidToken`; verification errors pass through.
pub fn require_auth(headers: &HeaderMap, verifier: &TokenVerifier) -> Result<Identity, AuthError> {
    let Some(token) = extract_bearer_token(headers) else {
        debug!("missing or malformed authorization header");
        return Err(AuthError::InvalidToken);
    };

    match verifier.verify(token) {
        Ok(claims) => Ok(claims.identity()),
        Err(err) => {
            warn!("Rejected bearer token: {err}");
            Err(err)
        }
    }
}
