//! Credential extraction from request headers.

use axum::http::{HeaderMap, header};

/// Cookie consulted when no `Authorization` header is present.
pub const ACCESS_COOKIE_NAME: &str = "access_token";

/// Extract the access credential for a request.
///
/// `Authorization: Bearer <token>` wins; the `access_token` cookie is a
/// fallback for browser clients.
pub fn access_credential(headers: &HeaderMap) -> Option<&str> {
    bearer_token(headers).or_else(|| get_cookie(headers, ACCESS_COOKIE_NAME))
}

/// Extract the token from an `Authorization: Bearer` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

/// Extract a cookie value from the Cookie header.
pub fn get_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    let cookie_header = headers.get(header::COOKIE)?.to_str().ok()?;
    cookie_header.split(';').find_map(|part| {
        let (key, value) = part.trim().split_once('=')?;
        (key.trim() == name).then(|| value.trim())
    })
}
