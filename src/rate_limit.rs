//! Rate limiting for authentication endpoints.
//!
//! Uses a token bucket algorithm with per-IP tracking to slow down password
//! guessing and signup spam.

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderName, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use governor::{Quota, RateLimiter, clock::DefaultClock, state::keyed::DefaultKeyedStateStore};
use std::{
    net::{IpAddr, SocketAddr},
    num::NonZeroU32,
    sync::Arc,
};

/// Per-IP rate limiter.
pub type IpLimiter = RateLimiter<String, DefaultKeyedStateStore<String>, DefaultClock>;

/// Login: one token per second, bursts of five.
const LOGIN_PER_SEC: NonZeroU32 = NonZeroU32::new(1).unwrap();
const LOGIN_BURST: NonZeroU32 = NonZeroU32::new(5).unwrap();

/// Registration: three per minute.
const REGISTER_PER_MIN: NonZeroU32 = NonZeroU32::new(3).unwrap();

/// Rate limiting configuration for authentication endpoints.
#[derive(Clone)]
pub struct RateLimitConfig {
    /// Per-IP limiter for `/token` and `/token/refresh`
    pub login: Arc<IpLimiter>,
    /// Per-IP limiter for `/register`
    pub register: Arc<IpLimiter>,
    /// Header carrying the client IP when running behind a proxy. When unset
    /// the socket address is used and client headers are ignored.
    pub ip_header: Option<HeaderName>,
}

impl RateLimitConfig {
    pub fn new(ip_header: Option<HeaderName>) -> Self {
        Self {
            login: Arc::new(RateLimiter::keyed(
                Quota::per_second(LOGIN_PER_SEC).allow_burst(LOGIN_BURST),
            )),
            register: Arc::new(RateLimiter::keyed(Quota::per_minute(REGISTER_PER_MIN))),
            ip_header,
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self::new(None)
    }
}

/// Extract the client IP.
///
/// With `ip_header` set, the first address in that header is used and a
/// missing or invalid header is an error; the socket address is never a
/// fallback. Without it, the socket address from `ConnectInfo` is used.
pub fn client_ip(
    request: &Request,
    ip_header: Option<&HeaderName>,
) -> Result<String, &'static str> {
    match ip_header {
        Some(name) => {
            let value = request
                .headers()
                .get(name)
                .ok_or("IP header not present")?
                .to_str()
                .map_err(|_| "IP header contains invalid characters")?;
            let first = value.split(',').next().unwrap_or_default().trim();
            first
                .parse::<IpAddr>()
                .map(|ip| ip.to_string())
                .map_err(|_| "IP header does not hold an address")
        }
        None => request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ci| ci.0.ip().to_string())
            .ok_or("No client IP available"),
    }
}

fn error_response(status: StatusCode, message: &'static str) -> Response {
    (status, axum::Json(serde_json::json!({ "error": message }))).into_response()
}

impl RateLimitConfig {
    /// Resolve the limiter key, or the 403 response when there is none.
    fn key_for(&self, request: &Request) -> Result<String, Response> {
        client_ip(request, self.ip_header.as_ref()).map_err(|reason| {
            tracing::warn!(reason, "Rejecting request without a client IP");
            error_response(StatusCode::FORBIDDEN, "Unable to determine client IP.")
        })
    }
}

/// Middleware for rate limiting login and refresh.
pub async fn rate_limit_login(
    State(config): State<Arc<RateLimitConfig>>,
    request: Request,
    next: Next,
) -> Response {
    let key = match config.key_for(&request) {
        Ok(key) => key,
        Err(response) => return response,
    };
    match config.login.check_key(&key) {
        Ok(_) => next.run(request).await,
        Err(_) => {
            tracing::warn!(client = %key, "Login rate limit exceeded");
            error_response(
                StatusCode::TOO_MANY_REQUESTS,
                "Too many authentication attempts. Please wait before trying again.",
            )
        }
    }
}

/// Middleware for rate limiting registration.
pub async fn rate_limit_register(
    State(config): State<Arc<RateLimitConfig>>,
    request: Request,
    next: Next,
) -> Response {
    let key = match config.key_for(&request) {
        Ok(key) => key,
        Err(response) => return response,
    };
    match config.register.check_key(&key) {
        Ok(_) => next.run(request).await,
        Err(_) => {
            tracing::warn!(client = %key, "Signup rate limit exceeded");
            error_response(
                StatusCode::TOO_MANY_REQUESTS,
                "Too many signup attempts. Please wait before trying again.",
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    fn from_socket(builder: axum::http::request::Builder) -> Request {
        builder
            .extension(ConnectInfo(SocketAddr::from(([192, 0, 2, 1], 4000))))
            .body(Body::empty())
            .unwrap()
    }

    #[test]
    fn test_client_ip_ignores_forwarded_for_by_default() {
        let request = from_socket(Request::builder().header("x-forwarded-for", "203.0.113.7"));
        assert_eq!(client_ip(&request, None).unwrap(), "192.0.2.1");
    }

    #[test]
    fn test_client_ip_from_configured_header() {
        let header = HeaderName::from_static("x-forwarded-for");
        let request = from_socket(
            Request::builder().header("x-forwarded-for", " 203.0.113.7 , 10.0.0.1"),
        );
        assert_eq!(client_ip(&request, Some(&header)).unwrap(), "203.0.113.7");
    }

    #[test]
    fn test_configured_header_has_no_fallback() {
        let header = HeaderName::from_static("x-real-ip");
        let request = from_socket(Request::builder());
        assert!(client_ip(&request, Some(&header)).is_err());

        let request = from_socket(Request::builder().header("x-real-ip", "not-an-ip"));
        assert!(client_ip(&request, Some(&header)).is_err());
    }

    #[test]
    fn test_client_ip_without_connect_info() {
        let request = Request::builder().body(Body::empty()).unwrap();
        assert!(client_ip(&request, None).is_err());
    }

    #[test]
    fn test_register_limit_per_key() {
        let config = RateLimitConfig::default();
        for _ in 0..REGISTER_PER_MIN.get() {
            assert!(config.register.check_key(&"a".to_string()).is_ok());
        }
        assert!(config.register.check_key(&"a".to_string()).is_err());
        assert!(config.register.check_key(&"b".to_string()).is_ok());
    }
}
