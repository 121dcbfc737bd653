//! Authentication error types.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::jwt::TokenError;

/// Internal auth error kind used by the core authentication logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthErrorKind {
    NotAuthenticated,
    MalformedToken,
    ExpiredToken,
    WrongTokenType,
    TokenRevoked,
    /// The token subject no longer exists or has been deactivated.
    InactiveAccount,
    InvalidCredentials,
    DatabaseError,
}

impl From<&TokenError> for AuthErrorKind {
    fn from(err: &TokenError) -> Self {
        match err {
            TokenError::Expired => AuthErrorKind::ExpiredToken,
            TokenError::WrongTokenType => AuthErrorKind::WrongTokenType,
            TokenError::Malformed => AuthErrorKind::MalformedToken,
            TokenError::Encoding(_) | TokenError::TimeError => AuthErrorKind::DatabaseError,
        }
    }
}

/// API authentication errors. Every credential problem is a 401.
#[derive(Debug)]
pub struct ApiAuthError {
    pub(super) kind: AuthErrorKind,
}

impl ApiAuthError {
    pub(super) fn new(kind: AuthErrorKind) -> Self {
        Self { kind }
    }

    pub fn kind(&self) -> AuthErrorKind {
        self.kind
    }

    fn status_code(&self) -> StatusCode {
        match self.kind {
            AuthErrorKind::DatabaseError => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::UNAUTHORIZED,
        }
    }

    fn message(&self) -> &'static str {
        match self.kind {
            AuthErrorKind::NotAuthenticated => "Not authenticated",
            AuthErrorKind::MalformedToken => "Invalid token",
            AuthErrorKind::ExpiredToken => "Token has expired",
            AuthErrorKind::WrongTokenType => "Wrong token type",
            AuthErrorKind::TokenRevoked => "Token has been revoked",
            AuthErrorKind::InactiveAccount => "Account is not active",
            AuthErrorKind::InvalidCredentials => "Invalid email or password",
            AuthErrorKind::DatabaseError => "Database error",
        }
    }
}

impl From<AuthErrorKind> for ApiAuthError {
    fn from(kind: AuthErrorKind) -> Self {
        Self::new(kind)
    }
}

impl From<TokenError> for ApiAuthError {
    fn from(err: TokenError) -> Self {
        let kind = AuthErrorKind::from(&err);
        if kind == AuthErrorKind::DatabaseError {
            tracing::error!("Token operation failed: {}", err);
        }
        Self::new(kind)
    }
}

impl IntoResponse for ApiAuthError {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorResponse {
            error: &'static str,
        }

        (
            self.status_code(),
            Json(ErrorResponse {
                error: self.message(),
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_errors_map_to_distinct_kinds() {
        assert_eq!(
            ApiAuthError::from(TokenError::Expired).kind(),
            AuthErrorKind::ExpiredToken
        );
        assert_eq!(
            ApiAuthError::from(TokenError::Malformed).kind(),
            AuthErrorKind::MalformedToken
        );
        assert_eq!(
            ApiAuthError::from(TokenError::WrongTokenType).kind(),
            AuthErrorKind::WrongTokenType
        );
    }

    #[test]
    fn test_credential_errors_are_unauthorized() {
        for kind in [
            AuthErrorKind::NotAuthenticated,
            AuthErrorKind::MalformedToken,
            AuthErrorKind::ExpiredToken,
            AuthErrorKind::WrongTokenType,
            AuthErrorKind::TokenRevoked,
            AuthErrorKind::InactiveAccount,
            AuthErrorKind::InvalidCredentials,
        ] {
            let response = ApiAuthError::new(kind).into_response();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{kind:?}");
        }

        let response = ApiAuthError::new(AuthErrorKind::DatabaseError).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
