//! Shared error handling for API endpoints.

use std::collections::BTreeMap;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::error;

use crate::auth::ApiAuthError;
use crate::db::UserError;
use crate::policy::Denied;

/// Extension trait for concise error mapping on Results.
pub trait ResultExt<T> {
    fn db_err(self, msg: &str) -> Result<T, ApiError>;
}

impl<T, E: std::fmt::Display> ResultExt<T> for Result<T, E> {
    fn db_err(self, msg: &str) -> Result<T, ApiError> {
        self.map_err(|e| ApiError::db_error(msg, e))
    }
}

/// API error type with automatic response conversion.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    /// Per-field validation messages.
    Validation(BTreeMap<String, String>),
    Forbidden(String),
    NotFound(String),
    Unauthorized(String),
    Auth(ApiAuthError),
    Internal(String),
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn field(field: &str, msg: impl Into<String>) -> Self {
        Self::Validation(BTreeMap::from([(field.to_string(), msg.into())]))
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn db_error(context: &str, e: impl std::fmt::Display) -> Self {
        error!("{}: {}", context, e);
        Self::Internal("Database error".into())
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    fields: Option<BTreeMap<String, String>>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message, fields) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg, None),
            ApiError::Validation(fields) => (
                StatusCode::BAD_REQUEST,
                "Validation failed".to_string(),
                Some(fields),
            ),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg, None),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg, None),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg, None),
            ApiError::Auth(err) => return err.into_response(),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg, None),
        };
        (
            status,
            Json(ErrorResponse {
                error: message,
                fields,
            }),
        )
            .into_response()
    }
}

impl From<ApiAuthError> for ApiError {
    fn from(err: ApiAuthError) -> Self {
        Self::Auth(err)
    }
}

impl From<Denied> for ApiError {
    fn from(denied: Denied) -> Self {
        match denied {
            Denied::Unauthenticated => Self::unauthorized(denied.to_string()),
            Denied::Forbidden => Self::forbidden(denied.to_string()),
            Denied::NotFound => Self::not_found(denied.to_string()),
        }
    }
}

impl From<UserError> for ApiError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::DuplicateEmail => Self::field("email", err.to_string()),
            UserError::InvalidCredentials => Self::unauthorized(err.to_string()),
            UserError::NotFound => Self::not_found(err.to_string()),
            UserError::Password(e) => {
                error!("Password hashing failed: {}", e);
                Self::internal("Internal error")
            }
            UserError::Database(e) => Self::db_error("User store failure", e),
        }
    }
}
