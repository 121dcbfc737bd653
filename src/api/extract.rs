//! Request extractors whose rejections use the API error shape.

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{FromRequest, FromRequestParts};

use super::error::ApiError;

/// `axum::Json` with rejections mapped to a 400 `ApiError`.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// `axum::extract::Path` with rejections mapped to `ApiError`. An id that
/// does not parse is reported as not found.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);

/// Key used for body errors that cannot be tied to one field.
pub const NON_FIELD_ERRORS: &str = "non_field_errors";

const DATA_ERROR_PREFIX: &str = "Failed to deserialize the JSON body into the target type: ";

/// Split `"field: message"` from a body deserialization error. Root-level
/// errors carry no path and yield `None`.
fn split_field_error(detail: &str) -> Option<(&str, &str)> {
    let (path, message) = detail.split_once(": ")?;
    let is_path = !path.is_empty()
        && path
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '[' | ']'));
    is_path.then_some((path, message))
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::JsonDataError(err) => {
                let text = err.body_text();
                let detail = text.strip_prefix(DATA_ERROR_PREFIX).unwrap_or(&text);
                match split_field_error(detail) {
                    Some((field, message)) => ApiError::field(field, message),
                    None => ApiError::field(NON_FIELD_ERRORS, detail),
                }
            }
            JsonRejection::JsonSyntaxError(_) => ApiError::bad_request("Malformed JSON body"),
            JsonRejection::MissingJsonContentType(_) => {
                ApiError::bad_request("Expected a JSON body with Content-Type: application/json")
            }
            other => ApiError::bad_request(other.body_text()),
        }
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        match rejection {
            PathRejection::FailedToDeserializePathParams(_) => ApiError::not_found("Not found"),
            other => ApiError::internal(other.body_text()),
        }
    }
}
