//! Public intake: initial internship applications and contact messages.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

use super::error::{ApiError, ResultExt};
use super::extract::{ApiJson, ApiPath};
use super::validation::FieldErrors;
use crate::auth::OptionalAuth;
use crate::db::{ApplicationMode, Database, normalize_email};
use crate::impl_has_auth_backend;
use crate::jwt::JwtConfig;
use crate::policy::{Action, authorize, permit};

const FULL_NAME_MAX_LEN: usize = 100;
const MESSAGE_MAX_LEN: usize = 5000;

#[derive(Clone)]
pub struct ApplicationsState {
    pub db: Database,
    pub jwt: Arc<JwtConfig>,
}

impl_has_auth_backend!(ApplicationsState);

pub fn router(state: ApplicationsState) -> Router {
    Router::new()
        .route("/submit-initial-application", post(submit_application))
        .route("/applications/{id}", get(get_application))
        .route("/contact", post(submit_contact))
        .with_state(state)
}

#[derive(Deserialize)]
struct SubmitApplicationRequest {
    #[serde(default)]
    email: String,
    #[serde(default)]
    mode: String,
}

async fn submit_application(
    State(state): State<ApplicationsState>,
    auth: OptionalAuth,
    ApiJson(payload): ApiJson<SubmitApplicationRequest>,
) -> Result<impl IntoResponse, ApiError> {
    permit(&auth.principal(), Action::SubmitApplication)?;

    let mut errors = FieldErrors::new();
    let email = errors.require("email", &payload.email);
    errors.email("email", email);
    let mode = errors.require("mode", &payload.mode);
    let mode = errors.choice("mode", &mode.to_lowercase(), ApplicationMode::parse);
    errors.finish()?;

    let Some(mode) = mode else {
        return Err(ApiError::field("mode", super::validation::REQUIRED));
    };

    let application = state
        .db
        .applications()
        .create(auth.user_id(), &normalize_email(email), mode)
        .await
        .db_err("Failed to create application")?;

    info!(
        application_id = application.id,
        mode = mode.as_str(),
        "Initial application submitted"
    );

    Ok((StatusCode::CREATED, Json(application)))
}

async fn get_application(
    State(state): State<ApplicationsState>,
    auth: OptionalAuth,
    ApiPath(id): ApiPath<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let application = state
        .db
        .applications()
        .get(id)
        .await
        .db_err("Failed to get application")?;

    authorize(&auth.principal(), Action::ReadResource, application.as_ref())?;
    let application = application.ok_or_else(|| ApiError::not_found("Application not found"))?;
    Ok(Json(application))
}

#[derive(Deserialize)]
struct ContactRequest {
    #[serde(default)]
    full_name: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    message: String,
}

async fn submit_contact(
    State(state): State<ApplicationsState>,
    auth: OptionalAuth,
    ApiJson(payload): ApiJson<ContactRequest>,
) -> Result<impl IntoResponse, ApiError> {
    permit(&auth.principal(), Action::SubmitContact)?;

    let mut errors = FieldErrors::new();
    let full_name = errors.require("full_name", &payload.full_name);
    errors.max_len("full_name", full_name, FULL_NAME_MAX_LEN);
    let email = errors.require("email", &payload.email);
    errors.email("email", email);
    let message = errors.require("message", &payload.message);
    errors.max_len("message", message, MESSAGE_MAX_LEN);
    errors.finish()?;

    let contact = state
        .db
        .contact()
        .create(full_name, &normalize_email(email), message)
        .await
        .db_err("Failed to store contact message")?;

    info!(contact_id = contact.id, "Contact message received");

    Ok((StatusCode::CREATED, Json(contact)))
}
