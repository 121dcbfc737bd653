//! Internship enrollments.
//!
//! Interns see their own internships; staff enroll interns and move them
//! through the status workflow.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use super::courses::CourseDetail;
use super::error::{ApiError, ResultExt};
use super::extract::{ApiJson, ApiPath};
use super::validation::{FieldErrors, REQUIRED};
use crate::auth::Auth;
use crate::db::{
    Database, Internship, InternshipDuration, InternshipStatus, NewInternship, normalize_email,
};
use crate::impl_has_auth_backend;
use crate::jwt::JwtConfig;
use crate::policy::{Action, authorize, permit};

const NAME_MAX_LEN: usize = 100;

#[derive(Clone)]
pub struct InternshipsState {
    pub db: Database,
    pub jwt: Arc<JwtConfig>,
}

impl_has_auth_backend!(InternshipsState);

pub fn router(state: InternshipsState) -> Router {
    Router::new()
        .route("/internships", get(list_internships).post(create_internship))
        .route(
            "/internships/{id}",
            get(get_internship).patch(update_internship),
        )
        .route("/validate-internship", post(validate_internship))
        .with_state(state)
}

async fn list_internships(
    State(state): State<InternshipsState>,
    Auth(auth): Auth,
) -> Result<impl IntoResponse, ApiError> {
    permit(&auth.principal(), Action::ReadResource)?;

    let internships = state
        .db
        .internships()
        .list_by_intern(auth.user.id)
        .await
        .db_err("Failed to list internships")?;
    Ok(Json(internships))
}

#[derive(Deserialize)]
struct CreateInternshipRequest {
    intern_id: Option<i64>,
    course_id: Option<i64>,
    #[serde(default)]
    first_name: String,
    #[serde(default)]
    last_name: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    date_of_birth: String,
    #[serde(default)]
    starting_date: String,
    #[serde(default)]
    completion_date: String,
    #[serde(default)]
    duration: String,
}

async fn create_internship(
    State(state): State<InternshipsState>,
    Auth(auth): Auth,
    ApiJson(payload): ApiJson<CreateInternshipRequest>,
) -> Result<impl IntoResponse, ApiError> {
    permit(&auth.principal(), Action::ManageInternships)?;

    let mut errors = FieldErrors::new();

    if payload.intern_id.is_none() {
        errors.add("intern_id", REQUIRED);
    }
    if payload.course_id.is_none() {
        errors.add("course_id", REQUIRED);
    }

    let first_name = errors.require("first_name", &payload.first_name);
    errors.max_len("first_name", first_name, NAME_MAX_LEN);
    let last_name = errors.require("last_name", &payload.last_name);
    errors.max_len("last_name", last_name, NAME_MAX_LEN);
    let email = errors.require("email", &payload.email);
    errors.email("email", email);

    let date_of_birth = errors.require("date_of_birth", &payload.date_of_birth);
    errors.date("date_of_birth", date_of_birth);
    let starting_date = errors.require("starting_date", &payload.starting_date);
    let start = errors.date("starting_date", starting_date);
    let completion_date = errors.require("completion_date", &payload.completion_date);
    let end = errors.date("completion_date", completion_date);
    if matches!((start, end), (Some(start), Some(end)) if end <= start) {
        errors.add(
            "completion_date",
            "Completion date must be after the starting date.",
        );
    }

    let duration = errors.require("duration", &payload.duration);
    let duration = errors.choice("duration", duration, InternshipDuration::parse);

    if let Some(intern_id) = payload.intern_id {
        let intern = state
            .db
            .users()
            .get_by_id(intern_id)
            .await
            .db_err("Failed to get intern")?;
        if intern.is_none() {
            errors.add("intern_id", format!("Invalid pk \"{intern_id}\" - object does not exist."));
        }
    }
    if let Some(course_id) = payload.course_id {
        let course = state
            .db
            .courses()
            .get(course_id)
            .await
            .db_err("Failed to get course")?;
        if course.is_none() {
            errors.add("course_id", format!("Invalid pk \"{course_id}\" - object does not exist."));
        }
    }

    errors.finish()?;

    let (Some(intern_id), Some(course_id), Some(duration)) =
        (payload.intern_id, payload.course_id, duration)
    else {
        return Err(ApiError::bad_request("Incomplete enrollment"));
    };

    let email = normalize_email(email);
    let internship = state
        .db
        .internships()
        .create(NewInternship {
            intern_id,
            course_id,
            first_name,
            last_name,
            email: &email,
            date_of_birth,
            starting_date,
            completion_date,
            duration,
        })
        .await
        .db_err("Failed to create internship")?;

    info!(
        internship_id = internship.id,
        intern_id,
        staff_id = auth.user.id,
        "Enrolled intern"
    );

    Ok((StatusCode::CREATED, Json(internship)))
}

#[derive(Serialize)]
struct InternshipDetail {
    #[serde(flatten)]
    internship: Internship,
    course: Option<CourseDetail>,
}

async fn get_internship(
    State(state): State<InternshipsState>,
    Auth(auth): Auth,
    ApiPath(id): ApiPath<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let principal = auth.principal();
    let internship = state
        .db
        .internships()
        .get(id)
        .await
        .db_err("Failed to get internship")?;

    authorize(&principal, Action::ReadResource, internship.as_ref())?;
    let Some(internship) = internship else {
        return Err(ApiError::not_found("Internship not found"));
    };

    // Interns only see their enrollment once staff have approved it.
    if internship.status == InternshipStatus::Pending && !principal.role().bypasses_ownership() {
        return Err(ApiError::forbidden(
            "Your application is still pending. Please wait for approval.",
        ));
    }

    let course = match state
        .db
        .courses()
        .get(internship.course_id)
        .await
        .db_err("Failed to get course")?
    {
        Some(course) => Some(CourseDetail::load(&state.db, course).await?),
        None => None,
    };

    Ok(Json(InternshipDetail { internship, course }))
}

#[derive(Deserialize)]
struct UpdateInternshipRequest {
    #[serde(default)]
    status: String,
}

async fn update_internship(
    State(state): State<InternshipsState>,
    Auth(auth): Auth,
    ApiPath(id): ApiPath<i64>,
    ApiJson(payload): ApiJson<UpdateInternshipRequest>,
) -> Result<impl IntoResponse, ApiError> {
    permit(&auth.principal(), Action::ManageInternships)?;

    let mut errors = FieldErrors::new();
    let status = errors.require("status", &payload.status);
    let status = errors.choice("status", status, InternshipStatus::parse);
    errors.finish()?;
    let Some(status) = status else {
        return Err(ApiError::field("status", REQUIRED));
    };

    let updated = state
        .db
        .internships()
        .set_status(id, status)
        .await
        .db_err("Failed to update internship")?;
    if !updated {
        return Err(ApiError::not_found("Internship not found"));
    }

    info!(
        internship_id = id,
        status = status.as_str(),
        staff_id = auth.user.id,
        "Updated internship status"
    );

    let internship = state
        .db
        .internships()
        .get(id)
        .await
        .db_err("Failed to get internship")?
        .ok_or_else(|| ApiError::not_found("Internship not found"))?;

    Ok(Json(internship))
}

#[derive(Deserialize)]
struct ValidateInternshipRequest {
    #[serde(default)]
    internship_id: String,
}

/// Confirm that the caller is an intern holding the given internship code.
async fn validate_internship(
    Auth(auth): Auth,
    ApiJson(payload): ApiJson<ValidateInternshipRequest>,
) -> Result<impl IntoResponse, ApiError> {
    permit(&auth.principal(), Action::ValidateInternship)?;

    let code = payload.internship_id.trim();
    let matches = auth.user.is_intern && auth.user.internship_id.as_deref() == Some(code);

    if !matches || code.is_empty() {
        return Err(ApiError::forbidden(
            "Invalid internship ID or you do not have permission",
        ));
    }

    Ok((
        StatusCode::OK,
        Json(serde_json::json!({ "message": "Access granted" })),
    ))
}
