//! Project requests.
//!
//! Anyone may submit a request; signed-in submitters become its owner.
//! Owners read, edit and delete their own requests. Staff see every
//! request and set its status, payment status and expected completion.

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
use crate::auth::{Auth, OptionalAuth};
use crate::db::{
    Database, NewProject, PaymentStatus, Project, ProjectReview, ProjectStatus, ProjectUpdate,
    normalize_email,
};
use crate::impl_has_auth_backend;
use crate::jwt::JwtConfig;
use crate::policy::{Action, Principal, authorize, permit};

const TITLE_MAX_LEN: usize = 100;

#[derive(Clone)]
pub struct ProjectsState {
    pub db: Database,
    pub jwt: Arc<JwtConfig>,
}

impl_has_auth_backend!(ProjectsState);

pub fn router(state: ProjectsState) -> Router {
    Router::new()
        .route("/submit-project-request", post(submit_project))
        .route("/projects", get(list_projects))
        .route(
            "/projects/{id}",
            get(get_project).patch(update_project).delete(delete_project),
        )
        .with_state(state)
}

/// Load a project and run the ownership guard on it.
async fn load_authorized(
    db: &Database,
    principal: &Principal,
    action: Action,
    id: i64,
) -> Result<Project, ApiError> {
    let project = db.projects().get(id).await.db_err("Failed to get project")?;
    authorize(principal, action, project.as_ref())?;
    project.ok_or_else(|| ApiError::not_found("Project not found"))
}

#[derive(Deserialize)]
struct SubmitProjectRequest {
    #[serde(default)]
    email: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
}

async fn submit_project(
    State(state): State<ProjectsState>,
    auth: OptionalAuth,
    ApiJson(payload): ApiJson<SubmitProjectRequest>,
) -> Result<impl IntoResponse, ApiError> {
    permit(&auth.principal(), Action::SubmitProject)?;

    let mut errors = FieldErrors::new();
    let email = errors.require("email", &payload.email);
    errors.email("email", email);
    let title = errors.require("title", &payload.title);
    errors.max_len("title", title, TITLE_MAX_LEN);
    errors.finish()?;

    let email = normalize_email(email);
    let project = state
        .db
        .projects()
        .create(NewProject {
            user_id: auth.user_id(),
            email: &email,
            title,
            description: payload.description.trim(),
        })
        .await
        .db_err("Failed to create project")?;

    info!(
        project_id = project.id,
        owner = ?project.user_id,
        "Project request submitted"
    );

    Ok((StatusCode::CREATED, Json(project)))
}

async fn list_projects(
    State(state): State<ProjectsState>,
    Auth(auth): Auth,
) -> Result<impl IntoResponse, ApiError> {
    permit(&auth.principal(), Action::ReadResource)?;

    let projects = state
        .db
        .projects()
        .list_by_user(auth.user.id)
        .await
        .db_err("Failed to list projects")?;
    Ok(Json(projects))
}

async fn get_project(
    State(state): State<ProjectsState>,
    auth: OptionalAuth,
    ApiPath(id): ApiPath<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let project = load_authorized(&state.db, &auth.principal(), Action::ReadResource, id).await?;
    Ok(Json(project))
}

#[derive(Deserialize)]
struct UpdateProjectRequest {
    title: Option<String>,
    description: Option<String>,
    status: Option<String>,
    payment_status: Option<String>,
    expected_completion_date: Option<String>,
}

impl UpdateProjectRequest {
    fn touches_review_fields(&self) -> bool {
        self.status.is_some()
            || self.payment_status.is_some()
            || self.expected_completion_date.is_some()
    }
}

async fn update_project(
    State(state): State<ProjectsState>,
    auth: OptionalAuth,
    ApiPath(id): ApiPath<i64>,
    ApiJson(payload): ApiJson<UpdateProjectRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let principal = auth.principal();
    let project = load_authorized(&state.db, &principal, Action::UpdateResource, id).await?;

    if payload.touches_review_fields() {
        permit(&principal, Action::ReviewSubmissions)?;
    }

    let mut errors = FieldErrors::new();

    let title = match payload.title.as_deref() {
        Some(title) => errors.require("title", title),
        None => project.title.as_str(),
    };
    errors.max_len("title", title, TITLE_MAX_LEN);
    let description = payload
        .description
        .as_deref()
        .map_or(project.description.as_str(), str::trim);

    let status = payload
        .status
        .as_deref()
        .and_then(|s| errors.choice("status", s.trim(), ProjectStatus::parse));
    let payment_status = payload
        .payment_status
        .as_deref()
        .and_then(|s| errors.choice("payment_status", s.trim(), PaymentStatus::parse));
    // An empty date clears it.
    let expected_completion_date = payload
        .expected_completion_date
        .as_deref()
        .map(str::trim)
        .map(|date| (!date.is_empty()).then_some(date));
    if let Some(Some(date)) = expected_completion_date {
        errors.date("expected_completion_date", date);
    }
    errors.finish()?;

    let project = state
        .db
        .projects()
        .update(
            project.id,
            ProjectUpdate {
                title,
                description,
                review: ProjectReview {
                    status,
                    payment_status,
                    expected_completion_date,
                },
            },
        )
        .await
        .db_err("Failed to update project")?
        .ok_or_else(|| ApiError::not_found("Project not found"))?;

    if payload.touches_review_fields() {
        info!(project_id = project.id, "Project reviewed");
    }
    Ok(Json(project))
}

async fn delete_project(
    State(state): State<ProjectsState>,
    auth: OptionalAuth,
    ApiPath(id): ApiPath<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let project = load_authorized(&state.db, &auth.principal(), Action::DeleteResource, id).await?;

    state
        .db
        .projects()
        .delete(project.id)
        .await
        .db_err("Failed to delete project")?;

    info!(project_id = project.id, "Project deleted");
    Ok(StatusCode::NO_CONTENT)
}
