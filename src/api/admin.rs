//! Back-office endpoints.
//!
//! Listing requires staff. Changing another identity's role, activation or
//! intern linkage requires admin.

use axum::{
    Json, Router,
    extract::State,
    response::IntoResponse,
    routing::{get, patch},
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

use super::error::{ApiError, ResultExt};
use super::extract::{ApiJson, ApiPath};
use super::users::UserResponse;
use super::validation::FieldErrors;
use crate::auth::Auth;
use crate::db::{Database, UserRole};
use crate::impl_has_auth_backend;
use crate::jwt::JwtConfig;
use crate::policy::{Action, permit};

const INTERNSHIP_ID_MAX_LEN: usize = 12;

/// State for admin endpoints.
#[derive(Clone)]
pub struct AdminState {
    pub db: Database,
    pub jwt: Arc<JwtConfig>,
}

impl_has_auth_backend!(AdminState);

pub fn router(state: AdminState) -> Router {
    Router::new()
        .route("/admin/users", get(list_users))
        .route("/admin/users/{id}", patch(update_user))
        .route("/admin/projects", get(list_projects))
        .route("/admin/applications", get(list_applications))
        .route("/admin/contact", get(list_contact))
        .with_state(state)
}

async fn list_users(
    State(state): State<AdminState>,
    Auth(auth): Auth,
) -> Result<impl IntoResponse, ApiError> {
    permit(&auth.principal(), Action::ListUsers)?;

    let users = state.db.users().list().await.db_err("Failed to list users")?;
    Ok(Json(
        users
            .into_iter()
            .map(UserResponse::from)
            .collect::<Vec<_>>(),
    ))
}

#[derive(Deserialize)]
struct UpdateUserRequest {
    role: Option<UserRole>,
    is_active: Option<bool>,
    is_intern: Option<bool>,
    /// `Some("")` clears the code.
    internship_id: Option<String>,
}

async fn update_user(
    State(state): State<AdminState>,
    Auth(auth): Auth,
    ApiPath(id): ApiPath<i64>,
    ApiJson(payload): ApiJson<UpdateUserRequest>,
) -> Result<impl IntoResponse, ApiError> {
    permit(&auth.principal(), Action::ManageUsers)?;

    let user = state
        .db
        .users()
        .get_by_id(id)
        .await
        .db_err("Failed to get user")?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    let mut errors = FieldErrors::new();
    if user.id == auth.user.id {
        if payload.is_active == Some(false) {
            errors.add("is_active", "You cannot deactivate your own account.");
        }
        if payload.role.is_some_and(|role| role != UserRole::Admin) {
            errors.add("role", "You cannot remove your own admin role.");
        }
    }
    let internship_id = payload.internship_id.as_deref().map(str::trim);
    if let Some(code) = internship_id {
        errors.max_len("internship_id", code, INTERNSHIP_ID_MAX_LEN);
    }
    errors.finish()?;

    let users = state.db.users();

    if let Some(role) = payload.role {
        users
            .set_role(user.id, role)
            .await
            .db_err("Failed to set role")?;
        info!(user_id = user.id, role = role.as_str(), "Changed role");
    }

    if payload.is_intern.is_some() || internship_id.is_some() {
        let is_intern = payload.is_intern.unwrap_or(user.is_intern);
        let code = match internship_id {
            Some("") => None,
            Some(code) => Some(code),
            None => user.internship_id.as_deref(),
        };
        users
            .set_intern(user.id, is_intern, code)
            .await
            .db_err("Failed to set intern linkage")?;
    }

    if let Some(is_active) = payload.is_active {
        users
            .set_active(user.id, is_active)
            .await
            .db_err("Failed to set activation")?;

        if !is_active {
            let revoked = state
                .db
                .tokens()
                .delete_all_by_user(user.id)
                .await
                .db_err("Failed to revoke sessions")?;
            info!(user_id = user.id, revoked, "Deactivated user");
        }
    }

    let user = users.find_by_id(user.id).await?;
    Ok(Json(UserResponse::from(user)))
}

async fn list_projects(
    State(state): State<AdminState>,
    Auth(auth): Auth,
) -> Result<impl IntoResponse, ApiError> {
    permit(&auth.principal(), Action::ReviewSubmissions)?;

    let projects = state
        .db
        .projects()
        .list_all()
        .await
        .db_err("Failed to list projects")?;
    Ok(Json(projects))
}

async fn list_applications(
    State(state): State<AdminState>,
    Auth(auth): Auth,
) -> Result<impl IntoResponse, ApiError> {
    permit(&auth.principal(), Action::ReviewSubmissions)?;

    let applications = state
        .db
        .applications()
        .list_all()
        .await
        .db_err("Failed to list applications")?;
    Ok(Json(applications))
}

async fn list_contact(
    State(state): State<AdminState>,
    Auth(auth): Auth,
) -> Result<impl IntoResponse, ApiError> {
    permit(&auth.principal(), Action::ReviewSubmissions)?;

    let messages = state
        .db
        .contact()
        .list()
        .await
        .db_err("Failed to list contact messages")?;
    Ok(Json(messages))
}
