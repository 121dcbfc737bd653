//! Registration and the signed-in user's own views.
//!
//! - POST `/register` - Create an account
//! - GET `/profile` - Identity plus own internships and projects
//! - PATCH `/profile` - Update display names
//! - GET `/dashboard` - Own internships

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use super::error::{ApiError, ResultExt};
use super::extract::ApiJson;
use super::validation::FieldErrors;
use crate::auth::Auth;
use crate::db::{Database, Internship, Project, User, UserRole};
use crate::impl_has_auth_backend;
use crate::jwt::JwtConfig;
use crate::policy::{Action, permit};
use crate::rate_limit::{RateLimitConfig, rate_limit_register};

const NAME_MAX_LEN: usize = 150;

#[derive(Clone)]
pub struct UsersState {
    pub db: Database,
    pub jwt: Arc<JwtConfig>,
    pub no_signup: bool,
    pub rate_limit: Option<Arc<RateLimitConfig>>,
}

impl_has_auth_backend!(UsersState);

pub fn router(state: UsersState) -> Router {
    let profile_router = Router::new()
        .route("/profile", get(get_profile).patch(update_profile))
        .route("/dashboard", get(dashboard))
        .with_state(state.clone());

    if state.no_signup {
        return profile_router;
    }

    let mut register_router = Router::new()
        .route("/register", post(register))
        .with_state(state.clone());

    if let Some(limits) = state.rate_limit {
        register_router =
            register_router.layer(middleware::from_fn_with_state(limits, rate_limit_register));
    }

    profile_router.merge(register_router)
}

/// Public view of an identity. Never includes the password hash.
#[derive(Serialize)]
pub(super) struct UserResponse {
    id: i64,
    uuid: String,
    email: String,
    first_name: String,
    last_name: String,
    role: UserRole,
    is_staff: bool,
    is_active: bool,
    is_intern: bool,
    internship_id: Option<String>,
    created_at: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            uuid: user.uuid,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            is_staff: user.role.is_staff(),
            role: user.role,
            is_active: user.is_active,
            is_intern: user.is_intern,
            internship_id: user.internship_id,
            created_at: user.created_at,
        }
    }
}

#[derive(Deserialize)]
struct RegisterRequest {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
    #[serde(default)]
    first_name: String,
    #[serde(default)]
    last_name: String,
}

#[derive(Serialize)]
struct RegisterResponse {
    message: &'static str,
    id: i64,
    email: String,
}

async fn register(
    State(state): State<UsersState>,
    ApiJson(payload): ApiJson<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let mut errors = FieldErrors::new();
    let email = errors.require("email", &payload.email);
    errors.email("email", email);
    if payload.password.is_empty() {
        errors.add("password", super::validation::REQUIRED);
    }
    let first_name = payload.first_name.trim();
    let last_name = payload.last_name.trim();
    errors.max_len("first_name", first_name, NAME_MAX_LEN);
    errors.max_len("last_name", last_name, NAME_MAX_LEN);
    errors.finish()?;

    let mut user = state.db.users().create(email, &payload.password).await?;

    if !first_name.is_empty() || !last_name.is_empty() {
        state
            .db
            .users()
            .update_profile(user.id, first_name, last_name)
            .await
            .db_err("Failed to set names")?;
        user.first_name = first_name.to_string();
        user.last_name = last_name.to_string();
    }

    info!(user_id = user.id, "Registered user");

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "User registered successfully",
            id: user.id,
            email: user.email,
        }),
    ))
}

#[derive(Serialize)]
struct ProfileResponse {
    #[serde(flatten)]
    user: UserResponse,
    internships: Vec<Internship>,
    projects: Vec<Project>,
}

async fn get_profile(
    State(state): State<UsersState>,
    Auth(auth): Auth,
) -> Result<impl IntoResponse, ApiError> {
    permit(&auth.principal(), Action::ViewProfile)?;

    let internships = state
        .db
        .internships()
        .list_by_intern(auth.user.id)
        .await
        .db_err("Failed to list internships")?;

    let projects = state
        .db
        .projects()
        .list_by_user(auth.user.id)
        .await
        .db_err("Failed to list projects")?;

    Ok(Json(ProfileResponse {
        user: auth.user.into(),
        internships,
        projects,
    }))
}

#[derive(Deserialize)]
struct UpdateProfileRequest {
    first_name: Option<String>,
    last_name: Option<String>,
}

async fn update_profile(
    State(state): State<UsersState>,
    Auth(auth): Auth,
    ApiJson(payload): ApiJson<UpdateProfileRequest>,
) -> Result<impl IntoResponse, ApiError> {
    permit(&auth.principal(), Action::ViewProfile)?;

    let mut user = auth.user;
    if let Some(first_name) = payload.first_name {
        user.first_name = first_name.trim().to_string();
    }
    if let Some(last_name) = payload.last_name {
        user.last_name = last_name.trim().to_string();
    }

    let mut errors = FieldErrors::new();
    errors.max_len("first_name", &user.first_name, NAME_MAX_LEN);
    errors.max_len("last_name", &user.last_name, NAME_MAX_LEN);
    errors.finish()?;

    state
        .db
        .users()
        .update_profile(user.id, &user.first_name, &user.last_name)
        .await
        .db_err("Failed to update profile")?;

    Ok(Json(UserResponse::from(user)))
}

async fn dashboard(
    State(state): State<UsersState>,
    Auth(auth): Auth,
) -> Result<impl IntoResponse, ApiError> {
    permit(&auth.principal(), Action::ViewProfile)?;

    let internships = state
        .db
        .internships()
        .list_by_intern(auth.user.id)
        .await
        .db_err("Failed to list internships")?;

    Ok(Json(internships))
}
