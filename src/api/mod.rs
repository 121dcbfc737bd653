mod admin;
mod applications;
mod courses;
mod error;
mod extract;
mod internships;
mod projects;
mod tokens;
mod users;
mod validation;

use axum::Router;
use std::sync::Arc;

use crate::db::Database;
use crate::jwt::JwtConfig;
use crate::rate_limit::RateLimitConfig;

pub use error::{ApiError, ResultExt};
pub use validation::is_valid_email;

/// Create the API router. Routes are mounted under `/api` by the caller.
pub fn create_api_router(
    db: Database,
    jwt: Arc<JwtConfig>,
    no_signup: bool,
    rate_limit: Option<Arc<RateLimitConfig>>,
) -> Router {
    let users_state = users::UsersState {
        db: db.clone(),
        jwt: jwt.clone(),
        no_signup,
        rate_limit: rate_limit.clone(),
    };

    let tokens_state = tokens::TokensState {
        db: db.clone(),
        jwt: jwt.clone(),
        rate_limit,
    };

    let internships_state = internships::InternshipsState {
        db: db.clone(),
        jwt: jwt.clone(),
    };

    let courses_state = courses::CoursesState {
        db: db.clone(),
        jwt: jwt.clone(),
    };

    let projects_state = projects::ProjectsState {
        db: db.clone(),
        jwt: jwt.clone(),
    };

    let applications_state = applications::ApplicationsState {
        db: db.clone(),
        jwt: jwt.clone(),
    };

    let admin_state = admin::AdminState { db, jwt };

    Router::new()
        .merge(users::router(users_state))
        .merge(tokens::router(tokens_state))
        .merge(internships::router(internships_state))
        .merge(courses::router(courses_state))
        .merge(projects::router(projects_state))
        .merge(applications::router(applications_state))
        .merge(admin::router(admin_state))
}
