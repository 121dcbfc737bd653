//! Token API endpoints.
//!
//! - POST `/token` - Exchange email and password for an access/refresh pair
//! - POST `/token/refresh` - Exchange a refresh token for a new access token
//! - POST `/token/logout` - Revoke a refresh token

use axum::{
    Json, Router, extract::State, middleware, response::IntoResponse, routing::post,
};
use serde::Deserialize;
use std::sync::Arc;

use super::error::ApiError;
use super::extract::ApiJson;
use super::validation::{FieldErrors, REQUIRED};
use crate::auth::{issue_session, refresh_session, revoke_session};
use crate::db::Database;
use crate::jwt::JwtConfig;
use crate::rate_limit::{RateLimitConfig, rate_limit_login};

#[derive(Clone)]
pub struct TokensState {
    pub db: Database,
    pub jwt: Arc<JwtConfig>,
    pub rate_limit: Option<Arc<RateLimitConfig>>,
}

pub fn router(state: TokensState) -> Router {
    let mut limited = Router::new()
        .route("/token", post(obtain_token))
        .route("/token/refresh", post(refresh_token))
        .with_state(state.clone());

    if let Some(limits) = state.rate_limit.clone() {
        limited = limited.layer(middleware::from_fn_with_state(limits, rate_limit_login));
    }

    Router::new()
        .route("/token/logout", post(logout))
        .with_state(state)
        .merge(limited)
}

#[derive(Deserialize)]
struct TokenRequest {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

#[derive(Deserialize)]
struct RefreshRequest {
    #[serde(default)]
    refresh: String,
}

fn require_refresh(payload: &RefreshRequest) -> Result<&str, ApiError> {
    let refresh = payload.refresh.trim();
    if refresh.is_empty() {
        return Err(ApiError::field("refresh", REQUIRED));
    }
    Ok(refresh)
}

async fn obtain_token(
    State(state): State<TokensState>,
    ApiJson(payload): ApiJson<TokenRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let mut errors = FieldErrors::new();
    let email = errors.require("email", &payload.email);
    if payload.password.is_empty() {
        errors.add("password", REQUIRED);
    }
    errors.finish()?;

    let user = state
        .db
        .users()
        .authenticate(email, &payload.password)
        .await?;

    let tokens = issue_session(&state.db, &state.jwt, &user).await?;
    Ok(Json(tokens))
}

async fn refresh_token(
    State(state): State<TokensState>,
    ApiJson(payload): ApiJson<RefreshRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let refresh = require_refresh(&payload)?;
    let access = refresh_session(&state.db, &state.jwt, refresh).await?;
    Ok(Json(access))
}

async fn logout(
    State(state): State<TokensState>,
    ApiJson(payload): ApiJson<RefreshRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let refresh = require_refresh(&payload)?;
    let revoked = revoke_session(&state.db, &state.jwt, refresh).await?;
    Ok(Json(serde_json::json!({ "success": true, "revoked": revoked })))
}
