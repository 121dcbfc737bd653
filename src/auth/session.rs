//! Issuing, refreshing and revoking token pairs.
//!
//! Access tokens are stateless. Refresh tokens are only honoured while their
//! `jti` is present in the `refresh_tokens` table, so deleting the row revokes
//! them.

use serde::Serialize;
use tracing::{error, info};

use super::errors::{ApiAuthError, AuthErrorKind};
use crate::db::{Database, User};
use crate::jwt::JwtConfig;

/// A freshly issued access/refresh pair.
#[derive(Debug, Serialize)]
pub struct SessionTokens {
    pub access: String,
    pub refresh: String,
    /// Access token lifetime in seconds.
    pub expires_in: u64,
}

/// A new access token minted from a refresh token.
#[derive(Debug, Serialize)]
pub struct RefreshedAccess {
    pub access: String,
    pub expires_in: u64,
}

fn db_error(context: &str, err: sqlx::Error) -> ApiAuthError {
    error!("{}: {}", context, err);
    ApiAuthError::new(AuthErrorKind::DatabaseError)
}

/// Issue an access/refresh pair for a user and record the refresh `jti`.
pub async fn issue_session(
    db: &Database,
    jwt: &JwtConfig,
    user: &User,
) -> Result<SessionTokens, ApiAuthError> {
    let access = jwt.generate_access_token(&user.uuid, &user.email, user.role)?;
    let refresh = jwt.generate_refresh_token(&user.uuid, &user.email, user.role)?;

    db.tokens()
        .create(&refresh.jti, user.id, refresh.issued_at, refresh.expires_at)
        .await
        .map_err(|e| db_error("Failed to store refresh token", e))?;

    info!(user_id = user.id, "Issued session");

    Ok(SessionTokens {
        access: access.token,
        refresh: refresh.token,
        expires_in: access.duration,
    })
}

/// Exchange a refresh token for a new access token.
///
/// The role is re-read from the store so a demotion applies to the next
/// access token even though the refresh token still carries the old role.
pub async fn refresh_session(
    db: &Database,
    jwt: &JwtConfig,
    refresh_token: &str,
) -> Result<RefreshedAccess, ApiAuthError> {
    let claims = jwt.validate_refresh_token(refresh_token)?;
    let jti = claims
        .jti
        .as_deref()
        .ok_or_else(|| ApiAuthError::new(AuthErrorKind::MalformedToken))?;

    let record = db
        .tokens()
        .get_by_jti(jti)
        .await
        .map_err(|e| db_error("Failed to check token", e))?
        .ok_or_else(|| ApiAuthError::new(AuthErrorKind::TokenRevoked))?;

    let user = db
        .users()
        .get_by_uuid(&claims.sub)
        .await
        .map_err(|e| db_error("Failed to get user", e))?
        .filter(|user| user.is_active && user.id == record.user_id)
        .ok_or_else(|| ApiAuthError::new(AuthErrorKind::InactiveAccount))?;

    let access = jwt.generate_access_token(&user.uuid, &user.email, user.role)?;

    Ok(RefreshedAccess {
        access: access.token,
        expires_in: access.duration,
    })
}

/// Revoke a refresh token. Returns whether a live session was removed.
pub async fn revoke_session(
    db: &Database,
    jwt: &JwtConfig,
    refresh_token: &str,
) -> Result<bool, ApiAuthError> {
    let claims = jwt.validate_refresh_token(refresh_token)?;
    let Some(jti) = claims.jti.as_deref() else {
        return Err(ApiAuthError::new(AuthErrorKind::MalformedToken));
    };

    let revoked = db
        .tokens()
        .delete_by_jti(jti)
        .await
        .map_err(|e| db_error("Failed to revoke token", e))?;

    if revoked {
        info!(jti, "Revoked refresh token");
    }
    Ok(revoked)
}
