//! Axum extractors for authentication.

use axum::{extract::FromRequestParts, http::request::Parts};

use super::bearer::access_credential;
use super::errors::{ApiAuthError, AuthErrorKind};
use super::state::HasAuthBackend;
use super::types::AuthenticatedUser;
use crate::policy::Principal;

/// Verify the access credential on a request and load its user.
async fn authenticate_request<S>(
    parts: &Parts,
    state: &S,
) -> Result<AuthenticatedUser, ApiAuthError>
where
    S: HasAuthBackend + Send + Sync,
{
    let token = access_credential(&parts.headers)
        .ok_or_else(|| ApiAuthError::new(AuthErrorKind::NotAuthenticated))?;

    let claims = state.jwt().validate_access_token(token)?;

    let user = state
        .db()
        .users()
        .get_by_uuid(&claims.sub)
        .await
        .map_err(|e| {
            tracing::error!("Failed to get user: {}", e);
            ApiAuthError::new(AuthErrorKind::DatabaseError)
        })?
        .ok_or_else(|| ApiAuthError::new(AuthErrorKind::InactiveAccount))?;

    if !user.is_active {
        return Err(ApiAuthError::new(AuthErrorKind::InactiveAccount));
    }

    Ok(AuthenticatedUser { claims, user })
}

/// Extractor for endpoints that require a signed-in, active user.
pub struct Auth(pub AuthenticatedUser);

impl<S> FromRequestParts<S> for Auth
where
    S: HasAuthBackend + Send + Sync,
{
    type Rejection = ApiAuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        authenticate_request(parts, state).await.map(Auth)
    }
}

/// Optional authentication extractor. A request without any credential is
/// anonymous; a credential that is present must be valid.
pub struct OptionalAuth(pub Option<AuthenticatedUser>);

impl OptionalAuth {
    pub fn principal(&self) -> Principal {
        self.0
            .as_ref()
            .map_or(Principal::Anonymous, AuthenticatedUser::principal)
    }

    pub fn user_id(&self) -> Option<i64> {
        self.0.as_ref().map(|auth| auth.user.id)
    }
}

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: HasAuthBackend + Send + Sync,
{
    type Rejection = ApiAuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if access_credential(&parts.headers).is_none() {
            return Ok(OptionalAuth(None));
        }
        authenticate_request(parts, state)
            .await
            .map(|user| OptionalAuth(Some(user)))
    }
}
