//! JWT token generation and validation.

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, errors::ErrorKind};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::db::UserRole;

/// Token type for distinguishing access vs refresh tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenType {
    /// Short-lived access token (5 minutes) - stateless, no JTI
    Access,
    /// Long-lived refresh token (2 weeks) - tracked in database with JTI
    Refresh,
}

/// JWT claims shared by both token types.
///
/// Refresh tokens carry a `jti`; access tokens never do. Both decode into the
/// same struct so a token of the wrong type is reported as such instead of as
/// a parse failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user UUID)
    pub sub: String,
    /// Normalized email
    pub email: String,
    /// User role at issue time
    pub role: UserRole,
    #[serde(rename = "typ")]
    pub token_type: TokenType,
    /// Issued at (Unix timestamp)
    pub iat: u64,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
    /// JWT ID, refresh tokens only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,
}

/// Access token duration: 5 minutes
pub const ACCESS_TOKEN_DURATION_SECS: u64 = 5 * 60;

/// Refresh token duration: 2 weeks
pub const REFRESH_TOKEN_DURATION_SECS: u64 = 14 * 24 * 60 * 60;

/// Configuration for JWT operations.
#[derive(Clone)]
pub struct JwtConfig {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

/// Result of generating an access token (no JTI).
#[derive(Debug, Clone)]
pub struct AccessTokenResult {
    pub token: String,
    /// Token duration in seconds
    pub duration: u64,
}

/// Result of generating a refresh token (with JTI for tracking).
#[derive(Debug, Clone)]
pub struct RefreshTokenResult {
    pub token: String,
    /// JWT ID (unique identifier for database tracking)
    pub jti: String,
    /// Issued at timestamp (Unix seconds)
    pub issued_at: u64,
    /// Expiration timestamp (Unix seconds)
    pub expires_at: u64,
    /// Token duration in seconds
    pub duration: u64,
}

/// Current Unix time in seconds.
pub fn unix_now() -> Result<u64, TokenError> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .map_err(|_| TokenError::TimeError)
}

impl JwtConfig {
    /// Create a new JWT configuration with the given secret.
    pub fn new(secret: &[u8]) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
        }
    }

    /// Generate an access token for a user.
    pub fn generate_access_token(
        &self,
        user_uuid: &str,
        email: &str,
        role: UserRole,
    ) -> Result<AccessTokenResult, TokenError> {
        self.generate_access_token_at(user_uuid, email, role, unix_now()?)
    }

    fn generate_access_token_at(
        &self,
        user_uuid: &str,
        email: &str,
        role: UserRole,
        now: u64,
    ) -> Result<AccessTokenResult, TokenError> {
        let claims = Claims {
            sub: user_uuid.to_string(),
            email: email.to_string(),
            role,
            token_type: TokenType::Access,
            iat: now,
            exp: now + ACCESS_TOKEN_DURATION_SECS,
            jti: None,
        };

        Ok(AccessTokenResult {
            token: self.encode(&claims)?,
            duration: ACCESS_TOKEN_DURATION_SECS,
        })
    }

    /// Generate a refresh token for a user.
    /// The caller is responsible for recording the JTI so it can be revoked.
    pub fn generate_refresh_token(
        &self,
        user_uuid: &str,
        email: &str,
        role: UserRole,
    ) -> Result<RefreshTokenResult, TokenError> {
        self.generate_refresh_token_at(user_uuid, email, role, unix_now()?)
    }

    fn generate_refresh_token_at(
        &self,
        user_uuid: &str,
        email: &str,
        role: UserRole,
        now: u64,
    ) -> Result<RefreshTokenResult, TokenError> {
        let jti = uuid::Uuid::new_v4().to_string();
        let exp = now + REFRESH_TOKEN_DURATION_SECS;

        let claims = Claims {
            sub: user_uuid.to_string(),
            email: email.to_string(),
            role,
            token_type: TokenType::Refresh,
            iat: now,
            exp,
            jti: Some(jti.clone()),
        };

        Ok(RefreshTokenResult {
            token: self.encode(&claims)?,
            jti,
            issued_at: now,
            expires_at: exp,
            duration: REFRESH_TOKEN_DURATION_SECS,
        })
    }

    /// Validate and decode an access token.
    pub fn validate_access_token(&self, token: &str) -> Result<Claims, TokenError> {
        self.validate(token, TokenType::Access)
    }

    /// Validate and decode a refresh token. Does not check revocation.
    pub fn validate_refresh_token(&self, token: &str) -> Result<Claims, TokenError> {
        let claims = self.validate(token, TokenType::Refresh)?;
        if claims.jti.is_none() {
            return Err(TokenError::Malformed);
        }
        Ok(claims)
    }

    fn validate(&self, token: &str, expected: TokenType) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        let token_data = jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Malformed,
            })?;

        if token_data.claims.token_type != expected {
            return Err(TokenError::WrongTokenType);
        }

        Ok(token_data.claims)
    }

    fn encode(&self, claims: &Claims) -> Result<String, TokenError> {
        jsonwebtoken::encode(&Header::default(), claims, &self.encoding_key)
            .map_err(TokenError::Encoding)
    }
}

/// Errors that can occur during JWT operations.
///
/// `Malformed`, `Expired` and `WrongTokenType` are kept apart so callers can
/// tell a client to refresh silently or to log in again.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("Failed to encode token: {0}")]
    Encoding(jsonwebtoken::errors::Error),
    #[error("Token is malformed or has an invalid signature")]
    Malformed,
    #[error("Token has expired")]
    Expired,
    #[error("Wrong token type")]
    WrongTokenType,
    #[error("System time error")]
    TimeError,
}
