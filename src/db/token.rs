//! Refresh token tracking and revocation.
//!
//! Only refresh tokens are stored in the database for revocation support.
//! Access tokens are stateless and short-lived (5 minutes). Timestamps are
//! Unix seconds, matching the JWT `iat`/`exp` claims.

use sqlx::sqlite::SqlitePool;

/// An unrevoked refresh token record.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RefreshToken {
    pub id: i64,
    pub jti: String,
    pub user_id: i64,
    pub issued_at: i64,
    pub expires_at: i64,
    pub created_at: String,
}

/// Store for managing refresh tokens.
pub struct TokenStore {
    pool: SqlitePool,
}

impl TokenStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Record a newly issued refresh token.
    pub async fn create(
        &self,
        jti: &str,
        user_id: i64,
        issued_at: u64,
        expires_at: u64,
    ) -> Result<i64, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO refresh_tokens (jti, user_id, issued_at, expires_at) VALUES (?, ?, ?, ?)",
        )
        .bind(jti)
        .bind(user_id)
        .bind(issued_at as i64)
        .bind(expires_at as i64)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Get a token by its JWT ID. `None` means revoked or never issued.
    pub async fn get_by_jti(&self, jti: &str) -> Result<Option<RefreshToken>, sqlx::Error> {
        sqlx::query_as(
            "SELECT id, jti, user_id, issued_at, expires_at, created_at FROM refresh_tokens WHERE jti = ?",
        )
        .bind(jti)
        .fetch_optional(&self.pool)
        .await
    }

    /// Delete a token by its JWT ID (revoke).
    pub async fn delete_by_jti(&self, jti: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE jti = ?")
            .bind(jti)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete all expired tokens.
    pub async fn delete_expired(&self) -> Result<u64, sqlx::Error> {
        let result =
            sqlx::query("DELETE FROM refresh_tokens WHERE expires_at < CAST(strftime('%s', 'now') AS INTEGER)")
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected())
    }

    /// Delete all tokens for a user (logout everywhere).
    pub async fn delete_all_by_user(&self, user_id: i64) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE user_id = ?")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
