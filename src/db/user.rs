use sqlx::sqlite::SqlitePool;

use super::password::{PasswordError, hash_password, verify_password};

#[derive(Clone)]
pub struct UserStore {
    pool: SqlitePool,
}

/// User role for authorization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    User,
    Staff,
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::User => "user",
            UserRole::Staff => "staff",
            UserRole::Admin => "admin",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "admin" => UserRole::Admin,
            "staff" => UserRole::Staff,
            _ => UserRole::User,
        }
    }

    /// Staff and admins see the back office.
    pub fn is_staff(&self) -> bool {
        matches!(self, UserRole::Staff | UserRole::Admin)
    }
}

#[derive(Debug, Clone)]
pub struct User {
    pub id: i64,
    pub uuid: String,
    pub email: String,
    pub role: UserRole,
    pub is_active: bool,
    pub is_intern: bool,
    pub internship_id: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub created_at: String,
}

const USER_COLUMNS: &str = "id, uuid, email, role, is_active, is_intern, internship_id, first_name, last_name, created_at";

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    uuid: String,
    email: String,
    role: String,
    is_active: i32,
    is_intern: i32,
    internship_id: Option<String>,
    first_name: String,
    last_name: String,
    created_at: String,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            uuid: row.uuid,
            email: row.email,
            role: UserRole::from_str(&row.role),
            is_active: row.is_active != 0,
            is_intern: row.is_intern != 0,
            internship_id: row.internship_id,
            first_name: row.first_name,
            last_name: row.last_name,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum UserError {
    #[error("A user with this email already exists")]
    DuplicateEmail,
    /// Shared by unknown emails, wrong passwords and inactive accounts.
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("User not found")]
    NotFound,
    #[error(transparent)]
    Password(#[from] PasswordError),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Trim and lower-case an email so lookups and uniqueness ignore case.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

impl UserStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Register a new active user with the default role.
    pub async fn create(&self, email: &str, password: &str) -> Result<User, UserError> {
        self.create_with_role(email, password, UserRole::User).await
    }

    /// Register a new active user with the given role.
    pub async fn create_with_role(
        &self,
        email: &str,
        password: &str,
        role: UserRole,
    ) -> Result<User, UserError> {
        let email = normalize_email(email);
        let password_hash = hash_password(password).await?;
        let uuid = uuid::Uuid::new_v4().to_string();

        let result =
            sqlx::query("INSERT INTO users (uuid, email, password_hash, role) VALUES (?, ?, ?, ?)")
                .bind(&uuid)
                .bind(&email)
                .bind(&password_hash)
                .bind(role.as_str())
                .execute(&self.pool)
                .await;

        let id = match result {
            Ok(result) => result.last_insert_rowid(),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                return Err(UserError::DuplicateEmail);
            }
            Err(e) => return Err(e.into()),
        };

        self.find_by_id(id).await
    }

    /// Check an email/password pair. Every failure is `InvalidCredentials`.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<User, UserError> {
        let email = normalize_email(email);

        let row: Option<(i64, String, i32)> =
            sqlx::query_as("SELECT id, password_hash, is_active FROM users WHERE email = ?")
                .bind(&email)
                .fetch_optional(&self.pool)
                .await?;

        let (id, hash, is_active) = match row {
            Some((id, hash, is_active)) => (Some(id), Some(hash), is_active != 0),
            None => (None, None, false),
        };

        // Verify even for unknown emails so timing does not leak existence.
        let matched = verify_password(password, hash).await?;

        match id {
            Some(id) if matched && is_active => self.find_by_id(id).await,
            _ => Err(UserError::InvalidCredentials),
        }
    }

    /// Get a user by ID, failing with `NotFound`.
    pub async fn find_by_id(&self, id: i64) -> Result<User, UserError> {
        self.get_by_id(id).await?.ok_or(UserError::NotFound)
    }

    /// Get a user by ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<User>, sqlx::Error> {
        let row: Option<UserRow> =
            sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(User::from))
    }

    /// Get a user by UUID (the token subject).
    pub async fn get_by_uuid(&self, uuid: &str) -> Result<Option<User>, sqlx::Error> {
        let row: Option<UserRow> =
            sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE uuid = ?"))
                .bind(uuid)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(User::from))
    }

    /// Get a user by email (normalized before lookup).
    pub async fn get_by_email(&self, email: &str) -> Result<Option<User>, sqlx::Error> {
        let row: Option<UserRow> =
            sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?"))
                .bind(normalize_email(email))
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(User::from))
    }

    /// Update display names.
    pub async fn update_profile(
        &self,
        id: i64,
        first_name: &str,
        last_name: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE users SET first_name = ?, last_name = ? WHERE id = ?")
            .bind(first_name)
            .bind(last_name)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Set the role for a user.
    pub async fn set_role(&self, id: i64, role: UserRole) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE users SET role = ? WHERE id = ?")
            .bind(role.as_str())
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Activate or deactivate a user. Users are never hard-deleted.
    pub async fn set_active(&self, id: i64, is_active: bool) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE users SET is_active = ? WHERE id = ?")
            .bind(is_active)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Link or unlink a user to an internship code.
    pub async fn set_intern(
        &self,
        id: i64,
        is_intern: bool,
        internship_id: Option<&str>,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE users SET is_intern = ?, internship_id = ? WHERE id = ?")
            .bind(is_intern)
            .bind(internship_id)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// List all users, oldest first.
    pub async fn list(&self) -> Result<Vec<User>, sqlx::Error> {
        let rows: Vec<UserRow> =
            sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY id"))
                .fetch_all(&self.pool)
                .await?;
        Ok(rows.into_iter().map(User::from).collect())
    }
}
