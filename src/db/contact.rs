use serde::Serialize;
use sqlx::sqlite::SqlitePool;

#[derive(Clone)]
pub struct ContactStore {
    pool: SqlitePool,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ContactMessage {
    pub id: i64,
    pub full_name: String,
    pub email: String,
    pub message: String,
    pub created_at: String,
}

impl ContactStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        full_name: &str,
        email: &str,
        message: &str,
    ) -> Result<ContactMessage, sqlx::Error> {
        sqlx::query_as(
            "INSERT INTO contact_messages (full_name, email, message) VALUES (?, ?, ?)
             RETURNING id, full_name, email, message, created_at",
        )
        .bind(full_name)
        .bind(email)
        .bind(message)
        .fetch_one(&self.pool)
        .await
    }

    pub async fn list(&self) -> Result<Vec<ContactMessage>, sqlx::Error> {
        sqlx::query_as(
            "SELECT id, full_name, email, message, created_at FROM contact_messages ORDER BY id DESC",
        )
        .fetch_all(&self.pool)
        .await
    }
}
