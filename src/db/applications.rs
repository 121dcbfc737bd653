use serde::Serialize;
use sqlx::sqlite::SqlitePool;

db_enum! {
    /// How the applicant wants to take part.
    ApplicationMode {
        Siwes => "siwes",
        Bootcamp => "bootcamp",
        Remote => "remote",
    }
}

#[derive(Clone)]
pub struct ApplicationStore {
    pool: SqlitePool,
}

/// An initial internship application, possibly anonymous.
#[derive(Debug, Clone, Serialize)]
pub struct Application {
    pub id: i64,
    pub user_id: Option<i64>,
    pub email: String,
    pub mode: ApplicationMode,
    pub created_at: String,
}

#[derive(sqlx::FromRow)]
struct ApplicationRow {
    id: i64,
    user_id: Option<i64>,
    email: String,
    mode: String,
    created_at: String,
}

impl From<ApplicationRow> for Application {
    fn from(row: ApplicationRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            email: row.email,
            mode: ApplicationMode::parse(&row.mode).unwrap_or(ApplicationMode::Remote),
            created_at: row.created_at,
        }
    }
}

impl ApplicationStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        user_id: Option<i64>,
        email: &str,
        mode: ApplicationMode,
    ) -> Result<Application, sqlx::Error> {
        let row: ApplicationRow = sqlx::query_as(
            "INSERT INTO internship_applications (user_id, email, mode) VALUES (?, ?, ?)
             RETURNING id, user_id, email, mode, created_at",
        )
        .bind(user_id)
        .bind(email)
        .bind(mode.as_str())
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }

    pub async fn get(&self, id: i64) -> Result<Option<Application>, sqlx::Error> {
        let row: Option<ApplicationRow> = sqlx::query_as(
            "SELECT id, user_id, email, mode, created_at FROM internship_applications WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Application::from))
    }

    pub async fn list_all(&self) -> Result<Vec<Application>, sqlx::Error> {
        let rows: Vec<ApplicationRow> = sqlx::query_as(
            "SELECT id, user_id, email, mode, created_at FROM internship_applications ORDER BY id DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Application::from).collect())
    }
}
