//! Project requests. The owner is optional: visitors may submit anonymously.

use serde::Serialize;
use sqlx::sqlite::SqlitePool;

db_enum! {
    /// Progress of a project request, set by staff.
    ProjectStatus {
        Pending => "Pending",
        Processing => "Processing",
        Completed => "Completed",
        Cancelled => "Cancelled",
    }
}

db_enum! {
    PaymentStatus {
        Pending => "Pending",
        Paid => "Paid",
        Failed => "Failed",
    }
}

#[derive(Clone)]
pub struct ProjectStore {
    pool: SqlitePool,
}

#[derive(Debug, Clone, Serialize)]
pub struct Project {
    pub id: i64,
    pub user_id: Option<i64>,
    pub email: String,
    pub title: String,
    pub description: String,
    pub created_at: String,
    pub expected_completion_date: Option<String>,
    pub status: ProjectStatus,
    pub payment_status: PaymentStatus,
}

#[derive(sqlx::FromRow)]
struct ProjectRow {
    id: i64,
    user_id: Option<i64>,
    email: String,
    title: String,
    description: String,
    created_at: String,
    expected_completion_date: Option<String>,
    status: String,
    payment_status: String,
}

impl From<ProjectRow> for Project {
    fn from(row: ProjectRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            email: row.email,
            title: row.title,
            description: row.description,
            created_at: row.created_at,
            expected_completion_date: row.expected_completion_date,
            status: ProjectStatus::parse(&row.status).unwrap_or(ProjectStatus::Pending),
            payment_status: PaymentStatus::parse(&row.payment_status)
                .unwrap_or(PaymentStatus::Pending),
        }
    }
}

const PROJECT_COLUMNS: &str = "id, user_id, email, title, description, created_at, expected_completion_date, status, payment_status";

/// Fields accepted from a project submission.
pub struct NewProject<'a> {
    pub user_id: Option<i64>,
    pub email: &'a str,
    pub title: &'a str,
    pub description: &'a str,
}

/// Staff-only fields. `None` leaves the stored value untouched.
#[derive(Default)]
pub struct ProjectReview<'a> {
    pub status: Option<ProjectStatus>,
    pub payment_status: Option<PaymentStatus>,
    /// `Some(None)` clears the date.
    pub expected_completion_date: Option<Option<&'a str>>,
}

/// A full edit: owner fields are always written, review fields only when set.
pub struct ProjectUpdate<'a> {
    pub title: &'a str,
    pub description: &'a str,
    pub review: ProjectReview<'a>,
}

impl ProjectStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, project: NewProject<'_>) -> Result<Project, sqlx::Error> {
        let row: ProjectRow = sqlx::query_as(&format!(
            "INSERT INTO projects (user_id, email, title, description) VALUES (?, ?, ?, ?) RETURNING {PROJECT_COLUMNS}"
        ))
        .bind(project.user_id)
        .bind(project.email)
        .bind(project.title)
        .bind(project.description)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }

    pub async fn get(&self, id: i64) -> Result<Option<Project>, sqlx::Error> {
        let row: Option<ProjectRow> =
            sqlx::query_as(&format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE id = ?"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(Project::from))
    }

    /// Projects owned by a user, newest first.
    pub async fn list_by_user(&self, user_id: i64) -> Result<Vec<Project>, sqlx::Error> {
        let rows: Vec<ProjectRow> = sqlx::query_as(&format!(
            "SELECT {PROJECT_COLUMNS} FROM projects WHERE user_id = ? ORDER BY id DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Project::from).collect())
    }

    /// Every project, including anonymous submissions, newest first.
    pub async fn list_all(&self) -> Result<Vec<Project>, sqlx::Error> {
        let rows: Vec<ProjectRow> = sqlx::query_as(&format!(
            "SELECT {PROJECT_COLUMNS} FROM projects ORDER BY id DESC"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Project::from).collect())
    }

    /// Apply an edit in a single statement. Returns `None` if the project is gone.
    pub async fn update(
        &self,
        id: i64,
        update: ProjectUpdate<'_>,
    ) -> Result<Option<Project>, sqlx::Error> {
        let review = update.review;
        let row: Option<ProjectRow> = sqlx::query_as(&format!(
            "UPDATE projects SET
                title = ?,
                description = ?,
                status = COALESCE(?, status),
                payment_status = COALESCE(?, payment_status),
                expected_completion_date = CASE WHEN ? THEN ? ELSE expected_completion_date END
             WHERE id = ?
             RETURNING {PROJECT_COLUMNS}"
        ))
        .bind(update.title)
        .bind(update.description)
        .bind(review.status.map(|s| s.as_str()))
        .bind(review.payment_status.map(|s| s.as_str()))
        .bind(review.expected_completion_date.is_some())
        .bind(review.expected_completion_date.flatten())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Project::from))
    }

    pub async fn delete(&self, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM projects WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
