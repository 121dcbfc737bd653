//! Internship enrollments. Each internship belongs to exactly one intern.

use serde::Serialize;
use sqlx::sqlite::SqlitePool;

db_enum! {
    InternshipStatus {
        Pending => "Pending",
        Ongoing => "Ongoing",
        Completed => "Completed",
        Cancelled => "Cancelled",
    }
}

db_enum! {
    InternshipDuration {
        ThreeMonths => "3 Months",
        SixMonths => "6 Months",
        NineMonths => "9 Months",
        TwelveMonths => "12 Months",
    }
}

#[derive(Clone)]
pub struct InternshipStore {
    pool: SqlitePool,
}

#[derive(Debug, Clone, Serialize)]
pub struct Internship {
    pub id: i64,
    pub intern_id: i64,
    pub course_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub date_of_birth: String,
    pub starting_date: String,
    pub completion_date: String,
    pub duration: InternshipDuration,
    pub status: InternshipStatus,
    pub created_at: String,
}

#[derive(sqlx::FromRow)]
struct InternshipRow {
    id: i64,
    intern_id: i64,
    course_id: i64,
    first_name: String,
    last_name: String,
    email: String,
    date_of_birth: String,
    starting_date: String,
    completion_date: String,
    duration: String,
    status: String,
    created_at: String,
}

impl From<InternshipRow> for Internship {
    fn from(row: InternshipRow) -> Self {
        Self {
            id: row.id,
            intern_id: row.intern_id,
            course_id: row.course_id,
            first_name: row.first_name,
            last_name: row.last_name,
            email: row.email,
            date_of_birth: row.date_of_birth,
            starting_date: row.starting_date,
            completion_date: row.completion_date,
            duration: InternshipDuration::parse(&row.duration)
                .unwrap_or(InternshipDuration::ThreeMonths),
            status: InternshipStatus::parse(&row.status).unwrap_or(InternshipStatus::Pending),
            created_at: row.created_at,
        }
    }
}

const INTERNSHIP_COLUMNS: &str = "id, intern_id, course_id, first_name, last_name, email, date_of_birth, starting_date, completion_date, duration, status, created_at";

/// A validated enrollment. Dates are ISO 8601 (`YYYY-MM-DD`).
pub struct NewInternship<'a> {
    pub intern_id: i64,
    pub course_id: i64,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub email: &'a str,
    pub date_of_birth: &'a str,
    pub starting_date: &'a str,
    pub completion_date: &'a str,
    pub duration: InternshipDuration,
}

impl InternshipStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, internship: NewInternship<'_>) -> Result<Internship, sqlx::Error> {
        let row: InternshipRow = sqlx::query_as(&format!(
            "INSERT INTO internships (intern_id, course_id, first_name, last_name, email, date_of_birth, starting_date, completion_date, duration)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?) RETURNING {INTERNSHIP_COLUMNS}"
        ))
        .bind(internship.intern_id)
        .bind(internship.course_id)
        .bind(internship.first_name)
        .bind(internship.last_name)
        .bind(internship.email)
        .bind(internship.date_of_birth)
        .bind(internship.starting_date)
        .bind(internship.completion_date)
        .bind(internship.duration.as_str())
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }

    pub async fn get(&self, id: i64) -> Result<Option<Internship>, sqlx::Error> {
        let row: Option<InternshipRow> = sqlx::query_as(&format!(
            "SELECT {INTERNSHIP_COLUMNS} FROM internships WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Internship::from))
    }

    /// Internships of one intern, newest first.
    pub async fn list_by_intern(&self, intern_id: i64) -> Result<Vec<Internship>, sqlx::Error> {
        let rows: Vec<InternshipRow> = sqlx::query_as(&format!(
            "SELECT {INTERNSHIP_COLUMNS} FROM internships WHERE intern_id = ? ORDER BY id DESC"
        ))
        .bind(intern_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Internship::from).collect())
    }

    pub async fn set_status(&self, id: i64, status: InternshipStatus) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE internships SET status = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
