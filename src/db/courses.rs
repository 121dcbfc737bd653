//! Courses and their reference data. None of it is owned by a user.

use serde::Serialize;
use sqlx::sqlite::SqlitePool;

db_enum! {
    MaterialType {
        Video => "video",
        Image => "image",
        Pdf => "pdf",
    }
}

#[derive(Clone)]
pub struct CourseStore {
    pool: SqlitePool,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Course {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub category: String,
    pub language: String,
    pub framework: String,
    pub created_at: String,
}

pub struct NewCourse<'a> {
    pub title: &'a str,
    pub description: Option<&'a str>,
    pub category: &'a str,
    pub language: &'a str,
    pub framework: &'a str,
}

/// A material entry. `file` is a reference (path or URL), never the bytes.
#[derive(Debug, Clone, Serialize)]
pub struct CourseMaterial {
    pub id: i64,
    pub course_id: i64,
    pub title: String,
    pub material_type: MaterialType,
    pub file: String,
    pub uploaded_at: String,
}

#[derive(sqlx::FromRow)]
struct CourseMaterialRow {
    id: i64,
    course_id: i64,
    title: String,
    material_type: String,
    file: String,
    uploaded_at: String,
}

impl From<CourseMaterialRow> for CourseMaterial {
    fn from(row: CourseMaterialRow) -> Self {
        Self {
            id: row.id,
            course_id: row.course_id,
            title: row.title,
            material_type: MaterialType::parse(&row.material_type).unwrap_or(MaterialType::Pdf),
            file: row.file,
            uploaded_at: row.uploaded_at,
        }
    }
}

/// A timetable entry. Times are RFC 3339 strings.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct TimetableEntry {
    pub id: i64,
    pub course_id: i64,
    pub title: String,
    pub start_time: String,
    pub end_time: String,
    pub is_live_session: bool,
    pub location: Option<String>,
}

impl CourseStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, course: NewCourse<'_>) -> Result<Course, sqlx::Error> {
        sqlx::query_as(
            "INSERT INTO courses (title, description, category, language, framework) VALUES (?, ?, ?, ?, ?)
             RETURNING id, title, description, category, language, framework, created_at",
        )
        .bind(course.title)
        .bind(course.description)
        .bind(course.category)
        .bind(course.language)
        .bind(course.framework)
        .fetch_one(&self.pool)
        .await
    }

    pub async fn get(&self, id: i64) -> Result<Option<Course>, sqlx::Error> {
        sqlx::query_as(
            "SELECT id, title, description, category, language, framework, created_at FROM courses WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn list(&self) -> Result<Vec<Course>, sqlx::Error> {
        sqlx::query_as(
            "SELECT id, title, description, category, language, framework, created_at FROM courses ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await
    }

    pub async fn add_material(
        &self,
        course_id: i64,
        title: &str,
        material_type: MaterialType,
        file: &str,
    ) -> Result<CourseMaterial, sqlx::Error> {
        let row: CourseMaterialRow = sqlx::query_as(
            "INSERT INTO course_materials (course_id, title, material_type, file) VALUES (?, ?, ?, ?)
             RETURNING id, course_id, title, material_type, file, uploaded_at",
        )
        .bind(course_id)
        .bind(title)
        .bind(material_type.as_str())
        .bind(file)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }

    pub async fn list_materials(&self, course_id: i64) -> Result<Vec<CourseMaterial>, sqlx::Error> {
        let rows: Vec<CourseMaterialRow> = sqlx::query_as(
            "SELECT id, course_id, title, material_type, file, uploaded_at FROM course_materials WHERE course_id = ? ORDER BY id",
        )
        .bind(course_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(CourseMaterial::from).collect())
    }

    pub async fn add_timetable_entry(
        &self,
        course_id: i64,
        title: &str,
        start_time: &str,
        end_time: &str,
        is_live_session: bool,
        location: Option<&str>,
    ) -> Result<TimetableEntry, sqlx::Error> {
        sqlx::query_as(
            "INSERT INTO timetables (course_id, title, start_time, end_time, is_live_session, location) VALUES (?, ?, ?, ?, ?, ?)
             RETURNING id, course_id, title, start_time, end_time, is_live_session, location",
        )
        .bind(course_id)
        .bind(title)
        .bind(start_time)
        .bind(end_time)
        .bind(is_live_session)
        .bind(location)
        .fetch_one(&self.pool)
        .await
    }

    /// Timetable for a course in chronological order.
    pub async fn list_timetable(&self, course_id: i64) -> Result<Vec<TimetableEntry>, sqlx::Error> {
        sqlx::query_as(
            "SELECT id, course_id, title, start_time, end_time, is_live_session, location FROM timetables WHERE course_id = ? ORDER BY start_time",
        )
        .bind(course_id)
        .fetch_all(&self.pool)
        .await
    }
}
