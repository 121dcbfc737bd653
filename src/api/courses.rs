//! Courses, their materials and timetables.
//!
//! Browsing is public. Creating courses or attaching materials and
//! timetable entries requires staff.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use super::error::{ApiError, ResultExt};
use super::extract::{ApiJson, ApiPath};
use super::validation::FieldErrors;
use crate::auth::{Auth, OptionalAuth};
use crate::db::{Course, CourseMaterial, Database, MaterialType, NewCourse, TimetableEntry};
use crate::impl_has_auth_backend;
use crate::jwt::JwtConfig;
use crate::policy::{Action, permit};

const TITLE_MAX_LEN: usize = 255;
const LABEL_MAX_LEN: usize = 100;

#[derive(Clone)]
pub struct CoursesState {
    pub db: Database,
    pub jwt: Arc<JwtConfig>,
}

impl_has_auth_backend!(CoursesState);

pub fn router(state: CoursesState) -> Router {
    Router::new()
        .route("/courses", get(list_courses).post(create_course))
        .route("/courses/{id}", get(get_course))
        .route("/courses/{id}/materials", post(add_material))
        .route("/courses/{id}/timetable", get(get_timetable).post(add_timetable_entry))
        .with_state(state)
}

/// A course with its materials and timetable.
#[derive(Serialize)]
pub(super) struct CourseDetail {
    #[serde(flatten)]
    course: Course,
    materials: Vec<CourseMaterial>,
    timetables: Vec<TimetableEntry>,
}

impl CourseDetail {
    pub(super) async fn load(db: &Database, course: Course) -> Result<Self, ApiError> {
        let materials = db
            .courses()
            .list_materials(course.id)
            .await
            .db_err("Failed to list materials")?;
        let timetables = db
            .courses()
            .list_timetable(course.id)
            .await
            .db_err("Failed to list timetable")?;
        Ok(Self {
            course,
            materials,
            timetables,
        })
    }
}

async fn find_course(db: &Database, id: i64) -> Result<Course, ApiError> {
    db.courses()
        .get(id)
        .await
        .db_err("Failed to get course")?
        .ok_or_else(|| ApiError::not_found("Course not found"))
}

async fn list_courses(
    State(state): State<CoursesState>,
    auth: OptionalAuth,
) -> Result<impl IntoResponse, ApiError> {
    permit(&auth.principal(), Action::BrowseCourses)?;

    let courses = state
        .db
        .courses()
        .list()
        .await
        .db_err("Failed to list courses")?;
    Ok(Json(courses))
}

async fn get_course(
    State(state): State<CoursesState>,
    auth: OptionalAuth,
    ApiPath(id): ApiPath<i64>,
) -> Result<impl IntoResponse, ApiError> {
    permit(&auth.principal(), Action::BrowseCourses)?;

    let course = find_course(&state.db, id).await?;
    Ok(Json(CourseDetail::load(&state.db, course).await?))
}

#[derive(Deserialize)]
struct CreateCourseRequest {
    #[serde(default)]
    title: String,
    description: Option<String>,
    #[serde(default)]
    category: String,
    #[serde(default)]
    language: String,
    #[serde(default)]
    framework: String,
}

async fn create_course(
    State(state): State<CoursesState>,
    Auth(auth): Auth,
    ApiJson(payload): ApiJson<CreateCourseRequest>,
) -> Result<impl IntoResponse, ApiError> {
    permit(&auth.principal(), Action::ManageCourses)?;

    let mut errors = FieldErrors::new();
    let title = errors.require("title", &payload.title);
    errors.max_len("title", title, TITLE_MAX_LEN);
    let category = errors.require("category", &payload.category);
    errors.max_len("category", category, LABEL_MAX_LEN);
    let language = errors.require("language", &payload.language);
    errors.max_len("language", language, LABEL_MAX_LEN);
    let framework = errors.require("framework", &payload.framework);
    errors.max_len("framework", framework, LABEL_MAX_LEN);
    errors.finish()?;

    let description = payload
        .description
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty());

    let course = state
        .db
        .courses()
        .create(NewCourse {
            title,
            description,
            category,
            language,
            framework,
        })
        .await
        .db_err("Failed to create course")?;

    info!(course_id = course.id, user_id = auth.user.id, "Created course");

    Ok((StatusCode::CREATED, Json(course)))
}

#[derive(Deserialize)]
struct AddMaterialRequest {
    #[serde(default)]
    title: String,
    #[serde(default)]
    material_type: String,
    /// Path or URL of the stored file.
    #[serde(default)]
    file: String,
}

async fn add_material(
    State(state): State<CoursesState>,
    Auth(auth): Auth,
    ApiPath(id): ApiPath<i64>,
    ApiJson(payload): ApiJson<AddMaterialRequest>,
) -> Result<impl IntoResponse, ApiError> {
    permit(&auth.principal(), Action::ManageCourses)?;
    let course = find_course(&state.db, id).await?;

    let mut errors = FieldErrors::new();
    let title = errors.require("title", &payload.title);
    errors.max_len("title", title, TITLE_MAX_LEN);
    let material_type = errors.require("material_type", &payload.material_type);
    let material_type = errors.choice("material_type", material_type, MaterialType::parse);
    let file = errors.require("file", &payload.file);
    errors.finish()?;

    let Some(material_type) = material_type else {
        return Err(ApiError::field("material_type", super::validation::REQUIRED));
    };

    let material = state
        .db
        .courses()
        .add_material(course.id, title, material_type, file)
        .await
        .db_err("Failed to add material")?;

    Ok((StatusCode::CREATED, Json(material)))
}

async fn get_timetable(
    State(state): State<CoursesState>,
    auth: OptionalAuth,
    ApiPath(id): ApiPath<i64>,
) -> Result<impl IntoResponse, ApiError> {
    permit(&auth.principal(), Action::BrowseCourses)?;

    let course = find_course(&state.db, id).await?;
    let entries = state
        .db
        .courses()
        .list_timetable(course.id)
        .await
        .db_err("Failed to list timetable")?;
    Ok(Json(entries))
}

#[derive(Deserialize)]
struct AddTimetableRequest {
    #[serde(default)]
    title: String,
    #[serde(default)]
    start_time: String,
    #[serde(default)]
    end_time: String,
    #[serde(default)]
    is_live_session: bool,
    location: Option<String>,
}

async fn add_timetable_entry(
    State(state): State<CoursesState>,
    Auth(auth): Auth,
    ApiPath(id): ApiPath<i64>,
    ApiJson(payload): ApiJson<AddTimetableRequest>,
) -> Result<impl IntoResponse, ApiError> {
    permit(&auth.principal(), Action::ManageCourses)?;
    let course = find_course(&state.db, id).await?;

    let mut errors = FieldErrors::new();
    let title = errors.require("title", &payload.title);
    errors.max_len("title", title, TITLE_MAX_LEN);
    let start_raw = errors.require("start_time", &payload.start_time);
    let start = errors.datetime("start_time", start_raw);
    let end_raw = errors.require("end_time", &payload.end_time);
    let end = errors.datetime("end_time", end_raw);
    if matches!((start, end), (Some(start), Some(end)) if end <= start) {
        errors.add("end_time", "End time must be after start time.");
    }
    errors.finish()?;

    let (Some(start), Some(end)) = (start, end) else {
        return Err(ApiError::bad_request("Invalid time range"));
    };

    let location = payload
        .location
        .as_deref()
        .map(str::trim)
        .filter(|l| !l.is_empty());

    // Stored normalized to UTC so ordering by text is chronological.
    let entry = state
        .db
        .courses()
        .add_timetable_entry(
            course.id,
            title,
            &start.to_utc().to_rfc3339(),
            &end.to_utc().to_rfc3339(),
            payload.is_live_session,
            location,
        )
        .await
        .db_err("Failed to add timetable entry")?;

    Ok((StatusCode::CREATED, Json(entry)))
}
