//! Course authoring and enrollment endpoints.

use crate::adapters::http::extract::CurrentUser;
use crate::adapters::http::state::SharedState;
use crate::domain::{Course, CourseOutline, CourseStudent, DomainError, Enrollment, Lesson, Module, StudentEnrollment};
use crate::usecases::course_service::{CoursePatch, NewCourse, NewLesson, NewModule};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use uuid::Uuid;

pub async fn create(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
    Json(input): Json<NewCourse>,
) -> Result<(StatusCode, Json<Course>), DomainError> {
    let course = state.courses.create_course(&user, input).await?;
    Ok((StatusCode::CREATED, Json(course)))
}

pub async fn list(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<Course>>, DomainError> {
    Ok(Json(state.courses.list_courses(&user).await?))
}

pub async fn get(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<CourseOutline>, DomainError> {
    Ok(Json(state.courses.get_outline(&user, id).await?))
}

pub async fn update(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    Json(patch): Json<CoursePatch>,
) -> Result<Json<Course>, DomainError> {
    Ok(Json(state.courses.update_course(&user, id, patch).await?))
}

pub async fn delete(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, DomainError> {
    state.courses.delete_course(&user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn add_module(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
    Path(course_id): Path<Uuid>,
    Json(input): Json<NewModule>,
) -> Result<(StatusCode, Json<Module>), DomainError> {
    let module = state.courses.add_module(&user, course_id, input).await?;
    Ok((StatusCode::CREATED, Json(module)))
}

pub async fn add_lesson(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
    Path(module_id): Path<Uuid>,
    Json(input): Json<NewLesson>,
) -> Result<(StatusCode, Json<Lesson>), DomainError> {
    let lesson = state.courses.add_lesson(&user, module_id, input).await?;
    Ok((StatusCode::CREATED, Json(lesson)))
}

/// 201 on first enrollment, 200 when already enrolled.
pub async fn enroll(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
    Path(course_id): Path<Uuid>,
) -> Result<(StatusCode, Json<Enrollment>), DomainError> {
    let outcome = state.enrollments.enroll(&user, course_id).await?;
    let status = if outcome.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(outcome.enrollment)))
}

pub async fn my_enrollments(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<StudentEnrollment>>, DomainError> {
    Ok(Json(state.enrollments.list_mine(&user).await?))
}

pub async fn students(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
    Path(course_id): Path<Uuid>,
) -> Result<Json<Vec<CourseStudent>>, DomainError> {
    Ok(Json(state.enrollments.list_students(&user, course_id).await?))
}
