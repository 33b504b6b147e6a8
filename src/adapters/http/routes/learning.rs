//! Progress, assignments and submissions.

use crate::adapters::http::extract::CurrentUser;
use crate::adapters::http::state::SharedState;
use crate::domain::{Assignment, DomainError, Submission};
use crate::usecases::assignment_service::{AssignmentPatch, Grade, NewAssignment, NewSubmission};
use crate::usecases::progress_service::{ProgressReport, ProgressUpdate};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use uuid::Uuid;

pub async fn update_progress(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
    Json(update): Json<ProgressUpdate>,
) -> Result<Json<ProgressReport>, DomainError> {
    Ok(Json(state.progress.update_progress(&user, update).await?))
}

pub async fn create_assignment(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
    Path(course_id): Path<Uuid>,
    Json(input): Json<NewAssignment>,
) -> Result<(StatusCode, Json<Assignment>), DomainError> {
    let assignment = state.assignments.create(&user, course_id, input).await?;
    Ok((StatusCode::CREATED, Json(assignment)))
}

pub async fn list_assignments(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
    Path(course_id): Path<Uuid>,
) -> Result<Json<Vec<Assignment>>, DomainError> {
    Ok(Json(state.assignments.list_for_course(&user, course_id).await?))
}

pub async fn get_assignment(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Assignment>, DomainError> {
    Ok(Json(state.assignments.get(&user, id).await?))
}

pub async fn update_assignment(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    Json(patch): Json<AssignmentPatch>,
) -> Result<Json<Assignment>, DomainError> {
    Ok(Json(state.assignments.update(&user, id, patch).await?))
}

pub async fn delete_assignment(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, DomainError> {
    state.assignments.delete(&user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn submit(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
    Path(assignment_id): Path<Uuid>,
    Json(input): Json<NewSubmission>,
) -> Result<(StatusCode, Json<Submission>), DomainError> {
    let submission = state.assignments.submit(&user, assignment_id, input).await?;
    Ok((StatusCode::CREATED, Json(submission)))
}

pub async fn list_submissions(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
    Path(assignment_id): Path<Uuid>,
) -> Result<Json<Vec<Submission>>, DomainError> {
    Ok(Json(state.assignments.list_submissions(&user, assignment_id).await?))
}

pub async fn grade(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
    Path(submission_id): Path<Uuid>,
    Json(grade): Json<Grade>,
) -> Result<Json<Submission>, DomainError> {
    Ok(Json(state.assignments.grade(&user, submission_id, grade).await?))
}
