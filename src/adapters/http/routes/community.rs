//! Announcements, meetings and notifications.

use crate::adapters::http::extract::CurrentUser;
use crate::adapters::http::state::SharedState;
use crate::domain::{Announcement, DomainError, Meeting, Notification};
use crate::usecases::announcement_service::NewAnnouncement;
use crate::usecases::meeting_service::NewMeeting;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use serde_json::{Value, json};
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct AnnouncementQuery {
    pub course_id: Option<Uuid>,
}

pub async fn list_announcements(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
    Query(q): Query<AnnouncementQuery>,
) -> Result<Json<Vec<Announcement>>, DomainError> {
    Ok(Json(state.announcements.list(&user, q.course_id).await?))
}

pub async fn publish_announcement(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
    Json(input): Json<NewAnnouncement>,
) -> Result<(StatusCode, Json<Announcement>), DomainError> {
    let announcement = state.announcements.publish(&user, input).await?;
    Ok((StatusCode::CREATED, Json(announcement)))
}

pub async fn delete_announcement(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, DomainError> {
    state.announcements.delete(&user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn create_meeting(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
    Json(input): Json<NewMeeting>,
) -> Result<(StatusCode, Json<Meeting>), DomainError> {
    let meeting = state.meetings.create(&user, input).await?;
    Ok((StatusCode::CREATED, Json(meeting)))
}

pub async fn list_meetings(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<Meeting>>, DomainError> {
    Ok(Json(state.meetings.list(&user).await?))
}

pub async fn get_meeting(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Meeting>, DomainError> {
    Ok(Json(state.meetings.get(&user, id).await?))
}

pub async fn delete_meeting(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, DomainError> {
    state.meetings.delete(&user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct NotificationQuery {
    #[serde(default)]
    pub unread_only: bool,
    pub limit: Option<u32>,
}

pub async fn list_notifications(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
    Query(q): Query<NotificationQuery>,
) -> Result<Json<Vec<Notification>>, DomainError> {
    Ok(Json(
        state
            .notifications
            .list(&user, q.unread_only, q.limit)
            .await?,
    ))
}

pub async fn mark_read(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, DomainError> {
    state.notifications.mark_read(&user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn mark_all_read(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Value>, DomainError> {
    let updated = state.notifications.mark_all_read(&user).await?;
    Ok(Json(json!({ "updated": updated })))
}
