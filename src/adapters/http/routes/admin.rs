//! Admin user management, reports and the caller profile.

use crate::adapters::http::extract::CurrentUser;
use crate::adapters::http::state::SharedState;
use crate::domain::{AccountStatus, DomainError, PlatformSummary, Profile, Role};
use crate::usecases::admin_service::{CreatedUser, NewUser, UserFilter};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use uuid::Uuid;

pub async fn me(CurrentUser(user): CurrentUser) -> Json<Profile> {
    Json(user)
}

pub async fn create_user(
    State(state): State<SharedState>,
    CurrentUser(admin): CurrentUser,
    Json(input): Json<NewUser>,
) -> Result<(StatusCode, Json<CreatedUser>), DomainError> {
    let created = state.admin.create_user(&admin, input).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn list_users(
    State(state): State<SharedState>,
    CurrentUser(admin): CurrentUser,
    Query(filter): Query<UserFilter>,
) -> Result<Json<Vec<Profile>>, DomainError> {
    Ok(Json(state.admin.list_users(&admin, filter).await?))
}

#[derive(Debug, Deserialize)]
pub struct StatusChange {
    pub status: AccountStatus,
}

pub async fn set_status(
    State(state): State<SharedState>,
    CurrentUser(admin): CurrentUser,
    Path(id): Path<Uuid>,
    Json(change): Json<StatusChange>,
) -> Result<Json<Profile>, DomainError> {
    Ok(Json(state.admin.set_status(&admin, id, change.status).await?))
}

#[derive(Debug, Deserialize)]
pub struct RoleChange {
    pub role: Role,
}

pub async fn set_role(
    State(state): State<SharedState>,
    CurrentUser(admin): CurrentUser,
    Path(id): Path<Uuid>,
    Json(change): Json<RoleChange>,
) -> Result<Json<Profile>, DomainError> {
    Ok(Json(state.admin.set_role(&admin, id, change.role).await?))
}

pub async fn summary(
    State(state): State<SharedState>,
    CurrentUser(admin): CurrentUser,
) -> Result<Json<PlatformSummary>, DomainError> {
    Ok(Json(state.admin.summary(&admin).await?))
}
