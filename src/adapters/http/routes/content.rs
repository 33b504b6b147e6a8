//! Help articles and website settings. Reads are public.

use crate::adapters::http::extract::{CurrentUser, MaybeUser};
use crate::adapters::http::state::SharedState;
use crate::domain::{DomainError, HelpArticle};
use crate::usecases::content_service::HelpArticleInput;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde_json::Value;
use std::collections::BTreeMap;

pub async fn list_help(
    State(state): State<SharedState>,
    MaybeUser(user): MaybeUser,
) -> Result<Json<Vec<HelpArticle>>, DomainError> {
    Ok(Json(state.content.list_help(user.as_ref()).await?))
}

pub async fn get_help(
    State(state): State<SharedState>,
    MaybeUser(user): MaybeUser,
    Path(slug): Path<String>,
) -> Result<Json<HelpArticle>, DomainError> {
    Ok(Json(state.content.get_help(user.as_ref(), &slug).await?))
}

pub async fn upsert_help(
    State(state): State<SharedState>,
    CurrentUser(admin): CurrentUser,
    Json(input): Json<HelpArticleInput>,
) -> Result<(StatusCode, Json<HelpArticle>), DomainError> {
    let article = state.content.upsert_help(&admin, input).await?;
    Ok((StatusCode::OK, Json(article)))
}

pub async fn settings(
    State(state): State<SharedState>,
) -> Result<Json<BTreeMap<String, Value>>, DomainError> {
    Ok(Json(state.content.settings().await?))
}

pub async fn put_setting(
    State(state): State<SharedState>,
    CurrentUser(admin): CurrentUser,
    Path(key): Path<String>,
    Json(value): Json<Value>,
) -> Result<StatusCode, DomainError> {
    state.content.put_setting(&admin, &key, value).await?;
    Ok(StatusCode::NO_CONTENT)
}
