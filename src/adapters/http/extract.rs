//! Caller identity extractors. `Authorization: Bearer <token>`.

use super::state::SharedState;
use crate::domain::{DomainError, Profile};
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

/// Authenticated, non-banned caller. Rejects with 401/403.
pub struct CurrentUser(pub Profile);

/// Caller when a token is present; anonymous otherwise.
pub struct MaybeUser(pub Option<Profile>);

fn bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("bearer "))
}

impl FromRequestParts<SharedState> for CurrentUser {
    type Rejection = DomainError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &SharedState,
    ) -> Result<Self, Self::Rejection> {
        let profile = state.auth.authenticate(bearer_token(parts)).await?;
        Ok(CurrentUser(profile))
    }
}

impl FromRequestParts<SharedState> for MaybeUser {
    type Rejection = DomainError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &SharedState,
    ) -> Result<Self, Self::Rejection> {
        if !parts.headers.contains_key(AUTHORIZATION) {
            return Ok(MaybeUser(None));
        }
        let profile = state.auth.authenticate(bearer_token(parts)).await?;
        Ok(MaybeUser(Some(profile)))
    }
}
