//! Caller identity. Resolves bearer tokens to profiles and issues session tokens.
//!
//! Tokens are random (two UUID v4 values, 64 hex chars); only their SHA-256 is stored.

use crate::domain::rules::ensure_not_banned;
use crate::domain::{AccountStatus, DomainError, Profile, Role};
use crate::ports::ProfileRepo;
use chrono::Utc;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

pub struct AuthService {
    profiles: Arc<dyn ProfileRepo>,
}

impl AuthService {
    pub fn new(profiles: Arc<dyn ProfileRepo>) -> Self {
        Self { profiles }
    }

    pub fn hash_token(token: &str) -> String {
        format!("{:x}", Sha256::digest(token.as_bytes()))
    }

    fn generate_token() -> String {
        format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple())
    }

    /// Resolve a bearer token. Missing or unknown tokens are `Unauthorized`; banned
    /// accounts are `Forbidden`.
    pub async fn authenticate(&self, token: Option<&str>) -> Result<Profile, DomainError> {
        let token = token
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(DomainError::Unauthorized)?;
        let profile = self
            .profiles
            .profile_for_session(&Self::hash_token(token))
            .await?
            .ok_or(DomainError::Unauthorized)?;
        ensure_not_banned(&profile)?;
        Ok(profile)
    }

    /// Issue a new session for `user_id` and return the plaintext token.
    pub async fn issue_session(&self, user_id: Uuid) -> Result<String, DomainError> {
        let token = Self::generate_token();
        self.profiles
            .insert_session(user_id, &Self::hash_token(&token))
            .await?;
        Ok(token)
    }

    /// Ensure an admin account exists for `email`. Returns a session token when the
    /// account was created now, `None` when it already existed.
    pub async fn bootstrap_admin(&self, email: &str) -> Result<Option<String>, DomainError> {
        if let Some(existing) = self.profiles.find_profile_by_email(email).await? {
            if existing.role != Role::Admin {
                warn!(email, role = existing.role.as_str(), "bootstrap admin email belongs to a non-admin profile");
            }
            return Ok(None);
        }
        let profile = Profile {
            id: Uuid::new_v4(),
            email: email.to_string(),
            full_name: "Administrator".to_string(),
            role: Role::Admin,
            status: AccountStatus::Active,
            created_at: Utc::now(),
        };
        self.profiles.insert_profile(&profile).await?;
        let token = self.issue_session(profile.id).await?;
        info!(email, user_id = %profile.id, "bootstrap admin created");
        Ok(Some(token))
    }
}
