//! Administration: user management and platform reporting.

use super::auth_service::AuthService;
use crate::domain::rules::ensure_admin;
use crate::domain::{AccountStatus, DomainError, PlatformSummary, Profile, Role};
use crate::ports::{ProfileRepo, ReportRepo};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub email: String,
    pub full_name: String,
    pub role: Role,
    #[serde(default)]
    pub status: Option<AccountStatus>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreatedUser {
    pub profile: Profile,
    /// Bearer token for the new account; shown once.
    pub token: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserFilter {
    pub role: Option<Role>,
    pub status: Option<AccountStatus>,
}

pub struct AdminService {
    profiles: Arc<dyn ProfileRepo>,
    reports: Arc<dyn ReportRepo>,
    auth: Arc<AuthService>,
}

impl AdminService {
    pub fn new(
        profiles: Arc<dyn ProfileRepo>,
        reports: Arc<dyn ReportRepo>,
        auth: Arc<AuthService>,
    ) -> Self {
        Self {
            profiles,
            reports,
            auth,
        }
    }

    pub async fn create_user(&self, admin: &Profile, input: NewUser) -> Result<CreatedUser, DomainError> {
        ensure_admin(admin)?;
        let email = input.email.trim().to_lowercase();
        if !email.contains('@') {
            return Err(DomainError::validation("invalid email"));
        }
        if input.full_name.trim().is_empty() {
            return Err(DomainError::validation("full_name must not be empty"));
        }
        let profile = Profile {
            id: Uuid::new_v4(),
            email,
            full_name: input.full_name.trim().to_string(),
            role: input.role,
            status: input.status.unwrap_or(AccountStatus::Active),
            created_at: Utc::now(),
        };
        self.profiles.insert_profile(&profile).await?;
        let token = self.auth.issue_session(profile.id).await?;
        info!(user_id = %profile.id, role = profile.role.as_str(), "user created");
        Ok(CreatedUser { profile, token })
    }

    pub async fn set_status(
        &self,
        admin: &Profile,
        id: Uuid,
        status: AccountStatus,
    ) -> Result<Profile, DomainError> {
        ensure_admin(admin)?;
        if id == admin.id && status != AccountStatus::Active {
            return Err(DomainError::validation("admins cannot suspend themselves"));
        }
        if !self.profiles.set_profile_status(id, status).await? {
            return Err(DomainError::not_found(format!("user {id}")));
        }
        info!(user_id = %id, status = status.as_str(), admin_id = %admin.id, "user status changed");
        self.load(id).await
    }

    pub async fn set_role(&self, admin: &Profile, id: Uuid, role: Role) -> Result<Profile, DomainError> {
        ensure_admin(admin)?;
        if id == admin.id && role != Role::Admin {
            return Err(DomainError::validation("admins cannot demote themselves"));
        }
        if !self.profiles.set_profile_role(id, role).await? {
            return Err(DomainError::not_found(format!("user {id}")));
        }
        info!(user_id = %id, role = role.as_str(), admin_id = %admin.id, "user role changed");
        self.load(id).await
    }

    pub async fn list_users(&self, admin: &Profile, filter: UserFilter) -> Result<Vec<Profile>, DomainError> {
        ensure_admin(admin)?;
        self.profiles.list_profiles(filter.role, filter.status).await
    }

    pub async fn summary(&self, admin: &Profile) -> Result<PlatformSummary, DomainError> {
        ensure_admin(admin)?;
        self.reports.platform_summary().await
    }

    async fn load(&self, id: Uuid) -> Result<Profile, DomainError> {
        self.profiles
            .get_profile(id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("user {id}")))
    }
}
