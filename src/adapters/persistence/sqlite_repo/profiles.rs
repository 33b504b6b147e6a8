//! Profiles and bearer sessions.

use super::{SqliteRepo, collect, first, get_string, get_ts, get_uuid, is_unique_violation, ts};
use crate::domain::{AccountStatus, DomainError, Profile, Role};
use crate::ports::ProfileRepo;
use chrono::Utc;
use libsql::{Row, params};
use uuid::Uuid;

const PROFILE_COLUMNS: &str = "id, email, full_name, role, status, created_at";

fn row_to_profile(row: &Row) -> Result<Profile, DomainError> {
    let role = get_string(row, 3)?;
    let status = get_string(row, 4)?;
    Ok(Profile {
        id: get_uuid(row, 0)?,
        email: get_string(row, 1)?,
        full_name: get_string(row, 2)?,
        role: Role::parse(&role)
            .ok_or_else(|| DomainError::Repo(format!("unknown role '{role}'")))?,
        status: AccountStatus::parse(&status)
            .ok_or_else(|| DomainError::Repo(format!("unknown status '{status}'")))?,
        created_at: get_ts(row, 5)?,
    })
}

#[async_trait::async_trait]
impl ProfileRepo for SqliteRepo {
    async fn insert_profile(&self, profile: &Profile) -> Result<(), DomainError> {
        let conn = self.conn().await?;
        conn.execute(
            "INSERT INTO profiles (id, email, full_name, role, status, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                profile.id.to_string(),
                profile.email.as_str(),
                profile.full_name.as_str(),
                profile.role.as_str(),
                profile.status.as_str(),
                ts(profile.created_at)
            ],
        )
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                DomainError::Conflict(format!("email {} already registered", profile.email))
            } else {
                DomainError::repo(e)
            }
        })?;
        Ok(())
    }

    async fn get_profile(&self, id: Uuid) -> Result<Option<Profile>, DomainError> {
        let conn = self.conn().await?;
        let rows = conn
            .query(
                &format!("SELECT {PROFILE_COLUMNS} FROM profiles WHERE id = ?1"),
                params![id.to_string()],
            )
            .await
            .map_err(DomainError::repo)?;
        first(rows, row_to_profile).await
    }

    async fn find_profile_by_email(&self, email: &str) -> Result<Option<Profile>, DomainError> {
        let conn = self.conn().await?;
        let rows = conn
            .query(
                &format!("SELECT {PROFILE_COLUMNS} FROM profiles WHERE lower(email) = lower(?1)"),
                params![email],
            )
            .await
            .map_err(DomainError::repo)?;
        first(rows, row_to_profile).await
    }

    async fn list_profiles(
        &self,
        role: Option<Role>,
        status: Option<AccountStatus>,
    ) -> Result<Vec<Profile>, DomainError> {
        let conn = self.conn().await?;
        let rows = conn
            .query(
                &format!(
                    "SELECT {PROFILE_COLUMNS} FROM profiles \
                     WHERE (?1 IS NULL OR role = ?1) AND (?2 IS NULL OR status = ?2) \
                     ORDER BY created_at DESC"
                ),
                params![
                    role.map(|r| r.as_str().to_string()),
                    status.map(|s| s.as_str().to_string())
                ],
            )
            .await
            .map_err(DomainError::repo)?;
        collect(rows, row_to_profile).await
    }

    async fn set_profile_status(
        &self,
        id: Uuid,
        status: AccountStatus,
    ) -> Result<bool, DomainError> {
        let conn = self.conn().await?;
        let changed = conn
            .execute(
                "UPDATE profiles SET status = ?2 WHERE id = ?1",
                params![id.to_string(), status.as_str()],
            )
            .await
            .map_err(DomainError::repo)?;
        Ok(changed > 0)
    }

    async fn set_profile_role(&self, id: Uuid, role: Role) -> Result<bool, DomainError> {
        let conn = self.conn().await?;
        let changed = conn
            .execute(
                "UPDATE profiles SET role = ?2 WHERE id = ?1",
                params![id.to_string(), role.as_str()],
            )
            .await
            .map_err(DomainError::repo)?;
        Ok(changed > 0)
    }

    async fn active_profile_ids(&self) -> Result<Vec<Uuid>, DomainError> {
        let conn = self.conn().await?;
        let rows = conn
            .query("SELECT id FROM profiles WHERE status != 'banned'", ())
            .await
            .map_err(DomainError::repo)?;
        collect(rows, |r| get_uuid(r, 0)).await
    }

    async fn insert_session(&self, user_id: Uuid, token_hash: &str) -> Result<(), DomainError> {
        let conn = self.conn().await?;
        conn.execute(
            "INSERT INTO sessions (token_hash, user_id, created_at) VALUES (?1, ?2, ?3)",
            params![token_hash, user_id.to_string(), ts(Utc::now())],
        )
        .await
        .map_err(DomainError::repo)?;
        Ok(())
    }

    async fn profile_for_session(&self, token_hash: &str) -> Result<Option<Profile>, DomainError> {
        let conn = self.conn().await?;
        let rows = conn
            .query(
                "SELECT p.id, p.email, p.full_name, p.role, p.status, p.created_at \
                 FROM sessions s JOIN profiles p ON p.id = s.user_id \
                 WHERE s.token_hash = ?1",
                params![token_hash],
            )
            .await
            .map_err(DomainError::repo)?;
        first(rows, row_to_profile).await
    }
}
