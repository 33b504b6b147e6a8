//! Meetings and their participants.

use super::{SqliteRepo, collect, first, get_string, get_ts, get_uuid, scalar, ts};
use crate::domain::{DomainError, Meeting};
use crate::ports::MeetingRepo;
use libsql::{Row, params};
use uuid::Uuid;

const MEETING_COLUMNS: &str =
    "m.id, m.course_id, m.host_id, m.title, m.starts_at, m.room_name, m.room_url, m.created_at";

fn row_to_meeting(row: &Row) -> Result<Meeting, DomainError> {
    Ok(Meeting {
        id: get_uuid(row, 0)?,
        course_id: get_uuid(row, 1)?,
        host_id: get_uuid(row, 2)?,
        title: get_string(row, 3)?,
        starts_at: get_ts(row, 4)?,
        room_name: get_string(row, 5)?,
        room_url: get_string(row, 6)?,
        created_at: get_ts(row, 7)?,
    })
}

#[async_trait::async_trait]
impl MeetingRepo for SqliteRepo {
    async fn insert_meeting(&self, m: &Meeting) -> Result<(), DomainError> {
        let conn = self.conn().await?;
        conn.execute(
            r#"
            INSERT INTO meetings (id, course_id, host_id, title, starts_at, room_name, room_url, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                m.id.to_string(),
                m.course_id.to_string(),
                m.host_id.to_string(),
                m.title.as_str(),
                ts(m.starts_at),
                m.room_name.as_str(),
                m.room_url.as_str(),
                ts(m.created_at)
            ],
        )
        .await
        .map_err(DomainError::repo)?;
        Ok(())
    }

    async fn add_participants(
        &self,
        meeting_id: Uuid,
        user_ids: &[Uuid],
    ) -> Result<(), DomainError> {
        if user_ids.is_empty() {
            return Ok(());
        }
        let conn = self.conn().await?;
        let tx = conn.transaction().await.map_err(DomainError::repo)?;
        for user_id in user_ids {
            tx.execute(
                "INSERT INTO meeting_participants (meeting_id, user_id) VALUES (?1, ?2) \
                 ON CONFLICT (meeting_id, user_id) DO NOTHING",
                params![meeting_id.to_string(), user_id.to_string()],
            )
            .await
            .map_err(DomainError::repo)?;
        }
        tx.commit().await.map_err(DomainError::repo)?;
        Ok(())
    }

    async fn get_meeting(&self, id: Uuid) -> Result<Option<Meeting>, DomainError> {
        let conn = self.conn().await?;
        let rows = conn
            .query(
                &format!("SELECT {MEETING_COLUMNS} FROM meetings m WHERE m.id = ?1"),
                params![id.to_string()],
            )
            .await
            .map_err(DomainError::repo)?;
        first(rows, row_to_meeting).await
    }

    async fn is_participant(&self, meeting_id: Uuid, user_id: Uuid) -> Result<bool, DomainError> {
        let conn = self.conn().await?;
        let rows = conn
            .query(
                "SELECT COUNT(*) FROM meeting_participants WHERE meeting_id = ?1 AND user_id = ?2",
                params![meeting_id.to_string(), user_id.to_string()],
            )
            .await
            .map_err(DomainError::repo)?;
        Ok(scalar(rows).await? > 0)
    }

    async fn list_meetings(&self, user_id: Option<Uuid>) -> Result<Vec<Meeting>, DomainError> {
        let conn = self.conn().await?;
        let rows = conn
            .query(
                &format!(
                    "SELECT {MEETING_COLUMNS} FROM meetings m \
                     WHERE ?1 IS NULL OR m.id IN (SELECT meeting_id FROM meeting_participants WHERE user_id = ?1) \
                     ORDER BY m.starts_at"
                ),
                params![user_id.map(|id| id.to_string())],
            )
            .await
            .map_err(DomainError::repo)?;
        collect(rows, row_to_meeting).await
    }

    async fn delete_meeting(&self, id: Uuid) -> Result<bool, DomainError> {
        let conn = self.conn().await?;
        let deleted = conn
            .execute("DELETE FROM meetings WHERE id = ?1", params![id.to_string()])
            .await
            .map_err(DomainError::repo)?;
        Ok(deleted > 0)
    }
}
