//! Announcements, global (no course) or per course.

use super::{SqliteRepo, collect, first, get_opt_uuid, get_string, get_ts, get_uuid, ts};
use crate::domain::{Announcement, DomainError};
use crate::ports::AnnouncementRepo;
use libsql::{Row, params};
use uuid::Uuid;

fn row_to_announcement(row: &Row) -> Result<Announcement, DomainError> {
    Ok(Announcement {
        id: get_uuid(row, 0)?,
        author_id: get_uuid(row, 1)?,
        course_id: get_opt_uuid(row, 2),
        title: get_string(row, 3)?,
        body: get_string(row, 4)?,
        created_at: get_ts(row, 5)?,
    })
}

#[async_trait::async_trait]
impl AnnouncementRepo for SqliteRepo {
    async fn insert_announcement(&self, a: &Announcement) -> Result<(), DomainError> {
        let conn = self.conn().await?;
        conn.execute(
            r#"
            INSERT INTO announcements (id, author_id, course_id, title, body, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                a.id.to_string(),
                a.author_id.to_string(),
                a.course_id.map(|id| id.to_string()),
                a.title.as_str(),
                a.body.as_str(),
                ts(a.created_at)
            ],
        )
        .await
        .map_err(DomainError::repo)?;
        Ok(())
    }

    async fn get_announcement(&self, id: Uuid) -> Result<Option<Announcement>, DomainError> {
        let conn = self.conn().await?;
        let rows = conn
            .query(
                "SELECT id, author_id, course_id, title, body, created_at FROM announcements WHERE id = ?1",
                params![id.to_string()],
            )
            .await
            .map_err(DomainError::repo)?;
        first(rows, row_to_announcement).await
    }

    async fn list_announcements(
        &self,
        audience: Option<Uuid>,
        course_id: Option<Uuid>,
    ) -> Result<Vec<Announcement>, DomainError> {
        let conn = self.conn().await?;
        let rows = conn
            .query(
                r#"
                SELECT a.id, a.author_id, a.course_id, a.title, a.body, a.created_at
                FROM announcements a
                WHERE (?2 IS NULL OR a.course_id = ?2)
                  AND (
                    ?1 IS NULL
                    OR a.course_id IS NULL
                    OR a.course_id IN (SELECT course_id FROM enrollments WHERE student_id = ?1)
                    OR a.course_id IN (SELECT id FROM courses WHERE instructor_id = ?1)
                  )
                ORDER BY a.created_at DESC
                "#,
                params![
                    audience.map(|id| id.to_string()),
                    course_id.map(|id| id.to_string())
                ],
            )
            .await
            .map_err(DomainError::repo)?;
        collect(rows, row_to_announcement).await
    }

    async fn delete_announcement(&self, id: Uuid) -> Result<bool, DomainError> {
        let conn = self.conn().await?;
        let deleted = conn
            .execute("DELETE FROM announcements WHERE id = ?1", params![id.to_string()])
            .await
            .map_err(DomainError::repo)?;
        Ok(deleted > 0)
    }
}
