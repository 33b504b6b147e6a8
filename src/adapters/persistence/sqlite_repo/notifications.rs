//! In-app notifications.

use super::{SqliteRepo, collect, get_bool, get_opt_string, get_string, get_ts, get_uuid, ts};
use crate::domain::{DomainError, NewNotification, Notification, NotificationKind};
use crate::ports::NotificationRepo;
use chrono::{DateTime, Utc};
use libsql::{Row, params};
use uuid::Uuid;

fn row_to_notification(row: &Row) -> Result<Notification, DomainError> {
    let kind = get_string(row, 2)?;
    Ok(Notification {
        id: get_uuid(row, 0)?,
        user_id: get_uuid(row, 1)?,
        kind: NotificationKind::parse(&kind)
            .ok_or_else(|| DomainError::Repo(format!("unknown notification kind '{kind}'")))?,
        title: get_string(row, 3)?,
        body: get_string(row, 4)?,
        link: get_opt_string(row, 5),
        read: get_bool(row, 6)?,
        created_at: get_ts(row, 7)?,
    })
}

#[async_trait::async_trait]
impl NotificationRepo for SqliteRepo {
    async fn insert_notifications(
        &self,
        user_ids: &[Uuid],
        n: &NewNotification,
        at: DateTime<Utc>,
    ) -> Result<usize, DomainError> {
        if user_ids.is_empty() {
            return Ok(0);
        }
        let conn = self.conn().await?;
        let tx = conn.transaction().await.map_err(DomainError::repo)?;
        for user_id in user_ids {
            tx.execute(
                r#"
                INSERT INTO notifications (id, user_id, kind, title, body, link, read, created_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0, ?7)
                "#,
                params![
                    Uuid::new_v4().to_string(),
                    user_id.to_string(),
                    n.kind.as_str(),
                    n.title.as_str(),
                    n.body.as_str(),
                    n.link.clone(),
                    ts(at)
                ],
            )
            .await
            .map_err(DomainError::repo)?;
        }
        tx.commit().await.map_err(DomainError::repo)?;
        Ok(user_ids.len())
    }

    async fn list_notifications(
        &self,
        user_id: Uuid,
        unread_only: bool,
        limit: u32,
    ) -> Result<Vec<Notification>, DomainError> {
        let conn = self.conn().await?;
        let rows = conn
            .query(
                r#"
                SELECT id, user_id, kind, title, body, link, read, created_at
                FROM notifications
                WHERE user_id = ?1 AND (?2 = 0 OR read = 0)
                ORDER BY created_at DESC
                LIMIT ?3
                "#,
                params![user_id.to_string(), unread_only as i64, limit as i64],
            )
            .await
            .map_err(DomainError::repo)?;
        collect(rows, row_to_notification).await
    }

    async fn mark_read(&self, user_id: Uuid, id: Uuid) -> Result<bool, DomainError> {
        let conn = self.conn().await?;
        let changed = conn
            .execute(
                "UPDATE notifications SET read = 1 WHERE id = ?1 AND user_id = ?2",
                params![id.to_string(), user_id.to_string()],
            )
            .await
            .map_err(DomainError::repo)?;
        Ok(changed > 0)
    }

    async fn mark_all_read(&self, user_id: Uuid) -> Result<u64, DomainError> {
        let conn = self.conn().await?;
        conn.execute(
            "UPDATE notifications SET read = 1 WHERE user_id = ?1 AND read = 0",
            params![user_id.to_string()],
        )
        .await
        .map_err(DomainError::repo)
    }
}
