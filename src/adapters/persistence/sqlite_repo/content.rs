//! Help articles and website settings.

use super::{SqliteRepo, collect, first, get_bool, get_string, get_ts, get_uuid, ts};
use crate::domain::{DomainError, HelpArticle};
use crate::ports::ContentRepo;
use chrono::Utc;
use libsql::{Row, params};

fn row_to_article(row: &Row) -> Result<HelpArticle, DomainError> {
    Ok(HelpArticle {
        id: get_uuid(row, 0)?,
        slug: get_string(row, 1)?,
        title: get_string(row, 2)?,
        body: get_string(row, 3)?,
        published: get_bool(row, 4)?,
        updated_at: get_ts(row, 5)?,
    })
}

#[async_trait::async_trait]
impl ContentRepo for SqliteRepo {
    async fn upsert_help_article(&self, a: &HelpArticle) -> Result<HelpArticle, DomainError> {
        let conn = self.conn().await?;
        conn.execute(
            r#"
            INSERT INTO help_articles (id, slug, title, body, published, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT (slug) DO UPDATE SET
                title = excluded.title,
                body = excluded.body,
                published = excluded.published,
                updated_at = excluded.updated_at
            "#,
            params![
                a.id.to_string(),
                a.slug.as_str(),
                a.title.as_str(),
                a.body.as_str(),
                a.published as i64,
                ts(a.updated_at)
            ],
        )
        .await
        .map_err(DomainError::repo)?;
        self.get_help_article(&a.slug)
            .await?
            .ok_or_else(|| DomainError::Repo("help article vanished after upsert".to_string()))
    }

    async fn get_help_article(&self, slug: &str) -> Result<Option<HelpArticle>, DomainError> {
        let conn = self.conn().await?;
        let rows = conn
            .query(
                "SELECT id, slug, title, body, published, updated_at FROM help_articles WHERE slug = ?1",
                params![slug],
            )
            .await
            .map_err(DomainError::repo)?;
        first(rows, row_to_article).await
    }

    async fn list_help_articles(
        &self,
        include_drafts: bool,
    ) -> Result<Vec<HelpArticle>, DomainError> {
        let conn = self.conn().await?;
        let rows = conn
            .query(
                "SELECT id, slug, title, body, published, updated_at FROM help_articles \
                 WHERE ?1 = 1 OR published = 1 ORDER BY title",
                params![include_drafts as i64],
            )
            .await
            .map_err(DomainError::repo)?;
        collect(rows, row_to_article).await
    }

    async fn list_settings(&self) -> Result<Vec<(String, serde_json::Value)>, DomainError> {
        let conn = self.conn().await?;
        let rows = conn
            .query("SELECT key, value FROM website_settings ORDER BY key", ())
            .await
            .map_err(DomainError::repo)?;
        collect(rows, |r| {
            let key = get_string(r, 0)?;
            let raw = get_string(r, 1)?;
            let value = serde_json::from_str(&raw).unwrap_or(serde_json::Value::String(raw));
            Ok((key, value))
        })
        .await
    }

    async fn put_setting(&self, key: &str, value: &serde_json::Value) -> Result<(), DomainError> {
        let conn = self.conn().await?;
        conn.execute(
            r#"
            INSERT INTO website_settings (key, value, updated_at) VALUES (?1, ?2, ?3)
            ON CONFLICT (key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            "#,
            params![key, value.to_string(), ts(Utc::now())],
        )
        .await
        .map_err(DomainError::repo)?;
        Ok(())
    }
}
