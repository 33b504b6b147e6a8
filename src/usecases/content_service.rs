//! Help articles and website settings.

use crate::domain::rules::{ensure_admin, validate_title};
use crate::domain::{DomainError, HelpArticle, Profile};
use crate::ports::ContentRepo;
use chrono::Utc;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Clone, Deserialize)]
pub struct HelpArticleInput {
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub published: bool,
}

pub struct ContentService {
    content: Arc<dyn ContentRepo>,
}

impl ContentService {
    pub fn new(content: Arc<dyn ContentRepo>) -> Self {
        Self { content }
    }

    fn is_valid_slug(slug: &str) -> bool {
        !slug.is_empty()
            && slug
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    }

    /// Published articles; admins also see drafts.
    pub async fn list_help(&self, user: Option<&Profile>) -> Result<Vec<HelpArticle>, DomainError> {
        let include_drafts = user.is_some_and(Profile::is_admin);
        self.content.list_help_articles(include_drafts).await
    }

    pub async fn get_help(&self, user: Option<&Profile>, slug: &str) -> Result<HelpArticle, DomainError> {
        let article = self
            .content
            .get_help_article(slug)
            .await?
            .filter(|a| a.published || user.is_some_and(Profile::is_admin))
            .ok_or_else(|| DomainError::not_found(format!("help article {slug}")))?;
        Ok(article)
    }

    /// Insert or update an article by slug.
    pub async fn upsert_help(
        &self,
        admin: &Profile,
        input: HelpArticleInput,
    ) -> Result<HelpArticle, DomainError> {
        ensure_admin(admin)?;
        let slug = input.slug.trim().to_lowercase();
        if !Self::is_valid_slug(&slug) {
            return Err(DomainError::validation(
                "slug may only contain lowercase letters, digits and '-'",
            ));
        }
        validate_title(&input.title)?;
        let article = HelpArticle {
            id: Uuid::new_v4(),
            slug,
            title: input.title.trim().to_string(),
            body: input.body,
            published: input.published,
            updated_at: Utc::now(),
        };
        let stored = self.content.upsert_help_article(&article).await?;
        info!(slug = %stored.slug, published = stored.published, "help article saved");
        Ok(stored)
    }

    pub async fn settings(&self) -> Result<BTreeMap<String, serde_json::Value>, DomainError> {
        Ok(self.content.list_settings().await?.into_iter().collect())
    }

    pub async fn put_setting(
        &self,
        admin: &Profile,
        key: &str,
        value: serde_json::Value,
    ) -> Result<(), DomainError> {
        ensure_admin(admin)?;
        let key = key.trim();
        if key.is_empty() || key.len() > 64 {
            return Err(DomainError::validation("setting key must be 1-64 characters"));
        }
        self.content.put_setting(key, &value).await?;
        info!(key, "website setting updated");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slug_validation() {
        assert!(ContentService::is_valid_slug("getting-started"));
        assert!(ContentService::is_valid_slug("faq-2"));
        assert!(!ContentService::is_valid_slug(""));
        assert!(!ContentService::is_valid_slug("Getting Started"));
        assert!(!ContentService::is_valid_slug("a/b"));
    }
}
