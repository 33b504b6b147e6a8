//! Notification service. In-app notifications with an optional email mirror.
//!
//! Fan-out is a side effect of other use cases: failures are logged and swallowed so
//! the originating request still succeeds.

use crate::domain::{DomainError, NewNotification, Notification, Profile};
use crate::ports::{MailerPort, NotificationRepo, ProfileRepo};
use crate::shared::config::DEFAULT_NOTIFICATION_LIMIT;
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

pub struct NotificationService {
    repo: Arc<dyn NotificationRepo>,
    profiles: Arc<dyn ProfileRepo>,
    mailer: Arc<dyn MailerPort>,
}

impl NotificationService {
    pub fn new(
        repo: Arc<dyn NotificationRepo>,
        profiles: Arc<dyn ProfileRepo>,
        mailer: Arc<dyn MailerPort>,
    ) -> Self {
        Self {
            repo,
            profiles,
            mailer,
        }
    }

    /// Store one notification per user. Never fails; returns how many were written.
    pub async fn notify(&self, user_ids: &[Uuid], notification: NewNotification) -> usize {
        match self
            .repo
            .insert_notifications(user_ids, &notification, Utc::now())
            .await
        {
            Ok(n) => {
                debug!(kind = notification.kind.as_str(), recipients = n, "notifications stored");
                n
            }
            Err(e) => {
                warn!(kind = notification.kind.as_str(), error = %e, "notification fan-out failed");
                0
            }
        }
    }

    /// `notify` plus an email to each recipient. Never fails.
    pub async fn notify_and_email(&self, user_ids: &[Uuid], notification: NewNotification) -> usize {
        let stored = self.notify(user_ids, notification.clone()).await;
        for user_id in user_ids {
            let profile = match self.profiles.get_profile(*user_id).await {
                Ok(Some(p)) => p,
                Ok(None) => continue,
                Err(e) => {
                    warn!(user_id = %user_id, error = %e, "profile lookup for mail failed");
                    continue;
                }
            };
            if let Err(e) = self
                .mailer
                .send(&profile.email, &notification.title, &notification.body)
                .await
            {
                warn!(user_id = %user_id, error = %e, "mail delivery failed");
            }
        }
        stored
    }

    pub async fn list(
        &self,
        user: &Profile,
        unread_only: bool,
        limit: Option<u32>,
    ) -> Result<Vec<Notification>, DomainError> {
        let limit = limit
            .unwrap_or(DEFAULT_NOTIFICATION_LIMIT)
            .clamp(1, DEFAULT_NOTIFICATION_LIMIT);
        self.repo.list_notifications(user.id, unread_only, limit).await
    }

    pub async fn mark_read(&self, user: &Profile, id: Uuid) -> Result<(), DomainError> {
        if !self.repo.mark_read(user.id, id).await? {
            return Err(DomainError::not_found(format!("notification {id}")));
        }
        Ok(())
    }

    pub async fn mark_all_read(&self, user: &Profile) -> Result<u64, DomainError> {
        self.repo.mark_all_read(user.id).await
    }
}
