//! Announcements. Global (admin) or per course (course instructor or admin).

use super::access::load_course;
use super::notification_service::NotificationService;
use crate::domain::rules::{can_publish_announcement, ensure_can_author, validate_title};
use crate::domain::{Announcement, DomainError, NewNotification, NotificationKind, Profile};
use crate::ports::{AnnouncementRepo, CourseRepo, EnrollmentRepo, ProfileRepo};
use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Deserialize)]
pub struct NewAnnouncement {
    #[serde(default)]
    pub course_id: Option<Uuid>,
    pub title: String,
    #[serde(default)]
    pub body: String,
}

pub struct AnnouncementService {
    announcements: Arc<dyn AnnouncementRepo>,
    courses: Arc<dyn CourseRepo>,
    enrollments: Arc<dyn EnrollmentRepo>,
    profiles: Arc<dyn ProfileRepo>,
    notifications: Arc<NotificationService>,
}

impl AnnouncementService {
    pub fn new(
        announcements: Arc<dyn AnnouncementRepo>,
        courses: Arc<dyn CourseRepo>,
        enrollments: Arc<dyn EnrollmentRepo>,
        profiles: Arc<dyn ProfileRepo>,
        notifications: Arc<NotificationService>,
    ) -> Self {
        Self {
            announcements,
            courses,
            enrollments,
            profiles,
            notifications,
        }
    }

    /// Admins see everything; others see global announcements and those of their courses.
    pub async fn list(
        &self,
        user: &Profile,
        course_id: Option<Uuid>,
    ) -> Result<Vec<Announcement>, DomainError> {
        let audience = if user.is_admin() { None } else { Some(user.id) };
        self.announcements.list_announcements(audience, course_id).await
    }

    pub async fn publish(
        &self,
        user: &Profile,
        input: NewAnnouncement,
    ) -> Result<Announcement, DomainError> {
        ensure_can_author(user)?;
        validate_title(&input.title)?;
        let course = match input.course_id {
            Some(id) => Some(load_course(self.courses.as_ref(), id).await?),
            None => None,
        };
        if !can_publish_announcement(user, course.as_ref()) {
            return Err(DomainError::forbidden(match course {
                Some(_) => "only the course instructor can announce to this course",
                None => "only admins can publish global announcements",
            }));
        }

        let announcement = Announcement {
            id: Uuid::new_v4(),
            author_id: user.id,
            course_id: input.course_id,
            title: input.title.trim().to_string(),
            body: input.body,
            created_at: Utc::now(),
        };
        self.announcements.insert_announcement(&announcement).await?;
        info!(
            announcement_id = %announcement.id,
            course_id = ?announcement.course_id,
            "announcement published"
        );

        let audience = match announcement.course_id {
            Some(course_id) => self.enrollments.enrolled_student_ids(course_id).await,
            None => self.profiles.active_profile_ids().await,
        };
        match audience {
            Ok(ids) => {
                let recipients: Vec<Uuid> = ids.into_iter().filter(|id| *id != user.id).collect();
                self.notifications
                    .notify_and_email(
                        &recipients,
                        NewNotification {
                            kind: NotificationKind::Announcement,
                            title: announcement.title.clone(),
                            body: announcement.body.clone(),
                            link: Some("/announcements".to_string()),
                        },
                    )
                    .await;
            }
            Err(e) => warn!(announcement_id = %announcement.id, error = %e, "announcement audience lookup failed"),
        }
        Ok(announcement)
    }

    pub async fn delete(&self, user: &Profile, id: Uuid) -> Result<(), DomainError> {
        let announcement = self
            .announcements
            .get_announcement(id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("announcement {id}")))?;
        if announcement.author_id != user.id && !user.is_admin() {
            return Err(DomainError::forbidden("only the author can delete this announcement"));
        }
        self.announcements.delete_announcement(id).await?;
        info!(announcement_id = %id, "announcement deleted");
        Ok(())
    }
}
