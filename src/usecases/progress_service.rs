//! Lesson completion, course progress and certificates.
//!
//! Progress is recomputed from lesson_progress on every update, so repeated or
//! out-of-order updates converge on the same value.

use super::notification_service::NotificationService;
use crate::domain::rules::{certificate_serial, ensure_not_banned, progress_percent};
use crate::domain::{Certificate, DomainError, NewNotification, NotificationKind, Profile};
use crate::ports::{CourseRepo, EnrollmentRepo};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Deserialize)]
pub struct ProgressUpdate {
    pub lesson_id: Uuid,
    #[serde(default = "default_completed")]
    pub completed: bool,
}

fn default_completed() -> bool {
    true
}

#[derive(Debug, Clone, Serialize)]
pub struct ProgressReport {
    pub course_id: Uuid,
    pub progress: i64,
    pub completed_lessons: u64,
    pub total_lessons: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub certificate: Option<Certificate>,
}

pub struct ProgressService {
    courses: Arc<dyn CourseRepo>,
    enrollments: Arc<dyn EnrollmentRepo>,
    notifications: Arc<NotificationService>,
}

impl ProgressService {
    pub fn new(
        courses: Arc<dyn CourseRepo>,
        enrollments: Arc<dyn EnrollmentRepo>,
        notifications: Arc<NotificationService>,
    ) -> Self {
        Self {
            courses,
            enrollments,
            notifications,
        }
    }

    pub async fn update_progress(
        &self,
        user: &Profile,
        update: ProgressUpdate,
    ) -> Result<ProgressReport, DomainError> {
        ensure_not_banned(user)?;
        let course = self
            .courses
            .course_of_lesson(update.lesson_id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("lesson {}", update.lesson_id)))?;
        let enrollment = self
            .enrollments
            .get_enrollment(user.id, course.id)
            .await?
            .ok_or_else(|| DomainError::forbidden("not enrolled in this course"))?;

        let now = Utc::now();
        self.enrollments
            .set_lesson_completed(user.id, update.lesson_id, update.completed, now)
            .await?;

        let total = self.courses.count_lessons(course.id).await?;
        let completed = self
            .enrollments
            .count_completed_lessons(user.id, course.id)
            .await?;
        let progress = progress_percent(completed, total);

        let completed_at = if progress >= 100 {
            enrollment.completed_at.or(Some(now))
        } else {
            None
        };
        self.enrollments
            .update_progress(enrollment.id, progress, completed_at)
            .await?;

        let certificate = if progress >= 100 {
            Some(self.issue_certificate(user, course.id, &course.title).await?)
        } else {
            None
        };

        info!(
            student_id = %user.id,
            course_id = %course.id,
            lesson_id = %update.lesson_id,
            progress,
            "progress updated"
        );
        Ok(ProgressReport {
            course_id: course.id,
            progress,
            completed_lessons: completed.min(total),
            total_lessons: total,
            certificate,
        })
    }

    /// Issue the course certificate once; later calls return the stored one.
    async fn issue_certificate(
        &self,
        user: &Profile,
        course_id: Uuid,
        course_title: &str,
    ) -> Result<Certificate, DomainError> {
        let now = Utc::now();
        let id = Uuid::new_v4();
        let candidate = Certificate {
            id,
            student_id: user.id,
            course_id,
            serial: certificate_serial(id, now),
            issued_at: now,
        };
        if self.enrollments.insert_certificate(&candidate).await? {
            info!(student_id = %user.id, course_id = %course_id, serial = %candidate.serial, "certificate issued");
            self.notifications
                .notify_and_email(
                    &[user.id],
                    NewNotification {
                        kind: NotificationKind::Certificate,
                        title: "Course completed".to_string(),
                        body: format!(
                            "Congratulations, you completed {course_title}. Certificate {}",
                            candidate.serial
                        ),
                        link: Some(format!("/certificates/{}", candidate.id)),
                    },
                )
                .await;
            return Ok(candidate);
        }
        match self.enrollments.get_certificate(user.id, course_id).await? {
            Some(existing) => Ok(existing),
            None => {
                warn!(student_id = %user.id, course_id = %course_id, "certificate insert ignored but none stored");
                Err(DomainError::repo("certificate missing after conflict"))
            }
        }
    }
}
