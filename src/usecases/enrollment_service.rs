//! Enrollment in free courses and enrollment listings.

use super::access::load_course;
use super::notification_service::NotificationService;
use crate::domain::rules::{ensure_manages_course, ensure_not_banned};
use crate::domain::{
    CourseStudent, DomainError, Enrollment, NewNotification, NotificationKind, Profile, Role,
    StudentEnrollment,
};
use crate::ports::{CourseRepo, EnrollmentRepo};
use chrono::Utc;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Result of an enroll request: the enrollment and whether it was created now.
#[derive(Debug, Clone)]
pub struct EnrollOutcome {
    pub enrollment: Enrollment,
    pub created: bool,
}

pub struct EnrollmentService {
    courses: Arc<dyn CourseRepo>,
    enrollments: Arc<dyn EnrollmentRepo>,
    notifications: Arc<NotificationService>,
}

impl EnrollmentService {
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

    /// Enroll the caller in a free published course. Enrolling twice returns the
    /// existing enrollment.
    pub async fn enroll(&self, user: &Profile, course_id: Uuid) -> Result<EnrollOutcome, DomainError> {
        ensure_not_banned(user)?;
        if user.role != Role::Student {
            return Err(DomainError::forbidden("only students can enroll"));
        }
        let course = load_course(self.courses.as_ref(), course_id).await?;
        if !course.published {
            return Err(DomainError::not_found(format!("course {course_id}")));
        }
        if let Some(existing) = self.enrollments.get_enrollment(user.id, course_id).await? {
            return Ok(EnrollOutcome {
                enrollment: existing,
                created: false,
            });
        }
        if course.price > 0 {
            return Err(DomainError::PaymentRequired(format!(
                "course costs {} millimes; use checkout",
                course.price
            )));
        }

        let enrollment = Enrollment {
            id: Uuid::new_v4(),
            student_id: user.id,
            course_id,
            progress: 0,
            enrolled_at: Utc::now(),
            completed_at: None,
        };
        let created = self.enrollments.insert_enrollment(&enrollment).await?;
        let enrollment = if created {
            enrollment
        } else {
            // Lost a race with a concurrent request for the same pair.
            self.enrollments
                .get_enrollment(user.id, course_id)
                .await?
                .ok_or_else(|| DomainError::repo("enrollment vanished after conflict"))?
        };
        if created {
            info!(student_id = %user.id, course_id = %course_id, "student enrolled");
            self.notifications
                .notify(
                    &[course.instructor_id],
                    NewNotification {
                        kind: NotificationKind::Enrollment,
                        title: "New enrollment".to_string(),
                        body: format!("{} enrolled in {}", user.full_name, course.title),
                        link: Some(format!("/courses/{course_id}/students")),
                    },
                )
                .await;
        }
        Ok(EnrollOutcome {
            enrollment,
            created,
        })
    }

    pub async fn list_mine(&self, user: &Profile) -> Result<Vec<StudentEnrollment>, DomainError> {
        self.enrollments.list_student_enrollments(user.id).await
    }

    pub async fn list_students(
        &self,
        user: &Profile,
        course_id: Uuid,
    ) -> Result<Vec<CourseStudent>, DomainError> {
        let course = load_course(self.courses.as_ref(), course_id).await?;
        ensure_manages_course(user, &course)?;
        self.enrollments.list_course_students(course_id).await
    }
}
