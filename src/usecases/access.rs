//! Lookups shared by the services: load-or-404 and course membership checks.

use crate::domain::rules::can_manage_course;
use crate::domain::{Course, DomainError, Profile};
use crate::ports::{CourseRepo, EnrollmentRepo};
use uuid::Uuid;

pub(crate) async fn load_course(courses: &dyn CourseRepo, id: Uuid) -> Result<Course, DomainError> {
    courses
        .get_course(id)
        .await?
        .ok_or_else(|| DomainError::not_found(format!("course {id}")))
}

/// Course instructor, admin, or enrolled student.
pub(crate) async fn is_course_member(
    enrollments: &dyn EnrollmentRepo,
    user: &Profile,
    course: &Course,
) -> Result<bool, DomainError> {
    if can_manage_course(user, course) {
        return Ok(true);
    }
    Ok(enrollments.get_enrollment(user.id, course.id).await?.is_some())
}

pub(crate) async fn ensure_course_member(
    enrollments: &dyn EnrollmentRepo,
    user: &Profile,
    course: &Course,
) -> Result<(), DomainError> {
    if !is_course_member(enrollments, user, course).await? {
        return Err(DomainError::forbidden("not enrolled in this course"));
    }
    Ok(())
}
