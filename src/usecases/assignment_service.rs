//! Assignments, submissions and grading.

use super::access::{ensure_course_member, load_course};
use super::notification_service::NotificationService;
use crate::domain::rules::{
    can_manage_course, ensure_can_author, ensure_manages_course, ensure_not_banned, validate_title,
};
use crate::domain::{
    Assignment, Course, DomainError, NewNotification, NotificationKind, Profile, Submission,
};
use crate::ports::{AssignmentRepo, CourseRepo, EnrollmentRepo};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

pub const DEFAULT_MAX_SCORE: i64 = 100;

#[derive(Debug, Clone, Deserialize)]
pub struct NewAssignment {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub due_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub max_score: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AssignmentPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub due_at: Option<DateTime<Utc>>,
    pub max_score: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewSubmission {
    pub content: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Grade {
    pub score: i64,
    #[serde(default)]
    pub feedback: Option<String>,
}

pub struct AssignmentService {
    courses: Arc<dyn CourseRepo>,
    enrollments: Arc<dyn EnrollmentRepo>,
    assignments: Arc<dyn AssignmentRepo>,
    notifications: Arc<NotificationService>,
}

impl AssignmentService {
    pub fn new(
        courses: Arc<dyn CourseRepo>,
        enrollments: Arc<dyn EnrollmentRepo>,
        assignments: Arc<dyn AssignmentRepo>,
        notifications: Arc<NotificationService>,
    ) -> Self {
        Self {
            courses,
            enrollments,
            assignments,
            notifications,
        }
    }

    async fn load_assignment(&self, id: Uuid) -> Result<(Assignment, Course), DomainError> {
        let assignment = self
            .assignments
            .get_assignment(id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("assignment {id}")))?;
        let course = load_course(self.courses.as_ref(), assignment.course_id).await?;
        Ok((assignment, course))
    }

    pub async fn create(
        &self,
        user: &Profile,
        course_id: Uuid,
        input: NewAssignment,
    ) -> Result<Assignment, DomainError> {
        ensure_can_author(user)?;
        let course = load_course(self.courses.as_ref(), course_id).await?;
        ensure_manages_course(user, &course)?;
        validate_title(&input.title)?;
        let max_score = input.max_score.unwrap_or(DEFAULT_MAX_SCORE);
        if max_score <= 0 {
            return Err(DomainError::validation("max_score must be positive"));
        }
        let assignment = Assignment {
            id: Uuid::new_v4(),
            course_id,
            title: input.title.trim().to_string(),
            description: input.description,
            due_at: input.due_at,
            max_score,
            created_by: user.id,
            created_at: Utc::now(),
        };
        self.assignments.insert_assignment(&assignment).await?;
        info!(assignment_id = %assignment.id, course_id = %course_id, "assignment created");

        match self.enrollments.enrolled_student_ids(course_id).await {
            Ok(students) => {
                self.notifications
                    .notify(
                        &students,
                        NewNotification {
                            kind: NotificationKind::Assignment,
                            title: format!("New assignment: {}", assignment.title),
                            body: format!("A new assignment was posted in {}", course.title),
                            link: Some(format!("/assignments/{}", assignment.id)),
                        },
                    )
                    .await;
            }
            Err(e) => warn!(course_id = %course_id, error = %e, "assignment audience lookup failed"),
        }
        Ok(assignment)
    }

    pub async fn list_for_course(
        &self,
        user: &Profile,
        course_id: Uuid,
    ) -> Result<Vec<Assignment>, DomainError> {
        let course = load_course(self.courses.as_ref(), course_id).await?;
        ensure_course_member(self.enrollments.as_ref(), user, &course).await?;
        self.assignments.list_assignments(course_id).await
    }

    pub async fn get(&self, user: &Profile, id: Uuid) -> Result<Assignment, DomainError> {
        let (assignment, course) = self.load_assignment(id).await?;
        ensure_course_member(self.enrollments.as_ref(), user, &course).await?;
        Ok(assignment)
    }

    pub async fn update(
        &self,
        user: &Profile,
        id: Uuid,
        patch: AssignmentPatch,
    ) -> Result<Assignment, DomainError> {
        let (mut assignment, course) = self.load_assignment(id).await?;
        ensure_manages_course(user, &course)?;
        if let Some(title) = patch.title {
            validate_title(&title)?;
            assignment.title = title.trim().to_string();
        }
        if let Some(description) = patch.description {
            assignment.description = description;
        }
        if let Some(due_at) = patch.due_at {
            assignment.due_at = Some(due_at);
        }
        if let Some(max_score) = patch.max_score {
            if max_score <= 0 {
                return Err(DomainError::validation("max_score must be positive"));
            }
            assignment.max_score = max_score;
        }
        self.assignments.update_assignment(&assignment).await?;
        Ok(assignment)
    }

    pub async fn delete(&self, user: &Profile, id: Uuid) -> Result<(), DomainError> {
        let (_, course) = self.load_assignment(id).await?;
        ensure_manages_course(user, &course)?;
        self.assignments.delete_assignment(id).await?;
        info!(assignment_id = %id, "assignment deleted");
        Ok(())
    }

    /// Submit or resubmit. Closed after the due date and once graded.
    pub async fn submit(
        &self,
        user: &Profile,
        assignment_id: Uuid,
        input: NewSubmission,
    ) -> Result<Submission, DomainError> {
        ensure_not_banned(user)?;
        let (assignment, course) = self.load_assignment(assignment_id).await?;
        if self
            .enrollments
            .get_enrollment(user.id, course.id)
            .await?
            .is_none()
        {
            return Err(DomainError::forbidden("not enrolled in this course"));
        }
        if input.content.trim().is_empty() {
            return Err(DomainError::validation("submission must not be empty"));
        }
        let now = Utc::now();
        if assignment.due_at.is_some_and(|due| now > due) {
            return Err(DomainError::Conflict("assignment is past its due date".to_string()));
        }
        let existing = self
            .assignments
            .find_submission(assignment_id, user.id)
            .await?;
        if existing.is_some_and(|s| s.graded_at.is_some()) {
            return Err(DomainError::Conflict("submission already graded".to_string()));
        }

        let submission = Submission {
            id: Uuid::new_v4(),
            assignment_id,
            student_id: user.id,
            content: input.content,
            submitted_at: now,
            score: None,
            feedback: None,
            graded_at: None,
        };
        let stored = self.assignments.upsert_submission(&submission).await?;
        info!(assignment_id = %assignment_id, student_id = %user.id, "submission stored");
        Ok(stored)
    }

    /// Course managers see every submission; students only their own.
    pub async fn list_submissions(
        &self,
        user: &Profile,
        assignment_id: Uuid,
    ) -> Result<Vec<Submission>, DomainError> {
        let (_, course) = self.load_assignment(assignment_id).await?;
        if can_manage_course(user, &course) {
            return self.assignments.list_submissions(assignment_id, None).await;
        }
        ensure_course_member(self.enrollments.as_ref(), user, &course).await?;
        self.assignments
            .list_submissions(assignment_id, Some(user.id))
            .await
    }

    pub async fn grade(
        &self,
        user: &Profile,
        submission_id: Uuid,
        grade: Grade,
    ) -> Result<Submission, DomainError> {
        let submission = self
            .assignments
            .get_submission(submission_id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("submission {submission_id}")))?;
        let (assignment, course) = self.load_assignment(submission.assignment_id).await?;
        ensure_manages_course(user, &course)?;
        if grade.score < 0 || grade.score > assignment.max_score {
            return Err(DomainError::validation(format!(
                "score must be between 0 and {}",
                assignment.max_score
            )));
        }
        let now = Utc::now();
        let feedback = grade.feedback.filter(|f| !f.trim().is_empty());
        self.assignments
            .grade_submission(submission_id, grade.score, feedback.as_deref(), now)
            .await?;
        info!(submission_id = %submission_id, score = grade.score, "submission graded");

        self.notifications
            .notify_and_email(
                &[submission.student_id],
                NewNotification {
                    kind: NotificationKind::Grade,
                    title: format!("Graded: {}", assignment.title),
                    body: format!("You scored {}/{}", grade.score, assignment.max_score),
                    link: Some(format!("/assignments/{}", assignment.id)),
                },
            )
            .await;

        Ok(Submission {
            score: Some(grade.score),
            feedback,
            graded_at: Some(now),
            ..submission
        })
    }
}
