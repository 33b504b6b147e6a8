//! Storage ports. Application calls into persistence.
//!
//! Implemented by adapters (libsql). Every method maps storage failures into
//! `DomainError::Repo`; uniqueness violations surface as `false` return values
//! where the caller is expected to treat them as "already there".

use crate::domain::{
    AccountStatus, Announcement, Assignment, Book, Certificate, Course, CourseStudent,
    DomainError, EarningLine, Enrollment, Gateway, Grant, HelpArticle, Lesson, Meeting,
    Module, NewNotification, Notification, Payment, PaymentStatus, PlatformSummary, Profile,
    RevenueSplit, Role, StudentEnrollment, Submission,
};
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Profiles and bearer sessions.
#[async_trait::async_trait]
pub trait ProfileRepo: Send + Sync {
    /// Insert a profile. Duplicate email yields `DomainError::Conflict`.
    async fn insert_profile(&self, profile: &Profile) -> Result<(), DomainError>;

    async fn get_profile(&self, id: Uuid) -> Result<Option<Profile>, DomainError>;

    async fn find_profile_by_email(&self, email: &str) -> Result<Option<Profile>, DomainError>;

    async fn list_profiles(
        &self,
        role: Option<Role>,
        status: Option<AccountStatus>,
    ) -> Result<Vec<Profile>, DomainError>;

    /// Returns false when no such profile exists.
    async fn set_profile_status(&self, id: Uuid, status: AccountStatus)
    -> Result<bool, DomainError>;

    async fn set_profile_role(&self, id: Uuid, role: Role) -> Result<bool, DomainError>;

    /// Ids of every non-banned profile (audience of global announcements).
    async fn active_profile_ids(&self) -> Result<Vec<Uuid>, DomainError>;

    /// Store a session keyed by the SHA-256 hex of the bearer token.
    async fn insert_session(&self, user_id: Uuid, token_hash: &str) -> Result<(), DomainError>;

    async fn profile_for_session(&self, token_hash: &str) -> Result<Option<Profile>, DomainError>;
}

/// Courses, modules and lessons.
#[async_trait::async_trait]
pub trait CourseRepo: Send + Sync {
    async fn insert_course(&self, course: &Course) -> Result<(), DomainError>;

    async fn get_course(&self, id: Uuid) -> Result<Option<Course>, DomainError>;

    /// Published courses plus drafts owned by `include_drafts_of`. `all = true` lists everything.
    async fn list_courses(
        &self,
        include_drafts_of: Option<Uuid>,
        all: bool,
    ) -> Result<Vec<Course>, DomainError>;

    async fn update_course(&self, course: &Course) -> Result<(), DomainError>;

    /// Deletes the course with its modules, lessons, assignments, announcements and meetings.
    async fn delete_course(&self, id: Uuid) -> Result<bool, DomainError>;

    async fn insert_module(&self, module: &Module) -> Result<(), DomainError>;

    async fn get_module(&self, id: Uuid) -> Result<Option<Module>, DomainError>;

    async fn next_module_position(&self, course_id: Uuid) -> Result<i64, DomainError>;

    async fn list_modules(&self, course_id: Uuid) -> Result<Vec<Module>, DomainError>;

    async fn insert_lesson(&self, lesson: &Lesson) -> Result<(), DomainError>;

    async fn get_lesson(&self, id: Uuid) -> Result<Option<Lesson>, DomainError>;

    async fn next_lesson_position(&self, module_id: Uuid) -> Result<i64, DomainError>;

    /// All lessons of a course ordered by module position then lesson position.
    async fn list_course_lessons(&self, course_id: Uuid) -> Result<Vec<Lesson>, DomainError>;

    /// Course owning a lesson, through its module.
    async fn course_of_lesson(&self, lesson_id: Uuid) -> Result<Option<Course>, DomainError>;

    async fn count_lessons(&self, course_id: Uuid) -> Result<u64, DomainError>;
}

/// Enrollments, lesson completion and certificates.
#[async_trait::async_trait]
pub trait EnrollmentRepo: Send + Sync {
    /// Insert unless the (student, course) pair exists. Returns true when inserted.
    async fn insert_enrollment(&self, enrollment: &Enrollment) -> Result<bool, DomainError>;

    async fn get_enrollment(
        &self,
        student_id: Uuid,
        course_id: Uuid,
    ) -> Result<Option<Enrollment>, DomainError>;

    async fn list_student_enrollments(
        &self,
        student_id: Uuid,
    ) -> Result<Vec<StudentEnrollment>, DomainError>;

    async fn list_course_students(&self, course_id: Uuid) -> Result<Vec<CourseStudent>, DomainError>;

    async fn enrolled_student_ids(&self, course_id: Uuid) -> Result<Vec<Uuid>, DomainError>;

    /// Mark or unmark a lesson. Idempotent in both directions.
    async fn set_lesson_completed(
        &self,
        student_id: Uuid,
        lesson_id: Uuid,
        completed: bool,
        at: DateTime<Utc>,
    ) -> Result<(), DomainError>;

    async fn count_completed_lessons(
        &self,
        student_id: Uuid,
        course_id: Uuid,
    ) -> Result<u64, DomainError>;

    async fn update_progress(
        &self,
        enrollment_id: Uuid,
        progress: i64,
        completed_at: Option<DateTime<Utc>>,
    ) -> Result<(), DomainError>;

    /// Insert unless the student already holds a certificate for the course.
    async fn insert_certificate(&self, certificate: &Certificate) -> Result<bool, DomainError>;

    async fn get_certificate(
        &self,
        student_id: Uuid,
        course_id: Uuid,
    ) -> Result<Option<Certificate>, DomainError>;
}

/// Assignments and submissions.
#[async_trait::async_trait]
pub trait AssignmentRepo: Send + Sync {
    async fn insert_assignment(&self, assignment: &Assignment) -> Result<(), DomainError>;

    async fn get_assignment(&self, id: Uuid) -> Result<Option<Assignment>, DomainError>;

    async fn list_assignments(&self, course_id: Uuid) -> Result<Vec<Assignment>, DomainError>;

    async fn update_assignment(&self, assignment: &Assignment) -> Result<(), DomainError>;

    async fn delete_assignment(&self, id: Uuid) -> Result<bool, DomainError>;

    /// Insert or replace the student's submission content for an assignment.
    async fn upsert_submission(&self, submission: &Submission) -> Result<Submission, DomainError>;

    async fn get_submission(&self, id: Uuid) -> Result<Option<Submission>, DomainError>;

    async fn find_submission(
        &self,
        assignment_id: Uuid,
        student_id: Uuid,
    ) -> Result<Option<Submission>, DomainError>;

    /// All submissions, or only `student_id`'s.
    async fn list_submissions(
        &self,
        assignment_id: Uuid,
        student_id: Option<Uuid>,
    ) -> Result<Vec<Submission>, DomainError>;

    async fn grade_submission(
        &self,
        id: Uuid,
        score: i64,
        feedback: Option<&str>,
        at: DateTime<Utc>,
    ) -> Result<(), DomainError>;
}

#[async_trait::async_trait]
pub trait AnnouncementRepo: Send + Sync {
    async fn insert_announcement(&self, announcement: &Announcement) -> Result<(), DomainError>;

    async fn get_announcement(&self, id: Uuid) -> Result<Option<Announcement>, DomainError>;

    /// Newest first. `audience = None` lists everything; otherwise global announcements
    /// plus those of courses the user is enrolled in or teaches.
    async fn list_announcements(
        &self,
        audience: Option<Uuid>,
        course_id: Option<Uuid>,
    ) -> Result<Vec<Announcement>, DomainError>;

    async fn delete_announcement(&self, id: Uuid) -> Result<bool, DomainError>;
}

#[async_trait::async_trait]
pub trait BookRepo: Send + Sync {
    async fn insert_book(&self, book: &Book) -> Result<(), DomainError>;

    async fn get_book(&self, id: Uuid) -> Result<Option<Book>, DomainError>;

    async fn list_books(&self) -> Result<Vec<Book>, DomainError>;

    async fn has_purchased(&self, buyer_id: Uuid, book_id: Uuid) -> Result<bool, DomainError>;
}

#[async_trait::async_trait]
pub trait PaymentRepo: Send + Sync {
    async fn insert_payment(&self, payment: &Payment) -> Result<(), DomainError>;

    async fn set_gateway_ref(&self, id: Uuid, gateway_ref: &str) -> Result<(), DomainError>;

    async fn get_payment(&self, id: Uuid) -> Result<Option<Payment>, DomainError>;

    async fn find_payment_by_ref(
        &self,
        gateway: Gateway,
        gateway_ref: &str,
    ) -> Result<Option<Payment>, DomainError>;

    /// Conditional `pending -> to` transition. Returns true only for the caller that
    /// performed the transition.
    async fn settle_payment(
        &self,
        id: Uuid,
        to: PaymentStatus,
        at: DateTime<Utc>,
    ) -> Result<bool, DomainError>;

    /// Newest first. `user_id = None` lists every payment.
    async fn list_payments(&self, user_id: Option<Uuid>) -> Result<Vec<Payment>, DomainError>;

    /// `pending -> completed` together with the grant and the revenue split, in one
    /// transaction. Returns false, writing nothing, when the payment was no longer pending.
    async fn complete_payment(
        &self,
        id: Uuid,
        at: DateTime<Utc>,
        grant: &Grant,
        beneficiary_id: Uuid,
        split: RevenueSplit,
    ) -> Result<bool, DomainError>;

    async fn earnings_for(&self, beneficiary_id: Uuid) -> Result<Vec<EarningLine>, DomainError>;
}

#[async_trait::async_trait]
pub trait MeetingRepo: Send + Sync {
    async fn insert_meeting(&self, meeting: &Meeting) -> Result<(), DomainError>;

    /// Register participants; existing pairs are ignored.
    async fn add_participants(&self, meeting_id: Uuid, user_ids: &[Uuid])
    -> Result<(), DomainError>;

    async fn get_meeting(&self, id: Uuid) -> Result<Option<Meeting>, DomainError>;

    async fn is_participant(&self, meeting_id: Uuid, user_id: Uuid) -> Result<bool, DomainError>;

    /// Ordered by start time. `user_id = None` lists every meeting.
    async fn list_meetings(&self, user_id: Option<Uuid>) -> Result<Vec<Meeting>, DomainError>;

    async fn delete_meeting(&self, id: Uuid) -> Result<bool, DomainError>;
}

#[async_trait::async_trait]
pub trait NotificationRepo: Send + Sync {
    /// One row per user. Returns the number of rows written.
    async fn insert_notifications(
        &self,
        user_ids: &[Uuid],
        notification: &NewNotification,
        at: DateTime<Utc>,
    ) -> Result<usize, DomainError>;

    async fn list_notifications(
        &self,
        user_id: Uuid,
        unread_only: bool,
        limit: u32,
    ) -> Result<Vec<Notification>, DomainError>;

    /// Returns false when the notification does not belong to the user.
    async fn mark_read(&self, user_id: Uuid, id: Uuid) -> Result<bool, DomainError>;

    async fn mark_all_read(&self, user_id: Uuid) -> Result<u64, DomainError>;
}

/// Help articles and website settings.
#[async_trait::async_trait]
pub trait ContentRepo: Send + Sync {
    /// Insert or update by slug. Returns the stored article.
    async fn upsert_help_article(&self, article: &HelpArticle) -> Result<HelpArticle, DomainError>;

    async fn get_help_article(&self, slug: &str) -> Result<Option<HelpArticle>, DomainError>;

    async fn list_help_articles(&self, include_drafts: bool)
    -> Result<Vec<HelpArticle>, DomainError>;

    async fn list_settings(&self) -> Result<Vec<(String, serde_json::Value)>, DomainError>;

    async fn put_setting(&self, key: &str, value: &serde_json::Value) -> Result<(), DomainError>;
}

#[async_trait::async_trait]
pub trait ReportRepo: Send + Sync {
    async fn platform_summary(&self) -> Result<PlatformSummary, DomainError>;
}
