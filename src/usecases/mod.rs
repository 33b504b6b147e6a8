//! Application use cases. Orchestrate domain logic via ports.

mod access;
pub mod admin_service;
pub mod announcement_service;
pub mod assignment_service;
pub mod auth_service;
pub mod book_service;
pub mod content_service;
pub mod course_service;
pub mod enrollment_service;
pub mod meeting_service;
pub mod notification_service;
pub mod payment_service;
pub mod progress_service;

pub use admin_service::AdminService;
pub use announcement_service::AnnouncementService;
pub use assignment_service::AssignmentService;
pub use auth_service::AuthService;
pub use book_service::BookService;
pub use content_service::ContentService;
pub use course_service::CourseService;
pub use enrollment_service::EnrollmentService;
pub use meeting_service::MeetingService;
pub use notification_service::NotificationService;
pub use payment_service::PaymentService;
pub use progress_service::ProgressService;
