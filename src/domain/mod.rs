//! Core domain layer. No external I/O dependencies.
//!
//! Entities and business rules live here. Dependencies flow inward.

pub mod entities;
pub mod errors;
pub mod reports;
pub mod rules;

pub use entities::{
    AccountStatus, Announcement, Assignment, Book, BookPurchase, Certificate, Course,
    CourseOutline, Enrollment, Gateway, Grant, HelpArticle, ItemType, Lesson, Meeting, Millimes, Module,
    ModuleOutline, NewNotification, Notification, NotificationKind, Payment, PaymentStatus,
    Profile, PurchaseItem, RevenueSplit, Role, Submission,
};
pub use errors::DomainError;
pub use reports::{
    CountByKey, CourseStudent, EarningLine, Earnings, PlatformSummary, StudentEnrollment,
};
