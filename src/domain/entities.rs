//! Domain entities. Pure data structures for the core business.
//!
//! No database or HTTP types here; adapters map rows and payloads into these.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Amount of money in millimes (1 TND = 1000 millimes).
pub type Millimes = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Instructor,
    Admin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    Pending,
    Active,
    Banned,
}

/// A user record. Role and status drive every permission check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub role: Role,
    pub status: AccountStatus,
    pub created_at: DateTime<Utc>,
}

impl Profile {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Course {
    pub id: Uuid,
    pub instructor_id: Uuid,
    pub title: String,
    pub description: String,
    /// 0 means free.
    pub price: Millimes,
    pub published: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Module {
    pub id: Uuid,
    pub course_id: Uuid,
    pub title: String,
    pub position: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lesson {
    pub id: Uuid,
    pub module_id: Uuid,
    pub title: String,
    pub content: String,
    pub video_url: Option<String>,
    pub position: i64,
    pub duration_minutes: i64,
}

/// Course with its ordered outline.
#[derive(Debug, Clone, Serialize)]
pub struct CourseOutline {
    #[serde(flatten)]
    pub course: Course,
    pub modules: Vec<ModuleOutline>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModuleOutline {
    #[serde(flatten)]
    pub module: Module,
    pub lessons: Vec<Lesson>,
}

/// Join record linking a student to a course.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enrollment {
    pub id: Uuid,
    pub student_id: Uuid,
    pub course_id: Uuid,
    /// Percentage of completed lessons, 0..=100.
    pub progress: i64,
    pub enrolled_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Certificate {
    pub id: Uuid,
    pub student_id: Uuid,
    pub course_id: Uuid,
    pub serial: String,
    pub issued_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assignment {
    pub id: Uuid,
    pub course_id: Uuid,
    pub title: String,
    pub description: String,
    pub due_at: Option<DateTime<Utc>>,
    pub max_score: i64,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Submission {
    pub id: Uuid,
    pub assignment_id: Uuid,
    pub student_id: Uuid,
    pub content: String,
    pub submitted_at: DateTime<Utc>,
    pub score: Option<i64>,
    pub feedback: Option<String>,
    pub graded_at: Option<DateTime<Utc>>,
}

/// Announcement. `course_id == None` means global.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Announcement {
    pub id: Uuid,
    pub author_id: Uuid,
    pub course_id: Option<Uuid>,
    pub title: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Book {
    pub id: Uuid,
    pub author_id: Uuid,
    pub title: String,
    pub description: String,
    pub price: Millimes,
    #[serde(skip_serializing)]
    pub file_url: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookPurchase {
    pub id: Uuid,
    pub buyer_id: Uuid,
    pub book_id: Uuid,
    pub payment_id: Option<Uuid>,
    pub purchased_at: DateTime<Utc>,
}

/// What a completed payment hands to the buyer.
#[derive(Debug, Clone)]
pub enum Grant {
    Enrollment(Enrollment),
    BookPurchase(BookPurchase),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemType {
    Course,
    Book,
}

/// What a payment buys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseItem {
    pub item_type: ItemType,
    pub item_id: Uuid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gateway {
    Paymee,
    Flouci,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(flatten)]
    pub item: PurchaseItem,
    pub amount: Millimes,
    pub gateway: Gateway,
    /// Gateway-side token (Paymee) or payment id (Flouci). Set once checkout is created.
    pub gateway_ref: Option<String>,
    pub status: PaymentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Instructor/platform division of a completed payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevenueSplit {
    pub instructor_amount: Millimes,
    pub platform_amount: Millimes,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Meeting {
    pub id: Uuid,
    pub course_id: Uuid,
    pub host_id: Uuid,
    pub title: String,
    pub starts_at: DateTime<Utc>,
    pub room_name: String,
    pub room_url: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Announcement,
    Assignment,
    Grade,
    Meeting,
    Payment,
    Enrollment,
    Certificate,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Announcement => "announcement",
            NotificationKind::Assignment => "assignment",
            NotificationKind::Grade => "grade",
            NotificationKind::Meeting => "meeting",
            NotificationKind::Payment => "payment",
            NotificationKind::Enrollment => "enrollment",
            NotificationKind::Certificate => "certificate",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: NotificationKind,
    pub title: String,
    pub body: String,
    pub link: Option<String>,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

/// Notification to be fanned out to a set of users.
#[derive(Debug, Clone)]
pub struct NewNotification {
    pub kind: NotificationKind,
    pub title: String,
    pub body: String,
    pub link: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HelpArticle {
    pub id: Uuid,
    pub slug: String,
    pub title: String,
    pub body: String,
    pub published: bool,
    pub updated_at: DateTime<Utc>,
}

// ─────────────────────────────────────────────────────────────────────────
// Storage codes. Lowercase tags shared by the database and the JSON API.
// ─────────────────────────────────────────────────────────────────────────

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Instructor => "instructor",
            Role::Admin => "admin",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "student" => Some(Role::Student),
            "instructor" => Some(Role::Instructor),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

impl AccountStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountStatus::Pending => "pending",
            AccountStatus::Active => "active",
            AccountStatus::Banned => "banned",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(AccountStatus::Pending),
            "active" => Some(AccountStatus::Active),
            "banned" => Some(AccountStatus::Banned),
            _ => None,
        }
    }
}

impl ItemType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemType::Course => "course",
            ItemType::Book => "book",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "course" => Some(ItemType::Course),
            "book" => Some(ItemType::Book),
            _ => None,
        }
    }
}

impl Gateway {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gateway::Paymee => "paymee",
            Gateway::Flouci => "flouci",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "paymee" => Some(Gateway::Paymee),
            "flouci" => Some(Gateway::Flouci),
            _ => None,
        }
    }
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Completed => "completed",
            PaymentStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(PaymentStatus::Pending),
            "completed" => Some(PaymentStatus::Completed),
            "failed" => Some(PaymentStatus::Failed),
            _ => None,
        }
    }
}

impl NotificationKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "announcement" => Some(NotificationKind::Announcement),
            "assignment" => Some(NotificationKind::Assignment),
            "grade" => Some(NotificationKind::Grade),
            "meeting" => Some(NotificationKind::Meeting),
            "payment" => Some(NotificationKind::Payment),
            "enrollment" => Some(NotificationKind::Enrollment),
            "certificate" => Some(NotificationKind::Certificate),
            _ => None,
        }
    }
}
