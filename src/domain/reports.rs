//! Read models. Aggregates returned by listing and reporting queries.

use super::entities::{ItemType, Millimes};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Enrollment as seen by the student, with course title.
#[derive(Debug, Clone, Serialize)]
pub struct StudentEnrollment {
    pub enrollment_id: Uuid,
    pub course_id: Uuid,
    pub course_title: String,
    pub progress: i64,
    pub enrolled_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Enrollment as seen by the course instructor.
#[derive(Debug, Clone, Serialize)]
pub struct CourseStudent {
    pub student_id: Uuid,
    pub full_name: String,
    pub email: String,
    pub progress: i64,
    pub enrolled_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CountByKey {
    pub key: String,
    pub count: i64,
}

/// Admin dashboard totals.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PlatformSummary {
    pub users_by_role: Vec<CountByKey>,
    pub users_by_status: Vec<CountByKey>,
    pub published_courses: i64,
    pub draft_courses: i64,
    pub enrollments: i64,
    pub completed_enrollments: i64,
    pub certificates: i64,
    pub completed_payments: i64,
    pub gross_revenue: Millimes,
    pub platform_revenue: Millimes,
    pub instructor_revenue: Millimes,
}

/// Per-item revenue line for an instructor or book author.
#[derive(Debug, Clone, Serialize)]
pub struct EarningLine {
    pub item_type: ItemType,
    pub item_id: Uuid,
    pub sales: i64,
    pub gross: Millimes,
    pub instructor_amount: Millimes,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Earnings {
    pub total_sales: i64,
    pub total_gross: Millimes,
    pub total_instructor_amount: Millimes,
    pub items: Vec<EarningLine>,
}

impl Earnings {
    pub fn from_lines(items: Vec<EarningLine>) -> Self {
        Self {
            total_sales: items.iter().map(|l| l.sales).sum(),
            total_gross: items.iter().map(|l| l.gross).sum(),
            total_instructor_amount: items.iter().map(|l| l.instructor_amount).sum(),
            items,
        }
    }
}
