//! Business rules. Pure functions over entities, no I/O.

use super::entities::{AccountStatus, Course, Millimes, Profile, RevenueSplit, Role};
use super::errors::DomainError;
use chrono::{DateTime, Datelike, Utc};
use uuid::Uuid;

/// Default instructor share of a sale, in percent. The platform keeps the rest.
pub const DEFAULT_INSTRUCTOR_SHARE_PERCENT: i64 = 80;

/// Percentage of completed lessons, rounded half away from zero. Empty courses are at 0.
pub fn progress_percent(completed: u64, total: u64) -> i64 {
    if total == 0 {
        return 0;
    }
    let completed = completed.min(total);
    ((completed * 200 + total) / (total * 2)) as i64
}

/// Split `amount` between beneficiary and platform. Floors the instructor part;
/// the two parts always sum to `amount`.
pub fn revenue_split(amount: Millimes, instructor_share_percent: i64) -> RevenueSplit {
    let share = instructor_share_percent.clamp(0, 100);
    let instructor_amount = amount * share / 100;
    RevenueSplit {
        instructor_amount,
        platform_amount: amount - instructor_amount,
    }
}

/// Certificate serial: `LH-<year>-<first 8 hex of id>`.
pub fn certificate_serial(id: Uuid, issued_at: DateTime<Utc>) -> String {
    let hex = id.simple().to_string();
    format!("LH-{}-{}", issued_at.year(), hex[..8].to_uppercase())
}

/// Banned accounts are rejected on every endpoint.
pub fn ensure_not_banned(user: &Profile) -> Result<(), DomainError> {
    if user.status == AccountStatus::Banned {
        return Err(DomainError::forbidden("account is banned"));
    }
    Ok(())
}

/// Authoring (courses, books, assignments, announcements, meetings) needs an active
/// instructor or admin account.
pub fn ensure_can_author(user: &Profile) -> Result<(), DomainError> {
    ensure_not_banned(user)?;
    if user.role == Role::Student {
        return Err(DomainError::forbidden("students cannot author content"));
    }
    if user.status != AccountStatus::Active {
        return Err(DomainError::forbidden("account is pending approval"));
    }
    Ok(())
}

pub fn ensure_admin(user: &Profile) -> Result<(), DomainError> {
    if !user.is_admin() {
        return Err(DomainError::forbidden("admin only"));
    }
    Ok(())
}

/// Owner of the course or admin.
pub fn can_manage_course(user: &Profile, course: &Course) -> bool {
    user.is_admin() || course.instructor_id == user.id
}

pub fn ensure_manages_course(user: &Profile, course: &Course) -> Result<(), DomainError> {
    if !can_manage_course(user, course) {
        return Err(DomainError::forbidden("not the course instructor"));
    }
    Ok(())
}

/// Global announcements are admin-only; course announcements need course ownership.
pub fn can_publish_announcement(user: &Profile, course: Option<&Course>) -> bool {
    match (user.role, course) {
        (Role::Student, _) => false,
        (Role::Admin, _) => true,
        (Role::Instructor, None) => false,
        (Role::Instructor, Some(c)) => c.instructor_id == user.id,
    }
}

pub fn validate_title(title: &str) -> Result<(), DomainError> {
    if title.trim().is_empty() {
        return Err(DomainError::validation("title must not be empty"));
    }
    Ok(())
}

pub fn validate_price(price: Millimes) -> Result<(), DomainError> {
    if price < 0 {
        return Err(DomainError::validation("price must not be negative"));
    }
    Ok(())
}
