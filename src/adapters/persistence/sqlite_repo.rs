//! SQLite-backed repository via libsql. Implements every storage port.
//!
//! One database file (`learnhub.db`) in the configured data directory. Uniqueness that
//! the business relies on (one enrollment per student and course, one purchase per book,
//! one split per payment) is declared in the schema; inserts use `ON CONFLICT DO NOTHING`
//! and report whether a row was written.

mod announcements;
mod assignments;
mod books;
mod content;
mod courses;
mod enrollments;
mod meetings;
mod notifications;
mod payments;
mod profiles;
mod reports;

use crate::domain::DomainError;
use chrono::{DateTime, Utc};
use libsql::{Connection, Database, Row, Rows};
use std::path::{Path, PathBuf};
use tracing::info;
use uuid::Uuid;

const SCHEMA: &[&str] = &[
    r#"
CREATE TABLE IF NOT EXISTS profiles (
    id TEXT PRIMARY KEY,
    email TEXT NOT NULL UNIQUE,
    full_name TEXT NOT NULL DEFAULT '',
    role TEXT NOT NULL,
    status TEXT NOT NULL,
    created_at INTEGER NOT NULL
)"#,
    r#"
CREATE TABLE IF NOT EXISTS sessions (
    token_hash TEXT PRIMARY KEY,
    user_id TEXT NOT NULL REFERENCES profiles (id) ON DELETE CASCADE,
    created_at INTEGER NOT NULL
)"#,
    r#"
CREATE TABLE IF NOT EXISTS courses (
    id TEXT PRIMARY KEY,
    instructor_id TEXT NOT NULL REFERENCES profiles (id),
    title TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    price INTEGER NOT NULL DEFAULT 0,
    published INTEGER NOT NULL DEFAULT 0,
    created_at INTEGER NOT NULL
)"#,
    r#"
CREATE TABLE IF NOT EXISTS modules (
    id TEXT PRIMARY KEY,
    course_id TEXT NOT NULL REFERENCES courses (id) ON DELETE CASCADE,
    title TEXT NOT NULL,
    position INTEGER NOT NULL
)"#,
    r#"
CREATE TABLE IF NOT EXISTS lessons (
    id TEXT PRIMARY KEY,
    module_id TEXT NOT NULL REFERENCES modules (id) ON DELETE CASCADE,
    title TEXT NOT NULL,
    content TEXT NOT NULL DEFAULT '',
    video_url TEXT,
    position INTEGER NOT NULL,
    duration_minutes INTEGER NOT NULL DEFAULT 0
)"#,
    r#"
CREATE TABLE IF NOT EXISTS enrollments (
    id TEXT PRIMARY KEY,
    student_id TEXT NOT NULL REFERENCES profiles (id) ON DELETE CASCADE,
    course_id TEXT NOT NULL REFERENCES courses (id) ON DELETE CASCADE,
    progress INTEGER NOT NULL DEFAULT 0,
    enrolled_at INTEGER NOT NULL,
    completed_at INTEGER,
    UNIQUE (student_id, course_id)
)"#,
    r#"
CREATE TABLE IF NOT EXISTS lesson_progress (
    student_id TEXT NOT NULL REFERENCES profiles (id) ON DELETE CASCADE,
    lesson_id TEXT NOT NULL REFERENCES lessons (id) ON DELETE CASCADE,
    completed_at INTEGER NOT NULL,
    PRIMARY KEY (student_id, lesson_id)
)"#,
    r#"
CREATE TABLE IF NOT EXISTS certificates (
    id TEXT PRIMARY KEY,
    student_id TEXT NOT NULL REFERENCES profiles (id) ON DELETE CASCADE,
    course_id TEXT NOT NULL REFERENCES courses (id) ON DELETE CASCADE,
    serial TEXT NOT NULL UNIQUE,
    issued_at INTEGER NOT NULL,
    UNIQUE (student_id, course_id)
)"#,
    r#"
CREATE TABLE IF NOT EXISTS assignments (
    id TEXT PRIMARY KEY,
    course_id TEXT NOT NULL REFERENCES courses (id) ON DELETE CASCADE,
    title TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    due_at INTEGER,
    max_score INTEGER NOT NULL DEFAULT 100,
    created_by TEXT NOT NULL,
    created_at INTEGER NOT NULL
)"#,
    r#"
CREATE TABLE IF NOT EXISTS assignment_submissions (
    id TEXT PRIMARY KEY,
    assignment_id TEXT NOT NULL REFERENCES assignments (id) ON DELETE CASCADE,
    student_id TEXT NOT NULL REFERENCES profiles (id) ON DELETE CASCADE,
    content TEXT NOT NULL,
    submitted_at INTEGER NOT NULL,
    score INTEGER,
    feedback TEXT,
    graded_at INTEGER,
    UNIQUE (assignment_id, student_id)
)"#,
    r#"
CREATE TABLE IF NOT EXISTS announcements (
    id TEXT PRIMARY KEY,
    author_id TEXT NOT NULL,
    course_id TEXT REFERENCES courses (id) ON DELETE CASCADE,
    title TEXT NOT NULL,
    body TEXT NOT NULL,
    created_at INTEGER NOT NULL
)"#,
    r#"
CREATE TABLE IF NOT EXISTS books (
    id TEXT PRIMARY KEY,
    author_id TEXT NOT NULL REFERENCES profiles (id),
    title TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    price INTEGER NOT NULL DEFAULT 0,
    file_url TEXT NOT NULL,
    created_at INTEGER NOT NULL
)"#,
    r#"
CREATE TABLE IF NOT EXISTS book_purchases (
    id TEXT PRIMARY KEY,
    buyer_id TEXT NOT NULL REFERENCES profiles (id) ON DELETE CASCADE,
    book_id TEXT NOT NULL REFERENCES books (id) ON DELETE CASCADE,
    payment_id TEXT,
    purchased_at INTEGER NOT NULL,
    UNIQUE (buyer_id, book_id)
)"#,
    r#"
CREATE TABLE IF NOT EXISTS payments (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    item_type TEXT NOT NULL,
    item_id TEXT NOT NULL,
    amount INTEGER NOT NULL,
    gateway TEXT NOT NULL,
    gateway_ref TEXT,
    status TEXT NOT NULL,
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL
)"#,
    "CREATE UNIQUE INDEX IF NOT EXISTS idx_payments_gateway_ref ON payments (gateway, gateway_ref) WHERE gateway_ref IS NOT NULL",
    r#"
CREATE TABLE IF NOT EXISTS revenue_splits (
    payment_id TEXT PRIMARY KEY REFERENCES payments (id),
    beneficiary_id TEXT NOT NULL,
    instructor_amount INTEGER NOT NULL,
    platform_amount INTEGER NOT NULL,
    created_at INTEGER NOT NULL
)"#,
    r#"
CREATE TABLE IF NOT EXISTS meetings (
    id TEXT PRIMARY KEY,
    course_id TEXT NOT NULL REFERENCES courses (id) ON DELETE CASCADE,
    host_id TEXT NOT NULL,
    title TEXT NOT NULL,
    starts_at INTEGER NOT NULL,
    room_name TEXT NOT NULL,
    room_url TEXT NOT NULL,
    created_at INTEGER NOT NULL
)"#,
    r#"
CREATE TABLE IF NOT EXISTS meeting_participants (
    meeting_id TEXT NOT NULL REFERENCES meetings (id) ON DELETE CASCADE,
    user_id TEXT NOT NULL,
    PRIMARY KEY (meeting_id, user_id)
)"#,
    r#"
CREATE TABLE IF NOT EXISTS notifications (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL REFERENCES profiles (id) ON DELETE CASCADE,
    kind TEXT NOT NULL,
    title TEXT NOT NULL,
    body TEXT NOT NULL,
    link TEXT,
    read INTEGER NOT NULL DEFAULT 0,
    created_at INTEGER NOT NULL
)"#,
    "CREATE INDEX IF NOT EXISTS idx_notifications_user ON notifications (user_id, created_at DESC)",
    r#"
CREATE TABLE IF NOT EXISTS help_articles (
    id TEXT PRIMARY KEY,
    slug TEXT NOT NULL UNIQUE,
    title TEXT NOT NULL,
    body TEXT NOT NULL,
    published INTEGER NOT NULL DEFAULT 0,
    updated_at INTEGER NOT NULL
)"#,
    r#"
CREATE TABLE IF NOT EXISTS website_settings (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    updated_at INTEGER NOT NULL
)"#,
];

/// SQLite repository. Safe to share via Arc; every call opens its own connection.
pub struct SqliteRepo {
    db: Database,
    db_path: PathBuf,
}

impl SqliteRepo {
    /// Connect to (or create) `learnhub.db` in `base_dir` and ensure the schema exists.
    ///
    /// Sets WAL mode and synchronous=NORMAL for concurrent readers with one writer.
    pub async fn connect(base_dir: impl AsRef<Path>) -> Result<Self, DomainError> {
        let base = base_dir.as_ref();
        std::fs::create_dir_all(base).map_err(DomainError::repo)?;
        let db_path = base.join("learnhub.db");
        let path_str = db_path.to_string_lossy();
        let db = libsql::Builder::new_local(path_str.as_ref())
            .build()
            .await
            .map_err(DomainError::repo)?;
        let conn = db.connect().map_err(DomainError::repo)?;

        // PRAGMA returns a row (new value); consume it since execute fails when rows are returned.
        for pragma in ["PRAGMA journal_mode=WAL", "PRAGMA synchronous=NORMAL"] {
            let mut rows = conn
                .query(pragma, ())
                .await
                .map_err(|e| DomainError::Repo(format!("{pragma} failed: {e}")))?;
            while rows.next().await.map_err(DomainError::repo)?.is_some() {}
        }

        for statement in SCHEMA {
            conn.execute(statement, ())
                .await
                .map_err(DomainError::repo)?;
        }

        info!(path = %db_path.display(), tables = SCHEMA.len(), "SQLite connected with WAL mode");

        Ok(Self { db, db_path })
    }

    pub fn path(&self) -> &Path {
        &self.db_path
    }

    /// New connection with foreign keys enforced (cascade deletes depend on it).
    async fn conn(&self) -> Result<Connection, DomainError> {
        let conn = self.db.connect().map_err(DomainError::repo)?;
        conn.execute("PRAGMA foreign_keys = ON", ())
            .await
            .map_err(DomainError::repo)?;
        Ok(conn)
    }
}

// ─────────────────────────────────────────────────────────────────────────
// Row helpers shared by the per-table modules
// ─────────────────────────────────────────────────────────────────────────

fn ts(at: DateTime<Utc>) -> i64 {
    at.timestamp()
}

fn opt_ts(at: Option<DateTime<Utc>>) -> Option<i64> {
    at.map(|a| a.timestamp())
}

fn from_ts(secs: i64) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(secs, 0).unwrap_or_default()
}

fn get_uuid(row: &Row, idx: i32) -> Result<Uuid, DomainError> {
    let s: String = row.get(idx).map_err(DomainError::repo)?;
    Uuid::parse_str(&s).map_err(DomainError::repo)
}

fn get_opt_uuid(row: &Row, idx: i32) -> Option<Uuid> {
    row.get::<String>(idx)
        .ok()
        .and_then(|s| Uuid::parse_str(&s).ok())
}

fn get_i64(row: &Row, idx: i32) -> Result<i64, DomainError> {
    row.get::<i64>(idx).map_err(DomainError::repo)
}

fn get_opt_i64(row: &Row, idx: i32) -> Option<i64> {
    row.get::<i64>(idx).ok()
}

fn get_string(row: &Row, idx: i32) -> Result<String, DomainError> {
    row.get::<String>(idx).map_err(DomainError::repo)
}

fn get_opt_string(row: &Row, idx: i32) -> Option<String> {
    row.get::<String>(idx).ok()
}

fn get_ts(row: &Row, idx: i32) -> Result<DateTime<Utc>, DomainError> {
    get_i64(row, idx).map(from_ts)
}

fn get_opt_ts(row: &Row, idx: i32) -> Option<DateTime<Utc>> {
    get_opt_i64(row, idx).map(from_ts)
}

fn get_bool(row: &Row, idx: i32) -> Result<bool, DomainError> {
    get_i64(row, idx).map(|v| v != 0)
}

/// Map every row with `f`.
async fn collect<T>(
    mut rows: Rows,
    f: impl Fn(&Row) -> Result<T, DomainError>,
) -> Result<Vec<T>, DomainError> {
    let mut out = Vec::new();
    while let Some(row) = rows.next().await.map_err(DomainError::repo)? {
        out.push(f(&row)?);
    }
    Ok(out)
}

/// Map the first row with `f`, if any.
async fn first<T>(
    mut rows: Rows,
    f: impl Fn(&Row) -> Result<T, DomainError>,
) -> Result<Option<T>, DomainError> {
    match rows.next().await.map_err(DomainError::repo)? {
        Some(row) => Ok(Some(f(&row)?)),
        None => Ok(None),
    }
}

/// Single scalar from a `SELECT COUNT(*)`/`COALESCE(SUM(..), 0)` query.
async fn scalar(rows: Rows) -> Result<i64, DomainError> {
    Ok(first(rows, |r| get_i64(r, 0)).await?.unwrap_or(0))
}

/// UNIQUE/PRIMARY KEY violations, reported by SQLite as "UNIQUE constraint failed".
fn is_unique_violation(e: &libsql::Error) -> bool {
    e.to_string().contains("UNIQUE constraint failed")
}
