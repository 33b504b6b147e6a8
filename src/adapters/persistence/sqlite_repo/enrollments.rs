//! Enrollments, lesson completion and certificates.

use super::{
    SqliteRepo, collect, first, get_i64, get_opt_ts, get_string, get_ts, get_uuid, opt_ts, scalar,
    ts,
};
use crate::domain::{Certificate, CourseStudent, DomainError, Enrollment, StudentEnrollment};
use crate::ports::EnrollmentRepo;
use chrono::{DateTime, Utc};
use libsql::{Row, params};
use uuid::Uuid;

const ENROLLMENT_COLUMNS: &str =
    "id, student_id, course_id, progress, enrolled_at, completed_at";

/// Idempotent on (student, course).
pub(super) const INSERT_ENROLLMENT: &str = r#"
INSERT INTO enrollments (id, student_id, course_id, progress, enrolled_at, completed_at)
VALUES (?1, ?2, ?3, ?4, ?5, ?6)
ON CONFLICT (student_id, course_id) DO NOTHING
"#;

fn row_to_enrollment(row: &Row) -> Result<Enrollment, DomainError> {
    Ok(Enrollment {
        id: get_uuid(row, 0)?,
        student_id: get_uuid(row, 1)?,
        course_id: get_uuid(row, 2)?,
        progress: get_i64(row, 3)?,
        enrolled_at: get_ts(row, 4)?,
        completed_at: get_opt_ts(row, 5),
    })
}

fn row_to_certificate(row: &Row) -> Result<Certificate, DomainError> {
    Ok(Certificate {
        id: get_uuid(row, 0)?,
        student_id: get_uuid(row, 1)?,
        course_id: get_uuid(row, 2)?,
        serial: get_string(row, 3)?,
        issued_at: get_ts(row, 4)?,
    })
}

#[async_trait::async_trait]
impl EnrollmentRepo for SqliteRepo {
    async fn insert_enrollment(&self, enrollment: &Enrollment) -> Result<bool, DomainError> {
        let conn = self.conn().await?;
        let inserted = conn
            .execute(
                INSERT_ENROLLMENT,
                params![
                    enrollment.id.to_string(),
                    enrollment.student_id.to_string(),
                    enrollment.course_id.to_string(),
                    enrollment.progress,
                    ts(enrollment.enrolled_at),
                    opt_ts(enrollment.completed_at)
                ],
            )
            .await
            .map_err(DomainError::repo)?;
        Ok(inserted > 0)
    }

    async fn get_enrollment(
        &self,
        student_id: Uuid,
        course_id: Uuid,
    ) -> Result<Option<Enrollment>, DomainError> {
        let conn = self.conn().await?;
        let rows = conn
            .query(
                &format!(
                    "SELECT {ENROLLMENT_COLUMNS} FROM enrollments WHERE student_id = ?1 AND course_id = ?2"
                ),
                params![student_id.to_string(), course_id.to_string()],
            )
            .await
            .map_err(DomainError::repo)?;
        first(rows, row_to_enrollment).await
    }

    async fn list_student_enrollments(
        &self,
        student_id: Uuid,
    ) -> Result<Vec<StudentEnrollment>, DomainError> {
        let conn = self.conn().await?;
        let rows = conn
            .query(
                "SELECT e.id, e.course_id, c.title, e.progress, e.enrolled_at, e.completed_at \
                 FROM enrollments e JOIN courses c ON c.id = e.course_id \
                 WHERE e.student_id = ?1 ORDER BY e.enrolled_at DESC",
                params![student_id.to_string()],
            )
            .await
            .map_err(DomainError::repo)?;
        collect(rows, |r| {
            Ok(StudentEnrollment {
                enrollment_id: get_uuid(r, 0)?,
                course_id: get_uuid(r, 1)?,
                course_title: get_string(r, 2)?,
                progress: get_i64(r, 3)?,
                enrolled_at: get_ts(r, 4)?,
                completed_at: get_opt_ts(r, 5),
            })
        })
        .await
    }

    async fn list_course_students(
        &self,
        course_id: Uuid,
    ) -> Result<Vec<CourseStudent>, DomainError> {
        let conn = self.conn().await?;
        let rows = conn
            .query(
                "SELECT p.id, p.full_name, p.email, e.progress, e.enrolled_at, e.completed_at \
                 FROM enrollments e JOIN profiles p ON p.id = e.student_id \
                 WHERE e.course_id = ?1 ORDER BY e.enrolled_at",
                params![course_id.to_string()],
            )
            .await
            .map_err(DomainError::repo)?;
        collect(rows, |r| {
            Ok(CourseStudent {
                student_id: get_uuid(r, 0)?,
                full_name: get_string(r, 1)?,
                email: get_string(r, 2)?,
                progress: get_i64(r, 3)?,
                enrolled_at: get_ts(r, 4)?,
                completed_at: get_opt_ts(r, 5),
            })
        })
        .await
    }

    async fn enrolled_student_ids(&self, course_id: Uuid) -> Result<Vec<Uuid>, DomainError> {
        let conn = self.conn().await?;
        let rows = conn
            .query(
                "SELECT student_id FROM enrollments WHERE course_id = ?1",
                params![course_id.to_string()],
            )
            .await
            .map_err(DomainError::repo)?;
        collect(rows, |r| get_uuid(r, 0)).await
    }

    async fn set_lesson_completed(
        &self,
        student_id: Uuid,
        lesson_id: Uuid,
        completed: bool,
        at: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        let conn = self.conn().await?;
        if completed {
            conn.execute(
                r#"
                INSERT INTO lesson_progress (student_id, lesson_id, completed_at)
                VALUES (?1, ?2, ?3)
                ON CONFLICT (student_id, lesson_id) DO NOTHING
                "#,
                params![student_id.to_string(), lesson_id.to_string(), ts(at)],
            )
            .await
            .map_err(DomainError::repo)?;
        } else {
            conn.execute(
                "DELETE FROM lesson_progress WHERE student_id = ?1 AND lesson_id = ?2",
                params![student_id.to_string(), lesson_id.to_string()],
            )
            .await
            .map_err(DomainError::repo)?;
        }
        Ok(())
    }

    async fn count_completed_lessons(
        &self,
        student_id: Uuid,
        course_id: Uuid,
    ) -> Result<u64, DomainError> {
        let conn = self.conn().await?;
        let rows = conn
            .query(
                "SELECT COUNT(*) FROM lesson_progress lp \
                 JOIN lessons l ON l.id = lp.lesson_id \
                 JOIN modules m ON m.id = l.module_id \
                 WHERE lp.student_id = ?1 AND m.course_id = ?2",
                params![student_id.to_string(), course_id.to_string()],
            )
            .await
            .map_err(DomainError::repo)?;
        Ok(scalar(rows).await?.max(0) as u64)
    }

    async fn update_progress(
        &self,
        enrollment_id: Uuid,
        progress: i64,
        completed_at: Option<DateTime<Utc>>,
    ) -> Result<(), DomainError> {
        let conn = self.conn().await?;
        conn.execute(
            "UPDATE enrollments SET progress = ?2, completed_at = ?3 WHERE id = ?1",
            params![enrollment_id.to_string(), progress, opt_ts(completed_at)],
        )
        .await
        .map_err(DomainError::repo)?;
        Ok(())
    }

    async fn insert_certificate(&self, certificate: &Certificate) -> Result<bool, DomainError> {
        let conn = self.conn().await?;
        let inserted = conn
            .execute(
                r#"
                INSERT INTO certificates (id, student_id, course_id, serial, issued_at)
                VALUES (?1, ?2, ?3, ?4, ?5)
                ON CONFLICT (student_id, course_id) DO NOTHING
                "#,
                params![
                    certificate.id.to_string(),
                    certificate.student_id.to_string(),
                    certificate.course_id.to_string(),
                    certificate.serial.as_str(),
                    ts(certificate.issued_at)
                ],
            )
            .await
            .map_err(DomainError::repo)?;
        Ok(inserted > 0)
    }

    async fn get_certificate(
        &self,
        student_id: Uuid,
        course_id: Uuid,
    ) -> Result<Option<Certificate>, DomainError> {
        let conn = self.conn().await?;
        let rows = conn
            .query(
                "SELECT id, student_id, course_id, serial, issued_at FROM certificates \
                 WHERE student_id = ?1 AND course_id = ?2",
                params![student_id.to_string(), course_id.to_string()],
            )
            .await
            .map_err(DomainError::repo)?;
        first(rows, row_to_certificate).await
    }
}
