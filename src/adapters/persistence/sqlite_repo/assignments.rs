//! Assignments and submissions.

use super::{
    SqliteRepo, collect, first, get_i64, get_opt_i64, get_opt_string, get_opt_ts, get_string,
    get_ts, get_uuid, opt_ts, ts,
};
use crate::domain::{Assignment, DomainError, Submission};
use crate::ports::AssignmentRepo;
use chrono::{DateTime, Utc};
use libsql::{Row, params};
use uuid::Uuid;

const ASSIGNMENT_COLUMNS: &str =
    "id, course_id, title, description, due_at, max_score, created_by, created_at";
const SUBMISSION_COLUMNS: &str =
    "id, assignment_id, student_id, content, submitted_at, score, feedback, graded_at";

fn row_to_assignment(row: &Row) -> Result<Assignment, DomainError> {
    Ok(Assignment {
        id: get_uuid(row, 0)?,
        course_id: get_uuid(row, 1)?,
        title: get_string(row, 2)?,
        description: get_string(row, 3)?,
        due_at: get_opt_ts(row, 4),
        max_score: get_i64(row, 5)?,
        created_by: get_uuid(row, 6)?,
        created_at: get_ts(row, 7)?,
    })
}

fn row_to_submission(row: &Row) -> Result<Submission, DomainError> {
    Ok(Submission {
        id: get_uuid(row, 0)?,
        assignment_id: get_uuid(row, 1)?,
        student_id: get_uuid(row, 2)?,
        content: get_string(row, 3)?,
        submitted_at: get_ts(row, 4)?,
        score: get_opt_i64(row, 5),
        feedback: get_opt_string(row, 6),
        graded_at: get_opt_ts(row, 7),
    })
}

#[async_trait::async_trait]
impl AssignmentRepo for SqliteRepo {
    async fn insert_assignment(&self, a: &Assignment) -> Result<(), DomainError> {
        let conn = self.conn().await?;
        conn.execute(
            r#"
            INSERT INTO assignments (id, course_id, title, description, due_at, max_score, created_by, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                a.id.to_string(),
                a.course_id.to_string(),
                a.title.as_str(),
                a.description.as_str(),
                opt_ts(a.due_at),
                a.max_score,
                a.created_by.to_string(),
                ts(a.created_at)
            ],
        )
        .await
        .map_err(DomainError::repo)?;
        Ok(())
    }

    async fn get_assignment(&self, id: Uuid) -> Result<Option<Assignment>, DomainError> {
        let conn = self.conn().await?;
        let rows = conn
            .query(
                &format!("SELECT {ASSIGNMENT_COLUMNS} FROM assignments WHERE id = ?1"),
                params![id.to_string()],
            )
            .await
            .map_err(DomainError::repo)?;
        first(rows, row_to_assignment).await
    }

    async fn list_assignments(&self, course_id: Uuid) -> Result<Vec<Assignment>, DomainError> {
        let conn = self.conn().await?;
        let rows = conn
            .query(
                &format!(
                    "SELECT {ASSIGNMENT_COLUMNS} FROM assignments WHERE course_id = ?1 \
                     ORDER BY due_at IS NULL, due_at, created_at"
                ),
                params![course_id.to_string()],
            )
            .await
            .map_err(DomainError::repo)?;
        collect(rows, row_to_assignment).await
    }

    async fn update_assignment(&self, a: &Assignment) -> Result<(), DomainError> {
        let conn = self.conn().await?;
        conn.execute(
            "UPDATE assignments SET title = ?2, description = ?3, due_at = ?4, max_score = ?5 WHERE id = ?1",
            params![
                a.id.to_string(),
                a.title.as_str(),
                a.description.as_str(),
                opt_ts(a.due_at),
                a.max_score
            ],
        )
        .await
        .map_err(DomainError::repo)?;
        Ok(())
    }

    async fn delete_assignment(&self, id: Uuid) -> Result<bool, DomainError> {
        let conn = self.conn().await?;
        let deleted = conn
            .execute("DELETE FROM assignments WHERE id = ?1", params![id.to_string()])
            .await
            .map_err(DomainError::repo)?;
        Ok(deleted > 0)
    }

    async fn upsert_submission(&self, s: &Submission) -> Result<Submission, DomainError> {
        let conn = self.conn().await?;
        // Graded rows are frozen: the guarded update touches nothing once graded_at is set.
        let written = conn
            .execute(
                r#"
                INSERT INTO assignment_submissions (id, assignment_id, student_id, content, submitted_at)
                VALUES (?1, ?2, ?3, ?4, ?5)
                ON CONFLICT (assignment_id, student_id) DO UPDATE SET
                    content = excluded.content,
                    submitted_at = excluded.submitted_at
                WHERE assignment_submissions.graded_at IS NULL
                "#,
                params![
                    s.id.to_string(),
                    s.assignment_id.to_string(),
                    s.student_id.to_string(),
                    s.content.as_str(),
                    ts(s.submitted_at)
                ],
            )
            .await
            .map_err(DomainError::repo)?;
        if written == 0 {
            return Err(DomainError::Conflict(
                "submission has already been graded".to_string(),
            ));
        }
        self.find_submission(s.assignment_id, s.student_id)
            .await?
            .ok_or_else(|| DomainError::Repo("submission vanished after upsert".to_string()))
    }

    async fn get_submission(&self, id: Uuid) -> Result<Option<Submission>, DomainError> {
        let conn = self.conn().await?;
        let rows = conn
            .query(
                &format!("SELECT {SUBMISSION_COLUMNS} FROM assignment_submissions WHERE id = ?1"),
                params![id.to_string()],
            )
            .await
            .map_err(DomainError::repo)?;
        first(rows, row_to_submission).await
    }

    async fn find_submission(
        &self,
        assignment_id: Uuid,
        student_id: Uuid,
    ) -> Result<Option<Submission>, DomainError> {
        let conn = self.conn().await?;
        let rows = conn
            .query(
                &format!(
                    "SELECT {SUBMISSION_COLUMNS} FROM assignment_submissions \
                     WHERE assignment_id = ?1 AND student_id = ?2"
                ),
                params![assignment_id.to_string(), student_id.to_string()],
            )
            .await
            .map_err(DomainError::repo)?;
        first(rows, row_to_submission).await
    }

    async fn list_submissions(
        &self,
        assignment_id: Uuid,
        student_id: Option<Uuid>,
    ) -> Result<Vec<Submission>, DomainError> {
        let conn = self.conn().await?;
        let rows = conn
            .query(
                &format!(
                    "SELECT {SUBMISSION_COLUMNS} FROM assignment_submissions \
                     WHERE assignment_id = ?1 AND (?2 IS NULL OR student_id = ?2) \
                     ORDER BY submitted_at"
                ),
                params![assignment_id.to_string(), student_id.map(|id| id.to_string())],
            )
            .await
            .map_err(DomainError::repo)?;
        collect(rows, row_to_submission).await
    }

    async fn grade_submission(
        &self,
        id: Uuid,
        score: i64,
        feedback: Option<&str>,
        at: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        let conn = self.conn().await?;
        conn.execute(
            "UPDATE assignment_submissions SET score = ?2, feedback = ?3, graded_at = ?4 WHERE id = ?1",
            params![
                id.to_string(),
                score,
                feedback.map(str::to_string),
                ts(at)
            ],
        )
        .await
        .map_err(DomainError::repo)?;
        Ok(())
    }
}
