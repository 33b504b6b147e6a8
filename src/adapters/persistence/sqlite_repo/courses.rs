//! Courses, modules and lessons.

use super::{
    SqliteRepo, collect, first, get_bool, get_i64, get_opt_string, get_string, get_ts, get_uuid,
    scalar, ts,
};
use crate::domain::{Course, DomainError, Lesson, Module};
use crate::ports::CourseRepo;
use libsql::{Row, params};
use uuid::Uuid;

const COURSE_COLUMNS: &str =
    "c.id, c.instructor_id, c.title, c.description, c.price, c.published, c.created_at";
const LESSON_COLUMNS: &str =
    "l.id, l.module_id, l.title, l.content, l.video_url, l.position, l.duration_minutes";

fn row_to_course(row: &Row) -> Result<Course, DomainError> {
    Ok(Course {
        id: get_uuid(row, 0)?,
        instructor_id: get_uuid(row, 1)?,
        title: get_string(row, 2)?,
        description: get_string(row, 3)?,
        price: get_i64(row, 4)?,
        published: get_bool(row, 5)?,
        created_at: get_ts(row, 6)?,
    })
}

fn row_to_module(row: &Row) -> Result<Module, DomainError> {
    Ok(Module {
        id: get_uuid(row, 0)?,
        course_id: get_uuid(row, 1)?,
        title: get_string(row, 2)?,
        position: get_i64(row, 3)?,
    })
}

fn row_to_lesson(row: &Row) -> Result<Lesson, DomainError> {
    Ok(Lesson {
        id: get_uuid(row, 0)?,
        module_id: get_uuid(row, 1)?,
        title: get_string(row, 2)?,
        content: get_string(row, 3)?,
        video_url: get_opt_string(row, 4),
        position: get_i64(row, 5)?,
        duration_minutes: get_i64(row, 6)?,
    })
}

#[async_trait::async_trait]
impl CourseRepo for SqliteRepo {
    async fn insert_course(&self, course: &Course) -> Result<(), DomainError> {
        let conn = self.conn().await?;
        conn.execute(
            r#"
            INSERT INTO courses (id, instructor_id, title, description, price, published, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                course.id.to_string(),
                course.instructor_id.to_string(),
                course.title.as_str(),
                course.description.as_str(),
                course.price,
                course.published as i64,
                ts(course.created_at)
            ],
        )
        .await
        .map_err(DomainError::repo)?;
        Ok(())
    }

    async fn get_course(&self, id: Uuid) -> Result<Option<Course>, DomainError> {
        let conn = self.conn().await?;
        let rows = conn
            .query(
                &format!("SELECT {COURSE_COLUMNS} FROM courses c WHERE c.id = ?1"),
                params![id.to_string()],
            )
            .await
            .map_err(DomainError::repo)?;
        first(rows, row_to_course).await
    }

    async fn list_courses(
        &self,
        include_drafts_of: Option<Uuid>,
        all: bool,
    ) -> Result<Vec<Course>, DomainError> {
        let conn = self.conn().await?;
        let rows = conn
            .query(
                &format!(
                    "SELECT {COURSE_COLUMNS} FROM courses c \
                     WHERE ?1 = 1 OR c.published = 1 OR c.instructor_id = ?2 \
                     ORDER BY c.created_at DESC"
                ),
                params![all as i64, include_drafts_of.map(|id| id.to_string())],
            )
            .await
            .map_err(DomainError::repo)?;
        collect(rows, row_to_course).await
    }

    async fn update_course(&self, course: &Course) -> Result<(), DomainError> {
        let conn = self.conn().await?;
        conn.execute(
            "UPDATE courses SET title = ?2, description = ?3, price = ?4, published = ?5 WHERE id = ?1",
            params![
                course.id.to_string(),
                course.title.as_str(),
                course.description.as_str(),
                course.price,
                course.published as i64
            ],
        )
        .await
        .map_err(DomainError::repo)?;
        Ok(())
    }

    async fn delete_course(&self, id: Uuid) -> Result<bool, DomainError> {
        let conn = self.conn().await?;
        let deleted = conn
            .execute("DELETE FROM courses WHERE id = ?1", params![id.to_string()])
            .await
            .map_err(DomainError::repo)?;
        Ok(deleted > 0)
    }

    async fn insert_module(&self, module: &Module) -> Result<(), DomainError> {
        let conn = self.conn().await?;
        conn.execute(
            "INSERT INTO modules (id, course_id, title, position) VALUES (?1, ?2, ?3, ?4)",
            params![
                module.id.to_string(),
                module.course_id.to_string(),
                module.title.as_str(),
                module.position
            ],
        )
        .await
        .map_err(DomainError::repo)?;
        Ok(())
    }

    async fn get_module(&self, id: Uuid) -> Result<Option<Module>, DomainError> {
        let conn = self.conn().await?;
        let rows = conn
            .query(
                "SELECT id, course_id, title, position FROM modules WHERE id = ?1",
                params![id.to_string()],
            )
            .await
            .map_err(DomainError::repo)?;
        first(rows, row_to_module).await
    }

    async fn next_module_position(&self, course_id: Uuid) -> Result<i64, DomainError> {
        let conn = self.conn().await?;
        let rows = conn
            .query(
                "SELECT COALESCE(MAX(position), 0) + 1 FROM modules WHERE course_id = ?1",
                params![course_id.to_string()],
            )
            .await
            .map_err(DomainError::repo)?;
        scalar(rows).await
    }

    async fn list_modules(&self, course_id: Uuid) -> Result<Vec<Module>, DomainError> {
        let conn = self.conn().await?;
        let rows = conn
            .query(
                "SELECT id, course_id, title, position FROM modules WHERE course_id = ?1 ORDER BY position",
                params![course_id.to_string()],
            )
            .await
            .map_err(DomainError::repo)?;
        collect(rows, row_to_module).await
    }

    async fn insert_lesson(&self, lesson: &Lesson) -> Result<(), DomainError> {
        let conn = self.conn().await?;
        conn.execute(
            r#"
            INSERT INTO lessons (id, module_id, title, content, video_url, position, duration_minutes)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                lesson.id.to_string(),
                lesson.module_id.to_string(),
                lesson.title.as_str(),
                lesson.content.as_str(),
                lesson.video_url.clone(),
                lesson.position,
                lesson.duration_minutes
            ],
        )
        .await
        .map_err(DomainError::repo)?;
        Ok(())
    }

    async fn get_lesson(&self, id: Uuid) -> Result<Option<Lesson>, DomainError> {
        let conn = self.conn().await?;
        let rows = conn
            .query(
                &format!("SELECT {LESSON_COLUMNS} FROM lessons l WHERE l.id = ?1"),
                params![id.to_string()],
            )
            .await
            .map_err(DomainError::repo)?;
        first(rows, row_to_lesson).await
    }

    async fn next_lesson_position(&self, module_id: Uuid) -> Result<i64, DomainError> {
        let conn = self.conn().await?;
        let rows = conn
            .query(
                "SELECT COALESCE(MAX(position), 0) + 1 FROM lessons WHERE module_id = ?1",
                params![module_id.to_string()],
            )
            .await
            .map_err(DomainError::repo)?;
        scalar(rows).await
    }

    async fn list_course_lessons(&self, course_id: Uuid) -> Result<Vec<Lesson>, DomainError> {
        let conn = self.conn().await?;
        let rows = conn
            .query(
                &format!(
                    "SELECT {LESSON_COLUMNS} FROM lessons l \
                     JOIN modules m ON m.id = l.module_id \
                     WHERE m.course_id = ?1 \
                     ORDER BY m.position, l.position"
                ),
                params![course_id.to_string()],
            )
            .await
            .map_err(DomainError::repo)?;
        collect(rows, row_to_lesson).await
    }

    async fn course_of_lesson(&self, lesson_id: Uuid) -> Result<Option<Course>, DomainError> {
        let conn = self.conn().await?;
        let rows = conn
            .query(
                &format!(
                    "SELECT {COURSE_COLUMNS} FROM courses c \
                     JOIN modules m ON m.course_id = c.id \
                     JOIN lessons l ON l.module_id = m.id \
                     WHERE l.id = ?1"
                ),
                params![lesson_id.to_string()],
            )
            .await
            .map_err(DomainError::repo)?;
        first(rows, row_to_course).await
    }

    async fn count_lessons(&self, course_id: Uuid) -> Result<u64, DomainError> {
        let conn = self.conn().await?;
        let rows = conn
            .query(
                "SELECT COUNT(*) FROM lessons l JOIN modules m ON m.id = l.module_id WHERE m.course_id = ?1",
                params![course_id.to_string()],
            )
            .await
            .map_err(DomainError::repo)?;
        Ok(scalar(rows).await?.max(0) as u64)
    }
}
