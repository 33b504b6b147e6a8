//! Course authoring: courses, modules, lessons and the course outline.

use super::access::load_course;
use crate::domain::rules::{
    can_manage_course, ensure_can_author, ensure_manages_course, validate_price, validate_title,
};
use crate::domain::{Course, CourseOutline, DomainError, Lesson, Millimes, Module, ModuleOutline, Profile};
use crate::ports::CourseRepo;
use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Clone, Deserialize)]
pub struct NewCourse {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub price: Millimes,
    /// Admins may create a course on behalf of an instructor.
    #[serde(default)]
    pub instructor_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CoursePatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<Millimes>,
    pub published: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewModule {
    pub title: String,
    #[serde(default)]
    pub position: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewLesson {
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub video_url: Option<String>,
    #[serde(default)]
    pub position: Option<i64>,
    #[serde(default)]
    pub duration_minutes: i64,
}

pub struct CourseService {
    courses: Arc<dyn CourseRepo>,
}

impl CourseService {
    pub fn new(courses: Arc<dyn CourseRepo>) -> Self {
        Self { courses }
    }

    pub async fn create_course(&self, user: &Profile, input: NewCourse) -> Result<Course, DomainError> {
        ensure_can_author(user)?;
        validate_title(&input.title)?;
        validate_price(input.price)?;
        let instructor_id = match input.instructor_id {
            Some(id) if user.is_admin() => id,
            Some(id) if id != user.id => {
                return Err(DomainError::forbidden("only admins can assign another instructor"));
            }
            _ => user.id,
        };
        let course = Course {
            id: Uuid::new_v4(),
            instructor_id,
            title: input.title.trim().to_string(),
            description: input.description,
            price: input.price,
            published: false,
            created_at: Utc::now(),
        };
        self.courses.insert_course(&course).await?;
        info!(course_id = %course.id, instructor_id = %course.instructor_id, "course created");
        Ok(course)
    }

    /// Published courses; instructors also see their drafts, admins see everything.
    pub async fn list_courses(&self, user: &Profile) -> Result<Vec<Course>, DomainError> {
        self.courses
            .list_courses(Some(user.id), user.is_admin())
            .await
    }

    /// Course with modules and lessons in position order. Drafts are hidden (404)
    /// from anyone but the owner and admins.
    pub async fn get_outline(&self, user: &Profile, id: Uuid) -> Result<CourseOutline, DomainError> {
        let course = load_course(self.courses.as_ref(), id).await?;
        if !course.published && !can_manage_course(user, &course) {
            return Err(DomainError::not_found(format!("course {id}")));
        }
        let modules = self.courses.list_modules(id).await?;
        let lessons = self.courses.list_course_lessons(id).await?;
        let outline = modules
            .into_iter()
            .map(|module| ModuleOutline {
                lessons: lessons
                    .iter()
                    .filter(|l| l.module_id == module.id)
                    .cloned()
                    .collect(),
                module,
            })
            .collect();
        Ok(CourseOutline {
            course,
            modules: outline,
        })
    }

    pub async fn update_course(
        &self,
        user: &Profile,
        id: Uuid,
        patch: CoursePatch,
    ) -> Result<Course, DomainError> {
        let mut course = load_course(self.courses.as_ref(), id).await?;
        ensure_manages_course(user, &course)?;
        if let Some(title) = patch.title {
            validate_title(&title)?;
            course.title = title.trim().to_string();
        }
        if let Some(description) = patch.description {
            course.description = description;
        }
        if let Some(price) = patch.price {
            validate_price(price)?;
            course.price = price;
        }
        if let Some(published) = patch.published {
            course.published = published;
        }
        self.courses.update_course(&course).await?;
        info!(course_id = %id, published = course.published, "course updated");
        Ok(course)
    }

    pub async fn delete_course(&self, user: &Profile, id: Uuid) -> Result<(), DomainError> {
        let course = load_course(self.courses.as_ref(), id).await?;
        ensure_manages_course(user, &course)?;
        self.courses.delete_course(id).await?;
        info!(course_id = %id, "course deleted");
        Ok(())
    }

    pub async fn add_module(
        &self,
        user: &Profile,
        course_id: Uuid,
        input: NewModule,
    ) -> Result<Module, DomainError> {
        let course = load_course(self.courses.as_ref(), course_id).await?;
        ensure_manages_course(user, &course)?;
        validate_title(&input.title)?;
        let position = match input.position {
            Some(p) => p,
            None => self.courses.next_module_position(course_id).await?,
        };
        let module = Module {
            id: Uuid::new_v4(),
            course_id,
            title: input.title.trim().to_string(),
            position,
        };
        self.courses.insert_module(&module).await?;
        Ok(module)
    }

    pub async fn add_lesson(
        &self,
        user: &Profile,
        module_id: Uuid,
        input: NewLesson,
    ) -> Result<Lesson, DomainError> {
        let module = self
            .courses
            .get_module(module_id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("module {module_id}")))?;
        let course = load_course(self.courses.as_ref(), module.course_id).await?;
        ensure_manages_course(user, &course)?;
        validate_title(&input.title)?;
        if input.duration_minutes < 0 {
            return Err(DomainError::validation("duration must not be negative"));
        }
        let position = match input.position {
            Some(p) => p,
            None => self.courses.next_lesson_position(module_id).await?,
        };
        let lesson = Lesson {
            id: Uuid::new_v4(),
            module_id,
            title: input.title.trim().to_string(),
            content: input.content,
            video_url: input.video_url.filter(|u| !u.trim().is_empty()),
            position,
            duration_minutes: input.duration_minutes,
        };
        self.courses.insert_lesson(&lesson).await?;
        Ok(lesson)
    }
}
