//! Course authoring, enrollment, progress, certificates and assignments end to end.

mod common;

use chrono::{Duration, Utc};
use common::World;
use learnhub::domain::{Course, DomainError, NotificationKind, Profile, Submission};
use learnhub::ports::{AnnouncementRepo, AssignmentRepo, CourseRepo, EnrollmentRepo, MeetingRepo};
use learnhub::usecases::announcement_service::NewAnnouncement;
use learnhub::usecases::assignment_service::{Grade, NewAssignment, NewSubmission};
use learnhub::usecases::course_service::{CoursePatch, NewCourse, NewLesson, NewModule};
use learnhub::usecases::meeting_service::NewMeeting;
use learnhub::usecases::progress_service::ProgressUpdate;
use uuid::Uuid;

async fn published_course(world: &World, owner: &Profile, price: i64, lessons: usize) -> (Course, Vec<Uuid>) {
    let course = world
        .state
        .courses
        .create_course(
            owner,
            NewCourse {
                title: "Rust for the web".to_string(),
                description: "axum and friends".to_string(),
                price,
                instructor_id: None,
            },
        )
        .await
        .unwrap();
    let module = world
        .state
        .courses
        .add_module(
            owner,
            course.id,
            NewModule {
                title: "Basics".to_string(),
                position: None,
            },
        )
        .await
        .unwrap();
    let mut ids = Vec::new();
    for i in 0..lessons {
        let lesson = world
            .state
            .courses
            .add_lesson(
                owner,
                module.id,
                NewLesson {
                    title: format!("Lesson {}", i + 1),
                    content: String::new(),
                    video_url: None,
                    position: None,
                    duration_minutes: 10,
                },
            )
            .await
            .unwrap();
        ids.push(lesson.id);
    }
    let course = world
        .state
        .courses
        .update_course(
            owner,
            course.id,
            CoursePatch {
                published: Some(true),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    (course, ids)
}

async fn complete(world: &World, student: &Profile, lesson_id: Uuid, completed: bool) -> i64 {
    world
        .state
        .progress
        .update_progress(student, ProgressUpdate { lesson_id, completed })
        .await
        .unwrap()
        .progress
}

#[tokio::test]
async fn test_outline_orders_lessons_and_hides_drafts() {
    let world = World::new().await;
    let instructor = world.instructor().await;
    let student = world.student().await;
    let (course, lessons) = published_course(&world, &instructor, 0, 3).await;

    let outline = world.state.courses.get_outline(&student, course.id).await.unwrap();
    assert_eq!(outline.modules.len(), 1);
    let positions: Vec<i64> = outline.modules[0].lessons.iter().map(|l| l.position).collect();
    assert_eq!(positions, vec![1, 2, 3]);
    assert_eq!(outline.modules[0].lessons[0].id, lessons[0]);

    let draft = world
        .state
        .courses
        .create_course(
            &instructor,
            NewCourse {
                title: "Draft".to_string(),
                description: String::new(),
                price: 0,
                instructor_id: None,
            },
        )
        .await
        .unwrap();
    let err = world.state.courses.get_outline(&student, draft.id).await.unwrap_err();
    assert!(matches!(err, DomainError::NotFound(_)));
    assert!(world.state.courses.get_outline(&instructor, draft.id).await.is_ok());

    let visible = world.state.courses.list_courses(&student).await.unwrap();
    assert!(visible.iter().all(|c| c.published));
}

#[tokio::test]
async fn test_students_cannot_author_courses() {
    let world = World::new().await;
    let student = world.student().await;
    let err = world
        .state
        .courses
        .create_course(
            &student,
            NewCourse {
                title: "Mine".to_string(),
                description: String::new(),
                price: 0,
                instructor_id: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Forbidden(_)));
}

#[tokio::test]
async fn test_enroll_is_idempotent_and_paid_courses_need_payment() {
    let world = World::new().await;
    let instructor = world.instructor().await;
    let student = world.student().await;
    let (free, _) = published_course(&world, &instructor, 0, 1).await;
    let (paid, _) = published_course(&world, &instructor, 45_000, 1).await;

    let first = world.state.enrollments.enroll(&student, free.id).await.unwrap();
    let second = world.state.enrollments.enroll(&student, free.id).await.unwrap();
    assert!(first.created);
    assert!(!second.created);
    assert_eq!(first.enrollment.id, second.enrollment.id);

    let err = world.state.enrollments.enroll(&student, paid.id).await.unwrap_err();
    assert!(matches!(err, DomainError::PaymentRequired(_)));

    let mine = world.state.enrollments.list_mine(&student).await.unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].course_title, "Rust for the web");
}

#[tokio::test]
async fn test_progress_rounds_and_certificate_is_issued_once() {
    let world = World::new().await;
    let instructor = world.instructor().await;
    let student = world.student().await;
    let (course, lessons) = published_course(&world, &instructor, 0, 3).await;
    world.state.enrollments.enroll(&student, course.id).await.unwrap();

    assert_eq!(complete(&world, &student, lessons[0], true).await, 33);
    // Repeating the same update does not double count.
    assert_eq!(complete(&world, &student, lessons[0], true).await, 33);
    assert_eq!(complete(&world, &student, lessons[1], true).await, 67);

    let report = world
        .state
        .progress
        .update_progress(
            &student,
            ProgressUpdate {
                lesson_id: lessons[2],
                completed: true,
            },
        )
        .await
        .unwrap();
    assert_eq!(report.progress, 100);
    assert_eq!(report.completed_lessons, 3);
    assert_eq!(report.total_lessons, 3);
    let certificate = report.certificate.expect("certificate at 100%");
    assert!(certificate.serial.starts_with(&format!("LH-{}-", Utc::now().format("%Y"))));

    let again = world
        .state
        .progress
        .update_progress(
            &student,
            ProgressUpdate {
                lesson_id: lessons[2],
                completed: true,
            },
        )
        .await
        .unwrap();
    assert_eq!(again.certificate.map(|c| c.id), Some(certificate.id));

    // Dropping below 100 clears completion but keeps the certificate.
    assert_eq!(complete(&world, &student, lessons[0], false).await, 67);
    let enrollment = world
        .repo
        .get_enrollment(student.id, course.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(enrollment.progress, 67);
    assert!(enrollment.completed_at.is_none());
    assert!(world
        .repo
        .get_certificate(student.id, course.id)
        .await
        .unwrap()
        .is_some());

    let notes = world.state.notifications.list(&student, false, None).await.unwrap();
    let certs = notes
        .iter()
        .filter(|n| n.kind == NotificationKind::Certificate)
        .count();
    assert_eq!(certs, 1);
}

#[tokio::test]
async fn test_progress_requires_enrollment() {
    let world = World::new().await;
    let instructor = world.instructor().await;
    let outsider = world.student().await;
    let (_, lessons) = published_course(&world, &instructor, 0, 2).await;

    let err = world
        .state
        .progress
        .update_progress(
            &outsider,
            ProgressUpdate {
                lesson_id: lessons[0],
                completed: true,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Forbidden(_)));
}

#[tokio::test]
async fn test_submission_window_and_grading() {
    let world = World::new().await;
    let instructor = world.instructor().await;
    let student = world.student().await;
    let (course, _) = published_course(&world, &instructor, 0, 1).await;
    world.state.enrollments.enroll(&student, course.id).await.unwrap();

    let open = world
        .state
        .assignments
        .create(
            &instructor,
            course.id,
            NewAssignment {
                title: "Build a router".to_string(),
                description: String::new(),
                due_at: Some(Utc::now() + Duration::days(7)),
                max_score: Some(20),
            },
        )
        .await
        .unwrap();
    let closed = world
        .state
        .assignments
        .create(
            &instructor,
            course.id,
            NewAssignment {
                title: "Past due".to_string(),
                description: String::new(),
                due_at: Some(Utc::now() - Duration::hours(1)),
                max_score: None,
            },
        )
        .await
        .unwrap();

    let late = world
        .state
        .assignments
        .submit(
            &student,
            closed.id,
            NewSubmission {
                content: "too late".to_string(),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(late, DomainError::Conflict(_)));

    let submission = world
        .state
        .assignments
        .submit(
            &student,
            open.id,
            NewSubmission {
                content: "https://git.example/router".to_string(),
            },
        )
        .await
        .unwrap();

    let over = world
        .state
        .assignments
        .grade(
            &instructor,
            submission.id,
            Grade {
                score: 21,
                feedback: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(over, DomainError::Validation(_)));

    let graded = world
        .state
        .assignments
        .grade(
            &instructor,
            submission.id,
            Grade {
                score: 18,
                feedback: Some("solid".to_string()),
            },
        )
        .await
        .unwrap();
    assert_eq!(graded.score, Some(18));

    let resubmit = world
        .state
        .assignments
        .submit(
            &student,
            open.id,
            NewSubmission {
                content: "v2".to_string(),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(resubmit, DomainError::Conflict(_)));

    let mine = world
        .state
        .assignments
        .list_submissions(&student, open.id)
        .await
        .unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].feedback.as_deref(), Some("solid"));

    let notes = world.state.notifications.list(&student, true, None).await.unwrap();
    assert!(notes.iter().any(|n| n.kind == NotificationKind::Grade));
    assert!(notes.iter().any(|n| n.kind == NotificationKind::Assignment));
}

#[tokio::test]
async fn test_graded_submission_is_frozen_in_store() {
    let world = World::new().await;
    let instructor = world.instructor().await;
    let student = world.student().await;
    let (course, _) = published_course(&world, &instructor, 0, 1).await;
    world.state.enrollments.enroll(&student, course.id).await.unwrap();
    let assignment = world
        .state
        .assignments
        .create(
            &instructor,
            course.id,
            NewAssignment {
                title: "Write a parser".to_string(),
                description: String::new(),
                due_at: None,
                max_score: Some(100),
            },
        )
        .await
        .unwrap();

    let draft = |content: &str| Submission {
        id: Uuid::new_v4(),
        assignment_id: assignment.id,
        student_id: student.id,
        content: content.to_string(),
        submitted_at: Utc::now(),
        score: None,
        feedback: None,
        graded_at: None,
    };

    let first = world.repo.upsert_submission(&draft("v1")).await.unwrap();
    // Before grading a resubmission replaces the content in place.
    let second = world.repo.upsert_submission(&draft("v1.1")).await.unwrap();
    assert_eq!(second.id, first.id);
    assert_eq!(second.content, "v1.1");

    world
        .state
        .assignments
        .grade(
            &instructor,
            first.id,
            Grade {
                score: 90,
                feedback: None,
            },
        )
        .await
        .unwrap();

    let late = world
        .repo
        .upsert_submission(&draft("v2-after-grade"))
        .await
        .unwrap_err();
    assert!(matches!(late, DomainError::Conflict(_)));

    let stored = world
        .repo
        .find_submission(assignment.id, student.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.content, "v1.1");
    assert_eq!(stored.score, Some(90));
    assert!(stored.graded_at.is_some());
}

#[tokio::test]
async fn test_deleting_course_removes_its_content() {
    let world = World::new().await;
    let instructor = world.instructor().await;
    let student = world.student().await;
    let (course, lessons) = published_course(&world, &instructor, 0, 2).await;
    world.state.enrollments.enroll(&student, course.id).await.unwrap();
    let module_id = world
        .repo
        .get_lesson(lessons[0])
        .await
        .unwrap()
        .unwrap()
        .module_id;
    let assignment = world
        .state
        .assignments
        .create(
            &instructor,
            course.id,
            NewAssignment {
                title: "Homework".to_string(),
                description: String::new(),
                due_at: None,
                max_score: None,
            },
        )
        .await
        .unwrap();
    let announcement = world
        .state
        .announcements
        .publish(
            &instructor,
            NewAnnouncement {
                course_id: Some(course.id),
                title: "Welcome".to_string(),
                body: String::new(),
            },
        )
        .await
        .unwrap();
    let meeting = world
        .state
        .meetings
        .create(
            &instructor,
            NewMeeting {
                course_id: course.id,
                title: "Office hours".to_string(),
                starts_at: Utc::now() + Duration::days(1),
                duration_minutes: None,
            },
        )
        .await
        .unwrap();

    let err = world
        .state
        .courses
        .delete_course(&student, course.id)
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Forbidden(_)));

    world
        .state
        .courses
        .delete_course(&instructor, course.id)
        .await
        .unwrap();

    assert!(world.repo.get_course(course.id).await.unwrap().is_none());
    assert!(world.repo.get_module(module_id).await.unwrap().is_none());
    for lesson_id in lessons {
        assert!(world.repo.get_lesson(lesson_id).await.unwrap().is_none());
    }
    assert!(world.repo.get_assignment(assignment.id).await.unwrap().is_none());
    assert!(world
        .repo
        .get_announcement(announcement.id)
        .await
        .unwrap()
        .is_none());
    assert!(world.repo.get_meeting(meeting.id).await.unwrap().is_none());
    assert!(world
        .repo
        .get_enrollment(student.id, course.id)
        .await
        .unwrap()
        .is_none());
}
