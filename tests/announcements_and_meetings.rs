//! Announcement permissions, audiences and meeting participation.

mod common;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use common::World;
use learnhub::adapters::persistence::SqliteRepo;
use learnhub::domain::{AccountStatus, DomainError, Meeting, NotificationKind, Role};
use learnhub::ports::{MeetingProviderPort, MeetingRepo, MeetingRoom};
use learnhub::usecases::announcement_service::NewAnnouncement;
use learnhub::usecases::course_service::{CoursePatch, NewCourse};
use learnhub::usecases::meeting_service::NewMeeting;
use learnhub::usecases::{MeetingService, NotificationService};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

fn announcement(course_id: Option<Uuid>) -> NewAnnouncement {
    NewAnnouncement {
        course_id,
        title: "Schedule change".to_string(),
        body: "Next session moves to Friday.".to_string(),
    }
}

async fn course_of(world: &World, owner: &learnhub::domain::Profile) -> Uuid {
    let course = world
        .state
        .courses
        .create_course(
            owner,
            NewCourse {
                title: "Networking".to_string(),
                description: String::new(),
                price: 0,
                instructor_id: None,
            },
        )
        .await
        .unwrap();
    world
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
    course.id
}

#[tokio::test]
async fn test_announcement_permissions() {
    let world = World::new().await;
    let admin = world.admin().await;
    let owner = world.instructor().await;
    let other = world.instructor().await;
    let student = world.student().await;
    let course_id = course_of(&world, &owner).await;

    let svc = &world.state.announcements;
    assert!(matches!(
        svc.publish(&student, announcement(None)).await.unwrap_err(),
        DomainError::Forbidden(_)
    ));
    assert!(matches!(
        svc.publish(&student, announcement(Some(course_id))).await.unwrap_err(),
        DomainError::Forbidden(_)
    ));
    assert!(matches!(
        svc.publish(&owner, announcement(None)).await.unwrap_err(),
        DomainError::Forbidden(_)
    ));
    assert!(matches!(
        svc.publish(&other, announcement(Some(course_id))).await.unwrap_err(),
        DomainError::Forbidden(_)
    ));

    assert!(svc.publish(&owner, announcement(Some(course_id))).await.is_ok());
    assert!(svc.publish(&admin, announcement(Some(course_id))).await.is_ok());
    assert!(svc.publish(&admin, announcement(None)).await.is_ok());
}

#[tokio::test]
async fn test_pending_instructor_cannot_author() {
    let world = World::new().await;
    let pending = world.profile(Role::Instructor, AccountStatus::Pending).await;
    let err = world
        .state
        .courses
        .create_course(
            &pending,
            NewCourse {
                title: "Early".to_string(),
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
async fn test_course_announcement_reaches_enrolled_students_only() {
    let world = World::new().await;
    let owner = world.instructor().await;
    let enrolled = world.student().await;
    let outsider = world.student().await;
    let course_id = course_of(&world, &owner).await;
    world.state.enrollments.enroll(&enrolled, course_id).await.unwrap();

    world
        .state
        .announcements
        .publish(&owner, announcement(Some(course_id)))
        .await
        .unwrap();

    let visible = world.state.announcements.list(&enrolled, None).await.unwrap();
    assert_eq!(visible.len(), 1);
    assert!(world
        .state
        .announcements
        .list(&outsider, None)
        .await
        .unwrap()
        .is_empty());

    let notes = world.state.notifications.list(&enrolled, true, None).await.unwrap();
    assert!(notes.iter().any(|n| n.kind == NotificationKind::Announcement));
    assert!(world
        .state
        .notifications
        .list(&outsider, true, None)
        .await
        .unwrap()
        .is_empty());

    let mailed = world.mailer.sent.lock().unwrap().clone();
    assert!(mailed.iter().any(|(to, _)| *to == enrolled.email));
    assert!(!mailed.iter().any(|(to, _)| *to == outsider.email));
}

#[tokio::test]
async fn test_global_announcement_notifies_everyone_but_banned() {
    let world = World::new().await;
    let admin = world.admin().await;
    let student = world.student().await;
    let banned = world.profile(Role::Student, AccountStatus::Banned).await;

    world
        .state
        .announcements
        .publish(&admin, announcement(None))
        .await
        .unwrap();

    assert_eq!(
        world.state.notifications.list(&student, true, None).await.unwrap().len(),
        1
    );
    assert!(world
        .state
        .notifications
        .list(&banned, true, None)
        .await
        .unwrap()
        .is_empty());
    assert_eq!(world.state.notifications.mark_all_read(&student).await.unwrap(), 1);
    assert!(world
        .state
        .notifications
        .list(&student, true, None)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_meeting_participants_and_visibility() {
    let world = World::new().await;
    let owner = world.instructor().await;
    let enrolled = world.student().await;
    let outsider = world.student().await;
    let course_id = course_of(&world, &owner).await;
    world.state.enrollments.enroll(&enrolled, course_id).await.unwrap();

    let meeting = world
        .state
        .meetings
        .create(
            &owner,
            NewMeeting {
                course_id,
                title: "Office hours".to_string(),
                starts_at: Utc::now() + Duration::days(1),
                duration_minutes: None,
            },
        )
        .await
        .unwrap();
    assert!(meeting.room_url.ends_with(&meeting.room_name));

    assert_eq!(world.state.meetings.list(&enrolled).await.unwrap().len(), 1);
    assert!(world.state.meetings.get(&enrolled, meeting.id).await.is_ok());
    assert!(world.state.meetings.list(&outsider).await.unwrap().is_empty());
    assert!(matches!(
        world.state.meetings.get(&outsider, meeting.id).await.unwrap_err(),
        DomainError::Forbidden(_)
    ));

    assert!(matches!(
        world.state.meetings.delete(&enrolled, meeting.id).await.unwrap_err(),
        DomainError::Forbidden(_)
    ));
    world.state.meetings.delete(&owner, meeting.id).await.unwrap();
    assert!(world.state.meetings.list(&enrolled).await.unwrap().is_empty());
}

/// Provider double that remembers which rooms were opened and torn down.
#[derive(Default)]
struct RecordingRooms {
    created: Mutex<Vec<String>>,
    deleted: Mutex<Vec<String>>,
}

#[async_trait]
impl MeetingProviderPort for RecordingRooms {
    async fn create_room(
        &self,
        name: &str,
        _starts_at: DateTime<Utc>,
        _expires_at: DateTime<Utc>,
    ) -> Result<MeetingRoom, DomainError> {
        self.created.lock().unwrap().push(name.to_string());
        Ok(MeetingRoom {
            name: name.to_string(),
            url: format!("https://rooms.test/{name}"),
        })
    }

    async fn delete_room(&self, name: &str) -> Result<(), DomainError> {
        self.deleted.lock().unwrap().push(name.to_string());
        Ok(())
    }
}

/// Real store whose participant writes always fail.
struct BrokenParticipants(Arc<SqliteRepo>);

#[async_trait]
impl MeetingRepo for BrokenParticipants {
    async fn insert_meeting(&self, meeting: &Meeting) -> Result<(), DomainError> {
        self.0.insert_meeting(meeting).await
    }

    async fn add_participants(
        &self,
        _meeting_id: Uuid,
        _user_ids: &[Uuid],
    ) -> Result<(), DomainError> {
        Err(DomainError::Repo("database is locked".to_string()))
    }

    async fn get_meeting(&self, id: Uuid) -> Result<Option<Meeting>, DomainError> {
        self.0.get_meeting(id).await
    }

    async fn is_participant(&self, meeting_id: Uuid, user_id: Uuid) -> Result<bool, DomainError> {
        self.0.is_participant(meeting_id, user_id).await
    }

    async fn list_meetings(&self, user_id: Option<Uuid>) -> Result<Vec<Meeting>, DomainError> {
        self.0.list_meetings(user_id).await
    }

    async fn delete_meeting(&self, id: Uuid) -> Result<bool, DomainError> {
        self.0.delete_meeting(id).await
    }
}

#[tokio::test]
async fn test_failed_meeting_write_releases_provider_room() {
    let world = World::new().await;
    let owner = world.instructor().await;
    let student = world.student().await;
    let course_id = course_of(&world, &owner).await;
    world.state.enrollments.enroll(&student, course_id).await.unwrap();

    let rooms = Arc::new(RecordingRooms::default());
    let service = MeetingService::new(
        Arc::new(BrokenParticipants(world.repo.clone())),
        world.repo.clone(),
        world.repo.clone(),
        rooms.clone(),
        Arc::new(NotificationService::new(
            world.repo.clone(),
            world.repo.clone(),
            world.mailer.clone(),
        )),
    );

    let err = service
        .create(
            &owner,
            NewMeeting {
                course_id,
                title: "Lab session".to_string(),
                starts_at: Utc::now() + Duration::hours(2),
                duration_minutes: Some(90),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Repo(_)));

    let created = rooms.created.lock().unwrap().clone();
    assert_eq!(created.len(), 1);
    assert_eq!(*rooms.deleted.lock().unwrap(), created);
    assert!(world.repo.list_meetings(None).await.unwrap().is_empty());
    let notes = world.state.notifications.list(&student, false, None).await.unwrap();
    assert!(notes.iter().all(|n| n.kind != NotificationKind::Meeting));
}
