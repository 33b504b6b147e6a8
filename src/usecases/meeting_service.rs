//! Live meetings backed by provider rooms. Host plus enrolled students participate.

use super::access::load_course;
use super::notification_service::NotificationService;
use crate::domain::rules::{ensure_can_author, ensure_manages_course, validate_title};
use crate::domain::{DomainError, Meeting, NewNotification, NotificationKind, Profile};
use crate::ports::{CourseRepo, EnrollmentRepo, MeetingProviderPort, MeetingRepo};
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

pub const DEFAULT_MEETING_MINUTES: i64 = 60;
const MAX_MEETING_MINUTES: i64 = 8 * 60;

#[derive(Debug, Clone, Deserialize)]
pub struct NewMeeting {
    pub course_id: Uuid,
    pub title: String,
    pub starts_at: DateTime<Utc>,
    #[serde(default)]
    pub duration_minutes: Option<i64>,
}

pub struct MeetingService {
    meetings: Arc<dyn MeetingRepo>,
    courses: Arc<dyn CourseRepo>,
    enrollments: Arc<dyn EnrollmentRepo>,
    provider: Arc<dyn MeetingProviderPort>,
    notifications: Arc<NotificationService>,
}

impl MeetingService {
    pub fn new(
        meetings: Arc<dyn MeetingRepo>,
        courses: Arc<dyn CourseRepo>,
        enrollments: Arc<dyn EnrollmentRepo>,
        provider: Arc<dyn MeetingProviderPort>,
        notifications: Arc<NotificationService>,
    ) -> Self {
        Self {
            meetings,
            courses,
            enrollments,
            provider,
            notifications,
        }
    }

    fn room_name(id: Uuid) -> String {
        format!("lh-{}", &id.simple().to_string()[..12])
    }

    pub async fn create(&self, user: &Profile, input: NewMeeting) -> Result<Meeting, DomainError> {
        ensure_can_author(user)?;
        validate_title(&input.title)?;
        let course = load_course(self.courses.as_ref(), input.course_id).await?;
        ensure_manages_course(user, &course)?;
        let minutes = input.duration_minutes.unwrap_or(DEFAULT_MEETING_MINUTES);
        if !(1..=MAX_MEETING_MINUTES).contains(&minutes) {
            return Err(DomainError::validation(format!(
                "duration must be between 1 and {MAX_MEETING_MINUTES} minutes"
            )));
        }

        let id = Uuid::new_v4();
        let room = self
            .provider
            .create_room(
                &Self::room_name(id),
                input.starts_at,
                input.starts_at + Duration::minutes(minutes),
            )
            .await?;

        let meeting = Meeting {
            id,
            course_id: course.id,
            host_id: user.id,
            title: input.title.trim().to_string(),
            starts_at: input.starts_at,
            room_name: room.name,
            room_url: room.url,
            created_at: Utc::now(),
        };
        let students = match self.persist(&meeting, user.id).await {
            Ok(students) => students,
            Err(e) => {
                if let Err(cleanup) = self.provider.delete_room(&meeting.room_name).await {
                    warn!(room = %meeting.room_name, error = %cleanup, "orphaned meeting room left at provider");
                }
                return Err(e);
            }
        };
        info!(
            meeting_id = %meeting.id,
            course_id = %course.id,
            participants = students.len() + 1,
            "meeting scheduled"
        );

        self.notifications
            .notify_and_email(
                &students,
                NewNotification {
                    kind: NotificationKind::Meeting,
                    title: format!("Meeting scheduled: {}", meeting.title),
                    body: format!(
                        "{} starts at {}",
                        course.title,
                        meeting.starts_at.format("%Y-%m-%d %H:%M UTC")
                    ),
                    link: Some(format!("/meetings/{}", meeting.id)),
                },
            )
            .await;
        Ok(meeting)
    }

    /// Store the meeting with its host and enrolled students. Returns the students.
    async fn persist(&self, meeting: &Meeting, host_id: Uuid) -> Result<Vec<Uuid>, DomainError> {
        self.meetings.insert_meeting(meeting).await?;
        let students: Vec<Uuid> = self
            .enrollments
            .enrolled_student_ids(meeting.course_id)
            .await?
            .into_iter()
            .filter(|s| *s != host_id)
            .collect();
        let mut participants = Vec::with_capacity(students.len() + 1);
        participants.push(host_id);
        participants.extend(students.iter().copied());
        if let Err(e) = self.meetings.add_participants(meeting.id, &participants).await {
            if let Err(undo) = self.meetings.delete_meeting(meeting.id).await {
                warn!(meeting_id = %meeting.id, error = %undo, "could not remove half-created meeting");
            }
            return Err(e);
        }
        Ok(students)
    }

    pub async fn list(&self, user: &Profile) -> Result<Vec<Meeting>, DomainError> {
        let scope = if user.is_admin() { None } else { Some(user.id) };
        self.meetings.list_meetings(scope).await
    }

    pub async fn get(&self, user: &Profile, id: Uuid) -> Result<Meeting, DomainError> {
        let meeting = self
            .meetings
            .get_meeting(id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("meeting {id}")))?;
        if !user.is_admin() && !self.meetings.is_participant(id, user.id).await? {
            return Err(DomainError::forbidden("not a participant of this meeting"));
        }
        Ok(meeting)
    }

    /// Remove the meeting; the provider room is deleted best-effort.
    pub async fn delete(&self, user: &Profile, id: Uuid) -> Result<(), DomainError> {
        let meeting = self
            .meetings
            .get_meeting(id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("meeting {id}")))?;
        if meeting.host_id != user.id && !user.is_admin() {
            return Err(DomainError::forbidden("only the host can cancel this meeting"));
        }
        self.meetings.delete_meeting(id).await?;
        if let Err(e) = self.provider.delete_room(&meeting.room_name).await {
            warn!(meeting_id = %id, room = %meeting.room_name, error = %e, "room deletion failed");
        }
        info!(meeting_id = %id, "meeting cancelled");
        Ok(())
    }
}
