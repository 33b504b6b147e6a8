//! Shared handler state: every use case service behind an `Arc`.

use crate::ports::{
    AnnouncementRepo, AssignmentRepo, BookRepo, ContentRepo, CourseRepo, EnrollmentRepo,
    MailerPort, MeetingProviderPort, MeetingRepo, NotificationRepo, PaymentGatewayPort,
    PaymentRepo, ProfileRepo, ReportRepo,
};
use crate::usecases::{
    AdminService, AnnouncementService, AssignmentService, AuthService, BookService,
    ContentService, CourseService, EnrollmentService, MeetingService, NotificationService,
    PaymentService, ProgressService,
};
use std::sync::Arc;

pub type SharedState = Arc<AppState>;

/// Outbound integrations chosen at startup.
pub struct Integrations {
    /// Configured payment gateways; a missing one answers 503.
    pub gateways: Vec<Arc<dyn PaymentGatewayPort>>,
    pub meetings: Arc<dyn MeetingProviderPort>,
    pub mailer: Arc<dyn MailerPort>,
}

pub struct AppState {
    pub auth: Arc<AuthService>,
    pub courses: Arc<CourseService>,
    pub enrollments: Arc<EnrollmentService>,
    pub progress: Arc<ProgressService>,
    pub assignments: Arc<AssignmentService>,
    pub announcements: Arc<AnnouncementService>,
    pub meetings: Arc<MeetingService>,
    pub notifications: Arc<NotificationService>,
    pub books: Arc<BookService>,
    pub payments: Arc<PaymentService>,
    pub admin: Arc<AdminService>,
    pub content: Arc<ContentService>,
}

impl AppState {
    /// Wire every service over one store implementing all storage ports.
    pub fn assemble<R>(store: Arc<R>, integrations: Integrations, instructor_share: i64) -> SharedState
    where
        R: ProfileRepo
            + CourseRepo
            + EnrollmentRepo
            + AssignmentRepo
            + AnnouncementRepo
            + BookRepo
            + PaymentRepo
            + MeetingRepo
            + NotificationRepo
            + ContentRepo
            + ReportRepo
            + 'static,
    {
        let profiles: Arc<dyn ProfileRepo> = store.clone();
        let courses: Arc<dyn CourseRepo> = store.clone();
        let enrollments: Arc<dyn EnrollmentRepo> = store.clone();
        let assignments: Arc<dyn AssignmentRepo> = store.clone();
        let announcements: Arc<dyn AnnouncementRepo> = store.clone();
        let books: Arc<dyn BookRepo> = store.clone();
        let payments: Arc<dyn PaymentRepo> = store.clone();
        let meetings: Arc<dyn MeetingRepo> = store.clone();
        let notifications_repo: Arc<dyn NotificationRepo> = store.clone();
        let content: Arc<dyn ContentRepo> = store.clone();
        let reports: Arc<dyn ReportRepo> = store;

        let auth = Arc::new(AuthService::new(Arc::clone(&profiles)));
        let notifications = Arc::new(NotificationService::new(
            notifications_repo,
            Arc::clone(&profiles),
            integrations.mailer,
        ));

        Arc::new(Self {
            courses: Arc::new(CourseService::new(Arc::clone(&courses))),
            enrollments: Arc::new(EnrollmentService::new(
                Arc::clone(&courses),
                Arc::clone(&enrollments),
                Arc::clone(&notifications),
            )),
            progress: Arc::new(ProgressService::new(
                Arc::clone(&courses),
                Arc::clone(&enrollments),
                Arc::clone(&notifications),
            )),
            assignments: Arc::new(AssignmentService::new(
                Arc::clone(&courses),
                Arc::clone(&enrollments),
                assignments,
                Arc::clone(&notifications),
            )),
            announcements: Arc::new(AnnouncementService::new(
                announcements,
                Arc::clone(&courses),
                Arc::clone(&enrollments),
                Arc::clone(&profiles),
                Arc::clone(&notifications),
            )),
            meetings: Arc::new(MeetingService::new(
                meetings,
                Arc::clone(&courses),
                Arc::clone(&enrollments),
                integrations.meetings,
                Arc::clone(&notifications),
            )),
            books: Arc::new(BookService::new(Arc::clone(&books))),
            payments: Arc::new(PaymentService::new(
                payments,
                courses,
                enrollments,
                books,
                integrations.gateways,
                Arc::clone(&notifications),
                instructor_share,
            )),
            admin: Arc::new(AdminService::new(profiles, reports, Arc::clone(&auth))),
            content: Arc::new(ContentService::new(content)),
            notifications,
            auth,
        })
    }
}
