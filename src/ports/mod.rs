//! Port traits. API boundaries for the hexagon.
//!
//! - Storage: called by use cases into persistence
//! - Integrations: called by use cases into payment gateways, meeting provider and mail

pub mod mailer;
pub mod meeting_provider;
pub mod outbound;
pub mod payment_gateway;

pub use mailer::MailerPort;
pub use meeting_provider::{MeetingProviderPort, MeetingRoom};
pub use outbound::{
    AnnouncementRepo, AssignmentRepo, BookRepo, ContentRepo, CourseRepo, EnrollmentRepo,
    MeetingRepo, NotificationRepo, PaymentRepo, ProfileRepo, ReportRepo,
};
pub use payment_gateway::{
    CheckoutRequest, CheckoutSession, GatewayNotification, GatewayVerdict, PaymentGatewayPort,
};
