//! Mailer outbound port. Email mirror of in-app notifications.

use crate::domain::DomainError;

#[async_trait::async_trait]
pub trait MailerPort: Send + Sync {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), DomainError>;
}
