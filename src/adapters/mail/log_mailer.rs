//! Log-only mailer used when no mail API key is configured.

use crate::domain::DomainError;
use crate::ports::MailerPort;
use tracing::info;

#[derive(Default)]
pub struct LogMailer;

impl LogMailer {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl MailerPort for LogMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), DomainError> {
        info!(to, subject, body_len = body.len(), "[LOG] mail not sent (no mail API configured)");
        Ok(())
    }
}
